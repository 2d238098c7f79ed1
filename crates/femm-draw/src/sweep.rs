//! Rotor-position sweeps over the bearing model
//!
//! Every variant gets its own offline session; nothing is shared between
//! workers. Results come back in input order once all variants are built.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info};

use crate::bearing::{build_bearing, BearingParams};
use crate::codegen::{render_script, write_script, ScriptOptions};
use crate::session::ScriptSession;

/// `steps` evenly spaced values from `from` to `to`, both included
pub fn linspace(from: f64, to: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => vec![],
        1 => vec![from],
        _ => {
            let step = (to - from) / (steps - 1) as f64;
            (0..steps)
                .map(|i| if i == steps - 1 { to } else { from + step * i as f64 })
                .collect()
        }
    }
}

/// `dir/stem.ext` becomes `dir/stem_index.ext`
pub fn numbered(path: &str, index: usize) -> String {
    let path = Path::new(path);
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_{}", stem, index),
    };
    path.with_file_name(name).to_string_lossy().into_owned()
}

/// One rendered sweep point
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub index: usize,
    pub rotor_y: f64,
    pub script: String,
}

fn render_variant(
    params: &BearingParams,
    options: &ScriptOptions,
    index: usize,
    rotor_y: f64,
) -> Result<Variant> {
    let params = BearingParams {
        save_as: numbered(&params.save_as, index),
        ..params.with_rotor_y(rotor_y)
    };
    let options = ScriptOptions {
        results_file: options.results_file.as_deref().map(|path| numbered(path, index)),
        header_comment: format!("{}\nrotor y = {}", options.header_comment, rotor_y),
        ..options.clone()
    };

    let mut session = ScriptSession::new();
    build_bearing(&mut session, &params)
        .with_context(|| format!("Failed to build sweep variant {} (rotor y = {})", index, rotor_y))?;
    let script = render_script(&session, &options)?;
    debug!("rendered variant {} ({} statements)", index, session.statements().len());

    Ok(Variant { index, rotor_y, script })
}

/// Render one bearing script per rotor y position on `workers` threads
pub fn render_rotor_sweep(
    params: &BearingParams,
    values: &[f64],
    options: &ScriptOptions,
    workers: usize,
) -> Result<Vec<Variant>> {
    if workers == 0 {
        anyhow::bail!("Sweep needs at least one worker");
    }
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|idx| format!("femm-sweep-{idx}"))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build sweep thread pool: {e}"))?;

    let variants = pool.install(|| {
        values
            .par_iter()
            .enumerate()
            .map(|(index, &rotor_y)| render_variant(params, options, index, rotor_y))
            .collect::<Result<Vec<_>>>()
    })?;

    info!("rendered {} sweep variant(s) on {} worker(s)", variants.len(), workers);
    Ok(variants)
}

/// Write every variant to `dir/bearing_<index>.lua`, creating `dir` if needed
pub fn write_variants(dir: &Path, variants: &[Variant]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {:?}", dir))?;

    variants
        .iter()
        .map(|variant| {
            let path = dir.join(format!("bearing_{}.lua", variant.index));
            write_script(&path, &variant.script)?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(60.0, 61.5, 5), vec![60.0, 60.375, 60.75, 61.125, 61.5]);
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
        assert!(linspace(1.0, 2.0, 0).is_empty());
    }

    #[test]
    fn test_numbered() {
        assert_eq!(numbered("bearing.fem", 3), "bearing_3.fem");
        assert_eq!(numbered("out/force.txt", 0), "out/force_0.txt");
        assert_eq!(numbered("results", 2), "results_2");
    }

    #[test]
    fn test_sweep_keeps_input_order() {
        let options = ScriptOptions {
            results_file: Some("force.txt".to_string()),
            ..ScriptOptions::default()
        };
        let values = linspace(60.0, 61.5, 5);
        let variants = render_rotor_sweep(&BearingParams::default(), &values, &options, 2).unwrap();

        assert_eq!(variants.len(), 5);
        for (i, variant) in variants.iter().enumerate() {
            assert_eq!(variant.index, i);
            assert_eq!(variant.rotor_y, values[i]);
            assert!(variant.script.contains(&format!("mi_saveas(\"bearing_{}.fem\")", i)));
            assert!(variant.script.contains(&format!("openfile(\"force_{}.txt\", \"w\")", i)));
        }
        // rotor label follows the rotor: y + (6 + 25) / 2
        assert!(variants[4].script.contains("mi_addblocklabel(60, 77)"));
    }

    #[test]
    fn test_sweep_reports_failing_variant() {
        let params = BearingParams {
            rotor_bore: 40.0,
            ..BearingParams::default()
        };
        let err = render_rotor_sweep(&params, &[60.0], &ScriptOptions::default(), 1).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid annulus"));

        assert!(render_rotor_sweep(&params, &[60.0], &ScriptOptions::default(), 0).is_err());
    }

    #[test]
    fn test_write_variants() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("sweep");
        let variants = vec![
            Variant { index: 0, rotor_y: 60.0, script: "a\n".into() },
            Variant { index: 1, rotor_y: 61.0, script: "b\n".into() },
        ];
        let paths = write_variants(&out, &variants).unwrap();
        assert_eq!(paths, vec![out.join("bearing_0.lua"), out.join("bearing_1.lua")]);
        assert_eq!(fs::read_to_string(&paths[1]).unwrap(), "b\n");
    }
}
