//! femm-draw: CLI tool for generating FEMM Lua scripts from patterned geometry

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use femm_draw::bearing::{render_bearing, BearingParams};
use femm_draw::sweep::{linspace, render_rotor_sweep, write_variants};
use femm_draw::{translate, write_script, ScriptOptions};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "femm-draw")]
#[command(about = "Generate FEMM Lua scripts from patterned 2-D geometry")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate a JSON model description
    Build {
        /// Input JSON file (model description)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        script: ScriptArgs,
    },

    /// Generate the magnetic bearing model
    Bearing {
        /// JSON file overriding the default bearing parameters
        #[arg(long)]
        params: Option<PathBuf>,

        /// Rotor centre y coordinate in mm
        #[arg(long)]
        rotor_y: Option<f64>,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        script: ScriptArgs,
    },

    /// Generate one bearing script per rotor position
    Sweep {
        /// JSON file overriding the default bearing parameters
        #[arg(long)]
        params: Option<PathBuf>,

        /// First rotor centre y in mm
        #[arg(long, default_value = "60")]
        from: f64,

        /// Last rotor centre y in mm
        #[arg(long, default_value = "61.5")]
        to: f64,

        /// Number of rotor positions
        #[arg(long, default_value = "5")]
        steps: usize,

        /// Directory receiving bearing_<n>.lua
        #[arg(long)]
        out_dir: PathBuf,

        /// Worker threads
        #[arg(long, default_value = "2")]
        workers: usize,

        #[command(flatten)]
        script: ScriptArgs,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output Lua file
    #[arg(short, long, required_unless_present = "stdout")]
    output: Option<PathBuf>,

    /// Print generated script to stdout instead of file
    #[arg(long)]
    stdout: bool,
}

#[derive(Args, Debug)]
struct ScriptArgs {
    /// File the script writes probe results to
    #[arg(long)]
    results: Option<String>,

    /// Leave FEMM open when the script finishes
    #[arg(long)]
    no_quit: bool,

    /// Comment placed in the script header
    #[arg(long, default_value = "Patterned geometry")]
    comment: String,

    /// Directory FEMM runs the script in (defaults to the current directory)
    #[arg(long)]
    working_dir: Option<PathBuf>,
}

impl ScriptArgs {
    fn options(&self) -> Result<ScriptOptions> {
        let working_dir = match &self.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to read current directory")?,
        };
        Ok(ScriptOptions {
            header_comment: self.comment.clone(),
            results_file: self.results.clone(),
            quit: !self.no_quit,
            working_dir: Some(working_dir.to_string_lossy().into_owned()),
        })
    }
}

fn load_params(path: Option<&Path>) -> Result<BearingParams> {
    let Some(path) = path else {
        return Ok(BearingParams::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameter file: {:?}", path))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid bearing parameters in {:?}", path))
}

fn emit(script: &str, output: &OutputArgs) -> Result<()> {
    match (&output.output, output.stdout) {
        (Some(path), false) => {
            write_script(path, script)?;
            eprintln!("Generated FEMM script: {:?}", path);
        }
        _ => println!("{}", script),
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Build { input, output, script } => {
            let json = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read input file: {:?}", input))?;
            let lua = translate(&json, &script.options()?).context("Translation failed")?;
            emit(&lua, &output)
        }
        Command::Bearing { params, rotor_y, output, script } => {
            let mut params = load_params(params.as_deref())?;
            if let Some(y) = rotor_y {
                params = params.with_rotor_y(y);
            }
            let lua = render_bearing(&params, &script.options()?)?;
            emit(&lua, &output)
        }
        Command::Sweep { params, from, to, steps, out_dir, workers, script } => {
            let params = load_params(params.as_deref())?;
            let values = linspace(from, to, steps);
            let variants = render_rotor_sweep(&params, &values, &script.options()?, workers)?;
            let paths = write_variants(&out_dir, &variants)?;
            eprintln!("Generated {} FEMM scripts in {:?}", paths.len(), out_dir);
            Ok(())
        }
    }
}
