//! Lua script generation for FEMM

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use minijinja::{context, Environment};
use tracing::info;

use crate::session::{fix_path, Arg, ScriptSession};

const FEMM_TEMPLATE: &str = r##"-- FEMM Lua script generated by femm-draw
{% for line in header_lines %}
-- {{ line }}
{% endfor %}
--
-- Generated: {{ timestamp }}
-- Statements: {{ statements|length }}

{% if working_dir %}
setcurrentdirectory({{ working_dir }})
{% endif %}
{% for stmt in statements %}
{% if stmt.kind == "probe" %}
{{ stmt.name }} = {{ stmt.line }}
{% else %}
{{ stmt.line }}
{% endif %}
{% endfor %}
{% if results_file and probes|length > 0 %}

-- Results
results_handle = openfile({{ results_file }}, "w")
{% for name in probes %}
write(results_handle, "{{ name }}", "\t", {{ name }}, "\n")
{% endfor %}
closefile(results_handle)
{% endif %}
{% if quit %}

quit()
{% endif %}
"##;

/// Script rendering options
#[derive(Debug, Clone)]
pub struct ScriptOptions {
    /// Free text placed in the script header, one comment line per line
    pub header_comment: String,
    /// Write every probe result to this file when the script runs
    pub results_file: Option<String>,
    /// Close FEMM at the end of the script
    pub quit: bool,
    /// Directory FEMM resolves relative file names against
    pub working_dir: Option<String>,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            header_comment: "Patterned geometry".to_string(),
            results_file: None,
            quit: true,
            working_dir: None,
        }
    }
}

/// Render the calls recorded by `session` as a FEMM Lua script
pub fn render_script(session: &ScriptSession, options: &ScriptOptions) -> Result<String> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("femm", FEMM_TEMPLATE)?;

    let template = env.get_template("femm")?;

    let header_lines: Vec<&str> = options.header_comment.lines().collect();
    // Lua string literals, quoted and escaped like any other argument
    let lua_path = |path: &str| Arg::from(fix_path(path)).to_string();
    let results_file = options.results_file.as_deref().map(lua_path);
    let working_dir = options.working_dir.as_deref().map(lua_path);

    let output = template
        .render(context! {
            header_lines => header_lines,
            timestamp => chrono::Utc::now().to_rfc3339(),
            statements => session.statements(),
            probes => session.probe_names(),
            results_file => results_file,
            working_dir => working_dir,
            quit => options.quit,
        })
        .context("Failed to render FEMM script")?;

    Ok(output)
}

/// Write a rendered script to `path`
pub fn write_script(path: &Path, script: &str) -> Result<()> {
    fs::write(path, script)
        .with_context(|| format!("Failed to write output file: {:?}", path))?;
    info!("wrote FEMM script {:?} ({} bytes)", path, script.len());
    Ok(())
}
