//! Declarative model descriptions (JSON)
//!
//! A model lists the problem setup, the drawing steps in order and what to
//! do once the geometry is in place. Building one issues every call through
//! the drawing facade against a caller-supplied session.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::command::{DrawCommand, Group};
use crate::draw::Preprocessor;
use crate::error::Result;
use crate::material::{CircuitProp, MaterialSource};
use crate::pattern::{PatternResult, PatternSpec};
use crate::post::{BlockIntegral, DensityPlot, Postprocessor};
use crate::session::{Problem, Session};
use crate::ProblemDefinition;

/// A complete model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(default)]
    pub problem: Problem,
    #[serde(default)]
    pub definition: ProblemDefinition,
    #[serde(default)]
    pub materials: Vec<MaterialSource>,
    #[serde(default)]
    pub circuits: Vec<CircuitProp>,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub analysis: Analysis,
}

/// One drawing step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Draw { command: DrawCommand },
    Pattern(PatternSpec),
}

/// What happens after drawing
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Analysis {
    /// Save the document under this path before meshing
    pub save_as: Option<String>,
    /// Surround the model with an asymptotic boundary
    pub make_abc: bool,
    pub mesh: bool,
    pub solve: bool,
    /// Density plot to show after solving
    pub density_plot: Option<DensityPlot>,
    /// Block integrals to report; only run when `solve` is set
    pub probes: Vec<Probe>,
}

/// Integrate one quantity over every block of a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub group: Group,
    pub integral: BlockIntegral,
}

/// Build `spec` in a new document on `session`. Returns the point sets of
/// every pattern step, in step order.
pub fn build_model(session: &mut dyn Session, spec: &ModelSpec) -> Result<Vec<PatternResult>> {
    session.new_document(spec.problem)?;

    let mut pre = Preprocessor::new(session, spec.problem);
    pre.problem_definition(&spec.definition)?;

    for material in &spec.materials {
        match material {
            MaterialSource::Library { name } => pre.get_material(name)?,
            MaterialSource::Custom(material) => pre.add_material(material)?,
        }
    }
    for circuit in &spec.circuits {
        pre.add_circuit_prop(circuit)?;
    }

    let mut patterns = Vec::new();
    for step in &spec.steps {
        match step {
            Step::Draw { command } => pre.draw(command)?,
            Step::Pattern(pattern) => patterns.push(pattern.generate(&mut pre)?),
        }
    }

    run_analysis(&mut pre, &spec.analysis)?;

    info!(
        "built model: {} step(s), {} pattern(s)",
        spec.steps.len(),
        patterns.len()
    );
    Ok(patterns)
}

fn run_analysis(pre: &mut Preprocessor<'_>, analysis: &Analysis) -> Result<()> {
    if let Some(path) = &analysis.save_as {
        pre.save_as(path)?;
    }
    if analysis.make_abc {
        pre.make_abc()?;
    }
    if analysis.mesh {
        pre.create_mesh()?;
    }
    pre.zoom_natural()?;

    if !analysis.solve {
        return Ok(());
    }
    pre.analyze()?;
    pre.load_solution()?;

    let problem = pre.problem();
    let mut post = Postprocessor::new(pre.session(), problem);
    if let Some(plot) = analysis.density_plot {
        post.show_density_plot(plot)?;
    }
    for probe in &analysis.probes {
        post.integrate_group(probe.group, probe.integral)?;
    }
    Ok(())
}
