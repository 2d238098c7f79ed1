//! femm-draw: Build patterned 2-D geometry for FEMM and generate Lua scripts
//!
//! This crate provides:
//! - Planar primitives and rotation about a pivot
//! - N-fold rotational patterns that report the coordinates they drew
//! - A drawing facade translating shapes into FEMM pre-processor calls
//! - An offline session that records calls and renders them as a FEMM Lua script
//!
//! The engine itself (meshing, solving) is never touched directly; all
//! interaction goes through the `Session` trait.

pub mod bearing;
pub mod codegen;
pub mod command;
pub mod draw;
pub mod error;
pub mod geometry;
pub mod material;
pub mod model;
pub mod pattern;
pub mod post;
pub mod session;
pub mod sweep;

pub use codegen::{render_script, write_script, ScriptOptions};
pub use command::{DrawCommand, Group};
pub use draw::Preprocessor;
pub use error::{DrawError, RemoteError};
pub use geometry::{rotate, Point, PointSet};
pub use model::{build_model, ModelSpec};
pub use pattern::{generate_pattern, PatternResult, PatternSpec};
pub use post::Postprocessor;
pub use session::{Problem, ScriptSession, Session};

use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main entry point: parse a JSON model and generate a FEMM Lua script
pub fn translate(json: &str, options: &ScriptOptions) -> Result<String> {
    let spec: ModelSpec = serde_json::from_str(json).context("Invalid model description")?;
    let mut session = ScriptSession::new();
    build_model(&mut session, &spec).context("Failed to build model")?;
    render_script(&session, options)
}

/// Length units understood by `mi_probdef`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Inch,
    #[default]
    Millimeter,
    Centimeter,
    Meter,
    Mil,
    Micrometer,
}

impl LengthUnit {
    /// Name used in the FEMM command set
    pub fn femm_name(&self) -> &'static str {
        match self {
            LengthUnit::Inch => "inches",
            LengthUnit::Millimeter => "millimeters",
            LengthUnit::Centimeter => "centimeters",
            LengthUnit::Meter => "meters",
            LengthUnit::Mil => "mils",
            LengthUnit::Micrometer => "micrometers",
        }
    }
}

impl FromStr for LengthUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "in" | "inch" | "inches" => Ok(LengthUnit::Inch),
            "mm" | "millimeter" | "millimeters" => Ok(LengthUnit::Millimeter),
            "cm" | "centimeter" | "centimeters" => Ok(LengthUnit::Centimeter),
            "m" | "meter" | "meters" => Ok(LengthUnit::Meter),
            "mil" | "mils" => Ok(LengthUnit::Mil),
            "um" | "µm" | "micrometer" | "micrometers" => Ok(LengthUnit::Micrometer),
            _ => anyhow::bail!("Unknown unit: {}. Use: in, mm, cm, m, mil or um", s),
        }
    }
}

/// Planar or axisymmetric formulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    #[default]
    Planar,
    Axisymmetric,
}

impl ProblemKind {
    pub fn femm_name(&self) -> &'static str {
        match self {
            ProblemKind::Planar => "planar",
            ProblemKind::Axisymmetric => "axi",
        }
    }
}

/// Problem definition for a document (`mi_probdef`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemDefinition {
    /// Hz; zero for magnetostatics
    pub frequency: f64,
    pub units: LengthUnit,
    pub kind: ProblemKind,
    /// Solver convergence precision
    pub precision: f64,
    /// Out-of-plane depth for planar problems, in `units`
    pub depth: f64,
    /// Minimum mesh angle in degrees
    pub min_angle: f64,
}

impl Default for ProblemDefinition {
    fn default() -> Self {
        Self {
            frequency: 0.0,
            units: LengthUnit::Millimeter,
            kind: ProblemKind::Planar,
            precision: 1e-8,
            depth: 1.0,
            min_angle: 30.0,
        }
    }
}
