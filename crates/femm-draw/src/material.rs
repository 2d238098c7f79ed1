//! Materials, block property assignments and circuits

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::command::Group;
use crate::error::{DrawError, Result};

/// Names that end up inside quoted Lua strings must be non-empty single-line text
pub(crate) fn check_identifier(value: &str) -> Result<()> {
    let reason = if value.trim().is_empty() {
        "must not be empty"
    } else if value.chars().any(char::is_control) {
        "must not contain control characters"
    } else {
        return Ok(());
    };
    Err(DrawError::InvalidIdentifier {
        value: value.to_string(),
        reason,
    })
}

/// Magnetic material definition, as passed to `mi_addmaterial`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Relative permeability along x
    #[serde(default = "unity")]
    pub mu_x: f64,
    /// Relative permeability along y (defaults to `mu_x`)
    #[serde(default)]
    pub mu_y: Option<f64>,
    /// Coercivity (A/m)
    #[serde(default)]
    pub h_c: f64,
    /// Source current density (MA/m²)
    #[serde(default)]
    pub current_density: f64,
    /// Electrical conductivity (MS/m)
    #[serde(default)]
    pub conductivity: f64,
    /// Lamination thickness (mm)
    #[serde(default)]
    pub lam_thickness: f64,
    /// Hysteresis lag angle (degrees)
    #[serde(default)]
    pub phi_h_max: f64,
    #[serde(default = "unity")]
    pub lam_fill: f64,
    #[serde(default)]
    pub lam_type: i64,
    #[serde(default)]
    pub phi_hx: f64,
    #[serde(default)]
    pub phi_hy: f64,
    #[serde(default)]
    pub strands: i64,
    /// Strand diameter (mm)
    #[serde(default)]
    pub wire_diameter: f64,
}

fn unity() -> f64 {
    1.0
}

impl Material {
    /// A linear, non-conducting material with permeability `mu`
    pub fn linear(name: impl Into<String>, mu: f64) -> Self {
        Self {
            name: name.into(),
            mu_x: mu,
            mu_y: None,
            h_c: 0.0,
            current_density: 0.0,
            conductivity: 0.0,
            lam_thickness: 0.0,
            phi_h_max: 0.0,
            lam_fill: 1.0,
            lam_type: 0,
            phi_hx: 0.0,
            phi_hy: 0.0,
            strands: 0,
            wire_diameter: 0.0,
        }
    }

    /// Soft magnetic composite used for the bearing stator
    pub fn somaloy() -> Self {
        Self {
            h_c: 210.0,
            strands: 1,
            conductivity: 1.0 / 300e-8,
            ..Self::linear("Somaloy", 430.0)
        }
    }

    pub fn mu_y(&self) -> f64 {
        self.mu_y.unwrap_or(self.mu_x)
    }

    pub fn validate(&self) -> Result<()> {
        check_identifier(&self.name)
    }
}

/// Where a model's material comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum MaterialSource {
    /// Copied from the engine's built-in library by name
    Library { name: String },
    /// Defined inline
    Custom(Material),
}

/// How the turns of a circuit are connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitKind {
    Parallel,
    #[default]
    Series,
}

impl CircuitKind {
    pub fn code(self) -> i64 {
        match self {
            CircuitKind::Parallel => 0,
            CircuitKind::Series => 1,
        }
    }
}

/// A validated circuit identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CircuitName(String);

impl CircuitName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_identifier(&name)?;
        Ok(Self(name))
    }

    /// `stem_index`, e.g. `winding_3`. The stem is already valid, so this
    /// cannot fail.
    pub fn indexed(&self, index: usize) -> Self {
        Self(format!("{}_{}", self.0, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CircuitName {
    type Error = DrawError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CircuitName> for String {
    fn from(name: CircuitName) -> Self {
        name.0
    }
}

impl fmt::Display for CircuitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Circuit membership of a block. Pattern copies can each get their own
/// circuit, numbered from 1 in repetition order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitRef {
    Fixed(CircuitName),
    PerRepetition { stem: CircuitName },
}

impl CircuitRef {
    pub fn resolve(&self, repetition: usize) -> CircuitName {
        match self {
            CircuitRef::Fixed(name) => name.clone(),
            CircuitRef::PerRepetition { stem } => stem.indexed(repetition + 1),
        }
    }
}

/// Circuit definition, as passed to `mi_addcircprop`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitProp {
    pub name: CircuitName,
    /// Amps
    #[serde(default)]
    pub current: f64,
    #[serde(default)]
    pub kind: CircuitKind,
}

impl CircuitProp {
    pub fn series(name: CircuitName, current: f64) -> Self {
        Self {
            name,
            current,
            kind: CircuitKind::Series,
        }
    }
}

/// Properties assigned to the block around a label (`mi_setblockprop`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockAssignment {
    pub material: String,
    #[serde(default = "default_auto_mesh")]
    pub auto_mesh: bool,
    /// Only used when `auto_mesh` is off
    #[serde(default)]
    pub mesh_size: f64,
    #[serde(default)]
    pub circuit: Option<CircuitRef>,
    /// Magnetisation direction in degrees
    #[serde(default)]
    pub mag_direction: f64,
    #[serde(default)]
    pub group: Option<Group>,
    #[serde(default = "default_turns")]
    pub turns: i64,
}

fn default_auto_mesh() -> bool {
    true
}

fn default_turns() -> i64 {
    1
}

impl BlockAssignment {
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            auto_mesh: true,
            mesh_size: 0.0,
            circuit: None,
            mag_direction: 0.0,
            group: None,
            turns: 1,
        }
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_mesh_size(mut self, mesh_size: f64) -> Self {
        self.mesh_size = mesh_size;
        self
    }

    pub fn with_circuit(mut self, circuit: CircuitRef, turns: i64) -> Self {
        self.circuit = Some(circuit);
        self.turns = turns;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_identifier(&self.material)
    }
}
