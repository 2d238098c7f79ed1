//! Error types for geometry construction and remote calls

use thiserror::Error;

/// A command the remote engine rejected (or that never reached it)
#[derive(Debug, Clone, PartialEq, Error)]
#[error("remote command `{command}` failed: {message}")]
pub struct RemoteError {
    /// The full call string, e.g. `mi_addnode(1, 2)`
    pub command: String,
    /// Raw error text returned by the engine
    pub message: String,
}

impl RemoteError {
    pub fn new(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
        }
    }
}

/// Everything that can go wrong while drawing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DrawError {
    #[error("pattern repeat count must be at least 1, got {0}")]
    InvalidRepeat(u32),

    #[error("{0} has an empty point set")]
    EmptyPointSet(&'static str),

    #[error("{op} expects {expected} point(s), got {actual}")]
    PointCount {
        op: &'static str,
        expected: &'static str,
        actual: usize,
    },

    #[error("{op} has a non-finite coordinate ({x}, {y})")]
    InvalidCoordinate { op: &'static str, x: f64, y: f64 },

    #[error("{op} radius must be positive and finite, got {radius}")]
    InvalidRadius { op: &'static str, radius: f64 },

    #[error("invalid annulus: inner radius {inner} must be positive and smaller than outer radius {outer}")]
    InvalidAnnulus { inner: f64, outer: f64 },

    #[error("arc angle must lie in (0, 180] degrees, got {0}")]
    InvalidArcAngle(f64),

    #[error("max_segments must be at least 1")]
    InvalidMaxSegments,

    #[error("invalid identifier {value:?}: {reason}")]
    InvalidIdentifier { value: String, reason: &'static str },

    #[error("invalid {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub type Result<T, E = DrawError> = std::result::Result<T, E>;
