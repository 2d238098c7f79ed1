//! N-fold rotational patterns
//!
//! One pole (or sector) is described once and repeated about a pivot. The
//! point sets actually drawn for every copy are handed back so later geometry
//! can anchor on exact coordinates instead of recomputing them.

use std::ops::Index;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::command::DrawCommand;
use crate::draw::Preprocessor;
use crate::error::{DrawError, Result};
use crate::geometry::{rotate, Point, PointSet};

/// Commands to repeat `repeat` times about `pivot`, original included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSpec {
    pub commands: Vec<DrawCommand>,
    pub pivot: Point,
    pub repeat: u32,
}

impl PatternSpec {
    pub fn new(commands: Vec<DrawCommand>, pivot: Point, repeat: u32) -> Self {
        Self { commands, pivot, repeat }
    }

    pub fn generate(&self, pre: &mut Preprocessor<'_>) -> Result<PatternResult> {
        generate_pattern(pre, &self.commands, self.pivot, self.repeat)
    }
}

/// Point sets drawn by a pattern: `result[command][repetition]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatternResult {
    sets: Vec<Vec<PointSet>>,
}

impl PatternResult {
    /// Number of commands in the pattern
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn get(&self, command: usize, repetition: usize) -> Option<&PointSet> {
        self.sets.get(command)?.get(repetition)
    }

    /// A single vertex of one drawn copy
    pub fn point(&self, command: usize, repetition: usize, vertex: usize) -> Option<Point> {
        self.get(command, repetition)?.get(vertex).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[PointSet]> {
        self.sets.iter().map(Vec::as_slice)
    }
}

impl Index<usize> for PatternResult {
    type Output = [PointSet];

    fn index(&self, command: usize) -> &Self::Output {
        &self.sets[command]
    }
}

/// Draw every command `repeat` times, copy `i` rotated by `i * 360 / repeat`
/// degrees about `pivot`.
///
/// Commands are drawn in order, each one through all of its copies before
/// the next starts. All commands are validated before the first call goes
/// out. The first rejected call aborts the pattern and is returned as-is;
/// nothing after it is attempted.
///
/// A two-corner rectangle is expanded to its four corners first, so its
/// recorded point sets hold four points.
pub fn generate_pattern(
    pre: &mut Preprocessor<'_>,
    commands: &[DrawCommand],
    pivot: Point,
    repeat: u32,
) -> Result<PatternResult> {
    if repeat < 1 {
        return Err(DrawError::InvalidRepeat(repeat));
    }
    if !pivot.is_finite() {
        return Err(DrawError::InvalidCoordinate {
            op: "pattern pivot",
            x: pivot.x,
            y: pivot.y,
        });
    }
    let commands = commands
        .iter()
        .map(|command| {
            command.validate()?;
            command.normalized()
        })
        .collect::<Result<Vec<_>>>()?;

    let mut sets = Vec::with_capacity(commands.len());

    for (index, command) in commands.iter().enumerate() {
        let mut copies = Vec::new();

        for repetition in 0..repeat as usize {
            let (points, outcome) = if repetition == 0 {
                (command.points().to_vec(), pre.draw_repetition(command, 0))
            } else {
                let angle = repetition as f64 * 360.0 / repeat as f64;
                let points = rotate(command.points(), pivot, angle);
                let outcome = pre.draw_repetition(&command.with_points(points.clone()), repetition);
                (points, outcome)
            };
            copies.push(points);

            if let Err(err) = outcome {
                warn!(
                    "pattern aborted at command {} ({}), repetition {}/{}: {}",
                    index,
                    command.name(),
                    repetition,
                    repeat,
                    err
                );
                return Err(err);
            }
        }

        sets.push(copies);
    }

    info!(
        "pattern drew {} command(s) x {} about ({}, {})",
        commands.len(),
        repeat,
        pivot.x,
        pivot.y
    );

    Ok(PatternResult { sets })
}
