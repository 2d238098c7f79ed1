//! Draw commands: one closed enum of everything the facade can draw

use serde::{Deserialize, Serialize};

use crate::error::{DrawError, Result};
use crate::geometry::{check_annulus, rectangle_corners, Point, PointSet};
use crate::material::BlockAssignment;

/// Arc discretisation used when a command leaves `max_segments` unset
pub const DEFAULT_MAX_SEGMENTS: u32 = 1;

/// Group tag attached to geometry for later bulk selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group(pub u32);

/// A single drawing operation with its own typed arguments.
///
/// Every variant carries `points`; that is the field the pattern generator
/// rotates. Circles and annuli are located by a single centre point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Line {
        points: PointSet,
        #[serde(default)]
        group: Option<Group>,
    },
    Polyline {
        points: PointSet,
        #[serde(default)]
        group: Option<Group>,
    },
    Polygon {
        points: PointSet,
        #[serde(default)]
        group: Option<Group>,
    },
    Arc {
        points: PointSet,
        angle: f64,
        #[serde(default)]
        max_segments: Option<u32>,
        #[serde(default)]
        group: Option<Group>,
    },
    Circle {
        points: PointSet,
        radius: f64,
        #[serde(default)]
        max_segments: Option<u32>,
        #[serde(default)]
        group: Option<Group>,
    },
    Annulus {
        points: PointSet,
        inner_radius: f64,
        outer_radius: f64,
        #[serde(default)]
        max_segments: Option<u32>,
        #[serde(default)]
        group: Option<Group>,
    },
    Rectangle {
        points: PointSet,
        #[serde(default)]
        group: Option<Group>,
    },
    /// Block labels, optionally with the block properties to assign
    Label {
        points: PointSet,
        #[serde(default)]
        block: Option<BlockAssignment>,
    },
}

impl DrawCommand {
    pub fn line(a: Point, b: Point) -> Self {
        Self::Line { points: vec![a, b], group: None }
    }

    pub fn polyline(points: PointSet) -> Self {
        Self::Polyline { points, group: None }
    }

    pub fn polygon(points: PointSet) -> Self {
        Self::Polygon { points, group: None }
    }

    pub fn arc(start: Point, end: Point, angle: f64) -> Self {
        Self::Arc {
            points: vec![start, end],
            angle,
            max_segments: None,
            group: None,
        }
    }

    pub fn circle(center: Point, radius: f64) -> Self {
        Self::Circle {
            points: vec![center],
            radius,
            max_segments: None,
            group: None,
        }
    }

    pub fn annulus(center: Point, inner_radius: f64, outer_radius: f64) -> Self {
        Self::Annulus {
            points: vec![center],
            inner_radius,
            outer_radius,
            max_segments: None,
            group: None,
        }
    }

    pub fn rectangle(a: Point, b: Point) -> Self {
        Self::Rectangle { points: vec![a, b], group: None }
    }

    pub fn label(at: Point, block: BlockAssignment) -> Self {
        Self::Label {
            points: vec![at],
            block: Some(block),
        }
    }

    /// Tag the command with a group. Labels take their group from the block
    /// assignment instead, so this is a no-op for them.
    pub fn in_group(mut self, tag: Group) -> Self {
        match &mut self {
            Self::Line { group, .. }
            | Self::Polyline { group, .. }
            | Self::Polygon { group, .. }
            | Self::Arc { group, .. }
            | Self::Circle { group, .. }
            | Self::Annulus { group, .. }
            | Self::Rectangle { group, .. } => *group = Some(tag),
            Self::Label { .. } => {}
        }
        self
    }

    /// Set arc discretisation; ignored by straight-edged commands
    pub fn with_max_segments(mut self, segments: u32) -> Self {
        match &mut self {
            Self::Arc { max_segments, .. }
            | Self::Circle { max_segments, .. }
            | Self::Annulus { max_segments, .. } => *max_segments = Some(segments),
            _ => {}
        }
        self
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Line { .. } => "line",
            Self::Polyline { .. } => "polyline",
            Self::Polygon { .. } => "polygon",
            Self::Arc { .. } => "arc",
            Self::Circle { .. } => "circle",
            Self::Annulus { .. } => "annulus",
            Self::Rectangle { .. } => "rectangle",
            Self::Label { .. } => "label",
        }
    }

    pub fn points(&self) -> &[Point] {
        match self {
            Self::Line { points, .. }
            | Self::Polyline { points, .. }
            | Self::Polygon { points, .. }
            | Self::Arc { points, .. }
            | Self::Circle { points, .. }
            | Self::Annulus { points, .. }
            | Self::Rectangle { points, .. }
            | Self::Label { points, .. } => points,
        }
    }

    /// The same command with `points` replaced and everything else kept
    pub fn with_points(&self, replacement: PointSet) -> Self {
        let mut command = self.clone();
        match &mut command {
            Self::Line { points, .. }
            | Self::Polyline { points, .. }
            | Self::Polygon { points, .. }
            | Self::Arc { points, .. }
            | Self::Circle { points, .. }
            | Self::Annulus { points, .. }
            | Self::Rectangle { points, .. }
            | Self::Label { points, .. } => *points = replacement,
        }
        command
    }

    /// Rewrite into a form whose points can be rotated without changing the
    /// shape. A two-corner rectangle is axis-aligned, so its corners are
    /// expanded to four before any rotation is applied.
    pub fn normalized(&self) -> Result<Self> {
        match self {
            Self::Rectangle { points, group } if points.len() == 2 => Ok(Self::Rectangle {
                points: rectangle_corners(points)?.to_vec(),
                group: *group,
            }),
            _ => Ok(self.clone()),
        }
    }

    /// Check arity and numeric arguments before anything reaches the engine
    pub fn validate(&self) -> Result<()> {
        let op = self.name();
        let points = self.points();

        if points.is_empty() {
            return Err(DrawError::EmptyPointSet(op));
        }
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(DrawError::InvalidCoordinate { op, x: bad.x, y: bad.y });
        }

        match self {
            Self::Line { .. } => expect_points(op, points, "2", |n| n == 2),
            Self::Polyline { .. } => Ok(()),
            Self::Label { block, .. } => block.as_ref().map_or(Ok(()), BlockAssignment::validate),
            Self::Polygon { .. } => expect_points(op, points, "at least 3", |n| n >= 3),
            Self::Rectangle { .. } => expect_points(op, points, "2 or 4", |n| n == 2 || n == 4),
            Self::Arc { angle, max_segments, .. } => {
                expect_points(op, points, "2", |n| n == 2)?;
                if !(*angle > 0.0 && *angle <= 180.0) {
                    return Err(DrawError::InvalidArcAngle(*angle));
                }
                resolve_max_segments(*max_segments).map(drop)
            }
            Self::Circle { radius, max_segments, .. } => {
                expect_points(op, points, "1", |n| n == 1)?;
                if !(radius.is_finite() && *radius > 0.0) {
                    return Err(DrawError::InvalidRadius { op, radius: *radius });
                }
                resolve_max_segments(*max_segments).map(drop)
            }
            Self::Annulus { inner_radius, outer_radius, max_segments, .. } => {
                expect_points(op, points, "1", |n| n == 1)?;
                check_annulus(*inner_radius, *outer_radius)?;
                resolve_max_segments(*max_segments).map(drop)
            }
        }
    }
}

/// Unset means `DEFAULT_MAX_SEGMENTS`; zero is rejected
pub fn resolve_max_segments(max_segments: Option<u32>) -> Result<u32> {
    match max_segments {
        None => Ok(DEFAULT_MAX_SEGMENTS),
        Some(0) => Err(DrawError::InvalidMaxSegments),
        Some(n) => Ok(n),
    }
}

fn expect_points(
    op: &'static str,
    points: &[Point],
    expected: &'static str,
    accept: impl Fn(usize) -> bool,
) -> Result<()> {
    if accept(points.len()) {
        Ok(())
    } else {
        Err(DrawError::PointCount {
            op,
            expected,
            actual: points.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_tagged_commands() {
        let json = r#"[
            {"op": "line", "points": [[0, 0], [1, 0]], "group": 1},
            {"op": "arc", "points": [[1, 0], [0, 1]], "angle": 90},
            {"op": "annulus", "points": [[60, 60]], "inner_radius": 6, "outer_radius": 25, "max_segments": 2}
        ]"#;

        let commands: Vec<DrawCommand> = serde_json::from_str(json).unwrap();
        assert_eq!(commands[0], DrawCommand::line(Point::new(0.0, 0.0), Point::new(1.0, 0.0)).in_group(Group(1)));
        assert_eq!(commands[1], DrawCommand::arc(Point::new(1.0, 0.0), Point::new(0.0, 1.0), 90.0));
        assert_eq!(
            commands[2],
            DrawCommand::annulus(Point::new(60.0, 60.0), 6.0, 25.0).with_max_segments(2)
        );
    }

    #[test]
    fn test_with_points_keeps_other_arguments() {
        let arc = DrawCommand::arc(Point::new(1.0, 0.0), Point::new(0.0, 1.0), 45.0)
            .with_max_segments(4)
            .in_group(Group(7));
        let moved = arc.with_points(vec![Point::new(2.0, 0.0), Point::new(0.0, 2.0)]);
        assert_eq!(
            moved,
            DrawCommand::Arc {
                points: vec![Point::new(2.0, 0.0), Point::new(0.0, 2.0)],
                angle: 45.0,
                max_segments: Some(4),
                group: Some(Group(7)),
            }
        );
    }

    #[test]
    fn test_validation() {
        let empty = DrawCommand::polygon(vec![]);
        assert_eq!(empty.validate(), Err(DrawError::EmptyPointSet("polygon")));

        let two_sided = DrawCommand::polygon(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        assert!(matches!(two_sided.validate(), Err(DrawError::PointCount { op: "polygon", .. })));

        let flat = DrawCommand::arc(Point::new(0.0, 0.0), Point::new(1.0, 0.0), 0.0);
        assert_eq!(flat.validate(), Err(DrawError::InvalidArcAngle(0.0)));

        let ring = DrawCommand::annulus(Point::default(), 10.0, 5.0);
        assert_eq!(ring.validate(), Err(DrawError::InvalidAnnulus { inner: 10.0, outer: 5.0 }));

        let coarse = DrawCommand::circle(Point::default(), 5.0).with_max_segments(0);
        assert_eq!(coarse.validate(), Err(DrawError::InvalidMaxSegments));

        let nan = DrawCommand::line(Point::new(f64::NAN, 0.0), Point::default());
        assert!(matches!(nan.validate(), Err(DrawError::InvalidCoordinate { .. })));

        assert!(DrawCommand::polyline(vec![Point::default()]).validate().is_ok());
        assert!(DrawCommand::circle(Point::default(), 5.0).validate().is_ok());
    }

    #[test]
    fn test_rectangle_normalizes_to_four_corners() {
        let rect = DrawCommand::rectangle(Point::new(0.0, 0.0), Point::new(2.0, 1.0)).in_group(Group(3));
        assert_eq!(
            rect.normalized().unwrap(),
            DrawCommand::Rectangle {
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(2.0, 0.0),
                    Point::new(2.0, 1.0),
                    Point::new(0.0, 1.0),
                ],
                group: Some(Group(3)),
            }
        );
    }

    #[test]
    fn test_max_segments_default() {
        assert_eq!(resolve_max_segments(None), Ok(DEFAULT_MAX_SEGMENTS));
        assert_eq!(resolve_max_segments(Some(12)), Ok(12));
    }
}
