//! Planar geometry primitives: points, rotation about a pivot, and the
//! decomposition of compound shapes into the line and arc commands the
//! engine understands.
//!
//! The engine only knows nodes, segments, arcs and block labels. Circles,
//! annuli, rectangles and polygons are broken down here before they are sent.

use nalgebra::{Point2, Rotation2, Vector2};
use serde::{Deserialize, Serialize};

use crate::command::{DrawCommand, Group};
use crate::error::{DrawError, Result};

/// Decimal places kept after a rotation
pub const ROTATION_PRECISION: i32 = 5;

/// A point in the document's length unit. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Ordered vertices of a shape. Order sets arc direction and polygon edges.
pub type PointSet = Vec<Point>;

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Component-wise distance check, used when comparing rotated coordinates
    pub fn approx_eq(&self, other: &Point, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }

    fn to_na(self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    fn from_na(p: Point2<f64>) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Round to `ROTATION_PRECISION` decimals. Negative zero collapses to zero so
/// that emitted coordinates never read `-0`.
pub fn round_coord(value: f64) -> f64 {
    let scale = 10f64.powi(ROTATION_PRECISION);
    (value * scale).round() / scale + 0.0
}

/// Rotate `points` counter-clockwise about `pivot` by `angle_degrees`,
/// rounding every coordinate to `ROTATION_PRECISION` decimals.
pub fn rotate(points: &[Point], pivot: Point, angle_degrees: f64) -> PointSet {
    let rotation = Rotation2::new(angle_degrees.to_radians());
    let pivot = pivot.to_na();

    points
        .iter()
        .map(|p| {
            let rotated = pivot + rotation * (p.to_na() - pivot);
            Point::new(round_coord(rotated.x), round_coord(rotated.y))
        })
        .collect()
}

/// Midpoint of a straight segment
pub fn midpoint(a: Point, b: Point) -> Point {
    Point::from_na(nalgebra::center(&a.to_na(), &b.to_na()))
}

/// Point halfway along the arc drawn counter-clockwise from `start` to `end`
/// through `angle_degrees`. Used to select an arc after it has been drawn.
pub fn arc_midpoint(start: Point, end: Point, angle_degrees: f64) -> Point {
    let a = start.to_na();
    let chord: Vector2<f64> = end.to_na() - a;
    let length = chord.norm();
    if length == 0.0 {
        return start;
    }

    let half = angle_degrees.to_radians() / 2.0;
    let radius = length / (2.0 * half.sin());
    // Counter-clockwise travel keeps the centre on the left of the chord
    let left = Vector2::new(-chord.y, chord.x) / length;
    let center = a + chord / 2.0 + left * ((length / 2.0) / half.tan());

    Point::from_na(center - left * radius)
}

/// A circle as two 180° arcs: top to bottom, then bottom to top.
/// `max_segments` only changes discretisation, never the split.
pub fn circle_as_arcs(
    center: Point,
    radius: f64,
    max_segments: Option<u32>,
    group: Option<Group>,
) -> [DrawCommand; 2] {
    let top = Point::new(center.x, center.y + radius);
    let bottom = Point::new(center.x, center.y - radius);

    [
        DrawCommand::Arc {
            points: vec![top, bottom],
            angle: 180.0,
            max_segments,
            group,
        },
        DrawCommand::Arc {
            points: vec![bottom, top],
            angle: 180.0,
            max_segments,
            group,
        },
    ]
}

/// An annulus as two concentric circles, inner first.
pub fn annulus_as_circles(
    center: Point,
    inner_radius: f64,
    outer_radius: f64,
    max_segments: Option<u32>,
    group: Option<Group>,
) -> Result<[[DrawCommand; 2]; 2]> {
    check_annulus(inner_radius, outer_radius)?;
    Ok([
        circle_as_arcs(center, inner_radius, max_segments, group),
        circle_as_arcs(center, outer_radius, max_segments, group),
    ])
}

pub(crate) fn check_annulus(inner: f64, outer: f64) -> Result<()> {
    let valid = inner.is_finite() && outer.is_finite() && inner > 0.0 && inner < outer;
    if valid {
        Ok(())
    } else {
        Err(DrawError::InvalidAnnulus { inner, outer })
    }
}

/// Corners of a rectangle in drawing order.
///
/// Two points are opposite corners of an axis-aligned rectangle; four points
/// are taken as already-ordered corners (e.g. a rotated rectangle).
pub fn rectangle_corners(points: &[Point]) -> Result<[Point; 4]> {
    match points {
        [a, b] => Ok([*a, Point::new(b.x, a.y), *b, Point::new(a.x, b.y)]),
        [a, b, c, d] => Ok([*a, *b, *c, *d]),
        _ => Err(DrawError::PointCount {
            op: "rectangle",
            expected: "2 or 4",
            actual: points.len(),
        }),
    }
}

/// Four distinct edges, corner to corner, closing back on the first corner
pub fn rectangle_as_lines(points: &[Point], group: Option<Group>) -> Result<[DrawCommand; 4]> {
    let [a, b, c, d] = rectangle_corners(points)?;
    Ok([
        line(a, b, group),
        line(b, c, group),
        line(c, d, group),
        line(d, a, group),
    ])
}

/// One line per consecutive pair. A single point yields nothing.
pub fn polyline_as_lines(points: &[Point], group: Option<Group>) -> Vec<DrawCommand> {
    points
        .windows(2)
        .map(|pair| line(pair[0], pair[1], group))
        .collect()
}

/// The polyline through `points` plus the closing edge back to the start
pub fn polygon_as_lines(points: &[Point], group: Option<Group>) -> Vec<DrawCommand> {
    let mut lines = polyline_as_lines(points, group);
    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        if points.len() > 1 {
            lines.push(line(*last, *first, group));
        }
    }
    lines
}

fn line(a: Point, b: Point, group: Option<Group>) -> DrawCommand {
    DrawCommand::Line {
        points: vec![a, b],
        group,
    }
}
