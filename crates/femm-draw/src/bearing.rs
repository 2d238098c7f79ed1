//! Parametric 4-pole radial magnetic bearing
//!
//! One stator pole (two flanks and a curved tip), one pair of coil sides and
//! their winding labels are described once and patterned around the centre.
//! The back-iron arcs between poles are anchored on the coordinates the pole
//! pattern reported, so they always close onto the drawn flanks.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::codegen::{render_script, ScriptOptions};
use crate::command::{DrawCommand, Group};
use crate::draw::Preprocessor;
use crate::error::{DrawError, Result};
use crate::geometry::{check_annulus, Point};
use crate::material::{BlockAssignment, CircuitName, CircuitProp, CircuitRef, Material};
use crate::pattern::{generate_pattern, PatternResult};
use crate::post::{BlockIntegral, DensityPlot, Postprocessor};
use crate::session::{Problem, Reply, ScriptSession, Session};
use crate::{LengthUnit, ProblemDefinition, ProblemKind};

pub const STEEL: &str = "1006 Steel";
pub const AIR: &str = "Air";
pub const WIRE: &str = "1mm";

/// Stator geometry lives in group 1, the rotor in group 2
pub const STATOR_GROUP: Group = Group(1);
pub const ROTOR_GROUP: Group = Group(2);

/// Bearing dimensions (mm) and drive settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BearingParams {
    pub center: Point,
    pub poles: u32,
    pub pole_length: f64,
    pub pole_width: f64,
    pub stator_radius: f64,
    pub stator_width: f64,
    /// Back-iron arc angle is `360 / poles / smoothing`
    pub smoothing: f64,
    pub rotor_radius: f64,
    pub rotor_bore: f64,
    /// Defaults to `center`
    pub rotor_center: Option<Point>,
    pub coil_width: f64,
    pub coil_length: f64,
    /// Angle of the arc forming the pole tip
    pub coil_angle: f64,
    /// Clearance between a pole flank and its coil
    pub coil_gap: f64,
    pub coil_turns: i64,
    /// Amps in `winding_1`; the other windings carry none
    pub drive_current: f64,
    pub depth: f64,
    pub max_segments: u32,
    pub save_as: String,
    /// Analyze and report the y force on the rotor
    pub solve: bool,
}

impl Default for BearingParams {
    fn default() -> Self {
        Self {
            center: Point::new(60.0, 60.0),
            poles: 4,
            pole_length: 25.0,
            pole_width: 20.0,
            stator_radius: 60.0,
            stator_width: 10.0,
            smoothing: 1.3,
            rotor_radius: 25.0,
            rotor_bore: 6.0,
            rotor_center: None,
            coil_width: 5.0,
            coil_length: 16.0,
            coil_angle: 45.0,
            coil_gap: 0.5,
            coil_turns: 100,
            drive_current: 10.0,
            depth: 20.0,
            max_segments: 1,
            save_as: "bearing.fem".to_string(),
            solve: true,
        }
    }
}

impl BearingParams {
    pub fn rotor_center(&self) -> Point {
        self.rotor_center.unwrap_or(self.center)
    }

    /// Same bearing with the rotor moved to `y`
    pub fn with_rotor_y(&self, y: f64) -> Self {
        Self {
            rotor_center: Some(Point::new(self.rotor_center().x, y)),
            ..self.clone()
        }
    }

    pub fn back_iron_angle(&self) -> f64 {
        360.0 / self.poles as f64 / self.smoothing
    }

    /// y of the stator's inner face above the centre
    fn pole_root_y(&self) -> f64 {
        self.center.y + self.stator_radius - self.stator_width
    }

    /// y halfway along the upright pole
    fn pole_mid_y(&self) -> f64 {
        self.pole_root_y() - self.pole_length / 2.0
    }

    /// Flank corners of the upright pole: root left, tip left, tip right, root right
    pub fn pole_points(&self) -> [Point; 4] {
        let left = self.center.x - self.pole_width / 2.0;
        let right = self.center.x + self.pole_width / 2.0;
        let root = self.pole_root_y();
        let tip = root - self.pole_length;
        [
            Point::new(left, root),
            Point::new(left, tip),
            Point::new(right, tip),
            Point::new(right, root),
        ]
    }

    /// Coil cross-sections beside the upright pole, left side first
    pub fn coil_points(&self) -> [Vec<Point>; 2] {
        let low = self.pole_mid_y() - self.coil_length / 2.0;
        let high = self.pole_mid_y() + self.coil_length / 2.0;
        let side = |inner: f64, outer: f64| {
            vec![
                Point::new(inner, low),
                Point::new(inner, high),
                Point::new(outer, high),
                Point::new(outer, low),
            ]
        };
        let left = self.center.x - self.pole_width / 2.0 - self.coil_gap;
        let right = self.center.x + self.pole_width / 2.0 + self.coil_gap;
        [
            side(left, left - self.coil_width),
            side(right, right + self.coil_width),
        ]
    }

    /// Winding label positions at the coil centres, left side first
    pub fn winding_points(&self) -> [Point; 2] {
        let offset = self.pole_width / 2.0 + self.coil_gap + self.coil_width / 2.0;
        [
            Point::new(self.center.x - offset, self.pole_mid_y()),
            Point::new(self.center.x + offset, self.pole_mid_y()),
        ]
    }

    /// Checked before anything is drawn
    pub fn validate(&self) -> Result<()> {
        if self.poles < 2 {
            return Err(DrawError::InvalidParameter {
                name: "pole count",
                reason: "a bearing needs at least 2 poles",
            });
        }
        for (name, value) in [
            ("pole length", self.pole_length),
            ("pole width", self.pole_width),
            ("stator radius", self.stator_radius),
            ("stator width", self.stator_width),
            ("smoothing", self.smoothing),
            ("coil width", self.coil_width),
            ("coil length", self.coil_length),
            ("depth", self.depth),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(DrawError::InvalidParameter {
                    name,
                    reason: "must be positive and finite",
                });
            }
        }
        if !(self.coil_gap.is_finite() && self.coil_gap >= 0.0) {
            return Err(DrawError::InvalidParameter {
                name: "coil gap",
                reason: "must be non-negative and finite",
            });
        }
        for angle in [self.coil_angle, self.back_iron_angle()] {
            if !(angle > 0.0 && angle <= 180.0) {
                return Err(DrawError::InvalidArcAngle(angle));
            }
        }
        for (op, p) in [("bearing centre", self.center), ("rotor centre", self.rotor_center())] {
            if !p.is_finite() {
                return Err(DrawError::InvalidCoordinate { op, x: p.x, y: p.y });
            }
        }
        if self.max_segments == 0 {
            return Err(DrawError::InvalidMaxSegments);
        }
        check_annulus(self.rotor_bore, self.rotor_radius)
    }
}

/// Point sets of every pattern the bearing drew, plus the force probe
#[derive(Debug, Clone, PartialEq)]
pub struct BearingLayout {
    /// Pole flank, tip arc, other flank
    pub stator: PatternResult,
    pub back_iron: PatternResult,
    pub coils: PatternResult,
    pub windings: PatternResult,
    /// Reply of the rotor y-force integral when solved
    pub force_y: Option<Reply>,
}

/// Build the bearing in a new magnetics document on `session`
pub fn build_bearing(session: &mut dyn Session, params: &BearingParams) -> Result<BearingLayout> {
    params.validate()?;

    session.new_document(Problem::Magnetics)?;
    let mut pre = Preprocessor::new(session, Problem::Magnetics);

    pre.problem_definition(&ProblemDefinition {
        units: LengthUnit::Millimeter,
        kind: ProblemKind::Planar,
        precision: 1e-8,
        depth: params.depth,
        ..ProblemDefinition::default()
    })?;

    pre.add_material(&Material::somaloy())?;
    for name in [STEEL, AIR, WIRE] {
        pre.get_material(name)?;
    }

    let winding = CircuitName::new("winding")?;
    for index in 1..=params.poles as usize {
        let current = if index == 1 { params.drive_current } else { 0.0 };
        pre.add_circuit_prop(&CircuitProp::series(winding.indexed(index), current))?;
    }

    let air = BlockAssignment::new(AIR).with_group(STATOR_GROUP);
    let outside = Point::new(params.center.x, params.center.y + params.stator_radius + params.stator_width);
    let slot = Point::new(params.center.x - params.pole_width, params.pole_mid_y());
    for at in [outside, params.rotor_center(), slot] {
        pre.label(at, Some(&air), 0)?;
    }

    let layout = draw_stator(&mut pre, params, &winding)?;

    // Rotor
    let rotor = params.rotor_center();
    pre.draw(
        &DrawCommand::annulus(rotor, params.rotor_bore, params.rotor_radius)
            .with_max_segments(params.max_segments)
            .in_group(ROTOR_GROUP),
    )?;
    let rotor_steel = BlockAssignment::new(STEEL)
        .with_mesh_size(1.0)
        .with_group(ROTOR_GROUP);
    let rotor_label = Point::new(rotor.x, rotor.y + (params.rotor_bore + params.rotor_radius) / 2.0);
    pre.label(rotor_label, Some(&rotor_steel), 0)?;

    pre.save_as(&params.save_as)?;
    pre.make_abc()?;
    pre.create_mesh()?;
    pre.zoom_natural()?;

    let force_y = if params.solve {
        pre.analyze()?;
        pre.load_solution()?;
        let mut post = Postprocessor::new(pre.session(), Problem::Magnetics);
        post.show_density_plot(DensityPlot::Bmag)?;
        Some(post.integrate_group(ROTOR_GROUP, BlockIntegral::ForceY)?)
    } else {
        None
    };

    info!(
        "built {}-pole bearing, rotor at ({}, {})",
        params.poles, rotor.x, rotor.y
    );

    Ok(BearingLayout { force_y, ..layout })
}

fn draw_stator(
    pre: &mut Preprocessor<'_>,
    params: &BearingParams,
    winding: &CircuitName,
) -> Result<BearingLayout> {
    let pivot = params.center;
    let [root_left, tip_left, tip_right, root_right] = params.pole_points();

    pre.draw(
        &DrawCommand::circle(pivot, params.stator_radius)
            .with_max_segments(params.max_segments)
            .in_group(STATOR_GROUP),
    )?;

    let stator = generate_pattern(
        pre,
        &[
            DrawCommand::line(root_left, tip_left).in_group(STATOR_GROUP),
            DrawCommand::arc(tip_right, tip_left, params.coil_angle)
                .with_max_segments(params.max_segments)
                .in_group(STATOR_GROUP),
            DrawCommand::line(tip_right, root_right),
        ],
        pivot,
        params.poles,
    )?;

    // From this pole's left root to the next pole's right root
    let (Some(start), Some(end)) = (stator.point(0, 0, 0), stator.point(2, 1, 1)) else {
        return Err(DrawError::InvalidParameter {
            name: "pole count",
            reason: "a bearing needs at least 2 poles",
        });
    };
    let back_iron = generate_pattern(
        pre,
        &[DrawCommand::arc(start, end, params.back_iron_angle())
            .with_max_segments(params.max_segments)
            .in_group(STATOR_GROUP)],
        pivot,
        params.poles,
    )?;

    let stator_steel = BlockAssignment::new(STEEL)
        .with_mesh_size(1.0)
        .with_group(STATOR_GROUP);
    let back_iron_label = Point::new(pivot.x, pivot.y + params.stator_radius - params.stator_width / 2.0);
    pre.label(back_iron_label, Some(&stator_steel), 0)?;

    let [left_coil, right_coil] = params.coil_points();
    let coils = generate_pattern(
        pre,
        &[DrawCommand::polygon(left_coil), DrawCommand::polygon(right_coil)],
        pivot,
        params.poles,
    )?;

    let per_pole = CircuitRef::PerRepetition { stem: winding.clone() };
    let [left_winding, right_winding] = params.winding_points();
    let windings = generate_pattern(
        pre,
        &[
            DrawCommand::label(
                left_winding,
                BlockAssignment::new(WIRE).with_circuit(per_pole.clone(), params.coil_turns),
            ),
            DrawCommand::label(
                right_winding,
                BlockAssignment::new(WIRE).with_circuit(per_pole, -params.coil_turns),
            ),
        ],
        pivot,
        params.poles,
    )?;

    Ok(BearingLayout {
        stator,
        back_iron,
        coils,
        windings,
        force_y: None,
    })
}

/// Render the bearing as a standalone FEMM Lua script
pub fn render_bearing(params: &BearingParams, options: &ScriptOptions) -> anyhow::Result<String> {
    use anyhow::Context;

    let mut session = ScriptSession::new();
    build_bearing(&mut session, params).context("Failed to build bearing model")?;
    render_script(&session, options)
}
