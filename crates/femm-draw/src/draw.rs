//! Drawing facade over the pre-processor command set
//!
//! Compound verbs (polygon, circle, annulus, ...) are broken into lines and
//! arcs, each of which becomes node/segment/arc calls. When a group is given,
//! the freshly drawn entity is selected, tagged and deselected again.
//! The facade keeps no state between calls.

use tracing::debug;

use crate::command::{resolve_max_segments, DrawCommand, Group};
use crate::error::Result;
use crate::geometry::{
    annulus_as_circles, arc_midpoint, circle_as_arcs, midpoint, polygon_as_lines,
    polyline_as_lines, rectangle_as_lines, Point,
};
use crate::material::{BlockAssignment, CircuitName, CircuitProp, Material};
use crate::session::{fix_path, Arg, Mode, Problem, Reply, Session};
use crate::ProblemDefinition;

/// Pre-processor verbs for one open document
pub struct Preprocessor<'s> {
    session: &'s mut dyn Session,
    problem: Problem,
}

impl<'s> Preprocessor<'s> {
    pub fn new(session: &'s mut dyn Session, problem: Problem) -> Self {
        Self { session, problem }
    }

    pub fn problem(&self) -> Problem {
        self.problem
    }

    /// Borrow the underlying session, e.g. to hand it to a post-processor
    pub fn session(&mut self) -> &mut dyn Session {
        &mut *self.session
    }

    fn call(&mut self, verb: &str, args: &[Arg]) -> Result<Reply> {
        let command = self.problem.command(Mode::Pre, verb);
        Ok(self.session.call(&command, args)?)
    }

    fn call_at(&mut self, verb: &str, p: Point) -> Result<()> {
        self.call(verb, &[p.x.into(), p.y.into()]).map(drop)
    }

    // ------------------------------------------------------------------
    // Primitive calls
    // ------------------------------------------------------------------

    pub fn add_node(&mut self, p: Point) -> Result<()> {
        self.call_at("addnode", p)
    }

    /// Segment between the nodes nearest to `a` and `b`
    pub fn add_segment(&mut self, a: Point, b: Point) -> Result<()> {
        self.call("addsegment", &[a.x.into(), a.y.into(), b.x.into(), b.y.into()])
            .map(drop)
    }

    /// Counter-clockwise arc between the nodes nearest to `a` and `b`
    pub fn add_arc(&mut self, a: Point, b: Point, angle: f64, max_segments: u32) -> Result<()> {
        self.call(
            "addarc",
            &[
                a.x.into(),
                a.y.into(),
                b.x.into(),
                b.y.into(),
                angle.into(),
                max_segments.into(),
            ],
        )
        .map(drop)
    }

    pub fn add_block_label(&mut self, p: Point) -> Result<()> {
        self.call_at("addblocklabel", p)
    }

    pub fn select_node(&mut self, p: Point) -> Result<()> {
        self.call_at("selectnode", p)
    }

    pub fn select_segment(&mut self, p: Point) -> Result<()> {
        self.call_at("selectsegment", p)
    }

    pub fn select_arc_segment(&mut self, p: Point) -> Result<()> {
        self.call_at("selectarcsegment", p)
    }

    pub fn select_label(&mut self, p: Point) -> Result<()> {
        self.call_at("selectlabel", p)
    }

    pub fn set_group(&mut self, group: Group) -> Result<()> {
        self.call("setgroup", &[group.0.into()]).map(drop)
    }

    pub fn clear_selected(&mut self) -> Result<()> {
        self.call("clearselected", &[]).map(drop)
    }

    pub fn delete_selected(&mut self) -> Result<()> {
        self.call("deleteselected", &[]).map(drop)
    }

    pub fn delete_selected_nodes(&mut self) -> Result<()> {
        self.call("deleteselectednodes", &[]).map(drop)
    }

    pub fn delete_selected_labels(&mut self) -> Result<()> {
        self.call("deleteselectedlabels", &[]).map(drop)
    }

    pub fn delete_selected_segments(&mut self) -> Result<()> {
        self.call("deleteselectedsegments", &[]).map(drop)
    }

    pub fn delete_selected_arc_segments(&mut self) -> Result<()> {
        self.call("deleteselectedarcsegments", &[]).map(drop)
    }

    /// Apply `block` to the selected labels. `circuit` is the already
    /// resolved circuit name, if any.
    pub fn set_block_prop(&mut self, block: &BlockAssignment, circuit: Option<&CircuitName>) -> Result<()> {
        let circuit = circuit.map_or_else(|| Arg::from(""), |c| Arg::from(c.as_str()));
        let group = block.group.map_or(0, |g| g.0);
        self.call(
            "setblockprop",
            &[
                block.material.as_str().into(),
                block.auto_mesh.into(),
                block.mesh_size.into(),
                circuit,
                block.mag_direction.into(),
                group.into(),
                block.turns.into(),
            ],
        )
        .map(drop)
    }

    pub fn problem_definition(&mut self, definition: &ProblemDefinition) -> Result<()> {
        self.call(
            "probdef",
            &[
                definition.frequency.into(),
                definition.units.femm_name().into(),
                definition.kind.femm_name().into(),
                definition.precision.into(),
                definition.depth.into(),
                definition.min_angle.into(),
            ],
        )
        .map(drop)
    }

    pub fn add_material(&mut self, material: &Material) -> Result<()> {
        material.validate()?;
        self.call(
            "addmaterial",
            &[
                material.name.as_str().into(),
                material.mu_x.into(),
                material.mu_y().into(),
                material.h_c.into(),
                material.current_density.into(),
                material.conductivity.into(),
                material.lam_thickness.into(),
                material.phi_h_max.into(),
                material.lam_fill.into(),
                material.lam_type.into(),
                material.phi_hx.into(),
                material.phi_hy.into(),
                material.strands.into(),
                material.wire_diameter.into(),
            ],
        )
        .map(drop)
    }

    /// Copy a material from the engine's library into the document
    pub fn get_material(&mut self, name: &str) -> Result<()> {
        crate::material::check_identifier(name)?;
        self.call("getmaterial", &[name.into()]).map(drop)
    }

    pub fn add_circuit_prop(&mut self, circuit: &CircuitProp) -> Result<()> {
        self.call(
            "addcircprop",
            &[
                circuit.name.as_str().into(),
                circuit.current.into(),
                circuit.kind.code().into(),
            ],
        )
        .map(drop)
    }

    /// Asymptotic boundary condition around the model
    pub fn make_abc(&mut self) -> Result<()> {
        self.call("makeABC", &[]).map(drop)
    }

    pub fn create_mesh(&mut self) -> Result<()> {
        self.call("createmesh", &[]).map(drop)
    }

    pub fn zoom_natural(&mut self) -> Result<()> {
        self.call("zoomnatural", &[]).map(drop)
    }

    pub fn save_as(&mut self, path: &str) -> Result<()> {
        self.call("saveas", &[fix_path(path).into()]).map(drop)
    }

    pub fn analyze(&mut self) -> Result<()> {
        self.call("analyze", &[]).map(drop)
    }

    pub fn load_solution(&mut self) -> Result<()> {
        self.call("loadsolution", &[]).map(drop)
    }

    // ------------------------------------------------------------------
    // Drawing verbs
    // ------------------------------------------------------------------

    /// Draw one command as-is
    pub fn draw(&mut self, command: &DrawCommand) -> Result<()> {
        self.draw_repetition(command, 0)
    }

    /// Draw one command as the `repetition`-th copy of a pattern. The index
    /// only matters for per-repetition circuits on labels.
    pub fn draw_repetition(&mut self, command: &DrawCommand, repetition: usize) -> Result<()> {
        command.validate()?;
        debug!("draw {} at {:?}", command.name(), command.points());

        match command {
            DrawCommand::Line { points, group } => self.line(points[0], points[1], *group),
            DrawCommand::Polyline { points, group } => {
                self.draw_all(&polyline_as_lines(points, *group))
            }
            DrawCommand::Polygon { points, group } => {
                self.draw_all(&polygon_as_lines(points, *group))
            }
            DrawCommand::Rectangle { points, group } => {
                self.draw_all(&rectangle_as_lines(points, *group)?)
            }
            DrawCommand::Arc {
                points,
                angle,
                max_segments,
                group,
            } => {
                let segments = resolve_max_segments(*max_segments)?;
                self.arc(points[0], points[1], *angle, segments, *group)
            }
            DrawCommand::Circle {
                points,
                radius,
                max_segments,
                group,
            } => self.draw_all(&circle_as_arcs(points[0], *radius, *max_segments, *group)),
            DrawCommand::Annulus {
                points,
                inner_radius,
                outer_radius,
                max_segments,
                group,
            } => {
                let [inner, outer] =
                    annulus_as_circles(points[0], *inner_radius, *outer_radius, *max_segments, *group)?;
                self.draw_all(&inner)?;
                self.draw_all(&outer)
            }
            DrawCommand::Label { points, block } => {
                for p in points {
                    self.label(*p, block.as_ref(), repetition)?;
                }
                Ok(())
            }
        }
    }

    fn draw_all(&mut self, commands: &[DrawCommand]) -> Result<()> {
        for command in commands {
            self.draw(command)?;
        }
        Ok(())
    }

    pub fn line(&mut self, a: Point, b: Point, group: Option<Group>) -> Result<()> {
        self.add_node(a)?;
        self.add_node(b)?;
        self.add_segment(a, b)?;

        if let Some(group) = group {
            self.select_segment(midpoint(a, b))?;
            self.set_group(group)?;
            self.clear_selected()?;
        }
        Ok(())
    }

    pub fn arc(&mut self, a: Point, b: Point, angle: f64, max_segments: u32, group: Option<Group>) -> Result<()> {
        self.add_node(a)?;
        self.add_node(b)?;
        self.add_arc(a, b, angle, max_segments)?;

        if let Some(group) = group {
            self.select_arc_segment(arc_midpoint(a, b, angle))?;
            self.set_group(group)?;
            self.clear_selected()?;
        }
        Ok(())
    }

    /// Place a block label and, if given, assign its block properties
    pub fn label(&mut self, at: Point, block: Option<&BlockAssignment>, repetition: usize) -> Result<()> {
        self.add_block_label(at)?;

        if let Some(block) = block {
            let circuit = block.circuit.as_ref().map(|c| c.resolve(repetition));
            self.select_label(at)?;
            self.set_block_prop(block, circuit.as_ref())?;
            self.clear_selected()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DrawError;
    use crate::material::CircuitRef;
    use crate::session::testing::FakeSession;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_with_group_is_tagged() {
        let mut session = FakeSession::new();
        let mut pre = Preprocessor::new(&mut session, Problem::Magnetics);
        pre.draw(&DrawCommand::line(Point::new(0.0, 0.0), Point::new(10.0, 0.0)).in_group(Group(1)))
            .unwrap();

        assert_eq!(
            session.calls,
            vec![
                "mi_addnode(0, 0)",
                "mi_addnode(10, 0)",
                "mi_addsegment(0, 0, 10, 0)",
                "mi_selectsegment(5, 0)",
                "mi_setgroup(1)",
                "mi_clearselected()",
            ]
        );
    }

    #[test]
    fn test_single_point_polyline_draws_nothing() {
        let mut session = FakeSession::new();
        let mut pre = Preprocessor::new(&mut session, Problem::Magnetics);
        pre.draw(&DrawCommand::polyline(vec![Point::new(1.0, 1.0)])).unwrap();
        assert!(session.calls_to("mi_addsegment").is_empty());
    }

    #[test]
    fn test_polygon_draws_closing_edge() {
        let mut session = FakeSession::new();
        let mut pre = Preprocessor::new(&mut session, Problem::Magnetics);
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        pre.draw(&DrawCommand::polygon(square)).unwrap();

        assert_eq!(
            session.calls_to("mi_addsegment"),
            vec![
                "mi_addsegment(0, 0, 1, 0)",
                "mi_addsegment(1, 0, 1, 1)",
                "mi_addsegment(1, 1, 0, 1)",
                "mi_addsegment(0, 1, 0, 0)",
            ]
        );
    }

    #[test]
    fn test_circle_is_two_half_arcs_regardless_of_segments() {
        for segments in [1, 60] {
            let mut session = FakeSession::new();
            let mut pre = Preprocessor::new(&mut session, Problem::Magnetics);
            pre.draw(&DrawCommand::circle(Point::new(60.0, 60.0), 60.0).with_max_segments(segments))
                .unwrap();

            assert_eq!(
                session.calls_to("mi_addarc"),
                vec![
                    format!("mi_addarc(60, 120, 60, 0, 180, {})", segments),
                    format!("mi_addarc(60, 0, 60, 120, 180, {})", segments),
                ]
            );
        }
    }

    #[test]
    fn test_grouped_arc_selects_its_midpoint() {
        let mut session = FakeSession::new();
        let mut pre = Preprocessor::new(&mut session, Problem::Magnetics);
        pre.draw(&DrawCommand::circle(Point::new(0.0, 0.0), 5.0).in_group(Group(2))).unwrap();

        assert_eq!(
            session.calls_to("mi_selectarcsegment"),
            vec!["mi_selectarcsegment(-5, 0)", "mi_selectarcsegment(5, 0)"]
        );
        assert_eq!(session.calls_to("mi_setgroup").len(), 2);
    }

    #[test]
    fn test_invalid_annulus_issues_no_calls() {
        let mut session = FakeSession::new();
        let mut pre = Preprocessor::new(&mut session, Problem::Magnetics);
        let err = pre.draw(&DrawCommand::annulus(Point::default(), 25.0, 6.0)).unwrap_err();
        assert_eq!(err, DrawError::InvalidAnnulus { inner: 25.0, outer: 6.0 });
        assert!(session.calls.is_empty());
    }

    #[test]
    fn test_annulus_draws_inner_then_outer() {
        let mut session = FakeSession::new();
        let mut pre = Preprocessor::new(&mut session, Problem::Magnetics);
        pre.draw(&DrawCommand::annulus(Point::default(), 6.0, 25.0)).unwrap();

        let arcs = session.calls_to("mi_addarc");
        assert_eq!(arcs.len(), 4);
        assert_eq!(arcs[0], "mi_addarc(0, 6, 0, -6, 180, 1)");
        assert_eq!(arcs[2], "mi_addarc(0, 25, 0, -25, 180, 1)");
    }

    #[test]
    fn test_label_with_block_assignment() {
        let mut session = FakeSession::new();
        let mut pre = Preprocessor::new(&mut session, Problem::Magnetics);
        let block = BlockAssignment::new("1mm").with_circuit(
            CircuitRef::PerRepetition {
                stem: CircuitName::new("winding").unwrap(),
            },
            -100,
        );
        pre.draw_repetition(&DrawCommand::label(Point::new(75.0, 95.0), block), 2)
            .unwrap();

        assert_eq!(
            session.calls,
            vec![
                "mi_addblocklabel(75, 95)",
                "mi_selectlabel(75, 95)",
                "mi_setblockprop(\"1mm\", 1, 0, \"winding_3\", 0, 0, -100)",
                "mi_clearselected()",
            ]
        );
    }

    #[test]
    fn test_properties_and_document_verbs() {
        let mut session = FakeSession::new();
        let mut pre = Preprocessor::new(&mut session, Problem::Magnetics);
        pre.problem_definition(&ProblemDefinition::default()).unwrap();
        pre.get_material("Air").unwrap();
        pre.add_circuit_prop(&CircuitProp::series(CircuitName::new("winding_1").unwrap(), 10.0))
            .unwrap();
        pre.save_as("C:\\work\\test.fem").unwrap();
        assert!(pre.get_material("").is_err());

        assert_eq!(
            session.calls,
            vec![
                "mi_probdef(0, \"millimeters\", \"planar\", 0.00000001, 1, 30)",
                "mi_getmaterial(\"Air\")",
                "mi_addcircprop(\"winding_1\", 10, 1)",
                "mi_saveas(\"C:/work/test.fem\")",
            ]
        );
    }

    #[test]
    fn test_select_and_delete_verbs() {
        let mut session = FakeSession::new();
        let mut pre = Preprocessor::new(&mut session, Problem::Magnetics);
        pre.select_node(Point::new(1.0, 2.0)).unwrap();
        pre.delete_selected_nodes().unwrap();
        pre.select_label(Point::new(3.0, 4.0)).unwrap();
        pre.delete_selected_labels().unwrap();
        pre.select_segment(Point::new(0.5, 0.0)).unwrap();
        pre.delete_selected_segments().unwrap();
        pre.select_arc_segment(Point::new(0.0, 5.0)).unwrap();
        pre.delete_selected_arc_segments().unwrap();
        pre.select_node(Point::new(9.0, 9.0)).unwrap();
        pre.delete_selected().unwrap();

        assert_eq!(
            session.calls,
            vec![
                "mi_selectnode(1, 2)",
                "mi_deleteselectednodes()",
                "mi_selectlabel(3, 4)",
                "mi_deleteselectedlabels()",
                "mi_selectsegment(0.5, 0)",
                "mi_deleteselectedsegments()",
                "mi_selectarcsegment(0, 5)",
                "mi_deleteselectedarcsegments()",
                "mi_selectnode(9, 9)",
                "mi_deleteselected()",
            ]
        );
    }

    #[test]
    fn test_other_problem_families_use_their_prefix() {
        let mut session = FakeSession::new();
        let mut pre = Preprocessor::new(&mut session, Problem::Current);
        pre.add_node(Point::new(1.0, 2.0)).unwrap();
        assert_eq!(session.calls, vec!["ci_addnode(1, 2)"]);
    }

    #[test]
    fn test_remote_rejection_propagates() {
        let mut session = FakeSession::failing_on("mi_addsegment", 0);
        let mut pre = Preprocessor::new(&mut session, Problem::Magnetics);
        let err = pre
            .draw(&DrawCommand::line(Point::new(0.0, 0.0), Point::new(1.0, 0.0)))
            .unwrap_err();
        assert!(matches!(err, DrawError::Remote(_)));
        assert_eq!(session.calls.len(), 2);
    }
}
