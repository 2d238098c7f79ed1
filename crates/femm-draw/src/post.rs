//! Post-processor verbs: selecting solved regions and extracting results

use serde::{Deserialize, Serialize};

use crate::command::Group;
use crate::error::Result;
use crate::geometry::Point;
use crate::session::{Arg, Mode, Problem, Reply, Session};

/// Block integral selectors (`mo_blockintegral`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockIntegral {
    Energy,
    Area,
    TotalCurrent,
    Volume,
    LorentzForceX,
    LorentzForceY,
    LorentzTorque,
    Coenergy,
    /// Weighted stress tensor force, x (or r)
    ForceX,
    /// Weighted stress tensor force, y (or z)
    ForceY,
    /// Weighted stress tensor torque
    Torque,
}

impl BlockIntegral {
    pub fn code(self) -> i64 {
        match self {
            BlockIntegral::Energy => 2,
            BlockIntegral::Area => 5,
            BlockIntegral::TotalCurrent => 7,
            BlockIntegral::Volume => 10,
            BlockIntegral::LorentzForceX => 11,
            BlockIntegral::LorentzForceY => 12,
            BlockIntegral::LorentzTorque => 15,
            BlockIntegral::Coenergy => 17,
            BlockIntegral::ForceX => 18,
            BlockIntegral::ForceY => 19,
            BlockIntegral::Torque => 22,
        }
    }
}

/// Quantity shown by a density plot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityPlot {
    #[default]
    Bmag,
    Breal,
    Bimag,
    Jmag,
    Jreal,
    Jimag,
}

impl DensityPlot {
    pub fn femm_name(self) -> &'static str {
        match self {
            DensityPlot::Bmag => "bmag",
            DensityPlot::Breal => "breal",
            DensityPlot::Bimag => "bimag",
            DensityPlot::Jmag => "jmag",
            DensityPlot::Jreal => "jreal",
            DensityPlot::Jimag => "jimag",
        }
    }
}

pub struct Postprocessor<'s> {
    session: &'s mut dyn Session,
    problem: Problem,
}

impl<'s> Postprocessor<'s> {
    pub fn new(session: &'s mut dyn Session, problem: Problem) -> Self {
        Self { session, problem }
    }

    fn call(&mut self, verb: &str, args: &[Arg]) -> Result<()> {
        let command = self.problem.command(Mode::Post, verb);
        self.session.call(&command, args)?;
        Ok(())
    }

    fn query(&mut self, verb: &str, args: &[Arg]) -> Result<Reply> {
        let command = self.problem.command(Mode::Post, verb);
        Ok(self.session.query(&command, args)?)
    }

    pub fn group_select_block(&mut self, group: Group) -> Result<()> {
        self.call("groupselectblock", &[group.0.into()])
    }

    pub fn clear_block(&mut self) -> Result<()> {
        self.call("clearblock", &[])
    }

    /// Integral over the selected blocks
    pub fn block_integral(&mut self, integral: BlockIntegral) -> Result<Reply> {
        self.query("blockintegral", &[integral.code().into()])
    }

    /// Integral along the defined contour; `kind` is the engine's selector
    pub fn line_integral(&mut self, kind: i64) -> Result<Reply> {
        self.query("lineintegral", &[kind.into()])
    }

    pub fn get_point_values(&mut self, at: Point) -> Result<Reply> {
        self.query("getpointvalues", &[at.x.into(), at.y.into()])
    }

    /// Show a density plot with automatic bounds
    pub fn show_density_plot(&mut self, plot: DensityPlot) -> Result<()> {
        self.call(
            "showdensityplot",
            &[1i64.into(), 0i64.into(), 0.0.into(), 0.0.into(), plot.femm_name().into()],
        )
    }

    /// Select every block in `group` and integrate over it
    pub fn integrate_group(&mut self, group: Group, integral: BlockIntegral) -> Result<Reply> {
        self.group_select_block(group)?;
        let reply = self.block_integral(integral)?;
        self.clear_block()?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{testing::FakeSession, ScriptSession};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_integrate_group() {
        let mut session = FakeSession::new();
        let mut post = Postprocessor::new(&mut session, Problem::Magnetics);
        post.integrate_group(Group(2), BlockIntegral::ForceY).unwrap();

        assert_eq!(
            session.calls,
            vec!["mo_groupselectblock(2)", "mo_blockintegral(19)", "mo_clearblock()"]
        );
    }

    #[test]
    fn test_queries_become_probes_offline() {
        let mut session = ScriptSession::new();
        let mut post = Postprocessor::new(&mut session, Problem::Magnetics);
        post.show_density_plot(DensityPlot::Bmag).unwrap();
        post.get_point_values(Point::new(60.0, 60.0)).unwrap();
        post.line_integral(3).unwrap();

        assert_eq!(session.probe_names(), vec!["result_1", "result_2"]);
        assert_eq!(
            session.lines().collect::<Vec<_>>(),
            vec![
                "mo_showdensityplot(1, 0, 0, 0, \"bmag\")",
                "mo_getpointvalues(60, 60)",
                "mo_lineintegral(3)",
            ]
        );
    }
}
