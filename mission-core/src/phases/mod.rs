//! Mission phase state machines.
//!
//! Both phases consume one decision per poll iteration: read the sensor
//! frame, consult the arena, issue at most one drive command. Delivery of a
//! carried ball is the same protocol in both phases and lives in
//! [`delivery::Courier`]; the owning phase only decides what follows a
//! deposit (resume the sweep vs. head for the next target).

pub mod delivery;
pub mod exploration;
pub mod targeted;

use core::fmt;

pub use exploration::ExplorationPhase;
pub use targeted::TargetedPhase;

use crate::arena::BallColor;

/// Sensor inputs sampled once per poll iteration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SensorFrame {
    /// True when the range sensor reports a ball within gripper reach.
    pub object_in_range: bool,
    /// Current color sensor classification.
    pub color: BallColor,
}

/// Coarse phase states reported through telemetry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PhaseStateTag {
    Search,
    GoToBall,
    GoToOrigin,
    GoToSafe,
    GoToLastPoint,
}

impl fmt::Display for PhaseStateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseStateTag::Search => f.write_str("search"),
            PhaseStateTag::GoToBall => f.write_str("go-to-ball"),
            PhaseStateTag::GoToOrigin => f.write_str("go-to-origin"),
            PhaseStateTag::GoToSafe => f.write_str("go-to-safe"),
            PhaseStateTag::GoToLastPoint => f.write_str("go-to-last-point"),
        }
    }
}
