//! Mission lifecycle: actuation contract, configuration, poll loop.
//!
//! The loop is deliberately dumb: one poll iteration reads the sensor
//! frame, lets the active phase make at most one decision while the drive is
//! idle, drains arena read logs into telemetry, and re-evaluates the
//! termination predicate. `run` wraps that with a cancellation hook and a
//! step budget so a stuck mission degrades to a reported stall instead of a
//! spin.

use heapless::Vec;

use crate::arena::{Arena, ArenaError, BallColor, MAX_TRACKED_BALLS};
use crate::geometry::{AngleUnits, Point};
use crate::phases::{ExplorationPhase, PhaseStateTag, SensorFrame, TargetedPhase};
use crate::telemetry::{MissionEventKind, TelemetryRecorder};

use core::fmt;

/// Poll-iteration budget per grid cell used when the config leaves the step
/// limit unset. Generous: busy-waiting on the drive burns iterations too.
const DEFAULT_STEP_FACTOR: u32 = 1024;

/// Actuation and sensing contract the mission polls against.
///
/// Implementations own all timing, units below the cell scale, and hardware
/// failure handling; the mission only issues cell-grained commands and
/// trusts `is_busy` for admission control.
pub trait RobotDriver {
    /// True while a previously issued command is still executing.
    fn is_busy(&mut self) -> bool;
    /// True when the range sensor reports a ball within gripper reach.
    fn object_in_range(&mut self) -> bool;
    /// Current color sensor classification.
    fn sense_color(&mut self) -> BallColor;
    /// Travels the signed distance, in the mission's cell-length units.
    fn move_by(&mut self, distance: i32);
    /// Rotates by the signed angle quantity.
    fn rotate_by(&mut self, angle: AngleUnits);
    /// Closes the gripper on a ball.
    fn close_gripper(&mut self);
    /// Opens the gripper, releasing any held ball.
    fn open_gripper(&mut self);
    /// Halts the drive.
    fn stop(&mut self);
}

/// Driver that ignores every command; useful for wiring and dry runs.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopRobotDriver;

impl RobotDriver for NoopRobotDriver {
    fn is_busy(&mut self) -> bool {
        false
    }

    fn object_in_range(&mut self) -> bool {
        false
    }

    fn sense_color(&mut self) -> BallColor {
        BallColor::Red
    }

    fn move_by(&mut self, _distance: i32) {}

    fn rotate_by(&mut self, _angle: AngleUnits) {}

    fn close_gripper(&mut self) {}

    fn open_gripper(&mut self) {}

    fn stop(&mut self) {}
}

/// Mission parameters supplied by the operator surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MissionConfig {
    /// Playable field width in cells.
    pub width: u16,
    /// Playable field height in cells.
    pub height: u16,
    /// Cell edge length in drive distance units.
    pub cell_length: f32,
    /// Entry cell on the playable boundary ring.
    pub entry: Point,
    /// Number of deposits that completes the mission.
    pub deposit_quota: u8,
    /// Poll-iteration budget; `None` derives one from the grid size.
    pub step_limit: Option<u32>,
}

impl MissionConfig {
    /// Deposits required by default.
    pub const DEFAULT_DEPOSIT_QUOTA: u8 = 3;

    #[must_use]
    pub const fn new(width: u16, height: u16, cell_length: f32, entry: Point) -> Self {
        Self {
            width,
            height,
            cell_length,
            entry,
            deposit_quota: Self::DEFAULT_DEPOSIT_QUOTA,
            step_limit: None,
        }
    }

    #[must_use]
    pub const fn with_quota(mut self, deposit_quota: u8) -> Self {
        self.deposit_quota = deposit_quota;
        self
    }

    #[must_use]
    pub const fn with_step_limit(mut self, step_limit: u32) -> Self {
        self.step_limit = Some(step_limit);
        self
    }
}

/// Recoverable mission construction failures.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MissionError {
    /// Arena construction or entry placement failed.
    Arena(ArenaError),
    /// The deposit quota is zero or above [`MAX_TRACKED_BALLS`].
    QuotaOutOfRange(u8),
    /// The targeted phase needs at least one target.
    MissingTargets,
    /// More targets than the mission can track.
    TooManyTargets(usize),
}

impl From<ArenaError> for MissionError {
    fn from(error: ArenaError) -> Self {
        MissionError::Arena(error)
    }
}

impl fmt::Display for MissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissionError::Arena(error) => write!(f, "{error}"),
            MissionError::QuotaOutOfRange(quota) => {
                write!(f, "deposit quota {quota} out of range")
            }
            MissionError::MissingTargets => f.write_str("targeted mission needs at least one target"),
            MissionError::TooManyTargets(count) => {
                write!(f, "{count} targets exceed the tracking capacity")
            }
        }
    }
}

/// Outcome of a poll iteration or a full run.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MissionStatus {
    /// The termination predicate does not hold yet.
    Running,
    /// The mission finished and the drive was stopped.
    Complete,
    /// The cancellation hook fired; the drive was stopped.
    Stopped,
    /// The step budget ran out; the drive was stopped.
    Stalled,
}

#[derive(Debug)]
enum PhaseRunner {
    Exploration(ExplorationPhase),
    Targeted(TargetedPhase),
}

/// A configured mission bound to an arena, a phase, and a telemetry log.
#[derive(Debug)]
pub struct Mission {
    arena: Arena,
    phase: PhaseRunner,
    telemetry: TelemetryRecorder,
    steps: u32,
    step_limit: u32,
    finished: bool,
}

impl Mission {
    /// Builds an exploration (sweep) mission.
    ///
    /// # Errors
    /// Rejects invalid quotas and arena construction failures.
    pub fn explore(config: &MissionConfig) -> Result<Self, MissionError> {
        let phase = PhaseRunner::Exploration(ExplorationPhase::new(config.deposit_quota));
        Self::build(config, phase, PhaseStateTag::Search)
    }

    /// Builds a targeted retrieval mission over an ordered ball list.
    ///
    /// # Errors
    /// Rejects empty or over-long target lists, invalid quotas, and arena
    /// construction failures.
    pub fn fetch(config: &MissionConfig, targets: &[Point]) -> Result<Self, MissionError> {
        if targets.is_empty() {
            return Err(MissionError::MissingTargets);
        }
        let targets = Vec::from_slice(targets)
            .map_err(|_| MissionError::TooManyTargets(targets.len()))?;
        let phase = PhaseRunner::Targeted(TargetedPhase::new(config.deposit_quota, targets));
        Self::build(config, phase, PhaseStateTag::GoToBall)
    }

    fn build(
        config: &MissionConfig,
        phase: PhaseRunner,
        initial_state: PhaseStateTag,
    ) -> Result<Self, MissionError> {
        if config.deposit_quota == 0 || usize::from(config.deposit_quota) > MAX_TRACKED_BALLS {
            return Err(MissionError::QuotaOutOfRange(config.deposit_quota));
        }
        let mut arena = Arena::new(config.width, config.height, config.cell_length)?;
        arena.starting_point(config.entry)?;

        let cells = u32::from(config.width + 2) * u32::from(config.height + 2);
        let step_limit = config
            .step_limit
            .unwrap_or(cells.saturating_mul(DEFAULT_STEP_FACTOR));

        let mut telemetry = TelemetryRecorder::new();
        telemetry.record(MissionEventKind::StateEntered(initial_state), 0);

        Ok(Self {
            arena,
            phase,
            telemetry,
            steps: 0,
            step_limit,
            finished: false,
        })
    }

    /// Arena snapshot, for rendering and assertions.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Telemetry log accumulated so far.
    #[must_use]
    pub const fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    /// Number of balls deposited so far.
    #[must_use]
    pub const fn deposited(&self) -> u8 {
        match &self.phase {
            PhaseRunner::Exploration(phase) => phase.deposited(),
            PhaseRunner::Targeted(phase) => phase.deposited(),
        }
    }

    /// Poll iterations consumed so far.
    #[must_use]
    pub const fn steps(&self) -> u32 {
        self.steps
    }

    /// True once the mission reported [`MissionStatus::Complete`].
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Writes the final grid via the arena renderer.
    ///
    /// # Errors
    /// Propagates sink write failures.
    pub fn render_final(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        self.arena.render_final(out)
    }

    /// Performs one poll iteration.
    pub fn step<D: RobotDriver>(&mut self, driver: &mut D) -> MissionStatus {
        if self.finished {
            return MissionStatus::Complete;
        }

        let at_step = self.steps;
        self.steps = self.steps.saturating_add(1);

        let frame = SensorFrame {
            object_in_range: driver.object_in_range(),
            color: driver.sense_color(),
        };

        if !driver.is_busy() {
            match &mut self.phase {
                PhaseRunner::Exploration(phase) => {
                    phase.step(&mut self.arena, driver, &frame, &mut self.telemetry, at_step);
                }
                PhaseRunner::Targeted(phase) => {
                    phase.step(&mut self.arena, driver, &frame, &mut self.telemetry, at_step);
                }
            }
        }

        if let Some(at) = self.arena.take_logged_read() {
            self.telemetry
                .record(MissionEventKind::OutOfRangeRead(at), at_step);
        }

        let complete = match &self.phase {
            PhaseRunner::Exploration(phase) => phase.is_complete(&self.arena),
            PhaseRunner::Targeted(phase) => phase.is_complete(&self.arena),
        };
        if complete {
            self.finished = true;
            driver.stop();
            self.telemetry
                .record(MissionEventKind::MissionComplete, at_step);
            MissionStatus::Complete
        } else {
            MissionStatus::Running
        }
    }

    /// Drives [`Mission::step`] until completion, cancellation, or budget
    /// exhaustion. `should_stop` is checked before every iteration.
    pub fn run<D, F>(&mut self, driver: &mut D, mut should_stop: F) -> MissionStatus
    where
        D: RobotDriver,
        F: FnMut() -> bool,
    {
        loop {
            if should_stop() {
                driver.stop();
                self.telemetry
                    .record(MissionEventKind::MissionStopped, self.steps);
                return MissionStatus::Stopped;
            }
            if self.steps >= self.step_limit {
                driver.stop();
                self.telemetry
                    .record(MissionEventKind::MissionStalled, self.steps);
                return MissionStatus::Stalled;
            }
            match self.step(driver) {
                MissionStatus::Running => {}
                done => return done,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_quota_and_target_lists() {
        let config = MissionConfig::new(4, 4, 30.0, Point::new(4, 1));
        assert_eq!(
            Mission::explore(&config.with_quota(0)).err(),
            Some(MissionError::QuotaOutOfRange(0))
        );
        assert_eq!(
            Mission::explore(&config.with_quota(9)).err(),
            Some(MissionError::QuotaOutOfRange(9))
        );
        assert_eq!(
            Mission::fetch(&config, &[]).err(),
            Some(MissionError::MissingTargets)
        );
        let too_many = [Point::new(2, 2); 9];
        assert_eq!(
            Mission::fetch(&config, &too_many).err(),
            Some(MissionError::TooManyTargets(9))
        );
    }

    #[test]
    fn propagates_arena_errors() {
        let config = MissionConfig::new(0, 4, 30.0, Point::new(1, 1));
        assert!(matches!(
            Mission::explore(&config),
            Err(MissionError::Arena(ArenaError::DimensionsOutOfRange { .. }))
        ));
        let config = MissionConfig::new(4, 4, 30.0, Point::new(2, 2));
        assert!(matches!(
            Mission::explore(&config),
            Err(MissionError::Arena(ArenaError::EntryOffBoundary(_)))
        ));
    }

    #[test]
    fn exploration_with_no_balls_completes_against_the_noop_driver() {
        let config = MissionConfig::new(4, 4, 30.0, Point::new(4, 1));
        let mut mission = Mission::explore(&config).unwrap();
        let mut driver = NoopRobotDriver;

        let status = mission.run(&mut driver, || false);
        assert_eq!(status, MissionStatus::Complete);
        assert!(mission.is_finished());
        assert_eq!(mission.deposited(), 0);
        assert!(mission.arena().is_covered());
        assert!(mission.arena().is_at_origin());
    }

    #[test]
    fn cancellation_stops_before_any_iteration() {
        let config = MissionConfig::new(4, 4, 30.0, Point::new(4, 1));
        let mut mission = Mission::explore(&config).unwrap();
        let mut driver = NoopRobotDriver;

        assert_eq!(mission.run(&mut driver, || true), MissionStatus::Stopped);
        assert_eq!(mission.steps(), 0);
        assert_eq!(
            mission.telemetry().latest().map(|record| record.event),
            Some(MissionEventKind::MissionStopped)
        );
    }

    #[test]
    fn tiny_step_budget_reports_a_stall() {
        let config = MissionConfig::new(4, 4, 30.0, Point::new(4, 1)).with_step_limit(2);
        let mut mission = Mission::explore(&config).unwrap();
        let mut driver = NoopRobotDriver;

        assert_eq!(mission.run(&mut driver, || false), MissionStatus::Stalled);
        assert_eq!(
            mission.telemetry().latest().map(|record| record.event),
            Some(MissionEventKind::MissionStalled)
        );
    }

    #[test]
    fn stepping_a_finished_mission_is_a_no_op() {
        let config = MissionConfig::new(1, 1, 30.0, Point::new(1, 1));
        let mut mission = Mission::explore(&config).unwrap();
        let mut driver = NoopRobotDriver;

        assert_eq!(mission.run(&mut driver, || false), MissionStatus::Complete);
        let steps = mission.steps();
        assert_eq!(mission.step(&mut driver), MissionStatus::Complete);
        assert_eq!(mission.steps(), steps);
    }
}
