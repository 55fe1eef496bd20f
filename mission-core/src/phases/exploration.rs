//! Boustrophedon exploration phase.
//!
//! The robot sweeps the field line by line until every cell is explored,
//! grabbing any ball the range sensor reports along the way. Each grab
//! interrupts the sweep: the courier delivers the ball, then the phase walks
//! back to the recorded grab pose and resumes the sweep exactly where it
//! left off, including the interrupted sub-action.

use crate::arena::Arena;
use crate::mission::RobotDriver;
use crate::phases::delivery::{Courier, CourierEvent};
use crate::phases::{PhaseStateTag, SensorFrame};
use crate::telemetry::{MissionEventKind, TelemetryRecorder};

/// Sub-action of the sweep while searching.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum SweepAction {
    MovingOnLine,
    RotatingFirst,
    ChangingLine,
    RotatingSecond,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ExplorationState {
    Search,
    Deliver,
    GoToLastPoint,
}

/// Sweep-the-field mission phase.
#[derive(Debug)]
pub struct ExplorationPhase {
    state: ExplorationState,
    action: SweepAction,
    courier: Courier,
}

impl ExplorationPhase {
    #[must_use]
    pub(crate) const fn new(quota: u8) -> Self {
        Self {
            state: ExplorationState::Search,
            action: SweepAction::MovingOnLine,
            courier: Courier::new(quota),
        }
    }

    /// Number of balls deposited so far.
    #[must_use]
    pub const fn deposited(&self) -> u8 {
        self.courier.deposited()
    }

    /// Termination predicate: quota met or field fully explored, and the
    /// robot is back on its entry cell.
    #[must_use]
    pub fn is_complete(&self, arena: &Arena) -> bool {
        (self.courier.quota_met() || arena.is_covered()) && arena.is_at_origin()
    }

    /// Consumes one poll iteration: at most one drive command is issued.
    pub fn step<D: RobotDriver>(
        &mut self,
        arena: &mut Arena,
        driver: &mut D,
        frame: &SensorFrame,
        recorder: &mut TelemetryRecorder,
        at_step: u32,
    ) {
        match self.state {
            ExplorationState::Search => self.search_step(arena, driver, frame, recorder, at_step),
            ExplorationState::Deliver => {
                if self.courier.step(arena, driver, frame.color, recorder, at_step)
                    == CourierEvent::Deposited
                {
                    self.state = ExplorationState::GoToLastPoint;
                    recorder.record(
                        MissionEventKind::StateEntered(PhaseStateTag::GoToLastPoint),
                        at_step,
                    );
                }
            }
            ExplorationState::GoToLastPoint => self.restore_step(arena, driver, recorder, at_step),
        }
    }

    fn search_step<D: RobotDriver>(
        &mut self,
        arena: &mut Arena,
        driver: &mut D,
        frame: &SensorFrame,
        recorder: &mut TelemetryRecorder,
        at_step: u32,
    ) {
        if arena.can_advance() && self.action == SweepAction::MovingOnLine && !frame.object_in_range
        {
            driver.move_by(arena.advance());
        } else if arena.is_covered() {
            self.courier.begin_return();
            self.state = ExplorationState::Deliver;
            recorder.record(
                MissionEventKind::StateEntered(PhaseStateTag::GoToOrigin),
                at_step,
            );
        } else if frame.object_in_range {
            driver.close_gripper();
            arena.record_grab();
            self.courier.begin_carry();
            self.state = ExplorationState::Deliver;
            recorder.record(
                MissionEventKind::BallGrabbed(arena.current_position()),
                at_step,
            );
            recorder.record(
                MissionEventKind::StateEntered(PhaseStateTag::GoToOrigin),
                at_step,
            );
        } else {
            self.change_line(arena, driver);
        }
    }

    /// Line change: two quarter turns with a transit in between. The second
    /// turn is skipped when the sweep has nowhere further to fold into.
    fn change_line<D: RobotDriver>(&mut self, arena: &mut Arena, driver: &mut D) {
        match self.action {
            SweepAction::MovingOnLine => {
                self.action = SweepAction::RotatingFirst;
            }
            SweepAction::RotatingFirst => {
                let turn = arena.plan_sweep_turn();
                arena.commit_turn(turn);
                driver.rotate_by(turn.angle);
                self.action = SweepAction::ChangingLine;
            }
            SweepAction::ChangingLine => {
                if arena.has_reached_new_line() {
                    self.action = if arena.needs_second_turn() {
                        SweepAction::RotatingSecond
                    } else {
                        SweepAction::MovingOnLine
                    };
                }
                driver.move_by(arena.advance());
            }
            SweepAction::RotatingSecond => {
                let turn = arena.plan_sweep_turn();
                arena.commit_turn(turn);
                driver.rotate_by(turn.angle);
                self.action = SweepAction::MovingOnLine;
            }
        }
    }

    /// Walks back to the recorded grab pose and restores its heading; the
    /// sweep then resumes with the sub-action it was interrupted in.
    #[allow(clippy::if_not_else)]
    fn restore_step<D: RobotDriver>(
        &mut self,
        arena: &mut Arena,
        driver: &mut D,
        recorder: &mut TelemetryRecorder,
        at_step: u32,
    ) {
        if arena.can_advance_to_grab_point() {
            driver.move_by(arena.advance());
        } else if !arena.is_at_grab_point() {
            let turn = arena.plan_return_turn();
            arena.commit_turn(turn);
            driver.rotate_by(turn.angle);
        } else if !arena.heading_matches_grab() {
            let turn = arena.plan_realign_turn();
            arena.commit_turn(turn);
            driver.rotate_by(turn.angle);
        } else {
            self.state = ExplorationState::Search;
            recorder.record(
                MissionEventKind::StateEntered(PhaseStateTag::Search),
                at_step,
            );
        }
    }
}
