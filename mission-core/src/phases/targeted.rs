//! Targeted retrieval phase.
//!
//! Ball positions are known up front; the phase walks to each listed cell in
//! order (indexed by the number of deposits already made), grabs on arrival
//! without consulting the range sensor, and hands the courier the delivery.
//! A list shorter than the quota is not an error: once it runs out the phase
//! returns to the origin empty-handed and terminates there.

use heapless::Vec;

use crate::arena::{Arena, MAX_TRACKED_BALLS};
use crate::geometry::Point;
use crate::mission::RobotDriver;
use crate::phases::delivery::{Courier, CourierEvent};
use crate::phases::{PhaseStateTag, SensorFrame};
use crate::telemetry::{MissionEventKind, TelemetryRecorder};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum TargetedState {
    GoToBall,
    Deliver,
}

/// Retrieve-known-balls mission phase.
#[derive(Debug)]
pub struct TargetedPhase {
    state: TargetedState,
    targets: Vec<Point, MAX_TRACKED_BALLS>,
    exhausted: bool,
    courier: Courier,
}

impl TargetedPhase {
    #[must_use]
    pub(crate) const fn new(quota: u8, targets: Vec<Point, MAX_TRACKED_BALLS>) -> Self {
        Self {
            state: TargetedState::GoToBall,
            targets,
            exhausted: false,
            courier: Courier::new(quota),
        }
    }

    /// Number of balls deposited so far.
    #[must_use]
    pub const fn deposited(&self) -> u8 {
        self.courier.deposited()
    }

    /// Termination predicate: quota met, field explored, or target list
    /// exhausted, and the robot is back on its entry cell.
    #[must_use]
    pub fn is_complete(&self, arena: &Arena) -> bool {
        (self.courier.quota_met() || arena.is_covered() || self.exhausted)
            && arena.is_at_origin()
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
            TargetedState::GoToBall => self.approach_step(arena, driver, recorder, at_step),
            TargetedState::Deliver => {
                if self.courier.step(arena, driver, frame.color, recorder, at_step)
                    == CourierEvent::Deposited
                {
                    self.state = TargetedState::GoToBall;
                    recorder.record(
                        MissionEventKind::StateEntered(PhaseStateTag::GoToBall),
                        at_step,
                    );
                }
            }
        }
    }

    #[allow(clippy::if_not_else)]
    fn approach_step<D: RobotDriver>(
        &mut self,
        arena: &mut Arena,
        driver: &mut D,
        recorder: &mut TelemetryRecorder,
        at_step: u32,
    ) {
        let Some(target) = self.targets.get(usize::from(self.courier.deposited())).copied()
        else {
            self.exhausted = true;
            self.courier.begin_return();
            self.state = TargetedState::Deliver;
            recorder.record(
                MissionEventKind::StateEntered(PhaseStateTag::GoToOrigin),
                at_step,
            );
            return;
        };

        if arena.can_advance_to_ball(target) {
            driver.move_by(arena.advance());
        } else if !arena.is_at(target) {
            let turn = arena.plan_ball_turn();
            arena.commit_turn(turn);
            driver.rotate_by(turn.angle);
        } else {
            driver.close_gripper();
            arena.record_grab();
            self.courier.begin_carry();
            self.state = TargetedState::Deliver;
            recorder.record(
                MissionEventKind::BallGrabbed(arena.current_position()),
                at_step,
            );
            recorder.record(
                MissionEventKind::StateEntered(PhaseStateTag::GoToOrigin),
                at_step,
            );
        }
    }
}
