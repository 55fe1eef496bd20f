//! Shared ball-delivery protocol.
//!
//! Once a ball is grabbed, getting it to a deposit cell and coming back is
//! identical in both phases: return to the origin through explored ground,
//! head for the active deposit cell, release, back off one cell. The
//! [`Courier`] owns that protocol plus the carry/deposit bookkeeping; phases
//! hand control to it after a grab and react to the event it emits.

use crate::arena::{Arena, BallColor};
use crate::geometry::{AngleUnits, HALF_TURN, QUARTER_LEFT, QUARTER_RIGHT};
use crate::mission::RobotDriver;
use crate::phases::PhaseStateTag;
use crate::telemetry::{MissionEventKind, TelemetryRecorder};

/// Rotation angles are widened by the drive compensation offset while a ball
/// sits in the gripper; the extra payload drags the turn short otherwise.
#[must_use]
pub const fn widen_for_payload(angle: AngleUnits) -> AngleUnits {
    match angle {
        QUARTER_RIGHT => QUARTER_RIGHT + 1,
        QUARTER_LEFT => QUARTER_LEFT - 1,
        HALF_TURN => HALF_TURN + 3,
        other => other,
    }
}

/// What a courier step means to the owning phase.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum CourierEvent {
    /// Still traveling, rotating, releasing, or backing off.
    Working,
    /// A deposit cycle finished; the phase decides what comes next.
    Deposited,
    /// Reached the origin with nothing to deliver; the drive was stopped.
    ArrivedIdle,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum CourierState {
    ToOrigin,
    ToSafe,
}

/// Delivery engine shared by the exploration and targeted phases.
#[derive(Debug)]
pub(crate) struct Courier {
    state: CourierState,
    carrying: bool,
    color_recorded: bool,
    backoff_pending: bool,
    deposited: u8,
    quota: u8,
}

impl Courier {
    pub(crate) const fn new(quota: u8) -> Self {
        Self {
            state: CourierState::ToOrigin,
            carrying: false,
            color_recorded: false,
            backoff_pending: false,
            deposited: 0,
            quota,
        }
    }

    /// Number of balls released on deposit cells so far.
    pub(crate) const fn deposited(&self) -> u8 {
        self.deposited
    }

    /// True once the configured quota of deposits is met.
    pub(crate) const fn quota_met(&self) -> bool {
        self.deposited == self.quota
    }

    /// Starts a carry cycle right after the gripper closed on a ball.
    pub(crate) fn begin_carry(&mut self) {
        self.carrying = true;
        self.color_recorded = false;
        self.state = CourierState::ToOrigin;
    }

    /// Starts an empty-handed return to the origin (coverage reached or the
    /// target list ran out).
    pub(crate) fn begin_return(&mut self) {
        self.carrying = false;
        self.state = CourierState::ToOrigin;
    }

    /// Advances the delivery protocol by one decision.
    pub(crate) fn step<D: RobotDriver>(
        &mut self,
        arena: &mut Arena,
        driver: &mut D,
        sensed_color: BallColor,
        recorder: &mut TelemetryRecorder,
        at_step: u32,
    ) -> CourierEvent {
        match self.state {
            CourierState::ToOrigin => self.step_to_origin(arena, driver, sensed_color, recorder, at_step),
            CourierState::ToSafe => self.step_to_safe(arena, driver, recorder, at_step),
        }
    }

    #[allow(clippy::if_not_else)]
    fn step_to_origin<D: RobotDriver>(
        &mut self,
        arena: &mut Arena,
        driver: &mut D,
        sensed_color: BallColor,
        recorder: &mut TelemetryRecorder,
        at_step: u32,
    ) -> CourierEvent {
        // Capture the payload color once per carry, keyed by the grab cell.
        if self.carrying && !self.color_recorded {
            self.color_recorded = true;
            arena.record_carried_color(sensed_color);
            if let Some(at) = arena.grab_point() {
                recorder.record(MissionEventKind::ColorRecorded(at, sensed_color), at_step);
            }
        }

        if arena.can_advance_to_origin() {
            driver.move_by(arena.advance());
        } else if !arena.is_at_origin() {
            let turn = arena.plan_return_turn();
            let angle = if self.carrying {
                widen_for_payload(turn.angle)
            } else {
                turn.angle
            };
            arena.commit_turn(turn);
            driver.rotate_by(angle);
        } else if self.carrying {
            self.state = CourierState::ToSafe;
            recorder.record(
                MissionEventKind::StateEntered(PhaseStateTag::GoToSafe),
                at_step,
            );
        } else {
            driver.stop();
            return CourierEvent::ArrivedIdle;
        }
        CourierEvent::Working
    }

    fn step_to_safe<D: RobotDriver>(
        &mut self,
        arena: &mut Arena,
        driver: &mut D,
        recorder: &mut TelemetryRecorder,
        at_step: u32,
    ) -> CourierEvent {
        if arena.can_advance_to_safe() && self.carrying {
            driver.move_by(arena.advance());
        } else if !arena.is_at_safe() && self.carrying {
            let turn = arena.plan_safe_turn();
            arena.commit_turn(turn);
            driver.rotate_by(widen_for_payload(turn.angle));
        } else if arena.is_at_safe() && self.carrying {
            driver.open_gripper();
            let at = arena.current_position();
            arena.record_release();
            self.deposited += 1;
            self.carrying = false;
            self.backoff_pending = true;
            recorder.record(MissionEventKind::BallDeposited(at), at_step);
        } else if self.backoff_pending {
            self.backoff_pending = false;
            driver.move_by(arena.retreat());
        } else if self.quota_met() {
            self.state = CourierState::ToOrigin;
            recorder.record(
                MissionEventKind::StateEntered(PhaseStateTag::GoToOrigin),
                at_step,
            );
        } else {
            self.state = CourierState::ToOrigin;
            return CourierEvent::Deposited;
        }
        CourierEvent::Working
    }
}
