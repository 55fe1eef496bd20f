//! Simulated robot implementing the actuation contract.
//!
//! The simulation dead-reckons its pose from the commands it receives; it is
//! a protocol collaborator, not a physics model. Each actuation arms a busy
//! countdown so the mission's admission-control gate sees a drive that takes
//! time to finish.

use mission_core::arena::BallColor;
use mission_core::geometry::{AngleUnits, Heading, Point};
use mission_core::mission::RobotDriver;

/// A colored ball placed on a field cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SimBall {
    pub at: Point,
    pub color: BallColor,
}

impl SimBall {
    #[must_use]
    pub const fn new(at: Point, color: BallColor) -> Self {
        Self { at, color }
    }
}

/// Dead-reckoning robot simulation.
pub struct SimRobot {
    position: Point,
    heading: Heading,
    balls: Vec<SimBall>,
    holding: Option<BallColor>,
    busy_ticks: u32,
    busy_left: u32,
    moves_issued: u32,
    rotations_issued: u32,
    stopped: bool,
}

impl SimRobot {
    /// Places the robot on its entry cell. `heading` must match what the
    /// mission derived for that entry.
    #[must_use]
    pub fn new(position: Point, heading: Heading, balls: Vec<SimBall>, busy_ticks: u32) -> Self {
        Self {
            position,
            heading,
            balls,
            holding: None,
            busy_ticks,
            busy_left: 0,
            moves_issued: 0,
            rotations_issued: 0,
            stopped: false,
        }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    #[must_use]
    pub fn heading(&self) -> Heading {
        self.heading
    }

    #[must_use]
    pub fn balls_left(&self) -> usize {
        self.balls.len()
    }

    #[must_use]
    pub fn moves_issued(&self) -> u32 {
        self.moves_issued
    }

    #[must_use]
    pub fn rotations_issued(&self) -> u32 {
        self.rotations_issued
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn ball_index_at(&self, at: Point) -> Option<usize> {
        self.balls.iter().position(|ball| ball.at == at)
    }
}

impl RobotDriver for SimRobot {
    fn is_busy(&mut self) -> bool {
        if self.busy_left > 0 {
            self.busy_left -= 1;
            true
        } else {
            false
        }
    }

    fn object_in_range(&mut self) -> bool {
        self.holding.is_none()
            && self
                .ball_index_at(self.position.stepped(self.heading))
                .is_some()
    }

    fn sense_color(&mut self) -> BallColor {
        self.holding.unwrap_or(BallColor::Red)
    }

    fn move_by(&mut self, distance: i32) {
        self.busy_left = self.busy_ticks;
        self.moves_issued += 1;
        self.position = if distance >= 0 {
            self.position.stepped(self.heading)
        } else {
            self.position.stepped(self.heading.reversed())
        };
    }

    fn rotate_by(&mut self, angle: AngleUnits) {
        self.busy_left = self.busy_ticks;
        self.rotations_issued += 1;
        self.heading = match angle {
            -9 | -8 => self.heading.turned_left(),
            8 | 9 => self.heading.turned_right(),
            16 | 19 => self.heading.reversed(),
            _ => self.heading,
        };
    }

    fn close_gripper(&mut self) {
        let reach = self
            .ball_index_at(self.position)
            .or_else(|| self.ball_index_at(self.position.stepped(self.heading)));
        if let Some(index) = reach {
            let ball = self.balls.remove(index);
            self.holding = Some(ball.color);
        }
    }

    fn open_gripper(&mut self) {
        self.holding = None;
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}
