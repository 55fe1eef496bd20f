use mission_core::arena::{BallColor, CellState};
use mission_core::geometry::{AngleUnits, Heading, Point};
use mission_core::mission::{Mission, MissionConfig, MissionStatus, RobotDriver};
use mission_core::telemetry::MissionEventKind;

/// Dead-reckoning driver fixture; see the exploration tests for the same
/// shape. Targeted missions grab with the robot standing on the ball cell.
struct ScriptedDriver {
    position: Point,
    heading: Heading,
    balls: Vec<(Point, BallColor)>,
    holding: Option<BallColor>,
    grabbed_from: Vec<Point>,
    stopped: bool,
}

impl ScriptedDriver {
    fn new(position: Point, heading: Heading, balls: Vec<(Point, BallColor)>) -> Self {
        Self {
            position,
            heading,
            balls,
            holding: None,
            grabbed_from: Vec::new(),
            stopped: false,
        }
    }

    fn ball_at(&self, at: Point) -> Option<usize> {
        self.balls.iter().position(|(cell, _)| *cell == at)
    }
}

impl RobotDriver for ScriptedDriver {
    fn is_busy(&mut self) -> bool {
        false
    }

    fn object_in_range(&mut self) -> bool {
        self.holding.is_none() && self.ball_at(self.position.stepped(self.heading)).is_some()
    }

    fn sense_color(&mut self) -> BallColor {
        self.holding.unwrap_or(BallColor::Red)
    }

    fn move_by(&mut self, distance: i32) {
        self.position = if distance >= 0 {
            self.position.stepped(self.heading)
        } else {
            self.position.stepped(self.heading.reversed())
        };
    }

    fn rotate_by(&mut self, angle: AngleUnits) {
        self.heading = match angle {
            -9 | -8 => self.heading.turned_left(),
            8 | 9 => self.heading.turned_right(),
            16 | 19 => self.heading.reversed(),
            0 => self.heading,
            other => panic!("unexpected rotation angle {other}"),
        };
    }

    fn close_gripper(&mut self) {
        let reach = self
            .ball_at(self.position)
            .or_else(|| self.ball_at(self.position.stepped(self.heading)));
        let index = reach.expect("gripper closed with no ball in reach");
        let (_, color) = self.balls.remove(index);
        self.holding = Some(color);
        self.grabbed_from.push(self.position);
    }

    fn open_gripper(&mut self) {
        self.holding = None;
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

fn config_4x4() -> MissionConfig {
    MissionConfig::new(4, 4, 30.0, Point::new(4, 1))
}

fn ball_world() -> Vec<(Point, BallColor)> {
    vec![
        (Point::new(3, 2), BallColor::Red),
        (Point::new(1, 1), BallColor::Yellow),
        (Point::new(2, 3), BallColor::Blue),
        (Point::new(2, 2), BallColor::Red),
    ]
}

#[test]
fn visits_targets_in_list_order_and_stops_at_the_quota() {
    let targets = [
        Point::new(3, 2),
        Point::new(1, 1),
        Point::new(2, 3),
        Point::new(2, 2),
    ];
    let mut mission = Mission::fetch(&config_4x4(), &targets).unwrap();
    let mut driver = ScriptedDriver::new(Point::new(4, 1), Heading::Left, ball_world());

    let status = mission.run(&mut driver, || false);

    assert_eq!(status, MissionStatus::Complete);
    assert_eq!(mission.deposited(), 3);
    assert!(mission.arena().is_at_origin());
    assert!(driver.stopped);

    // First three list entries, in order; the fourth is never visited.
    assert_eq!(
        driver.grabbed_from,
        vec![Point::new(3, 2), Point::new(1, 1), Point::new(2, 3)]
    );
    assert_eq!(driver.balls, vec![(Point::new(2, 2), BallColor::Red)]);

    // All three deposit cells were consumed.
    for safe in [Point::new(5, 0), Point::new(5, 1), Point::new(5, 2)] {
        assert_eq!(mission.arena().cell(safe), CellState::SafeUnavailable);
    }

    // Colors registered against the grab cells, in grab order.
    assert_eq!(
        mission.arena().carried_balls(),
        &[
            (Point::new(3, 2), BallColor::Red),
            (Point::new(1, 1), BallColor::Yellow),
            (Point::new(2, 3), BallColor::Blue),
        ]
    );
}

#[test]
fn deposit_cells_are_consumed_in_priority_order() {
    let targets = [Point::new(3, 2), Point::new(1, 1), Point::new(2, 3)];
    let mut mission = Mission::fetch(&config_4x4(), &targets).unwrap();
    let mut driver = ScriptedDriver::new(Point::new(4, 1), Heading::Left, ball_world());
    mission.run(&mut driver, || false);

    let deposits: Vec<Point> = mission
        .telemetry()
        .oldest_first()
        .filter_map(|record| match record.event {
            MissionEventKind::BallDeposited(at) => Some(at),
            _ => None,
        })
        .collect();
    assert_eq!(
        deposits,
        vec![Point::new(5, 0), Point::new(5, 2), Point::new(5, 1)]
    );
}

#[test]
fn reordering_the_list_reorders_the_visits() {
    let targets = [Point::new(1, 1), Point::new(2, 3), Point::new(3, 2)];
    let mut mission = Mission::fetch(&config_4x4(), &targets).unwrap();
    let mut driver = ScriptedDriver::new(Point::new(4, 1), Heading::Left, ball_world());

    assert_eq!(mission.run(&mut driver, || false), MissionStatus::Complete);
    assert_eq!(
        driver.grabbed_from,
        vec![Point::new(1, 1), Point::new(2, 3), Point::new(3, 2)]
    );
}

#[test]
fn exhausted_target_list_returns_home_short_of_the_quota() {
    let targets = [Point::new(2, 2)];
    let mut mission = Mission::fetch(&config_4x4(), &targets).unwrap();
    let balls = vec![(Point::new(2, 2), BallColor::Red)];
    let mut driver = ScriptedDriver::new(Point::new(4, 1), Heading::Left, balls);

    let status = mission.run(&mut driver, || false);

    assert_eq!(status, MissionStatus::Complete);
    assert_eq!(mission.deposited(), 1);
    assert!(mission.arena().is_at_origin());
    assert!(driver.balls.is_empty());
    assert_eq!(
        mission.arena().cell(Point::new(5, 0)),
        CellState::SafeUnavailable
    );
}

#[test]
fn grabs_on_arrival_without_consulting_the_range_sensor() {
    // A ball sitting right next to the path must not trigger a grab; only
    // the listed cell does.
    let targets = [Point::new(2, 3)];
    let mut mission = Mission::fetch(&config_4x4(), &targets).unwrap();
    let balls = vec![
        (Point::new(2, 3), BallColor::Blue),
        (Point::new(1, 1), BallColor::Red),
    ];
    let mut driver = ScriptedDriver::new(Point::new(4, 1), Heading::Left, balls);

    assert_eq!(mission.run(&mut driver, || false), MissionStatus::Complete);
    assert_eq!(driver.grabbed_from, vec![Point::new(2, 3)]);
    assert_eq!(driver.balls, vec![(Point::new(1, 1), BallColor::Red)]);
}
