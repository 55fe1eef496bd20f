//! Interactive session: command dispatch and mission lifecycle.

use std::fmt::Write as _;

use crossterm::style::Stylize;

use mission_core::arena::BallColor;
use mission_core::geometry::Point;
use mission_core::mission::{Mission, MissionConfig, MissionError, MissionStatus};
use mission_core::repl::{HelpTopic, ReplCommand, parse_command};

use crate::sim::{SimBall, SimRobot};

const DEFAULT_SIZE: (u16, u16) = (6, 4);
const CELL_LENGTH: f32 = 30.0;
/// Poll iterations each simulated actuation stays busy for.
const DEFAULT_BUSY_TICKS: u32 = 2;

const HELP_TOPICS: &[(HelpTopic, &str)] = &[
    (
        HelpTopic::Explore,
        "explore [WxH] [from (x,y)] - sweep the whole field, grabbing balls on sight",
    ),
    (
        HelpTopic::Fetch,
        "fetch (x,y) ... - retrieve balls from the listed cells, in order",
    ),
    (
        HelpTopic::Status,
        "status - summary and telemetry tail of the most recent mission",
    ),
    (
        HelpTopic::Render,
        "render - final grid of the most recent mission, deposits lettered",
    ),
    (
        HelpTopic::Stop,
        "stop - cancel a mission in flight (runs here finish synchronously)",
    ),
];

/// Number of telemetry records echoed by `status`.
const STATUS_TAIL: usize = 6;

struct CompletedRun {
    mission: Mission,
    status: MissionStatus,
    balls_left: usize,
}

/// Owns mission lifecycle across operator commands.
pub struct Session {
    busy_ticks: u32,
    last_run: Option<CompletedRun>,
}

impl Session {
    #[must_use]
    pub fn new(busy_ticks: Option<u32>) -> Self {
        Self {
            busy_ticks: busy_ticks.unwrap_or(DEFAULT_BUSY_TICKS),
            last_run: None,
        }
    }

    /// Handles one operator line, returning the response lines to print.
    pub fn handle_command(&mut self, line: &str) -> Vec<String> {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(error) => {
                return vec![format!("{error}"), "Type `help` for usage.".to_string()];
            }
        };

        match command {
            ReplCommand::Explore { size, entry } => self.run_explore(size, entry),
            ReplCommand::Fetch { targets } => self.run_fetch(&targets),
            ReplCommand::Status => self.report_status(),
            ReplCommand::Render => self.render_last(),
            ReplCommand::Stop => {
                vec!["No mission in flight; runs here finish synchronously.".to_string()]
            }
            ReplCommand::Help(topic) => Self::help(topic),
        }
    }

    fn run_explore(&mut self, size: Option<(u16, u16)>, entry: Option<Point>) -> Vec<String> {
        let (width, height) = size.unwrap_or(DEFAULT_SIZE);
        let entry = entry.unwrap_or(Point::new(i16::try_from(width).unwrap_or(1), 1));
        let config = MissionConfig::new(width, height, CELL_LENGTH, entry);

        let mission = match Mission::explore(&config) {
            Ok(mission) => mission,
            Err(error) => return vec![describe_error(&error)],
        };
        let balls = demo_balls(width, height, entry);
        self.run(mission, balls)
    }

    fn run_fetch(&mut self, targets: &[Point]) -> Vec<String> {
        let (width, height) = DEFAULT_SIZE;
        let entry = Point::new(i16::try_from(width).unwrap_or(1), 1);
        let config = MissionConfig::new(width, height, CELL_LENGTH, entry);

        let mission = match Mission::fetch(&config, targets) {
            Ok(mission) => mission,
            Err(error) => return vec![describe_error(&error)],
        };
        // Every listed cell gets a ball, colors cycling.
        let palette = [BallColor::Red, BallColor::Yellow, BallColor::Blue];
        let balls = targets
            .iter()
            .zip(palette.iter().cycle())
            .map(|(&at, &color)| SimBall::new(at, color))
            .collect();
        self.run(mission, balls)
    }

    fn run(&mut self, mut mission: Mission, balls: Vec<SimBall>) -> Vec<String> {
        let entry = mission.arena().origin();
        let heading = mission.arena().heading();
        let mut robot = SimRobot::new(entry, heading, balls, self.busy_ticks);
        let status = mission.run(&mut robot, || false);

        let mut lines = vec![
            format!("Mission {}.", describe_status(status)),
            format!(
                "Deposited {} ball(s) over {} poll iterations ({} moves, {} rotations).",
                mission.deposited(),
                mission.steps(),
                robot.moves_issued(),
                robot.rotations_issued(),
            ),
        ];
        lines.push(format!(
            "Robot ended at {} facing {}{}.",
            robot.position(),
            robot.heading(),
            if robot.is_stopped() { ", drive stopped" } else { "" },
        ));
        if robot.balls_left() > 0 {
            lines.push(format!("{} ball(s) left on the field.", robot.balls_left()));
        }
        lines.push("Type `render` for the final grid or `status` for telemetry.".to_string());

        self.last_run = Some(CompletedRun {
            mission,
            status,
            balls_left: robot.balls_left(),
        });
        lines
    }

    fn report_status(&self) -> Vec<String> {
        let Some(run) = &self.last_run else {
            return vec!["No mission run yet.".to_string()];
        };

        let telemetry = run.mission.telemetry();
        let mut lines = vec![
            format!("Last mission: {}.", describe_status(run.status)),
            format!(
                "Deposited {} ball(s); {} left on the field; {} telemetry record(s).",
                run.mission.deposited(),
                run.balls_left,
                telemetry.len(),
            ),
        ];
        let skip = telemetry.len().saturating_sub(STATUS_TAIL);
        for record in telemetry.oldest_first().skip(skip) {
            lines.push(format!(
                "  #{} step {}: {}",
                record.id, record.at_step, record.event
            ));
        }
        lines
    }

    fn render_last(&self) -> Vec<String> {
        let Some(run) = &self.last_run else {
            return vec!["No mission run yet.".to_string()];
        };

        let mut plain = String::new();
        if run.mission.render_final(&mut plain).is_err() {
            return vec!["Render failed.".to_string()];
        }
        plain.lines().map(colorize_row).collect()
    }

    fn help(topic: Option<HelpTopic>) -> Vec<String> {
        match topic {
            Some(topic) => HELP_TOPICS
                .iter()
                .filter(|(candidate, _)| *candidate == topic)
                .map(|(_, text)| (*text).to_string())
                .collect(),
            None => {
                let mut lines = vec!["Commands:".to_string()];
                lines.extend(
                    HELP_TOPICS
                        .iter()
                        .map(|(_, text)| format!("  {text}")),
                );
                lines.push("  help [command] - this text".to_string());
                lines.push("  exit | quit - close the session".to_string());
                lines
            }
        }
    }
}

/// Colors the deposit letters in one rendered grid row.
fn colorize_row(row: &str) -> String {
    let mut out = String::with_capacity(row.len());
    for symbol in row.chars() {
        match symbol {
            'R' => {
                let _ = write!(out, "{}", "R".red());
            }
            'Y' => {
                let _ = write!(out, "{}", "Y".yellow());
            }
            'B' => {
                let _ = write!(out, "{}", "B".blue());
            }
            other => out.push(other),
        }
    }
    out
}

fn describe_status(status: MissionStatus) -> &'static str {
    match status {
        MissionStatus::Running => "still running",
        MissionStatus::Complete => "complete",
        MissionStatus::Stopped => "stopped on request",
        MissionStatus::Stalled => "stalled (step budget exhausted)",
    }
}

fn describe_error(error: &MissionError) -> String {
    format!("Cannot start mission: {error}")
}

/// Demo ball placement for exploration runs: two balls tucked into the
/// field, skipping the entry cell on tiny fields.
fn demo_balls(width: u16, height: u16, entry: Point) -> Vec<SimBall> {
    let candidates = [
        (Point::new(2, 2), BallColor::Red),
        (
            Point::new(
                i16::try_from(width.saturating_sub(1).max(1)).unwrap_or(1),
                i16::try_from(height.saturating_sub(1).max(1)).unwrap_or(1),
            ),
            BallColor::Yellow,
        ),
    ];
    let mut balls = Vec::new();
    for (at, color) in candidates {
        let inside = (1..=i16::try_from(width).unwrap_or(1)).contains(&at.x)
            && (1..=i16::try_from(height).unwrap_or(1)).contains(&at.y);
        if inside && at != entry && !balls.iter().any(|ball: &SimBall| ball.at == at) {
            balls.push(SimBall::new(at, color));
        }
    }
    balls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explore_then_status_and_render() {
        let mut session = Session::new(Some(0));
        let responses = session.handle_command("explore 4x4 from (4,1)");
        assert!(responses[0].contains("complete"));

        let status = session.handle_command("status");
        assert!(status[0].contains("complete"));

        let grid = session.handle_command("render");
        assert_eq!(grid.len(), 6);
    }

    #[test]
    fn fetch_places_one_ball_per_target() {
        let mut session = Session::new(Some(0));
        let responses = session.handle_command("fetch (3,2) (1,1) (2,3)");
        assert!(responses[0].contains("complete"));
        assert!(responses[1].contains("Deposited 3"));
    }

    #[test]
    fn bad_input_gets_a_parse_diagnostic() {
        let mut session = Session::new(Some(0));
        let responses = session.handle_command("explode");
        assert!(responses[0].contains("unrecognized"));
    }

    #[test]
    fn status_before_any_run_says_so() {
        let session = Session::new(None);
        assert_eq!(session.report_status(), vec!["No mission run yet."]);
    }
}
