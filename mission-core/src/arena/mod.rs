//! Arena grid model: cell bookkeeping, movement legality, turn planning.
//!
//! The playable `m x n` field is stored inside a `(m + 2) x (n + 2)` grid
//! whose outer ring is permanently [`CellState::OutOfBounds`]. Cardinal
//! neighbor probes from any playable cell therefore never index outside the
//! allocation; only diagonal and border-cell probes can, and those reads fail
//! closed to `OutOfBounds` while logging the offending coordinate for
//! telemetry draining.
//!
//! Rotation decisions are pure: the `plan_*` methods return a [`Turn`]
//! without touching state, and the caller commits the new heading separately
//! with [`Arena::commit_turn`] once the drive command has been issued.

use core::cell::Cell;
use core::fmt;

use heapless::Vec;

use crate::geometry::{HALF_TURN, Heading, Point, QUARTER_LEFT, QUARTER_RIGHT, Turn};

/// Largest playable side length accepted by [`Arena::new`].
pub const MAX_PLAYABLE_SIDE: u16 = 16;

/// Grid capacity covering the largest playable field plus its border ring.
pub const MAX_GRID_CELLS: usize = ((MAX_PLAYABLE_SIDE as usize) + 2) * ((MAX_PLAYABLE_SIDE as usize) + 2);

/// Upper bound on balls tracked in a single mission (deposits and targets).
pub const MAX_TRACKED_BALLS: usize = 8;

/// Per-cell knowledge state. Declaration order fixes the numeric rendering
/// codes, so new states must be appended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum CellState {
    /// Border ring and anything outside the allocated grid.
    OutOfBounds = 0,
    /// Reserved for known ball positions. Consumed by the approach queries
    /// but never written by the current update rules.
    Ball = 1,
    /// Not yet visited.
    Hidden = 2,
    /// Visited and clear.
    Empty = 3,
    /// The single cell currently occupied by the robot, when marked.
    CurrentPosition = 4,
    /// Border cell accepting a deposit.
    SafeAvailable = 5,
    /// Border cell already holding a deposit.
    SafeUnavailable = 6,
}

impl CellState {
    /// Numeric rendering code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Color of a retrieved ball as reported by the color sensor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BallColor {
    Red,
    Yellow,
    Blue,
}

impl BallColor {
    /// Single-letter tag used when rendering the final grid.
    #[must_use]
    pub const fn tag(self) -> char {
        match self {
            BallColor::Red => 'R',
            BallColor::Yellow => 'Y',
            BallColor::Blue => 'B',
        }
    }
}

impl fmt::Display for BallColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BallColor::Red => f.write_str("red"),
            BallColor::Yellow => f.write_str("yellow"),
            BallColor::Blue => f.write_str("blue"),
        }
    }
}

/// Recoverable arena construction and setup failures.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ArenaError {
    /// A playable dimension was zero or above [`MAX_PLAYABLE_SIDE`].
    DimensionsOutOfRange { width: u16, height: u16 },
    /// The cell edge length was not a finite positive quantity.
    InvalidCellLength,
    /// The entry cell does not lie on the playable boundary ring.
    EntryOffBoundary(Point),
    /// [`Arena::starting_point`] was called twice.
    AlreadyStarted,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaError::DimensionsOutOfRange { width, height } => {
                write!(f, "playable dimensions {width}x{height} out of range")
            }
            ArenaError::InvalidCellLength => f.write_str("cell length must be finite and positive"),
            ArenaError::EntryOffBoundary(point) => {
                write!(f, "entry {point} is not on the playable boundary ring")
            }
            ArenaError::AlreadyStarted => f.write_str("starting point already placed"),
        }
    }
}

/// Arena grid plus the robot pose and deposit bookkeeping layered on it.
#[derive(Debug)]
pub struct Arena {
    columns: i16,
    rows: i16,
    cell_length: f32,
    grid: Vec<CellState, MAX_GRID_CELLS>,
    current: Point,
    origin: Point,
    heading: Heading,
    started: bool,
    /// Deposit candidates in resolution priority order: flank before the
    /// entry, flank after it, the cell directly opposite.
    safe_candidates: [Point; 3],
    grab_point: Option<Point>,
    grab_heading: Option<Heading>,
    carried: Vec<(Point, BallColor), MAX_TRACKED_BALLS>,
    logged_read: Cell<Option<Point>>,
}

impl Arena {
    /// Allocates a hidden `width x height` field surrounded by the border
    /// ring. The robot is not placed until [`Arena::starting_point`].
    ///
    /// # Errors
    /// Rejects zero or oversized dimensions and non-positive cell lengths.
    pub fn new(width: u16, height: u16, cell_length: f32) -> Result<Self, ArenaError> {
        if width == 0 || height == 0 || width > MAX_PLAYABLE_SIDE || height > MAX_PLAYABLE_SIDE {
            return Err(ArenaError::DimensionsOutOfRange { width, height });
        }
        if !(cell_length.is_finite() && cell_length > 0.0) {
            return Err(ArenaError::InvalidCellLength);
        }

        let columns = i16::try_from(width + 2).unwrap_or(i16::MAX);
        let rows = i16::try_from(height + 2).unwrap_or(i16::MAX);
        let mut grid = Vec::new();
        for y in 0..rows {
            for x in 0..columns {
                let border = x == 0 || y == 0 || x == columns - 1 || y == rows - 1;
                let state = if border {
                    CellState::OutOfBounds
                } else {
                    CellState::Hidden
                };
                if grid.push(state).is_err() {
                    return Err(ArenaError::DimensionsOutOfRange { width, height });
                }
            }
        }

        Ok(Self {
            columns,
            rows,
            cell_length,
            grid,
            current: Point::default(),
            origin: Point::default(),
            heading: Heading::Up,
            started: false,
            safe_candidates: [Point::default(); 3],
            grab_point: None,
            grab_heading: None,
            carried: Vec::new(),
            logged_read: Cell::new(None),
        })
    }

    /// Playable width (`m`).
    #[must_use]
    pub const fn width(&self) -> i16 {
        self.columns - 2
    }

    /// Playable height (`n`).
    #[must_use]
    pub const fn height(&self) -> i16 {
        self.rows - 2
    }

    /// Allocated grid width including the border ring.
    #[must_use]
    pub const fn columns(&self) -> i16 {
        self.columns
    }

    /// Allocated grid height including the border ring.
    #[must_use]
    pub const fn rows(&self) -> i16 {
        self.rows
    }

    /// Places the robot on its entry cell, derives the initial heading, and
    /// seeds the three deposit cells on the border. The entry must lie on
    /// the playable boundary ring and this may only happen once.
    ///
    /// # Errors
    /// Rejects entries off the boundary ring and repeated placement.
    pub fn starting_point(&mut self, entry: Point) -> Result<(), ArenaError> {
        if self.started {
            return Err(ArenaError::AlreadyStarted);
        }
        let m = self.width();
        let n = self.height();
        let interior = (1..=m).contains(&entry.x) && (1..=n).contains(&entry.y);
        let on_ring = interior && (entry.x == 1 || entry.x == m || entry.y == 1 || entry.y == n);
        if !on_ring {
            return Err(ArenaError::EntryOffBoundary(entry));
        }

        // Edge classification priority: right, left, top, bottom. Corner
        // entries resolve to the first matching edge.
        let (heading, opposite) = if entry.x == m {
            (Heading::Left, Point::new(m + 1, entry.y))
        } else if entry.x == 1 {
            (Heading::Right, Point::new(0, entry.y))
        } else if entry.y == 1 {
            (Heading::Down, Point::new(entry.x, 0))
        } else {
            (Heading::Up, Point::new(entry.x, n + 1))
        };

        let (before, after) = if opposite.x == entry.x {
            // Entry on a horizontal edge; flanks vary along x.
            (
                Point::new(opposite.x - 1, opposite.y),
                Point::new(opposite.x + 1, opposite.y),
            )
        } else {
            (
                Point::new(opposite.x, opposite.y - 1),
                Point::new(opposite.x, opposite.y + 1),
            )
        };

        self.safe_candidates = [before, after, opposite];
        for candidate in self.safe_candidates {
            self.set_cell(candidate, CellState::SafeAvailable);
        }

        self.origin = entry;
        self.current = entry;
        self.heading = heading;
        self.started = true;
        self.refresh_position_marker();
        Ok(())
    }

    /// Reads a cell, failing closed: coordinates outside the allocated grid
    /// resolve to [`CellState::OutOfBounds`] and are remembered for
    /// [`Arena::take_logged_read`].
    #[must_use]
    pub fn cell(&self, point: Point) -> CellState {
        match self.index(point) {
            Some(index) => self.grid[index],
            None => {
                self.logged_read.set(Some(point));
                CellState::OutOfBounds
            }
        }
    }

    /// Returns and clears the most recent out-of-range read coordinate.
    #[must_use]
    pub fn take_logged_read(&self) -> Option<Point> {
        self.logged_read.take()
    }

    /// Current robot cell.
    #[must_use]
    pub fn current_position(&self) -> Point {
        self.assert_started();
        self.current
    }

    /// Entry cell the mission must return to.
    #[must_use]
    pub fn origin(&self) -> Point {
        self.assert_started();
        self.origin
    }

    /// Current travel heading.
    #[must_use]
    pub fn heading(&self) -> Heading {
        self.assert_started();
        self.heading
    }

    /// Pose snapshot taken at the last grab, if any.
    #[must_use]
    pub const fn grab_point(&self) -> Option<Point> {
        self.grab_point
    }

    /// The deposit cell the robot should currently aim for: the first safe
    /// candidate, in priority order, that is still available. Falls back to
    /// the opposite cell once all three are taken.
    #[must_use]
    pub fn safe_target(&self) -> Point {
        self.assert_started();
        let [before, after, opposite] = self.safe_candidates;
        if self.cell(before) == CellState::SafeAvailable {
            before
        } else if self.cell(after) == CellState::SafeAvailable {
            after
        } else {
            opposite
        }
    }

    /// True when the sweep may advance: the next cell along the heading is
    /// neither the border nor a deposit cell.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.assert_started();
        let next = self.cell(self.current.stepped(self.heading));
        !matches!(
            next,
            CellState::OutOfBounds | CellState::SafeAvailable | CellState::SafeUnavailable
        )
    }

    /// True when a step along the heading closes the distance to the active
    /// deposit cell and lands exactly on it while it is still available.
    /// The probe can leave the allocated grid when the robot already stands
    /// on the border; that case is answered without reading the grid.
    #[must_use]
    pub fn can_advance_to_safe(&self) -> bool {
        let target = self.safe_target();
        if !self.closing_step(target) {
            return false;
        }
        let next = self.current.stepped(self.heading);
        if self.index(next).is_none() {
            return false;
        }
        self.cell(next) == CellState::SafeAvailable
    }

    /// True when a step along the heading closes the distance to the origin
    /// and lands on explored ground.
    #[must_use]
    pub fn can_advance_to_origin(&self) -> bool {
        self.can_advance_toward_empty(self.origin())
    }

    /// True when a step along the heading closes the distance to the
    /// recorded grab pose and lands on explored ground.
    #[must_use]
    pub fn can_advance_to_grab_point(&self) -> bool {
        let target = self.require_grab_point();
        self.can_advance_toward_empty(target)
    }

    /// True when a step along the heading closes the distance to `target`
    /// and the next cell is passable on the way to a ball (anything but a
    /// known ball or the border).
    #[must_use]
    pub fn can_advance_to_ball(&self, target: Point) -> bool {
        self.assert_started();
        if !self.closing_step(target) {
            return false;
        }
        let next = self.cell(self.current.stepped(self.heading));
        !matches!(next, CellState::Ball | CellState::OutOfBounds)
    }

    /// True when the next cell along the heading is unexplored, i.e. the
    /// line change has reached the new sweep line.
    #[must_use]
    pub fn has_reached_new_line(&self) -> bool {
        self.cell(self.current.stepped(self.heading)) == CellState::Hidden
    }

    /// True when unexplored cells remain past the line-change corner, so the
    /// sweep needs its second quarter turn before resuming.
    #[must_use]
    pub fn needs_second_turn(&self) -> bool {
        let ahead = self.current.stepped(self.heading);
        let forward_left = ahead.stepped(self.heading.turned_left());
        let forward_right = ahead.stepped(self.heading.turned_right());
        self.cell(forward_left) == CellState::Hidden || self.cell(forward_right) == CellState::Hidden
    }

    /// Plans the sweep line-change rotation. Prefers turning toward
    /// unexplored ground; against the border wall it reverses unless the
    /// right-hand or rear cell says the sweep came from there.
    #[must_use]
    pub fn plan_sweep_turn(&self) -> Turn {
        self.assert_started();
        let left = self.cell(self.current.stepped(self.heading.turned_left()));
        let right = self.cell(self.current.stepped(self.heading.turned_right()));
        let behind = self.cell(self.current.stepped(self.heading.reversed()));

        if left == CellState::OutOfBounds {
            if right == CellState::Hidden || behind == CellState::Empty {
                Turn::new(self.heading.turned_right(), QUARTER_RIGHT)
            } else {
                Turn::new(self.heading.reversed(), HALF_TURN)
            }
        } else if right == CellState::Hidden {
            Turn::new(self.heading.turned_right(), QUARTER_RIGHT)
        } else {
            Turn::new(self.heading.turned_left(), QUARTER_LEFT)
        }
    }

    /// Plans the rotation used while returning through explored ground
    /// (origin or grab-pose travel): prefer whichever side is known empty,
    /// reverse otherwise.
    #[must_use]
    pub fn plan_return_turn(&self) -> Turn {
        self.assert_started();
        let left = self.cell(self.current.stepped(self.heading.turned_left()));
        let right = self.cell(self.current.stepped(self.heading.turned_right()));

        if left == CellState::Empty {
            Turn::new(self.heading.turned_left(), QUARTER_LEFT)
        } else if right == CellState::Empty {
            Turn::new(self.heading.turned_right(), QUARTER_RIGHT)
        } else {
            Turn::new(self.heading.reversed(), HALF_TURN)
        }
    }

    /// Plans the rotation toward the next target ball: any side cell that is
    /// neither a known ball nor the border is acceptable, left first.
    #[must_use]
    pub fn plan_ball_turn(&self) -> Turn {
        self.assert_started();
        let left = self.cell(self.current.stepped(self.heading.turned_left()));
        let right = self.cell(self.current.stepped(self.heading.turned_right()));

        if !matches!(left, CellState::Ball | CellState::OutOfBounds) {
            Turn::new(self.heading.turned_left(), QUARTER_LEFT)
        } else if !matches!(right, CellState::Ball | CellState::OutOfBounds) {
            Turn::new(self.heading.turned_right(), QUARTER_RIGHT)
        } else {
            Turn::new(self.heading.reversed(), HALF_TURN)
        }
    }

    /// Plans the quarter turn that points the robot toward the active
    /// deposit cell along the axis still separating them.
    #[must_use]
    pub fn plan_safe_turn(&self) -> Turn {
        let target = self.safe_target();
        let to_left = match self.heading {
            Heading::Up => target.x < self.current.x,
            Heading::Left => target.y > self.current.y,
            Heading::Right => target.y < self.current.y,
            Heading::Down => target.x > self.current.x,
        };
        if to_left {
            Turn::new(self.heading.turned_left(), QUARTER_LEFT)
        } else {
            Turn::new(self.heading.turned_right(), QUARTER_RIGHT)
        }
    }

    /// Plans the rotation that restores the heading recorded at the grab.
    #[must_use]
    pub fn plan_realign_turn(&self) -> Turn {
        let target = self.require_grab_heading();
        if target == self.heading {
            Turn::hold(target)
        } else if target == self.heading.turned_left() {
            Turn::new(target, QUARTER_LEFT)
        } else if target == self.heading.turned_right() {
            Turn::new(target, QUARTER_RIGHT)
        } else {
            Turn::new(target, HALF_TURN)
        }
    }

    /// Commits a planned rotation. The drive command is the caller's
    /// responsibility; the arena only tracks the resulting heading.
    pub fn commit_turn(&mut self, turn: Turn) {
        self.heading = turn.heading;
    }

    /// Moves the robot one cell forward and refreshes the position marker.
    /// Returns the signed travel distance for the drive.
    #[allow(clippy::cast_possible_truncation)]
    pub fn advance(&mut self) -> i32 {
        self.assert_started();
        self.current = self.current.stepped(self.heading);
        self.refresh_position_marker();
        self.cell_length as i32
    }

    /// Moves the robot one cell backward without changing the heading.
    /// Returns the signed travel distance for the drive.
    #[allow(clippy::cast_possible_truncation)]
    pub fn retreat(&mut self) -> i32 {
        self.assert_started();
        self.current = self.current.stepped(self.heading.reversed());
        self.refresh_position_marker();
        -(self.cell_length as i32)
    }

    /// True once no unexplored cells remain.
    #[must_use]
    pub fn is_covered(&self) -> bool {
        !self.grid.iter().any(|&state| state == CellState::Hidden)
    }

    /// True when the robot stands on its entry cell.
    #[must_use]
    pub fn is_at_origin(&self) -> bool {
        self.current == self.origin()
    }

    /// True when the robot stands on the active deposit cell.
    #[must_use]
    pub fn is_at_safe(&self) -> bool {
        self.current == self.safe_target()
    }

    /// True when the robot stands on the recorded grab cell.
    #[must_use]
    pub fn is_at_grab_point(&self) -> bool {
        self.grab_point == Some(self.current)
    }

    /// True when the robot stands on `point`.
    #[must_use]
    pub fn is_at(&self, point: Point) -> bool {
        self.assert_started();
        self.current == point
    }

    /// True when the current heading matches the one recorded at the grab.
    #[must_use]
    pub fn heading_matches_grab(&self) -> bool {
        self.grab_heading == Some(self.heading)
    }

    /// Snapshots the current pose as the grab pose.
    pub fn record_grab(&mut self) {
        self.assert_started();
        self.grab_point = Some(self.current);
        self.grab_heading = Some(self.heading);
    }

    /// Stores the sensed color of the carried ball against the grab
    /// coordinate. Re-sensing the same carry overwrites the earlier value.
    pub fn record_carried_color(&mut self, color: BallColor) {
        let Some(point) = self.grab_point else {
            return;
        };
        if let Some(slot) = self.carried.iter_mut().find(|(at, _)| *at == point) {
            slot.1 = color;
        } else if self.carried.push((point, color)).is_err() {
            debug_assert!(false, "carried-ball registry full");
        }
    }

    /// Marks the cell under the robot as a taken deposit slot.
    pub fn record_release(&mut self) {
        self.assert_started();
        self.set_cell(self.current, CellState::SafeUnavailable);
    }

    /// Grab coordinates and sensed colors of every ball carried so far.
    #[must_use]
    pub fn carried_balls(&self) -> &[(Point, BallColor)] {
        &self.carried
    }

    /// Writes the whole grid as numeric codes, substituting the color tag at
    /// each registered grab coordinate.
    ///
    /// # Errors
    /// Propagates sink write failures.
    pub fn render_final(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        for y in 0..self.rows {
            for x in 0..self.columns {
                let point = Point::new(x, y);
                if x > 0 {
                    out.write_char(' ')?;
                }
                match self.carried.iter().find(|(at, _)| *at == point) {
                    Some((_, color)) => out.write_char(color.tag())?,
                    None => write!(out, "{}", self.cell(point).code())?,
                }
            }
            out.write_char('\n')?;
        }
        Ok(())
    }

    fn assert_started(&self) {
        assert!(self.started, "arena queried before starting_point");
    }

    fn require_grab_point(&self) -> Point {
        self.grab_point
            .unwrap_or_else(|| panic!("no grab pose recorded"))
    }

    fn require_grab_heading(&self) -> Heading {
        self.grab_heading
            .unwrap_or_else(|| panic!("no grab pose recorded"))
    }

    /// True when one step along the current heading reduces the remaining
    /// distance to `target` on the heading's axis.
    fn closing_step(&self, target: Point) -> bool {
        let dx = self.current.x - target.x;
        let dy = self.current.y - target.y;
        match self.heading {
            Heading::Up => dy > 0,
            Heading::Down => dy < 0,
            Heading::Left => dx > 0,
            Heading::Right => dx < 0,
        }
    }

    fn can_advance_toward_empty(&self, target: Point) -> bool {
        self.closing_step(target) && self.cell(self.current.stepped(self.heading)) == CellState::Empty
    }

    #[allow(clippy::cast_sign_loss)]
    fn index(&self, point: Point) -> Option<usize> {
        if point.x < 0 || point.y < 0 || point.x >= self.columns || point.y >= self.rows {
            return None;
        }
        Some(point.y as usize * self.columns as usize + point.x as usize)
    }

    fn set_cell(&mut self, point: Point, state: CellState) {
        let Some(index) = self.index(point) else {
            panic!("grid write outside bounds at {point}");
        };
        self.grid[index] = state;
    }

    /// Clears any existing position marker and re-marks the current cell if
    /// it is markable. Deposit and border cells keep their own state, so the
    /// grid holds at most one marker at any time.
    fn refresh_position_marker(&mut self) {
        for state in &mut self.grid {
            if *state == CellState::CurrentPosition {
                *state = CellState::Empty;
            }
        }
        if matches!(
            self.cell(self.current),
            CellState::Hidden | CellState::Empty
        ) {
            self.set_cell(self.current, CellState::CurrentPosition);
        }
    }
}
