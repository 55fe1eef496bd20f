//! Grid coordinates, headings, and rotation quantities.
//!
//! Coordinates are signed so that neighbor probes may legally compute
//! positions outside the allocated grid; the arena decides how such reads
//! resolve. Headings rotate through pure operators and expose their unit
//! offset, so lateral and diagonal probes compose `offset` with
//! `turned_left`/`turned_right` instead of branching per heading.

use core::fmt;

/// Rotation quantities understood by the actuation layer. One unit is a
/// sixteenth of a full turn; signs follow the drive convention (negative
/// turns left, positive turns right).
pub type AngleUnits = i16;

/// Quarter turn to the left.
pub const QUARTER_LEFT: AngleUnits = -8;
/// Quarter turn to the right.
pub const QUARTER_RIGHT: AngleUnits = 8;
/// Half turn; direction is up to the drive.
pub const HALF_TURN: AngleUnits = 16;

/// Cell coordinate on the arena grid, `(0, 0)` at the top-left border cell.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    #[must_use]
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// The cell one step away along `heading`.
    #[must_use]
    pub const fn stepped(self, heading: Heading) -> Self {
        let (dx, dy) = heading.offset();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Travel heading on the grid. `y` grows downward, so `Up` decreases `y`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Heading {
    Up,
    Left,
    Right,
    Down,
}

impl Heading {
    /// Unit offset of one forward step.
    #[must_use]
    pub const fn offset(self) -> (i16, i16) {
        match self {
            Heading::Up => (0, -1),
            Heading::Left => (-1, 0),
            Heading::Right => (1, 0),
            Heading::Down => (0, 1),
        }
    }

    /// Heading after a quarter turn to the right.
    #[must_use]
    pub const fn turned_right(self) -> Self {
        match self {
            Heading::Up => Heading::Right,
            Heading::Right => Heading::Down,
            Heading::Down => Heading::Left,
            Heading::Left => Heading::Up,
        }
    }

    /// Heading after a quarter turn to the left.
    #[must_use]
    pub const fn turned_left(self) -> Self {
        match self {
            Heading::Up => Heading::Left,
            Heading::Left => Heading::Down,
            Heading::Down => Heading::Right,
            Heading::Right => Heading::Up,
        }
    }

    /// Opposite heading.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Heading::Up => Heading::Down,
            Heading::Down => Heading::Up,
            Heading::Left => Heading::Right,
            Heading::Right => Heading::Left,
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Heading::Up => f.write_str("up"),
            Heading::Left => f.write_str("left"),
            Heading::Right => f.write_str("right"),
            Heading::Down => f.write_str("down"),
        }
    }
}

/// A planned rotation: the heading it lands on and the angle the drive must
/// execute to get there. Planning and committing are separate so callers can
/// widen the angle for payload compensation before issuing it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Turn {
    pub heading: Heading,
    pub angle: AngleUnits,
}

impl Turn {
    #[must_use]
    pub const fn new(heading: Heading, angle: AngleUnits) -> Self {
        Self { heading, angle }
    }

    /// A no-op turn that keeps the current heading.
    #[must_use]
    pub const fn hold(heading: Heading) -> Self {
        Self::new(heading, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turns_cycle_through_all_headings() {
        let mut heading = Heading::Up;
        let mut seen = [false; 4];
        for _ in 0..4 {
            let slot = match heading {
                Heading::Up => 0,
                Heading::Right => 1,
                Heading::Down => 2,
                Heading::Left => 3,
            };
            assert!(!seen[slot]);
            seen[slot] = true;
            heading = heading.turned_right();
        }
        assert_eq!(heading, Heading::Up);
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn left_and_right_turns_are_inverses() {
        for heading in [Heading::Up, Heading::Left, Heading::Right, Heading::Down] {
            assert_eq!(heading.turned_left().turned_right(), heading);
            assert_eq!(heading.turned_right().turned_left(), heading);
            assert_eq!(heading.reversed().reversed(), heading);
            assert_eq!(heading.turned_left().turned_left(), heading.reversed());
        }
    }

    #[test]
    fn stepping_applies_the_heading_offset() {
        let origin = Point::new(3, 3);
        assert_eq!(origin.stepped(Heading::Up), Point::new(3, 2));
        assert_eq!(origin.stepped(Heading::Down), Point::new(3, 4));
        assert_eq!(origin.stepped(Heading::Left), Point::new(2, 3));
        assert_eq!(origin.stepped(Heading::Right), Point::new(4, 3));
    }

    #[test]
    fn opposite_steps_cancel() {
        let origin = Point::new(1, 5);
        for heading in [Heading::Up, Heading::Left, Heading::Right, Heading::Down] {
            assert_eq!(origin.stepped(heading).stepped(heading.reversed()), origin);
        }
    }
}
