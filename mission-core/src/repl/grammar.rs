#![allow(clippy::module_name_repetitions)]

//! Parser for the operator command line.
//!
//! Commands are short and bounded, so the grammar composes `winnow`
//! combinators directly over `&str`; keywords match case-insensitively and
//! whitespace between arguments is free-form. Output types stay bounded
//! (`heapless::Vec` for the target list) to remain `no_std` friendly.

use core::fmt;

use heapless::Vec;
use winnow::ascii::{Caseless, digit1, space0, space1};
use winnow::combinator::{alt, delimited, opt, preceded, separated_pair};
use winnow::error::{ContextError, ErrMode};
use winnow::{ModalResult, Parser};

use crate::arena::MAX_TRACKED_BALLS;
use crate::geometry::Point;

/// Parsed operator command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplCommand {
    /// Start an exploration sweep, optionally overriding the field size and
    /// the entry cell.
    Explore {
        size: Option<(u16, u16)>,
        entry: Option<Point>,
    },
    /// Start a targeted retrieval over the listed ball cells, in order.
    Fetch {
        targets: Vec<Point, MAX_TRACKED_BALLS>,
    },
    /// Report the state of the most recent mission.
    Status,
    /// Render the most recent mission grid.
    Render,
    /// Cancel the mission in flight.
    Stop,
    /// Show usage, optionally for one topic.
    Help(Option<HelpTopic>),
}

/// Help topics the session can expand on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HelpTopic {
    Explore,
    Fetch,
    Status,
    Render,
    Stop,
}

impl fmt::Display for HelpTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HelpTopic::Explore => f.write_str("explore"),
            HelpTopic::Fetch => f.write_str("fetch"),
            HelpTopic::Status => f.write_str("status"),
            HelpTopic::Render => f.write_str("render"),
            HelpTopic::Stop => f.write_str("stop"),
        }
    }
}

/// Command line rejected by the grammar.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ParseCommandError {
    /// Byte offset the parser gave up at.
    pub offset: usize,
}

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized command near byte {}", self.offset)
    }
}

/// Parses one operator line into a command. The whole line must match.
///
/// # Errors
/// Returns the byte offset the grammar gave up at.
pub fn parse_command(line: &str) -> Result<ReplCommand, ParseCommandError> {
    delimited(space0, command, space0)
        .parse(line)
        .map_err(|error| ParseCommandError {
            offset: error.offset(),
        })
}

fn command(input: &mut &str) -> ModalResult<ReplCommand> {
    alt((
        explore_command,
        fetch_command,
        help_command,
        Caseless("status").value(ReplCommand::Status),
        Caseless("render").value(ReplCommand::Render),
        Caseless("stop").value(ReplCommand::Stop),
    ))
    .parse_next(input)
}

fn explore_command(input: &mut &str) -> ModalResult<ReplCommand> {
    preceded(
        Caseless("explore"),
        (
            opt(preceded(space1, field_size)),
            opt(preceded(space1, entry_clause)),
        ),
    )
    .map(|(size, entry)| ReplCommand::Explore { size, entry })
    .parse_next(input)
}

fn fetch_command(input: &mut &str) -> ModalResult<ReplCommand> {
    let _ = Caseless("fetch").parse_next(input)?;
    let mut targets: Vec<Point, MAX_TRACKED_BALLS> = Vec::new();

    let first = preceded(space1, point).parse_next(input)?;
    push_target(&mut targets, first)?;
    while let Some(next) = opt(preceded(space0, point)).parse_next(input)? {
        push_target(&mut targets, next)?;
    }

    Ok(ReplCommand::Fetch { targets })
}

fn push_target(
    targets: &mut Vec<Point, MAX_TRACKED_BALLS>,
    target: Point,
) -> ModalResult<()> {
    targets
        .push(target)
        .map_err(|_| ErrMode::Cut(ContextError::new()))
}

fn help_command(input: &mut &str) -> ModalResult<ReplCommand> {
    preceded(Caseless("help"), opt(preceded(space1, help_topic)))
        .map(ReplCommand::Help)
        .parse_next(input)
}

fn help_topic(input: &mut &str) -> ModalResult<HelpTopic> {
    alt((
        Caseless("explore").value(HelpTopic::Explore),
        Caseless("fetch").value(HelpTopic::Fetch),
        Caseless("status").value(HelpTopic::Status),
        Caseless("render").value(HelpTopic::Render),
        Caseless("stop").value(HelpTopic::Stop),
    ))
    .parse_next(input)
}

fn field_size(input: &mut &str) -> ModalResult<(u16, u16)> {
    separated_pair(dimension, Caseless("x"), dimension).parse_next(input)
}

fn dimension(input: &mut &str) -> ModalResult<u16> {
    digit1.try_map(str::parse).parse_next(input)
}

fn coordinate(input: &mut &str) -> ModalResult<i16> {
    digit1.try_map(str::parse).parse_next(input)
}

fn entry_clause(input: &mut &str) -> ModalResult<Point> {
    preceded((Caseless("from"), space0), point).parse_next(input)
}

fn point(input: &mut &str) -> ModalResult<Point> {
    delimited(
        ('(', space0),
        separated_pair(coordinate, (space0, ',', space0), coordinate),
        (space0, ')'),
    )
    .map(|(x, y)| Point::new(x, y))
    .parse_next(input)
}
