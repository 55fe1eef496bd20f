//! Operator command surface shared between the core and host tooling.

pub mod grammar;

pub use grammar::{HelpTopic, ParseCommandError, ReplCommand, parse_command};
