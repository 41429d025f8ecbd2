//! Recoverable-warning taxonomy (spec.md §7).
//!
//! These never abort a parse; they accumulate in [`crate::parser::state::ParserState`]
//! in source-position order and are also mirrored through the `log` facade so
//! a host running this reader standalone still sees them on stderr.

use crate::tokenizer::token::Position;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogMessage {
    SkippedContent { raw: String, pos: Position },
    MacroAlreadyDefined { name: String, pos: Position },
    UnexpectedEndOfDocument { env_name: String },
    CouldNotLoadIncludeFile { path: String, pos: Position },
    ParsingUnescaped { ch: char, pos: Position },
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogMessage::SkippedContent { raw, pos } => {
                write!(f, "skipped content {:?} at {}:{}", raw, pos.line, pos.col)
            }
            LogMessage::MacroAlreadyDefined { name, pos } => {
                write!(
                    f,
                    "macro \\{} already defined at {}:{}",
                    name, pos.line, pos.col
                )
            }
            LogMessage::UnexpectedEndOfDocument { env_name } => {
                write!(f, "unexpected end of document inside {{{}}}", env_name)
            }
            LogMessage::CouldNotLoadIncludeFile { path, pos } => {
                write!(
                    f,
                    "could not load include file {:?} at {}:{}",
                    path, pos.line, pos.col
                )
            }
            LogMessage::ParsingUnescaped { ch, pos } => {
                write!(
                    f,
                    "parsing unescaped special character {:?} at {}:{}",
                    ch, pos.line, pos.col
                )
            }
        }
    }
}

/// Record a log message both into the accumulator and onto the `log` facade.
pub fn emit(messages: &mut Vec<LogMessage>, message: LogMessage) {
    log::warn!("{}", message);
    messages.push(message);
}
