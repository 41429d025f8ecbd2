//! Crate-wide error type.
//!
//! Hand-rolled `Display`/`Error` impls, same shape as the teacher's
//! `ProcessError`/`BlockParseError`: the teacher has no `thiserror`
//! dependency and we keep the ambient stack aligned rather than introduce
//! one for a handful of variants.

use crate::tokenizer::token::Position;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderError {
    /// Unrecoverable syntactic failure.
    Parse { message: String, pos: Position },
    /// Macro expansion exceeded the nested-expansion bound.
    MacroLoop { name: String, pos: Position },
    /// An include file could not be resolved or read, surfaced as a hard
    /// failure because the include service could not make progress.
    Include { path: String, pos: Position },
    Io(String),
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderError::Parse { message, pos } => {
                write!(f, "parse error at {}:{}: {}", pos.line, pos.col, message)
            }
            ReaderError::MacroLoop { name, pos } => write!(
                f,
                "macro expansion loop in \\{} at {}:{} (exceeded nesting bound)",
                name, pos.line, pos.col
            ),
            ReaderError::Include { path, pos } => write!(
                f,
                "could not include {:?} at {}:{}",
                path, pos.line, pos.col
            ),
            ReaderError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ReaderError {}

impl From<std::io::Error> for ReaderError {
    fn from(err: std::io::Error) -> Self {
        ReaderError::Io(err.to_string())
    }
}

pub type ReaderResult<T> = Result<T, ReaderError>;
