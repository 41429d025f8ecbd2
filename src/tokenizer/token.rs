//! Token-level types: precise source positions and the token kind table
//! from spec.md §4.1.

use serde::{Deserialize, Serialize};

/// A single point in the source text. Unlike the teacher's language-server
/// oriented `SourceSpan` (start+end, for hover/autocomplete ranges), this
/// reader only ever needs the start of a token to point error messages and
/// macro-substitution positions at the right place, so we carry a single
/// `Position` per token rather than a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn start() -> Self {
        Position { line: 1, col: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    ControlSeq(String),
    Symbol(char),
    Word(String),
    Spaces,
    Newline,
    Comment(String),
    Arg(u32),
    Esc1(char),
    Esc2(char),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
    pub raw: String,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Position, raw: impl Into<String>) -> Self {
        Token {
            kind,
            pos,
            raw: raw.into(),
        }
    }

    /// Produce a copy of this token rewritten to appear as if it originated
    /// at `pos` — used when substituting a macro argument's tokens into the
    /// call site so error messages point at the user's invocation, not the
    /// macro body (spec.md §9, "Token-position rewriting on macro
    /// substitution").
    pub fn rebased(&self, pos: Position) -> Self {
        Token {
            kind: self.kind.clone(),
            pos,
            raw: self.raw.clone(),
        }
    }

    pub fn is_control_seq(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::ControlSeq(n) if n == name)
    }

    pub fn is_symbol(&self, ch: char) -> bool {
        matches!(self.kind, TokenKind::Symbol(c) if c == ch)
    }

    pub fn is_spaces(&self) -> bool {
        matches!(self.kind, TokenKind::Spaces)
    }

    pub fn is_newline(&self) -> bool {
        matches!(self.kind, TokenKind::Newline)
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::Comment(_))
    }

    /// Decode an `Esc1`/`Esc2` token to the single character it represents
    /// (spec.md §4.1): `Esc2` is hex, `Esc1` flips bit 6.
    pub fn decode_escape(&self) -> Option<char> {
        match self.kind {
            TokenKind::Esc1(c) => {
                let b = c as u32;
                let flipped = if b >= 64 { b - 64 } else { b + 64 };
                char::from_u32(flipped)
            }
            TokenKind::Esc2(_) => {
                let hex = &self.raw[2..4];
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            }
            _ => None,
        }
    }
}
