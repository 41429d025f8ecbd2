//! Parser state (spec.md §3.3): the threaded, by-value state object every
//! sub-parse clones and, at re-entrant boundaries, merges back into its
//! caller (spec.md §4.9, §9 "Macro table mutation during parse").

use crate::ast::MetaValue;
use crate::diagnostics::{self, LogMessage};
use crate::options::ReaderOptions;
use crate::tokenizer::Token;
use std::collections::{BTreeMap, HashSet};

/// How a `Pattern` macro argument is delimited (spec.md §3.2).
#[derive(Debug, Clone, PartialEq)]
pub enum ArgSpec {
    Naked,
    Braced,
    Bracketed,
    SymbolSuffixed(char),
    CtrlSeqSuffixed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Macro {
    FixedArity {
        arity: u32,
        default: Option<Vec<Token>>,
        body: Vec<Token>,
    },
    Pattern {
        specs: Vec<ArgSpec>,
        body: Vec<Token>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteContext {
    None,
    InSingle,
    InDouble,
}

/// The maximum nesting depth of macro expansion before a parse aborts with
/// `MacroLoop` (spec.md §4.3, §5).
pub const MAX_MACRO_EXPANSION_DEPTH: u32 = 20;

#[derive(Debug, Clone)]
pub struct ParserState {
    pub macros: BTreeMap<String, Macro>,
    pub identifiers: HashSet<String>,
    pub include_stack: Vec<String>,
    pub logs: Vec<LogMessage>,
    pub meta: BTreeMap<String, MetaValue>,
    pub quote_context: QuoteContext,
    pub verbatim: bool,
    pub pending_caption: Option<Vec<crate::ast::Inline>>,
    /// Set by a `\label{...}` seen since the last figure/table/section
    /// boundary; consumed by whichever of those attaches anchors (spec.md
    /// §4.5, §4.7).
    pub pending_label: Option<String>,
    pub in_list_item: bool,
    pub in_table_cell: bool,
    pub options: ReaderOptions,
    /// Set when expansion exceeds [`MAX_MACRO_EXPANSION_DEPTH`]; checked by
    /// the outer parse after `blocks` returns and surfaced as
    /// `ReaderError::MacroLoop` (spec.md §5, cancellation).
    pub macro_loop: Option<(String, crate::tokenizer::Position)>,
}

impl ParserState {
    pub fn new(options: ReaderOptions) -> Self {
        ParserState {
            macros: BTreeMap::new(),
            identifiers: HashSet::new(),
            include_stack: Vec::new(),
            logs: Vec::new(),
            meta: BTreeMap::new(),
            quote_context: QuoteContext::None,
            verbatim: false,
            pending_caption: None,
            pending_label: None,
            in_list_item: false,
            in_table_cell: false,
            options,
            macro_loop: None,
        }
    }

    pub fn log(&mut self, message: LogMessage) {
        diagnostics::emit(&mut self.logs, message);
    }

    /// Make a unique anchor from a proposed identifier, falling back to
    /// `fallback` if `proposed` is empty and appending a `-n` suffix on
    /// collision (spec.md §4.5, "Identifier uniqueness"). Shared by heading
    /// anchors and `\label` targets — both draw from the same identifier
    /// set, so a figure labeled the same as a heading still gets a unique id.
    pub fn register_identifier(&mut self, proposed: &str, fallback: &str) -> String {
        let proposed = if proposed.is_empty() { fallback } else { proposed };
        if !self.identifiers.contains(proposed) {
            self.identifiers.insert(proposed.to_string());
            return proposed.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}-{}", proposed, n);
            if !self.identifiers.contains(&candidate) {
                self.identifiers.insert(candidate.clone());
                return candidate;
            }
            n += 1;
        }
    }

    /// Make a unique heading anchor from a proposed slug (spec.md §4.5,
    /// "Identifier uniqueness").
    pub fn register_header_id(&mut self, proposed: &str) -> String {
        self.register_identifier(proposed, "section")
    }

    /// Merge macros learned by a sub-parse (raw escape hatch, include file)
    /// back into this state, per spec.md §4.9.
    pub fn merge_macros_from(&mut self, other: &ParserState) {
        for (name, m) in &other.macros {
            self.macros.entry(name.clone()).or_insert_with(|| m.clone());
        }
    }
}
