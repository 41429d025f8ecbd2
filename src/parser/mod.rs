//! The parser: token-stream primitives, the macro engine, the inline and
//! block engines, and their supporting element sub-parsers.

pub mod blocks;
pub mod elements;
pub mod inlines;
pub mod macros;
pub mod primitives;
pub mod raw;
pub mod rewriters;
pub mod state;

use crate::ast::{Block, Meta, Pandoc};
use crate::diagnostics::LogMessage;
use crate::error::{ReaderError, ReaderResult};
use crate::options::ReaderOptions;
use crate::tokenizer::tokenize;
use primitives::TokenStream;
use state::ParserState;

/// Parse a complete LaTeX source string into a document tree plus whatever
/// diagnostics were collected along the way.
///
/// Content outside an explicit `\begin{document}...\end{document}` pair (or
/// the whole input, if the source has none) becomes the document body;
/// preamble-only commands (`\title`, `\author`, macro definitions, ...)
/// contribute to `meta` without producing blocks of their own.
///
/// Fails with [`ReaderError::MacroLoop`] if any single macro expansion chain
/// exceeded [`state::MAX_MACRO_EXPANSION_DEPTH`] (spec.md §5).
pub fn parse_document(input: &str, options: ReaderOptions) -> ReaderResult<(Pandoc, Vec<LogMessage>)> {
    let mut state = ParserState::new(options);
    let tokens = tokenize(input);
    let mut stream = TokenStream::new(tokens);

    let top_blocks = blocks::blocks(&mut stream, &mut state);

    if let Some((name, pos)) = state.macro_loop {
        return Err(ReaderError::MacroLoop { name, pos });
    }

    let body = extract_document_body(top_blocks);
    let body = rewriters::normalize_header_levels(body);

    let meta = Meta(state.meta);
    let logs = state.logs;
    Ok((Pandoc { meta, blocks: body }, logs))
}

/// If the top-level parse produced a single `document`-environment `Div`
/// (spec.md §4.5), unwrap it; documents with no explicit `document`
/// environment use every top-level block as-is.
fn extract_document_body(top_blocks: Vec<Block>) -> Vec<Block> {
    if top_blocks.len() == 1 {
        if let Block::Div(attr, inner) = &top_blocks[0] {
            if attr.id.is_empty() && attr.classes.is_empty() {
                return inner.clone();
            }
        }
    }
    top_blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_paragraph_with_no_preamble() {
        let (doc, logs) = parse_document("Hello world.", ReaderOptions::default()).unwrap();
        assert_eq!(doc.blocks.len(), 1);
        assert!(logs.is_empty());
    }

    #[test]
    fn unwraps_explicit_document_environment() {
        let (doc, _) = parse_document(
            "\\title{My Doc}\n\\begin{document}\nHello.\n\\end{document}",
            ReaderOptions::default(),
        )
        .unwrap();
        assert_eq!(doc.blocks.len(), 1);
        assert!(doc.meta.get("title").is_some());
    }

    #[test]
    fn runaway_self_referential_macro_errors_out() {
        let err = parse_document(
            "\\newcommand{\\a}{\\a}\n\\a",
            ReaderOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ReaderError::MacroLoop { .. }));
    }
}
