//! Public entry point: turn LaTeX source into a document tree.

use crate::ast::Pandoc;
use crate::diagnostics::LogMessage;
use crate::error::ReaderResult;
use crate::options::ReaderOptions;
use crate::parser;

/// Parse `input` into a [`Pandoc`] document tree, honoring `options`.
///
/// Returns the parsed tree together with any non-fatal diagnostics (skipped
/// content, duplicate macro definitions, unresolved includes). A macro
/// expansion chain that exceeds the nesting bound is the one condition that
/// aborts the parse outright, surfaced as [`crate::error::ReaderError::MacroLoop`].
pub fn read_latex(input: &str, options: &ReaderOptions) -> ReaderResult<(Pandoc, Vec<LogMessage>)> {
    log::debug!("parsing {} bytes of LaTeX source", input.len());
    parser::parse_document(input, options.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_minimal_document() {
        let (doc, logs) = read_latex("Hello, \\emph{world}.", &ReaderOptions::default()).unwrap();
        assert_eq!(doc.blocks.len(), 1);
        assert!(logs.is_empty());
    }
}
