//! Quote handling (spec.md §4.4): `` ` `` / `''` / `"` open and close
//! double- and single-quoted inline spans when the `smart` extension is
//! enabled; otherwise the raw marker is emitted literally.

use crate::ast::Inline;
use crate::options::Extension;
use crate::parser::state::{ParserState, QuoteContext};

pub const LEFT_DOUBLE_QUOTE: char = '\u{201c}';
pub const RIGHT_DOUBLE_QUOTE: char = '\u{201d}';
pub const LEFT_SINGLE_QUOTE: char = '\u{2018}';
pub const RIGHT_SINGLE_QUOTE: char = '\u{2019}';

/// Toggle double-quote context and return the glyph to emit, honoring the
/// `smart` extension gate.
pub fn toggle_double(state: &mut ParserState, raw_marker: &str) -> Inline {
    if !state.options.extensions.enabled(Extension::Smart) {
        return Inline::Str(raw_marker.to_string());
    }
    match state.quote_context {
        QuoteContext::InDouble => {
            state.quote_context = QuoteContext::None;
            Inline::Str(RIGHT_DOUBLE_QUOTE.to_string())
        }
        _ => {
            state.quote_context = QuoteContext::InDouble;
            Inline::Str(LEFT_DOUBLE_QUOTE.to_string())
        }
    }
}

/// Toggle single-quote context. `closing_allowed` models the apostrophe
/// heuristic: a closing `'` must not be immediately followed by a letter,
/// which callers check before invoking this in the closing direction.
pub fn toggle_single(state: &mut ParserState, closing_allowed: bool) -> Inline {
    if !state.options.extensions.enabled(Extension::Smart) {
        return Inline::Str("'".to_string());
    }
    match state.quote_context {
        QuoteContext::InSingle if closing_allowed => {
            state.quote_context = QuoteContext::None;
            Inline::Str(RIGHT_SINGLE_QUOTE.to_string())
        }
        QuoteContext::InSingle => Inline::Str(RIGHT_SINGLE_QUOTE.to_string()),
        _ => {
            state.quote_context = QuoteContext::InSingle;
            Inline::Str(LEFT_SINGLE_QUOTE.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReaderOptions;

    fn state() -> ParserState {
        ParserState::new(ReaderOptions::default())
    }

    #[test]
    fn double_quote_opens_then_closes() {
        let mut st = state();
        assert_eq!(
            toggle_double(&mut st, "``"),
            Inline::Str(LEFT_DOUBLE_QUOTE.to_string())
        );
        assert_eq!(
            toggle_double(&mut st, "''"),
            Inline::Str(RIGHT_DOUBLE_QUOTE.to_string())
        );
    }

    #[test]
    fn smart_disabled_emits_raw_marker() {
        let mut st = state();
        st.options.extensions = crate::options::Extensions::none();
        assert_eq!(toggle_double(&mut st, "``"), Inline::Str("``".to_string()));
    }
}
