//! Raw-LaTeX escape hatches (spec.md §4.9): best-effort recovery for
//! content the structured inline/block engines don't model directly.
//! Anything these helpers salvage from a sub-parse — most importantly
//! macro definitions sitting inside an otherwise-unrecognized environment —
//! is merged back into the caller's table via
//! [`ParserState::merge_macros_from`].

use crate::ast::{Attr, Block, Inline};
use crate::diagnostics::LogMessage;
use crate::options::Extension;
use crate::parser::primitives::{braced, satisfy, skip_ignorable, TokenStream};
use crate::parser::state::ParserState;
use crate::tokenizer::{tokenize, Position, Token};

/// Handle an unrecognized control sequence at the inline level: swallow one
/// optional braced argument (so the surrounding paragraph doesn't
/// desynchronize), then either keep the whole thing as a `RawInline` (when
/// `raw_tex` is enabled and the name is display-safe) or drop it with a
/// logged diagnostic.
pub fn inline_command(
    stream: &mut TokenStream,
    state: &mut ParserState,
    name: &str,
    raw: &str,
) -> Option<Inline> {
    let arg = {
        skip_ignorable(stream, state);
        if matches!(stream.peek(), Some(t) if t.is_symbol('{')) {
            braced(stream, state)
        } else {
            None
        }
    };
    let mut full_raw = raw.to_string();
    if let Some(arg) = &arg {
        full_raw.push('{');
        full_raw.extend(arg.iter().map(|t| t.raw.as_str()));
        full_raw.push('}');
    }
    if state.options.extensions.enabled(Extension::RawTex) && is_inline_safe(name) {
        Some(wrap_raw_inline(full_raw))
    } else {
        state.log(LogMessage::SkippedContent {
            raw: full_raw,
            pos: head_pos(stream),
        });
        None
    }
}

fn is_inline_safe(name: &str) -> bool {
    !name.is_empty() && name.chars().next().unwrap().is_alphabetic()
}

fn head_pos(stream: &TokenStream) -> Position {
    stream.peek().map(|t| t.pos).unwrap_or(Position::start())
}

/// Wrap literal LaTeX source as a raw inline node.
fn wrap_raw_inline(source: String) -> Inline {
    Inline::RawInline("latex".to_string(), source)
}

/// Wrap literal LaTeX source as a raw block node.
fn wrap_raw_block(source: String) -> Block {
    Block::RawBlock("latex".to_string(), source)
}

/// Re-tokenize `raw` and run it purely through macro expansion (no AST is
/// built), re-serializing the expanded tokens back to text. Used to give a
/// passed-through raw block/inline the benefit of macro substitution even
/// though its content was never structurally parsed. A no-op unless the
/// `latex_macros` extension is on (spec.md §4.9, `applyMacros`).
pub fn apply_macros(raw: &str, state: &mut ParserState) -> String {
    if !state.options.extensions.enabled(Extension::LatexMacros) {
        return raw.to_string();
    }
    let tokens = tokenize(raw);
    let mut stream = TokenStream::new(tokens);
    let mut out = String::new();
    while let Some(tok) = satisfy(&mut stream, state, |_| true) {
        out.push_str(&tok.raw);
    }
    out
}

fn consumed_char_len(tokens: &[Token], count: usize) -> usize {
    tokens.iter().take(count).map(|t| t.raw.chars().count()).sum()
}

/// `rawLaTeXBlock` (spec.md §4.9): a host reader embedding this one hands
/// over its remaining character input at a point it suspects starts a
/// LaTeX block construct (an environment, a macro definition, or any other
/// block-level command). Tokenizes `input` and attempts exactly one
/// block-level construct at its head; on success, merges any macros the
/// sub-parse learned back into `state` (so `\newcommand` inside a raw
/// island still reaches the rest of the document) and returns the parsed
/// block (`None` when the construct was a macro definition or other
/// side-effecting no-output command) alongside the number of *characters*
/// consumed from `input`, so the host can advance its own cursor by
/// exactly that much rather than guessing at token boundaries.
pub fn raw_latex_block(input: &str, state: &mut ParserState) -> Option<(Option<Block>, usize)> {
    let tokens = tokenize(input);
    let mut stream = TokenStream::new(tokens.clone());
    if stream.is_empty() {
        return None;
    }
    let mut sub_state = state.clone();
    let before = stream.len();
    let parsed = crate::parser::blocks::one_block(&mut stream, &mut sub_state);
    let consumed_tokens = before - stream.len();
    if consumed_tokens == 0 {
        return None;
    }
    state.merge_macros_from(&sub_state);
    state.logs = sub_state.logs;
    Some((parsed, consumed_char_len(&tokens, consumed_tokens)))
}

/// `rawLaTeXInline` (spec.md §4.9): as [`raw_latex_block`], but for a host
/// suspecting its remaining input starts an inline-level construct
/// (`inlineEnvironment`/`inlineCommand` in spec terms) rather than a block.
pub fn raw_latex_inline(input: &str, state: &mut ParserState) -> Option<(Inline, usize)> {
    let tokens = tokenize(input);
    let mut stream = TokenStream::new(tokens.clone());
    if stream.is_empty() {
        return None;
    }
    let mut sub_state = state.clone();
    let before = stream.len();
    let parsed = crate::parser::inlines::one_inline(&mut stream, &mut sub_state)?;
    let consumed_tokens = before - stream.len();
    state.merge_macros_from(&sub_state);
    state.logs = sub_state.logs;
    Some((parsed, consumed_char_len(&tokens, consumed_tokens)))
}

/// Attempt to recover a real document tree from an unrecognized
/// environment's body instead of treating it as entirely opaque: re-tokenize
/// `raw_body` and run it through the block engine in an isolated clone of
/// `state`, so a stray `\newcommand` inside it still reaches the rest of the
/// document (merged back via [`ParserState::merge_macros_from`]) without the
/// sub-parse's own diagnostics polluting the caller unless it actually runs.
///
/// Falls back to an opaque `RawBlock` (macro-expanded, when `raw_tex` is
/// enabled) or a dropped, logged block when the body yields nothing
/// structured.
pub fn recover_unknown_environment(
    name: &str,
    raw_body: &str,
    state: &mut ParserState,
    pos: Position,
) -> Option<Block> {
    let mut sub_state = state.clone();
    let tokens = tokenize(raw_body);
    let mut stream = TokenStream::new(tokens);
    let inner = crate::parser::blocks::many_blocks_until(&mut stream, &mut sub_state, |s| s.is_empty());
    state.merge_macros_from(&sub_state);
    state.logs = sub_state.logs;

    if !inner.is_empty() {
        return Some(Block::Div(Attr::empty().with_class(name), inner));
    }
    if state.options.extensions.enabled(Extension::RawTex) {
        let expanded = apply_macros(raw_body, state);
        Some(wrap_raw_block(format!(
            "\\begin{{{}}}{}\\end{{{}}}",
            name, expanded, name
        )))
    } else {
        state.log(LogMessage::SkippedContent {
            raw: format!("\\begin{{{}}}...\\end{{{}}}", name, name),
            pos,
        });
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReaderOptions;

    fn new_state() -> ParserState {
        ParserState::new(ReaderOptions::default())
    }

    #[test]
    fn apply_macros_substitutes_defined_command() {
        let mut st = new_state();
        st.macros.insert(
            "greet".to_string(),
            crate::parser::state::Macro::FixedArity {
                arity: 0,
                default: None,
                body: tokenize("hello"),
            },
        );
        let out = apply_macros("\\greet world", &mut st);
        assert!(out.contains("hello"));
    }

    #[test]
    fn recover_unknown_environment_parses_paragraph() {
        let mut st = new_state();
        let pos = Position::start();
        let block = recover_unknown_environment("custom", "Some text.", &mut st, pos);
        match block {
            Some(Block::Div(_, inner)) => assert_eq!(inner.len(), 1),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn raw_latex_block_parses_paragraph_and_reports_consumed_chars() {
        let mut st = new_state();
        let input = "Hello world.\n\nNext paragraph.";
        let (block, consumed) = raw_latex_block(input, &mut st).expect("should parse");
        assert!(matches!(block, Some(Block::Para(_))));
        assert!(consumed > 0 && consumed <= input.len());
        assert!(input[consumed..].trim_start().starts_with("Next paragraph"));
    }

    #[test]
    fn raw_latex_block_merges_macro_definition_back() {
        let mut st = new_state();
        let input = "\\newcommand{\\greet}{hello}";
        let (block, consumed) = raw_latex_block(input, &mut st).expect("should consume the def");
        assert!(block.is_none());
        assert_eq!(consumed, input.chars().count());
        assert!(st.macros.contains_key("greet"));
    }

    #[test]
    fn raw_latex_inline_parses_control_sequence() {
        let mut st = new_state();
        st.macros.insert(
            "textbf".to_string(),
            crate::parser::state::Macro::FixedArity {
                arity: 1,
                default: None,
                body: Vec::new(),
            },
        );
        let input = "\\textbf{bold} rest";
        let result = raw_latex_inline(input, &mut st);
        assert!(result.is_some());
    }

    #[test]
    fn raw_latex_block_returns_none_on_empty_input() {
        let mut st = new_state();
        assert!(raw_latex_block("", &mut st).is_none());
    }
}
