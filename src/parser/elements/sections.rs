//! Section commands (spec.md §4.5): `\part` through `\subparagraph`, with
//! `*`-variants and a following `\label{id}` attaching the heading anchor.

use crate::ast::{Attr, Block};
use crate::parser::primitives::{braced, satisfy, skip_ignorable, TokenStream};
use crate::parser::state::ParserState;
use crate::tokenizer::TokenKind;

/// Section command name to header level, per spec.md §4.5.
fn level_for(name: &str) -> Option<i32> {
    match name {
        "part" => Some(-1),
        "chapter" => Some(0),
        "section" => Some(1),
        "subsection" => Some(2),
        "subsubsection" => Some(3),
        "paragraph" | "frametitle" => Some(4),
        "subparagraph" => Some(5),
        _ => None,
    }
}

pub fn is_section_command(name: &str) -> bool {
    let base = name.strip_suffix('*').unwrap_or(name);
    level_for(base).is_some()
}

/// Consume a section command (already at the head of `stream`) and return
/// the resulting `Header` block.
pub fn parse_section(stream: &mut TokenStream, state: &mut ParserState) -> Option<Block> {
    let head = stream.peek()?.clone();
    let TokenKind::ControlSeq(name) = &head.kind else {
        return None;
    };
    let name = name.clone();
    let base = name.strip_suffix('*').unwrap_or(&name).to_string();
    let level = level_for(&base)?;
    let unnumbered = name.ends_with('*');

    satisfy(stream, state, |_| true);
    // Skip a `[short title]` if present — we don't carry a separate
    // short-title slot, the long title is authoritative.
    crate::parser::primitives::bracketed(stream, state);

    let title_toks = braced(stream, state).unwrap_or_default();
    let mut title_stream = TokenStream::new(title_toks);
    let title = crate::parser::inlines::many_until_empty(&mut title_stream, state);

    let mut attr = Attr::empty();
    if unnumbered {
        attr = attr.with_class("unnumbered");
    }

    // Optional trailing `\label{id}`.
    skip_ignorable(stream, state);
    if matches!(stream.peek(), Some(t) if t.is_control_seq("label")) {
        satisfy(stream, state, |_| true);
        if let Some(id_toks) = braced(stream, state) {
            let proposed: String = id_toks.iter().map(|t| t.raw.as_str()).collect();
            attr.id = state.register_header_id(&proposed);
        }
    }
    if attr.id.is_empty() {
        let slug = slugify(&title);
        attr.id = state.register_header_id(&slug);
    }

    Some(Block::Header(level, attr, title))
}

fn slugify(inlines: &[crate::ast::Inline]) -> String {
    let text = crate::parser::rewriters::inlines_to_plain_text(inlines);
    let mut slug = String::new();
    let mut last_was_dash = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && !slug.is_empty() {
            slug.push('-');
            last_was_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Inline;
    use crate::options::ReaderOptions;
    use crate::tokenizer::tokenize;

    fn new_state() -> ParserState {
        ParserState::new(ReaderOptions::default())
    }

    #[test]
    fn section_with_label_sets_header_id() {
        let mut st = new_state();
        let mut stream = TokenStream::new(tokenize("\\section{Intro}\\label{sec:intro}"));
        let block = parse_section(&mut stream, &mut st).unwrap();
        match block {
            Block::Header(level, attr, title) => {
                assert_eq!(level, 1);
                assert_eq!(attr.id, "sec:intro");
                assert_eq!(title, vec![Inline::Str("Intro".to_string())]);
            }
            other => panic!("expected Header, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_titles_get_unique_ids() {
        let mut st = new_state();
        let mut first = TokenStream::new(tokenize("\\section{Overview}"));
        let mut second = TokenStream::new(tokenize("\\section{Overview}"));
        let a = parse_section(&mut first, &mut st).unwrap();
        let b = parse_section(&mut second, &mut st).unwrap();
        let id_a = match a {
            Block::Header(_, attr, _) => attr.id,
            _ => panic!("expected Header"),
        };
        let id_b = match b {
            Block::Header(_, attr, _) => attr.id,
            _ => panic!("expected Header"),
        };
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn starred_section_carries_unnumbered_class() {
        let mut st = new_state();
        let mut stream = TokenStream::new(tokenize("\\section*{Preface}"));
        let block = parse_section(&mut stream, &mut st).unwrap();
        match block {
            Block::Header(level, attr, _) => {
                assert_eq!(level, 1);
                assert!(attr.classes.contains(&"unnumbered".to_string()));
            }
            other => panic!("expected Header, got {:?}", other),
        }
    }
}
