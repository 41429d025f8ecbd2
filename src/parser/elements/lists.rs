//! Lists (spec.md §4.5): `itemize`, `enumerate`, `description`.

use crate::ast::{Block, ListAttributes, ListNumberDelim, ListNumberStyle};
use crate::parser::primitives::{bracketed, satisfy, skip_ignorable, TokenStream};
use crate::parser::state::ParserState;
use crate::tokenizer::TokenKind;

/// Split an environment body's blocks-producing parse into `\item`-delimited
/// groups. `parse_block_until` is the block-engine's stopping predicate
/// (stop at `\item` or `\end{env_name}`).
fn collect_items(
    stream: &mut TokenStream,
    state: &mut ParserState,
    env_name: &str,
) -> Vec<(Vec<Vec<Block>>, Option<Vec<crate::ast::Inline>>)> {
    collect_items_with_start(stream, state, env_name).1
}

/// Like `collect_items`, but also honors `\setcounter{enumX}{n}` appearing
/// before the first `\item`, returning the start value if present.
fn collect_items_with_start(
    stream: &mut TokenStream,
    state: &mut ParserState,
    env_name: &str,
) -> (Option<i32>, Vec<(Vec<Vec<Block>>, Option<Vec<crate::ast::Inline>>)>) {
    let mut items = Vec::new();
    let mut start = None;
    skip_ignorable(stream, state);
    // Skip anything before the first \item (e.g. stray optional args),
    // honoring \setcounter{enumX}{n} along the way.
    while !at_item(stream) && !at_end_env(stream, env_name) && !stream.is_empty() {
        if matches!(stream.peek(), Some(t) if t.is_control_seq("setcounter")) {
            satisfy(stream, state, |_| true);
            let _counter = crate::parser::primitives::braced(stream, state);
            if let Some(val_toks) = crate::parser::primitives::braced(stream, state) {
                let digits: String = val_toks.iter().map(|t| t.raw.as_str()).collect();
                if let Ok(n) = digits.trim().parse::<i32>() {
                    start = Some(n + 1);
                }
            }
            continue;
        }
        satisfy(stream, state, |_| true);
    }
    while at_item(stream) {
        satisfy(stream, state, |_| true); // consume \item
        let term = bracketed(stream, state).map(|toks| {
            let mut sub = TokenStream::new(toks);
            crate::parser::inlines::many_until_empty(&mut sub, state)
        });
        let was_in_list = state.in_list_item;
        state.in_list_item = true;
        let body = crate::parser::blocks::many_blocks_until(stream, state, |s| {
            at_item(s) || at_end_env(s, env_name)
        });
        state.in_list_item = was_in_list;
        items.push((body, term));
    }
    (start, items)
}

fn at_item(stream: &TokenStream) -> bool {
    matches!(stream.peek(), Some(t) if t.is_control_seq("item"))
}

fn at_end_env(stream: &TokenStream, env_name: &str) -> bool {
    matches!(stream.peek(), Some(t) if t.is_control_seq("end"))
        && matches!(stream.peek_at(1), Some(t) if t.is_symbol('{'))
        && matches!(stream.peek_at(2), Some(t) if matches!(&t.kind, TokenKind::Word(w) if w == env_name))
}

pub fn parse_itemize(stream: &mut TokenStream, state: &mut ParserState) -> Block {
    let items = collect_items(stream, state, "itemize");
    Block::BulletList(items.into_iter().map(|(body, _)| body).collect())
}

pub fn parse_enumerate(stream: &mut TokenStream, state: &mut ParserState, opts: Option<Vec<crate::tokenizer::Token>>) -> Block {
    let mut attrs = ListAttributes::default();
    if let Some(opts) = opts {
        let marker: String = opts.iter().map(|t| t.raw.as_str()).collect();
        attrs.style = infer_style(&marker);
        attrs.delim = infer_delim(&marker);
    }
    let (start, items) = collect_items_with_start(stream, state, "enumerate");
    if let Some(start) = start {
        attrs.start = start;
    }
    Block::OrderedList(attrs, items.into_iter().map(|(body, _)| body).collect())
}

fn infer_style(marker: &str) -> ListNumberStyle {
    if marker.contains('i') || marker.contains('I') {
        if marker.chars().any(|c| c.is_uppercase()) {
            ListNumberStyle::UpperRoman
        } else {
            ListNumberStyle::LowerRoman
        }
    } else if marker.contains('a') {
        ListNumberStyle::LowerAlpha
    } else if marker.contains('A') {
        ListNumberStyle::UpperAlpha
    } else if marker.contains('1') {
        ListNumberStyle::Decimal
    } else {
        ListNumberStyle::DefaultStyle
    }
}

fn infer_delim(marker: &str) -> ListNumberDelim {
    if marker.contains(')') && marker.contains('(') {
        ListNumberDelim::TwoParens
    } else if marker.contains(')') {
        ListNumberDelim::OneParen
    } else if marker.contains('.') {
        ListNumberDelim::Period
    } else {
        ListNumberDelim::DefaultDelim
    }
}

pub fn parse_description(stream: &mut TokenStream, state: &mut ParserState) -> Block {
    let items = collect_items(stream, state, "description");
    Block::DefinitionList(
        items
            .into_iter()
            .map(|(body, term)| (term.unwrap_or_default(), body))
            .collect(),
    )
}
