//! Table sub-engine (spec.md §4.6): alignment-spec parsing, row/cell
//! splitting, header/caption attachment.

use crate::ast::{Alignment, Block, TableBlock};
use crate::parser::primitives::{braced, bracketed, satisfy, skip_ignorable, TokenStream};
use crate::parser::state::ParserState;
use crate::tokenizer::{Token, TokenKind};

/// Parse the `{aligns}` argument content into a column alignment list,
/// expanding `*{n}{spec}` and discarding separators (`|`, `@{..}`, `>{..}`,
/// `<{..}`, `:`, whitespace).
pub fn parse_aligns(tokens: &[Token]) -> Vec<Alignment> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < tokens.len() {
        let t = &tokens[i];
        match &t.kind {
            TokenKind::Word(w) if w.starts_with('*') => {
                // Rare: tokenizer splits `*` as its own Symbol, so this arm
                // is unreachable in practice but kept defensive.
                i += 1;
            }
            TokenKind::Symbol('*') => {
                i += 1;
                let (count, next_i) = read_braced_number(tokens, i);
                i = next_i;
                let (spec_toks, next_i) = read_one_braced_group(tokens, i);
                i = next_i;
                let expanded = parse_aligns(&spec_toks);
                for _ in 0..count {
                    out.extend(expanded.iter().copied());
                }
            }
            TokenKind::Symbol('@') | TokenKind::Symbol('>') | TokenKind::Symbol('<') => {
                i += 1;
                let (_, next_i) = read_one_braced_group(tokens, i);
                i = next_i;
            }
            TokenKind::Symbol('|') | TokenKind::Symbol(':') => {
                i += 1;
            }
            TokenKind::Spaces | TokenKind::Newline | TokenKind::Comment(_) => {
                i += 1;
            }
            TokenKind::Word(w) => {
                for ch in w.chars() {
                    out.push(align_for_letter(ch));
                }
                i += 1;
            }
            TokenKind::Symbol(c) => {
                out.push(align_for_letter(*c));
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }
    out
}

fn align_for_letter(c: char) -> Alignment {
    match c {
        'c' | 'C' => Alignment::Center,
        'l' | 'L' => Alignment::Left,
        'r' | 'R' => Alignment::Right,
        _ => Alignment::Left,
    }
}

fn read_braced_number(tokens: &[Token], mut i: usize) -> (usize, usize) {
    let (toks, next_i) = read_one_braced_group(tokens, i);
    i = next_i;
    let digits: String = toks.iter().map(|t| t.raw.as_str()).collect();
    (digits.trim().parse().unwrap_or(1), i)
}

fn read_one_braced_group(tokens: &[Token], mut i: usize) -> (Vec<Token>, usize) {
    if !matches!(tokens.get(i), Some(t) if t.is_symbol('{')) {
        return (Vec::new(), i);
    }
    i += 1;
    let mut depth = 1i32;
    let mut inner = Vec::new();
    while i < tokens.len() && depth > 0 {
        if tokens[i].is_symbol('{') {
            depth += 1;
        } else if tokens[i].is_symbol('}') {
            depth -= 1;
            if depth == 0 {
                i += 1;
                break;
            }
        }
        inner.push(tokens[i].clone());
        i += 1;
    }
    (inner, i)
}

const HLINE_NAMES: &[&str] = &["hline", "toprule", "midrule", "bottomrule", "endhead", "endfirsthead"];

fn is_hline(t: &Token) -> bool {
    matches!(&t.kind, TokenKind::ControlSeq(c) if HLINE_NAMES.contains(&c.as_str()))
}

/// Split the environment body's raw tokens into rows on `\\`/`\tabularnewline`,
/// recognizing hline-family separators (which may carry a trailing
/// `[dim]`) as their own marker rather than row content. The `bool` alongside
/// each row records whether an hline immediately follows it (before any
/// further cell content), which is the header/body boundary signal.
fn split_rows(tokens: Vec<Token>) -> Vec<(Vec<Token>, bool)> {
    let mut rows: Vec<(Vec<Token>, bool)> = Vec::new();
    let mut current = Vec::new();
    let mut current_has_content = false;
    let mut i = 0usize;
    while i < tokens.len() {
        let t = &tokens[i];
        if matches!(&t.kind, TokenKind::ControlSeq(c) if c == "\\" || c == "tabularnewline") {
            rows.push((std::mem::take(&mut current), false));
            current_has_content = false;
            i += 1;
            continue;
        }
        if is_hline(t) {
            i += 1;
            if matches!(tokens.get(i), Some(t) if t.is_symbol('[')) {
                let (_, next_i) = read_one_bracket_group(&tokens, i);
                i = next_i;
            }
            if !current_has_content {
                if let Some(last) = rows.last_mut() {
                    last.1 = true;
                }
            }
            continue;
        }
        current.push(t.clone());
        current_has_content = true;
        i += 1;
    }
    if !current.is_empty() {
        rows.push((current, false));
    }
    rows
}

fn read_one_bracket_group(tokens: &[Token], mut i: usize) -> (Vec<Token>, usize) {
    if !matches!(tokens.get(i), Some(t) if t.is_symbol('[')) {
        return (Vec::new(), i);
    }
    i += 1;
    let mut depth = 1i32;
    let mut inner = Vec::new();
    while i < tokens.len() && depth > 0 {
        if tokens[i].is_symbol('[') {
            depth += 1;
        } else if tokens[i].is_symbol(']') {
            depth -= 1;
            if depth == 0 {
                i += 1;
                break;
            }
        }
        inner.push(tokens[i].clone());
        i += 1;
    }
    (inner, i)
}

/// Split one row's tokens into cells on top-level `&`.
fn split_cells(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    let mut cells = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0i32;
    for t in tokens {
        if t.is_symbol('{') {
            depth += 1;
            current.push(t);
        } else if t.is_symbol('}') {
            depth -= 1;
            current.push(t);
        } else if depth == 0 && t.is_symbol('&') {
            cells.push(std::mem::take(&mut current));
        } else {
            current.push(t);
        }
    }
    cells.push(current);
    cells
}

fn parse_cell_blocks(tokens: Vec<Token>, state: &mut ParserState) -> Vec<Block> {
    let mut stream = TokenStream::new(tokens);
    let was_in_cell = state.in_table_cell;
    state.in_table_cell = true;
    let blocks = crate::parser::blocks::many_blocks_until(&mut stream, state, |s| s.is_empty());
    state.in_table_cell = was_in_cell;
    blocks
}

fn pad_to(mut cells: Vec<Vec<Block>>, width: usize) -> Vec<Vec<Block>> {
    while cells.len() < width {
        cells.push(Vec::new());
    }
    cells
}

/// Parse a `tabular`/`longtable`-family environment body (the alignment
/// spec has already been consumed by the caller) into a `Table` block.
/// `caption` is whatever is currently pending in `state.pending_caption`
/// after the body is parsed (the rewriter consumes it at environment exit,
/// but tables attach it immediately since there's no separate image to
/// prefer).
pub fn parse_table_body(
    body_tokens: Vec<Token>,
    aligns: Vec<Alignment>,
    state: &mut ParserState,
) -> TableBlock {
    let rows = split_rows(body_tokens);
    let width = aligns.len();

    let mut header: Vec<Vec<Block>> = Vec::new();
    let mut body_rows: Vec<Vec<Vec<Block>>> = Vec::new();
    let mut header_taken = false;

    for (idx, (row, followed_by_hline)) in rows.into_iter().enumerate() {
        let cells = split_cells(row);
        let parsed: Vec<Vec<Block>> = cells
            .into_iter()
            .map(|c| parse_cell_blocks(c, state))
            .collect();
        if idx == 0 && !header_taken && followed_by_hline && !parsed.iter().all(|c| c.is_empty()) {
            header = pad_to(parsed, width);
            header_taken = true;
        } else {
            body_rows.push(pad_to(parsed, width));
        }
    }

    if !header_taken {
        header = vec![Vec::new(); width];
    }

    let caption = state.pending_caption.take().unwrap_or_default();

    TableBlock {
        caption,
        aligns,
        widths: vec![0.0; width],
        header,
        rows: body_rows,
    }
}

pub fn parse_caption(stream: &mut TokenStream, state: &mut ParserState) {
    satisfy(stream, state, |_| true);
    bracketed(stream, state);
    if let Some(toks) = braced(stream, state) {
        let mut sub = TokenStream::new(toks);
        let inlines = crate::parser::inlines::many_until_empty(&mut sub, state);
        state.pending_caption = Some(inlines);
    }
}

pub fn read_table_env_tokens(stream: &mut TokenStream, state: &mut ParserState, env_name: &str) -> Vec<Token> {
    skip_ignorable(stream, state);
    let mut tokens = Vec::new();
    loop {
        match stream.peek() {
            None => break,
            Some(t) if at_end_env(t, stream, env_name) => break,
            _ => {
                tokens.push(satisfy(stream, state, |_| true).unwrap());
            }
        }
    }
    tokens
}

fn at_end_env(t: &Token, stream: &TokenStream, env_name: &str) -> bool {
    t.is_control_seq("end")
        && matches!(stream.peek_at(1), Some(t) if t.is_symbol('{'))
        && matches!(stream.peek_at(2), Some(t) if matches!(&t.kind, TokenKind::Word(w) if w == env_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReaderOptions;
    use crate::tokenizer::tokenize;

    fn new_state() -> ParserState {
        ParserState::new(ReaderOptions::default())
    }

    #[test]
    fn aligns_basic() {
        let toks = tokenize("lr");
        assert_eq!(parse_aligns(&toks), vec![Alignment::Left, Alignment::Right]);
    }

    #[test]
    fn aligns_with_separators() {
        let toks = tokenize("|l|c|r|");
        assert_eq!(
            parse_aligns(&toks),
            vec![Alignment::Left, Alignment::Center, Alignment::Right]
        );
    }

    #[test]
    fn star_expansion() {
        let toks = tokenize("*{3}{c}");
        assert_eq!(
            parse_aligns(&toks),
            vec![Alignment::Center, Alignment::Center, Alignment::Center]
        );
    }

    #[test]
    fn table_two_rows_no_header() {
        let mut st = new_state();
        let toks = tokenize("a & b\\\\c & d");
        let aligns = vec![Alignment::Left, Alignment::Right];
        let table = parse_table_body(toks, aligns, &mut st);
        assert_eq!(table.header.len(), 2);
        assert_eq!(table.rows.len(), 2);
        assert!(table.header[0].is_empty());
    }

    #[test]
    fn table_with_hline_detects_header() {
        let mut st = new_state();
        let toks = tokenize("a & b\\\\\\hline\nc & d");
        let aligns = vec![Alignment::Left, Alignment::Right];
        let table = parse_table_body(toks, aligns, &mut st);
        assert_eq!(table.rows.len(), 1);
        assert!(!table.header[0].is_empty());
    }
}
