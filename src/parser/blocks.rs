//! The block engine (spec.md §4.5): paragraph/environment alternation and
//! the environment dispatch table.

use crate::ast::{Attr, Block, Inline, MathType};
use crate::diagnostics::LogMessage;
use crate::parser::elements::{includes, lists, meta, sections, tables};
use crate::parser::macros;
use crate::parser::primitives::{braced, bracketed, satisfy, skip_ignorable, TokenStream};
use crate::parser::rewriters;
use crate::parser::state::ParserState;
use crate::tokenizer::TokenKind;

const MATH_ENV_NAMES: &[&str] = &[
    "equation", "equation*", "align", "align*", "gather", "gather*", "multline", "multline*",
    "eqnarray", "eqnarray*", "math", "displaymath", "flalign", "flalign*",
];

const TABULAR_ENV_NAMES: &[&str] = &["tabular", "tabular*", "tabularx", "longtable", "array"];

const VERBATIM_ENV_NAMES: &[&str] = &["verbatim", "lstlisting", "minted", "Verbatim", "alltt"];

const THEOREM_LIKE_NAMES: &[&str] = &[
    "theorem", "lemma", "proposition", "corollary", "definition", "example", "remark", "proof",
];

/// Is the stream positioned at a construct the block engine (not the
/// inline engine) should handle — used both as the top-level `block()`
/// dispatch guard and as the stop predicate for paragraph collection.
fn at_block_boundary(stream: &TokenStream) -> bool {
    let Some(head) = stream.peek() else { return true };
    match &head.kind {
        TokenKind::Symbol('}') => true,
        TokenKind::ControlSeq(name) => {
            let base = name.strip_suffix('*').unwrap_or(name);
            macros::is_definition_command(stream)
                || sections::is_section_command(name)
                || name == "begin"
                || name == "end"
                || name == "par"
                || matches!(
                    base,
                    "include" | "input" | "subfile" | "usepackage" | "lstinputlisting"
                        | "graphicspath" | "maketitle" | "tableofcontents" | "appendix"
                        | "title" | "subtitle" | "date" | "dedication" | "address" | "author"
                        | "institute" | "icmlauthor" | "icmlaffiliation" | "bibliography"
                        | "addbibresource" | "bibliographystyle" | "caption" | "label"
                        | "setcounter" | "newpage" | "clearpage" | "pagebreak" | "noindent"
                        | "item"
                )
        }
        _ => false,
    }
}

/// Parse a maximal run of inline content up to the next block boundary or
/// blank line, yielding one `Para`. Blank lines are detected the same way
/// the inline engine signals them: `one_inline` returns `None` after
/// consuming a newline that is itself followed by another newline.
fn paragraph(stream: &mut TokenStream, state: &mut ParserState) -> Option<Block> {
    let mut inlines = Vec::new();
    loop {
        skip_leading_blank_lines(stream, state);
        if stream.is_empty() || at_block_boundary(stream) {
            break;
        }
        match crate::parser::inlines::one_inline(stream, state) {
            Some(inline) => inlines.push(inline),
            None => {
                if stream.is_empty() || at_block_boundary(stream) {
                    break;
                }
                // Blank-line paragraph break: the next token starts a new
                // paragraph, which the caller's outer loop will pick up.
                break;
            }
        }
    }
    trim_trailing_space(&mut inlines);
    if inlines.is_empty() {
        None
    } else {
        Some(Block::Para(inlines))
    }
}

fn skip_leading_blank_lines(stream: &mut TokenStream, state: &mut ParserState) {
    while matches!(stream.peek(), Some(t) if t.is_spaces() || t.is_comment()) {
        satisfy(stream, state, |_| true);
    }
}

fn trim_trailing_space(inlines: &mut Vec<Inline>) {
    while matches!(inlines.last(), Some(Inline::Space) | Some(Inline::SoftBreak)) {
        inlines.pop();
    }
}

/// Parse one block-level construct at the head of `stream`. Returns `None`
/// when the construct produced no block directly (macro definitions,
/// metadata commands, includes) — the caller's loop simply continues.
/// Exposed crate-wide as the re-entrant unit the raw-LaTeX host entry
/// points (spec.md §4.9) build on.
pub(crate) fn one_block(stream: &mut TokenStream, state: &mut ParserState) -> Option<Block> {
    skip_leading_blank_lines(stream, state);
    let head = stream.peek()?.clone();

    if macros::is_definition_command(stream) {
        macros::parse_definition(stream, state);
        return None;
    }

    match &head.kind {
        TokenKind::ControlSeq(name) => {
            let name = name.clone();
            if sections::is_section_command(&name) {
                return sections::parse_section(stream, state);
            }
            let base = name.strip_suffix('*').unwrap_or(&name).to_string();
            match base.as_str() {
                "begin" => return parse_environment(stream, state),
                "par" => {
                    satisfy(stream, state, |_| true);
                    return None;
                }
                "include" | "input" | "subfile" | "usepackage" => {
                    includes::parse_include(stream, state);
                    return None;
                }
                "lstinputlisting" => return includes::parse_lstinputlisting(stream, state),
                "graphicspath" => {
                    includes::parse_graphicspath(stream, state);
                    return None;
                }
                "maketitle" => {
                    meta::skip_maketitle(stream, state);
                    return None;
                }
                "tableofcontents" | "appendix" | "newpage" | "clearpage" | "pagebreak"
                | "noindent" => {
                    satisfy(stream, state, |_| true);
                    return None;
                }
                "title" => {
                    meta::parse_title(stream, state);
                    return None;
                }
                "subtitle" => {
                    meta::parse_subtitle(stream, state);
                    return None;
                }
                "date" => {
                    meta::parse_date(stream, state);
                    return None;
                }
                "dedication" => {
                    meta::parse_dedication(stream, state);
                    return None;
                }
                "address" => {
                    meta::parse_address(stream, state);
                    return None;
                }
                "author" => {
                    meta::parse_author(stream, state);
                    return None;
                }
                "institute" => {
                    meta::parse_institute(stream, state);
                    return None;
                }
                "icmlauthor" => {
                    meta::parse_icmlauthor(stream, state);
                    return None;
                }
                "icmlaffiliation" => {
                    meta::parse_icmlaffiliation(stream, state);
                    return None;
                }
                "bibliography" | "addbibresource" => {
                    meta::parse_bibliography(stream, state);
                    return None;
                }
                "bibliographystyle" => {
                    meta::parse_bibliographystyle(stream, state);
                    return None;
                }
                "caption" => {
                    tables::parse_caption(stream, state);
                    return None;
                }
                "label" => {
                    satisfy(stream, state, |_| true);
                    if let Some(toks) = braced(stream, state) {
                        let raw: String = toks.iter().map(|t| t.raw.as_str()).collect();
                        if !raw.is_empty() {
                            state.pending_label = Some(state.register_identifier(&raw, "label"));
                        }
                    }
                    return None;
                }
                "setcounter" => {
                    satisfy(stream, state, |_| true);
                    braced(stream, state);
                    braced(stream, state);
                    return None;
                }
                _ => {}
            }
            paragraph(stream, state)
        }
        TokenKind::Symbol('}') => None,
        _ => paragraph(stream, state),
    }
}

fn read_env_name(stream: &mut TokenStream, state: &mut ParserState) -> Option<String> {
    satisfy(stream, state, |_| true); // \begin
    let toks = braced(stream, state)?;
    Some(toks.iter().map(|t| t.raw.as_str()).collect())
}

fn consume_matching_end(stream: &mut TokenStream, state: &mut ParserState, name: &str) {
    if matches!(stream.peek(), Some(t) if t.is_control_seq("end")) {
        satisfy(stream, state, |_| true);
        braced(stream, state);
    } else {
        state.log(LogMessage::UnexpectedEndOfDocument {
            env_name: name.to_string(),
        });
    }
}

/// Parse blocks until `stop` holds (used for list items, table cells,
/// float-environment bodies, and anywhere else an environment needs a
/// sub-parse of block content rather than a literal `\end{name}` loop).
pub fn many_blocks_until(
    stream: &mut TokenStream,
    state: &mut ParserState,
    stop: impl Fn(&TokenStream) -> bool,
) -> Vec<Block> {
    let mut out = Vec::new();
    loop {
        skip_leading_blank_lines(stream, state);
        if stream.is_empty() || stop(stream) {
            break;
        }
        match one_block(stream, state) {
            Some(b) => out.push(b),
            None => {
                if stream.is_empty() || stop(stream) {
                    break;
                }
            }
        }
    }
    out
}

fn many_blocks_until_end_env(stream: &mut TokenStream, state: &mut ParserState, name: &str) -> Vec<Block> {
    let owned = name.to_string();
    many_blocks_until(stream, state, |s| {
        matches!(s.peek(), Some(t) if t.is_control_seq("end"))
            && matches!(s.peek_at(1), Some(t) if t.is_symbol('{'))
            && matches!(s.peek_at(2), Some(t) if matches!(&t.kind, TokenKind::Word(w) if *w == owned))
    })
}

fn read_raw_until_end_env(stream: &mut TokenStream, state: &mut ParserState, name: &str) -> String {
    let was_verbatim = state.verbatim;
    state.verbatim = true;
    let mut raw = String::new();
    loop {
        match stream.peek() {
            None => break,
            Some(t)
                if t.is_control_seq("end")
                    && matches!(stream.peek_at(1), Some(t) if t.is_symbol('{'))
                    && matches!(stream.peek_at(2), Some(t) if matches!(&t.kind, TokenKind::Word(w) if w == name)) =>
            {
                break
            }
            _ => {
                let tok = stream.pop().unwrap();
                raw.push_str(&tok.raw);
            }
        }
    }
    state.verbatim = was_verbatim;
    consume_matching_end(stream, state, name);
    raw
}

fn parse_environment(stream: &mut TokenStream, state: &mut ParserState) -> Option<Block> {
    let pos = stream.peek().map(|t| t.pos).unwrap_or(crate::tokenizer::Position::start());
    let name = read_env_name(stream, state)?;
    let base = name.strip_suffix('*').unwrap_or(&name).to_string();

    if VERBATIM_ENV_NAMES.contains(&name.as_str()) {
        skip_ignorable(stream, state);
        bracketed(stream, state); // \begin{lstlisting}[language=...] options, discarded
        let text = read_raw_until_end_env(stream, state, &name);
        let text = text.strip_prefix('\n').unwrap_or(&text).to_string();
        return Some(Block::CodeBlock(Attr::empty(), text));
    }

    if name == "tikzpicture" || name == "tikzcd" {
        let raw = read_raw_until_end_env(stream, state, &name);
        let caption = state.pending_caption.take().unwrap_or_default();
        return Some(rewriters::rewrite_tikz(raw, caption));
    }

    if MATH_ENV_NAMES.contains(&name.as_str()) {
        let was_verbatim = state.verbatim;
        state.verbatim = true;
        let mut raw = String::new();
        loop {
            match stream.peek() {
                None => break,
                Some(t)
                    if t.is_control_seq("end")
                        && matches!(stream.peek_at(1), Some(t) if t.is_symbol('{'))
                        && matches!(stream.peek_at(2), Some(t) if matches!(&t.kind, TokenKind::Word(w) if *w == name)) =>
                {
                    break
                }
                _ => {
                    let tok = stream.pop().unwrap();
                    raw.push_str(&tok.raw);
                }
            }
        }
        state.verbatim = was_verbatim;
        consume_matching_end(stream, state, &name);
        return Some(Block::Para(vec![Inline::Math(MathType::DisplayMath, raw.trim().to_string())]));
    }

    if base == "itemize" {
        skip_ignorable(stream, state);
        bracketed(stream, state);
        let b = lists::parse_itemize(stream, state);
        consume_matching_end(stream, state, &name);
        return Some(b);
    }
    if base == "enumerate" {
        skip_ignorable(stream, state);
        let opts = bracketed(stream, state);
        let b = lists::parse_enumerate(stream, state, opts);
        consume_matching_end(stream, state, &name);
        return Some(b);
    }
    if base == "description" {
        skip_ignorable(stream, state);
        bracketed(stream, state);
        let b = lists::parse_description(stream, state);
        consume_matching_end(stream, state, &name);
        return Some(b);
    }

    if TABULAR_ENV_NAMES.contains(&name.as_str()) {
        skip_ignorable(stream, state);
        bracketed(stream, state); // vertical-alignment option, discarded
        let aligns_toks = braced(stream, state).unwrap_or_default();
        let aligns = tables::parse_aligns(&aligns_toks);
        let body_toks = tables::read_table_env_tokens(stream, state, &name);
        let table = tables::parse_table_body(body_toks, aligns, state);
        consume_matching_end(stream, state, &name);
        return Some(Block::Table(table));
    }

    if name == "document" {
        let blocks = many_blocks_until_end_env(stream, state, &name);
        consume_matching_end(stream, state, &name);
        return Some(Block::Div(Attr::empty(), blocks));
    }

    if name == "abstract" {
        meta::parse_abstract_env(stream, state);
        return None;
    }

    if name == "quote" || name == "quotation" || name == "verse" {
        let blocks = many_blocks_until_end_env(stream, state, &name);
        consume_matching_end(stream, state, &name);
        return Some(Block::BlockQuote(blocks));
    }

    if name == "center" || name == "flushleft" || name == "flushright" {
        let class = match name.as_str() {
            "center" => "center",
            "flushleft" => "flushleft",
            _ => "flushright",
        };
        let blocks = many_blocks_until_end_env(stream, state, &name);
        consume_matching_end(stream, state, &name);
        return Some(Block::Div(Attr::empty().with_class(class), blocks));
    }

    if base == "figure" || base == "wrapfigure" || base == "table" {
        if base == "wrapfigure" {
            bracketed(stream, state);
            braced(stream, state);
            braced(stream, state);
        } else {
            bracketed(stream, state);
        }
        let blocks = many_blocks_until_end_env(stream, state, &name);
        consume_matching_end(stream, state, &name);
        let caption = state.pending_caption.take().unwrap_or_default();
        let label = state.pending_label.take();
        let (class, inner) = if base == "table" {
            let mut inner = blocks;
            if !caption.is_empty() {
                inner.push(Block::Para(caption));
            }
            ("table-float", inner)
        } else {
            ("figure", rewriters::rewrite_figure(blocks, caption, label.clone()))
        };
        let mut attr = Attr::empty().with_class(class);
        if base == "table" {
            if let Some(id) = label {
                attr.id = id;
            }
        }
        return Some(Block::Div(attr, inner));
    }

    if THEOREM_LIKE_NAMES.contains(&name.as_str()) {
        let opt_title = bracketed(stream, state).map(|toks| {
            let mut sub = TokenStream::new(toks);
            crate::parser::inlines::many_until_empty(&mut sub, state)
        });
        let mut blocks = many_blocks_until_end_env(stream, state, &name);
        consume_matching_end(stream, state, &name);
        if let Some(title) = opt_title {
            let mut heading = vec![Inline::Strong(title)];
            heading.push(Inline::Str(".".to_string()));
            blocks.insert(0, Block::Para(heading));
        }
        return Some(Block::Div(Attr::empty().with_class(name.as_str()), blocks));
    }

    if name == "thebibliography" {
        braced(stream, state); // widest-label placeholder
        let blocks = many_blocks_until_end_env(stream, state, &name);
        consume_matching_end(stream, state, &name);
        return Some(Block::Div(Attr::empty().with_class("bibliography"), blocks));
    }

    // Unknown environment: try to recover a real parse of its body (which
    // also rescues any macro definitions it contains) before falling back
    // to an opaque raw block or dropping it.
    let raw = read_raw_until_end_env(stream, state, &name);
    crate::parser::raw::recover_unknown_environment(&name, &raw, state, pos)
}

/// Parse the top-level sequence of blocks until the stream is exhausted.
pub fn blocks(stream: &mut TokenStream, state: &mut ParserState) -> Vec<Block> {
    many_blocks_until(stream, state, |s| s.is_empty())
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
    fn simple_paragraph() {
        let mut st = new_state();
        let mut stream = TokenStream::new(tokenize("Hello world."));
        let result = blocks(&mut stream, &mut st);
        assert_eq!(result.len(), 1);
        assert!(matches!(&result[0], Block::Para(_)));
    }

    #[test]
    fn blank_line_splits_paragraphs() {
        let mut st = new_state();
        let mut stream = TokenStream::new(tokenize("First.\n\nSecond."));
        let result = blocks(&mut stream, &mut st);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn itemize_environment() {
        let mut st = new_state();
        let mut stream = TokenStream::new(tokenize("\\begin{itemize}\\item one\\item two\\end{itemize}"));
        let result = blocks(&mut stream, &mut st);
        assert_eq!(result.len(), 1);
        match &result[0] {
            Block::BulletList(items) => assert_eq!(items.len(), 2),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn section_then_paragraph() {
        let mut st = new_state();
        let mut stream = TokenStream::new(tokenize("\\section{Intro}\nSome text."));
        let result = blocks(&mut stream, &mut st);
        assert_eq!(result.len(), 2);
        assert!(matches!(&result[0], Block::Header(1, _, _)));
        assert!(matches!(&result[1], Block::Para(_)));
    }

    #[test]
    fn verbatim_environment_preserves_raw_text() {
        let mut st = new_state();
        let mut stream = TokenStream::new(tokenize("\\begin{verbatim}\nlet x = 1;\n\\end{verbatim}"));
        let result = blocks(&mut stream, &mut st);
        match &result[0] {
            Block::CodeBlock(_, text) => assert!(text.contains("let x = 1;")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn unknown_environment_is_skipped_without_raw_tex() {
        let mut st = new_state();
        let mut stream = TokenStream::new(tokenize("\\begin{weirdenv}stuff\\end{weirdenv}"));
        let result = blocks(&mut stream, &mut st);
        assert!(result.is_empty());
    }
}
