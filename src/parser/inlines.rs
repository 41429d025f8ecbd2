//! The inline engine (spec.md §4.4): dispatches control sequences and
//! environments to inline builders.

use crate::ast::{Attr, Inline, MathType};
use crate::options::Extension;
use crate::parser::elements::{accents, citations, quotes};
use crate::parser::primitives::{braced, bracketed, satisfy, skip_ignorable, TokenStream};
use crate::parser::state::ParserState;
use crate::tokenizer::{Token, TokenKind};

/// Parse one inline element from the head of `stream`. Returns `None` when
/// the stream is empty or the head belongs to an enclosing block construct
/// the caller should handle instead (e.g. a closing `}` or `\end{...}`).
pub fn one_inline(stream: &mut TokenStream, state: &mut ParserState) -> Option<Inline> {
    let head = stream.peek()?.clone();
    match &head.kind {
        TokenKind::Word(w) => {
            let w = w.clone();
            satisfy(stream, state, |_| true);
            Some(Inline::Str(w))
        }
        TokenKind::Spaces => {
            satisfy(stream, state, |_| true);
            Some(Inline::Space)
        }
        TokenKind::Newline => {
            satisfy(stream, state, |_| true);
            if matches!(stream.peek(), Some(t) if t.is_newline()) {
                None
            } else {
                Some(Inline::SoftBreak)
            }
        }
        TokenKind::Comment(_) => {
            satisfy(stream, state, |_| true);
            one_inline(stream, state)
        }
        TokenKind::Esc1(_) | TokenKind::Esc2(_) => {
            let ch = head.decode_escape().unwrap_or('?');
            satisfy(stream, state, |_| true);
            Some(Inline::Str(ch.to_string()))
        }
        TokenKind::Arg(_) => {
            satisfy(stream, state, |_| true);
            Some(Inline::Str(head.raw.clone()))
        }
        TokenKind::Symbol(c) => read_symbol(stream, state, *c),
        TokenKind::ControlSeq(name) => read_control_seq(stream, state, &name.clone(), &head),
    }
}

fn read_symbol(stream: &mut TokenStream, state: &mut ParserState, c: char) -> Option<Inline> {
    match c {
        '-' => {
            let mut run = String::new();
            while matches!(stream.peek(), Some(t) if t.is_symbol('-')) {
                satisfy(stream, state, |_| true);
                run.push('-');
            }
            Some(Inline::Str(match run.len() {
                1 => "-".to_string(),
                2 => "\u{2013}".to_string(),
                _ => "\u{2014}".to_string(),
            }))
        }
        '~' => {
            satisfy(stream, state, |_| true);
            Some(Inline::Str("\u{a0}".to_string()))
        }
        '`' => {
            satisfy(stream, state, |_| true);
            if matches!(stream.peek(), Some(t) if t.is_symbol('`')) {
                satisfy(stream, state, |_| true);
                Some(quotes::toggle_double(state, "``"))
            } else {
                Some(quotes::toggle_single(state, false))
            }
        }
        '\'' => {
            satisfy(stream, state, |_| true);
            if matches!(stream.peek(), Some(t) if t.is_symbol('\'')) {
                satisfy(stream, state, |_| true);
                Some(quotes::toggle_double(state, "''"))
            } else {
                let next_is_letter =
                    matches!(stream.peek(), Some(t) if matches!(&t.kind, TokenKind::Word(w) if w.chars().next().is_some_and(|c| c.is_alphabetic())));
                Some(quotes::toggle_single(state, !next_is_letter))
            }
        }
        '"' => {
            satisfy(stream, state, |_| true);
            Some(quotes::toggle_double(state, "\""))
        }
        '\u{201c}' | '\u{201d}' | '\u{2018}' | '\u{2019}' => {
            satisfy(stream, state, |_| true);
            Some(Inline::Str(c.to_string()))
        }
        '$' => {
            satisfy(stream, state, |_| true);
            Some(read_math_dollar(stream, state))
        }
        '|' if state.options.extensions.enabled(Extension::LiterateHaskell) => {
            satisfy(stream, state, |_| true);
            Some(read_verbatim_until_symbol(stream, state, '|'))
        }
        '{' => {
            satisfy(stream, state, |_| true);
            let inner = many_until(stream, state, |s| s.peek().is_some_and(|t| t.is_symbol('}')));
            if matches!(stream.peek(), Some(t) if t.is_symbol('}')) {
                satisfy(stream, state, |_| true);
            }
            Some(Inline::Span(Attr::empty(), inner))
        }
        _ => {
            satisfy(stream, state, |_| true);
            Some(Inline::Str(c.to_string()))
        }
    }
}

fn read_math_dollar(stream: &mut TokenStream, state: &mut ParserState) -> Inline {
    let was_verbatim = state.verbatim;
    state.verbatim = true;
    let mut raw = String::new();
    while let Some(t) = stream.peek() {
        if t.is_symbol('$') {
            break;
        }
        raw.push_str(&t.raw);
        satisfy(stream, state, |_| true);
    }
    if matches!(stream.peek(), Some(t) if t.is_symbol('$')) {
        satisfy(stream, state, |_| true);
    }
    state.verbatim = was_verbatim;
    Inline::Math(MathType::InlineMath, raw.trim().to_string())
}

fn read_verbatim_until_symbol(stream: &mut TokenStream, state: &mut ParserState, stop: char) -> Inline {
    let mut raw = String::new();
    while let Some(t) = stream.peek() {
        if t.is_symbol(stop) {
            break;
        }
        raw.push_str(&t.raw);
        stream.pop();
    }
    if matches!(stream.peek(), Some(t) if t.is_symbol(stop)) {
        stream.pop();
    }
    let _ = state;
    Inline::Code(Attr::empty(), raw)
}

/// Parse an argument to an inline command: a braced/grouped inline
/// sequence, a single nested command, or a single inline token.
fn read_inline_arg(stream: &mut TokenStream, state: &mut ParserState) -> Vec<Inline> {
    skip_ignorable(stream, state);
    if matches!(stream.peek(), Some(t) if t.is_symbol('{')) {
        let inner = braced(stream, state).unwrap_or_default();
        let mut sub = TokenStream::new(inner);
        many_until_empty(&mut sub, state)
    } else {
        one_inline(stream, state).into_iter().collect()
    }
}

fn skip_opts(stream: &mut TokenStream, state: &mut ParserState) {
    bracketed(stream, state);
}

/// Parse a bracketed `key=value, key2=value2` list. Values are either a
/// braced group or a run of word/symbol/control-seq tokens up to the next
/// `,` or `]`.
fn parse_keyvals(stream: &mut TokenStream, state: &mut ParserState) -> Vec<(String, String)> {
    let Some(inner) = bracketed(stream, state) else {
        return Vec::new();
    };
    let mut pairs = Vec::new();
    let mut i = 0usize;
    while i < inner.len() {
        while i < inner.len() && (inner[i].is_spaces() || inner[i].is_symbol(',')) {
            i += 1;
        }
        let key_start = i;
        while i < inner.len() && !inner[i].is_symbol('=') && !inner[i].is_symbol(',') {
            i += 1;
        }
        let key: String = inner[key_start..i].iter().map(|t| t.raw.as_str()).collect();
        let key = key.trim().to_string();
        if key.is_empty() {
            break;
        }
        if i < inner.len() && inner[i].is_symbol('=') {
            i += 1;
            if i < inner.len() && inner[i].is_symbol('{') {
                let mut depth = 0i32;
                let val_start = i;
                loop {
                    if i >= inner.len() {
                        break;
                    }
                    if inner[i].is_symbol('{') {
                        depth += 1;
                    } else if inner[i].is_symbol('}') {
                        depth -= 1;
                        if depth == 0 {
                            i += 1;
                            break;
                        }
                    }
                    i += 1;
                }
                let val: String = inner[val_start + 1..i.saturating_sub(1)]
                    .iter()
                    .map(|t| t.raw.as_str())
                    .collect();
                pairs.push((key, val));
            } else {
                let val_start = i;
                while i < inner.len() && !inner[i].is_symbol(',') {
                    i += 1;
                }
                let val: String = inner[val_start..i].iter().map(|t| t.raw.as_str()).collect();
                pairs.push((key, val.trim().to_string()));
            }
        } else {
            pairs.push((key, String::new()));
        }
    }
    pairs
}

fn read_control_seq(
    stream: &mut TokenStream,
    state: &mut ParserState,
    name: &str,
    head: &Token,
) -> Option<Inline> {
    if citations::is_citation_command(name) {
        satisfy(stream, state, |_| true);
        let raw = format!("\\{}", name);
        return Some(citations::parse_citation(stream, state, name, &raw));
    }
    if name == "citetext" {
        satisfy(stream, state, |_| true);
        return Some(citations::parse_citetext(stream, state));
    }
    if accents::ACCENT_COMMANDS.contains(&name) {
        satisfy(stream, state, |_| true);
        skip_ignorable(stream, state);
        return Some(match one_inline(stream, state) {
            Some(target) => accents::apply_accent(name, target),
            None => accents::literal_fallback(name),
        });
    }

    match name {
        "emph" => {
            satisfy(stream, state, |_| true);
            Some(Inline::Emph(read_inline_arg(stream, state)))
        }
        "textit" | "textsl" => {
            satisfy(stream, state, |_| true);
            Some(Inline::Emph(read_inline_arg(stream, state)))
        }
        "textbf" => {
            satisfy(stream, state, |_| true);
            Some(Inline::Strong(read_inline_arg(stream, state)))
        }
        "textsc" => {
            satisfy(stream, state, |_| true);
            Some(Inline::Smallcaps(read_inline_arg(stream, state)))
        }
        "sout" => {
            satisfy(stream, state, |_| true);
            Some(Inline::Strikeout(read_inline_arg(stream, state)))
        }
        "textsuperscript" => {
            satisfy(stream, state, |_| true);
            Some(Inline::Superscript(read_inline_arg(stream, state)))
        }
        "textsubscript" => {
            satisfy(stream, state, |_| true);
            Some(Inline::Subscript(read_inline_arg(stream, state)))
        }
        "textsf" | "textrm" | "text" | "ensuremath" | "xspace" => {
            satisfy(stream, state, |_| true);
            if name == "xspace" {
                return Some(Inline::Space);
            }
            Some(Inline::Span(Attr::empty(), read_inline_arg(stream, state)))
        }
        "texttt" | "verb" | "lstinline" => {
            satisfy(stream, state, |_| true);
            Some(read_code_like(stream, state, name))
        }
        "ldots" | "dots" => {
            satisfy(stream, state, |_| true);
            Some(Inline::Str("\u{2026}".to_string()))
        }
        "url" => {
            satisfy(stream, state, |_| true);
            let target = raw_arg_text(stream, state);
            Some(Inline::Link(
                Attr::empty(),
                vec![Inline::Str(target.clone())],
                (target, String::new()),
            ))
        }
        "href" => {
            satisfy(stream, state, |_| true);
            let target = raw_arg_text(stream, state);
            let label = read_inline_arg(stream, state);
            Some(Inline::Link(Attr::empty(), label, (target, String::new())))
        }
        "includegraphics" => {
            satisfy(stream, state, |_| true);
            skip_opts(stream, state);
            let mut target = raw_arg_text(stream, state);
            if !target.contains('.') && !state.options.default_image_extension.is_empty() {
                target = format!("{}.{}", target, state.options.default_image_extension);
            }
            Some(Inline::Image(Attr::empty(), Vec::new(), (target, String::new())))
        }
        "footnote" | "thanks" => {
            satisfy(stream, state, |_| true);
            let inlines = read_inline_arg(stream, state);
            Some(Inline::Note(vec![crate::ast::Block::Para(inlines)]))
        }
        "label" => {
            satisfy(stream, state, |_| true);
            if let Some(toks) = braced(stream, state) {
                let raw: String = toks.iter().map(|t| t.raw.as_str()).collect();
                if !raw.is_empty() {
                    state.pending_label = Some(state.register_identifier(&raw, "label"));
                }
            }
            None
        }
        "ref" | "cref" => {
            satisfy(stream, state, |_| true);
            let target = raw_arg_text(stream, state);
            Some(Inline::Link(
                Attr::empty(),
                vec![Inline::Str(target.clone())],
                (format!("#{}", target), String::new()),
            ))
        }
        "enquote" => {
            satisfy(stream, state, |_| true);
            let mut inner = vec![Inline::Str("\u{201c}".to_string())];
            inner.extend(read_inline_arg(stream, state));
            inner.push(Inline::Str("\u{201d}".to_string()));
            Some(Inline::Span(Attr::empty(), inner))
        }
        "SI" => {
            satisfy(stream, state, |_| true);
            let value = raw_arg_text(stream, state);
            let unit = raw_arg_text(stream, state);
            Some(Inline::Str(format!("{} {}", value, unit)))
        }
        "color" | "textcolor" => {
            satisfy(stream, state, |_| true);
            let _color = raw_arg_text(stream, state);
            if name == "textcolor" {
                Some(Inline::Span(Attr::empty(), read_inline_arg(stream, state)))
            } else {
                None
            }
        }
        "colorbox" => {
            satisfy(stream, state, |_| true);
            let _color = raw_arg_text(stream, state);
            Some(Inline::Span(Attr::empty(), read_inline_arg(stream, state)))
        }
        "multirow" => {
            satisfy(stream, state, |_| true);
            let _rows = raw_arg_text(stream, state);
            let _width = raw_arg_text(stream, state);
            Some(Inline::Span(Attr::empty(), read_inline_arg(stream, state)))
        }
        "ifstrequal" => {
            satisfy(stream, state, |_| true);
            let _a = raw_arg_text(stream, state);
            let _b = raw_arg_text(stream, state);
            let then_branch = read_inline_arg(stream, state);
            let _else_branch = read_inline_arg(stream, state);
            // Open question (spec.md §9): `\else` assumes the if-branch.
            Some(Inline::Span(Attr::empty(), then_branch))
        }
        "hypertarget" => {
            satisfy(stream, state, |_| true);
            let _id = raw_arg_text(stream, state);
            Some(Inline::Span(Attr::empty(), read_inline_arg(stream, state)))
        }
        _ if name == "(" => {
            satisfy(stream, state, |_| true);
            Some(read_math_until_ctrl_seq(stream, state, ")", MathType::InlineMath))
        }
        _ if name == "[" => {
            satisfy(stream, state, |_| true);
            Some(read_math_until_ctrl_seq(stream, state, "]", MathType::DisplayMath))
        }
        _ => {
            let raw = head.raw.clone();
            satisfy(stream, state, |_| true);
            crate::parser::raw::inline_command(stream, state, name, &raw)
        }
    }
}

fn read_math_until_ctrl_seq(
    stream: &mut TokenStream,
    state: &mut ParserState,
    close: &str,
    math_type: MathType,
) -> Inline {
    let was_verbatim = state.verbatim;
    state.verbatim = true;
    let mut raw = String::new();
    loop {
        match stream.peek() {
            Some(t) if t.is_control_seq(close) => break,
            Some(t) => {
                raw.push_str(&t.raw);
                satisfy(stream, state, |_| true);
            }
            None => break,
        }
    }
    if matches!(stream.peek(), Some(t) if t.is_control_seq(close)) {
        satisfy(stream, state, |_| true);
    }
    state.verbatim = was_verbatim;
    Inline::Math(math_type, raw.trim().to_string())
}

fn read_code_like(stream: &mut TokenStream, state: &mut ParserState, name: &str) -> Inline {
    if name == "texttt" {
        return Inline::Code(Attr::empty(), raw_arg_text(stream, state));
    }
    // \verb and \lstinline use the next non-letter character as delimiter.
    skip_ignorable(stream, state);
    let delim = match stream.peek() {
        Some(t) => match &t.kind {
            TokenKind::Symbol(c) => *c,
            _ => '{',
        },
        None => '{',
    };
    if delim == '{' {
        return Inline::Code(Attr::empty(), raw_arg_text(stream, state));
    }
    satisfy(stream, state, |_| true);
    let was_verbatim = state.verbatim;
    state.verbatim = true;
    let mut raw = String::new();
    while let Some(t) = stream.peek() {
        if t.is_symbol(delim) {
            break;
        }
        raw.push_str(&t.raw);
        satisfy(stream, state, |_| true);
    }
    if matches!(stream.peek(), Some(t) if t.is_symbol(delim)) {
        satisfy(stream, state, |_| true);
    }
    state.verbatim = was_verbatim;
    Inline::Code(Attr::empty(), raw)
}

fn raw_arg_text(stream: &mut TokenStream, state: &mut ParserState) -> String {
    skip_ignorable(stream, state);
    if matches!(stream.peek(), Some(t) if t.is_symbol('{')) {
        let toks = braced(stream, state).unwrap_or_default();
        toks.iter().map(|t| t.raw.as_str()).collect()
    } else if let Some(t) = stream.peek().cloned() {
        satisfy(stream, state, |_| true);
        t.raw
    } else {
        String::new()
    }
}

/// Parse inlines until `stop` holds at the head of the stream.
pub fn many_until(
    stream: &mut TokenStream,
    state: &mut ParserState,
    stop: impl Fn(&TokenStream) -> bool,
) -> Vec<Inline> {
    let mut out = Vec::new();
    while !stream.is_empty() && !stop(stream) {
        match one_inline(stream, state) {
            Some(inline) => out.push(inline),
            None => {
                if stream.is_empty() || stop(stream) {
                    break;
                }
            }
        }
    }
    out
}

/// Parse inlines until the stream is exhausted (used for braced groups and
/// other already-isolated token slices).
pub fn many_until_empty(stream: &mut TokenStream, state: &mut ParserState) -> Vec<Inline> {
    many_until(stream, state, |s| s.is_empty())
}

/// Parse inlines until `\end{name}` or end of stream, used by block-level
/// environment bodies that embed inline content directly (e.g. table
/// cells, captions).
pub fn many_until_end_env(
    stream: &mut TokenStream,
    state: &mut ParserState,
    name: &str,
) -> Vec<Inline> {
    let owned = name.to_string();
    many_until(stream, state, |s| {
        matches!(s.peek(), Some(t) if t.is_control_seq("end"))
            && matches!(s.peek_at(1), Some(t) if t.is_symbol('{'))
            && matches!(s.peek_at(2), Some(t) if matches!(&t.kind, TokenKind::Word(w) if *w == owned))
    })
}

/// Used by the keyvals primitive elsewhere in the block engine.
pub fn parse_keyvals_public(stream: &mut TokenStream, state: &mut ParserState) -> Vec<(String, String)> {
    parse_keyvals(stream, state)
}
