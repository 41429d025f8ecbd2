//! Include directives (spec.md §4.5): `\include`, `\input`, `\subfile`,
//! `\usepackage`, `\lstinputlisting`, `\graphicspath`.
//!
//! Resolution against `TEXINPUTS` and the include-file cycle guard are
//! this crate's implementation of the "external insertIncludedFile
//! service" spec.md describes: the crate is standalone, so it owns the
//! filesystem effect instead of delegating it to a host.

use crate::ast::{Attr, Block};
use crate::diagnostics::LogMessage;
use crate::parser::primitives::{braced, bracketed, satisfy, TokenStream};
use crate::parser::state::ParserState;
use std::path::PathBuf;

fn search_path() -> Vec<PathBuf> {
    match std::env::var("TEXINPUTS") {
        Ok(val) if !val.is_empty() => val.split(':').map(PathBuf::from).collect(),
        _ => vec![PathBuf::from(".")],
    }
}

fn resolve(filename: &str) -> Option<PathBuf> {
    let mut candidates = vec![PathBuf::from(filename)];
    if !filename.ends_with(".tex") {
        candidates.push(PathBuf::from(format!("{}.tex", filename)));
    }
    for dir in search_path() {
        for cand in &candidates {
            let full = dir.join(cand);
            if full.is_file() {
                return Some(full);
            }
        }
    }
    None
}

fn braced_comma_list(toks: &[crate::tokenizer::Token]) -> Vec<String> {
    let raw: String = toks.iter().map(|t| t.raw.as_str()).collect();
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Splice one included file's tokenized contents into `stream`, guarding
/// against include cycles via `state.include_stack`.
fn insert_included_file(stream: &mut TokenStream, state: &mut ParserState, filename: &str, pos: crate::tokenizer::Position) {
    if state.include_stack.iter().any(|f| f == filename) {
        state.log(LogMessage::CouldNotLoadIncludeFile {
            path: filename.to_string(),
            pos,
        });
        return;
    }
    let Some(path) = resolve(filename) else {
        state.log(LogMessage::CouldNotLoadIncludeFile {
            path: filename.to_string(),
            pos,
        });
        return;
    };
    let Ok(contents) = std::fs::read_to_string(&path) else {
        state.log(LogMessage::CouldNotLoadIncludeFile {
            path: filename.to_string(),
            pos,
        });
        return;
    };
    // The stack entry is kept for the rest of the document rather than
    // popped after splicing: this flat, queue-based tokenizer has no
    // natural "we're still inside file X" scope once its tokens are merged
    // into the shared stream, so re-including the same file anywhere later
    // in the document is treated as a cycle too.
    state.include_stack.push(filename.to_string());
    let tokens = crate::tokenizer::tokenize(&contents);
    stream.push_front_many(tokens);
}

/// Parse `\include`/`\input`/`\subfile`/`\usepackage{files}`, splicing each
/// resolved file's tokens into the stream. Returns no block directly —
/// content is consumed by the ambient `blocks`/`block` loop after splicing.
pub fn parse_include(stream: &mut TokenStream, state: &mut ParserState) {
    let pos = stream.peek().map(|t| t.pos).unwrap_or(crate::tokenizer::Position::start());
    satisfy(stream, state, |_| true);
    let Some(toks) = braced(stream, state) else {
        return;
    };
    let files = braced_comma_list(&toks);
    for file in files {
        insert_included_file(stream, state, &file, pos);
    }
}

/// `\lstinputlisting[language=..,firstline=..,lastline=..]{file}` reads the
/// file as a `CodeBlock` with optional language/line-range options.
pub fn parse_lstinputlisting(stream: &mut TokenStream, state: &mut ParserState) -> Option<Block> {
    let pos = stream.peek().map(|t| t.pos).unwrap_or(crate::tokenizer::Position::start());
    satisfy(stream, state, |_| true);
    let opts = bracketed(stream, state);
    let file_toks = braced(stream, state)?;
    let filename: String = file_toks.iter().map(|t| t.raw.as_str()).collect();

    let mut attr = Attr::empty();
    let mut first_line: Option<usize> = None;
    let mut last_line: Option<usize> = None;
    if let Some(opts) = opts {
        let mut sub = TokenStream::new(opts);
        for (k, v) in crate::parser::inlines::parse_keyvals_public(&mut sub, state) {
            match k.as_str() {
                "language" => attr.classes.push(v.to_lowercase()),
                "firstline" => first_line = v.trim().parse().ok(),
                "lastline" => last_line = v.trim().parse().ok(),
                _ => attr.kvs.push((k, v)),
            }
        }
    }

    let Ok(contents) = std::fs::read_to_string(&filename) else {
        state.log(LogMessage::CouldNotLoadIncludeFile {
            path: filename,
            pos,
        });
        return None;
    };
    let lines: Vec<&str> = contents.lines().collect();
    let start = first_line.unwrap_or(1).saturating_sub(1);
    let end = last_line.unwrap_or(lines.len()).min(lines.len());
    let selected = if start < end {
        lines[start..end].join("\n")
    } else {
        String::new()
    };
    Some(Block::CodeBlock(attr, selected))
}

/// `\graphicspath{{dir1}{dir2}...}` appends directories to the resource
/// path.
pub fn parse_graphicspath(stream: &mut TokenStream, state: &mut ParserState) {
    satisfy(stream, state, |_| true);
    if let Some(outer) = braced(stream, state) {
        let mut sub = TokenStream::new(outer);
        while let Some(inner) = braced(&mut sub, state) {
            let dir: String = inner.iter().map(|t| t.raw.as_str()).collect();
            state.options.resource_path.push(PathBuf::from(dir));
        }
    }
}
