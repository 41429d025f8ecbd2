//! Citation command family (spec.md §4.4): `\cite`, `\citep`, `\citet`,
//! `\textcite`, `\parencite`, `\footcite`, `\citeyear`, `\autocite`,
//! capitalized variants, `-s` plural variants, plus `\citetext`.

use crate::ast::{Citation, CitationMode, Inline};
use crate::parser::primitives::{bracketed, TokenStream};
use crate::parser::state::ParserState;
use crate::tokenizer::TokenKind;

/// Resolve a command name (already stripped of the leading backslash) to its
/// citation mode and note-flag, or `None` if it isn't a citation command.
pub fn citation_mode_for(name: &str) -> Option<(CitationMode, bool)> {
    // Normalize: strip a capitalized first letter and a trailing plural `s`.
    let lower = {
        let mut c = name.chars();
        match c.next() {
            Some(first) => first.to_lowercase().collect::<String>() + c.as_str(),
            None => return None,
        }
    };
    let base = lower.strip_suffix('s').unwrap_or(&lower);

    let (mode, note) = match base {
        "cite" => (CitationMode::Normal, false),
        "citep" | "parencite" | "autocite" => (CitationMode::Normal, false),
        "citet" | "textcite" => (CitationMode::AuthorInText, false),
        "citeyear" | "citeyearpar" => (CitationMode::SuppressAuthor, false),
        "footcite" => (CitationMode::Normal, true),
        "citeauthor" => (CitationMode::AuthorInText, false),
        _ => return None,
    };
    Some((mode, note))
}

pub fn is_citation_command(name: &str) -> bool {
    citation_mode_for(name).is_some()
}

fn parse_inline_group(
    state: &mut ParserState,
    tokens: Vec<crate::tokenizer::Token>,
) -> Vec<Inline> {
    let mut sub = TokenStream::new(tokens);
    crate::parser::inlines::many_until_empty(&mut sub, state)
}

/// Parse `[prefix][suffix]{key1,key2,...}` into citation records; `prefix`
/// is attached to the first key, `suffix` to the last.
fn parse_one_cite_group(
    stream: &mut TokenStream,
    state: &mut ParserState,
    mode: CitationMode,
    note: bool,
) -> Vec<Citation> {
    let first_bracket = bracketed(stream, state);
    let second_bracket = bracketed(stream, state);
    let (prefix_toks, suffix_toks) = match (first_bracket, second_bracket) {
        (Some(p), Some(s)) => (Some(p), Some(s)),
        (Some(s), None) => (None, Some(s)),
        (None, None) => (None, None),
        (None, Some(_)) => unreachable!(),
    };

    let keys_toks = crate::parser::primitives::braced(stream, state).unwrap_or_default();
    let keys_raw: String = keys_toks.iter().map(|t| t.raw.as_str()).collect();
    let keys: Vec<String> = keys_raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let prefix = prefix_toks
        .map(|t| parse_inline_group(state, t))
        .unwrap_or_default();
    let suffix = suffix_toks
        .map(|t| parse_inline_group(state, t))
        .unwrap_or_default();

    let n = keys.len().max(1);
    keys.into_iter()
        .enumerate()
        .map(|(i, id)| Citation {
            id,
            prefix: if i == 0 { prefix.clone() } else { Vec::new() },
            suffix: if i == n - 1 { suffix.clone() } else { Vec::new() },
            mode,
            note_num: if note { 1 } else { 0 },
            hash: 0,
        })
        .collect()
}

/// Parse a full citation command invocation (the control-sequence token has
/// already been consumed by the caller). Returns the `Cite` inline carrying
/// the parsed citations plus a `RawInline` mirror for round-trip fidelity.
pub fn parse_citation(
    stream: &mut TokenStream,
    state: &mut ParserState,
    name: &str,
    raw_command: &str,
) -> Inline {
    let (mode, note) = citation_mode_for(name).unwrap_or((CitationMode::Normal, false));
    let mut citations = Vec::new();
    loop {
        let before = stream.len();
        citations.extend(parse_one_cite_group(stream, state, mode, note));
        if stream.len() == before {
            break;
        }
        // Only continue if another bracket/brace immediately follows.
        let continues = matches!(stream.peek(), Some(t) if t.is_symbol('[') || t.is_symbol('{'));
        if !continues {
            break;
        }
    }
    Inline::Cite(
        citations,
        vec![Inline::RawInline("latex".to_string(), raw_command.to_string())],
    )
}

/// `\citetext{a; b; c}`: a semicolon-separated group of inline sequences,
/// each becoming one citation with an empty id and its inlines stored as
/// the prefix (there is no bib key to resolve for free-form citation text).
pub fn parse_citetext(stream: &mut TokenStream, state: &mut ParserState) -> Inline {
    let inner = crate::parser::primitives::braced(stream, state).unwrap_or_default();
    let mut segments: Vec<Vec<crate::tokenizer::Token>> = vec![Vec::new()];
    for t in inner {
        if matches!(t.kind, TokenKind::Symbol(';')) {
            segments.push(Vec::new());
        } else {
            segments.last_mut().unwrap().push(t);
        }
    }
    let citations = segments
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|seg| {
            let inlines = parse_inline_group(state, seg);
            Citation {
                id: String::new(),
                prefix: inlines,
                suffix: Vec::new(),
                mode: CitationMode::Normal,
                note_num: 0,
                hash: 0,
            }
        })
        .collect();
    Inline::Cite(citations, vec![Inline::RawInline("latex".to_string(), "\\citetext".to_string())])
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
    fn simple_two_key_cite() {
        let mut st = new_state();
        let toks = tokenize("{Foo2000,Bar1999}");
        let mut stream = TokenStream::new(toks);
        let inline = parse_citation(&mut stream, &mut st, "cite", "\\cite{Foo2000,Bar1999}");
        match inline {
            Inline::Cite(cites, _) => {
                assert_eq!(cites.len(), 2);
                assert_eq!(cites[0].id, "Foo2000");
                assert_eq!(cites[1].id, "Bar1999");
                assert!(cites.iter().all(|c| c.mode == CitationMode::Normal));
            }
            _ => panic!("expected Cite"),
        }
    }

    #[test]
    fn cite_with_prefix_and_suffix() {
        let mut st = new_state();
        let toks = tokenize("[see][p.~5]{Foo2000}");
        let mut stream = TokenStream::new(toks);
        let inline = parse_citation(&mut stream, &mut st, "cite", "\\cite[see][p.~5]{Foo2000}");
        match inline {
            Inline::Cite(cites, _) => {
                assert_eq!(cites.len(), 1);
                assert!(!cites[0].prefix.is_empty());
                assert!(!cites[0].suffix.is_empty());
            }
            _ => panic!("expected Cite"),
        }
    }
}
