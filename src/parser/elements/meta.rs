//! Document metadata (spec.md §4.7): title/date/author block and the
//! conference-style author/affiliation commands (`\and`, `\inst`,
//! `\institute`, `\icmlauthor`, `\icmlaffiliation`).

use crate::ast::MetaValue;
use crate::parser::primitives::{braced, bracketed, satisfy, skip_ignorable, TokenStream};
use crate::parser::state::ParserState;

fn braced_inlines(stream: &mut TokenStream, state: &mut ParserState) -> Vec<crate::ast::Inline> {
    let toks = braced(stream, state).unwrap_or_default();
    let mut sub = TokenStream::new(toks);
    crate::parser::inlines::many_until_empty(&mut sub, state)
}

fn braced_blocks(stream: &mut TokenStream, state: &mut ParserState) -> Vec<crate::ast::Block> {
    let toks = braced(stream, state).unwrap_or_default();
    let mut sub = TokenStream::new(toks);
    crate::parser::blocks::many_blocks_until(&mut sub, state, |s| s.is_empty())
}

fn set_scalar_inlines(stream: &mut TokenStream, state: &mut ParserState, key: &str) {
    satisfy(stream, state, |_| true);
    let inlines = braced_inlines(stream, state);
    state.meta.insert(key.to_string(), MetaValue::Inlines(inlines));
}

pub fn parse_title(stream: &mut TokenStream, state: &mut ParserState) {
    set_scalar_inlines(stream, state, "title");
}

pub fn parse_subtitle(stream: &mut TokenStream, state: &mut ParserState) {
    set_scalar_inlines(stream, state, "subtitle");
}

pub fn parse_date(stream: &mut TokenStream, state: &mut ParserState) {
    set_scalar_inlines(stream, state, "date");
}

pub fn parse_dedication(stream: &mut TokenStream, state: &mut ParserState) {
    set_scalar_inlines(stream, state, "dedication");
}

pub fn parse_address(stream: &mut TokenStream, state: &mut ParserState) {
    set_scalar_inlines(stream, state, "address");
}

/// `abstract` environment body becomes `meta.abstract` as blocks rather than
/// flowing into the document body.
pub fn parse_abstract_env(stream: &mut TokenStream, state: &mut ParserState) {
    let blocks = crate::parser::blocks::many_blocks_until(stream, state, |s| {
        s.peek().map(|t| t.is_control_seq("end")).unwrap_or(true)
    });
    if matches!(stream.peek(), Some(t) if t.is_control_seq("end")) {
        satisfy(stream, state, |_| true);
        braced(stream, state);
    }
    state.meta.insert("abstract".to_string(), MetaValue::Blocks(blocks));
}

fn raw_braced_text(stream: &mut TokenStream, state: &mut ParserState) -> String {
    braced(stream, state)
        .unwrap_or_default()
        .iter()
        .map(|t| t.raw.as_str())
        .collect()
}

pub fn parse_bibliography(stream: &mut TokenStream, state: &mut ParserState) {
    satisfy(stream, state, |_| true);
    let raw = raw_braced_text(stream, state);
    for file in raw.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        state.meta.entry("bibliography".to_string()).or_insert_with(|| MetaValue::List(Vec::new()));
        if let Some(MetaValue::List(items)) = state.meta.get_mut("bibliography") {
            items.push(MetaValue::Str(file.to_string()));
        }
    }
}

pub fn parse_bibliographystyle(stream: &mut TokenStream, state: &mut ParserState) {
    satisfy(stream, state, |_| true);
    let raw = raw_braced_text(stream, state);
    state.meta.insert("biblio-style".to_string(), MetaValue::Str(raw));
}

/// `\author{Name \and Name2}`, each separated by `\and`, with a following
/// `\inst{n}` producing a superscript affiliation marker on that name.
pub fn parse_author(stream: &mut TokenStream, state: &mut ParserState) {
    satisfy(stream, state, |_| true);
    let Some(toks) = braced(stream, state) else {
        return;
    };
    let mut sub = TokenStream::new(toks);
    let mut authors = Vec::new();
    loop {
        skip_ignorable(&mut sub, state);
        let mut name = crate::parser::inlines::many_until(&mut sub, state, |s| {
            s.peek().map(|t| t.is_control_seq("and")).unwrap_or(true)
        });
        if matches!(sub.peek(), Some(t) if t.is_control_seq("inst")) {
            satisfy(&mut sub, state, |_| true);
            if let Some(inst_toks) = braced(&mut sub, state) {
                let marker: String = inst_toks.iter().map(|t| t.raw.as_str()).collect();
                name.push(crate::ast::Inline::Superscript(vec![crate::ast::Inline::Str(marker)]));
            }
        }
        authors.push(name);
        if matches!(sub.peek(), Some(t) if t.is_control_seq("and")) {
            satisfy(&mut sub, state, |_| true);
        } else {
            break;
        }
    }
    for name in authors {
        state.meta.entry("author".to_string()).or_insert_with(|| MetaValue::List(Vec::new()));
        if let Some(MetaValue::List(items)) = state.meta.get_mut("author") {
            items.push(MetaValue::Inlines(name));
        }
    }
}

/// `\institute{First \and Second \and Third}` numbers affiliations in
/// declaration order: the first-declared institute is marker 1.
pub fn parse_institute(stream: &mut TokenStream, state: &mut ParserState) {
    satisfy(stream, state, |_| true);
    let Some(toks) = braced(stream, state) else {
        return;
    };
    let mut sub = TokenStream::new(toks);
    let mut institutes = Vec::new();
    loop {
        skip_ignorable(&mut sub, state);
        let name = crate::parser::inlines::many_until(&mut sub, state, |s| {
            s.peek().map(|t| t.is_control_seq("and")).unwrap_or(true)
        });
        institutes.push(name);
        if matches!(sub.peek(), Some(t) if t.is_control_seq("and")) {
            satisfy(&mut sub, state, |_| true);
        } else {
            break;
        }
    }
    let numbered: Vec<MetaValue> = institutes
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let marker = i + 1;
            let mut inlines = vec![crate::ast::Inline::Superscript(vec![crate::ast::Inline::Str(
                marker.to_string(),
            )])];
            inlines.extend(name);
            MetaValue::Inlines(inlines)
        })
        .collect();
    state.meta.insert("institute".to_string(), MetaValue::List(numbered));
}

/// `\icmlauthor{Name}{affil-key}` — ICML-style author/affiliation-key pairs.
pub fn parse_icmlauthor(stream: &mut TokenStream, state: &mut ParserState) {
    satisfy(stream, state, |_| true);
    let mut name = braced_inlines(stream, state);
    let key = raw_braced_text(stream, state);
    if !key.is_empty() {
        name.push(crate::ast::Inline::Superscript(vec![crate::ast::Inline::Str(key)]));
    }
    state.meta.entry("author".to_string()).or_insert_with(|| MetaValue::List(Vec::new()));
    if let Some(MetaValue::List(items)) = state.meta.get_mut("author") {
        items.push(MetaValue::Inlines(name));
    }
}

/// `\icmlaffiliation{key}{Institution}`.
pub fn parse_icmlaffiliation(stream: &mut TokenStream, state: &mut ParserState) {
    satisfy(stream, state, |_| true);
    let key = raw_braced_text(stream, state);
    let mut institution = braced_inlines(stream, state);
    if !key.is_empty() {
        institution.insert(
            0,
            crate::ast::Inline::Superscript(vec![crate::ast::Inline::Str(key)]),
        );
    }
    state.meta.entry("institute".to_string()).or_insert_with(|| MetaValue::List(Vec::new()));
    if let Some(MetaValue::List(items)) = state.meta.get_mut("institute") {
        items.push(MetaValue::Inlines(institution));
    }
}

/// `\maketitle` itself carries no content; it's a layout trigger we discard
/// after optionally eating a following `[...]` (some classes accept one).
pub fn skip_maketitle(stream: &mut TokenStream, state: &mut ParserState) {
    satisfy(stream, state, |_| true);
    bracketed(stream, state);
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
    fn title_sets_meta() {
        let mut st = new_state();
        let mut stream = TokenStream::new(tokenize("\\title{Hello World}"));
        parse_title(&mut stream, &mut st);
        match st.meta.get("title") {
            Some(MetaValue::Inlines(inlines)) => {
                assert_eq!(crate::parser::rewriters::inlines_to_plain_text(inlines), "Hello World");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn author_splits_on_and() {
        let mut st = new_state();
        let mut stream = TokenStream::new(tokenize("\\author{Alice \\and Bob}"));
        parse_author(&mut stream, &mut st);
        match st.meta.get("author") {
            Some(MetaValue::List(items)) => assert_eq!(items.len(), 2),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn institute_numbers_in_declaration_order() {
        let mut st = new_state();
        let mut stream = TokenStream::new(tokenize("\\institute{First \\and Second}"));
        parse_institute(&mut stream, &mut st);
        match st.meta.get("institute") {
            Some(MetaValue::List(items)) => {
                assert_eq!(items.len(), 2);
                if let MetaValue::Inlines(first) = &items[0] {
                    assert!(matches!(&first[0], crate::ast::Inline::Superscript(s) if matches!(&s[0], crate::ast::Inline::Str(n) if n == "1")));
                } else {
                    panic!("expected inlines");
                }
                if let MetaValue::Inlines(second) = &items[1] {
                    assert!(matches!(&second[0], crate::ast::Inline::Superscript(s) if matches!(&s[0], crate::ast::Inline::Str(n) if n == "2")));
                } else {
                    panic!("expected inlines");
                }
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
