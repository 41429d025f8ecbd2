//! Post-processing rewriters (spec.md §4.8): plain-text extraction for
//! heading anchors, figure/image caption handling, tikz escape hatch, and
//! final header-level normalization.

use crate::ast::{Attr, Block, Inline};

/// Flatten a run of inlines to plain text, dropping all formatting. Used
/// for heading-anchor slugs and other places that need a bare string from
/// rich inline content.
pub fn inlines_to_plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        push_inline_text(inline, &mut out);
    }
    out
}

fn push_inline_text(inline: &Inline, out: &mut String) {
    match inline {
        Inline::Str(s) => out.push_str(s),
        Inline::Emph(inner)
        | Inline::Strong(inner)
        | Inline::Smallcaps(inner)
        | Inline::Strikeout(inner)
        | Inline::Superscript(inner)
        | Inline::Subscript(inner)
        | Inline::Span(_, inner)
        | Inline::Link(_, inner, _)
        | Inline::Image(_, inner, _) => {
            out.push_str(&inlines_to_plain_text(inner));
        }
        Inline::Code(_, text) => out.push_str(text),
        Inline::Space | Inline::SoftBreak => out.push(' '),
        Inline::LineBreak => out.push('\n'),
        Inline::Math(_, text) => out.push_str(text),
        Inline::Note(_) => {}
        Inline::Cite(_, fallback) => out.push_str(&inlines_to_plain_text(fallback)),
        Inline::RawInline(_, _) => {}
    }
}

/// `\caption{...}` immediately inside a `figure` environment should bind to
/// the single image it contains rather than float as a loose paragraph:
/// walk the environment's blocks, and if a `Plain`/`Para` holding exactly
/// one `Image` inline is present alongside a caption-only `Plain`, merge
/// the caption into the image's alt text, prepend `fig:` to its title, and
/// drop the standalone caption block. A pending `\label{...}` becomes the
/// image's id and an empty, `data-label`-carrying `Span` trailing the alt
/// text, so `\ref`/`\cref` elsewhere in the document resolve to it.
pub fn rewrite_figure(mut blocks: Vec<Block>, caption: Vec<Inline>, label: Option<String>) -> Vec<Block> {
    if caption.is_empty() && label.is_none() {
        return blocks;
    }
    for block in blocks.iter_mut() {
        if let Block::Plain(inlines) | Block::Para(inlines) = block {
            if let [Inline::Image(attr, _alt, target)] = inlines.as_slice() {
                let mut attr = attr.clone();
                let (src, title) = target.clone();
                let title = if title.starts_with("fig:") {
                    title
                } else {
                    format!("fig:{}", title)
                };
                let mut alt = caption.clone();
                if let Some(id) = &label {
                    attr.id = id.clone();
                    alt.push(Inline::Span(
                        Attr {
                            id: id.clone(),
                            classes: Vec::new(),
                            kvs: vec![("data-label".to_string(), id.clone())],
                        },
                        Vec::new(),
                    ));
                }
                *inlines = vec![Inline::Image(attr, alt, (src, title))];
                return blocks;
            }
        }
    }
    if !caption.is_empty() {
        blocks.push(Block::Para(caption));
    }
    blocks
}

/// `tikzpicture`/`tikzcd` environments have no portable rendering; wrap the
/// raw source as a `RawBlock` inside a `Div` so a caption (if any) survives
/// alongside it rather than being silently dropped.
pub fn rewrite_tikz(raw_source: String, caption: Vec<Inline>) -> Block {
    let mut inner = vec![Block::RawBlock("latex".to_string(), raw_source)];
    if !caption.is_empty() {
        inner.push(Block::Para(caption));
    }
    Block::Div(Attr::empty().with_class("tikz"), inner)
}

fn min_header_level(blocks: &[Block]) -> Option<i32> {
    let mut min = None;
    for block in blocks {
        match block {
            Block::Header(level, _, _) => {
                min = Some(min.map_or(*level, |m: i32| m.min(*level)));
            }
            Block::Div(_, inner) | Block::BlockQuote(inner) => {
                if let Some(m) = min_header_level(inner) {
                    min = Some(min.map_or(m, |cur: i32| cur.min(m)));
                }
            }
            _ => {}
        }
    }
    min
}

fn shift_headers(blocks: &mut [Block], shift: i32) {
    for block in blocks.iter_mut() {
        match block {
            Block::Header(level, _, _) => *level += shift,
            Block::Div(_, inner) | Block::BlockQuote(inner) => shift_headers(inner, shift),
            _ => {}
        }
    }
}

/// Normalize header levels so the shallowest heading in the document sits
/// at level 1, per spec.md §4.8 (`\chapter`/`\part` can otherwise leave the
/// tree rooted below level 1).
pub fn normalize_header_levels(mut blocks: Vec<Block>) -> Vec<Block> {
    if let Some(min) = min_header_level(&blocks) {
        if min < 1 {
            let shift = 1 - min;
            shift_headers(&mut blocks, shift);
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MathType;

    #[test]
    fn plain_text_flattens_formatting() {
        let inlines = vec![
            Inline::Str("hello ".to_string()),
            Inline::Emph(vec![Inline::Str("world".to_string())]),
        ];
        assert_eq!(inlines_to_plain_text(&inlines), "hello world");
    }

    #[test]
    fn plain_text_drops_notes_and_raw() {
        let inlines = vec![
            Inline::Str("a".to_string()),
            Inline::Note(vec![Block::Para(vec![Inline::Str("ignored".to_string())])]),
            Inline::RawInline("latex".to_string(), "\\foo".to_string()),
            Inline::Math(MathType::InlineMath, "x".to_string()),
        ];
        assert_eq!(inlines_to_plain_text(&inlines), "ax");
    }

    #[test]
    fn normalize_shifts_chapter_level_up() {
        let blocks = vec![
            Block::Header(0, Attr::empty(), vec![Inline::Str("Intro".to_string())]),
            Block::Header(1, Attr::empty(), vec![Inline::Str("Sub".to_string())]),
        ];
        let normalized = normalize_header_levels(blocks);
        match &normalized[0] {
            Block::Header(level, _, _) => assert_eq!(*level, 1),
            _ => panic!("expected header"),
        }
        match &normalized[1] {
            Block::Header(level, _, _) => assert_eq!(*level, 2),
            _ => panic!("expected header"),
        }
    }

    #[test]
    fn rewrite_figure_prepends_fig_marker() {
        let blocks = vec![Block::Plain(vec![Inline::Image(
            Attr::empty(),
            Vec::new(),
            ("foo.png".to_string(), String::new()),
        )])];
        let caption = vec![Inline::Str("Foo".to_string())];
        let rewritten = rewrite_figure(blocks, caption.clone(), None);
        match &rewritten[0] {
            Block::Plain(inlines) => match &inlines[0] {
                Inline::Image(_, alt, (src, title)) => {
                    assert_eq!(alt, &caption);
                    assert_eq!(src, "foo.png");
                    assert_eq!(title, "fig:");
                }
                other => panic!("expected Image, got {:?}", other),
            },
            other => panic!("expected Plain, got {:?}", other),
        }
    }

    #[test]
    fn rewrite_figure_does_not_double_prefix() {
        let blocks = vec![Block::Plain(vec![Inline::Image(
            Attr::empty(),
            Vec::new(),
            ("foo.png".to_string(), "fig:".to_string()),
        )])];
        let rewritten = rewrite_figure(blocks, vec![Inline::Str("Foo".to_string())], None);
        match &rewritten[0] {
            Block::Plain(inlines) => match &inlines[0] {
                Inline::Image(_, _, (_, title)) => assert_eq!(title, "fig:"),
                other => panic!("expected Image, got {:?}", other),
            },
            other => panic!("expected Plain, got {:?}", other),
        }
    }

    #[test]
    fn rewrite_figure_attaches_label_id_and_span() {
        let blocks = vec![Block::Plain(vec![Inline::Image(
            Attr::empty(),
            Vec::new(),
            ("foo.png".to_string(), String::new()),
        )])];
        let caption = vec![Inline::Str("Foo".to_string())];
        let rewritten = rewrite_figure(blocks, caption, Some("fig:foo".to_string()));
        match &rewritten[0] {
            Block::Plain(inlines) => match &inlines[0] {
                Inline::Image(attr, alt, (_src, title)) => {
                    assert_eq!(attr.id, "fig:foo");
                    assert_eq!(title, "fig:");
                    match alt.last() {
                        Some(Inline::Span(span_attr, inner)) => {
                            assert_eq!(span_attr.id, "fig:foo");
                            assert_eq!(
                                span_attr.kvs,
                                vec![("data-label".to_string(), "fig:foo".to_string())]
                            );
                            assert!(inner.is_empty());
                        }
                        other => panic!("expected trailing Span, got {:?}", other),
                    }
                }
                other => panic!("expected Image, got {:?}", other),
            },
            other => panic!("expected Plain, got {:?}", other),
        }
    }

    #[test]
    fn normalize_noop_when_already_level_one() {
        let blocks = vec![Block::Header(1, Attr::empty(), vec![])];
        let normalized = normalize_header_levels(blocks);
        match &normalized[0] {
            Block::Header(level, _, _) => assert_eq!(*level, 1),
            _ => panic!("expected header"),
        }
    }
}
