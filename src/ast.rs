//! The universal document model.
//!
//! This is the boundary the rest of the crate builds against: it stays free
//! of tokenizer/parser internals so a host embedding this reader alongside
//! other format readers could lift this module out unchanged and share it
//! across front ends.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A complete parsed document: metadata plus the top-level block sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Pandoc {
    pub meta: Meta,
    pub blocks: Vec<Block>,
}

/// Document-level metadata. Scalar keys are overwritten by later writes;
/// list-typed keys (author, bibliography, nocite) append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Meta(pub BTreeMap<String, MetaValue>);

impl Meta {
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.get(key)
    }

    /// Overwrite a scalar metadata key.
    pub fn set_scalar(&mut self, key: &str, value: MetaValue) {
        self.0.insert(key.to_string(), value);
    }

    /// Append to a list-typed metadata key, creating it if absent.
    pub fn append_list(&mut self, key: &str, value: MetaValue) {
        match self.0.get_mut(key) {
            Some(MetaValue::List(items)) => items.push(value),
            _ => {
                self.0.insert(key.to_string(), MetaValue::List(vec![value]));
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetaValue {
    Inlines(Vec<Inline>),
    Blocks(Vec<Block>),
    Str(String),
    List(Vec<MetaValue>),
}

/// Common attribute triple used throughout the tree: identifier, classes,
/// and arbitrary key-value pairs (`id=...`, `data-label=...`, etc).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Attr {
    pub id: String,
    pub classes: Vec<String>,
    pub kvs: Vec<(String, String)>,
}

impl Attr {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_kv(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.kvs.push((key.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathType {
    InlineMath,
    DisplayMath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CitationMode {
    Normal,
    AuthorInText,
    SuppressAuthor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub prefix: Vec<Inline>,
    pub suffix: Vec<Inline>,
    pub mode: CitationMode,
    pub note_num: usize,
    pub hash: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListNumberStyle {
    DefaultStyle,
    Decimal,
    LowerRoman,
    UpperRoman,
    LowerAlpha,
    UpperAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListNumberDelim {
    DefaultDelim,
    Period,
    OneParen,
    TwoParens,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAttributes {
    pub start: i32,
    pub style: ListNumberStyle,
    pub delim: ListNumberDelim,
}

impl Default for ListAttributes {
    fn default() -> Self {
        Self {
            start: 1,
            style: ListNumberStyle::DefaultStyle,
            delim: ListNumberDelim::DefaultDelim,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Right,
    Center,
    Default,
}

/// Inline (phrasing) content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inline {
    Str(String),
    Emph(Vec<Inline>),
    Strong(Vec<Inline>),
    Smallcaps(Vec<Inline>),
    Strikeout(Vec<Inline>),
    Superscript(Vec<Inline>),
    Subscript(Vec<Inline>),
    Code(Attr, String),
    Space,
    SoftBreak,
    LineBreak,
    Math(MathType, String),
    Link(Attr, Vec<Inline>, (String, String)),
    Image(Attr, Vec<Inline>, (String, String)),
    Note(Vec<Block>),
    Cite(Vec<Citation>, Vec<Inline>),
    RawInline(String, String),
    Span(Attr, Vec<Inline>),
}

/// Block-level content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Plain(Vec<Inline>),
    Para(Vec<Inline>),
    CodeBlock(Attr, String),
    RawBlock(String, String),
    BlockQuote(Vec<Block>),
    OrderedList(ListAttributes, Vec<Vec<Block>>),
    BulletList(Vec<Vec<Block>>),
    DefinitionList(Vec<(Vec<Inline>, Vec<Vec<Block>>)>),
    Header(i32, Attr, Vec<Inline>),
    HorizontalRule,
    Table(TableBlock),
    Div(Attr, Vec<Block>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBlock {
    pub caption: Vec<Inline>,
    pub aligns: Vec<Alignment>,
    pub widths: Vec<f64>,
    pub header: Vec<Vec<Block>>,
    pub rows: Vec<Vec<Vec<Block>>>,
}
