//! Syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! Nodes keep the order they were written in and carry the span of their
//! first token. The tree is consumed by the [normalizer](crate::normalize).

use crate::Span;
use crate::time::{LocalDate, LocalDateTime, LocalTime, OffsetDateTime};
use std::fmt;

/// One dot-separated component of a key.
#[derive(Clone, Debug)]
pub struct KeySegment {
    pub name: String,
    /// Whether the segment was written as a quoted string.
    pub quoted: bool,
    pub span: Span,
}

impl PartialEq for KeySegment {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for KeySegment {}

/// A possibly dotted key such as `a."b.c".d`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Key {
    pub segments: Vec<KeySegment>,
}

impl Key {
    pub fn span(&self) -> Span {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => first.span.join(last.span),
            _ => Span::default(),
        }
    }

    /// Segment names, unescaped.
    pub fn names(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.segments.iter().map(|s| s.name.as_str())
    }
}

impl fmt::Display for Key {
    /// Writes the key back in TOML form, quoting segments that need it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            if !segment.name.is_empty() && segment.name.bytes().all(crate::lexer::is_keylike_byte) {
                f.write_str(&segment.name)?;
            } else {
                write!(f, "{:?}", segment.name)?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float {
        value: f64,
        /// Literal digits with underscores removed; `inf`/`nan` for specials.
        text: String,
    },
    Boolean(bool),
    OffsetDateTime(OffsetDateTime),
    LocalDateTime(LocalDateTime),
    LocalDate(LocalDate),
    LocalTime(LocalTime),
    Array(Vec<Value>),
    InlineTable(Vec<KeyValuePair>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyValuePair {
    pub key: Key,
    pub value: Value,
    pub span: Span,
}

/// A `[header]` and the key/value pairs that follow it.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub key: Key,
    pub elements: Vec<KeyValuePair>,
    pub span: Span,
}

/// A `[[header]]` and the key/value pairs that follow it.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayTable {
    pub key: Key,
    pub elements: Vec<KeyValuePair>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    KeyValue(KeyValuePair),
    Table(Table),
    ArrayTable(ArrayTable),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::KeyValue(kv) => kv.span,
            Node::Table(t) => t.span,
            Node::ArrayTable(t) => t.span,
        }
    }
}

/// The document: top-level pairs followed by headers, in source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RootTable {
    pub nodes: Vec<Node>,
}
