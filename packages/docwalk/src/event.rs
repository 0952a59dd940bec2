//! Node events, the unit of traversal output.
//!
//! One [`NodeEvent`] is emitted per visited node of a document: the file
//! itself, each archive entry, mail message, attachment, element or block
//! of text. Observers receive the event by `&mut` for the duration of one
//! dispatch and may flag it skipped or cancel the traversal.

use std::fmt;

/// Semantic kind of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    /// A whole top-level document.
    Document,
    /// A leaf block of extracted text.
    Content,
    /// The header of one mail message; container for its body.
    MailHeader,
    /// A mail attachment; container for the attached document.
    Attachment,
    /// One file inside an archive; container for that file.
    ArchiveEntry,
    /// A structural element of a markup document.
    Element,
    /// Decoder-defined node kind.
    Custom(String),
}

impl Tag {
    /// Stable lowercase name, used by writers for class names.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Tag::Document => "document",
            Tag::Content => "content",
            Tag::MailHeader => "mail-header",
            Tag::Attachment => "attachment",
            Tag::ArchiveEntry => "archive-entry",
            Tag::Element => "element",
            Tag::Custom(name) => name.as_str(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Str(String),
    UInt(u64),
    Int(i64),
    Float(f64),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Str(s) => f.write_str(s),
            AttributeValue::UInt(v) => write!(f, "{v}"),
            AttributeValue::Int(v) => write!(f, "{v}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        AttributeValue::UInt(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

/// One visited node of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEvent {
    tag: Tag,
    attributes: Vec<(String, AttributeValue)>,
    text: String,
    depth: usize,
    sequence: usize,
    skip: bool,
    cancel: bool,
}

impl NodeEvent {
    /// Create an event with no attributes and no text.
    #[must_use]
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
            text: String::new(),
            depth: 0,
            sequence: 0,
            skip: false,
            cancel: false,
        }
    }

    /// Set the node's own text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Add an attribute. A second value for the same name replaces the first.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
        self
    }

    pub(crate) fn place(&mut self, depth: usize, sequence: usize) {
        self.depth = depth;
        self.sequence = sequence;
    }

    #[must_use]
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// The node's own text; empty for container and header nodes.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Nesting level, 0 for the document root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Emission index within one parse.
    #[must_use]
    pub fn sequence(&self) -> usize {
        self.sequence
    }

    /// Look up an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// All attributes in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// String attribute, or `""` when absent or not a string.
    #[must_use]
    pub fn string_attribute(&self, name: &str) -> &str {
        match self.attribute(name) {
            Some(AttributeValue::Str(s)) => s,
            _ => "",
        }
    }

    /// Unsigned attribute, or `0` when absent or not representable.
    #[must_use]
    pub fn uint_attribute(&self, name: &str) -> u64 {
        match self.attribute(name) {
            Some(AttributeValue::UInt(v)) => *v,
            Some(AttributeValue::Int(v)) => u64::try_from(*v).unwrap_or(0),
            _ => 0,
        }
    }

    /// Signed attribute, or `0` when absent or not representable.
    #[must_use]
    pub fn int_attribute(&self, name: &str) -> i64 {
        match self.attribute(name) {
            Some(AttributeValue::Int(v)) => *v,
            Some(AttributeValue::UInt(v)) => i64::try_from(*v).unwrap_or(0),
            _ => 0,
        }
    }

    /// Float attribute, or `0.0` when absent or not a number.
    #[must_use]
    pub fn float_attribute(&self, name: &str) -> f64 {
        match self.attribute(name) {
            Some(AttributeValue::Float(v)) => *v,
            _ => 0.0,
        }
    }

    /// Withhold this node (and its subtree) from later observers and writers.
    pub fn set_skip(&mut self) {
        self.skip = true;
    }

    /// Stop the whole traversal after the current observer returns.
    pub fn set_cancel(&mut self) {
        self.cancel = true;
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.skip
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel
    }
}
