//! Generic markup tree used by all telegram codecs.
//!
//! Codecs never touch the XML reader/writer directly; they build and walk
//! [`MarkupNode`] trees. The tree is converted to and from text in
//! [`xml`] using quick-xml.
//!
//! # Text handling
//!
//! - Attribute values and text are escaped on write and unescaped on read.
//! - Whitespace-only text between child elements is dropped on parse.
//! - Text content of leaf elements is kept verbatim (multi-line strings
//!   survive a round trip).

pub mod format;
pub mod version;
mod xml;

pub use version::Version;

use crate::error::{PluginError, Result};
use std::str::FromStr;

/// A single element with ordered attributes, children and text content
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkupNode {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<MarkupNode>,
    text: String,
}

impl MarkupNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse a document and return its root element
    pub fn parse(input: &str) -> Result<Self> {
        xml::parse_document(input)
    }

    /// Serialize as a complete document with XML declaration
    pub fn to_document(&self) -> Result<String> {
        xml::write_document(self, true)
    }

    /// Serialize without declaration, for embedding in another document
    pub fn to_fragment(&self) -> Result<String> {
        xml::write_document(self, false)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ── Attributes ──

    pub fn with_attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        let key = key.into();
        let value = value.to_string();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((key, value)),
        }
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Parse an attribute; a missing attribute is `Ok(None)`
    pub fn attr_as<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.attr(key) {
            None => Ok(None),
            Some(raw) => format::parse_value(raw)
                .map(Some)
                .map_err(|e| e.with_context(format!("<{} {}>", self.name, key))),
        }
    }

    /// Parse a required attribute
    pub fn required_attr<T: FromStr>(&self, key: &str) -> Result<T> {
        self.attr_as(key)?.ok_or_else(|| {
            PluginError::Parse(format!("<{}> is missing attribute '{}'", self.name, key))
        })
    }

    // ── Text ──

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = text.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn text_as<T: FromStr>(&self) -> Result<T> {
        format::parse_value(&self.text).map_err(|e| e.with_context(format!("<{}>", self.name)))
    }

    // ── Children ──

    /// Append a child and return a handle to it for further building
    pub fn append_child(&mut self, child: MarkupNode) -> &mut MarkupNode {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Append an empty child element by name
    pub fn append(&mut self, name: impl Into<String>) -> &mut MarkupNode {
        self.append_child(MarkupNode::new(name))
    }

    pub fn children(&self) -> &[MarkupNode] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&MarkupNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MarkupNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Parse the text of an optional child element
    pub fn child_text_as<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        self.child(name).map(|c| c.text_as()).transpose()
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<MarkupNode> {
        &mut self.children
    }

    pub(crate) fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }
}

/// Check the root element name of a parsed telegram
pub fn expect_root<'a>(node: &'a MarkupNode, name: &str) -> Result<&'a MarkupNode> {
    if node.name() == name {
        Ok(node)
    } else {
        Err(PluginError::Parse(format!(
            "expected <{}> root element, found <{}>",
            name,
            node.name()
        )))
    }
}
