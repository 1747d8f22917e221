//! Channel timebase descriptor.
//!
//! ```text
//! <Timebase type="simple" frequency="1000"/>
//! <Timebase type="none"/>
//! ```

use super::Telegram;
use crate::error::{PluginError, Result};
use crate::markup::format::format_f64;
use crate::markup::{MarkupNode, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimebaseType {
    #[default]
    None,
    /// Fixed sample frequency
    Simple,
}

impl TimebaseType {
    pub fn as_str(self) -> &'static str {
        match self {
            TimebaseType::None => "none",
            TimebaseType::Simple => "simple",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(TimebaseType::None),
            "simple" => Some(TimebaseType::Simple),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timebase {
    pub kind: TimebaseType,
    /// Samples per second, only meaningful for [`TimebaseType::Simple`]
    pub frequency: f64,
}

impl Timebase {
    pub fn simple(frequency: f64) -> Self {
        Self {
            kind: TimebaseType::Simple,
            frequency,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Read the `<Timebase>` element itself
    pub fn parse_node(&mut self, node: &MarkupNode) -> bool {
        match Self::read(node) {
            Ok(timebase) => {
                *self = timebase;
                true
            }
            Err(e) => {
                tracing::debug!("Ignoring malformed timebase: {}", e);
                false
            }
        }
    }

    /// Read the `<Timebase>` child of `parent`; a missing child resets to none
    pub fn extract(&mut self, parent: &MarkupNode) -> bool {
        match parent.child("Timebase") {
            Some(node) => self.parse_node(node),
            None => {
                self.reset();
                true
            }
        }
    }

    /// Append a `<Timebase>` child to `parent`
    pub fn store(&self, parent: &mut MarkupNode) {
        let node = parent.append("Timebase");
        self.write(node);
    }

    pub(crate) fn read(node: &MarkupNode) -> Result<Self> {
        let kind = match node.attr("type") {
            None => TimebaseType::None,
            Some(name) => TimebaseType::from_name(name)
                .ok_or_else(|| PluginError::Parse(format!("unknown timebase type '{}'", name)))?,
        };
        let frequency = match kind {
            TimebaseType::None => node.attr_as("frequency")?.unwrap_or_default(),
            TimebaseType::Simple => node.required_attr("frequency")?,
        };
        Ok(Self { kind, frequency })
    }

    fn write(&self, node: &mut MarkupNode) {
        node.set_attr("type", self.kind.as_str());
        if self.kind == TimebaseType::Simple {
            node.set_attr("frequency", format_f64(self.frequency));
        }
    }
}

impl Telegram for Timebase {
    const ROOT: &'static str = "Timebase";

    fn decode(root: &MarkupNode, _version: Version) -> Result<Self> {
        Self::read(root)
    }

    fn encode(&self, root: &mut MarkupNode) -> Result<()> {
        self.write(root);
        Ok(())
    }
}
