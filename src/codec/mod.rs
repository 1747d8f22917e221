//! Markup codecs for properties and host telegrams.
//!
//! Every telegram is a self-describing document whose root element carries
//! a `version` attribute:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <UpdateConfig version="1.1">
//!   <Channel channel_id="5">
//!     <Property name="AcquisitionRate"><Scalar unit="Hz">1000</Scalar></Property>
//!   </Channel>
//! </UpdateConfig>
//! ```
//!
//! Decoders ignore unknown child elements and treat missing optional
//! attributes as defaults, so older and newer peers interoperate.
//! Encoders always emit children in a fixed order.

pub mod channels;
pub mod export;
mod property;
pub mod timebase;

pub use channels::{
    ChannelConfig, ChannelConfigChangedTelegram, ChannelDataformat, ChannelDataformatTelegram,
    InputChannelConfig, InputChannelsChangedTelegram, PluginChannelInfo, PluginTaskInfo,
    SampleFormat, SampleOccurrence, UpdateChannelPropertiesTelegram, UpdateChannelsTelegram,
    UpdateConfigTelegram,
};
pub use export::{
    ChannelError, ExportProperties, RegisterExport, StartExport, StartExportAction,
    ValidateExport, ValidateExportResponse,
};
pub use timebase::{Timebase, TimebaseType};

use crate::error::Result;
use crate::markup::{expect_root, MarkupNode, Version};

/// A versioned markup document exchanged with the host.
pub trait Telegram: Sized {
    /// Name of the root element
    const ROOT: &'static str;

    /// Read the telegram from its root element
    fn decode(root: &MarkupNode, version: Version) -> Result<Self>;

    /// Write the telegram's attributes and children onto `root`
    fn encode(&self, root: &mut MarkupNode) -> Result<()>;

    fn from_markup(text: &str) -> Result<Self> {
        Self::from_markup_with_default(text, Version::CURRENT)
    }

    /// Parse a document, assuming `default` when the root carries no
    /// `version` attribute
    fn from_markup_with_default(text: &str, default: Version) -> Result<Self> {
        let root = MarkupNode::parse(text)?;
        expect_root(&root, Self::ROOT)?;
        let version = Version::of_node(&root, default);
        Self::decode(&root, version)
    }

    fn to_markup(&self, version: Version) -> Result<MarkupNode> {
        let mut root = MarkupNode::new(Self::ROOT).with_attr("version", version);
        self.encode(&mut root)?;
        Ok(root)
    }

    fn generate_with_version(&self, version: Version) -> Result<String> {
        self.to_markup(version)?.to_document()
    }

    fn generate(&self) -> Result<String> {
        self.generate_with_version(Version::CURRENT)
    }

    /// Replace `self` with the parsed telegram. On failure `self` is left
    /// untouched and `false` is returned.
    fn parse(&mut self, text: &str) -> bool {
        match Self::from_markup(text) {
            Ok(parsed) => {
                *self = parsed;
                true
            }
            Err(e) => {
                tracing::debug!("Failed to parse <{}> telegram: {}", Self::ROOT, e);
                false
            }
        }
    }
}
