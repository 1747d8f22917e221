//! Channel topology and configuration telegrams.
//!
//! Plugin to host:
//! - [`UpdateChannelsTelegram`]: the full channel/task topology
//! - [`UpdateChannelPropertiesTelegram`]: changed property values of one channel
//!
//! Host to plugin:
//! - [`UpdateConfigTelegram`]: property edits on plugin channels
//! - [`ChannelDataformatTelegram`]: sample format change of one channel
//! - [`ChannelConfigChangedTelegram`]: reconfigured input channels

use super::property::{read_range, write_range};
use super::{Telegram, Timebase};
use crate::error::{PluginError, Result};
use crate::markup::{MarkupNode, Version};
use crate::property::{parse_bool, PropertyList};
use crate::types::Range;
use std::collections::BTreeSet;

/// When samples of a channel are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleOccurrence {
    /// One sample per timebase tick
    #[default]
    Sync,
    /// Samples with explicit timestamps
    Async,
    Never,
}

impl SampleOccurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            SampleOccurrence::Sync => "sync",
            SampleOccurrence::Async => "async",
            SampleOccurrence::Never => "never",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sync" => Some(SampleOccurrence::Sync),
            "async" => Some(SampleOccurrence::Async),
            "never" => Some(SampleOccurrence::Never),
            _ => None,
        }
    }
}

/// Binary layout of one sample value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFormat {
    #[default]
    Double,
    Float,
    Sint16,
    Sint32,
    Sint64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    /// Pair of doubles
    Complex,
}

impl SampleFormat {
    const ALL: [SampleFormat; 10] = [
        SampleFormat::Double,
        SampleFormat::Float,
        SampleFormat::Sint16,
        SampleFormat::Sint32,
        SampleFormat::Sint64,
        SampleFormat::Uint8,
        SampleFormat::Uint16,
        SampleFormat::Uint32,
        SampleFormat::Uint64,
        SampleFormat::Complex,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SampleFormat::Double => "double",
            SampleFormat::Float => "float",
            SampleFormat::Sint16 => "sint16",
            SampleFormat::Sint32 => "sint32",
            SampleFormat::Sint64 => "sint64",
            SampleFormat::Uint8 => "uint8",
            SampleFormat::Uint16 => "uint16",
            SampleFormat::Uint32 => "uint32",
            SampleFormat::Uint64 => "uint64",
            SampleFormat::Complex => "complex",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.as_str() == name)
    }

    /// Size of one scalar sample in bytes
    pub fn size_bytes(self) -> usize {
        match self {
            SampleFormat::Uint8 => 1,
            SampleFormat::Sint16 | SampleFormat::Uint16 => 2,
            SampleFormat::Float | SampleFormat::Sint32 | SampleFormat::Uint32 => 4,
            SampleFormat::Double | SampleFormat::Sint64 | SampleFormat::Uint64 => 8,
            SampleFormat::Complex => 16,
        }
    }
}

/// Sample occurrence, format and dimension of a channel
///
/// `<DataFormat occurrence="sync" format="double" dimension="1"/>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDataformat {
    pub sample_occurrence: SampleOccurrence,
    pub sample_format: SampleFormat,
    pub sample_dimension: u32,
}

impl Default for ChannelDataformat {
    fn default() -> Self {
        Self {
            sample_occurrence: SampleOccurrence::Sync,
            sample_format: SampleFormat::Double,
            sample_dimension: 1,
        }
    }
}

impl ChannelDataformat {
    pub fn new(occurrence: SampleOccurrence, format: SampleFormat, dimension: u32) -> Self {
        Self {
            sample_occurrence: occurrence,
            sample_format: format,
            sample_dimension: dimension,
        }
    }

    /// Bytes of one complete sample (all dimensions)
    pub fn sample_size(&self) -> usize {
        self.sample_format.size_bytes() * self.sample_dimension as usize
    }

    /// Append a `<DataFormat>` child to `parent`
    pub fn store(&self, parent: &mut MarkupNode) {
        parent
            .append("DataFormat")
            .set_attr("occurrence", self.sample_occurrence.as_str())
            .set_attr("format", self.sample_format.as_str())
            .set_attr("dimension", self.sample_dimension);
    }

    /// Read the `<DataFormat>` child of `parent`, defaults when absent
    pub fn extract(parent: &MarkupNode) -> Result<Self> {
        match parent.child("DataFormat") {
            Some(node) => Self::read(node),
            None => Ok(Self::default()),
        }
    }

    fn read(node: &MarkupNode) -> Result<Self> {
        let mut dataformat = Self::default();
        if let Some(name) = node.attr("occurrence") {
            dataformat.sample_occurrence = SampleOccurrence::from_name(name)
                .ok_or_else(|| PluginError::Parse(format!("unknown sample occurrence '{}'", name)))?;
        }
        if let Some(name) = node.attr("format") {
            dataformat.sample_format = SampleFormat::from_name(name)
                .ok_or_else(|| PluginError::Parse(format!("unknown sample format '{}'", name)))?;
        }
        if let Some(dimension) = node.attr_as("dimension")? {
            dataformat.sample_dimension = dimension;
        }
        Ok(dataformat)
    }
}

fn read_flag(node: &MarkupNode, key: &str, default: bool) -> Result<bool> {
    match node.attr(key) {
        Some(text) => parse_bool(text).ok_or_else(|| {
            PluginError::Parse(format!("<{} {}>: '{}' is not a boolean", node.name(), key, text))
        }),
        None => Ok(default),
    }
}

fn child_text(node: &MarkupNode, name: &str) -> String {
    node.child(name)
        .map(|child| child.text().to_string())
        .unwrap_or_default()
}

fn read_property_block(node: &MarkupNode, version: Version) -> Result<PropertyList> {
    match node.child("Properties") {
        Some(block) => PropertyList::from_markup(block, version),
        None => Ok(PropertyList::new()),
    }
}

/// Everything the host needs to know about one plugin channel
#[derive(Debug, Clone, PartialEq)]
pub struct PluginChannelInfo {
    pub local_id: u32,
    pub local_parent_id: Option<u32>,
    pub default_name: String,
    pub domain: String,
    pub dataformat: ChannelDataformat,
    pub timebase: Timebase,
    pub deletable: bool,
    pub valid: bool,
    pub unit: String,
    pub range: Range,
    pub properties: PropertyList,
}

impl PluginChannelInfo {
    pub fn new(local_id: u32) -> Self {
        Self {
            local_id,
            local_parent_id: None,
            default_name: String::new(),
            domain: String::new(),
            dataformat: ChannelDataformat::default(),
            timebase: Timebase::default(),
            deletable: false,
            valid: true,
            unit: String::new(),
            range: Range::default(),
            properties: PropertyList::new(),
        }
    }

    fn write(&self, parent: &mut MarkupNode) {
        let node = parent.append("Channel");
        node.set_attr("local_id", self.local_id);
        if let Some(parent_id) = self.local_parent_id {
            node.set_attr("parent", parent_id);
        }
        node.set_attr("valid", self.valid)
            .set_attr("deletable", self.deletable);
        node.append("Name").set_text(self.default_name.clone());
        node.append("Domain").set_text(self.domain.clone());
        self.dataformat.store(node);
        self.timebase.store(node);
        node.append("Unit").set_text(self.unit.clone());
        write_range(node.append("Range"), &self.range);
        self.properties.append_to(node.append("Properties"));
    }

    fn read(node: &MarkupNode, version: Version) -> Result<Self> {
        let timebase = match node.child("Timebase") {
            Some(timebase) => Timebase::read(timebase)?,
            None => Timebase::default(),
        };
        Ok(Self {
            local_id: node.required_attr("local_id")?,
            local_parent_id: node.attr_as("parent")?,
            default_name: child_text(node, "Name"),
            domain: child_text(node, "Domain"),
            dataformat: ChannelDataformat::extract(node)?,
            timebase,
            deletable: read_flag(node, "deletable", false)?,
            valid: read_flag(node, "valid", true)?,
            unit: child_text(node, "Unit"),
            range: match node.child("Range") {
                Some(range) => read_range(range)?,
                None => Range::default(),
            },
            properties: read_property_block(node, version)?,
        })
    }
}

/// Inputs and outputs of one plugin task
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PluginTaskInfo {
    pub id: u64,
    pub token: u64,
    pub valid: bool,
    pub input_channels: Vec<u64>,
    pub output_channels: Vec<u32>,
}

impl PluginTaskInfo {
    fn write(&self, parent: &mut MarkupNode) {
        let node = parent.append("Task");
        node.set_attr("id", self.id)
            .set_attr("token", self.token)
            .set_attr("valid", self.valid);
        for id in &self.input_channels {
            node.append("Input").set_attr("channel_id", id);
        }
        for id in &self.output_channels {
            node.append("Output").set_attr("local_id", id);
        }
    }

    fn read(node: &MarkupNode) -> Result<Self> {
        Ok(Self {
            id: node.required_attr("id")?,
            token: node.attr_as("token")?.unwrap_or_default(),
            valid: read_flag(node, "valid", true)?,
            input_channels: node
                .children_named("Input")
                .map(|input| input.required_attr("channel_id"))
                .collect::<Result<_>>()?,
            output_channels: node
                .children_named("Output")
                .map(|output| output.required_attr("local_id"))
                .collect::<Result<_>>()?,
        })
    }
}

/// Full topology announcement
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateChannelsTelegram {
    pub channels: Vec<PluginChannelInfo>,
    pub tasks: Vec<PluginTaskInfo>,
}

impl Telegram for UpdateChannelsTelegram {
    const ROOT: &'static str = "UpdateChannels";

    fn decode(root: &MarkupNode, version: Version) -> Result<Self> {
        Ok(Self {
            channels: root
                .children_named("Channel")
                .map(|node| PluginChannelInfo::read(node, version))
                .collect::<Result<_>>()?,
            tasks: root
                .children_named("Task")
                .map(PluginTaskInfo::read)
                .collect::<Result<_>>()?,
        })
    }

    fn encode(&self, root: &mut MarkupNode) -> Result<()> {
        for channel in &self.channels {
            channel.write(root);
        }
        for task in &self.tasks {
            task.write(root);
        }
        Ok(())
    }
}

/// Changed property values of one plugin channel
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateChannelPropertiesTelegram {
    pub local_id: u32,
    pub properties: PropertyList,
}

impl Telegram for UpdateChannelPropertiesTelegram {
    const ROOT: &'static str = "UpdateChannelProperties";

    fn decode(root: &MarkupNode, version: Version) -> Result<Self> {
        Ok(Self {
            local_id: root.required_attr("local_id")?,
            properties: PropertyList::from_markup(root, version)?,
        })
    }

    fn encode(&self, root: &mut MarkupNode) -> Result<()> {
        root.set_attr("local_id", self.local_id);
        self.properties.append_to(root);
        Ok(())
    }
}

/// Property edits addressed to one channel
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelConfig {
    pub channel_id: u64,
    pub properties: PropertyList,
}

/// Host edits of plugin channel properties
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateConfigTelegram {
    pub channels: Vec<ChannelConfig>,
}

impl UpdateConfigTelegram {
    /// Every channel id addressed by this telegram
    pub fn channel_ids(&self) -> BTreeSet<u64> {
        self.channels.iter().map(|c| c.channel_id).collect()
    }
}

impl Telegram for UpdateConfigTelegram {
    const ROOT: &'static str = "UpdateConfig";

    fn decode(root: &MarkupNode, version: Version) -> Result<Self> {
        let channels = root
            .children_named("Channel")
            .map(|node| -> Result<ChannelConfig> {
                Ok(ChannelConfig {
                    channel_id: node.required_attr("channel_id")?,
                    properties: PropertyList::from_markup(node, version)?,
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self { channels })
    }

    fn encode(&self, root: &mut MarkupNode) -> Result<()> {
        for channel in &self.channels {
            let node = root.append("Channel");
            node.set_attr("channel_id", channel.channel_id);
            channel.properties.append_to(node);
        }
        Ok(())
    }
}

/// New sample format of one channel
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelDataformatTelegram {
    pub channel_id: u64,
    pub dataformat: ChannelDataformat,
}

impl Telegram for ChannelDataformatTelegram {
    const ROOT: &'static str = "ChannelDataformat";

    fn decode(root: &MarkupNode, _version: Version) -> Result<Self> {
        Ok(Self {
            channel_id: root.required_attr("channel_id")?,
            dataformat: ChannelDataformat::extract(root)?,
        })
    }

    fn encode(&self, root: &mut MarkupNode) -> Result<()> {
        root.set_attr("channel_id", self.channel_id);
        self.dataformat.store(root);
        Ok(())
    }
}

/// Current state of one input channel as reported by the host
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputChannelConfig {
    pub channel_id: u64,
    pub valid: bool,
    pub properties: PropertyList,
}

/// Host notification that input channels were reconfigured
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelConfigChangedTelegram {
    pub channels: Vec<InputChannelConfig>,
}

impl ChannelConfigChangedTelegram {
    pub fn channel_ids(&self) -> BTreeSet<u64> {
        self.channels.iter().map(|c| c.channel_id).collect()
    }
}

impl Telegram for ChannelConfigChangedTelegram {
    const ROOT: &'static str = "ChannelConfigChanged";

    fn decode(root: &MarkupNode, version: Version) -> Result<Self> {
        let channels = root
            .children_named("Channel")
            .map(|node| -> Result<InputChannelConfig> {
                Ok(InputChannelConfig {
                    channel_id: node.required_attr("channel_id")?,
                    valid: read_flag(node, "valid", true)?,
                    properties: PropertyList::from_markup(node, version)?,
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self { channels })
    }

    fn encode(&self, root: &mut MarkupNode) -> Result<()> {
        for channel in &self.channels {
            let node = root.append("Channel");
            node.set_attr("channel_id", channel.channel_id)
                .set_attr("valid", channel.valid);
            channel.properties.append_to(node);
        }
        Ok(())
    }
}

/// Host notification that the set of available input channels changed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputChannelsChangedTelegram {
    pub channel_ids: BTreeSet<u64>,
}

impl Telegram for InputChannelsChangedTelegram {
    const ROOT: &'static str = "InputChannelsChanged";

    fn decode(root: &MarkupNode, _version: Version) -> Result<Self> {
        Ok(Self {
            channel_ids: root
                .children_named("Channel")
                .map(|node| node.required_attr("channel_id"))
                .collect::<Result<_>>()?,
        })
    }

    fn encode(&self, root: &mut MarkupNode) -> Result<()> {
        for id in &self.channel_ids {
            root.append("Channel").set_attr("channel_id", id);
        }
        Ok(())
    }
}
