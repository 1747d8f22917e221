//! Test data builders for creating test objects

use plugin_channels::channels::{PluginChannelPtr, PluginChannels};
use plugin_channels::codec::{SampleFormat, SampleOccurrence};
use plugin_channels::Property;

/// Builder for channels registered in a [`PluginChannels`]
pub struct ChannelBuilder {
    name: String,
    frequency: f64,
    format: SampleFormat,
    unit: String,
    properties: Vec<Property>,
}

impl ChannelBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            frequency: 1000.0,
            format: SampleFormat::Double,
            unit: String::new(),
            properties: Vec::new(),
        }
    }

    pub fn frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn format(mut self, format: SampleFormat) -> Self {
        self.format = format;
        self
    }

    pub fn unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn build(self, registry: &mut PluginChannels) -> PluginChannelPtr {
        let channel = registry.add_channel();
        {
            let mut ch = channel.borrow_mut();
            ch.set_default_name(self.name)
                .set_sample_format(SampleOccurrence::Sync, self.format, 1)
                .set_simple_timebase(self.frequency)
                .set_unit(self.unit);
            for property in self.properties {
                ch.add_property(property);
            }
        }
        channel
    }
}
