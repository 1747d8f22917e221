//! Demo plugin - Main Entry Point
//!
//! Runs a synthetic sine generator through the channel registry. A
//! transport thread stands in for the host: it logs every telegram and
//! counts the delivered samples.

use anyhow::Context;
use plugin_channels::{
    channels::{
        convert_time_to_tick_at_or_after, ChannelHost, Host, HostEvent, InputStates,
        MasterTimestamp, PluginChannelPtr, PluginChannels, PluginMessageId, PluginTask,
        ProcessContext, TaskWorker,
    },
    codec::{ChannelConfig, SampleFormat, SampleOccurrence, Telegram, UpdateConfigTelegram},
    config::{default_config_path, FrameworkConfig},
    logging::init_logging,
    property::Property,
    types::Range,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

const SAMPLE_RATE_HZ: f64 = 1000.0;
const MASTER_RATE_HZ: f64 = 1_000_000.0;

/// Sync scalar generator writing a sine to its single output channel
#[derive(Default)]
struct SineGenerator {
    local_id: Option<u32>,
    frequency: f64,
    amplitude: f64,
    next_tick: u64,
}

impl TaskWorker for SineGenerator {
    fn update(&mut self, task: &PluginTask, _inputs: &InputStates) -> bool {
        let Some(channel) = task.output_channels().first() else {
            self.local_id = None;
            return false;
        };
        let channel = channel.borrow();
        self.local_id = Some(channel.local_id());
        self.frequency = channel.timebase().frequency;
        self.amplitude = channel
            .properties()
            .get_double("Amplitude")
            .unwrap_or(1.0);
        self.frequency > 0.0
    }

    fn process(&mut self, ctx: &ProcessContext, host: &dyn Host) {
        let Some(local_id) = self.local_id else {
            return;
        };
        let end = convert_time_to_tick_at_or_after(ctx.timestamp.seconds(), self.frequency);
        if end <= self.next_tick {
            return;
        }

        let mut data = Vec::with_capacity(((end - self.next_tick) * 8) as usize);
        for tick in self.next_tick..end {
            let t = tick as f64 / self.frequency;
            let value = self.amplitude * (2.0 * std::f64::consts::PI * 5.0 * t).sin();
            data.extend_from_slice(&value.to_le_bytes());
        }
        host.add_samples(local_id, self.next_tick, &data);
        self.next_tick = end;
    }

    fn on_pause(&mut self) {
        tracing::info!("Generator paused at tick {}", self.next_tick);
    }
}

fn add_sine_channel(registry: &mut PluginChannels) -> PluginChannelPtr {
    let channel = registry.add_channel();
    channel
        .borrow_mut()
        .set_default_name("Sine")
        .set_domain("Demo")
        .set_sample_format(SampleOccurrence::Sync, SampleFormat::Double, 1)
        .set_simple_timebase(SAMPLE_RATE_HZ)
        .set_unit("V")
        .set_range(Range::new(-10.0, 10.0, "V"))
        .add_property(Property::new("Amplitude", 1.0));
    channel
}

fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => FrameworkConfig::load(&path).with_context(|| format!("loading {}", path))?,
        None => default_config_path()
            .map(FrameworkConfig::load_or_default)
            .unwrap_or_default(),
    };
    let _log_guard = init_logging(&config.logging)?;

    tracing::info!("Starting demo plugin (protocol {})", config.protocol.version);

    let (host, receiver) = ChannelHost::new(1024);
    let transport = std::thread::spawn(move || {
        let mut samples = 0usize;
        while let Some(event) = receiver.recv() {
            match event {
                HostEvent::Message(message) => {
                    tracing::info!("Host <- {:?}\n{}", message.id, message.payload);
                }
                HostEvent::Samples { data, .. } | HostEvent::Sample { data, .. } => {
                    samples += data.len() / 8;
                }
            }
        }
        samples
    });

    let mut registry = PluginChannels::from_config(&config)?;
    registry.set_plugin_host(Some(Arc::new(host)));

    let channel = add_sine_channel(&mut registry);
    let task = registry.add_task(Rc::new(RefCell::new(SineGenerator::default())), 0);
    task.borrow_mut().add_output_channel(&channel)?;
    registry.synchronize()?;

    // the host raises the amplitude; the generator picks it up in `update`
    let edit = UpdateConfigTelegram {
        channels: vec![ChannelConfig {
            channel_id: u64::from(channel.borrow().local_id()),
            properties: vec![Property::new("Amplitude", 5.0)].into(),
        }],
    };
    let status = registry.plugin_message(PluginMessageId::ConfigChange as u32, &edit.generate()?);
    tracing::info!("Config change handled with status {:#x}", status);

    for step in 1..=10u64 {
        let timestamp = MasterTimestamp::new(step * 100_000, MASTER_RATE_HZ);
        registry.process_tasks(timestamp)?;
    }
    registry.pause_tasks();

    drop(registry);
    let samples = transport
        .join()
        .map_err(|_| anyhow::anyhow!("transport thread panicked"))?;
    tracing::info!("Host received {} samples", samples);
    Ok(())
}
