//! The host boundary.
//!
//! The registry talks to the host only through [`Host`]: synchronous
//! messages carrying a telegram, and sample delivery per channel. Both are
//! order-preserving per channel.
//!
//! [`ChannelHost`] is an in-process implementation that forwards every
//! call over a bounded crossbeam channel to a [`HostReceiver`], e.g. a
//! transport thread or a test harness.

use crate::error::{error_codes, PluginError, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Messages sent from the plugin to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum HostMessageId {
    /// Payload: `UpdateChannels` telegram
    SetPluginOutputChannels = 1,
    /// Payload: `UpdateChannelProperties` telegram
    UpdateChannelProperties = 2,
}

/// Messages sent from the host to the plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PluginMessageId {
    /// Payload: `UpdateConfig` telegram
    ConfigChange = 1,
    /// Payload: `ChannelDataformat` telegram
    DataFormatChange = 2,
    /// Payload: `ChannelConfigChanged` telegram
    InputChannelConfigChanged = 3,
    /// Payload: `InputChannelsChanged` telegram
    InputChannelsChanged = 4,
}

impl PluginMessageId {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(PluginMessageId::ConfigChange),
            2 => Some(PluginMessageId::DataFormatChange),
            3 => Some(PluginMessageId::InputChannelConfigChanged),
            4 => Some(PluginMessageId::InputChannelsChanged),
            _ => None,
        }
    }
}

/// A telegram addressed to the host
#[derive(Debug, Clone, PartialEq)]
pub struct HostMessage {
    pub id: HostMessageId,
    pub payload: String,
}

/// Capabilities the registry and task workers need from the host
pub trait Host: Send + Sync {
    /// Deliver a message and wait for the host's status code
    /// ([`error_codes::OK`] on success).
    fn message_sync(&self, message: HostMessage) -> Result<u64>;

    /// Contiguous samples for `local_id` starting at `tick`
    fn add_samples(&self, local_id: u32, tick: u64, data: &[u8]);

    /// A single sample for `local_id` at `tick`
    fn add_sample(&self, local_id: u32, tick: u64, data: &[u8]);
}

/// Everything a [`ChannelHost`] forwards
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Message(HostMessage),
    Samples {
        local_id: u32,
        tick: u64,
        data: Vec<u8>,
    },
    Sample {
        local_id: u32,
        tick: u64,
        data: Vec<u8>,
    },
}

/// [`Host`] backed by a bounded crossbeam channel
#[derive(Debug, Clone)]
pub struct ChannelHost {
    event_tx: Sender<HostEvent>,
}

/// Receiving end of a [`ChannelHost`]
#[derive(Debug)]
pub struct HostReceiver {
    event_rx: Receiver<HostEvent>,
}

impl ChannelHost {
    /// Create a connected host/receiver pair
    pub fn new(capacity: usize) -> (Self, HostReceiver) {
        let (event_tx, event_rx) = bounded(capacity);
        (Self { event_tx }, HostReceiver { event_rx })
    }

    fn forward(&self, event: HostEvent) -> Result<()> {
        self.event_tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => PluginError::Host("host queue is full".to_string()),
            TrySendError::Disconnected(_) => {
                PluginError::Host("host receiver disconnected".to_string())
            }
        })
    }
}

impl Host for ChannelHost {
    fn message_sync(&self, message: HostMessage) -> Result<u64> {
        self.forward(HostEvent::Message(message))?;
        Ok(error_codes::OK)
    }

    fn add_samples(&self, local_id: u32, tick: u64, data: &[u8]) {
        let event = HostEvent::Samples {
            local_id,
            tick,
            data: data.to_vec(),
        };
        if let Err(e) = self.forward(event) {
            tracing::warn!("Dropping samples for channel {}: {}", local_id, e);
        }
    }

    fn add_sample(&self, local_id: u32, tick: u64, data: &[u8]) {
        let event = HostEvent::Sample {
            local_id,
            tick,
            data: data.to_vec(),
        };
        if let Err(e) = self.forward(event) {
            tracing::warn!("Dropping sample for channel {}: {}", local_id, e);
        }
    }
}

impl HostReceiver {
    /// Drain all pending events (non-blocking)
    pub fn drain(&self) -> Vec<HostEvent> {
        self.event_rx.try_iter().collect()
    }

    pub fn try_recv(&self) -> Option<HostEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Block until the next event; `None` once every sender is gone
    pub fn recv(&self) -> Option<HostEvent> {
        self.event_rx.recv().ok()
    }

    /// Pending messages only; sample events are discarded
    pub fn drain_messages(&self) -> Vec<HostMessage> {
        self.drain()
            .into_iter()
            .filter_map(|event| match event {
                HostEvent::Message(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_forwarded_in_order() {
        let (host, receiver) = ChannelHost::new(8);
        for n in 0..3 {
            let status = host
                .message_sync(HostMessage {
                    id: HostMessageId::UpdateChannelProperties,
                    payload: n.to_string(),
                })
                .unwrap();
            assert_eq!(status, error_codes::OK);
        }
        let payloads: Vec<_> = receiver
            .drain_messages()
            .into_iter()
            .map(|m| m.payload)
            .collect();
        assert_eq!(payloads, vec!["0", "1", "2"]);
    }

    #[test]
    fn test_full_queue_is_an_error() {
        let (host, _receiver) = ChannelHost::new(1);
        let message = HostMessage {
            id: HostMessageId::SetPluginOutputChannels,
            payload: String::new(),
        };
        assert!(host.message_sync(message.clone()).is_ok());
        assert!(matches!(host.message_sync(message.clone()), Err(PluginError::Host(_))));

        let (host, receiver) = ChannelHost::new(1);
        drop(receiver);
        assert!(matches!(host.message_sync(message), Err(PluginError::Host(_))));
    }

    #[test]
    fn test_samples() {
        let (host, receiver) = ChannelHost::new(4);
        host.add_samples(3, 100, &[1, 2, 3, 4]);
        host.add_sample(3, 104, &[5]);
        assert_eq!(
            receiver.drain(),
            vec![
                HostEvent::Samples {
                    local_id: 3,
                    tick: 100,
                    data: vec![1, 2, 3, 4]
                },
                HostEvent::Sample {
                    local_id: 3,
                    tick: 104,
                    data: vec![5]
                },
            ]
        );
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_plugin_message_ids() {
        assert_eq!(PluginMessageId::from_raw(1), Some(PluginMessageId::ConfigChange));
        assert_eq!(
            PluginMessageId::from_raw(PluginMessageId::InputChannelsChanged as u32),
            Some(PluginMessageId::InputChannelsChanged)
        );
        assert_eq!(PluginMessageId::from_raw(99), None);
    }
}
