//! # plugin-channels: channel plumbing for measurement software plugins
//!
//! A plugin exposes typed data channels to a host application and receives
//! configuration for them. This crate provides the parts every such plugin
//! needs:
//!
//! ## Architecture
//!
//! - **Property**: dynamically typed name/value pairs with 24 value kinds
//! - **Markup**: a small element tree with XML text conversion (quick-xml)
//! - **Codec**: versioned telegrams for properties, channels, timebases and
//!   export requests, all behind the [`codec::Telegram`] trait
//! - **Channels**: output channels, processing tasks and the
//!   [`PluginChannels`] registry that keeps the host in sync with two-tier
//!   dirty tracking
//!
//! ## Example
//!
//! ```ignore
//! use plugin_channels::channels::{ChannelHost, PluginChannels};
//! use plugin_channels::codec::{SampleFormat, SampleOccurrence};
//! use std::sync::Arc;
//!
//! let (host, receiver) = ChannelHost::new(64);
//! let mut registry = PluginChannels::new();
//! registry.set_plugin_host(Some(Arc::new(host)));
//!
//! let channel = registry.add_channel();
//! channel
//!     .borrow_mut()
//!     .set_default_name("Sine")
//!     .set_sample_format(SampleOccurrence::Sync, SampleFormat::Double, 1)
//!     .set_simple_timebase(1000.0);
//!
//! registry.synchronize()?;
//! for message in receiver.drain_messages() {
//!     println!("{}", message.payload);
//! }
//! ```

pub mod channels;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod markup;
pub mod property;
pub mod types;

// Re-export commonly used types
pub use channels::{PluginChannel, PluginChannels, PluginTask, TaskWorker};
pub use codec::Telegram;
pub use config::FrameworkConfig;
pub use error::{PluginError, Result};
pub use property::{Property, PropertyList, PropertyType};
