//! Channels, tasks and the registry that keeps them in sync with the host.
//!
//! ## Architecture
//!
//! - [`PluginChannels`] owns all [`PluginChannel`]s and [`PluginTask`]s of
//!   one plugin instance and is the only place that talks to the [`Host`]
//! - channels and tasks report their own mutations through the listener
//!   traits; the registry turns them into dirty state
//! - [`TaskWorker`] implementations hold the channel-specific logic
//!
//! Everything here lives on a single owner thread. Only the host handle is
//! shareable, so a transport may run elsewhere (see [`ChannelHost`]).

mod channel;
mod host;
mod listener;
mod registry;
mod task;
pub mod ticks;

pub use channel::{keys, PluginChannel, PluginChannelPtr};
pub use host::{
    ChannelHost, Host, HostEvent, HostMessage, HostMessageId, HostReceiver, PluginMessageId,
};
pub use listener::{ChannelChangeListener, SyncState, TaskChangeListener};
pub use registry::PluginChannels;
pub use task::{
    InputChannelState, InputStates, MasterTimestamp, PluginTask, PluginTaskPtr, ProcessContext,
    TaskWorker, TaskWorkerPtr,
};
pub use ticks::{convert_tick_to_time, convert_time_to_tick_at_or_after};
