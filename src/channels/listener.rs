//! Change notification from channels and tasks back to their registry.
//!
//! Channels and tasks never see the registry itself. At creation the
//! registry injects its [`SyncState`] through these traits; every
//! externally visible mutation is reported with a classification that
//! decides which dirty tracker is updated:
//!
//! - setup changes (format, timebase, name, parent, membership) set the
//!   topology flag and lead to a full `UpdateChannels` telegram
//! - property changes record `(channel, property name)` and lead to a
//!   per-channel `UpdateChannelProperties` telegram
//!
//! Tasks whose inputs or outputs changed are also remembered so the
//! registry can run their worker's `update` before the next sync or
//! processing call.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

/// Receives change notifications from a [`PluginChannel`](super::PluginChannel)
pub trait ChannelChangeListener {
    /// Structural change: format, timebase, name, parent, validity, property set
    fn on_channel_setup_changed(&self, local_id: u32);

    /// Only the value of one named property changed
    fn on_channel_property_changed(&self, local_id: u32, name: &str);
}

/// Receives change notifications from a [`PluginTask`](super::PluginTask)
pub trait TaskChangeListener {
    fn on_task_channel_added(&self, task_id: u64, local_id: u32);
    fn on_task_channel_removed(&self, task_id: u64, local_id: u32);
    fn on_task_input_channels_changed(&self, task_id: u64);
    fn on_task_validity_changed(&self, task_id: u64);
}

/// Two-tier dirty tracking shared by a registry and its entities
#[derive(Debug, Default)]
pub struct SyncState {
    /// Channels added, removed or reconfigured
    channels_dirty: Cell<bool>,
    /// Changed property names per channel
    properties_dirty: RefCell<BTreeMap<u32, BTreeSet<String>>>,
    /// Tasks whose inputs or outputs changed since their last update
    tasks_dirty: RefCell<BTreeSet<u64>>,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_topology_dirty(&self) -> bool {
        self.channels_dirty.get()
    }

    pub fn mark_topology_dirty(&self) {
        self.channels_dirty.set(true);
    }

    pub fn clear_topology(&self) {
        self.channels_dirty.set(false);
    }

    /// Channels with pending property updates, ascending
    pub fn dirty_property_channels(&self) -> Vec<u32> {
        self.properties_dirty.borrow().keys().copied().collect()
    }

    /// Pending property names of one channel
    pub fn dirty_properties(&self, local_id: u32) -> BTreeSet<String> {
        self.properties_dirty
            .borrow()
            .get(&local_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn clear_properties(&self, local_id: u32) {
        self.properties_dirty.borrow_mut().remove(&local_id);
    }

    /// Forget a removed channel
    pub fn purge_channel(&self, local_id: u32) {
        self.properties_dirty.borrow_mut().remove(&local_id);
    }

    pub fn mark_task_dirty(&self, task_id: u64) {
        self.tasks_dirty.borrow_mut().insert(task_id);
    }

    #[cfg(test)]
    pub(crate) fn is_task_dirty(&self, task_id: u64) -> bool {
        self.tasks_dirty.borrow().contains(&task_id)
    }

    pub fn clear_task(&self, task_id: u64) {
        self.tasks_dirty.borrow_mut().remove(&task_id);
    }

    /// Drain the tasks awaiting an update
    pub fn take_dirty_tasks(&self) -> BTreeSet<u64> {
        std::mem::take(&mut *self.tasks_dirty.borrow_mut())
    }

    pub fn clear(&self) {
        self.channels_dirty.set(false);
        self.properties_dirty.borrow_mut().clear();
        self.tasks_dirty.borrow_mut().clear();
    }
}

impl ChannelChangeListener for SyncState {
    fn on_channel_setup_changed(&self, local_id: u32) {
        tracing::trace!("Channel {} setup changed", local_id);
        self.mark_topology_dirty();
    }

    fn on_channel_property_changed(&self, local_id: u32, name: &str) {
        tracing::trace!("Channel {} property '{}' changed", local_id, name);
        self.properties_dirty
            .borrow_mut()
            .entry(local_id)
            .or_default()
            .insert(name.to_string());
    }
}

impl TaskChangeListener for SyncState {
    fn on_task_channel_added(&self, task_id: u64, local_id: u32) {
        tracing::trace!("Task {} took channel {}", task_id, local_id);
        self.mark_task_dirty(task_id);
        self.mark_topology_dirty();
    }

    fn on_task_channel_removed(&self, task_id: u64, local_id: u32) {
        tracing::trace!("Task {} released channel {}", task_id, local_id);
        self.mark_task_dirty(task_id);
        self.mark_topology_dirty();
    }

    fn on_task_input_channels_changed(&self, task_id: u64) {
        self.mark_task_dirty(task_id);
        self.mark_topology_dirty();
    }

    fn on_task_validity_changed(&self, _task_id: u64) {
        self.mark_topology_dirty();
    }
}
