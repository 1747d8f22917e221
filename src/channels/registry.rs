//! The channel/task registry and its host synchronisation.
//!
//! [`PluginChannels`] owns every channel and task of a plugin instance,
//! hands out ids, routes host telegrams to the affected tasks and pushes
//! accumulated changes back to the host in [`PluginChannels::synchronize`].
//!
//! Changes are tracked in two tiers (see [`SyncState`]): a topology flag
//! that triggers a full `UpdateChannels` telegram, and per-channel
//! property names that trigger one `UpdateChannelProperties` telegram per
//! channel. A pending topology update supersedes pending property updates.

use super::channel::{PluginChannel, PluginChannelPtr};
use super::host::{Host, HostMessage, HostMessageId, PluginMessageId};
use super::listener::{ChannelChangeListener, SyncState, TaskChangeListener};
use super::task::{
    InputChannelState, InputStates, MasterTimestamp, PluginTask, PluginTaskPtr, ProcessContext,
    TaskWorkerPtr,
};
use crate::codec::{
    ChannelConfigChangedTelegram, ChannelDataformatTelegram, InputChannelsChangedTelegram,
    Telegram, UpdateChannelPropertiesTelegram, UpdateChannelsTelegram, UpdateConfigTelegram,
};
use crate::config::FrameworkConfig;
use crate::error::{error_codes, PluginError, Result};
use crate::markup::Version;
use crate::property::{Property, PropertyList};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::sync::Arc;

/// Registry of all channels and tasks of one plugin instance.
///
/// Not thread-safe: the registry, its channels and its tasks live on one
/// owner thread that handles host messages and processing calls in turn.
pub struct PluginChannels {
    host: Option<Arc<dyn Host>>,
    channels: BTreeMap<u32, PluginChannelPtr>,
    /// Reserved channel ids
    ids: BTreeSet<u32>,
    tasks: BTreeMap<u64, PluginTaskPtr>,
    next_task_id: u64,
    sync: Rc<SyncState>,
    input_states: InputStates,
    version: Version,
    auto_synchronize: bool,
}

impl std::fmt::Debug for PluginChannels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginChannels")
            .field("channels", &self.channels.keys().collect::<Vec<_>>())
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .field("next_task_id", &self.next_task_id)
            .field("has_host", &self.host.is_some())
            .field("version", &self.version)
            .finish()
    }
}

impl Default for PluginChannels {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginChannels {
    pub fn new() -> Self {
        Self {
            host: None,
            channels: BTreeMap::new(),
            ids: BTreeSet::new(),
            tasks: BTreeMap::new(),
            next_task_id: 1,
            sync: Rc::new(SyncState::new()),
            input_states: InputStates::new(),
            version: Version::CURRENT,
            auto_synchronize: true,
        }
    }

    /// Registry using the protocol version and sync policy of `config`
    pub fn from_config(config: &FrameworkConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.version = config.protocol_version()?;
        registry.auto_synchronize = config.sync.auto_synchronize;
        Ok(registry)
    }

    /// Protocol version stamped on outgoing telegrams and assumed for
    /// incoming ones without a version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Whether handled host telegrams are followed by `synchronize()`
    pub fn set_auto_synchronize(&mut self, enabled: bool) {
        self.auto_synchronize = enabled;
    }

    pub fn set_plugin_host(&mut self, host: Option<Arc<dyn Host>>) {
        self.host = host;
    }

    pub fn host(&self) -> Option<Arc<dyn Host>> {
        self.host.clone()
    }

    // ── Channels ──

    /// Create a channel with the smallest free id
    pub fn add_channel(&mut self) -> PluginChannelPtr {
        let local_id = self.generate_id();
        let mut channel = PluginChannel::new(local_id);
        let listener: Rc<dyn ChannelChangeListener> = self.sync.clone();
        channel.set_change_listener(Some(listener));

        let channel = Rc::new(RefCell::new(channel));
        self.channels.insert(local_id, Rc::clone(&channel));
        self.sync.mark_topology_dirty();
        tracing::info!("Added channel {}", local_id);
        channel
    }

    /// Remove a channel, detaching it from its owning task and from its
    /// child channels. The owner and all consumers are updated before the
    /// id becomes available again. Returns `false` for unknown ids.
    pub fn remove_channel(&mut self, local_id: u32) -> bool {
        let Some(channel) = self.channels.get(&local_id).cloned() else {
            return false;
        };

        // includes the owner while the channel is still one of its outputs
        let affected = self.affected_tasks_for_telegram(&BTreeSet::from([u64::from(local_id)]));
        let owner = channel.borrow().owner_task();
        if let Some(task) = owner.and_then(|id| self.tasks.get(&id)) {
            task.borrow_mut().remove_output_channel(&channel);
        }

        self.channels.remove(&local_id);
        channel.borrow_mut().set_change_listener(None);
        for child in self.channels.values() {
            let orphaned = child
                .borrow()
                .local_parent()
                .is_some_and(|parent| Rc::ptr_eq(&parent, &channel));
            if orphaned {
                child.borrow_mut().set_local_parent(None);
            }
        }
        self.sync.purge_channel(local_id);
        self.sync.mark_topology_dirty();

        self.update_tasks(&affected);
        self.reset_used_ids();
        tracing::info!("Removed channel {}", local_id);
        true
    }

    pub fn find_channel(&self, local_id: u32) -> Option<PluginChannelPtr> {
        self.channels.get(&local_id).cloned()
    }

    /// Ids of all live channels, ascending
    pub fn channel_ids(&self) -> Vec<u32> {
        self.channels.keys().copied().collect()
    }

    /// Look up a channel addressed by a host telegram
    fn channel_for(&self, channel_id: u64) -> Option<&PluginChannelPtr> {
        u32::try_from(channel_id)
            .ok()
            .and_then(|id| self.channels.get(&id))
    }

    // ── Tasks ──

    /// Register a task driven by `worker`. Task ids are never reused.
    pub fn add_task(&mut self, worker: TaskWorkerPtr, token: u64) -> PluginTaskPtr {
        let id = self.next_task_id;
        self.next_task_id += 1;

        let mut task = PluginTask::new(id, worker, token);
        let listener: Rc<dyn TaskChangeListener> = self.sync.clone();
        task.set_change_listener(Some(listener));

        let task = Rc::new(RefCell::new(task));
        self.tasks.insert(id, Rc::clone(&task));
        self.sync.mark_task_dirty(id);
        self.sync.mark_topology_dirty();
        tracing::info!("Added task {} (token {})", id, token);
        task
    }

    /// Remove a task together with the output channels it owns
    pub fn remove_task(&mut self, task_id: u64) -> bool {
        let Some(task) = self.tasks.remove(&task_id) else {
            return false;
        };
        task.borrow_mut().set_change_listener(None);

        let outputs = task.borrow().output_channels().to_vec();
        for channel in &outputs {
            task.borrow_mut().remove_output_channel(channel);
        }
        for channel in outputs {
            let local_id = channel.borrow().local_id();
            self.remove_channel(local_id);
        }

        self.sync.clear_task(task_id);
        self.sync.mark_topology_dirty();
        tracing::info!("Removed task {}", task_id);
        true
    }

    pub fn find_task(&self, task_id: u64) -> Option<PluginTaskPtr> {
        self.tasks.get(&task_id).cloned()
    }

    /// All tasks in ascending id order
    pub fn tasks(&self) -> Vec<PluginTaskPtr> {
        self.tasks.values().cloned().collect()
    }

    // ── Ids ──

    /// Reserve and return the smallest id not in use
    pub fn generate_id(&mut self) -> u32 {
        let mut candidate = 0u32;
        for &id in &self.ids {
            if id != candidate {
                break;
            }
            candidate += 1;
        }
        self.ids.insert(candidate);
        candidate
    }

    /// Drop reservations that no live channel holds
    pub fn reset_used_ids(&mut self) {
        self.ids = self.channels.keys().copied().collect();
    }

    pub fn used_ids(&self) -> &BTreeSet<u32> {
        &self.ids
    }

    // ── Dirty state ──

    pub fn is_topology_dirty(&self) -> bool {
        self.sync.is_topology_dirty()
    }

    pub fn dirty_property_channels(&self) -> Vec<u32> {
        self.sync.dirty_property_channels()
    }

    /// Full description of channels and tasks as sent to the host
    pub fn topology_telegram(&self) -> UpdateChannelsTelegram {
        let channels = self
            .channels
            .values()
            .map(|channel| {
                let channel = channel.borrow();
                let task_valid = channel
                    .owner_task()
                    .and_then(|id| self.tasks.get(&id))
                    .map_or(true, |task| task.borrow().is_valid());
                channel.to_info(channel.is_valid() && task_valid)
            })
            .collect();
        let tasks = self
            .tasks
            .values()
            .map(|task| task.borrow().to_info())
            .collect();
        UpdateChannelsTelegram { channels, tasks }
    }

    /// Send pending changes to the host.
    ///
    /// Tasks whose inputs or outputs changed are updated first so the
    /// telegram carries their current validity.
    ///
    /// A dirty topology is sent as one `UpdateChannels` telegram, which
    /// also covers all pending property changes. Otherwise every channel
    /// with changed properties gets its own `UpdateChannelProperties`
    /// telegram. State that could not be delivered stays dirty.
    pub fn synchronize(&mut self) -> Result<()> {
        self.update_pending_tasks();

        let topology_dirty = self.sync.is_topology_dirty();
        let dirty_channels = self.sync.dirty_property_channels();
        if !topology_dirty && dirty_channels.is_empty() {
            return Ok(());
        }

        let host = self
            .host
            .clone()
            .ok_or_else(|| PluginError::Host("no plugin host attached".to_string()))?;

        if topology_dirty {
            let telegram = self.topology_telegram();
            let payload = telegram.generate_with_version(self.version)?;
            self.send(host.as_ref(), HostMessageId::SetPluginOutputChannels, payload)?;

            self.sync.clear_topology();
            for local_id in dirty_channels {
                self.sync.clear_properties(local_id);
            }
            tracing::info!(
                "Synchronized topology: {} channels, {} tasks",
                telegram.channels.len(),
                telegram.tasks.len()
            );
            return Ok(());
        }

        for local_id in dirty_channels {
            let Some(channel) = self.channels.get(&local_id) else {
                self.sync.clear_properties(local_id);
                continue;
            };
            let names = self.sync.dirty_properties(local_id);
            let properties: PropertyList = {
                let channel = channel.borrow();
                names
                    .iter()
                    .filter_map(|name| channel.property_snapshot(name))
                    .collect()
            };
            let telegram = UpdateChannelPropertiesTelegram {
                local_id,
                properties,
            };
            let payload = telegram.generate_with_version(self.version)?;
            self.send(host.as_ref(), HostMessageId::UpdateChannelProperties, payload)?;

            self.sync.clear_properties(local_id);
            tracing::debug!("Synchronized {} properties of channel {}", names.len(), local_id);
        }
        Ok(())
    }

    fn send(&self, host: &dyn Host, id: HostMessageId, payload: String) -> Result<()> {
        let status = host.message_sync(HostMessage { id, payload })?;
        if status != error_codes::OK {
            return Err(PluginError::Host(format!(
                "host rejected {:?} with status {:#x}",
                id, status
            )));
        }
        Ok(())
    }

    /// Remove all channels, tasks and input state. The task id counter
    /// keeps counting and the (now empty) topology is marked for sending.
    pub fn reset(&mut self) {
        for channel in self.channels.values() {
            channel.borrow_mut().set_change_listener(None);
        }
        for task in self.tasks.values() {
            task.borrow_mut().set_change_listener(None);
        }
        self.channels.clear();
        self.tasks.clear();
        self.ids.clear();
        self.input_states.clear();
        self.sync.clear();
        self.sync.mark_topology_dirty();
        tracing::info!("Registry reset");
    }

    // ── Processing ──

    pub fn pause_tasks(&self) {
        for task_id in self.tasks.keys() {
            self.pause_task(*task_id);
        }
    }

    /// Stop output generation of one task. Pausing a paused task is a
    /// no-op. Returns `false` for unknown ids.
    pub fn pause_task(&self, task_id: u64) -> bool {
        let Some(task) = self.tasks.get(&task_id) else {
            return false;
        };
        if task.borrow().is_paused() {
            return true;
        }
        task.borrow_mut().set_paused(true);
        let worker = task.borrow().worker();
        worker.borrow_mut().on_pause();
        tracing::debug!("Paused task {}", task_id);
        true
    }

    pub fn resume_tasks(&self) {
        for (task_id, task) in &self.tasks {
            if !task.borrow().is_paused() {
                continue;
            }
            task.borrow_mut().set_paused(false);
            let worker = task.borrow().worker();
            worker.borrow_mut().on_resume();
            tracing::debug!("Resumed task {}", task_id);
        }
    }

    /// Let every running task produce output up to `timestamp`.
    /// Returns the number of tasks processed.
    ///
    /// Workers of tasks set up since the last update see `update` before
    /// their first `process`.
    pub fn process_tasks(&self, timestamp: MasterTimestamp) -> Result<usize> {
        let host = self
            .host
            .as_ref()
            .ok_or_else(|| PluginError::Host("no plugin host attached".to_string()))?;
        self.update_pending_tasks();

        let mut processed = 0;
        for (task_id, task) in &self.tasks {
            let worker = {
                let task = task.borrow();
                if task.is_paused() {
                    continue;
                }
                task.worker()
            };
            let ctx = ProcessContext {
                task_id: *task_id,
                timestamp,
            };
            worker.borrow_mut().process(&ctx, host.as_ref());
            processed += 1;
        }
        tracing::trace!("Processed {} tasks at tick {}", processed, timestamp.ticks);
        Ok(processed)
    }

    // ── Host messages ──

    /// Handle a plugin message from the host and return its status code.
    ///
    /// Never fails: errors are logged and mapped onto a status code, and a
    /// rejected telegram leaves the registry unchanged.
    pub fn plugin_message(&mut self, message_id: u32, payload: &str) -> u64 {
        let version = self.version;
        let result = match PluginMessageId::from_raw(message_id) {
            None => Err(PluginError::UnknownMessage(message_id)),
            Some(PluginMessageId::ConfigChange) => {
                UpdateConfigTelegram::from_markup_with_default(payload, version)
                    .and_then(|telegram| self.process_config_update(&telegram))
            }
            Some(PluginMessageId::DataFormatChange) => {
                ChannelDataformatTelegram::from_markup_with_default(payload, version)
                    .and_then(|telegram| self.process_data_format_change(&telegram))
            }
            Some(PluginMessageId::InputChannelConfigChanged) => {
                ChannelConfigChangedTelegram::from_markup_with_default(payload, version).map(
                    |telegram| {
                        self.process_input_channel_config_change(&telegram);
                    },
                )
            }
            Some(PluginMessageId::InputChannelsChanged) => {
                InputChannelsChangedTelegram::from_markup_with_default(payload, version).map(
                    |telegram| {
                        self.process_input_channel_change(&telegram.channel_ids);
                    },
                )
            }
        };

        match result {
            Ok(()) => {
                tracing::debug!("Handled plugin message {}", message_id);
                if self.auto_synchronize {
                    if let Err(e) = self.synchronize() {
                        tracing::warn!("Synchronization after message {} failed: {}", message_id, e);
                    }
                }
                error_codes::OK
            }
            Err(e) => {
                tracing::warn!("Rejected plugin message {}: {}", message_id, e);
                e.status_code()
            }
        }
    }

    /// Apply host edits to channel properties.
    ///
    /// All edits are checked before any is applied, so a type mismatch
    /// rejects the whole telegram. Unknown channels and unknown property
    /// names are skipped.
    pub fn process_config_update(&mut self, telegram: &UpdateConfigTelegram) -> Result<()> {
        let mut accepted: Vec<(PluginChannelPtr, Vec<Property>)> = Vec::new();
        for config in &telegram.channels {
            let Some(channel) = self.channel_for(config.channel_id) else {
                tracing::warn!("Config update for unknown channel {}", config.channel_id);
                continue;
            };
            let mut edits = Vec::new();
            {
                let channel = channel.borrow();
                for property in config.properties.iter() {
                    match channel.check_property(property) {
                        Ok(()) => edits.push(property.clone()),
                        Err(PluginError::AbsentValue(reason)) => {
                            tracing::warn!("Ignoring config edit: {}", reason);
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
            accepted.push((Rc::clone(channel), edits));
        }

        for (channel, edits) in accepted {
            let mut channel = channel.borrow_mut();
            for property in edits {
                channel.apply_property(property);
            }
        }

        let affected = self.affected_tasks_for_telegram(&telegram.channel_ids());
        self.update_tasks(&affected);
        Ok(())
    }

    /// Apply a new sample format announced by the host
    pub fn process_data_format_change(&mut self, telegram: &ChannelDataformatTelegram) -> Result<()> {
        match self.channel_for(telegram.channel_id) {
            Some(channel) => {
                let format = telegram.dataformat;
                channel.borrow_mut().set_sample_format(
                    format.sample_occurrence,
                    format.sample_format,
                    format.sample_dimension,
                );
                self.sync.mark_topology_dirty();
            }
            None => tracing::debug!(
                "Data format change for channel {} without local counterpart",
                telegram.channel_id
            ),
        }

        let affected = self.affected_tasks_for_telegram(&BTreeSet::from([telegram.channel_id]));
        self.update_tasks(&affected);
        Ok(())
    }

    /// Record the reported input channel states and re-evaluate the tasks
    /// that consume them
    pub fn process_input_channel_config_change(&mut self, telegram: &ChannelConfigChangedTelegram) {
        for config in &telegram.channels {
            self.input_states.insert(
                config.channel_id,
                InputChannelState {
                    valid: config.valid,
                    properties: config.properties.clone(),
                },
            );
        }
        self.process_input_channel_change(&telegram.channel_ids());
    }

    /// Re-evaluate every task that lists one of `channel_ids` as input.
    ///
    /// A task stays registered when it loses its inputs; it only becomes
    /// invalid when none of its inputs is usable.
    pub fn process_input_channel_change(&mut self, channel_ids: &BTreeSet<u64>) {
        let affected: BTreeSet<u64> = channel_ids
            .iter()
            .flat_map(|id| self.affected_tasks_for_input(*id))
            .collect();
        self.update_tasks(&affected);
    }

    /// Tasks owning or consuming any of `channel_ids`
    pub fn affected_tasks_for_telegram(&self, channel_ids: &BTreeSet<u64>) -> BTreeSet<u64> {
        self.tasks
            .iter()
            .filter(|(_, task)| {
                let task = task.borrow();
                !task.input_channels().is_disjoint(channel_ids)
                    || task
                        .output_ids()
                        .into_iter()
                        .any(|id| channel_ids.contains(&u64::from(id)))
            })
            .map(|(id, _)| *id)
            .collect()
    }

    /// Tasks listing `channel_id` as input
    pub fn affected_tasks_for_input(&self, channel_id: u64) -> BTreeSet<u64> {
        self.tasks
            .iter()
            .filter(|(_, task)| task.borrow().input_channels().contains(&channel_id))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Last state the host reported for an input channel
    pub fn input_channel_state(&self, channel_id: u64) -> Option<&InputChannelState> {
        self.input_states.get(&channel_id)
    }

    /// Update tasks whose inputs or outputs changed since their last update
    fn update_pending_tasks(&self) {
        let pending = self.sync.take_dirty_tasks();
        if !pending.is_empty() {
            self.update_tasks(&pending);
        }
    }

    fn update_tasks(&self, task_ids: &BTreeSet<u64>) {
        for task_id in task_ids {
            let Some(task) = self.tasks.get(task_id) else {
                continue;
            };
            self.sync.clear_task(*task_id);
            let valid = {
                let task = task.borrow();
                let worker = task.worker();
                let worker_valid = worker.borrow_mut().update(&task, &self.input_states);
                worker_valid && self.has_usable_input(&task)
            };
            task.borrow_mut().set_valid(valid);
            tracing::debug!("Updated task {} (valid: {})", task_id, valid);
        }
    }

    /// Inputs the host has not reported on count as usable
    fn has_usable_input(&self, task: &PluginTask) -> bool {
        let inputs = task.input_channels();
        inputs.is_empty()
            || inputs.iter().any(|id| {
                self.input_states
                    .get(id)
                    .map_or(true, |state| state.valid)
            })
    }
}
