//! Processing tasks and the worker contract.

use super::channel::PluginChannelPtr;
use super::host::Host;
use super::listener::TaskChangeListener;
use crate::codec::PluginTaskInfo;
use crate::error::{PluginError, Result};
use crate::property::PropertyList;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

pub type PluginTaskPtr = Rc<RefCell<PluginTask>>;
pub type TaskWorkerPtr = Rc<RefCell<dyn TaskWorker>>;

/// Last known state of an input channel, as reported by the host
#[derive(Debug, Clone, PartialEq)]
pub struct InputChannelState {
    pub valid: bool,
    pub properties: PropertyList,
}

impl Default for InputChannelState {
    fn default() -> Self {
        Self {
            valid: true,
            properties: PropertyList::new(),
        }
    }
}

/// Input channel states keyed by global channel id
pub type InputStates = BTreeMap<u64, InputChannelState>;

/// Host acquisition clock at the time of a processing call
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MasterTimestamp {
    pub ticks: u64,
    pub frequency: f64,
}

impl MasterTimestamp {
    pub fn new(ticks: u64, frequency: f64) -> Self {
        Self { ticks, frequency }
    }

    /// Current time in seconds
    pub fn seconds(&self) -> f64 {
        if self.frequency > 0.0 {
            self.ticks as f64 / self.frequency
        } else {
            0.0
        }
    }
}

/// Per-call processing context
#[derive(Debug, Clone, Copy)]
pub struct ProcessContext {
    pub task_id: u64,
    pub timestamp: MasterTimestamp,
}

/// Channel-specific logic driven by a task.
///
/// Workers run on the registry's owner thread. A worker may reconfigure
/// the task's output channels from `update`, but must not borrow the task
/// itself mutably.
pub trait TaskWorker {
    /// Recompute derived state after configuration or inputs changed.
    /// The return value becomes the task's validity.
    fn update(&mut self, task: &PluginTask, inputs: &InputStates) -> bool;

    /// Produce samples up to `ctx.timestamp`
    fn process(&mut self, ctx: &ProcessContext, host: &dyn Host);

    /// Output generation stops; configuration is kept
    fn on_pause(&mut self) {}

    fn on_resume(&mut self) {}
}

/// A unit of work with declared inputs and owned output channels
pub struct PluginTask {
    id: u64,
    token: u64,
    input_channels: BTreeSet<u64>,
    output_channels: Vec<PluginChannelPtr>,
    valid: bool,
    paused: bool,
    worker: TaskWorkerPtr,
    listener: Option<Rc<dyn TaskChangeListener>>,
}

impl std::fmt::Debug for PluginTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginTask")
            .field("id", &self.id)
            .field("token", &self.token)
            .field("inputs", &self.input_channels)
            .field("outputs", &self.output_ids())
            .field("valid", &self.valid)
            .field("paused", &self.paused)
            .finish()
    }
}

impl PluginTask {
    pub fn new(id: u64, worker: TaskWorkerPtr, token: u64) -> Self {
        Self {
            id,
            token,
            input_channels: BTreeSet::new(),
            output_channels: Vec::new(),
            valid: true,
            paused: false,
            worker,
            listener: None,
        }
    }

    pub(crate) fn set_change_listener(&mut self, listener: Option<Rc<dyn TaskChangeListener>>) {
        self.listener = listener;
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Opaque caller tag given at creation
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn worker(&self) -> TaskWorkerPtr {
        Rc::clone(&self.worker)
    }

    // ── Inputs ──

    pub fn add_input_channel(&mut self, channel_id: u64) {
        if self.input_channels.insert(channel_id) {
            self.inputs_changed();
        }
    }

    pub fn clear_all_input_channels(&mut self) {
        if !self.input_channels.is_empty() {
            self.input_channels.clear();
            self.inputs_changed();
        }
    }

    pub fn input_channels(&self) -> &BTreeSet<u64> {
        &self.input_channels
    }

    fn inputs_changed(&self) {
        if let Some(listener) = &self.listener {
            listener.on_task_input_channels_changed(self.id);
        }
    }

    // ── Outputs ──

    /// Take ownership of `channel` as an output.
    /// Fails if another task already owns it.
    pub fn add_output_channel(&mut self, channel: &PluginChannelPtr) -> Result<()> {
        let local_id = {
            let mut ch = channel.borrow_mut();
            match ch.owner_task() {
                Some(owner) if owner != self.id => {
                    return Err(PluginError::ChannelOwned {
                        channel: ch.local_id(),
                        task: owner,
                    })
                }
                Some(_) => return Ok(()),
                None => ch.set_owner_task(Some(self.id)),
            }
            ch.local_id()
        };
        self.output_channels.push(Rc::clone(channel));
        if let Some(listener) = &self.listener {
            listener.on_task_channel_added(self.id, local_id);
        }
        Ok(())
    }

    /// Detach `channel`. The channel stays registered; removing it from
    /// the registry is up to the caller.
    pub fn remove_output_channel(&mut self, channel: &PluginChannelPtr) -> bool {
        let Some(index) = self
            .output_channels
            .iter()
            .position(|c| Rc::ptr_eq(c, channel))
        else {
            return false;
        };
        let removed = self.output_channels.remove(index);
        let local_id = {
            let mut ch = removed.borrow_mut();
            ch.set_owner_task(None);
            ch.local_id()
        };
        if let Some(listener) = &self.listener {
            listener.on_task_channel_removed(self.id, local_id);
        }
        true
    }

    pub fn output_channels(&self) -> &[PluginChannelPtr] {
        &self.output_channels
    }

    pub fn output_ids(&self) -> Vec<u32> {
        self.output_channels
            .iter()
            .map(|c| c.borrow().local_id())
            .collect()
    }

    // ── State ──

    /// Stays in effect until explicitly changed
    pub fn set_valid(&mut self, valid: bool) {
        if self.valid != valid {
            self.valid = valid;
            if let Some(listener) = &self.listener {
                listener.on_task_validity_changed(self.id);
            }
        }
    }

    /// Own flag AND every output channel valid
    pub fn is_valid(&self) -> bool {
        self.valid && self.output_channels.iter().all(|c| c.borrow().is_valid())
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub(crate) fn to_info(&self) -> PluginTaskInfo {
        PluginTaskInfo {
            id: self.id,
            token: self.token,
            valid: self.is_valid(),
            input_channels: self.input_channels.iter().copied().collect(),
            output_channels: self.output_ids(),
        }
    }
}
