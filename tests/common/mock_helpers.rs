//! Mock construction helpers

use plugin_channels::channels::{
    Host, HostMessage, HostMessageId, InputStates, PluginTask, ProcessContext, TaskWorker,
    TaskWorkerPtr,
};
use plugin_channels::error::{error_codes, Result};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Host that records everything and answers with a configurable status
#[derive(Debug)]
pub struct RecordingHost {
    status: AtomicU64,
    messages: Mutex<Vec<HostMessage>>,
    samples: Mutex<Vec<(u32, u64, Vec<u8>)>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            status: AtomicU64::new(error_codes::OK),
            messages: Mutex::new(Vec::new()),
            samples: Mutex::new(Vec::new()),
        }
    }

    /// Status returned from subsequent `message_sync` calls
    pub fn respond_with(&self, status: u64) {
        self.status.store(status, Ordering::SeqCst);
    }

    pub fn take_messages(&self) -> Vec<HostMessage> {
        std::mem::take(&mut *self.messages.lock().unwrap())
    }

    pub fn message_ids(&self) -> Vec<HostMessageId> {
        self.messages.lock().unwrap().iter().map(|m| m.id).collect()
    }

    pub fn samples(&self) -> Vec<(u32, u64, Vec<u8>)> {
        self.samples.lock().unwrap().clone()
    }
}

impl Host for RecordingHost {
    fn message_sync(&self, message: HostMessage) -> Result<u64> {
        self.messages.lock().unwrap().push(message);
        Ok(self.status.load(Ordering::SeqCst))
    }

    fn add_samples(&self, local_id: u32, tick: u64, data: &[u8]) {
        self.samples
            .lock()
            .unwrap()
            .push((local_id, tick, data.to_vec()));
    }

    fn add_sample(&self, local_id: u32, tick: u64, data: &[u8]) {
        self.add_samples(local_id, tick, data);
    }
}

/// Observable state of a [`ScriptedWorker`]
#[derive(Debug, Default)]
pub struct WorkerProbe {
    pub updates: Cell<usize>,
    pub processed: RefCell<Vec<u64>>,
    pub pauses: Cell<usize>,
    pub resumes: Cell<usize>,
}

/// Worker whose `update` answer is scripted by the test
pub struct ScriptedWorker {
    valid: Rc<Cell<bool>>,
    probe: Rc<WorkerProbe>,
}

impl ScriptedWorker {
    /// Returns the worker handle, its validity switch and its probe
    pub fn create() -> (TaskWorkerPtr, Rc<Cell<bool>>, Rc<WorkerProbe>) {
        let valid = Rc::new(Cell::new(true));
        let probe = Rc::new(WorkerProbe::default());
        let worker = ScriptedWorker {
            valid: valid.clone(),
            probe: probe.clone(),
        };
        (Rc::new(RefCell::new(worker)), valid, probe)
    }
}

impl TaskWorker for ScriptedWorker {
    fn update(&mut self, _task: &PluginTask, _inputs: &InputStates) -> bool {
        self.probe.updates.set(self.probe.updates.get() + 1);
        self.valid.get()
    }

    fn process(&mut self, ctx: &ProcessContext, host: &dyn Host) {
        self.probe.processed.borrow_mut().push(ctx.timestamp.ticks);
        host.add_sample(0, ctx.timestamp.ticks, &[0]);
    }

    fn on_pause(&mut self) {
        self.probe.pauses.set(self.probe.pauses.get() + 1);
    }

    fn on_resume(&mut self) {
        self.probe.resumes.set(self.probe.resumes.get() + 1);
    }
}
