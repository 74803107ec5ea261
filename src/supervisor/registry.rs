//! Insertion-ordered bookkeeping of every process a supervisor launched

use crate::error::SupervisorError;
use crate::subprocess::streaming::ExitSlot;

/// Where a launch currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Registered,
    Spawned,
    Streaming,
    Exited,
    /// Streaming stopped on an error before a status was collected.
    Aborted,
}

/// One launched (or launching) process.
///
/// The OS handle itself is owned by the unit of work that drives the process;
/// the record keeps the pid it was spawned with and shares the exit slot the
/// pump writes into.
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    tag: String,
    command_line: String,
    pid: Option<u32>,
    spawned: bool,
    streaming: bool,
    aborted: bool,
    exit: ExitSlot,
}

impl ProcessRecord {
    fn new(tag: &str, command_line: &str) -> Self {
        Self {
            tag: tag.to_string(),
            command_line: command_line.to_string(),
            pid: None,
            spawned: false,
            streaming: false,
            aborted: false,
            exit: ExitSlot::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn status(&self) -> Option<i32> {
        self.exit.get()
    }

    pub fn complete(&self) -> bool {
        self.exit.is_set()
    }

    pub fn running(&self) -> bool {
        self.spawned && !self.aborted && !self.complete()
    }

    pub fn aborted(&self) -> bool {
        self.aborted
    }

    pub fn state(&self) -> LaunchState {
        if self.complete() {
            LaunchState::Exited
        } else if self.aborted {
            LaunchState::Aborted
        } else if self.streaming {
            LaunchState::Streaming
        } else if self.spawned {
            LaunchState::Spawned
        } else {
            LaunchState::Registered
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<ProcessRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    pub fn get(&self, tag: &str) -> Option<&ProcessRecord> {
        self.records.iter().find(|r| r.tag == tag)
    }

    fn get_mut(&mut self, tag: &str) -> Option<&mut ProcessRecord> {
        self.records.iter_mut().find(|r| r.tag == tag)
    }

    /// Claim `tag` for a new launch. Nothing is started here.
    pub fn register(&mut self, tag: &str, command_line: &str) -> Result<ExitSlot, SupervisorError> {
        if self.contains(tag) {
            return Err(SupervisorError::DuplicateTag(tag.to_string()));
        }
        let record = ProcessRecord::new(tag, command_line);
        let slot = record.exit.clone();
        self.records.push(record);
        Ok(slot)
    }

    /// Drop a registration whose process never started.
    pub fn release(&mut self, tag: &str) {
        self.records.retain(|r| r.tag != tag || r.spawned);
    }

    pub fn mark_spawned(&mut self, tag: &str, pid: Option<u32>) {
        if let Some(record) = self.get_mut(tag) {
            record.spawned = true;
            record.pid = pid;
        }
    }

    pub fn mark_streaming(&mut self, tag: &str) {
        if let Some(record) = self.get_mut(tag) {
            record.streaming = true;
        }
    }

    /// The launch lost its process handle without a status being recorded.
    pub fn mark_aborted(&mut self, tag: &str) {
        if let Some(record) = self.get_mut(tag) {
            record.aborted = true;
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn running_count(&self) -> usize {
        self.records.iter().filter(|r| r.running()).count()
    }

    pub fn first(&self) -> Option<&ProcessRecord> {
        self.records.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.records.iter()
    }
}
