use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Lifecycle state of a discovery worker.
///
/// Watcher: `Idle -> Watching -> (Stopped | Failed)`.
/// Scanner: `Idle -> Waiting <-> Scanning -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Idle,
    Watching,
    Waiting,
    Scanning,
    Stopped,
    Failed,
}

impl WorkerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Stopped | WorkerState::Failed)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkerState::Idle => "idle",
            WorkerState::Watching => "watching",
            WorkerState::Waiting => "waiting",
            WorkerState::Scanning => "scanning",
            WorkerState::Stopped => "stopped",
            WorkerState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Publishes a worker's state; cheap to clone into the worker task.
#[derive(Clone, Debug)]
pub struct StateReporter {
    tx: Arc<watch::Sender<WorkerState>>,
}

impl StateReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(WorkerState::Idle);
        Self { tx: Arc::new(tx) }
    }

    pub fn set(&self, state: WorkerState) {
        self.tx.send_replace(state);
    }

    pub fn current(&self) -> WorkerState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.tx.subscribe()
    }
}

impl Default for StateReporter {
    fn default() -> Self {
        Self::new()
    }
}
