//! Live filesystem notification worker.
//!
//! A thin wrapper around `notify`: the watcher thread forwards raw events
//! into a bounded channel and the async loop re-checks each named path before
//! handing the observation to the reconciler. Paths are keyed under the
//! resolved root so they match what the periodic scanner reports.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{CreateKind, EventKind, ModifyKind, RenameMode};
use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{DirwatchError, Result};
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::scan::count::count_in_file;
use crate::settings::WatchSettings;
use crate::worker::{StateReporter, WorkerState};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

enum WatchMessage {
    Event(Event),
    Error(String),
}

impl fmt::Debug for WatchMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchMessage::Event(event) => f
                .debug_struct("WatchMessage::Event")
                .field("kind", &event.kind)
                .field("path_count", &event.paths.len())
                .finish(),
            WatchMessage::Error(message) => f
                .debug_struct("WatchMessage::Error")
                .field("message", message)
                .finish(),
        }
    }
}

/// What a notification asks of the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathChange {
    /// Content may have changed; recount.
    Touched(PathBuf),
    /// The path no longer exists.
    Removed(PathBuf),
}

/// Subscribes to notifications under one directory root and reconciles the
/// files they name.
#[derive(Debug, Clone)]
pub struct EventWatcher {
    reconciler: Arc<Reconciler>,
    state: StateReporter,
}

impl EventWatcher {
    pub fn new(reconciler: Arc<Reconciler>, state: StateReporter) -> Self {
        Self { reconciler, state }
    }

    /// Register on `settings.directory_root` and process notifications until
    /// `shutdown` fires or the notification stream closes. Registration
    /// failure is returned and leaves the worker in `Failed`.
    pub async fn run(
        self,
        settings: Arc<WatchSettings>,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let root = settings.resolved_root();
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let registration_root = root.clone();
        let registration = spawn_blocking(move || register(&registration_root, tx))
            .await
            .map_err(|err| DirwatchError::Internal(format!("watcher registration panicked: {err}")))
            .and_then(|result| result);

        let watcher = match registration {
            Ok(watcher) => watcher,
            Err(err) => {
                error!(
                    target: "dirwatch::watch",
                    root = %root.display(),
                    error = %err,
                    "failed to register directory watcher"
                );
                self.state.set(WorkerState::Failed);
                return Err(err);
            }
        };

        info!(target: "dirwatch::watch", root = %root.display(), "watching directory");
        self.state.set(WorkerState::Watching);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!(target: "dirwatch::watch", "received cancellation; watcher stopping");
                    break;
                }
                message = rx.recv() => match message {
                    Some(WatchMessage::Event(event)) => {
                        for change in classify(event) {
                            self.handle(change, &settings.magic_word).await;
                        }
                    }
                    Some(WatchMessage::Error(message)) => {
                        warn!(target: "dirwatch::watch", error = %message, "notification error");
                    }
                    None => {
                        info!(
                            target: "dirwatch::watch",
                            "notification stream closed; watcher stopping"
                        );
                        break;
                    }
                },
            }
        }

        // Dropping the watcher ends the notify stream.
        drop(watcher);
        self.state.set(WorkerState::Stopped);
        Ok(())
    }

    async fn handle(&self, change: PathChange, magic_word: &str) {
        let (path, count) = match change {
            PathChange::Removed(path) => (path, 0),
            PathChange::Touched(path) => match recount(path.clone(), magic_word.to_string()).await {
                Recount::Counted(count) => (path, count),
                Recount::Missing => (path, 0),
                Recount::NotAFile => {
                    debug!(
                        target: "dirwatch::watch",
                        path = %path.display(),
                        "ignoring non-file path"
                    );
                    return;
                }
                Recount::Failed(err) => {
                    warn!(
                        target: "dirwatch::watch",
                        path = %path.display(),
                        error = %err,
                        "error reading file; skipping"
                    );
                    return;
                }
            },
        };

        match self.reconciler.reconcile(&path, count).await {
            Ok(ReconcileOutcome::Noop) if count == 0 => {
                // No record of its own: the path may have been a directory
                // that left the tree with its files.
                if let Err(err) = self.reconciler.retire_subtree(&path).await {
                    error!(
                        target: "dirwatch::watch",
                        path = %path.display(),
                        error = %err,
                        "failed to retire records under removed path"
                    );
                }
            }
            Ok(outcome) => debug!(
                target: "dirwatch::watch",
                path = %path.display(),
                count,
                outcome = ?outcome,
                "reconciled notification"
            ),
            Err(err) => error!(
                target: "dirwatch::watch",
                path = %path.display(),
                error = %err,
                "failed to reconcile notification; skipping"
            ),
        }
    }
}

enum Recount {
    Counted(u64),
    Missing,
    NotAFile,
    Failed(String),
}

async fn recount(path: PathBuf, magic_word: String) -> Recount {
    let result = spawn_blocking(move || match std::fs::metadata(&path) {
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Recount::Missing,
        Err(err) => Recount::Failed(err.to_string()),
        Ok(meta) if !meta.is_file() => Recount::NotAFile,
        Ok(_) => match count_in_file(&path, &magic_word) {
            Ok(count) => Recount::Counted(count),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Recount::Missing,
            Err(err) => Recount::Failed(err.to_string()),
        },
    })
    .await;

    result.unwrap_or_else(|err| Recount::Failed(format!("recount panicked: {err}")))
}

fn register(root: &Path, tx: mpsc::Sender<WatchMessage>) -> Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<Event, notify::Error>| {
            let message = match res {
                Ok(event) => WatchMessage::Event(event),
                Err(err) => WatchMessage::Error(err.to_string()),
            };
            // The receiver is gone once the worker stopped.
            let _ = tx.blocking_send(message);
        },
        NotifyConfig::default(),
    )
    .map_err(|err| DirwatchError::Registration {
        path: root.to_path_buf(),
        message: err.to_string(),
    })?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|err| DirwatchError::Registration {
            path: root.to_path_buf(),
            message: err.to_string(),
        })?;

    Ok(watcher)
}

fn classify(event: Event) -> Vec<PathChange> {
    let mut paths = event.paths.into_iter();
    match event.kind {
        EventKind::Create(CreateKind::Folder) => Vec::new(),
        EventKind::Create(_)
        | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            paths.map(PathChange::Touched).collect()
        }
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            paths.map(PathChange::Removed).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut changes = Vec::with_capacity(2);
            if let Some(from) = paths.next() {
                changes.push(PathChange::Removed(from));
            }
            if let Some(to) = paths.next() {
                changes.push(PathChange::Touched(to));
            }
            changes
        }
        // Renames of unknown direction: recheck whatever exists now.
        EventKind::Modify(ModifyKind::Name(_)) => paths.map(PathChange::Touched).collect(),
        EventKind::Access(_)
        | EventKind::Modify(ModifyKind::Metadata(_) | ModifyKind::Other)
        | EventKind::Any
        | EventKind::Other => Vec::new(),
    }
}
