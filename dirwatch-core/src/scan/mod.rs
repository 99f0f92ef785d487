//! Periodic full-tree scan.
//!
//! Every `scan_interval` the scanner walks the configured root, counts the
//! magic word in each regular file and feeds the count to the reconciler.
//! Per-file failures skip the file; a directory that cannot be traversed
//! aborts the cycle and the next tick starts over.

pub mod count;

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::spawn_blocking;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::error::{DirwatchError, Result};
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::settings::{SettingsHandle, WatchSettings};
use crate::worker::{StateReporter, WorkerState};

const WALK_CHANNEL_CAPACITY: usize = 256;

/// Per-cycle tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub root: PathBuf,
    /// Regular files whose content was read and reconciled.
    pub visited: u64,
    pub created: u64,
    pub updated: u64,
    pub marked_deleted: u64,
    pub unchanged: u64,
    /// Files that could not be read.
    pub skipped: u64,
    /// Files whose reconciliation failed after retries.
    pub failed: u64,
}

impl ScanSummary {
    fn record(&mut self, outcome: ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Created => self.created += 1,
            ReconcileOutcome::Updated => self.updated += 1,
            ReconcileOutcome::MarkedDeleted => self.marked_deleted += 1,
            ReconcileOutcome::Noop => self.unchanged += 1,
        }
    }
}

enum WalkItem {
    File { path: PathBuf, count: u64 },
    Unreadable { path: PathBuf, error: String },
    Aborted(DirwatchError),
}

/// Walks a tree once per call and reconciles what it finds.
#[derive(Debug, Clone)]
pub struct TreeScanner {
    reconciler: Arc<Reconciler>,
}

impl TreeScanner {
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        Self { reconciler }
    }

    /// Run one full cycle against `settings`. The path set is fixed by the
    /// snapshot; reconfiguring mid-cycle does not affect it.
    pub async fn scan_once(&self, settings: &WatchSettings) -> Result<ScanSummary> {
        if settings.magic_word.is_empty() {
            return Err(DirwatchError::EmptyMagicWord);
        }

        let root = settings.resolved_root();
        let magic_word = settings.magic_word.clone();
        let mut summary = ScanSummary {
            root: root.clone(),
            ..ScanSummary::default()
        };

        let (tx, mut rx) = mpsc::channel(WALK_CHANNEL_CAPACITY);
        let walker = spawn_blocking(move || walk_tree(root, &magic_word, tx));

        let mut aborted = None;
        while let Some(item) = rx.recv().await {
            match item {
                WalkItem::File { path, count } => {
                    summary.visited += 1;
                    match self.reconciler.reconcile(&path, count).await {
                        Ok(outcome) => summary.record(outcome),
                        Err(err) => {
                            summary.failed += 1;
                            error!(
                                target: "dirwatch::scan",
                                path = %path.display(),
                                error = %err,
                                "failed to reconcile file; skipping"
                            );
                        }
                    }
                }
                WalkItem::Unreadable { path, error } => {
                    summary.skipped += 1;
                    warn!(
                        target: "dirwatch::scan",
                        path = %path.display(),
                        error = %error,
                        "error reading file; skipping"
                    );
                }
                WalkItem::Aborted(err) => {
                    aborted = Some(err);
                    break;
                }
            }
        }
        drop(rx);

        walker
            .await
            .map_err(|err| DirwatchError::Internal(format!("directory walk panicked: {err}")))?;

        match aborted {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }

    /// Tick every `scan_interval` until `shutdown` fires. A cycle that has
    /// started always runs to completion.
    pub async fn run_periodic(
        self,
        settings: SettingsHandle,
        shutdown: CancellationToken,
        state: StateReporter,
    ) {
        let period = settings.snapshot().scan_interval.max(std::time::Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            target: "dirwatch::scan",
            interval_ms = period.as_millis() as u64,
            "periodic scanner started"
        );
        state.set(WorkerState::Waiting);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!(
                        target: "dirwatch::scan",
                        "received cancellation; periodic scanner stopping"
                    );
                    break;
                }
                _ = ticker.tick() => {
                    let snapshot = settings.snapshot();
                    state.set(WorkerState::Scanning);
                    debug!(
                        target: "dirwatch::scan",
                        root = %snapshot.directory_root.display(),
                        "performing file search"
                    );

                    match self.scan_once(&snapshot).await {
                        Ok(summary) => info!(
                            target: "dirwatch::scan",
                            root = %summary.root.display(),
                            visited = summary.visited,
                            created = summary.created,
                            updated = summary.updated,
                            marked_deleted = summary.marked_deleted,
                            skipped = summary.skipped,
                            failed = summary.failed,
                            "scan cycle complete"
                        ),
                        Err(err) => error!(
                            target: "dirwatch::scan",
                            error = %err,
                            "scan cycle aborted; retrying on next tick"
                        ),
                    }

                    state.set(WorkerState::Waiting);
                }
            }
        }

        state.set(WorkerState::Stopped);
    }
}

fn walk_tree(root: PathBuf, magic_word: &str, tx: mpsc::Sender<WalkItem>) {
    for entry in WalkDir::new(&root).follow_links(false) {
        let item = match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let path = entry.into_path();
                match count::count_in_file(&path, magic_word) {
                    Ok(count) => WalkItem::File { path, count },
                    Err(err) => WalkItem::Unreadable {
                        path,
                        error: err.to_string(),
                    },
                }
            }
            Ok(_) => continue,
            Err(err) if aborts_cycle(&err) => {
                let path = err.path().map(PathBuf::from).unwrap_or_else(|| root.clone());
                let _ = tx.blocking_send(WalkItem::Aborted(DirwatchError::Traversal {
                    path,
                    message: err.to_string(),
                }));
                return;
            }
            Err(err) => WalkItem::Unreadable {
                path: err.path().map(PathBuf::from).unwrap_or_else(|| root.clone()),
                error: err.to_string(),
            },
        };

        if tx.blocking_send(item).is_err() {
            return;
        }
    }
}

/// The root itself, or any directory whose listing fails, ends the cycle.
/// Errors on individual non-directory entries only skip that entry.
fn aborts_cycle(err: &walkdir::Error) -> bool {
    err.depth() == 0 || err.path().is_some_and(|path| path.is_dir())
}
