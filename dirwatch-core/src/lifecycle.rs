//! Start/stop coordination of the two discovery workers.
//!
//! Both workers of one run share a single [`CancellationToken`]; stopping the
//! task cancels it and waits for both join handles. A fresh token is minted
//! on every start, so a stopped run can never be revived by accident.
//!
//! Two locks: `running` guards the current run and is only held briefly;
//! `transition` serializes start against an in-progress stop, so status reads
//! never wait on a shutdown.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{DirwatchError, Result};
use crate::reconcile::Reconciler;
use crate::scan::{ScanSummary, TreeScanner};
use crate::settings::{SettingsHandle, WatchSettings};
use crate::watch::EventWatcher;
use crate::worker::{StateReporter, WorkerState};

pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Point-in-time view of the task.
#[derive(Debug, Clone)]
pub struct TaskStatus {
    pub running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub watcher: WorkerState,
    pub scanner: WorkerState,
    pub settings: Arc<WatchSettings>,
}

struct RunningTask {
    token: CancellationToken,
    watcher: JoinHandle<()>,
    scanner: JoinHandle<()>,
    started_at: DateTime<Utc>,
}

pub struct TaskCoordinator {
    reconciler: Arc<Reconciler>,
    settings: SettingsHandle,
    shutdown_timeout: Duration,
    watcher_state: StateReporter,
    scanner_state: StateReporter,
    running: Mutex<Option<RunningTask>>,
    transition: Mutex<()>,
}

impl fmt::Debug for TaskCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let running = self
            .running
            .try_lock()
            .map(|guard| guard.is_some())
            .ok();
        f.debug_struct("TaskCoordinator")
            .field("settings", &self.settings)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("watcher_state", &self.watcher_state.current())
            .field("scanner_state", &self.scanner_state.current())
            .field("running", &running)
            .finish_non_exhaustive()
    }
}

impl TaskCoordinator {
    pub fn new(reconciler: Arc<Reconciler>, settings: WatchSettings) -> Self {
        Self::with_settings_handle(reconciler, SettingsHandle::new(settings))
    }

    pub fn with_settings_handle(reconciler: Arc<Reconciler>, settings: SettingsHandle) -> Self {
        Self {
            reconciler,
            settings,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            watcher_state: StateReporter::new(),
            scanner_state: StateReporter::new(),
            running: Mutex::new(None),
            transition: Mutex::new(()),
        }
    }

    pub fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    /// Spawn the watcher and the scanner and return without waiting for
    /// either to make progress.
    pub async fn start(&self) -> Result<()> {
        let _transition = self.transition.lock().await;
        let mut guard = self.running.lock().await;
        if guard.is_some() {
            return Err(DirwatchError::AlreadyRunning);
        }

        let token = CancellationToken::new();
        let snapshot = self.settings.snapshot();
        self.watcher_state.set(WorkerState::Idle);
        self.scanner_state.set(WorkerState::Idle);

        let watcher = EventWatcher::new(Arc::clone(&self.reconciler), self.watcher_state.clone());
        let watcher_token = token.clone();
        let watcher_settings = Arc::clone(&snapshot);
        let watcher = tokio::spawn(async move {
            // Registration failures are logged by the worker itself.
            let _ = watcher.run(watcher_settings, watcher_token).await;
        });

        let scanner = TreeScanner::new(Arc::clone(&self.reconciler)).run_periodic(
            self.settings.clone(),
            token.clone(),
            self.scanner_state.clone(),
        );
        let scanner = tokio::spawn(scanner);

        let started_at = Utc::now();
        *guard = Some(RunningTask {
            token,
            watcher,
            scanner,
            started_at,
        });

        info!(
            target: "dirwatch::lifecycle",
            root = %snapshot.directory_root.display(),
            magic_word = %snapshot.magic_word,
            scan_interval_ms = snapshot.scan_interval.as_millis() as u64,
            "watch task started"
        );
        Ok(())
    }

    /// Cancel both workers and wait for them, each bounded by the shutdown
    /// timeout. Stopping an idle coordinator is a no-op. The task reports as
    /// not running as soon as the stop begins.
    pub async fn stop(&self) -> Result<()> {
        let _transition = self.transition.lock().await;
        let taken = self.running.lock().await.take();
        let Some(task) = taken else {
            debug!(target: "dirwatch::lifecycle", "stop requested while idle");
            return Ok(());
        };

        info!(target: "dirwatch::lifecycle", "stopping watch task");
        task.token.cancel();

        let (watcher, scanner) = future::join(
            self.join_worker("watcher", task.watcher),
            self.join_worker("scanner", task.scanner),
        )
        .await;

        info!(target: "dirwatch::lifecycle", "watch task stopped");
        watcher.and(scanner)
    }

    async fn join_worker(&self, worker: &'static str, mut handle: JoinHandle<()>) -> Result<()> {
        match tokio::time::timeout(self.shutdown_timeout, &mut handle).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => {
                warn!(target: "dirwatch::lifecycle", worker, error = %err, "worker task failed");
                Err(DirwatchError::Internal(format!("{worker} task failed: {err}")))
            }
            Err(_) => {
                warn!(
                    target: "dirwatch::lifecycle",
                    worker,
                    timeout_ms = self.shutdown_timeout.as_millis() as u64,
                    "worker did not stop in time; aborting"
                );
                handle.abort();
                Ok(())
            }
        }
    }

    /// Replace directory and magic word. A running scanner picks the change
    /// up on its next cycle; the watcher keeps its registration until the
    /// task is restarted.
    pub fn configure(
        &self,
        directory_root: impl Into<PathBuf>,
        magic_word: impl Into<String>,
    ) -> Result<Arc<WatchSettings>> {
        let next = self.settings.configure(directory_root, magic_word)?;
        info!(
            target: "dirwatch::lifecycle",
            root = %next.directory_root.display(),
            magic_word = %next.magic_word,
            "watch settings updated"
        );
        Ok(next)
    }

    pub async fn status(&self) -> TaskStatus {
        let started_at = self.running.lock().await.as_ref().map(|task| task.started_at);
        TaskStatus {
            running: started_at.is_some(),
            started_at,
            watcher: self.watcher_state.current(),
            scanner: self.scanner_state.current(),
            settings: self.settings.snapshot(),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// One scan cycle against the current settings, outside the periodic
    /// schedule.
    pub async fn scan_now(&self) -> Result<ScanSummary> {
        let snapshot = self.settings.snapshot();
        TreeScanner::new(Arc::clone(&self.reconciler))
            .scan_once(&snapshot)
            .await
    }

    pub fn subscribe_watcher_state(&self) -> watch::Receiver<WorkerState> {
        self.watcher_state.subscribe()
    }

    pub fn subscribe_scanner_state(&self) -> watch::Receiver<WorkerState> {
        self.scanner_state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;

    fn coordinator(root: &std::path::Path) -> TaskCoordinator {
        let reconciler = Arc::new(Reconciler::new(Arc::new(InMemoryCatalog::new())));
        TaskCoordinator::new(
            reconciler,
            WatchSettings::new(root, "magic", Duration::from_secs(3600)),
        )
        .with_shutdown_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(dir.path());

        coordinator.start().await.unwrap();
        assert!(matches!(
            coordinator.start().await,
            Err(DirwatchError::AlreadyRunning)
        ));

        coordinator.stop().await.unwrap();
        assert!(!coordinator.is_running().await);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(dir.path());

        coordinator.stop().await.unwrap();
        coordinator.start().await.unwrap();
        coordinator.stop().await.unwrap();
        coordinator.stop().await.unwrap();

        let status = coordinator.status().await;
        assert!(!status.running);
        assert_eq!(status.scanner, WorkerState::Stopped);
    }

    #[tokio::test]
    async fn restart_after_stop_runs_again() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(dir.path());

        coordinator.start().await.unwrap();
        coordinator.stop().await.unwrap();
        coordinator.start().await.unwrap();

        let status = coordinator.status().await;
        assert!(status.running);
        assert!(status.started_at.is_some());
        coordinator.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_does_not_hang_when_watcher_failed() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(&dir.path().join("missing"));

        coordinator.start().await.unwrap();
        let mut watcher = coordinator.subscribe_watcher_state();
        watcher
            .wait_for(|state| *state == WorkerState::Failed)
            .await
            .unwrap();

        coordinator.stop().await.unwrap();
        assert_eq!(coordinator.status().await.watcher, WorkerState::Failed);
    }

    #[tokio::test]
    async fn configure_swaps_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(dir.path());

        coordinator.configure("/elsewhere", "wizard").unwrap();
        let status = coordinator.status().await;
        assert_eq!(status.settings.directory_root, PathBuf::from("/elsewhere"));
        assert_eq!(status.settings.magic_word, "wizard");
        assert!(coordinator.configure("/elsewhere", "").is_err());
    }
}
