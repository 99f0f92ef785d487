//! Reconciliation of observed magic-word counts against the catalog.
//!
//! Both discovery paths funnel through [`Reconciler::reconcile`]. The
//! existence check and the follow-up write for a path run under a per-path
//! lock, so the watcher and the scanner cannot both decide to create the same
//! record. The catalog's insert-if-absent contract covers writers outside
//! this process.

use std::fmt;
use std::path::{MAIN_SEPARATOR, Path};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogRepository, FileStatus};
use crate::error::{DirwatchError, Result};

/// Catalog mutation chosen for one `(path, count)` observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Created,
    Updated,
    MarkedDeleted,
    Noop,
}

/// Bounded retry for transient catalog failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; values below 1 behave as 1.
    pub max_attempts: u32,
    /// Linear backoff unit; attempt `n` waits `n * backoff` before retrying.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Wait before retrying after failed attempt `attempt`, saturating
    /// instead of overflowing for very large backoff units.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.checked_mul(attempt).unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(100),
        }
    }
}

pub struct Reconciler {
    catalog: Arc<dyn CatalogRepository>,
    retry: RetryPolicy,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("retry", &self.retry)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self {
            catalog,
            retry: RetryPolicy::default(),
            in_flight: DashMap::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Apply one observation for `path`.
    ///
    /// - `count == 0`: an active record becomes `deleted` with count 0;
    ///   otherwise nothing happens.
    /// - `count > 0`: a missing record is created, an existing one (active
    ///   or deleted) is set `active` with the new count.
    pub async fn reconcile(&self, path: &Path, occurrence_count: u64) -> Result<ReconcileOutcome> {
        let name = path.to_string_lossy().into_owned();
        let count = i64::try_from(occurrence_count).map_err(|_| {
            DirwatchError::InvalidRecord(format!(
                "occurrence count {occurrence_count} for {name} exceeds catalog range"
            ))
        })?;

        let lock = self.path_lock(&name);
        let result = {
            let _guard = lock.lock().await;
            self.apply_with_retry(&name, count).await
        };
        drop(lock);
        self.release_path_lock(&name);

        result
    }

    /// Mark every active record below `dir` deleted. Used when a directory
    /// leaves the tree as a whole, which reports only the directory path.
    pub async fn retire_subtree(&self, dir: &Path) -> Result<u64> {
        let mut prefix = dir.to_string_lossy().into_owned();
        if !prefix.ends_with(MAIN_SEPARATOR) {
            prefix.push(MAIN_SEPARATOR);
        }

        let records = self.catalog.list_with_prefix(&prefix).await?;
        let mut retired = 0;
        for record in records.into_iter().filter(|record| record.is_active()) {
            let outcome = self.reconcile(Path::new(&record.name), 0).await?;
            if outcome == ReconcileOutcome::MarkedDeleted {
                retired += 1;
            }
        }

        if retired > 0 {
            info!(
                target: "dirwatch::reconcile",
                dir = %dir.display(),
                retired,
                "records under removed directory marked deleted"
            );
        }
        Ok(retired)
    }

    fn path_lock(&self, name: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.in_flight
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    fn release_path_lock(&self, name: &str) {
        // Clones are only taken under the shard lock, so a lone map
        // reference means no task holds or awaits this path.
        self.in_flight
            .remove_if(name, |_, lock| Arc::strong_count(lock) == 1);
    }

    async fn apply_with_retry(&self, name: &str, count: i64) -> Result<ReconcileOutcome> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.apply(name, count).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) if attempt < max_attempts && err.is_retryable() => {
                    warn!(
                        target: "dirwatch::reconcile",
                        path = %name,
                        attempt,
                        max_attempts,
                        error = %err,
                        "catalog operation failed; retrying"
                    );
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn apply(&self, name: &str, count: i64) -> Result<ReconcileOutcome> {
        let existing = self.catalog.find(name).await?;

        let outcome = match (existing, count) {
            (None, 0) => ReconcileOutcome::Noop,
            (Some(record), 0) => {
                if !record.is_active() {
                    ReconcileOutcome::Noop
                } else if self
                    .catalog
                    .update_status(name, FileStatus::Deleted, 0)
                    .await?
                {
                    info!(
                        target: "dirwatch::reconcile",
                        path = %name,
                        id = record.id,
                        "file marked deleted"
                    );
                    ReconcileOutcome::MarkedDeleted
                } else {
                    debug!(
                        target: "dirwatch::reconcile",
                        path = %name,
                        "record vanished before removal"
                    );
                    ReconcileOutcome::Noop
                }
            }
            (None, count) => match self.catalog.insert(name, count).await? {
                Some(record) => {
                    info!(
                        target: "dirwatch::reconcile",
                        path = %name,
                        id = record.id,
                        count,
                        "file record created"
                    );
                    ReconcileOutcome::Created
                }
                None => {
                    // Lost the insert to a writer outside this process.
                    self.update_active(name, count).await?
                }
            },
            (Some(_), count) => self.update_active(name, count).await?,
        };

        Ok(outcome)
    }

    async fn update_active(&self, name: &str, count: i64) -> Result<ReconcileOutcome> {
        if self
            .catalog
            .update_status(name, FileStatus::Active, count)
            .await?
        {
            debug!(target: "dirwatch::reconcile", path = %name, count, "file record updated");
            Ok(ReconcileOutcome::Updated)
        } else {
            warn!(target: "dirwatch::reconcile", path = %name, "record vanished before update");
            Ok(ReconcileOutcome::Noop)
        }
    }
}
