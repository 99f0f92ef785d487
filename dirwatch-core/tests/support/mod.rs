#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dirwatch_core::{CatalogRepository, FileRecord, FileStatus, InMemoryCatalog, Result};
use parking_lot::Mutex;
use tokio::sync::{Notify, watch};

/// Counts every catalog call; used to prove workers went quiet.
#[derive(Debug, Default)]
pub struct CountingCatalog {
    pub inner: InMemoryCatalog,
    calls: AtomicU64,
}

impl CountingCatalog {
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogRepository for CountingCatalog {
    async fn exists(&self, name: &str) -> Result<bool> {
        self.tick();
        self.inner.exists(name).await
    }

    async fn find(&self, name: &str) -> Result<Option<FileRecord>> {
        self.tick();
        self.inner.find(name).await
    }

    async fn insert(&self, name: &str, count: i64) -> Result<Option<FileRecord>> {
        self.tick();
        self.inner.insert(name, count).await
    }

    async fn update_status(&self, name: &str, status: FileStatus, count: i64) -> Result<bool> {
        self.tick();
        self.inner.update_status(name, status, count).await
    }

    async fn list(&self) -> Result<Vec<FileRecord>> {
        self.inner.list().await
    }
}

/// Holds every `find` until the gate opens, announcing the first arrival.
#[derive(Debug)]
pub struct GatedCatalog {
    pub inner: InMemoryCatalog,
    pub entered: Notify,
    open: watch::Sender<bool>,
}

impl GatedCatalog {
    pub fn new() -> Self {
        let (open, _) = watch::channel(false);
        Self {
            inner: InMemoryCatalog::new(),
            entered: Notify::new(),
            open,
        }
    }

    pub fn open(&self) {
        self.open.send_replace(true);
    }
}

#[async_trait]
impl CatalogRepository for GatedCatalog {
    async fn exists(&self, name: &str) -> Result<bool> {
        self.inner.exists(name).await
    }

    async fn find(&self, name: &str) -> Result<Option<FileRecord>> {
        self.entered.notify_one();
        let mut open = self.open.subscribe();
        let _ = open.wait_for(|open| *open).await;
        self.inner.find(name).await
    }

    async fn insert(&self, name: &str, count: i64) -> Result<Option<FileRecord>> {
        self.inner.insert(name, count).await
    }

    async fn update_status(&self, name: &str, status: FileStatus, count: i64) -> Result<bool> {
        self.inner.update_status(name, status, count).await
    }

    async fn list(&self) -> Result<Vec<FileRecord>> {
        self.inner.list().await
    }
}

/// Store without a uniqueness constraint: `insert` always appends. Any
/// duplicate row it ends up holding was let through by the reconciler.
#[derive(Debug, Default)]
pub struct UnconstrainedCatalog {
    rows: Mutex<Vec<FileRecord>>,
}

#[async_trait]
impl CatalogRepository for UnconstrainedCatalog {
    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.rows.lock().iter().any(|row| row.name == name))
    }

    async fn find(&self, name: &str) -> Result<Option<FileRecord>> {
        let found = self.rows.lock().iter().find(|row| row.name == name).cloned();
        // Widen the check-then-act window.
        tokio::task::yield_now().await;
        Ok(found)
    }

    async fn insert(&self, name: &str, count: i64) -> Result<Option<FileRecord>> {
        let mut rows = self.rows.lock();
        let now = Utc::now();
        let record = FileRecord {
            id: rows.len() as i64 + 1,
            name: name.to_string(),
            status: FileStatus::Active,
            magic_word_count: count,
            created_at: now,
            modified_at: now,
        };
        rows.push(record.clone());
        Ok(Some(record))
    }

    async fn update_status(&self, name: &str, status: FileStatus, count: i64) -> Result<bool> {
        let mut rows = self.rows.lock();
        let mut changed = false;
        for row in rows.iter_mut().filter(|row| row.name == name) {
            row.status = status;
            row.magic_word_count = count;
            row.modified_at = Utc::now();
            changed = true;
        }
        Ok(changed)
    }

    async fn list(&self) -> Result<Vec<FileRecord>> {
        Ok(self.rows.lock().clone())
    }
}
