use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::catalog::model::{FileRecord, FileStatus};
use crate::catalog::ports::CatalogRepository;
use crate::error::Result;

/// Process-local catalog used by tests and by database-less runs.
///
/// Uniqueness on `name` is enforced under a single lock, so the
/// insert-if-absent contract holds even without a storage constraint.
#[derive(Default)]
pub struct InMemoryCatalog {
    inner: Mutex<CatalogState>,
}

#[derive(Default)]
struct CatalogState {
    next_id: i64,
    records: HashMap<String, FileRecord>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for InMemoryCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(guard) => f
                .debug_struct("InMemoryCatalog")
                .field("records", &guard.records.len())
                .finish(),
            None => f
                .debug_struct("InMemoryCatalog")
                .field("records", &"<locked>")
                .finish(),
        }
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.inner.lock().records.contains_key(name))
    }

    async fn find(&self, name: &str) -> Result<Option<FileRecord>> {
        Ok(self.inner.lock().records.get(name).cloned())
    }

    async fn insert(&self, name: &str, magic_word_count: i64) -> Result<Option<FileRecord>> {
        let mut guard = self.inner.lock();
        if guard.records.contains_key(name) {
            return Ok(None);
        }

        guard.next_id += 1;
        let now = Utc::now();
        let record = FileRecord {
            id: guard.next_id,
            name: name.to_string(),
            status: FileStatus::Active,
            magic_word_count,
            created_at: now,
            modified_at: now,
        };
        guard.records.insert(name.to_string(), record.clone());
        Ok(Some(record))
    }

    async fn update_status(
        &self,
        name: &str,
        status: FileStatus,
        magic_word_count: i64,
    ) -> Result<bool> {
        let mut guard = self.inner.lock();
        let Some(record) = guard.records.get_mut(name) else {
            return Ok(false);
        };
        record.status = status;
        record.magic_word_count = magic_word_count;
        record.modified_at = Utc::now();
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<FileRecord>> {
        let mut records: Vec<_> = self.inner.lock().records.values().cloned().collect();
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.len() as u64)
    }

    async fn list_with_prefix(&self, prefix: &str) -> Result<Vec<FileRecord>> {
        let mut records: Vec<_> = self
            .inner
            .lock()
            .records
            .values()
            .filter(|record| record.name.starts_with(prefix))
            .cloned()
            .collect();
        records.sort_by_key(|record| record.id);
        Ok(records)
    }
}
