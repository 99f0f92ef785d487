use async_trait::async_trait;

use crate::catalog::model::{FileRecord, FileStatus};
use crate::error::Result;

/// Repository for the file catalog.
///
/// Every method is an independent round-trip; there is no transaction
/// spanning two calls. Implementations must tolerate concurrent use from the
/// watcher, the scanner and request handlers, and must enforce at most one
/// record per `name`.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn exists(&self, name: &str) -> Result<bool>;

    async fn find(&self, name: &str) -> Result<Option<FileRecord>>;

    /// Create an `active` record. Returns `None` without writing when a
    /// record with the same `name` already exists.
    async fn insert(&self, name: &str, magic_word_count: i64) -> Result<Option<FileRecord>>;

    /// Set status and count and refresh `modified_at`. Returns `false` when
    /// no record matched `name`.
    async fn update_status(
        &self,
        name: &str,
        status: FileStatus,
        magic_word_count: i64,
    ) -> Result<bool>;

    /// All records ordered by id.
    async fn list(&self) -> Result<Vec<FileRecord>>;

    /// Number of records, active and deleted.
    async fn count(&self) -> Result<u64> {
        Ok(self.list().await?.len() as u64)
    }

    /// Records whose `name` starts with `prefix`, ordered by id.
    async fn list_with_prefix(&self, prefix: &str) -> Result<Vec<FileRecord>> {
        let mut records = self.list().await?;
        records.retain(|record| record.name.starts_with(prefix));
        Ok(records)
    }
}
