use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::catalog::model::{FileRecord, FileStatus};
use crate::catalog::ports::CatalogRepository;
use crate::error::{DirwatchError, Result};

const RECORD_COLUMNS: &str = "id, name, status, magic_word_count, created_at, modified_at";

/// PostgreSQL-backed catalog. Uniqueness on `name` is a table constraint, so
/// a losing concurrent insert degrades to `None` instead of a duplicate row.
#[derive(Clone, Debug)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply pending schema migrations.
    pub async fn initialize_schema(&self) -> Result<()> {
        crate::MIGRATOR.run(&self.pool).await?;
        info!(target: "dirwatch::catalog", "catalog schema up to date");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FileRow {
    id: i64,
    name: String,
    status: String,
    magic_word_count: i64,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl TryFrom<FileRow> for FileRecord {
    type Error = DirwatchError;

    fn try_from(row: FileRow) -> Result<Self> {
        Ok(FileRecord {
            id: row.id,
            status: row.status.parse()?,
            name: row.name,
            magic_word_count: row.magic_word_count,
            created_at: row.created_at,
            modified_at: row.modified_at,
        })
    }
}

#[async_trait]
impl CatalogRepository for PostgresCatalog {
    async fn exists(&self, name: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM files WHERE name = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn find(&self, name: &str) -> Result<Option<FileRecord>> {
        let row = sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM files WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(FileRecord::try_from).transpose()
    }

    async fn insert(&self, name: &str, magic_word_count: i64) -> Result<Option<FileRecord>> {
        let row = sqlx::query_as::<_, FileRow>(&format!(
            r#"
            INSERT INTO files (name, status, magic_word_count, created_at, modified_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (name) DO NOTHING
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(FileStatus::Active.as_str())
        .bind(magic_word_count)
        .fetch_optional(&self.pool)
        .await?;
        row.map(FileRecord::try_from).transpose()
    }

    async fn update_status(
        &self,
        name: &str,
        status: FileStatus,
        magic_word_count: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE files
            SET status = $2, magic_word_count = $3, modified_at = NOW()
            WHERE name = $1
            "#,
        )
        .bind(name)
        .bind(status.as_str())
        .bind(magic_word_count)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<FileRecord>> {
        let rows = sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM files ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(FileRecord::try_from).collect()
    }

    async fn count(&self) -> Result<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn list_with_prefix(&self, prefix: &str) -> Result<Vec<FileRecord>> {
        let rows = sqlx::query_as::<_, FileRow>(&format!(
            r#"
            SELECT {RECORD_COLUMNS} FROM files
            WHERE left(name, char_length($1)) = $1
            ORDER BY id
            "#
        ))
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(FileRecord::try_from).collect()
    }
}
