use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirwatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "database")]
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Failed to watch {path}: {message}")]
    Registration { path: PathBuf, message: String },

    #[error("Failed to traverse {path}: {message}")]
    Traversal { path: PathBuf, message: String },

    #[error("Magic word must not be empty")]
    EmptyMagicWord,

    #[error("Watch task is already running")]
    AlreadyRunning,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DirwatchError {
    /// Whether retrying the same catalog operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            #[cfg(feature = "database")]
            DirwatchError::Database(err) => !matches!(
                err,
                sqlx::Error::RowNotFound
                    | sqlx::Error::ColumnDecode { .. }
                    | sqlx::Error::ColumnNotFound(_)
                    | sqlx::Error::TypeNotFound { .. }
            ),
            DirwatchError::Io(_) | DirwatchError::Internal(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DirwatchError>;
