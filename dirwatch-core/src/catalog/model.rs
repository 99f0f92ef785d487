use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DirwatchError;

/// Presence state of a catalogued path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// The file currently contains the magic word.
    Active,
    /// The file was removed (or lost the magic word). History is kept.
    Deleted,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Active => "active",
            FileStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileStatus {
    type Err = DirwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(FileStatus::Active),
            "deleted" => Ok(FileStatus::Deleted),
            other => Err(DirwatchError::InvalidRecord(format!(
                "unknown file status '{other}'"
            ))),
        }
    }
}

/// One catalog entry per distinct path ever observed with the magic word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: i64,
    /// Absolute path; the natural key.
    pub name: String,
    pub status: FileStatus,
    #[serde(rename = "countOfMagicWord")]
    pub magic_word_count: i64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn is_active(&self) -> bool {
        self.status == FileStatus::Active
    }

    /// Last path segment of `name`, accepting both separator styles.
    pub fn display_name(&self) -> &str {
        self.name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.name.as_str())
    }
}
