use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{FileRecord, FileStatus};
use crate::lifecycle::TaskStatus;
use crate::settings::WatchSettings;
use crate::worker::WorkerState;

// ===== Response Envelope =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn error(error: String) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(error),
            message: None,
        }
    }

    pub fn with_message(mut self, message: String) -> Self {
        self.message = Some(message);
        self
    }
}

// ===== Task Types =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureTaskRequest {
    pub directory_name: String,
    pub magic_word: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub directory_name: String,
    pub magic_word: String,
    pub scan_interval_ms: u64,
}

impl From<&WatchSettings> for SettingsView {
    fn from(settings: &WatchSettings) -> Self {
        Self {
            directory_name: settings.directory_root.display().to_string(),
            magic_word: settings.magic_word.clone(),
            scan_interval_ms: settings.scan_interval.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusView {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub watcher: WorkerState,
    pub scanner: WorkerState,
    pub settings: SettingsView,
}

impl From<TaskStatus> for TaskStatusView {
    fn from(status: TaskStatus) -> Self {
        Self {
            running: status.running,
            started_at: status.started_at,
            watcher: status.watcher,
            scanner: status.scanner,
            settings: SettingsView::from(status.settings.as_ref()),
        }
    }
}

// ===== File Listing =====

/// Catalog entry as listed over HTTP; `name` is the last path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetails {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub status: FileStatus,
    pub count_of_magic_word: i64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<FileRecord> for FileDetails {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            name: record.display_name().to_string(),
            status: record.status,
            count_of_magic_word: record.magic_word_count,
            created_at: record.created_at,
            modified_at: record.modified_at,
            path: record.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesResponse {
    pub file_details: Vec<FileDetails>,
}

impl FromIterator<FileRecord> for FilesResponse {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        Self {
            file_details: iter.into_iter().map(FileDetails::from).collect(),
        }
    }
}
