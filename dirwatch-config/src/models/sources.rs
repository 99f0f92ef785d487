use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::util::{non_empty, parse_bool};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub watch: FileWatchConfig,
    #[serde(default)]
    pub reconcile: FileReconcileConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileWatchConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magic_word: Option<String>,
    /// Humantime string, e.g. `"5s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown_timeout: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileReconcileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff_ms: Option<u64>,
}

/// Environment-derived configuration values.
///
/// Durations stay raw here; the loader parses them so a malformed value is
/// reported instead of silently ignored.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_url: Option<String>,
    pub database_max_connections: Option<u32>,
    pub watch_directory: Option<PathBuf>,
    pub watch_magic_word: Option<String>,
    pub watch_scan_interval: Option<String>,
    pub watch_auto_start: Option<bool>,
    pub watch_shutdown_timeout: Option<String>,
    pub reconcile_max_attempts: Option<u32>,
    pub reconcile_backoff_ms: Option<u64>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| non_empty(lookup(key));

        Self {
            config_path: var("DIRWATCH_CONFIG").map(PathBuf::from),
            server_host: var("SERVER_HOST"),
            server_port: var("SERVER_PORT").and_then(|s| s.trim().parse().ok()),
            database_url: var("DATABASE_URL"),
            database_max_connections: var("DATABASE_MAX_CONNECTIONS")
                .and_then(|s| s.trim().parse().ok()),
            watch_directory: var("WATCH_DIRECTORY").map(PathBuf::from),
            // Leading/trailing whitespace is part of a magic word.
            watch_magic_word: lookup("WATCH_MAGIC_WORD").filter(|word| !word.is_empty()),
            watch_scan_interval: var("WATCH_SCAN_INTERVAL"),
            watch_auto_start: var("WATCH_AUTO_START").and_then(|s| parse_bool(&s)),
            watch_shutdown_timeout: var("WATCH_SHUTDOWN_TIMEOUT"),
            reconcile_max_attempts: var("RECONCILE_MAX_ATTEMPTS")
                .and_then(|s| s.trim().parse().ok()),
            reconcile_backoff_ms: var("RECONCILE_BACKOFF_MS").and_then(|s| s.trim().parse().ok()),
        }
    }
}
