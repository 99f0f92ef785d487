pub mod sources;

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_WATCH_DIRECTORY: &str = "TestDirectory";
pub const DEFAULT_MAGIC_WORD: &str = "magic";
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_RECONCILE_ATTEMPTS: u32 = 3;
pub const DEFAULT_RECONCILE_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub watch: WatchConfig,
    pub reconcile: ReconcileConfig,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `None` runs the catalog in memory.
    pub primary_url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub directory: PathBuf,
    pub magic_word: String,
    pub scan_interval: Duration,
    /// Start the watch task as soon as the server is up.
    pub auto_start: bool,
    pub shutdown_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    pub max_attempts: u32,
    pub backoff: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
