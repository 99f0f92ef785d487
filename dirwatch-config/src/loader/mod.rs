pub mod error;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use once_cell::sync::Lazy;
use tracing::debug;

use self::error::ConfigLoadError;
use crate::models::sources::{EnvConfig, FileConfig};
use crate::models::{
    Config, ConfigMetadata, DEFAULT_HOST, DEFAULT_MAGIC_WORD, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_PORT, DEFAULT_RECONCILE_ATTEMPTS, DEFAULT_RECONCILE_BACKOFF, DEFAULT_SCAN_INTERVAL,
    DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_WATCH_DIRECTORY, DatabaseConfig, ReconcileConfig,
    ServerConfig, WatchConfig,
};
use crate::util::parse_duration;
use crate::validation::{self, ConfigWarnings};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("dirwatch.toml"),
        PathBuf::from("config/dirwatch.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Skip the `.env` file entirely.
    pub skip_env_file: bool,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn without_env_file(mut self) -> Self {
        self.options.skip_env_file = true;
        self
    }

    /// Load `.env`, then resolve the process environment over the config file
    /// over defaults.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;
        self.load_from(EnvConfig::gather(), env_file_loaded)
    }

    /// Resolve against an explicit environment snapshot.
    pub fn load_from(
        &self,
        env: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        self.compose_config(file_config, env, config_path, env_file_loaded)
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        if self.options.skip_env_file {
            return Ok(false);
        }

        let loaded = match &self.options.env_file {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingEnvFile { path: path.clone() });
            }
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };

        match loaded {
            Ok(loaded) => Ok(loaded),
            Err(dotenvy::Error::Io(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = match (&self.options.config_path, &env.config_path) {
            (Some(path), _) | (None, Some(path)) => (path.clone(), true),
            (None, None) => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(path) => (path.clone(), false),
                None => return Ok((None, None)),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents = fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
            path: path.clone(),
            source: err,
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;

        debug!(path = %path.display(), "loaded configuration file");
        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file_config: Option<FileConfig>,
        env: EnvConfig,
        config_path: Option<PathBuf>,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();

        if config_path.is_none() {
            warnings.push_with_hint(
                "No dirwatch.toml detected; falling back to environment variables",
                "Create dirwatch.toml or point DIRWATCH_CONFIG at a configuration file",
            );
        }

        let FileConfig {
            server: file_server,
            database: file_database,
            watch: file_watch,
            reconcile: file_reconcile,
        } = file_config.unwrap_or_default();

        let server = ServerConfig {
            host: env
                .server_host
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: env.server_port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        };

        let database = DatabaseConfig {
            primary_url: env
                .database_url
                .or(file_database.url)
                .filter(|url| !url.trim().is_empty()),
            max_connections: env
                .database_max_connections
                .or(file_database.max_connections)
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
        };

        let watch = WatchConfig {
            directory: env
                .watch_directory
                .or(file_watch.directory)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WATCH_DIRECTORY)),
            magic_word: env
                .watch_magic_word
                .or(file_watch.magic_word)
                .unwrap_or_else(|| DEFAULT_MAGIC_WORD.to_string()),
            scan_interval: duration_value(
                "WATCH_SCAN_INTERVAL",
                env.watch_scan_interval.or(file_watch.scan_interval),
                DEFAULT_SCAN_INTERVAL,
            )?,
            auto_start: env.watch_auto_start.or(file_watch.auto_start).unwrap_or(false),
            shutdown_timeout: duration_value(
                "WATCH_SHUTDOWN_TIMEOUT",
                env.watch_shutdown_timeout.or(file_watch.shutdown_timeout),
                DEFAULT_SHUTDOWN_TIMEOUT,
            )?,
        };

        let reconcile = ReconcileConfig {
            max_attempts: env
                .reconcile_max_attempts
                .or(file_reconcile.max_attempts)
                .unwrap_or(DEFAULT_RECONCILE_ATTEMPTS),
            backoff: env
                .reconcile_backoff_ms
                .or(file_reconcile.backoff_ms)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_RECONCILE_BACKOFF),
        };

        let config = Config {
            server,
            database,
            watch,
            reconcile,
            metadata: ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        };

        warnings.extend(validation::apply_guard_rails(&config)?);

        Ok(ConfigLoad { config, warnings })
    }
}

fn duration_value(
    key: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    match raw {
        Some(raw) => parse_duration(&raw).map_err(|err| ConfigLoadError::InvalidValue {
            key,
            message: format!("'{raw}': {err}"),
        }),
        None => Ok(default),
    }
}
