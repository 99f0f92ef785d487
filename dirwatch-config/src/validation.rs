use thiserror::Error;

use crate::models::Config;

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("WATCH_MAGIC_WORD must not be empty")]
    EmptyMagicWord,
    #[error("WATCH_SCAN_INTERVAL must be greater than zero")]
    ZeroScanInterval,
    #[error("DATABASE_MAX_CONNECTIONS must be greater than zero")]
    ZeroConnections,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.items.iter().any(|item| item.message.contains(needle))
    }
}

/// Hard failures for values the service cannot run with, warnings for
/// values it can run with but probably should not.
pub fn apply_guard_rails(config: &Config) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.watch.magic_word.is_empty() {
        return Err(ConfigGuardRailError::EmptyMagicWord);
    }
    if config.watch.scan_interval.is_zero() {
        return Err(ConfigGuardRailError::ZeroScanInterval);
    }
    if config.database.max_connections == 0 {
        return Err(ConfigGuardRailError::ZeroConnections);
    }

    if config.database.primary_url.is_none() {
        warnings.push_with_hint(
            "DATABASE_URL not configured; the catalog is kept in memory and lost on restart",
            "Set DATABASE_URL or add a [database] url to the config file",
        );
    }

    if !config.watch.directory.is_dir() {
        warnings.push_with_hint(
            format!(
                "watch directory {} does not exist; scans will fail until it is created",
                config.watch.directory.display()
            ),
            "Create the directory or reconfigure it through the task API",
        );
    }

    if config.reconcile.max_attempts == 0 {
        warnings.push("RECONCILE_MAX_ATTEMPTS is 0; each catalog operation is still tried once");
    }

    Ok(warnings)
}
