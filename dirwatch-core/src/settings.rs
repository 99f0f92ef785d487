use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::{DirwatchError, Result};

/// Directory, magic word and scan cadence the workers operate on.
///
/// Workers never read these fields from shared state; they hold an
/// `Arc<WatchSettings>` snapshot taken once per scan cycle (scanner) or per
/// registration (watcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSettings {
    pub directory_root: PathBuf,
    pub magic_word: String,
    pub scan_interval: Duration,
}

impl WatchSettings {
    pub fn new(
        directory_root: impl Into<PathBuf>,
        magic_word: impl Into<String>,
        scan_interval: Duration,
    ) -> Self {
        Self {
            directory_root: directory_root.into(),
            magic_word: magic_word.into(),
            scan_interval,
        }
    }

    /// Absolute form of `directory_root`, so both discovery paths key records
    /// by the same path string.
    pub fn resolved_root(&self) -> PathBuf {
        resolve_root(&self.directory_root)
    }
}

fn resolve_root(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    cwd.join(path)
}

/// Shared, swappable handle to the current [`WatchSettings`].
#[derive(Clone)]
pub struct SettingsHandle {
    inner: Arc<RwLock<Arc<WatchSettings>>>,
}

impl SettingsHandle {
    pub fn new(settings: WatchSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(settings))),
        }
    }

    /// Immutable view of the settings at this instant.
    pub fn snapshot(&self) -> Arc<WatchSettings> {
        Arc::clone(&self.inner.read())
    }

    /// Replace directory and magic word. The directory is not checked here;
    /// a missing directory surfaces on the next scan cycle or registration.
    pub fn configure(
        &self,
        directory_root: impl Into<PathBuf>,
        magic_word: impl Into<String>,
    ) -> Result<Arc<WatchSettings>> {
        let magic_word = magic_word.into();
        if magic_word.is_empty() {
            return Err(DirwatchError::EmptyMagicWord);
        }

        let mut guard = self.inner.write();
        let next = Arc::new(WatchSettings {
            directory_root: directory_root.into(),
            magic_word,
            scan_interval: guard.scan_interval,
        });
        *guard = Arc::clone(&next);
        Ok(next)
    }
}

impl fmt::Debug for SettingsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsHandle")
            .field("current", &*self.snapshot())
            .finish()
    }
}
