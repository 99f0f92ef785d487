//! Configuration for dirwatch.
//!
//! Values are layered as environment (including an optional `.env` file) over
//! a TOML file over built-in defaults. [`ConfigLoader`] resolves the layers
//! into a [`Config`] and collects soft issues as [`ConfigWarnings`]; hard
//! issues are returned as [`ConfigLoadError`].

pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::sources::{EnvConfig, FileConfig};
pub use models::{
    Config, ConfigMetadata, DatabaseConfig, ReconcileConfig, ServerConfig, WatchConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
