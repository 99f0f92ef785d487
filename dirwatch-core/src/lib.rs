//! # Dirwatch Core
//!
//! Core library for dirwatch, a service that keeps a persistent catalog of the
//! files beneath a watched directory that contain a configurable *magic word*.
//!
//! ## Overview
//!
//! Two independent discovery paths feed one reconciliation step:
//!
//! - **Event watcher** ([`watch`]): subscribes to live filesystem notifications
//!   for the configured directory and re-checks the files they name.
//! - **Periodic scanner** ([`scan`]): walks the whole tree on a fixed interval
//!   and counts magic-word occurrences in every regular file.
//! - **Reconciler** ([`reconcile`]): maps `(path, occurrence count)` to a
//!   catalog mutation (create, update, mark deleted, or nothing).
//! - **Catalog port** ([`catalog`]): the record store, with an in-memory
//!   adapter and a PostgreSQL adapter behind the `database` feature.
//! - **Lifecycle coordinator** ([`lifecycle`]): starts and stops both workers
//!   as a pair through one cancellation token.
//!
//! ## Feature Flags
//!
//! - `database` (default): PostgreSQL catalog adapter and migrations (SQLx).
//! - `postgres-tests`: runs the adapter tests against a live `DATABASE_URL`.
//!
//! ## Examples
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use dirwatch_core::{
//!     catalog::InMemoryCatalog, lifecycle::TaskCoordinator, reconcile::Reconciler,
//!     settings::WatchSettings,
//! };
//!
//! async fn run() -> dirwatch_core::Result<()> {
//!     let reconciler = Arc::new(Reconciler::new(Arc::new(InMemoryCatalog::new())));
//!     let settings = WatchSettings::new("/srv/watched", "magic", Duration::from_secs(5));
//!     let coordinator = TaskCoordinator::new(reconciler, settings);
//!
//!     coordinator.start().await?;
//!     coordinator.stop().await?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

/// HTTP route constants and API payloads shared with the server crate
pub mod api;

/// File records and the catalog port with its adapters
pub mod catalog;

/// Error types and error handling utilities
pub mod error;

/// Start/stop coordination of the watcher and scanner workers
pub mod lifecycle;

/// Decision logic mapping observed occurrence counts to catalog mutations
pub mod reconcile;

/// Periodic full-tree scanner and magic-word counting
pub mod scan;

/// Watched directory, magic word and scan interval snapshots
pub mod settings;

/// Live filesystem notification worker
pub mod watch;

/// Worker state reporting shared by both discovery paths
pub mod worker;

#[cfg(feature = "database")]
#[cfg_attr(docsrs, doc(cfg(feature = "database")))]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use catalog::{CatalogRepository, FileRecord, FileStatus, InMemoryCatalog};
pub use error::{DirwatchError, Result};
pub use lifecycle::{TaskCoordinator, TaskStatus};
pub use reconcile::{ReconcileOutcome, Reconciler, RetryPolicy};
pub use scan::ScanSummary;
pub use settings::{SettingsHandle, WatchSettings};
pub use worker::WorkerState;

#[cfg(feature = "database")]
pub use catalog::PostgresCatalog;
