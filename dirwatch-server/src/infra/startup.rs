use std::sync::Arc;

use anyhow::Context;
use dirwatch_config::{Config, ReconcileConfig, WatchConfig};
use dirwatch_core::{
    CatalogRepository, InMemoryCatalog, PostgresCatalog, Reconciler, RetryPolicy,
    TaskCoordinator, WatchSettings,
};
use tracing::{info, warn};

use crate::infra::app_state::{AppState, CatalogBackend};

pub fn watch_settings(watch: &WatchConfig) -> WatchSettings {
    WatchSettings::new(
        watch.directory.clone(),
        watch.magic_word.clone(),
        watch.scan_interval,
    )
}

pub fn retry_policy(reconcile: &ReconcileConfig) -> RetryPolicy {
    RetryPolicy {
        max_attempts: reconcile.max_attempts,
        backoff: reconcile.backoff,
    }
}

/// Connect and migrate the Postgres catalog, or fall back to memory when no
/// database is configured or `force_in_memory` is set.
pub async fn connect_catalog(
    config: &Config,
    force_in_memory: bool,
) -> anyhow::Result<(Arc<dyn CatalogRepository>, CatalogBackend)> {
    let url = match (&config.database.primary_url, force_in_memory) {
        (Some(url), false) => url,
        (_, true) => {
            info!("using in-memory catalog");
            return Ok((Arc::new(InMemoryCatalog::new()), CatalogBackend::InMemory));
        }
        (None, false) => {
            warn!("DATABASE_URL not configured; using in-memory catalog");
            return Ok((Arc::new(InMemoryCatalog::new()), CatalogBackend::InMemory));
        }
    };

    let catalog = PostgresCatalog::connect(url, config.database.max_connections)
        .await
        .context("failed to connect to PostgreSQL")?;
    catalog
        .initialize_schema()
        .await
        .context("failed to apply database migrations")?;
    info!("connected to PostgreSQL catalog");

    Ok((Arc::new(catalog), CatalogBackend::Postgres))
}

pub fn build_state(
    config: &Config,
    catalog: Arc<dyn CatalogRepository>,
    backend: CatalogBackend,
) -> AppState {
    let reconciler = Reconciler::new(Arc::clone(&catalog))
        .with_retry_policy(retry_policy(&config.reconcile));
    let coordinator = TaskCoordinator::new(Arc::new(reconciler), watch_settings(&config.watch))
        .with_shutdown_timeout(config.watch.shutdown_timeout);

    AppState::new(catalog, Arc::new(coordinator), backend)
}

/// Post-wiring steps run once before the listener accepts requests.
pub async fn run_startup(config: &Config, state: &AppState) -> anyhow::Result<()> {
    if config.watch.auto_start {
        state
            .coordinator()
            .start()
            .await
            .context("failed to auto-start the watch task")?;
    }
    Ok(())
}
