#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use dirwatch_core::{InMemoryCatalog, Reconciler, TaskCoordinator, WatchSettings};
use dirwatch_server::{
    AppState,
    infra::app_state::CatalogBackend,
    routes::create_app,
};
use tempfile::TempDir;

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub dir: TempDir,
}

/// Server over an in-memory catalog watching a fresh temporary directory.
pub fn build_test_app() -> anyhow::Result<TestApp> {
    let dir = tempfile::tempdir()?;
    let state = state_for(dir.path(), Duration::from_secs(3600));
    let server = TestServer::new(create_app(state.clone()))?;
    Ok(TestApp { server, state, dir })
}

pub fn state_for(root: &Path, scan_interval: Duration) -> AppState {
    let catalog = Arc::new(InMemoryCatalog::new());
    let reconciler = Reconciler::new(catalog.clone());
    let coordinator = TaskCoordinator::new(
        Arc::new(reconciler),
        WatchSettings::new(root, "magic", scan_interval),
    )
    .with_shutdown_timeout(Duration::from_secs(5));

    AppState::new(catalog, Arc::new(coordinator), CatalogBackend::InMemory)
}
