use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use dirwatch_core::{CatalogRepository, TaskCoordinator};

/// Which catalog adapter the process runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogBackend {
    Postgres,
    InMemory,
}

impl CatalogBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogBackend::Postgres => "postgres",
            CatalogBackend::InMemory => "memory",
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub coordinator: Arc<TaskCoordinator>,
    pub backend: CatalogBackend,
    pub started_at: DateTime<Utc>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.backend)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        coordinator: Arc<TaskCoordinator>,
        backend: CatalogBackend,
    ) -> Self {
        Self {
            catalog,
            coordinator,
            backend,
            started_at: Utc::now(),
        }
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogRepository> {
        &self.catalog
    }

    pub fn coordinator(&self) -> &Arc<TaskCoordinator> {
        &self.coordinator
    }
}
