pub mod legacy;
pub mod v1;

use axum::{Router, routing::get};
use dirwatch_core::api::routes::{HEALTH, v1::ROOT};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers::health::health_handler, infra::app_state::AppState};

/// Create the main API router with all versions
pub fn create_api_router() -> Router<AppState> {
    Router::new().nest(ROOT, v1::create_v1_router())
}

/// The full application: versioned API, legacy aliases and health check.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(HEALTH, get(health_handler))
        .merge(create_api_router())
        .merge(legacy::create_legacy_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
