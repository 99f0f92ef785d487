use axum::{
    Router,
    routing::{get, post},
};
use dirwatch_core::api::routes::legacy;

use crate::{handlers::legacy as handlers, infra::app_state::AppState};

pub fn create_legacy_router() -> Router<AppState> {
    Router::new()
        .route(legacy::FILES, get(handlers::files_handler))
        .route(legacy::TASK_START, post(handlers::task_start_handler))
        .route(legacy::TASK_STOP, post(handlers::task_stop_handler))
        .route(
            legacy::CONFIGURE_TASK,
            post(handlers::configure_task_handler),
        )
}
