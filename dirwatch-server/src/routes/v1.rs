use axum::{
    Router,
    routing::{get, post},
};
use dirwatch_core::api::routes::{utils::relative, v1};

use crate::{
    handlers::{
        files::list_files_handler,
        task::{
            configure_task_handler, scan_now_handler, start_task_handler, stop_task_handler,
            task_status_handler,
        },
    },
    infra::app_state::AppState,
};

/// Create all v1 API routes
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(relative(v1::files::COLLECTION), get(list_files_handler))
        .route(relative(v1::task::START), post(start_task_handler))
        .route(relative(v1::task::STOP), post(stop_task_handler))
        .route(relative(v1::task::CONFIGURE), post(configure_task_handler))
        .route(relative(v1::task::STATUS), get(task_status_handler))
        .route(relative(v1::task::SCAN), post(scan_now_handler))
}
