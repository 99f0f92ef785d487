//! Watch task control: start, stop, configure, status and on-demand scans.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use dirwatch_core::{
    ScanSummary,
    api::types::{ApiResponse, ConfigureTaskRequest, SettingsView, TaskStatusView},
};
use tracing::info;

use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn start_task_handler(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<TaskStatusView>>> {
    state.coordinator().start().await?;
    let status = state.coordinator().status().await;

    Ok(Json(
        ApiResponse::success(TaskStatusView::from(status))
            .with_message("Task started successfully".into()),
    ))
}

pub async fn stop_task_handler(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<TaskStatusView>>> {
    state.coordinator().stop().await?;
    let status = state.coordinator().status().await;

    Ok(Json(
        ApiResponse::success(TaskStatusView::from(status))
            .with_message("Task stopped successfully".into()),
    ))
}

pub async fn configure_task_handler(
    State(state): State<AppState>,
    payload: Result<Json<ConfigureTaskRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<SettingsView>>> {
    let Json(request) = payload?;
    let settings = state
        .coordinator()
        .configure(request.directory_name, request.magic_word)?;

    info!(root = %settings.directory_root.display(), "task configured over HTTP");
    Ok(Json(
        ApiResponse::success(SettingsView::from(settings.as_ref()))
            .with_message("Task Configured".into()),
    ))
}

pub async fn task_status_handler(
    State(state): State<AppState>,
) -> Json<ApiResponse<TaskStatusView>> {
    let status = state.coordinator().status().await;
    Json(ApiResponse::success(TaskStatusView::from(status)))
}

pub async fn scan_now_handler(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ScanSummary>>> {
    let summary = state.coordinator().scan_now().await?;
    Ok(Json(ApiResponse::success(summary)))
}
