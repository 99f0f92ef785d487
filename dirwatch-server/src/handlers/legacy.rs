//! Unversioned endpoints with the response shapes of the first release:
//! bare `{"message": ..}`, `{"fileDetails": [..]}` and `{"error": ..}` bodies.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use dirwatch_core::{
    DirwatchError,
    api::types::{ConfigureTaskRequest, FilesResponse},
};
use serde_json::json;

use crate::infra::{app_state::AppState, errors::AppError};

#[derive(Debug)]
pub struct LegacyError(AppError);

impl From<DirwatchError> for LegacyError {
    fn from(err: DirwatchError) -> Self {
        Self(err.into())
    }
}

impl From<JsonRejection> for LegacyError {
    fn from(rejection: JsonRejection) -> Self {
        Self(rejection.into())
    }
}

impl IntoResponse for LegacyError {
    fn into_response(self) -> Response {
        (self.0.status, Json(json!({ "error": self.0.message }))).into_response()
    }
}

fn message(text: &str) -> Json<serde_json::Value> {
    Json(json!({ "message": text }))
}

pub async fn files_handler(
    State(state): State<AppState>,
) -> Result<Json<FilesResponse>, LegacyError> {
    let records = state.catalog().list().await?;
    Ok(Json(records.into_iter().collect()))
}

pub async fn task_start_handler(State(state): State<AppState>) -> Result<Response, LegacyError> {
    match state.coordinator().start().await {
        Ok(()) => Ok(message("Task started successfully").into_response()),
        Err(DirwatchError::AlreadyRunning) => Ok((
            StatusCode::CONFLICT,
            Json(json!({ "error": "Task is already running" })),
        )
            .into_response()),
        Err(err) => Err(err.into()),
    }
}

pub async fn task_stop_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, LegacyError> {
    state.coordinator().stop().await?;
    Ok(message("Task stopped successfully"))
}

pub async fn configure_task_handler(
    State(state): State<AppState>,
    payload: Result<Json<ConfigureTaskRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, LegacyError> {
    let Json(request) = payload?;
    state
        .coordinator()
        .configure(request.directory_name, request.magic_word)?;
    Ok(message("Task Configured"))
}
