use axum::{extract::State, response::Json};
use dirwatch_core::api::types::{ApiResponse, FilesResponse};

use crate::infra::{app_state::AppState, errors::AppResult};

/// Every catalog record, active and deleted, ordered by id.
pub async fn list_files_handler(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<FilesResponse>>> {
    let records = state.catalog().list().await?;
    Ok(Json(ApiResponse::success(records.into_iter().collect())))
}
