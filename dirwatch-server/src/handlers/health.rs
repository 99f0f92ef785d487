use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{Value, json};

use crate::infra::app_state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let mut health_status = json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": (chrono::Utc::now() - state.started_at).num_seconds(),
        "checks": {}
    });

    let mut is_unhealthy = false;
    match state.catalog().count().await {
        Ok(records) => {
            health_status["checks"]["catalog"] = json!({
                "status": "healthy",
                "backend": state.backend.as_str(),
                "records": records,
            });
        }
        Err(err) => {
            health_status["checks"]["catalog"] = json!({
                "status": "unhealthy",
                "backend": state.backend.as_str(),
                "error": err.to_string(),
            });
            is_unhealthy = true;
        }
    }

    let task = state.coordinator().status().await;
    health_status["checks"]["task"] = json!({
        "running": task.running,
        "watcher": task.watcher,
        "scanner": task.scanner,
    });

    if is_unhealthy {
        health_status["status"] = json!("unhealthy");
        (StatusCode::SERVICE_UNAVAILABLE, Json(health_status))
    } else {
        (StatusCode::OK, Json(health_status))
    }
}
