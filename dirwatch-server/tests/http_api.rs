use std::time::Duration;

use axum::http::StatusCode;
use dirwatch_core::api::routes::{HEALTH, legacy, v1};
use serde_json::{Value, json};

mod support;

use support::build_test_app;

#[tokio::test]
async fn scan_then_list_files() -> anyhow::Result<()> {
    let app = build_test_app()?;
    std::fs::write(app.dir.path().join("a.txt"), "magic and more magic")?;
    std::fs::write(app.dir.path().join("b.txt"), "nothing to see")?;

    let response = app.server.post(v1::task::SCAN).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["visited"], 2);
    assert_eq!(body["data"]["created"], 1);

    let response = app.server.get(v1::files::COLLECTION).await;
    response.assert_status_ok();
    let body: Value = response.json();
    let files = body["data"]["fileDetails"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "a.txt");
    assert_eq!(files[0]["countOfMagicWord"], 2);
    assert_eq!(files[0]["status"], "active");
    Ok(())
}

#[tokio::test]
async fn configure_rejects_empty_word_and_bad_json() -> anyhow::Result<()> {
    let app = build_test_app()?;

    let response = app
        .server
        .post(v1::task::CONFIGURE)
        .json(&json!({ "directoryName": "/tmp", "magicWord": "" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post(v1::task::CONFIGURE)
        .text("{ not json")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let settings = app.state.coordinator().settings().snapshot();
    assert_eq!(settings.magic_word, "magic");
    Ok(())
}

#[tokio::test]
async fn configure_replaces_settings() -> anyhow::Result<()> {
    let app = build_test_app()?;
    let other = tempfile::tempdir()?;
    let directory = other.path().display().to_string();

    let response = app
        .server
        .post(v1::task::CONFIGURE)
        .json(&json!({ "directoryName": directory, "magicWord": "wizard" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Task Configured");
    assert_eq!(body["data"]["magicWord"], "wizard");
    assert_eq!(body["data"]["directoryName"], directory);
    Ok(())
}

#[tokio::test]
async fn start_stop_and_status() -> anyhow::Result<()> {
    let app = build_test_app()?;

    let response = app.server.post(v1::task::START).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["running"], true);

    let response = app.server.post(v1::task::START).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let response = app.server.get(v1::task::STATUS).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["running"], true);
    assert!(body["data"]["startedAt"].is_string());

    let response = app.server.post(v1::task::STOP).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["running"], false);
    assert_eq!(body["data"]["scanner"], "stopped");

    // Stopping again is harmless.
    app.server.post(v1::task::STOP).await.assert_status_ok();
    Ok(())
}

#[tokio::test]
async fn scan_of_missing_directory_is_unprocessable() -> anyhow::Result<()> {
    let app = build_test_app()?;
    let missing = app.dir.path().join("gone").display().to_string();
    app.server
        .post(v1::task::CONFIGURE)
        .json(&json!({ "directoryName": missing, "magicWord": "magic" }))
        .await
        .assert_status_ok();

    let response = app.server.post(v1::task::SCAN).await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["status"], 422);
    Ok(())
}

#[tokio::test]
async fn legacy_routes_keep_their_shapes() -> anyhow::Result<()> {
    let app = build_test_app()?;
    std::fs::write(app.dir.path().join("notes.txt"), "magic")?;

    let response = app
        .server
        .post(legacy::CONFIGURE_TASK)
        .json(&json!({
            "directoryName": app.dir.path().display().to_string(),
            "magicWord": "magic",
        }))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({ "message": "Task Configured" }));

    let response = app
        .server
        .post(legacy::CONFIGURE_TASK)
        .json(&json!({ "directoryName": "/tmp", "magicWord": "" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].is_string());

    let response = app.server.post(legacy::TASK_START).await;
    response.assert_json(&json!({ "message": "Task started successfully" }));

    let response = app.server.post(legacy::TASK_START).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    // The scanner's first cycle is an interval away; the watcher only sees
    // new events, so reconcile the existing file on demand.
    app.state.coordinator().scan_now().await?;

    let response = app.server.get(legacy::FILES).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["fileDetails"][0]["name"], "notes.txt");

    let response = app.server.post(legacy::TASK_STOP).await;
    response.assert_json(&json!({ "message": "Task stopped successfully" }));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn running_task_picks_up_new_files() -> anyhow::Result<()> {
    let app = build_test_app()?;
    app.server.post(v1::task::START).await.assert_status_ok();

    let mut watcher = app.state.coordinator().subscribe_watcher_state();
    tokio::time::timeout(
        Duration::from_secs(5),
        watcher.wait_for(|state| *state == dirwatch_core::WorkerState::Watching),
    )
    .await??;

    std::fs::write(app.dir.path().join("fresh.txt"), "magic")?;

    let listed = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let body: Value = app.server.get(v1::files::COLLECTION).await.json();
            if body["data"]["fileDetails"]
                .as_array()
                .is_some_and(|files| !files.is_empty())
            {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await?;
    assert_eq!(listed["data"]["fileDetails"][0]["name"], "fresh.txt");

    app.server.post(v1::task::STOP).await.assert_status_ok();
    Ok(())
}

#[tokio::test]
async fn health_reports_catalog_and_task() -> anyhow::Result<()> {
    let app = build_test_app()?;

    let response = app.server.get(HEALTH).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["catalog"]["backend"], "memory");
    assert_eq!(body["checks"]["catalog"]["records"], 0);
    assert_eq!(body["checks"]["task"]["running"], false);

    std::fs::write(app.dir.path().join("a.txt"), "magic")?;
    app.server.post(v1::task::SCAN).await.assert_status_ok();
    let body: Value = app.server.get(HEALTH).await.json();
    assert_eq!(body["checks"]["catalog"]["records"], 1);
    Ok(())
}
