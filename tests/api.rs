use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use ankle_hub::api::{create_router, AppState};
use ankle_hub::dashboard::{build_views, VIEW_COUNT};
use ankle_hub::database::{spawn_store, DatabaseManager, StoreError, StoreHandle};
use ankle_hub::types::{MovementPattern, StoreTask};

fn hub() -> (Router, StoreHandle) {
    let db = DatabaseManager::open_in_memory().unwrap();
    let (store, _join) = spawn_store(db, 32, Arc::new(AtomicBool::new(false)));
    (create_router(AppState::new(store.clone())), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_sample(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/data")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn retrieve() -> Request<Body> {
    Request::builder().uri("/api/retrieve").body(Body::empty()).unwrap()
}

fn reference_sample() -> Value {
    json!({
        "accX": 0.3, "accY": 2.0, "accZ": 1.0,
        "gyroX": 0.06, "gyroY": 0.03, "gyroZ": 0.01
    })
}

#[tokio::test]
async fn ingest_returns_echo_and_metrics() {
    let (app, _store) = hub();
    let (status, body) = send(&app, post_sample(&reference_sample())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["received_data"], reference_sample());

    let metrics = &body["processed_metrics"];
    assert_eq!(metrics["movement_pattern"], "Running");
    assert_eq!(metrics["step_detected"], true);
    assert_eq!(metrics["kick_detected"], false);
    assert_eq!(metrics["kick_power"], 0.0);
    assert_eq!(metrics["jump_height"], 0.0);
    assert_eq!(metrics["impact_force"], 0.0);
    assert!((metrics["speed"].as_f64().unwrap() - 0.22561).abs() < 1e-5);
    assert!(metrics["timestamp"].is_string());
}

#[tokio::test]
async fn retrieve_returns_latest_raw_sample_with_string_id() {
    let (app, _store) = hub();
    send(&app, post_sample(&json!({"accX": 9.0, "accY": 9.0, "accZ": 9.0}))).await;
    send(&app, post_sample(&reference_sample())).await;

    let (status, body) = send(&app, retrieve()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let latest = &body["latest_data"];
    assert_eq!(latest["acc_x"], 0.3);
    assert_eq!(latest["acc_y"], 2.0);
    assert_eq!(latest["acc_z"], 1.0);
    assert_eq!(latest["gyro_x"], 0.06);
    assert_eq!(latest["gyro_y"], 0.03);
    assert_eq!(latest["gyro_z"], 0.01);
    assert!(latest["_id"].is_string());
    assert!(latest["timestamp"].is_string());
}

#[tokio::test]
async fn empty_store_retrieve_is_not_found() {
    let (app, _store) = hub();
    let (status, body) = send(&app, retrieve()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": "error", "message": "No data found"}));
}

#[tokio::test]
async fn missing_gyro_defaults_to_zero_rotation() {
    let (app, _store) = hub();
    let (status, body) = send(&app, post_sample(&json!({"accX": 0.1, "accY": 0.1, "accZ": 0.1}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed_metrics"]["rotation_rate"], 0.0);
    assert_eq!(body["processed_metrics"]["movement_pattern"], "Standing");

    let (_, body) = send(&app, retrieve()).await;
    assert_eq!(body["latest_data"]["gyro_z"], 0.0);
}

#[tokio::test]
async fn non_numeric_field_is_rejected() {
    let (app, store) = hub();
    let (status, body) = send(&app, post_sample(&json!({"accX": "fast", "accY": 0.0, "accZ": 0.0}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("accX"));
    assert!(store.most_recent_derived(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_samples_are_all_stored() {
    let (app, store) = hub();
    for _ in 0..3 {
        let (status, _) = send(&app, post_sample(&reference_sample())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let window = store.most_recent_derived(100).await.unwrap();
    assert_eq!(window.len(), 3);
    assert!(window.iter().all(|m| m.movement_pattern == MovementPattern::Running));
}

#[tokio::test]
async fn dashboard_views_follow_ingested_data() {
    let (app, store) = hub();

    let empty = build_views(&store.most_recent_derived(100).await.unwrap(), 10);
    assert_eq!(empty.views.len(), VIEW_COUNT);
    assert!(empty.views.iter().all(|v| v.is_empty()));

    send(&app, post_sample(&reference_sample())).await;
    send(&app, post_sample(&json!({"accX": 0.0, "accY": 3.0, "accZ": 2.5}))).await;

    let views = build_views(&store.most_recent_derived(100).await.unwrap(), 10);
    assert_eq!(views.views.len(), VIEW_COUNT);
    assert_eq!(views.sample_count, 2);
    assert!(views.views.iter().all(|v| !v.is_empty()));
}

#[tokio::test]
async fn stopped_store_is_a_500_error() {
    let (task_sender, task_receiver) = crossbeam_channel::bounded::<StoreTask>(4);
    drop(task_receiver);
    let app = create_router(AppState::new(StoreHandle::new(task_sender)));

    let (status, body) = send(&app, post_sample(&reference_sample())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"status": "error", "message": "store unavailable: database thread is not running"})
    );

    let (status, body) = send(&app, retrieve()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
}

/// 原始记录写入成功、派生指标写入失败的存储
fn store_failing_derived_writes() -> StoreHandle {
    let (task_sender, task_receiver) = crossbeam_channel::bounded::<StoreTask>(16);

    std::thread::spawn(move || {
        let db = DatabaseManager::open_in_memory().unwrap();
        while let Ok(task) = task_receiver.recv() {
            match task {
                StoreTask::AppendRaw { sample, response_sender } => {
                    let _ = response_sender.send(db.append_raw(&sample).map_err(StoreError::from));
                }
                StoreTask::AppendDerived { response_sender, .. } => {
                    let _ = response_sender.send(Err(StoreError::Database("disk full".to_string())));
                }
                StoreTask::MostRecentRaw { response_sender } => {
                    let _ = response_sender.send(db.most_recent_raw().map_err(StoreError::from));
                }
                StoreTask::MostRecentDerived { limit, response_sender } => {
                    let _ = response_sender.send(db.most_recent_derived(limit));
                }
                StoreTask::GetStats { response_sender } => {
                    let _ = response_sender.send(db.get_stats().map_err(StoreError::from));
                }
                StoreTask::AllDerived { response_sender } => {
                    let _ = response_sender.send(db.all_derived());
                }
            }
        }
    });

    StoreHandle::new(task_sender)
}

#[tokio::test]
async fn failed_derived_write_leaves_raw_record_only() {
    let store = store_failing_derived_writes();
    let app = create_router(AppState::new(store.clone()));

    let (status, body) = send(&app, post_sample(&reference_sample())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"status": "error", "message": "store unavailable: database error: disk full"})
    );

    // 原始记录已持久化，派生指标不存在
    let (status, body) = send(&app, retrieve()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["latest_data"]["acc_y"], 2.0);
    assert!(store.most_recent_derived(10).await.unwrap().is_empty());
}
