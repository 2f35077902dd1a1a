use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use slideforge_common::AppConfig;
use slideforge_server::{build_router, AppState};
use slideforge_store::JobStore;
use tower::ServiceExt;

fn test_config() -> AppConfig {
    AppConfig {
        foundry_project_endpoint: "https://example.test".to_string(),
        foundry_api_version: "2025-11-15-preview".to_string(),
        model_deployment_name: "test-model".to_string(),
        foundry_http_timeout: Duration::from_secs(60),
        seed_data_dir: "seed-data".into(),
        state_store: slideforge_common::StateStoreKind::Local,
        state_local_path: "data/state.json".into(),
        job_data_dir: "data/jobs".into(),
        allow_html_download: false,
        html_download_api_key: None,
        cors_allowed_origins: vec!["http://localhost:5173".to_string()],
        bind_port: 8080,
    }
}

async fn test_state(dir: &std::path::Path) -> Arc<AppState> {
    let store = Arc::new(JobStore::new(dir));
    let (queue, _receiver) = slideforge_queue::job_queue();
    Arc::new(AppState {
        store,
        queue,
        config: Arc::new(test_config()),
    })
}

#[tokio::test]
async fn empty_prompt_is_rejected_without_creating_a_job() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;
    let app = build_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/api/generate")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"prompt":"","aspect":"16:9"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "prompt is required.");

    let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
    assert!(entries.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_job_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;
    let app = build_router(state);

    let request = Request::builder()
        .method("GET")
        .uri("/api/jobs/does-not-exist")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn healthz_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;
    let app = build_router(state);

    let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn valid_request_creates_a_job_and_enqueues_it() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JobStore::new(dir.path()));
    let (queue, mut receiver) = slideforge_queue::job_queue();
    let state = Arc::new(AppState {
        store: store.clone(),
        queue,
        config: Arc::new(test_config()),
    });
    let app = build_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/api/generate")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"prompt":"Make a slide about cats","aspect":"16:9"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let job_id = json["jobId"].as_str().unwrap().to_string();

    let cancellation = tokio_util::sync::CancellationToken::new();
    let dequeued = receiver.dequeue(&cancellation).await;
    assert_eq!(dequeued, Some(job_id.clone()));

    let state_record = store.get(&job_id).await.unwrap().unwrap();
    assert_eq!(state_record.status, slideforge_common::JobStatus::Queued);
}
