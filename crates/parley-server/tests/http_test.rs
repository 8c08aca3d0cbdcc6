//! Control-plane HTTP tests
//!
//! Requests go through the router in-process; the hub worker runs for real.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use parley_core::HubDriver;
use parley_server::{DriverConfig, Hub, IdentityScheme, RENAME_OK, control_router};
use tower::util::ServiceExt;

fn app() -> (Router, tokio::task::JoinHandle<()>) {
    let driver = HubDriver::new(IdentityScheme::Host, DriverConfig::default());
    let (hub, worker) = Hub::new(driver).spawn(16);
    (control_router(hub, None), worker)
}

fn rename(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/update-name")
        .body(Body::from(body.to_owned()))
        .expect("Failed to build request")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.expect("Failed to read body").to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body is not utf-8")
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _worker) = app();

    let request = Request::builder().uri("/health").body(Body::empty()).expect("Failed to build request");
    let response = app.oneshot(request).await.expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn update_name_acknowledges() {
    let (app, _worker) = app();

    let response = app
        .oneshot(rename(r#"{"address":"localhost","name":"Alice","roomHash":"a1b2"}"#))
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, RENAME_OK);
}

#[tokio::test]
async fn update_name_without_room_hash_is_accepted() {
    let (app, _worker) = app();

    let response = app
        .oneshot(rename(r#"{"address":"localhost","name":"Alice"}"#))
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn update_name_missing_field_is_bad_request() {
    let (app, _worker) = app();

    let response =
        app.oneshot(rename(r#"{"address":"localhost"}"#)).await.expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("`name`"));
}

#[tokio::test]
async fn update_name_with_garbage_body_is_bad_request() {
    let (app, _worker) = app();

    let response = app.oneshot(rename("address=localhost")).await.expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_name_after_hub_stops_is_unavailable() {
    let (app, worker) = app();
    worker.abort();
    let _ = worker.await;

    let response = app
        .oneshot(rename(r#"{"address":"localhost","name":"Alice"}"#))
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unknown_path_without_static_dir_is_not_found() {
    let (app, _worker) = app();

    let request = Request::builder().uri("/script.js").body(Body::empty()).expect("Failed to build request");
    let response = app.oneshot(request).await.expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_dir_serves_scripts_and_falls_back_to_index() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("index.html"), "<h1>parley</h1>").expect("write index");
    std::fs::write(dir.path().join("script.js"), "const ws = null;").expect("write script");

    let driver = HubDriver::new(IdentityScheme::Host, DriverConfig::default());
    let (hub, _worker) = Hub::new(driver).spawn(16);
    let app = control_router(hub, Some(dir.path()));

    let request = Request::builder().uri("/script.js").body(Body::empty()).expect("Failed to build request");
    let response = app.clone().oneshot(request).await.expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "const ws = null;");

    let request = Request::builder().uri("/rooms/anything").body(Body::empty()).expect("Failed to build request");
    let response = app.oneshot(request).await.expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "<h1>parley</h1>");
}
