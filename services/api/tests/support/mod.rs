//! Shared helpers for the API integration tests: an app wired to a
//! temp-dir store, plus request/response plumbing.

#![allow(dead_code)]

use std::path::PathBuf;

use api::{AppConfig, AppState, routes};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::DocumentStore;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub uploads_dir: PathBuf,
    _tmp: TempDir,
}

pub fn test_app() -> TestApp {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let uploads_dir = tmp.path().join("uploads");
    std::fs::create_dir_all(&uploads_dir).expect("create uploads dir");

    let config = AppConfig {
        port: 0,
        data_file: tmp.path().join("data.json"),
        sqlite_file: None,
        uploads_dir: uploads_dir.clone(),
        public_dir: tmp.path().join("public"),
        token_secret: "test-secret".to_string(),
        token_ttl_secs: 3600,
        admin_secret: "admin-secret".to_string(),
        memorial_follower_access: false,
    };
    let store = DocumentStore::json_only(&config.data_file);
    let state = AppState::new(store, config);

    TestApp {
        router: routes::create_router(state),
        uploads_dir,
        _tmp: tmp,
    }
}

pub async fn send_json(
    app: &TestApp,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = builder
        .body(Body::from(body.to_string()))
        .expect("build request");
    dispatch(app, req).await
}

pub async fn send_get(app: &TestApp, path: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = builder.body(Body::empty()).expect("build request");
    dispatch(app, req).await
}

pub async fn dispatch(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .router
        .clone()
        .oneshot(req)
        .await
        .expect("dispatch request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// Registers a user and logs in, returning the bearer token.
pub async fn register_and_login(app: &TestApp, username: &str, password: &str) -> String {
    let (status, _) = send_json(
        app,
        "POST",
        "/api/users",
        None,
        serde_json::json!({ "username": username, "password": password }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup for {username}");
    login(app, username, password).await
}

pub async fn login(app: &TestApp, username: &str, password: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/users/login",
        None,
        serde_json::json!({ "username": username, "password": password }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login for {username}");
    body["token"].as_str().expect("login token").to_string()
}

/// Builds a single-file multipart body with the given boundary.
pub fn multipart_body(boundary: &str, filename: &str, mimetype: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {mimetype}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
