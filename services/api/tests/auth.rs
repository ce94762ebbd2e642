//! Integration tests for account registration, login, password reset
//! and the profile endpoint.

mod support;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use support::*;

#[tokio::test]
async fn signup_login_and_profile() {
    let app = test_app();

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/users",
        None,
        json!({ "username": "alice", "password": "correct-horse" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice");
    let user_id = body["id"].as_u64().unwrap();

    // Duplicate usernames conflict.
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/users",
        None,
        json!({ "username": "alice", "password": "other" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    // Wrong password is a 401, not a 400.
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/users/login",
        None,
        json!({ "username": "alice", "password": "wrong" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app, "alice", "correct-horse").await;
    assert!(!token.is_empty());

    // The profile never leaks the stored password.
    let (status, body) = send_get(&app, &format!("/api/users/{user_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"].as_u64(), Some(user_id));
    assert_eq!(body["username"], "alice");
    assert!(body.get("password").is_none());
    assert_eq!(body["suspended"], false);
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn signup_requires_username_and_password() {
    let app = test_app();

    let (status, _) = send_json(&app, "POST", "/api/users", None, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/users",
        None,
        json!({ "username": "bob" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/users",
        None,
        json!({ "username": "bad name!", "password": "pw" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn json_endpoints_reject_wrong_content_type_and_bad_json() {
    let app = test_app();

    let req = Request::builder()
        .method("POST")
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("username=alice"))
        .unwrap();
    let (status, body) = dispatch(&app, req).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body["error"].is_string());

    let req = Request::builder()
        .method("POST")
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not valid json"))
        .unwrap();
    let (status, _) = dispatch(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn password_reset_requires_the_old_password() {
    let app = test_app();
    let token = register_and_login(&app, "carol", "first-password").await;

    // Wrong old password is refused.
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/users/reset-password",
        Some(&token),
        json!({ "oldPassword": "nope", "newPassword": "second-password" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/users/reset-password",
        Some(&token),
        json!({ "oldPassword": "first-password", "newPassword": "second-password" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // The old password stops working, the new one logs in.
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/users/login",
        None,
        json!({ "username": "carol", "password": "first-password" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    login(&app, "carol", "second-password").await;
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = test_app();

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/users/reset-password",
        None,
        json!({ "oldPassword": "a", "newPassword": "b" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/live/start",
        Some("garbage.token"),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_api_paths_return_json_not_found() {
    let app = test_app();
    let (status, body) = send_get(&app, "/api/no-such-thing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}
