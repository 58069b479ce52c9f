use axum::http::{Method, StatusCode};
use serde_json::json;

use super::{app_with, call, test_config};
use crate::database::connection::DbConnection;

/// None of these requests get far enough to open a database connection.
fn offline_app() -> axum::Router {
    let db = DbConnection::connect_lazy(&test_config().database).unwrap();
    app_with(db)
}

#[tokio::test]
async fn health_needs_no_auth() {
    let app = offline_app();
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn message_endpoints_require_a_token() {
    let app = offline_app();

    let (status, body) = call(&app, Method::GET, "/messages/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Missing token in request" }));

    let (status, _) = call(
        &app,
        Method::POST,
        "/messages",
        None,
        Some(json!({ "to_username": "bob", "body": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::POST, "/messages/1/read", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_token_is_rejected_before_lookup() {
    let app = offline_app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/messages/1/read",
        Some("definitely-not-a-session"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Malformed token in request" }));
}

#[tokio::test]
async fn user_directory_requires_a_token() {
    let app = offline_app();
    for uri in ["/users/alice", "/users/alice/to", "/users/alice/from"] {
        let (status, _) = call(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn register_validates_before_touching_storage() {
    let app = offline_app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": "not valid!",
            "password": "wonderland",
            "first_name": "Alice",
            "last_name": "Liddell",
            "phone": "555-0100",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("username can only contain"));
}

#[tokio::test]
async fn refresh_rejects_malformed_token() {
    let app = offline_app();
    let (status, _) = call(
        &app,
        Method::POST,
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": "@@@" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn body_rejections_are_json_errors() {
    let app = offline_app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "password": "wonderland",
            "first_name": "Alice",
            "last_name": "Liddell",
            "phone": "555-0100",
            "is_admin": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("is_admin"));

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn register_rejects_nul_in_profile() {
    let app = offline_app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "password": "wonderland",
            "first_name": "Alice",
            "last_name": "Lid\0dell",
            "phone": "555-0100",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("NUL"));
}
