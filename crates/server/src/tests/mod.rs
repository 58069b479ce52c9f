mod router;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::config::{AppConfig, AuthConfig, ServerConfig};
use crate::database::connection::{DbConfig, DbConnection};
use crate::server::router::app;
use crate::server::state::AppState;

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            address: "127.0.0.1:0".to_string(),
        },
        database: DbConfig::development("messagely_db", "messagely_guest", "messagelypass"),
        auth: AuthConfig::default(),
    }
}

fn app_with(db_connection: DbConnection) -> Router {
    app_with_config(test_config(), db_connection)
}

fn app_with_config(config: AppConfig, db_connection: DbConnection) -> Router {
    app(Arc::new(AppState::new(config, db_connection)))
}

/// Sends one request through the router and decodes the JSON body, if any.
async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}
