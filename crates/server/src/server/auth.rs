use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::extract::WithRejection;

use crate::auth::token::{decode_token, LoginPayload, RefreshPayload, TokenExchangePayload};
use crate::error::{RequestError, ValidationError};
use crate::models::user::RegisterUserRequest;
use crate::server::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterUserRequest>, RequestError>,
) -> Result<(StatusCode, Json<TokenExchangePayload>), RequestError> {
    let payload = state
        .db_connection
        .register(&payload, &state.config.auth)
        .await?;
    Ok((StatusCode::CREATED, Json(payload)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginPayload>, RequestError>,
) -> Result<Json<TokenExchangePayload>, RequestError> {
    let payload = state
        .db_connection
        .login(&payload.username, &payload.password, &state.config.auth)
        .await?;
    Ok(Json(payload))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<RefreshPayload>, RequestError>,
) -> Result<Json<TokenExchangePayload>, RequestError> {
    let (session_id, refresh_token) =
        decode_token(&payload.refresh_token).ok_or_else(|| ValidationError::InvalidInput {
            value: "<refresh_token>".to_string(),
            reason: "refresh token is malformed".to_string(),
        })?;
    let payload = state
        .db_connection
        .refresh_session(&session_id, &refresh_token, &state.config.auth)
        .await?;
    Ok(Json(payload))
}
