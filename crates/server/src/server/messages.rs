//! Message endpoints. Every handler takes the caller's [`Claims`] explicitly
//! and checks the participant rules on the fetched message before responding.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use tracing::{debug, instrument};

use crate::auth::token::Claims;
use crate::error::RequestError;
use crate::models::message::{
    CreateMessagePayload, CreateMessageRequest, CreatedMessage, MessageDetail, MessageEnvelope,
    MessageId, MessageState, ReadReceipt,
};
use crate::server::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_message))
        .route("/:id", get(get_message))
        .route("/:id/read", post(mark_read))
}

/// `GET /messages/:id`, visible to the sender and the recipient.
#[instrument(skip(state))]
pub async fn get_message(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    WithRejection(Path(id), _): WithRejection<Path<MessageId>, RequestError>,
) -> Result<Json<MessageEnvelope<MessageDetail>>, RequestError> {
    let message = state.db_connection.get_message(id).await?;
    message.ensure_participant(&claims.username)?;
    Ok(Json(MessageEnvelope::new(message)))
}

/// `POST /messages`, the sender is always the caller.
#[instrument(skip(state, payload))]
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    WithRejection(Json(payload), _): WithRejection<Json<CreateMessagePayload>, RequestError>,
) -> Result<(StatusCode, Json<MessageEnvelope<CreatedMessage>>), RequestError> {
    payload.validate()?;
    let request = CreateMessageRequest::from_sender(&claims.username, payload);
    let message = state.db_connection.send_message(&request).await?;
    Ok((StatusCode::CREATED, Json(MessageEnvelope::new(message))))
}

/// `POST /messages/:id/read`, only the recipient may call it. Repeated calls
/// succeed and keep the first `read_at`.
#[instrument(skip(state))]
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    WithRejection(Path(id), _): WithRejection<Path<MessageId>, RequestError>,
) -> Result<Json<MessageEnvelope<ReadReceipt>>, RequestError> {
    let message = state.db_connection.get_message(id).await?;
    message.ensure_recipient(&claims.username)?;
    if message.state() == MessageState::Read {
        debug!("message {id} was already read");
    }
    let receipt = state.db_connection.mark_read(id).await?;
    Ok(Json(MessageEnvelope::new(receipt)))
}
