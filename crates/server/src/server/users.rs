use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use tracing::instrument;

use crate::auth::token::Claims;
use crate::error::RequestError;
use crate::models::listing::{ListingQuery, Page};
use crate::models::message::{
    Direction, ListMessagesRequest, ListMessagesResponse, ReceivedMessage, SentMessage,
};
use crate::models::user::{UserEnvelope, Username};
use crate::server::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:username", get(get_user))
        .route("/:username/to", get(messages_to))
        .route("/:username/from", get(messages_from))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    WithRejection(Path(username), _): WithRejection<Path<Username>, RequestError>,
) -> Result<Json<UserEnvelope>, RequestError> {
    claims.ensure_correct_user(&username)?;
    let user = state.db_connection.get_user(&username).await?;
    Ok(Json(UserEnvelope { user }))
}

#[instrument(skip(state))]
pub async fn messages_to(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    WithRejection(Path(username), _): WithRejection<Path<Username>, RequestError>,
    WithRejection(Query(query), _): WithRejection<Query<ListingQuery>, RequestError>,
) -> Result<Json<ListMessagesResponse<ReceivedMessage>>, RequestError> {
    claims.ensure_correct_user(&username)?;
    let request = ListMessagesRequest {
        username,
        direction: Direction::Received,
        page: Page::from_query(query)?,
    };
    let messages = state.db_connection.list_messages(&request).await?;
    Ok(Json(ListMessagesResponse {
        messages: messages.into_iter().map(ReceivedMessage::from).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn messages_from(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    WithRejection(Path(username), _): WithRejection<Path<Username>, RequestError>,
    WithRejection(Query(query), _): WithRejection<Query<ListingQuery>, RequestError>,
) -> Result<Json<ListMessagesResponse<SentMessage>>, RequestError> {
    claims.ensure_correct_user(&username)?;
    let request = ListMessagesRequest {
        username,
        direction: Direction::Sent,
        page: Page::from_query(query)?,
    };
    let messages = state.db_connection.list_messages(&request).await?;
    Ok(Json(ListMessagesResponse {
        messages: messages.into_iter().map(SentMessage::from).collect(),
    }))
}
