use sqlx::{Error as SqlxError, PgExecutor};
use tracing::{info, instrument};

use crate::auth::utils::hash_token;
use crate::models::message::{CreateMessageRequest, CreatedMessage, MessageId, ReadReceipt};
use crate::models::session::{CreateSessionRequest, UpdateTokensRequest};
use crate::models::user::CreateUser;

#[instrument(skip_all, fields(username = %user.username))]
pub async fn create_user<'a, E: PgExecutor<'a>>(
    executor: E,
    user: &CreateUser,
) -> Result<(), SqlxError> {
    sqlx::query(
        "
            INSERT INTO users (username, password_hash, first_name, last_name, phone, join_at)
            VALUES ($1, $2, $3, $4, $5, current_timestamp);
        ",
    )
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.phone)
    .execute(executor)
    .await?;
    info!("registered user");
    Ok(())
}

#[instrument(skip(executor))]
pub async fn update_login_timestamp<'a, E: PgExecutor<'a>>(
    executor: E,
    username: &str,
) -> Result<(), SqlxError> {
    sqlx::query("UPDATE users SET last_login_at = current_timestamp WHERE username = $1;")
        .bind(username)
        .execute(executor)
        .await?;
    Ok(())
}

#[instrument(skip_all, fields(from = %request.from_username, to = %request.to_username))]
pub async fn create_message<'a, E: PgExecutor<'a>>(
    executor: E,
    request: &CreateMessageRequest,
) -> Result<CreatedMessage, SqlxError> {
    let message: CreatedMessage = sqlx::query_as(
        "
            INSERT INTO messages (from_username, to_username, body, sent_at)
            VALUES ($1, $2, $3, current_timestamp)
            RETURNING id, from_username, to_username, body, sent_at;
        ",
    )
    .bind(&request.from_username)
    .bind(&request.to_username)
    .bind(&request.body)
    .fetch_one(executor)
    .await?;
    info!("created message with id: {}", message.id);
    Ok(message)
}

/// Fills `read_at` only when it is still empty, so the first read time sticks.
#[instrument(skip(executor))]
pub async fn mark_message_read<'a, E: PgExecutor<'a>>(
    executor: E,
    message_id: MessageId,
) -> Result<ReadReceipt, SqlxError> {
    sqlx::query_as(
        "
            UPDATE messages SET read_at = COALESCE(read_at, current_timestamp)
            WHERE id = $1
            RETURNING id, read_at;
        ",
    )
    .bind(message_id)
    .fetch_one(executor)
    .await
}

#[instrument(skip_all, fields(session_id = %request.session_id))]
pub async fn create_session<'a, E: PgExecutor<'a>>(
    executor: E,
    request: &CreateSessionRequest<'_>,
) -> Result<(), SqlxError> {
    sqlx::query(
        "
            INSERT INTO sessions (
                id, username,
                access_token_hash, access_token_expires_at,
                refresh_token_hash, refresh_token_expires_at,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, current_timestamp);
        ",
    )
    .bind(request.session_id)
    .bind(request.username)
    .bind(hash_token(&request.tokens.access_token).as_slice())
    .bind(request.tokens.access_token_expires_at)
    .bind(hash_token(&request.tokens.refresh_token).as_slice())
    .bind(request.tokens.refresh_token_expires_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Returns `false` when the refresh token was already rotated by someone else.
#[instrument(skip_all, fields(session_id = %request.session_id))]
pub async fn rotate_session_tokens<'a, E: PgExecutor<'a>>(
    executor: E,
    request: &UpdateTokensRequest<'_>,
) -> Result<bool, SqlxError> {
    let result = sqlx::query(
        "
            UPDATE sessions SET
                access_token_hash = $3, access_token_expires_at = $4,
                refresh_token_hash = $5, refresh_token_expires_at = $6
            WHERE id = $1 AND refresh_token_hash = $2;
        ",
    )
    .bind(request.session_id)
    .bind(request.previous_refresh_token_hash)
    .bind(hash_token(&request.tokens.access_token).as_slice())
    .bind(request.tokens.access_token_expires_at)
    .bind(hash_token(&request.tokens.refresh_token).as_slice())
    .bind(request.tokens.refresh_token_expires_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}
