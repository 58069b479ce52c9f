use futures::TryStreamExt;
use sqlx::{Error as SqlxError, PgExecutor};
use tracing::instrument;

use crate::database::commands::{create_message, mark_message_read};
use crate::database::connection::DbConnection;
use crate::database::utils::is_foreign_key_violation;
use crate::error::{RequestError, ValidationError};
use crate::models::message::{
    CreateMessageRequest, CreatedMessage, Direction, ListMessagesRequest, MessageDetail,
    MessageId, ReadReceipt,
};
use crate::models::session::{RefreshSessionResponse, ResolveSessionResponse, SessionId};
use crate::models::user::{GetUserCredentialsResponse, UserDetail};

const MESSAGE_DETAIL_SELECT: &str = "
    SELECT
        m.id AS id, m.body AS body, m.sent_at AS sent_at, m.read_at AS read_at,
        f.username AS from_username, f.first_name AS from_first_name,
        f.last_name AS from_last_name, f.phone AS from_phone,
        t.username AS to_username, t.first_name AS to_first_name,
        t.last_name AS to_last_name, t.phone AS to_phone
    FROM
        messages AS m
        JOIN users AS f ON m.from_username = f.username
        JOIN users AS t ON m.to_username = t.username
";

impl DbConnection {
    pub async fn get_message(&self, message_id: MessageId) -> Result<MessageDetail, SqlxError> {
        get_message_detail(self.pool(), message_id).await
    }

    pub async fn send_message(
        &self,
        request: &CreateMessageRequest,
    ) -> Result<CreatedMessage, RequestError> {
        create_message(self.pool(), request).await.map_err(|e| -> RequestError {
            if is_foreign_key_violation(&e) {
                ValidationError::InvalidInput {
                    value: request.to_username.clone(),
                    reason: "recipient does not exist".to_string(),
                }
                .into()
            } else {
                e.into()
            }
        })
    }

    pub async fn mark_read(&self, message_id: MessageId) -> Result<ReadReceipt, SqlxError> {
        mark_message_read(self.pool(), message_id).await
    }

    pub async fn get_user(&self, username: &str) -> Result<UserDetail, SqlxError> {
        get_user_detail(self.pool(), username).await
    }

    pub async fn list_messages(
        &self,
        request: &ListMessagesRequest,
    ) -> Result<Vec<MessageDetail>, SqlxError> {
        list_messages_for_user(self.pool(), request).await
    }
}

#[instrument(skip(executor))]
pub async fn get_message_detail<'a, E: PgExecutor<'a>>(
    executor: E,
    message_id: MessageId,
) -> Result<MessageDetail, SqlxError> {
    let query = format!("{MESSAGE_DETAIL_SELECT} WHERE m.id = $1;");
    sqlx::query_as(&query)
        .bind(message_id)
        .fetch_one(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn list_messages_for_user<'a, E: PgExecutor<'a>>(
    executor: E,
    request: &ListMessagesRequest,
) -> Result<Vec<MessageDetail>, SqlxError> {
    let column = match request.direction {
        Direction::Received => "m.to_username",
        Direction::Sent => "m.from_username",
    };
    let query = format!(
        "{MESSAGE_DETAIL_SELECT} WHERE {column} = $1 ORDER BY m.id LIMIT $2 OFFSET $3;"
    );
    sqlx::query_as::<_, MessageDetail>(&query)
        .bind(&request.username)
        .bind(request.page.limit)
        .bind(request.page.offset())
        .fetch(executor)
        .try_collect()
        .await
}

#[instrument(skip(executor))]
pub async fn get_user_detail<'a, E: PgExecutor<'a>>(
    executor: E,
    username: &str,
) -> Result<UserDetail, SqlxError> {
    sqlx::query_as(
        "
    SELECT
        username, first_name, last_name, phone, join_at, last_login_at
    FROM
        users
    WHERE
        username = $1;
    ",
    )
    .bind(username)
    .fetch_one(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn get_user_credentials<'a, E: PgExecutor<'a>>(
    executor: E,
    username: &str,
) -> Result<GetUserCredentialsResponse, SqlxError> {
    sqlx::query_as("SELECT username, password_hash FROM users WHERE username = $1;")
        .bind(username)
        .fetch_one(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_session_access<'a, E: PgExecutor<'a>>(
    executor: E,
    session_id: &SessionId,
) -> Result<ResolveSessionResponse, SqlxError> {
    sqlx::query_as(
        "
    SELECT
        username, access_token_hash, access_token_expires_at
    FROM
        sessions
    WHERE
        id = $1;
    ",
    )
    .bind(session_id)
    .fetch_one(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn get_session_refresh<'a, E: PgExecutor<'a>>(
    executor: E,
    session_id: &SessionId,
) -> Result<RefreshSessionResponse, SqlxError> {
    sqlx::query_as(
        "
    SELECT
        username, refresh_token_hash, refresh_token_expires_at
    FROM
        sessions
    WHERE
        id = $1;
    ",
    )
    .bind(session_id)
    .fetch_one(executor)
    .await
}
