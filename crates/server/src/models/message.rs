use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use strum_macros::Display;

use crate::error::{RequestError, ValidationError};
use crate::models::listing::Page;
use crate::models::user::{validate_no_nul, UserSummary, Username};

pub type MessageId = i64;

/// Body of `POST /messages`. The sender is never part of the payload.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMessagePayload {
    pub to_username: Username,
    pub body: String,
}

impl CreateMessagePayload {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_no_nul("recipient", &self.to_username)?;
        validate_no_nul("message body", &self.body)
    }
}

#[derive(Clone, Debug)]
pub struct CreateMessageRequest {
    pub from_username: Username,
    pub to_username: Username,
    pub body: String,
}

impl CreateMessageRequest {
    pub fn from_sender(from_username: &str, payload: CreateMessagePayload) -> Self {
        Self {
            from_username: from_username.to_string(),
            to_username: payload.to_username,
            body: payload.body,
        }
    }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct CreatedMessage {
    pub id: MessageId,
    pub from_username: Username,
    pub to_username: Username,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct ReadReceipt {
    pub id: MessageId,
    pub read_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum MessageState {
    Sent,
    Read,
}

/// A message with both participants resolved.
#[derive(Clone, Debug, Serialize)]
pub struct MessageDetail {
    pub id: MessageId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub from_user: UserSummary,
    pub to_user: UserSummary,
}

impl<'r> FromRow<'r, PgRow> for MessageDetail {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            body: row.try_get("body")?,
            sent_at: row.try_get("sent_at")?,
            read_at: row.try_get("read_at")?,
            from_user: UserSummary::from_prefixed_row(row, "from_")?,
            to_user: UserSummary::from_prefixed_row(row, "to_")?,
        })
    }
}

impl MessageDetail {
    pub fn state(&self) -> MessageState {
        match self.read_at {
            Some(_) => MessageState::Read,
            None => MessageState::Sent,
        }
    }

    pub fn is_participant(&self, username: &str) -> bool {
        self.from_user.username == username || self.to_user.username == username
    }

    pub fn is_recipient(&self, username: &str) -> bool {
        self.to_user.username == username
    }

    /// Either side of the conversation may read the message.
    pub fn ensure_participant(&self, username: &str) -> Result<(), RequestError> {
        if self.is_participant(username) {
            Ok(())
        } else {
            Err(RequestError::Forbidden(
                "only the sender or the recipient can view a message",
            ))
        }
    }

    /// Only the recipient may mark the message read, the sender included.
    pub fn ensure_recipient(&self, username: &str) -> Result<(), RequestError> {
        if self.is_recipient(username) {
            Ok(())
        } else {
            Err(RequestError::Forbidden(
                "only the recipient can mark a message as read",
            ))
        }
    }
}

/// Entry of a user's inbox, the recipient is implied.
#[derive(Clone, Debug, Serialize)]
pub struct ReceivedMessage {
    pub id: MessageId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub from_user: UserSummary,
}

impl From<MessageDetail> for ReceivedMessage {
    fn from(message: MessageDetail) -> Self {
        Self {
            id: message.id,
            body: message.body,
            sent_at: message.sent_at,
            read_at: message.read_at,
            from_user: message.from_user,
        }
    }
}

/// Entry of a user's outbox, the sender is implied.
#[derive(Clone, Debug, Serialize)]
pub struct SentMessage {
    pub id: MessageId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub to_user: UserSummary,
}

impl From<MessageDetail> for SentMessage {
    fn from(message: MessageDetail) -> Self {
        Self {
            id: message.id,
            body: message.body,
            sent_at: message.sent_at,
            read_at: message.read_at,
            to_user: message.to_user,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    Received,
    Sent,
}

#[derive(Clone, Debug)]
pub struct ListMessagesRequest {
    pub username: Username,
    pub direction: Direction,
    pub page: Page,
}

#[derive(Clone, Debug, Serialize)]
pub struct MessageEnvelope<T> {
    pub message: T,
}

impl<T> MessageEnvelope<T> {
    pub fn new(message: T) -> Self {
        Self { message }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ListMessagesResponse<T> {
    pub messages: Vec<T>,
}
