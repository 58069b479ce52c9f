use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{async_trait, RequestPartsExt};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use base64::prelude::BASE64_STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::utils::{pack_session_id_and_token, unpack_session_id_and_token};
use crate::error::{RequestError, SessionError};
use crate::models::session::{SessionId, SessionTokens};
use crate::models::user::Username;
use crate::server::state::AppState;

pub type SessionToken = Vec<u8>;

/// Identity of the authenticated caller, handed to handlers explicitly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub username: Username,
}

impl Claims {
    /// Restricts an operation to the user named in the request path.
    pub fn ensure_correct_user(&self, username: &str) -> Result<(), RequestError> {
        if self.username == username {
            Ok(())
        } else {
            Err(RequestError::Forbidden(
                "resource belongs to a different user",
            ))
        }
    }
}

/// Splits a base64 bearer/refresh token into its session id and secret.
pub fn decode_token(token: &str) -> Option<(SessionId, SessionToken)> {
    let packed = BASE64.decode(token).ok()?;
    let (sid, secret) = unpack_session_id_and_token(&packed)?;
    Some((sid, secret.to_vec()))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Claims {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| {
                debug!("malformed auth header token: {e}");
                if e.is_missing() {
                    SessionError::MissingToken
                } else {
                    SessionError::BadToken
                }
            })?;
        let (sid, access_token) = decode_token(bearer.token()).ok_or_else(|| {
            debug!("malformed auth header token: unable to decode");
            SessionError::BadToken
        })?;
        let username = state
            .db_connection
            .resolve_session(&sid, &access_token)
            .await?;
        Ok(Claims { username })
    }
}

#[derive(Debug, Serialize)]
pub struct TokenExchangePayload {
    pub refresh_token: String,
    pub refresh_token_expires_at: String,
    pub access_token: String,
    pub access_token_expires_at: String,
}

impl TokenExchangePayload {
    pub fn new<B1: AsRef<[u8]>, B2: AsRef<[u8]>>(
        session_id: &SessionId,
        refresh_token: B1,
        refresh_token_expires_at: DateTime<Utc>,
        access_token: B2,
        access_token_expires_at: DateTime<Utc>,
    ) -> Self {
        let refresh_token = pack_session_id_and_token(session_id, refresh_token.as_ref());
        let access_token = pack_session_id_and_token(session_id, access_token.as_ref());
        Self {
            refresh_token: BASE64.encode(refresh_token),
            refresh_token_expires_at: refresh_token_expires_at.to_rfc3339(),
            access_token: BASE64.encode(access_token),
            access_token_expires_at: access_token_expires_at.to_rfc3339(),
        }
    }

    pub fn from_tokens(session_id: &SessionId, tokens: &SessionTokens) -> Self {
        Self::new(
            session_id,
            &tokens.refresh_token,
            tokens.refresh_token_expires_at,
            &tokens.access_token,
            tokens.access_token_expires_at,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub username: Username,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshPayload {
    pub refresh_token: String,
}
