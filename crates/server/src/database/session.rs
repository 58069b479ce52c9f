use chrono::Utc;
use sqlx::Error as SqlxError;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::auth::token::TokenExchangePayload;
use crate::auth::utils::{hash_password, token_matches_hash, verify_password};
use crate::config::AuthConfig;
use crate::database::commands::{
    create_session, create_user, rotate_session_tokens, update_login_timestamp,
};
use crate::database::connection::DbConnection;
use crate::database::queries::{get_session_access, get_session_refresh, get_user_credentials};
use crate::database::utils::{is_unique_violation, map_not_found_as_none};
use crate::error::{RequestError, SessionError, ValidationError};
use crate::models::session::{
    CreateSessionRequest, SessionId, SessionTokens, UpdateTokensRequest,
};
use crate::models::user::{CreateUser, RegisterUserRequest, Username};

impl DbConnection {
    #[instrument(skip_all, fields(username = %request.username))]
    pub async fn register(
        &self,
        request: &RegisterUserRequest,
        auth: &AuthConfig,
    ) -> Result<TokenExchangePayload, RequestError> {
        request.validate()?;
        let password_hash = hash_password(&request.password).map_err(|e| {
            error!("failed to hash password: {e}");
            RequestError::Interrupted
        })?;
        let user = CreateUser {
            username: request.username.clone(),
            password_hash,
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            phone: request.phone.clone(),
        };

        let mut transaction = self.pool().begin().await?;
        create_user(transaction.as_mut(), &user)
            .await
            .map_err(|e| -> RequestError {
                if is_unique_violation(&e) {
                    ValidationError::AlreadyExists.into()
                } else {
                    e.into()
                }
            })?;
        let payload = open_session(&mut transaction, &user.username, auth).await?;
        transaction.commit().await?;
        Ok(payload)
    }

    /// Unknown users and wrong passwords are reported the same way.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        auth: &AuthConfig,
    ) -> Result<TokenExchangePayload, RequestError> {
        let credentials = map_not_found_as_none(get_user_credentials(self.pool(), username).await)?
            .ok_or(RequestError::BadCredentials)?;
        if !verify_password(password, &credentials.password_hash) {
            debug!("password mismatch");
            return Err(RequestError::BadCredentials);
        }

        let mut transaction = self.pool().begin().await?;
        let payload = open_session(&mut transaction, &credentials.username, auth).await?;
        transaction.commit().await?;
        Ok(payload)
    }

    #[instrument(skip(self, refresh_token, auth))]
    pub async fn refresh_session(
        &self,
        session_id: &SessionId,
        refresh_token: &[u8],
        auth: &AuthConfig,
    ) -> Result<TokenExchangePayload, RequestError> {
        let stored = map_not_found_as_none(get_session_refresh(self.pool(), session_id).await)?
            .ok_or(RequestError::BadCredentials)?;
        if !token_matches_hash(refresh_token, &stored.refresh_token_hash) {
            debug!("refresh token mismatch");
            return Err(RequestError::BadCredentials);
        }
        if stored.refresh_token_expires_at <= Utc::now() {
            return Err(RequestError::Expired);
        }

        let tokens = SessionTokens::issue(auth, Utc::now());
        let rotated = rotate_session_tokens(
            self.pool(),
            &UpdateTokensRequest {
                session_id: *session_id,
                previous_refresh_token_hash: &stored.refresh_token_hash,
                tokens: &tokens,
            },
        )
        .await?;
        if !rotated {
            return Err(RequestError::Interrupted);
        }
        info!("rotated tokens for user: {}", stored.username);
        Ok(TokenExchangePayload::from_tokens(session_id, &tokens))
    }

    pub async fn resolve_session(
        &self,
        session_id: &SessionId,
        access_token: &[u8],
    ) -> Result<Username, SessionError> {
        let stored = get_session_access(self.pool(), session_id)
            .await
            .map_err(|e| match e {
                SqlxError::RowNotFound => SessionError::TokenNotFound,
                e => {
                    error!("failed to resolve session: {e}");
                    SessionError::Internal
                }
            })?;
        if !token_matches_hash(access_token, &stored.access_token_hash) {
            return Err(SessionError::TokenNotFound);
        }
        if stored.access_token_expires_at <= Utc::now() {
            return Err(SessionError::TokenExpired);
        }
        Ok(stored.username)
    }
}

async fn open_session(
    transaction: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    username: &str,
    auth: &AuthConfig,
) -> Result<TokenExchangePayload, SqlxError> {
    let session_id = Uuid::new_v4();
    let tokens = SessionTokens::issue(auth, Utc::now());
    create_session(
        transaction.as_mut(),
        &CreateSessionRequest {
            session_id,
            username,
            tokens: &tokens,
        },
    )
    .await?;
    update_login_timestamp(transaction.as_mut(), username).await?;
    debug!("opened session {session_id}");
    Ok(TokenExchangePayload::from_tokens(&session_id, &tokens))
}
