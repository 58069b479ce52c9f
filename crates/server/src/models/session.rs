use chrono::{DateTime, Utc};

use crate::auth::token::SessionToken;
use crate::auth::utils::generate_token;
use crate::config::AuthConfig;
use crate::models::user::Username;

pub type SessionId = sqlx::types::Uuid;

/// Freshly generated secrets for a session, before hashing.
#[derive(Clone, Debug)]
pub struct SessionTokens {
    pub refresh_token: SessionToken,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub access_token: SessionToken,
    pub access_token_expires_at: DateTime<Utc>,
}

impl SessionTokens {
    pub fn issue(config: &AuthConfig, now: DateTime<Utc>) -> Self {
        Self {
            refresh_token: generate_token(),
            refresh_token_expires_at: now + config.refresh_token_ttl(),
            access_token: generate_token(),
            access_token_expires_at: now + config.access_token_ttl(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CreateSessionRequest<'a> {
    pub session_id: SessionId,
    pub username: &'a str,
    pub tokens: &'a SessionTokens,
}

#[derive(Clone, Debug)]
pub struct UpdateTokensRequest<'a> {
    pub session_id: SessionId,
    pub previous_refresh_token_hash: &'a [u8],
    pub tokens: &'a SessionTokens,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ResolveSessionResponse {
    pub username: Username,
    pub access_token_hash: Vec<u8>,
    pub access_token_expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct RefreshSessionResponse {
    pub username: Username,
    pub refresh_token_hash: Vec<u8>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn issued_tokens_follow_configured_ttls() {
        let config = AuthConfig {
            access_token_ttl_secs: 60,
            refresh_token_ttl_secs: 600,
        };
        let now = Utc::now();
        let tokens = SessionTokens::issue(&config, now);

        assert_eq!(tokens.access_token_expires_at - now, Duration::seconds(60));
        assert_eq!(tokens.refresh_token_expires_at - now, Duration::seconds(600));
        assert_ne!(tokens.access_token, tokens.refresh_token);
    }
}
