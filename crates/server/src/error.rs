use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("bad auth or refresh credentials")]
    BadCredentials,
    #[error("interrupted operation")]
    Interrupted,
    #[error("operation is not valid anymore, likely requires session refresh or re-login")]
    Expired,
    #[error("not permitted: {0}")]
    Forbidden(&'static str),
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Clone, Debug, Error)]
pub enum ValidationError {
    #[error("input value is invalid: `{value}`, reason: {reason}")]
    InvalidInput { value: String, reason: String },
    #[error("limit exceeded for {subject}, allowed {limit} {unit}(s), got {attempted}")]
    LimitExceeded {
        subject: String,
        unit: String,
        attempted: usize,
        limit: usize,
    },
    #[error("requested object already exists")]
    AlreadyExists,
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Sqlx(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            Self::Sqlx(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::BadCredentials | Self::Expired => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Interrupted => StatusCode::CONFLICT,
            Self::Rejected { status, .. } => *status,
        }
    }
}

impl From<JsonRejection> for RequestError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for RequestError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for RequestError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            Self::Sqlx(sqlx::Error::RowNotFound) => "not found".to_string(),
            Self::Sqlx(e) => {
                error!("received internal error for user request: {e}");
                "Something went wrong".to_string()
            }
            Self::Validation(e) => e.to_string(),
            e => e.to_string(),
        };
        let error = json!({ "error": error }).to_string();
        (status, error).into_response()
    }
}

#[derive(Clone, Debug)]
pub enum SessionError {
    MissingToken,
    BadToken,
    TokenNotFound,
    TokenExpired,
    Internal,
}

impl SessionError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadToken => StatusCode::BAD_REQUEST,
            Self::MissingToken | Self::TokenNotFound | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let error = match self {
            Self::MissingToken => "Missing token in request",
            Self::BadToken => "Malformed token in request",
            Self::TokenNotFound => "Token cannot be found",
            Self::TokenExpired => "Token has expired",
            Self::Internal => "Something went wrong",
        };
        let error = json!({ "error": error }).to_string();
        (self.status(), error).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_maps_to_403() {
        let err = RequestError::Forbidden("only the recipient can mark a message as read");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            err.to_string(),
            "not permitted: only the recipient can mark a message as read"
        );
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = RequestError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn other_database_errors_map_to_500() {
        let err = RequestError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_maps_to_400() {
        let err = RequestError::from(ValidationError::AlreadyExists);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn extractor_rejections_keep_their_status() {
        let err = RequestError::Rejected {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "unknown field `from_username`".to_string(),
        };
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "unknown field `from_username`");
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn credential_errors_map_to_401() {
        assert_eq!(RequestError::BadCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(RequestError::Expired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(SessionError::MissingToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(SessionError::BadToken.status(), StatusCode::BAD_REQUEST);
    }
}
