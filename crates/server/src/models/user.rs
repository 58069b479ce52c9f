use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::error::ValidationError;

pub type Username = String;
const USER_NAME_LENGTH_LIMIT: usize = 50;
const USERNAME_LENGTH_LIMIT: usize = 30;
const USER_PHONE_LENGTH_LIMIT: usize = 20;
const USER_PASSWORD_MIN_LENGTH: usize = 8;
const USER_PASSWORD_MAX_LENGTH: usize = 80;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserRequest {
    pub username: Username,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl RegisterUserRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_username(&self.username)?;
        validate_user_password(&self.password)?;
        validate_person_name("first name", &self.first_name)?;
        validate_person_name("last name", &self.last_name)?;
        validate_phone(&self.phone)
    }
}

#[derive(Clone, Debug)]
pub struct CreateUser {
    pub username: Username,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Public part of a user, as embedded in messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub username: Username,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl UserSummary {
    /// Reads a user joined under column aliases like `from_username`, `from_phone`.
    pub fn from_prefixed_row(row: &PgRow, prefix: &str) -> Result<Self, sqlx::Error> {
        let column = |name: &str| format!("{prefix}{name}");
        Ok(Self {
            username: row.try_get(column("username").as_str())?,
            first_name: row.try_get(column("first_name").as_str())?,
            last_name: row.try_get(column("last_name").as_str())?,
            phone: row.try_get(column("phone").as_str())?,
        })
    }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct UserDetail {
    pub username: Username,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserDetail,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct GetUserCredentialsResponse {
    pub username: Username,
    pub password_hash: String,
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    for ch in username.chars() {
        if !(ch.is_alphanumeric() || ch == '_') {
            return Err(ValidationError::InvalidInput {
                value: username.to_string(),
                reason: "username can only contain letters, numbers and underscores".to_string(),
            });
        }
    }
    if username.is_empty() {
        return Err(ValidationError::InvalidInput {
            value: username.to_string(),
            reason: "username cannot be empty".to_string(),
        });
    }
    if username.chars().count() > USERNAME_LENGTH_LIMIT {
        return Err(ValidationError::InvalidInput {
            value: username.to_string(),
            reason: format!("username cannot be longer than {USERNAME_LENGTH_LIMIT} chars"),
        });
    }
    Ok(())
}

/// Postgres text columns cannot hold NUL characters.
pub fn validate_no_nul(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.contains('\0') {
        return Err(ValidationError::InvalidInput {
            value: value.replace('\0', "\\0"),
            reason: format!("{field} cannot contain NUL characters"),
        });
    }
    Ok(())
}

pub fn validate_person_name(field: &str, name: &str) -> Result<(), ValidationError> {
    validate_no_nul(field, name)?;
    if name.trim().len() != name.len() {
        return Err(ValidationError::InvalidInput {
            value: name.to_string(),
            reason: format!("{field} cannot be surrounded with whitespace characters"),
        });
    }
    if name.is_empty() {
        return Err(ValidationError::InvalidInput {
            value: name.to_string(),
            reason: format!("{field} cannot be empty"),
        });
    }
    if name.chars().count() > USER_NAME_LENGTH_LIMIT {
        return Err(ValidationError::InvalidInput {
            value: name.to_string(),
            reason: format!("{field} cannot be longer than {USER_NAME_LENGTH_LIMIT} chars"),
        });
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    validate_no_nul("phone", phone)?;
    if phone.trim().is_empty() || phone.chars().count() > USER_PHONE_LENGTH_LIMIT {
        return Err(ValidationError::InvalidInput {
            value: phone.to_string(),
            reason: format!("phone should be between 1 and {USER_PHONE_LENGTH_LIMIT} characters"),
        });
    }
    Ok(())
}

pub fn validate_user_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < USER_PASSWORD_MIN_LENGTH || password.len() > USER_PASSWORD_MAX_LENGTH {
        return Err(ValidationError::InvalidInput {
            value: "<password>".to_string(),
            reason: format!(
                "password should be at least {} and at most {} characters long",
                USER_PASSWORD_MIN_LENGTH, USER_PASSWORD_MAX_LENGTH
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterUserRequest {
        RegisterUserRequest {
            username: "alice".to_string(),
            password: "wonderland".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            phone: "+15550100".to_string(),
        }
    }

    #[test]
    fn accepts_valid_registration() {
        request().validate().unwrap();
    }

    #[test]
    fn rejects_bad_usernames() {
        let too_long = "a".repeat(31);
        for username in ["", "has space", "dash-ed", too_long.as_str()] {
            let err = validate_username(username).expect_err("expected invalid username");
            assert!(matches!(err, ValidationError::InvalidInput { .. }), "{username}");
        }
        validate_username("snake_case_99").unwrap();
    }

    #[test]
    fn password_is_never_echoed() {
        let err = RegisterUserRequest {
            password: "short".to_string(),
            ..request()
        }
        .validate()
        .unwrap_err();

        assert!(matches!(
            err,
            ValidationError::InvalidInput { value, .. } if value == "<password>"
        ));
    }

    #[test]
    fn rejects_padded_names() {
        let err = RegisterUserRequest {
            last_name: " Liddell".to_string(),
            ..request()
        }
        .validate()
        .unwrap_err();

        assert!(matches!(
            err,
            ValidationError::InvalidInput { reason, .. } if reason.starts_with("last name")
        ));
    }

    #[test]
    fn rejects_nul_in_profile_fields() {
        for invalid in [
            RegisterUserRequest {
                first_name: "Al\0ice".to_string(),
                ..request()
            },
            RegisterUserRequest {
                last_name: "Lid\0dell".to_string(),
                ..request()
            },
            RegisterUserRequest {
                phone: "555\00100".to_string(),
                ..request()
            },
            RegisterUserRequest {
                username: "ali\0ce".to_string(),
                ..request()
            },
        ] {
            let err = invalid.validate().unwrap_err();
            assert!(matches!(err, ValidationError::InvalidInput { .. }));
        }
    }

    #[test]
    fn rejects_blank_phone() {
        assert!(validate_phone("   ").is_err());
        assert!(validate_phone(&"1".repeat(21)).is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_value::<RegisterUserRequest>(serde_json::json!({
            "username": "alice",
            "password": "wonderland",
            "first_name": "Alice",
            "last_name": "Liddell",
            "phone": "+15550100",
            "is_admin": true,
        }));
        assert!(result.is_err());
    }
}
