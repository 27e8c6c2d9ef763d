//! Login and registration.
//!
//! Both calls return the account and its bearer token; persisting them is the
//! caller's job (see `store::AppState::sign_in`). Registration input is checked
//! locally first and rejected without a request when it cannot succeed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use store::{ApiError, ClientError, User, ValidationError};

use crate::client::HttpClient;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

/// The login/register response has come back both flat (the user object with a
/// `token` field) and nested (`{ user, token }`).
#[derive(Deserialize)]
#[serde(untagged)]
enum AuthResponse {
    Nested {
        user: User,
        #[serde(alias = "jwt", default)]
        token: Option<String>,
    },
    Flat {
        #[serde(flatten)]
        user: User,
        #[serde(alias = "jwt", default)]
        token: Option<String>,
    },
}

pub(crate) fn parse_auth_response(value: Value) -> Result<(User, String), ApiError> {
    let response: AuthResponse =
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;
    let (user, token) = match response {
        AuthResponse::Nested { user, token } | AuthResponse::Flat { user, token } => (user, token),
    };
    Ok((user, token.unwrap_or_default()))
}

/// Check registration input before it is sent.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::MissingField("username"));
    }
    if email.trim().is_empty() {
        return Err(ValidationError::MissingField("email"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN));
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

impl HttpClient {
    /// `POST /api/User/Login`
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), ClientError> {
        if email.trim().is_empty() {
            return Err(ValidationError::MissingField("email").into());
        }
        if password.is_empty() {
            return Err(ValidationError::MissingField("password").into());
        }
        let value: Value = self
            .post(
                "/api/User/Login",
                &LoginRequest {
                    email: email.trim(),
                    password,
                },
            )
            .await?;
        let (user, token) = parse_auth_response(value)?;
        info!(user_id = user.id, "logged in");
        Ok((user, token))
    }

    /// `POST /api/User/Register`. A 409 means the username or email is taken.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<(User, String), ClientError> {
        validate_registration(username, email, password, confirm)?;
        let value: Value = self
            .post(
                "/api/User/Register",
                &RegisterRequest {
                    username: username.trim(),
                    email: email.trim(),
                    password,
                },
            )
            .await?;
        let (user, token) = parse_auth_response(value)?;
        info!(user_id = user.id, "registered");
        Ok((user, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_response() {
        let (user, token) = parse_auth_response(json!({
            "userId": 42, "username": "ayse", "email": "ayse@example.com", "token": "abc"
        }))
        .unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.username, "ayse");
        assert_eq!(token, "abc");
    }

    #[test]
    fn test_nested_response() {
        let (user, token) = parse_auth_response(json!({
            "user": {"id": 7, "username": "x", "email": "x@example.com"}, "jwt": "j"
        }))
        .unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(token, "j");
    }

    #[test]
    fn test_response_without_token() {
        let (_, token) =
            parse_auth_response(json!({"userId": 1, "username": "a", "email": "a@b.c"})).unwrap();
        assert_eq!(token, "");
        assert!(matches!(parse_auth_response(json!(null)), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_validate_registration() {
        assert_eq!(
            validate_registration("a", "a@b.c", "12345", "12345"),
            Err(ValidationError::PasswordTooShort(6))
        );
        assert_eq!(
            validate_registration("a", "a@b.c", "123456", "123457"),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            validate_registration(" ", "a@b.c", "123456", "123456"),
            Err(ValidationError::MissingField("username"))
        );
        assert!(validate_registration("a", "a@b.c", "123456", "123456").is_ok());
    }

    #[tokio::test]
    async fn test_invalid_registration_is_not_sent() {
        // Nothing listens on this port; a request would fail with a network error.
        let client = HttpClient::new("http://127.0.0.1:9");
        let err = client.register("a", "a@b.c", "123", "123").await.unwrap_err();
        assert_eq!(err, ClientError::Validation(ValidationError::PasswordTooShort(6)));
    }
}
