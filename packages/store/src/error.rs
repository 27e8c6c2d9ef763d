//! # Error taxonomy
//!
//! Three layers, from the wire up:
//!
//! | Type | Produced by | Meaning |
//! |------|-------------|---------|
//! | [`ApiError`] | backend implementations ([`crate::backend`]) | The remote call failed: a mapped HTTP status, a transport failure, or an undecodable body. |
//! | [`ValidationError`] | controllers, before any request | The input was rejected locally and never reached the network. |
//! | [`ClientError`] | every controller operation | Either of the above, plus the two controller states `SignedOut` and `Busy`. |
//!
//! [`ClientError::kind`] folds all of them into the five user-facing classes
//! ([`ErrorKind`]), and [`ClientError::user_message`] gives the single message the
//! UI shows for that class.

use thiserror::Error;

/// A failed call against the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 401: the bearer token is missing, expired or revoked.
    #[error("unauthorized")]
    Unauthorized,

    /// 404: the addressed resource does not exist.
    #[error("not found")]
    NotFound,

    /// 409: e.g. duplicate username or email.
    #[error("conflict: {0}")]
    Conflict(String),

    /// 400: the server rejected the payload.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Any other non-success status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// DNS, connection refused, TLS and the like.
    #[error("network error: {0}")]
    Network(String),

    /// The body did not match the expected shape.
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Map an HTTP status code and response body onto a variant.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            400 => Self::BadRequest(body),
            401 => Self::Unauthorized,
            404 => Self::NotFound,
            409 => Self::Conflict(body),
            _ => Self::Server {
                status,
                message: body,
            },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::Unauthorized => Some(401),
            Self::NotFound => Some(404),
            Self::Conflict(_) => Some(409),
            Self::Server { status, .. } => Some(*status),
            Self::Network(_) | Self::Decode(_) => None,
        }
    }
}

/// Input rejected on the client before any request was issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("photo is {size} bytes, the limit is {limit}")]
    PhotoTooLarge { size: usize, limit: usize },

    #[error("'{0}' is not an image type")]
    NotAnImage(String),

    #[error("photo is empty")]
    EmptyPhoto,

    #[error("rating {0} is outside 1..=5")]
    RatingOutOfRange(u8),

    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Error returned by controller operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The operation needs a signed-in user.
    #[error("no user is signed in")]
    SignedOut,

    /// The same operation is already in flight for this key.
    #[error("operation already in progress")]
    Busy,
}

/// User-facing error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    Conflict,
    NotFound,
    Transient,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::SignedOut | Self::Api(ApiError::Unauthorized) => ErrorKind::Auth,
            Self::Api(ApiError::Conflict(_)) => ErrorKind::Conflict,
            Self::Api(ApiError::NotFound) => ErrorKind::NotFound,
            Self::Busy | Self::Api(_) => ErrorKind::Transient,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api(ApiError::Unauthorized))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(ApiError::NotFound))
    }

    /// The single message shown to the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.user_message().to_string(),
            Self::SignedOut => "Please sign in to continue.".to_string(),
            Self::Busy => "Please wait for the previous action to finish.".to_string(),
            Self::Api(ApiError::Unauthorized) => {
                "Your session has expired. Please sign in again.".to_string()
            }
            Self::Api(ApiError::Conflict(_)) => {
                "This username or email is already in use.".to_string()
            }
            Self::Api(ApiError::NotFound) => "The requested item could not be found.".to_string(),
            Self::Api(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

impl ValidationError {
    fn user_message(&self) -> &'static str {
        match self {
            Self::PhotoTooLarge { .. } => "The photo must be smaller than 5MB.",
            Self::NotAnImage(_) => "Please choose a valid image file.",
            Self::EmptyPhoto => "Please choose a file.",
            Self::RatingOutOfRange(_) => "Please choose a rating between 1 and 5.",
            Self::PasswordTooShort(_) => "Password must be at least 6 characters.",
            Self::PasswordMismatch => "Passwords do not match.",
            Self::MissingField(_) => "Please fill in all fields.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from_status(401, ""), ApiError::Unauthorized);
        assert_eq!(ApiError::from_status(404, "gone"), ApiError::NotFound);
        assert_eq!(
            ApiError::from_status(409, "duplicate email"),
            ApiError::Conflict("duplicate email".into())
        );
        assert_eq!(
            ApiError::from_status(503, "down"),
            ApiError::Server {
                status: 503,
                message: "down".into()
            }
        );
        assert_eq!(ApiError::from_status(400, "x").status(), Some(400));
        assert_eq!(ApiError::Network("refused".into()).status(), None);
    }

    #[test]
    fn test_kinds() {
        let auth: ClientError = ApiError::Unauthorized.into();
        assert_eq!(auth.kind(), ErrorKind::Auth);
        assert!(auth.is_unauthorized());

        let conflict: ClientError = ApiError::Conflict("taken".into()).into();
        assert_eq!(conflict.kind(), ErrorKind::Conflict);
        assert!(conflict.user_message().contains("already in use"));

        let missing: ClientError = ApiError::NotFound.into();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let validation: ClientError = ValidationError::RatingOutOfRange(0).into();
        assert_eq!(validation.kind(), ErrorKind::Validation);

        let network: ClientError = ApiError::Network("timeout".into()).into();
        assert_eq!(network.kind(), ErrorKind::Transient);
        assert!(network.user_message().contains("try again"));
    }
}
