//! Authentication and account error types.

use thiserror::Error;

use crate::api::ApiError;

/// Errors that can occur during login, signup, and account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("{0}")]
    InvalidEmail(#[from] doghouse_core::EmailError),

    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Profile changes must be confirmed with the current password.
    #[error("Please enter your current password to save changes")]
    CurrentPasswordRequired,

    /// The current password given for a profile change was wrong.
    #[error("Incorrect password. Please enter your current password correctly.")]
    IncorrectPassword,

    /// Wrong username or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The page needs a logged-in user.
    #[error("login required")]
    LoginRequired,

    /// No token, or the server rejected it.
    #[error("Your session has expired. Please log in again.")]
    SessionExpired,

    /// The server rejected one or more fields.
    #[error("{}", .0.join("\n"))]
    Validation(Vec<String>),

    /// Any other remote API failure.
    #[error("api error: {0}")]
    Api(ApiError),
}

impl AuthError {
    /// Map a remote API failure for an authenticated call.
    ///
    /// 401 means the session is over; a 400 carrying per-field messages
    /// becomes [`AuthError::Validation`].
    #[must_use]
    pub fn from_api(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => Self::SessionExpired,
            ApiError::Api { status: 400, .. } if err.server_message().is_none() => {
                let fields = err.field_errors();
                if fields.is_empty() {
                    Self::Api(err)
                } else {
                    Self::Validation(fields)
                }
            }
            other => Self::Api(other),
        }
    }

    /// Whether the server could not be reached at all.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Api(err) if err.is_transport())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unauthorized_is_session_expired() {
        let err = AuthError::from_api(ApiError::Unauthorized);
        assert!(matches!(err, AuthError::SessionExpired));
        assert_eq!(
            err.to_string(),
            "Your session has expired. Please log in again."
        );
    }

    #[test]
    fn test_field_errors_become_validation() {
        let err = AuthError::from_api(ApiError::Api {
            status: 400,
            body: json!({
                "email": ["Enter a valid email address."],
                "username": ["A user with that username already exists."]
            }),
        });
        let AuthError::Validation(lines) = &err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(lines.len(), 2);
        let message = err.to_string();
        assert!(message.contains("email: Enter a valid email address."));
        assert!(message.contains("username: A user with that username already exists."));
    }

    #[test]
    fn test_bad_request_with_message_stays_api() {
        let err = AuthError::from_api(ApiError::Api {
            status: 400,
            body: json!({"error": "Malformed request"}),
        });
        assert!(matches!(err, AuthError::Api(_)));
    }

    #[test]
    fn test_connection() {
        assert!(AuthError::Api(ApiError::Transport("refused".into())).is_connection());
        assert!(!AuthError::SessionExpired.is_connection());
    }
}
