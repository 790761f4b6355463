//! Authentication service.
//!
//! Password login against the remote API. A successful login stores the
//! bearer token pair in the [`SessionProvider`], which is what the cart and
//! account pages react to.

mod error;

pub use error::AuthError;

use doghouse_core::Email;
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, ApiError, RegisterRequest};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::session::{SessionProvider, SessionTokens};

/// Signup form as entered by the user.
///
/// Implements `Debug` manually to redact the passwords.
#[derive(Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub contact: String,
}

impl std::fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("address", &self.address)
            .field("contact", &self.contact)
            .finish()
    }
}

/// Authentication service.
///
/// Cheaply cloneable; clones share the API client and session.
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
    session: SessionProvider,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(client: ApiClient, session: SessionProvider) -> Self {
        Self { client, session }
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .login(username, password)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized => AuthError::InvalidCredentials,
                other => AuthError::from_api(other),
            })?;

        if let Some(user_id) = response.user_id {
            set_sentry_user(&user_id, None);
        }

        self.session.login(
            SessionTokens {
                access: SecretString::from(response.access),
                refresh: SecretString::from(response.refresh),
            },
            response.user_id,
        );
        info!(username, "Logged in");

        Ok(())
    }

    /// Register a new account. Does not log in.
    ///
    /// Returns the server's confirmation message.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::PasswordMismatch`
    /// without contacting the server, and
    /// `AuthError::Validation` when the server rejects fields.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: SignupForm) -> Result<String, AuthError> {
        let email = Email::parse(&form.email)?;

        if form.password != form.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let request = RegisterRequest {
            username: form.username,
            email,
            password: form.password,
            first_name: form.first_name,
            last_name: form.last_name,
            address: form.address,
            contact: form.contact,
        };

        let response = self
            .client
            .register(&request)
            .await
            .map_err(AuthError::from_api)?;
        info!("Account registered");

        Ok(response
            .message
            .unwrap_or_else(|| "Registration successful".to_string()))
    }

    /// End the session.
    ///
    /// Tells the server when there is a token to revoke; the local session
    /// is cleared whether or not that call succeeds.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Some(token) = self.session.token()
            && let Err(err) = self.client.logout(&token).await
        {
            warn!(error = %err, "Logout request failed; clearing session anyway");
        }

        self.session.logout();
        clear_sentry_user();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use url::Url;

    /// Points at a port nothing listens on; tests here must fail before
    /// any request is sent, or expect a connection error.
    fn service() -> AuthService {
        let config = ApiConfig::new(Url::parse("http://127.0.0.1:9/").unwrap());
        AuthService::new(ApiClient::new(&config).unwrap(), SessionProvider::new())
    }

    fn form() -> SignupForm {
        SignupForm {
            username: "juan".to_string(),
            email: "juan@doghouse.ph".to_string(),
            password: "hunter2222".to_string(),
            confirm_password: "hunter2222".to_string(),
            ..SignupForm::default()
        }
    }

    #[tokio::test]
    async fn test_register_leaves_password_strength_to_server() {
        // Short but matching passwords pass local checks and reach the
        // (unreachable) server.
        let result = service()
            .register(SignupForm {
                password: "abc123".to_string(),
                confirm_password: "abc123".to_string(),
                ..form()
            })
            .await;
        let err = result.unwrap_err();
        assert!(err.is_connection(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_register_rejects_bad_email_locally() {
        let result = service()
            .register(SignupForm {
                email: "not-an-email".to_string(),
                ..form()
            })
            .await;
        assert!(matches!(result, Err(AuthError::InvalidEmail(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_mismatched_passwords() {
        let result = service()
            .register(SignupForm {
                confirm_password: "hunter2223".to_string(),
                ..form()
            })
            .await;
        assert!(matches!(result, Err(AuthError::PasswordMismatch)));
    }

    #[tokio::test]
    async fn test_logout_clears_session_even_when_server_unreachable() {
        let service = service();
        service.session.login(
            SessionTokens {
                access: SecretString::from("a"),
                refresh: SecretString::from("r"),
            },
            None,
        );

        service.logout().await;
        assert!(!service.session.is_logged_in());
    }

    #[tokio::test]
    async fn test_login_unreachable_is_connection_error() {
        let service = service();
        let err = service.login("juan", "hunter2222").await.unwrap_err();
        assert!(err.is_connection());
        assert!(!service.session.is_logged_in());
    }

    #[test]
    fn test_signup_debug_redacts_passwords() {
        let debug_output = format!("{:?}", form());
        assert!(!debug_output.contains("hunter2222"));
    }
}
