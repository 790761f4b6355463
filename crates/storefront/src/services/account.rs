//! Account pages: profile and order history.
//!
//! Every call here needs a logged-in session. Pages call
//! [`AccountService::require_session`] first and send the user to the login
//! screen on [`AuthError::LoginRequired`].

use std::time::Duration;

use secrecy::SecretString;
use tracing::{info, instrument};

use super::auth::AuthError;
use crate::api::{ApiClient, ApiError, Order, ProfileUpdate, UserProfile};
use crate::session::SessionProvider;

/// Profile and order history for the logged-in user.
#[derive(Clone)]
pub struct AccountService {
    client: ApiClient,
    session: SessionProvider,
    login_check_delay: Duration,
}

impl AccountService {
    #[must_use]
    pub const fn new(client: ApiClient, session: SessionProvider, login_check_delay: Duration) -> Self {
        Self {
            client,
            session,
            login_check_delay,
        }
    }

    /// Gate for protected pages.
    ///
    /// Waits briefly so a session restored at startup is in place, then
    /// checks the login state once.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::LoginRequired` when logged out.
    pub async fn require_session(&self) -> Result<(), AuthError> {
        tokio::time::sleep(self.login_check_delay).await;
        if self.session.is_logged_in() {
            Ok(())
        } else {
            Err(AuthError::LoginRequired)
        }
    }

    fn token(&self) -> Result<SecretString, AuthError> {
        self.session.token().ok_or(AuthError::SessionExpired)
    }

    /// Fetch the current account details.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionExpired` without a token or when the server
    /// rejects it.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<UserProfile, AuthError> {
        let token = self.token()?;
        self.client
            .profile(&token)
            .await
            .map_err(AuthError::from_api)
    }

    /// Save account changes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CurrentPasswordRequired` without contacting the
    /// server when no current password was entered,
    /// `AuthError::IncorrectPassword` when the server rejects it, and
    /// `AuthError::Validation` for other rejected fields.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), AuthError> {
        if update.current_password.is_empty() {
            return Err(AuthError::CurrentPasswordRequired);
        }
        let token = self.token()?;

        self.client
            .update_profile(&token, update)
            .await
            .map_err(|err| match err {
                ApiError::Api { status: 400, .. } if err.has_field_error("current_password") => {
                    AuthError::IncorrectPassword
                }
                other => AuthError::from_api(other),
            })?;

        info!(password_changed = update.new_password.is_some(), "Profile updated");
        Ok(())
    }

    /// Completed orders, as sent by the server.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionExpired` without a token or when the server
    /// rejects it.
    #[instrument(skip(self))]
    pub async fn order_history(&self) -> Result<Vec<Order>, AuthError> {
        let token = self.token()?;
        self.client
            .order_history(&token)
            .await
            .map_err(AuthError::from_api)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::session::SessionTokens;
    use url::Url;

    fn service(session: SessionProvider) -> AccountService {
        let config = ApiConfig::new(Url::parse("http://127.0.0.1:9/").unwrap());
        AccountService::new(
            ApiClient::new(&config).unwrap(),
            session,
            Duration::from_millis(300),
        )
    }

    fn logged_in() -> SessionProvider {
        let session = SessionProvider::new();
        session.login(
            SessionTokens {
                access: SecretString::from("a"),
                refresh: SecretString::from("r"),
            },
            None,
        );
        session
    }

    #[tokio::test(start_paused = true)]
    async fn test_require_session_waits_then_rejects() {
        let service = service(SessionProvider::new());
        let started = tokio::time::Instant::now();

        let result = service.require_session().await;

        assert!(matches!(result, Err(AuthError::LoginRequired)));
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_require_session_sees_login_during_delay() {
        let session = SessionProvider::new();
        let service = service(session.clone());

        let check = tokio::spawn(async move { service.require_session().await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.login(
            SessionTokens {
                access: SecretString::from("a"),
                refresh: SecretString::from("r"),
            },
            None,
        );

        assert!(check.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_update_requires_current_password() {
        let service = service(logged_in());
        let update = ProfileUpdate {
            username: "juan".to_string(),
            ..ProfileUpdate::default()
        };

        let err = service.update_profile(&update).await.unwrap_err();

        assert!(matches!(err, AuthError::CurrentPasswordRequired));
        assert_eq!(
            err.to_string(),
            "Please enter your current password to save changes"
        );
    }

    #[tokio::test]
    async fn test_logged_out_calls_are_session_expired() {
        let service = service(SessionProvider::new());
        assert!(matches!(
            service.order_history().await,
            Err(AuthError::SessionExpired)
        ));
        assert!(matches!(
            service.profile().await,
            Err(AuthError::SessionExpired)
        ));
    }
}
