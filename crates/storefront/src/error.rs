//! Unified error handling with Sentry integration.
//!
//! Provides a unified `StorefrontError` for the entry points (the CLI and
//! anything embedding the library). [`StorefrontError::report`] captures
//! server-side failures to Sentry and logs everything else.

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CheckoutError;
use crate::config::ConfigError;
use crate::services::AuthError;

/// Top-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Authentication or account operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout did not go through.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Local I/O failed (terminal, stdin).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorefrontError {
    /// Whether the failure is on the remote side and worth an error report.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        let api = match self {
            Self::Api(err) | Self::Auth(AuthError::Api(err)) => err,
            _ => return false,
        };
        match api {
            ApiError::Api { status, .. } => *status >= 500,
            ApiError::Decode(_) => true,
            ApiError::Transport(_) | ApiError::Unauthorized => false,
        }
    }

    /// Log the error, capturing server-side failures to Sentry.
    pub fn report(&self) {
        if self.is_server_side() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::info!(error = %self, "Storefront error");
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item to cart", Some(&[("product_id", "1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_storefront_error_display() {
        let err = StorefrontError::from(CheckoutError::EmptyCart);
        assert_eq!(err.to_string(), "Checkout error: Your cart is empty");

        let err = StorefrontError::from(ApiError::Unauthorized);
        assert_eq!(err.to_string(), "API error: Unauthorized");
    }

    #[test]
    fn test_server_side_classification() {
        let server = StorefrontError::from(ApiError::Api {
            status: 503,
            body: json!({"detail": "maintenance"}),
        });
        assert!(server.is_server_side());

        let nested = StorefrontError::from(AuthError::Api(ApiError::Decode("eof".into())));
        assert!(nested.is_server_side());

        let client = StorefrontError::from(ApiError::Api {
            status: 404,
            body: serde_json::Value::Null,
        });
        assert!(!client.is_server_side());
        assert!(!StorefrontError::from(ApiError::Transport("refused".into())).is_server_side());
        assert!(!StorefrontError::from(AuthError::SessionExpired).is_server_side());
    }

    #[test]
    fn test_breadcrumb_without_client_is_harmless() {
        add_breadcrumb("cart", "Cleared cart", None);
        add_breadcrumb("cart", "Added item to cart", Some(&[("product_id", "1")]));
    }
}
