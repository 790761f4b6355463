//! Remote API client.
//!
//! # Architecture
//!
//! - The remote API is the source of truth for users, products, carts, and
//!   orders; this crate holds no data of record
//! - Plain JSON over HTTP with `reqwest`, bearer tokens for authenticated calls
//! - In-memory caching via `moka` for the product list (5 minute TTL)
//! - The three cart calls sit behind [`CartApi`] so the cart synchronizer can
//!   run against a test double
//!
//! # Example
//!
//! ```rust,ignore
//! use doghouse_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let products = client.products().await?;
//! let login = client.login("juan", "hunter22").await?;
//! ```

mod client;
pub mod types;

use std::future::Future;
use std::sync::Arc;

use doghouse_core::LineItem;
use secrecy::SecretString;
use thiserror::Error;

pub use client::{ApiClient, REQUEST_ID_HEADER};
pub use types::*;

/// Errors that can occur when talking to the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (unreachable, reset, timeout).
    #[error("Connection error: {0}")]
    Transport(String),

    /// The response body was not the JSON we expected.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// The bearer token was missing, expired, or rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// Any other non-success status. `body` is the parsed JSON error body,
    /// or `Null` when the body was not JSON.
    #[error("API error: {status} - {}", describe_body(.body))]
    Api {
        status: u16,
        body: serde_json::Value,
    },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl ApiError {
    /// HTTP status of the failed response, if there was one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    /// The human-readable message the server put in its error body.
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        match self {
            Self::Api { body, .. } => extract_message(body),
            _ => None,
        }
    }

    /// Per-field validation errors as `field: message` lines.
    ///
    /// Validation failures come back as an object mapping field names to a
    /// message or a list of messages.
    #[must_use]
    pub fn field_errors(&self) -> Vec<String> {
        let Self::Api { body, .. } = self else {
            return Vec::new();
        };
        let Some(fields) = body.as_object() else {
            return Vec::new();
        };

        fields
            .iter()
            .filter_map(|(field, value)| {
                let message = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Array(values) => values
                        .iter()
                        .filter_map(serde_json::Value::as_str)
                        .collect::<Vec<_>>()
                        .join(", "),
                    _ => return None,
                };
                (!message.is_empty()).then(|| format!("{field}: {message}"))
            })
            .collect()
    }

    /// Whether the error body names `field` as invalid.
    #[must_use]
    pub fn has_field_error(&self, field: &str) -> bool {
        matches!(self, Self::Api { body, .. } if body.get(field).is_some())
    }

    /// Whether the request failed before any response arrived.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Decode(_))
    }
}

/// Pull a message out of an error body: `error`, then `detail`, then `message`.
#[must_use]
pub fn extract_message(body: &serde_json::Value) -> Option<String> {
    ["error", "detail", "message"]
        .iter()
        .filter_map(|key| body.get(key).and_then(serde_json::Value::as_str))
        .find(|s| !s.is_empty())
        .map(String::from)
}

fn describe_body(body: &serde_json::Value) -> String {
    extract_message(body).unwrap_or_else(|| "(no error details provided)".to_string())
}

/// The remote cart service.
///
/// Stores and retrieves the complete line-item list for the bearer of
/// `token`, and converts that cart into an order on checkout.
pub trait CartApi: Send + Sync + 'static {
    /// Fetch the stored cart.
    fn fetch_cart(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Vec<LineItem>, ApiError>> + Send;

    /// Replace the stored cart with `items`.
    fn save_cart(
        &self,
        token: &SecretString,
        items: &[LineItem],
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Turn the stored cart into an order.
    fn checkout(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<CheckoutReceipt, ApiError>> + Send;
}

impl<T: CartApi> CartApi for Arc<T> {
    fn fetch_cart(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Vec<LineItem>, ApiError>> + Send {
        (**self).fetch_cart(token)
    }

    fn save_cart(
        &self,
        token: &SecretString,
        items: &[LineItem],
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        (**self).save_cart(token, items)
    }

    fn checkout(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<CheckoutReceipt, ApiError>> + Send {
        (**self).checkout(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_message_prefers_error() {
        let body = json!({"error": "Cart is empty", "detail": "ignored"});
        assert_eq!(extract_message(&body).as_deref(), Some("Cart is empty"));
    }

    #[test]
    fn test_extract_message_falls_back_to_detail() {
        let body = json!({"detail": "Authentication credentials were not provided."});
        assert_eq!(
            extract_message(&body).as_deref(),
            Some("Authentication credentials were not provided.")
        );
    }

    #[test]
    fn test_extract_message_none_for_field_errors() {
        let body = json!({"email": ["Enter a valid email address."]});
        assert_eq!(extract_message(&body), None);
        assert_eq!(extract_message(&serde_json::Value::Null), None);
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Api {
            status: 500,
            body: json!({"error": "database is locked"}),
        };
        assert_eq!(err.to_string(), "API error: 500 - database is locked");

        let err = ApiError::Api {
            status: 502,
            body: serde_json::Value::Null,
        };
        assert_eq!(
            err.to_string(),
            "API error: 502 - (no error details provided)"
        );
    }

    #[test]
    fn test_field_errors() {
        let err = ApiError::Api {
            status: 400,
            body: json!({
                "username": ["A user with that username already exists."],
                "contact": "Ensure this field has no more than 15 characters."
            }),
        };
        let mut lines = err.field_errors();
        lines.sort();
        assert_eq!(
            lines,
            vec![
                "contact: Ensure this field has no more than 15 characters.".to_string(),
                "username: A user with that username already exists.".to_string(),
            ]
        );
        assert!(err.has_field_error("username"));
        assert!(!err.has_field_error("current_password"));
    }

    #[test]
    fn test_status() {
        assert_eq!(ApiError::Unauthorized.status(), Some(401));
        assert_eq!(ApiError::Transport("reset".into()).status(), None);
        assert!(ApiError::Decode("eof".into()).is_transport());
    }
}
