//! Request and response bodies for the remote API.

use chrono::{DateTime, Utc};
use doghouse_core::{
    Email, LineItem, OrderId, OrderItemId, Price, ProductId, Quantity, UserId,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Cart
// =============================================================================

/// Body of `GET /orders/cart/` and `POST /orders/cart/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartPayload {
    #[serde(default)]
    pub cart_items: Vec<LineItem>,
}

/// Body of a successful `POST /orders/checkout/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CheckoutReceipt {
    #[serde(default)]
    pub message: String,
}

/// Generic `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product from `GET /orders/products/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image_file: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Product {
    /// A cart line for `quantity` units of this product.
    #[must_use]
    pub fn to_line_item(&self, quantity: Quantity) -> LineItem {
        LineItem::new(self.id, self.name.clone(), self.price, quantity)
    }
}

// =============================================================================
// Orders
// =============================================================================

/// A completed order from `GET /orders/history/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub total_price: Price,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

/// One line of a completed order, priced at the time of purchase.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_name: String,
    pub quantity: Quantity,
    pub price_at_purchase: Price,
}

impl OrderItem {
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.price_at_purchase * self.quantity
    }
}

// =============================================================================
// Users
// =============================================================================

/// Body of `POST /users/login/`.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Successful login: a bearer access/refresh token pair.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("message", &self.message)
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Body of `POST /users/register/`.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: Email,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub contact: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("address", &self.address)
            .field("contact", &self.contact)
            .finish()
    }
}

/// Account details from `GET /users/profile/`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct UserProfile {
    pub id: Option<UserId>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

/// Body of `PUT /users/profile/`.
///
/// The current password is required for any change; `new_password` is only
/// sent when the user is changing it. Implements `Debug` manually to redact
/// both passwords.
#[derive(Clone, Default, Serialize)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub contact: String,
    pub current_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

impl ProfileUpdate {
    /// Start an update pre-filled from the current profile.
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            username: profile.username.clone(),
            email: profile.email.clone().unwrap_or_default(),
            first_name: profile.first_name.clone().unwrap_or_default(),
            last_name: profile.last_name.clone().unwrap_or_default(),
            address: profile.address.clone().unwrap_or_default(),
            contact: profile.contact.clone().unwrap_or_default(),
            current_password: String::new(),
            new_password: None,
        }
    }
}

impl std::fmt::Debug for ProfileUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileUpdate")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("address", &self.address)
            .field("contact", &self.contact)
            .field("current_password", &"[REDACTED]")
            .field(
                "new_password",
                &self.new_password.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cart_payload_missing_items_is_empty() {
        let payload: CartPayload = serde_json::from_value(json!({})).unwrap();
        assert!(payload.cart_items.is_empty());
    }

    #[test]
    fn test_order_history_shape() {
        let orders: Vec<Order> = serde_json::from_value(json!([{
            "id": 12,
            "created_at": "2025-03-01T10:15:00.123456+08:00",
            "completed_at": "2025-03-01T10:20:00Z",
            "total_price": 237.0,
            "order_items": [
                {"id": 1, "product_name": "Hotdog", "quantity": 3, "price_at_purchase": 79.0}
            ]
        }]))
        .unwrap();

        let order = &orders[0];
        assert_eq!(order.id, OrderId::new(12));
        assert_eq!(order.order_items.len(), 1);
        assert_eq!(order.order_items[0].subtotal(), order.total_price);
        assert_eq!(order.created_at.to_rfc3339(), "2025-03-01T02:15:00.123456+00:00");
    }

    #[test]
    fn test_product_to_line_item() {
        let product: Product = serde_json::from_value(json!({
            "id": 1,
            "name": "Hotdog",
            "price": 79.0,
            "image_file": "hotdog.png",
            "description": "Classic"
        }))
        .unwrap();

        let line = product.to_line_item(Quantity::new(2).unwrap());
        assert_eq!(line.id, ProductId::new(1));
        assert_eq!(line.quantity.get(), 2);
        assert_eq!(line.price, product.price);
    }

    #[test]
    fn test_profile_update_omits_empty_new_password() {
        let update = ProfileUpdate {
            username: "juan".to_string(),
            current_password: "old-pass".to_string(),
            ..ProfileUpdate::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert!(value.get("new_password").is_none());
        assert_eq!(value["current_password"], "old-pass");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let login = LoginResponse {
            message: None,
            access: "access-token-value".to_string(),
            refresh: "refresh-token-value".to_string(),
            user_id: Some(UserId::new(3)),
        };
        let debug_output = format!("{login:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("access-token-value"));
        assert!(!debug_output.contains("refresh-token-value"));

        let update = ProfileUpdate {
            current_password: "old-secret".to_string(),
            new_password: Some("new-secret".to_string()),
            ..ProfileUpdate::default()
        };
        let debug_output = format!("{update:?}");
        assert!(!debug_output.contains("old-secret"));
        assert!(!debug_output.contains("new-secret"));
    }
}
