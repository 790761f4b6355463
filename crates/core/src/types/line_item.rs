//! Cart line items.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::quantity::Quantity;

/// Glyph shown next to a line when the remote API does not send one.
pub const DEFAULT_GLYPH: &str = "🌭";

/// One product entry in the cart together with its quantity.
///
/// The serialized shape matches the remote cart endpoint:
/// `{ "id", "name", "price", "quantity", "emoji" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product identity; unique within a cart.
    pub id: ProductId,
    /// Product display name.
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Units of this product in the cart.
    pub quantity: Quantity,
    /// Display glyph for the product.
    #[serde(rename = "emoji", default = "default_glyph")]
    pub glyph: String,
}

fn default_glyph() -> String {
    DEFAULT_GLYPH.to_string()
}

impl LineItem {
    /// Create a line item with the default glyph.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Price, quantity: Quantity) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            quantity,
            glyph: default_glyph(),
        }
    }

    /// Replace the display glyph.
    #[must_use]
    pub fn with_glyph(mut self, glyph: impl Into<String>) -> Self {
        self.glyph = glyph.into();
        self
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.price * self.quantity
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn hotdog(quantity: u32) -> LineItem {
        LineItem::new(
            ProductId::new(1),
            "Hotdog",
            Price::from_centavos(7900).unwrap(),
            Quantity::new(quantity).unwrap(),
        )
    }

    #[test]
    fn test_subtotal() {
        assert_eq!(hotdog(3).subtotal(), Price::from_centavos(23700).unwrap());
    }

    #[test]
    fn test_wire_shape() {
        let value = serde_json::to_value(hotdog(2)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 1,
                "name": "Hotdog",
                "price": 79.0,
                "quantity": 2,
                "emoji": "🌭"
            })
        );
    }

    #[test]
    fn test_missing_emoji_uses_default() {
        let item: LineItem =
            serde_json::from_str(r#"{"id": 2, "name": "Corndog", "price": 55.5, "quantity": 1}"#)
                .unwrap();
        assert_eq!(item.glyph, DEFAULT_GLYPH);
        assert_eq!(item.price, Price::from_centavos(5550).unwrap());
    }

    #[test]
    fn test_zero_quantity_is_rejected_on_the_wire() {
        let result = serde_json::from_str::<LineItem>(
            r#"{"id": 2, "name": "Corndog", "price": 55.5, "quantity": 0}"#,
        );
        assert!(result.is_err());
    }
}
