//! Line item quantity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantities start at one; a zero quantity means "remove the line".
    #[error("quantity must be at least 1")]
    Zero,
}

/// How many units of a product a cart line holds. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a new quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Zero`] if `value` is zero.
    pub fn new(value: u32) -> Result<Self, QuantityError> {
        NonZeroU32::new(value).map(Self).ok_or(QuantityError::Zero)
    }

    /// Get the quantity as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Add two quantities, clamping at `u32::MAX`.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.get()))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_rejected() {
        assert_eq!(Quantity::new(0), Err(QuantityError::Zero));
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }

    #[test]
    fn test_saturating_add() {
        let one = Quantity::ONE;
        let two = Quantity::new(2).unwrap();
        assert_eq!(one.saturating_add(two).get(), 3);

        let max = Quantity::new(u32::MAX).unwrap();
        assert_eq!(max.saturating_add(one).get(), u32::MAX);
    }

    #[test]
    fn test_serde_as_number() {
        let q = Quantity::new(4).unwrap();
        assert_eq!(serde_json::to_string(&q).unwrap(), "4");
        assert_eq!(serde_json::from_str::<Quantity>("4").unwrap(), q);
    }
}
