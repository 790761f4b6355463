//! Core types for Doghouse.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod line_item;
pub mod price;
pub mod quantity;

pub use email::{Email, EmailError};
pub use id::*;
pub use line_item::{DEFAULT_GLYPH, LineItem};
pub use price::{Price, PriceError};
pub use quantity::{Quantity, QuantityError};
