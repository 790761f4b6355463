//! Client-side cart with optimistic updates and debounced sync.
//!
//! # Architecture
//!
//! - Every mutation is applied to the local [`CartState`] synchronously and
//!   is visible to the next read; observers are woken through a `watch`
//!   channel
//! - Add, remove, and quantity changes schedule one debounced write of the
//!   full item list. Rapid changes collapse into a single request that
//!   carries the state at the time the timer fires
//! - Remote failures are reported as notifications; local state is never
//!   rolled back
//! - Login loads the remote cart, logout clears the local one
//!
//! # Example
//!
//! ```rust,ignore
//! use doghouse_storefront::cart::CartSynchronizer;
//!
//! let cart = CartSynchronizer::new(client, session, notifications, &config.cart);
//! cart.add_item(product.to_line_item(Quantity::ONE));
//! let receipt = cart.checkout().await?;
//! ```

mod state;
mod synchronizer;

pub use state::CartState;
pub use synchronizer::{CartSynchronizer, CheckoutError};
