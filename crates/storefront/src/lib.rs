//! Doghouse storefront client library.
//!
//! Talks to the remote storefront API and keeps client-side state: the
//! session, the cart (optimistic local edits with debounced sync), and
//! transient notifications. Presentation layers build a [`Storefront`] and
//! call its services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod debounce;
pub mod error;
pub mod notify;
pub mod services;
pub mod session;
pub mod state;

pub use state::Storefront;
