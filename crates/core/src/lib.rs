//! Doghouse Core - Shared types library.
//!
//! This crate provides common types used across all Doghouse components:
//! - `storefront` - Remote API client, session, and cart synchronization
//! - `cli` - Terminal storefront shell
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, quantities,
//!   emails, and cart line items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
