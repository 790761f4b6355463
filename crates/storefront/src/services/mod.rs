//! Services built on the API client and session.
//!
//! # Services
//!
//! - `auth` - Login, signup, logout
//! - `account` - Profile and order history for the logged-in user
//! - `catalog` - Cached product list

pub mod account;
pub mod auth;
pub mod catalog;

pub use account::AccountService;
pub use auth::{AuthError, AuthService, SignupForm};
pub use catalog::Catalog;
