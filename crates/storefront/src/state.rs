//! Storefront state shared by the presentation layer.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::cart::CartSynchronizer;
use crate::config::StorefrontConfig;
use crate::notify::NotificationCenter;
use crate::services::{AccountService, AuthService, Catalog};
use crate::session::SessionProvider;

/// The cart synchronizer wired to the real API client and notification center.
pub type Cart = CartSynchronizer<ApiClient, NotificationCenter>;

/// Everything a storefront front end needs.
///
/// This struct is cheaply cloneable via `Arc`. The session and notification
/// center are created here and shared by every service, so a login through
/// [`Storefront::auth`] is seen by the cart.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    session: SessionProvider,
    notifications: NotificationCenter,
    cart: Cart,
    auth: AuthService,
    account: AccountService,
    catalog: Catalog,
}

impl Storefront {
    /// Create the storefront.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let client = ApiClient::new(&config.api)?;
        let session = SessionProvider::new();
        let notifications = NotificationCenter::new(config.notification_ttl);

        let cart = CartSynchronizer::new(
            client.clone(),
            session.clone(),
            notifications.clone(),
            &config.cart,
        );
        let auth = AuthService::new(client.clone(), session.clone());
        let account = AccountService::new(client.clone(), session.clone(), config.auth_check_delay);
        let catalog = Catalog::new(client);

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                session,
                notifications,
                cart,
                auth,
                account,
                catalog,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &SessionProvider {
        &self.inner.session
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationCenter {
        &self.inner.notifications
    }

    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.inner.cart
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn account(&self) -> &AccountService {
        &self.inner.account
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }
}
