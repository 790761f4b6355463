//! Keeps the local cart and the remote cart in step.

use std::sync::{Arc, Weak};

use doghouse_core::{LineItem, ProductId, Quantity};
use secrecy::SecretString;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::state::{CartState, Merge};
use crate::api::{ApiError, CartApi, CheckoutReceipt};
use crate::config::CartConfig;
use crate::debounce::Debouncer;
use crate::error::add_breadcrumb;
use crate::notify::{Notification, NotificationSink};
use crate::session::{SessionProvider, SessionState};

const BREADCRUMB_CATEGORY: &str = "cart";

/// Why a checkout did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("You must be logged in to checkout")]
    NotLoggedIn,

    #[error("Your cart is empty")]
    EmptyCart,

    /// The server refused the order.
    #[error("{0}")]
    Rejected(String),

    #[error("Network error during checkout")]
    Connection,
}

impl CheckoutError {
    /// Title of the notification shown for this failure.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Connection => "Connection Error",
            Self::NotLoggedIn | Self::EmptyCart | Self::Rejected(_) => "Checkout Failed",
        }
    }
}

impl From<ApiError> for CheckoutError {
    fn from(err: ApiError) -> Self {
        if err.is_transport() {
            return Self::Connection;
        }
        Self::Rejected(
            err.server_message()
                .unwrap_or_else(|| "Checkout failed".to_string()),
        )
    }
}

/// Client-side cart backed by a remote cart service.
///
/// Owns the cart state, the pending sync, and a task that follows the
/// session. Dropping it cancels both background tasks.
///
/// Must be created inside a tokio runtime.
pub struct CartSynchronizer<A, N>
where
    A: CartApi,
    N: NotificationSink,
{
    inner: Arc<Inner<A, N>>,
    watcher: JoinHandle<()>,
}

struct Inner<A, N> {
    api: A,
    notifier: N,
    session: SessionProvider,
    state: watch::Sender<CartState>,
    sync: Debouncer,
}

impl<A, N> CartSynchronizer<A, N>
where
    A: CartApi,
    N: NotificationSink,
{
    /// Create an empty cart that follows `session`.
    ///
    /// If the session is already logged in, the remote cart is fetched
    /// right away.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn new(api: A, session: SessionProvider, notifier: N, config: &CartConfig) -> Self {
        let (state, _) = watch::channel(CartState::default());
        let mut updates = session.subscribe();
        // Taken now rather than when the watcher first runs, so transitions
        // before then are still seen as changes.
        let initial = updates.borrow_and_update().clone();
        let inner = Arc::new(Inner {
            api,
            notifier,
            session,
            state,
            sync: Debouncer::new(config.sync_debounce),
        });

        let watcher = tokio::spawn(follow_session(Arc::downgrade(&inner), initial, updates));

        Self { inner, watcher }
    }

    /// A copy of the current cart.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    /// Observe every applied change to the cart.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    /// Add `item` to the cart, or increase the quantity of its existing line.
    ///
    /// Requires a logged-in session; otherwise the cart is left as is and a
    /// "Login Required" notification is shown.
    #[instrument(skip(self, item), fields(product_id = %item.id, quantity = %item.quantity))]
    pub fn add_item(&self, item: LineItem) {
        if !self.inner.session.is_logged_in() {
            debug!("Add to cart rejected: not logged in");
            self.inner.notifier.notify(Notification::error(
                "Login Required",
                "Please log in to add items to your cart",
            ));
            return;
        }

        let product_id = item.id.to_string();
        let name = item.name.clone();
        let mut merged = Merge::Added;
        self.inner.state.send_modify(|state| merged = state.merge(item));

        add_breadcrumb(
            BREADCRUMB_CATEGORY,
            "Added item to cart",
            Some(&[("product_id", product_id.as_str())]),
        );
        let notification = match merged {
            Merge::Added => {
                Notification::success("Added to Cart", format!("{name} added to your cart"))
            }
            Merge::Increased(total) => Notification::success(
                "Updated Cart",
                format!("{name} quantity updated to {total}"),
            ),
        };
        self.inner.notifier.notify(notification);
        self.inner.schedule_sync();
    }

    /// Remove the line for `id`. Does nothing if there is none.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn remove_item(&self, id: ProductId) {
        let mut removed = None;
        self.inner.state.send_if_modified(|state| {
            removed = state.remove(id);
            removed.is_some()
        });
        let Some(item) = removed else {
            debug!("Remove ignored: product not in cart");
            return;
        };

        let product_id = id.to_string();
        add_breadcrumb(
            BREADCRUMB_CATEGORY,
            "Removed item from cart",
            Some(&[("product_id", product_id.as_str())]),
        );
        self.inner.notifier.notify(Notification::success(
            "Removed from Cart",
            format!("{} removed from your cart", item.name),
        ));
        self.inner.schedule_sync();
    }

    /// Set the quantity of the line for `id`. Zero removes the line.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn update_quantity(&self, id: ProductId, quantity: u32) {
        let Ok(quantity) = Quantity::new(quantity) else {
            self.remove_item(id);
            return;
        };

        let mut updated = None;
        self.inner.state.send_if_modified(|state| {
            updated = state.set_quantity(id, quantity);
            updated.is_some()
        });
        let Some(name) = updated else {
            debug!("Quantity update ignored: product not in cart");
            return;
        };

        let product_id = id.to_string();
        let quantity_text = quantity.to_string();
        add_breadcrumb(
            BREADCRUMB_CATEGORY,
            "Changed item quantity",
            Some(&[
                ("product_id", product_id.as_str()),
                ("quantity", quantity_text.as_str()),
            ]),
        );
        self.inner.notifier.notify(Notification::success(
            "Cart Updated",
            format!("{name} quantity updated to {quantity}"),
        ));
        self.inner.schedule_sync();
    }

    /// Empty the cart locally.
    ///
    /// Does not write to the server; a sync already pending still fires and
    /// sends whatever the cart holds by then.
    #[instrument(skip(self))]
    pub fn clear_cart(&self) {
        self.inner.state.send_modify(CartState::clear);
        add_breadcrumb(BREADCRUMB_CATEGORY, "Cleared cart", None);
        self.inner.notifier.notify(Notification::success(
            "Cart Cleared",
            "All items have been removed from your cart",
        ));
    }

    pub fn open_cart(&self) {
        self.inner.state.send_if_modified(|state| state.set_open(true));
    }

    pub fn close_cart(&self) {
        self.inner.state.send_if_modified(|state| state.set_open(false));
    }

    /// Place an order for the server-side cart.
    ///
    /// Unsent local edits are pushed first; if that push fails no order is
    /// placed. On success the local cart is emptied and the server's receipt
    /// is returned. `is_loading` is set for the whole attempt.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotLoggedIn`] or [`CheckoutError::EmptyCart`]
    /// without contacting the server, [`CheckoutError::Rejected`] when the
    /// server refuses the edits or the order, and
    /// [`CheckoutError::Connection`] when it cannot be reached.
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> Result<CheckoutReceipt, CheckoutError> {
        let session = self.inner.session.snapshot();
        let Some(token) = session.token() else {
            return Err(self.inner.checkout_failed(CheckoutError::NotLoggedIn));
        };
        let is_empty = self.inner.state.borrow().is_empty();
        if is_empty {
            return Err(self.inner.checkout_failed(CheckoutError::EmptyCart));
        }

        self.inner.state.send_if_modified(|state| state.set_loading(true));
        add_breadcrumb(BREADCRUMB_CATEGORY, "Checkout started", None);

        // The server orders its own copy, so unsent edits must land first.
        if self.inner.sync.is_pending() {
            self.inner.sync.cancel();
            if let Err(err) = self.inner.push_remote(session.epoch()).await {
                warn!(error = %err, "Could not save cart before checkout");
                return Err(self.inner.abort_checkout(err));
            }
        }

        match self.inner.api.checkout(&token).await {
            Ok(receipt) => {
                self.inner.state.send_modify(|state| {
                    state.clear();
                    state.set_loading(false);
                });
                info!("Order placed");
                self.inner.notifier.notify(Notification::success(
                    "Order Placed",
                    "Your order has been placed successfully!",
                ));
                Ok(receipt)
            }
            Err(err) => {
                warn!(error = %err, "Checkout failed");
                Err(self.inner.abort_checkout(err))
            }
        }
    }
}

impl<A, N> Drop for CartSynchronizer<A, N>
where
    A: CartApi,
    N: NotificationSink,
{
    fn drop(&mut self) {
        self.watcher.abort();
        self.inner.sync.cancel();
    }
}

impl<A, N> Inner<A, N>
where
    A: CartApi,
    N: NotificationSink,
{
    /// Access token for the session with `epoch`, if it is still live.
    fn token_for(&self, epoch: u64) -> Option<SecretString> {
        let session = self.session.snapshot();
        (session.epoch() == epoch).then(|| session.token()).flatten()
    }

    fn checkout_failed(&self, err: CheckoutError) -> CheckoutError {
        self.notifier
            .notify(Notification::error(err.title(), err.to_string()));
        err
    }

    fn abort_checkout(&self, err: ApiError) -> CheckoutError {
        self.state.send_if_modified(|state| state.set_loading(false));
        self.checkout_failed(CheckoutError::from(err))
    }

    /// Debounce a write of the full cart for the current session.
    fn schedule_sync(self: &Arc<Self>) {
        let epoch = self.session.snapshot().epoch();
        let inner = Arc::downgrade(self);
        self.sync.schedule(async move {
            if let Some(inner) = inner.upgrade()
                && let Err(err) = inner.push_remote(epoch).await
            {
                inner.report_sync_error(&err);
            }
        });
    }

    /// Write the cart as it is now. Skipped if the session has ended.
    #[instrument(skip(self))]
    async fn push_remote(&self, epoch: u64) -> Result<(), ApiError> {
        let Some(token) = self.token_for(epoch) else {
            debug!("Session ended before sync; skipping");
            return Ok(());
        };
        let items = self.state.borrow().items().to_vec();

        self.api.save_cart(&token, &items).await?;
        debug!(items = items.len(), "Cart synced");
        Ok(())
    }

    /// Surface a failed background sync. Local state is kept as is.
    fn report_sync_error(&self, err: &ApiError) {
        if matches!(err, ApiError::Unauthorized) {
            warn!("Cart sync rejected: access token no longer valid");
            return;
        }
        warn!(error = %err, "Cart sync failed");
        let message = if err.is_transport() {
            "Could not connect to the server".to_string()
        } else {
            err.server_message()
                .unwrap_or_else(|| "Failed to save cart changes".to_string())
        };
        self.notifier
            .notify(Notification::error("Sync Error", message));
    }

    fn spawn_fetch(self: &Arc<Self>, epoch: u64) {
        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.fetch_remote(epoch).await });
    }

    /// Replace the local cart with the server's copy.
    ///
    /// The response is dropped if the session it was requested for is no
    /// longer the live one.
    #[instrument(skip(self))]
    async fn fetch_remote(&self, epoch: u64) {
        let Some(token) = self.token_for(epoch) else {
            return;
        };
        self.state.send_if_modified(|state| state.set_loading(true));

        let result = self.api.fetch_cart(&token).await;

        if !self.session.is_current(epoch) {
            debug!("Dropping cart fetched for an ended session");
            return;
        }

        match result {
            Ok(items) => {
                let count = items.len();
                self.state.send_modify(|state| {
                    state.replace(items);
                    state.set_loading(false);
                });
                info!(items = count, "Loaded remote cart");
            }
            Err(err) => {
                self.state.send_if_modified(|state| state.set_loading(false));
                self.report_fetch_error(&err);
            }
        }
    }

    fn report_fetch_error(&self, err: &ApiError) {
        let notification = match err {
            ApiError::Unauthorized => {
                warn!("Cart fetch rejected: access token no longer valid");
                return;
            }
            err if err.is_transport() => {
                Notification::error("Connection Error", "Could not connect to the server")
            }
            err => Notification::error(
                "Cart Error",
                err.server_message()
                    .unwrap_or_else(|| "Failed to load your cart".to_string()),
            ),
        };
        warn!(error = %err, "Failed to load remote cart");
        self.notifier.notify(notification);
    }

    /// Forget the local cart after logout.
    fn reset(&self) {
        self.sync.cancel();
        self.state.send_if_modified(|state| {
            let had_items = !state.is_empty();
            state.clear();
            let was_loading = state.set_loading(false);
            had_items || was_loading
        });
        debug!("Local cart cleared after logout");
    }
}

/// Load the remote cart on login and drop the local one on logout.
async fn follow_session<A, N>(
    inner: Weak<Inner<A, N>>,
    mut last: SessionState,
    mut updates: watch::Receiver<SessionState>,
) where
    A: CartApi,
    N: NotificationSink,
{
    if last.is_logged_in() {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        inner.spawn_fetch(last.epoch());
    }

    while updates.changed().await.is_ok() {
        let current = updates.borrow_and_update().clone();
        let Some(inner) = inner.upgrade() else {
            return;
        };

        // `watch` only keeps the latest value, so whole sessions can pass
        // unseen. An epoch more than one ahead means at least one session
        // ended between two observations.
        let ended_unseen = current.epoch() > last.epoch() + 1;

        if current.is_logged_in() {
            if current.epoch() != last.epoch() {
                if last.is_logged_in() || ended_unseen {
                    inner.reset();
                }
                inner.spawn_fetch(current.epoch());
            }
        } else if last.is_logged_in() || current.epoch() != last.epoch() {
            inner.reset();
        }

        last = current;
    }
}
