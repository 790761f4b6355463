//! Session provider.
//!
//! Holds the logged-in state and the bearer token pair. Consumers read it
//! through [`SessionProvider::is_logged_in`] and [`SessionProvider::token`],
//! and react to logins and logouts by subscribing to a `watch` channel.
//!
//! Each login starts a new session *epoch*. Work started on behalf of one
//! session (a cart fetch, a debounced sync) compares epochs before applying
//! its result, so responses that arrive after a logout are dropped.

use std::sync::Arc;

use doghouse_core::UserId;
use secrecy::SecretString;
use tokio::sync::watch;

/// The bearer credentials for a logged-in user.
///
/// The refresh token is stored but not used: token refresh is not wired up.
#[derive(Clone)]
pub struct SessionTokens {
    pub access: SecretString,
    pub refresh: SecretString,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .finish()
    }
}

/// Snapshot of the session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    tokens: Option<SessionTokens>,
    user_id: Option<UserId>,
    epoch: u64,
}

impl SessionState {
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.tokens.is_some()
    }

    /// Current access token, if logged in.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.tokens.as_ref().map(|t| t.access.clone())
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Incremented on every login.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Shared, observable session state.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct SessionProvider {
    inner: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProvider {
    /// Create a logged-out session.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(tx),
        }
    }

    /// Store a fresh token pair and mark the session logged in.
    ///
    /// Logging in while already logged in replaces the tokens and still
    /// starts a new epoch.
    pub fn login(&self, tokens: SessionTokens, user_id: Option<UserId>) {
        self.inner.send_modify(|state| {
            state.tokens = Some(tokens);
            state.user_id = user_id;
            state.epoch += 1;
        });
        tracing::info!(user_id = ?user_id, "Session started");
    }

    /// Forget the tokens and mark the session logged out.
    ///
    /// No-op when already logged out.
    pub fn logout(&self) {
        let changed = self.inner.send_if_modified(|state| {
            if state.tokens.is_none() {
                return false;
            }
            state.tokens = None;
            state.user_id = None;
            true
        });
        if changed {
            tracing::info!("Session ended");
        }
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.inner.borrow().is_logged_in()
    }

    /// Current bearer access token, or `None` when logged out.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner.borrow().token()
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.inner.borrow().clone()
    }

    /// Whether the session that had `epoch` is still the live one.
    #[must_use]
    pub fn is_current(&self, epoch: u64) -> bool {
        let state = self.inner.borrow();
        state.is_logged_in() && state.epoch == epoch
    }

    /// Receive a notification on every login and logout.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.subscribe()
    }
}
