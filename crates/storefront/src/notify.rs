//! Transient user notifications.
//!
//! Services push `(kind, title, message)` events into a [`NotificationSink`].
//! The [`NotificationCenter`] shows one banner at a time: a new banner
//! replaces the current one, and each banner dismisses itself after a fixed
//! time to live unless closed earlier.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, watch};

use crate::debounce::Debouncer;

/// Capacity of the notification event stream; slow subscribers skip ahead.
const EVENT_BUFFER: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// One user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

/// A display surface for notifications.
///
/// Ownership of the notification passes to the sink.
pub trait NotificationSink: Send + Sync + 'static {
    fn notify(&self, notification: Notification);
}

impl<T: NotificationSink> NotificationSink for Arc<T> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}

/// Single-banner notification display with auto-dismiss.
///
/// Cheaply cloneable via `Arc`. Must be used inside a tokio runtime, since
/// dismissal runs on a timer task.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<CenterInner>,
}

struct CenterInner {
    current: watch::Sender<Option<Notification>>,
    events: broadcast::Sender<Notification>,
    dismiss: Debouncer,
}

impl NotificationCenter {
    /// Create a center whose banners stay up for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let (current, _) = watch::channel(None);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            inner: Arc::new(CenterInner {
                current,
                events,
                dismiss: Debouncer::new(ttl),
            }),
        }
    }

    /// The banner currently on display.
    #[must_use]
    pub fn current(&self) -> Option<Notification> {
        self.inner.current.borrow().clone()
    }

    /// Dismiss the current banner now.
    pub fn close(&self) {
        self.inner.dismiss.cancel();
        self.inner.current.send_replace(None);
    }

    /// Observe the banner slot (shown, replaced, dismissed).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.inner.current.subscribe()
    }

    /// Receive every notification as it is pushed.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<Notification> {
        self.inner.events.subscribe()
    }
}

impl NotificationSink for NotificationCenter {
    fn notify(&self, notification: Notification) {
        tracing::info!(
            kind = ?notification.kind,
            title = %notification.title,
            message = %notification.message,
            "Notification"
        );

        self.inner.current.send_replace(Some(notification.clone()));
        // No subscribers is fine; the banner slot still holds it.
        let _ = self.inner.events.send(notification);

        let weak: Weak<CenterInner> = Arc::downgrade(&self.inner);
        self.inner.dismiss.schedule(async move {
            if let Some(inner) = weak.upgrade() {
                inner.current.send_replace(None);
            }
        });
    }
}
