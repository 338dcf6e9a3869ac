//! User-facing fault notification.
//!
//! The [`FaultNotifier`] decides *whether* something is shown; a
//! [`NotificationSink`] decides *how*. Two fault categories are throttled,
//! each on its own cooldown, so a flapping connection or a chatty device
//! cannot flood the user. At most one notification is visible at a time: a
//! new one cancels the previous one before it is shown.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`FaultNotifier`] | Throttling and single-slot display |
//! | [`FaultCategory`] | Throttled fault kinds |
//! | [`NotificationSink`] | External display interface |
//! | [`TracingSink`] / [`NullSink`] | Built-in sinks |

// ============================================================================
// Submodules
// ============================================================================

/// Notification sink interface and built-in sinks.
pub mod sink;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::{
    DEFAULT_CONNECTION_CLOSED_COOLDOWN, DEFAULT_NOTIFICATION_DURATION,
    DEFAULT_REMOTE_ERROR_COOLDOWN, SessionConfig,
};

// ============================================================================
// Re-exports
// ============================================================================

pub use sink::{Notification, NotificationSink, NotificationToken, NullSink, Severity, TracingSink};

// ============================================================================
// FaultCategory
// ============================================================================

/// Throttled fault kinds, each with an independent cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultCategory {
    /// The device reported an error.
    RemoteError,
    /// The connection closed.
    ConnectionClosed,
}

impl FaultCategory {
    /// Slot in the throttle table.
    const fn index(self) -> usize {
        match self {
            Self::RemoteError => 0,
            Self::ConnectionClosed => 1,
        }
    }

    /// Returns the category name used in logs.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RemoteError => "remote-error",
            Self::ConnectionClosed => "connection-closed",
        }
    }
}

impl fmt::Display for FaultCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FaultNotifier
// ============================================================================

/// Rate-limits and displays user-facing notifications.
pub struct FaultNotifier {
    /// Display backend.
    sink: Arc<dyn NotificationSink>,
    /// Cooldown per category, indexed by [`FaultCategory::index`].
    cooldowns: [Duration; 2],
    /// Duration for notifications that don't specify one.
    default_duration: Duration,
    /// Last emission per category.
    last_notified: Mutex<[Option<Instant>; 2]>,
    /// Token of the visible notification.
    active: Mutex<Option<NotificationToken>>,
}

impl fmt::Debug for FaultNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultNotifier")
            .field("cooldowns", &self.cooldowns)
            .field("default_duration", &self.default_duration)
            .field("active", &*self.active.lock())
            .finish_non_exhaustive()
    }
}

impl FaultNotifier {
    /// Creates a notifier with default cooldowns.
    #[must_use]
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            cooldowns: [
                DEFAULT_REMOTE_ERROR_COOLDOWN,
                DEFAULT_CONNECTION_CLOSED_COOLDOWN,
            ],
            default_duration: DEFAULT_NOTIFICATION_DURATION,
            last_notified: Mutex::new([None; 2]),
            active: Mutex::new(None),
        }
    }

    /// Creates a notifier using the cooldowns and duration of `config`.
    #[must_use]
    pub fn from_config(config: &SessionConfig, sink: Arc<dyn NotificationSink>) -> Self {
        let mut notifier = Self::new(sink);
        notifier.cooldowns = [
            config.remote_error_cooldown,
            config.connection_closed_cooldown,
        ];
        notifier.default_duration = config.notification_duration;
        notifier
    }

    /// Overrides the cooldown of one category.
    #[inline]
    #[must_use]
    pub fn with_cooldown(mut self, category: FaultCategory, cooldown: Duration) -> Self {
        self.cooldowns[category.index()] = cooldown;
        self
    }

    /// Returns the cooldown of `category`.
    #[inline]
    #[must_use]
    pub fn cooldown(&self, category: FaultCategory) -> Duration {
        self.cooldowns[category.index()]
    }

    /// Shows an error notification unless `category` is cooling down.
    ///
    /// Returns `true` if the notification was shown. Suppressed
    /// notifications are dropped, not queued.
    pub fn notify(&self, category: FaultCategory, message: impl Into<String>) -> bool {
        self.notify_with(category, message, self.default_duration)
    }

    /// Like [`notify`](Self::notify) with an explicit display duration.
    pub fn notify_with(
        &self,
        category: FaultCategory,
        message: impl Into<String>,
        duration: Duration,
    ) -> bool {
        let now = Instant::now();
        let cooldown = self.cooldown(category);

        {
            let mut last_notified = self.last_notified.lock();
            let slot = &mut last_notified[category.index()];

            if let Some(previous) = *slot
                && now.duration_since(previous) <= cooldown
            {
                debug!(%category, "Notification suppressed by cooldown");
                return false;
            }

            *slot = Some(now);
        }

        self.show(Notification::error(message).with_duration(duration));
        true
    }

    /// Shows an error notification immediately, without throttling.
    pub fn notify_now(&self, message: impl Into<String>) {
        self.show(Notification::error(message).with_duration(self.default_duration));
    }

    /// Shows a success notification.
    pub fn success(&self, message: impl Into<String>, duration: Duration) {
        self.show(Notification::success(message).with_duration(duration));
    }

    /// Shows `notification`, replacing the visible one.
    pub fn show(&self, notification: Notification) {
        let mut active = self.active.lock();

        if let Some(previous) = active.take() {
            self.sink.cancel(previous);
        }

        *active = Some(self.sink.show(&notification));
    }

    /// Cancels the visible notification. Returns `false` if none was shown.
    pub fn dismiss(&self) -> bool {
        match self.active.lock().take() {
            Some(token) => {
                self.sink.cancel(token);
                true
            }
            None => false,
        }
    }

    /// Returns the token of the visible notification.
    #[inline]
    #[must_use]
    pub fn active(&self) -> Option<NotificationToken> {
        *self.active.lock()
    }
}

// ============================================================================
// Tests
// ============================================================================
