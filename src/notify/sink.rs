//! Notification sink interface and built-in sinks.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{info, warn};

use crate::config::DEFAULT_NOTIFICATION_DURATION;

// ============================================================================
// Types
// ============================================================================

/// Visual style of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    /// Fault shown to the user.
    #[default]
    Error,
    /// Confirmation of a completed action.
    Success,
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Text to display.
    pub content: String,
    /// How long the notification stays visible.
    pub duration: Duration,
    /// Display style.
    pub severity: Severity,
}

impl Notification {
    /// Creates an error notification with the default duration.
    #[inline]
    #[must_use]
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            duration: DEFAULT_NOTIFICATION_DURATION,
            severity: Severity::Error,
        }
    }

    /// Creates a success notification with the default duration.
    #[inline]
    #[must_use]
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            duration: DEFAULT_NOTIFICATION_DURATION,
            severity: Severity::Success,
        }
    }

    /// Sets the display duration.
    #[inline]
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Handle to a shown notification, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationToken(u64);

impl NotificationToken {
    /// Wraps a sink-specific identifier.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the identifier.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.0
    }
}

// ============================================================================
// NotificationSink
// ============================================================================

/// Displays notifications to the user.
///
/// Implementations must not call back into the notifier from `show` or
/// `cancel`.
pub trait NotificationSink: Send + Sync {
    /// Shows a notification and returns a token for cancelling it.
    fn show(&self, notification: &Notification) -> NotificationToken;

    /// Removes a notification if it is still visible.
    fn cancel(&self, token: NotificationToken);
}

// ============================================================================
// TracingSink
// ============================================================================

/// Sink that writes notifications to the `tracing` log.
#[derive(Debug, Default)]
pub struct TracingSink {
    next_id: AtomicU64,
}

impl TracingSink {
    /// Creates a new tracing sink.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationSink for TracingSink {
    fn show(&self, notification: &Notification) -> NotificationToken {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let duration_ms = notification.duration.as_millis() as u64;

        match notification.severity {
            Severity::Error => warn!(id, duration_ms, "{}", notification.content),
            Severity::Success => info!(id, duration_ms, "{}", notification.content),
        }

        NotificationToken::new(id)
    }

    fn cancel(&self, _token: NotificationToken) {}
}

// ============================================================================
// NullSink
// ============================================================================

/// Sink that discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn show(&self, _notification: &Notification) -> NotificationToken {
        NotificationToken::new(0)
    }

    fn cancel(&self, _token: NotificationToken) {}
}

// ============================================================================
// Tests
// ============================================================================
