//! Session configuration.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SessionConfig`] | Endpoint, delays, retry and throttle settings |
//! | [`SessionConfigBuilder`] | Fluent, validating builder |
//! | [`ReconnectPolicy`] | Delay between a close and the next reconnect |
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use device_link::SessionConfig;
//!
//! # fn example() -> device_link::Result<()> {
//! let config = SessionConfig::builder()
//!     .host("raspberrypi.local:8443")
//!     .max_send_retries(5)
//!     .response_timeout(Duration::from_secs(30))
//!     .build()?;
//!
//! assert_eq!(config.endpoint.as_str(), "wss://raspberrypi.local:8443/ws");
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Reconnect backoff policy.
pub mod backoff;

/// Fluent builder for [`SessionConfig`].
pub mod builder;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Re-exports
// ============================================================================

pub use backoff::ReconnectPolicy;
pub use builder::SessionConfigBuilder;

// ============================================================================
// Constants
// ============================================================================

/// Delay between the socket reporting `open` and the connection counting as ready.
///
/// Providers may fire `open` one tick before the transport accepts writes.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Delay between a close and the scheduled reconnect.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(15);

/// Retries after the first failed write.
pub const DEFAULT_MAX_SEND_RETRIES: u32 = 10;

/// Delay between send retries.
pub const DEFAULT_SEND_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Minimum gap between two remote-error notifications.
pub const DEFAULT_REMOTE_ERROR_COOLDOWN: Duration = Duration::from_secs(5);

/// Minimum gap between two connection-closed notifications.
pub const DEFAULT_CONNECTION_CLOSED_COOLDOWN: Duration = Duration::from_secs(10);

/// Display duration for notifications that don't set their own.
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_secs(3);

/// Path the device serves its WebSocket on.
const ENDPOINT_PATH: &str = "/ws";

// ============================================================================
// SessionConfig
// ============================================================================

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// WebSocket endpoint of the device.
    pub endpoint: Url,

    /// Delay after `open` before the connection is ready.
    pub settle_delay: Duration,

    /// Delay policy for reconnects after a close.
    pub reconnect: ReconnectPolicy,

    /// Retries after the first failed write.
    pub max_send_retries: u32,

    /// Delay between send retries.
    pub send_retry_delay: Duration,

    /// Default deadline for awaited replies (`None` waits forever).
    pub response_timeout: Option<Duration>,

    /// Cooldown for remote-error notifications.
    pub remote_error_cooldown: Duration,

    /// Cooldown for connection-closed notifications.
    pub connection_closed_cooldown: Duration,

    /// Display duration for notifications without their own.
    pub notification_duration: Duration,
}

// ============================================================================
// Constructors
// ============================================================================

impl SessionConfig {
    /// Creates a configuration for `endpoint` with default settings.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            settle_delay: DEFAULT_SETTLE_DELAY,
            reconnect: ReconnectPolicy::default(),
            max_send_retries: DEFAULT_MAX_SEND_RETRIES,
            send_retry_delay: DEFAULT_SEND_RETRY_DELAY,
            response_timeout: None,
            remote_error_cooldown: DEFAULT_REMOTE_ERROR_COOLDOWN,
            connection_closed_cooldown: DEFAULT_CONNECTION_CLOSED_COOLDOWN,
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
        }
    }

    /// Creates a configuration for the device serving `host`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if `host` does not form a valid URL.
    pub fn for_host(host: &str) -> Result<Self> {
        Ok(Self::new(Self::endpoint_for_host(host)?))
    }

    /// Derives the endpoint URL from the host the application was served from.
    ///
    /// Format: `wss://{host}/ws`
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `host` is empty
    /// - [`Error::InvalidEndpoint`] if the URL cannot be parsed
    pub fn endpoint_for_host(host: &str) -> Result<Url> {
        let host = host.trim();
        if host.is_empty() {
            return Err(Error::config("host must not be empty"));
        }
        Ok(Url::parse(&format!("wss://{host}{ENDPOINT_PATH}"))?)
    }

    /// Returns a builder for a validated configuration.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SessionConfig {
    /// Sets the settle delay.
    #[inline]
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the reconnect policy.
    #[inline]
    #[must_use]
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Sets the number of retries after the first failed write.
    #[inline]
    #[must_use]
    pub fn with_max_send_retries(mut self, retries: u32) -> Self {
        self.max_send_retries = retries;
        self
    }

    /// Sets the delay between send retries.
    #[inline]
    #[must_use]
    pub fn with_send_retry_delay(mut self, delay: Duration) -> Self {
        self.send_retry_delay = delay;
        self
    }

    /// Sets the default reply deadline.
    #[inline]
    #[must_use]
    pub fn with_response_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Sets both notification cooldowns.
    #[inline]
    #[must_use]
    pub fn with_cooldowns(mut self, remote_error: Duration, connection_closed: Duration) -> Self {
        self.remote_error_cooldown = remote_error;
        self.connection_closed_cooldown = connection_closed;
        self
    }

    /// Sets the default notification display duration.
    #[inline]
    #[must_use]
    pub fn with_notification_duration(mut self, duration: Duration) -> Self {
        self.notification_duration = duration;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
