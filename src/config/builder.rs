//! Builder pattern for session configuration.
//!
//! Provides a fluent API for creating a validated [`SessionConfig`].
//!
//! # Example
//!
//! ```
//! use device_link::{ReconnectPolicy, SessionConfig};
//! use std::time::Duration;
//!
//! # fn example() -> device_link::Result<()> {
//! let config = SessionConfig::builder()
//!     .endpoint("ws://127.0.0.1:9000/ws")
//!     .reconnect(ReconnectPolicy::exponential(
//!         Duration::from_secs(1),
//!         Duration::from_secs(30),
//!     ))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

use super::{ReconnectPolicy, SessionConfig};

// ============================================================================
// SessionConfigBuilder
// ============================================================================

/// Builder for configuring a [`SessionConfig`].
///
/// Use [`SessionConfig::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct SessionConfigBuilder {
    /// Host the application was served from.
    host: Option<String>,
    /// Explicit endpoint URL.
    endpoint: Option<String>,
    settle_delay: Option<Duration>,
    reconnect: Option<ReconnectPolicy>,
    max_send_retries: Option<u32>,
    send_retry_delay: Option<Duration>,
    response_timeout: Option<Duration>,
    remote_error_cooldown: Option<Duration>,
    connection_closed_cooldown: Option<Duration>,
    notification_duration: Option<Duration>,
}

// ============================================================================
// SessionConfigBuilder Implementation
// ============================================================================

impl SessionConfigBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the endpoint from a host (`wss://{host}/ws`).
    #[inline]
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets an explicit endpoint URL (`ws://` or `wss://`).
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the delay between `open` and readiness.
    #[inline]
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = Some(delay);
        self
    }

    /// Sets the reconnect policy.
    #[inline]
    #[must_use]
    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = Some(policy);
        self
    }

    /// Sets the retries after the first failed write.
    #[inline]
    #[must_use]
    pub fn max_send_retries(mut self, retries: u32) -> Self {
        self.max_send_retries = Some(retries);
        self
    }

    /// Sets the delay between send retries.
    #[inline]
    #[must_use]
    pub fn send_retry_delay(mut self, delay: Duration) -> Self {
        self.send_retry_delay = Some(delay);
        self
    }

    /// Sets the default deadline for awaited replies.
    #[inline]
    #[must_use]
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }

    /// Sets the remote-error notification cooldown.
    #[inline]
    #[must_use]
    pub fn remote_error_cooldown(mut self, cooldown: Duration) -> Self {
        self.remote_error_cooldown = Some(cooldown);
        self
    }

    /// Sets the connection-closed notification cooldown.
    #[inline]
    #[must_use]
    pub fn connection_closed_cooldown(mut self, cooldown: Duration) -> Self {
        self.connection_closed_cooldown = Some(cooldown);
        self
    }

    /// Sets the default notification display duration.
    #[inline]
    #[must_use]
    pub fn notification_duration(mut self, duration: Duration) -> Self {
        self.notification_duration = Some(duration);
        self
    }

    /// Builds the configuration with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if neither or both of host and endpoint are set
    /// - [`Error::Config`] if the endpoint scheme is not `ws` or `wss`
    /// - [`Error::InvalidEndpoint`] if the endpoint cannot be parsed
    pub fn build(self) -> Result<SessionConfig> {
        let endpoint = self.validate_endpoint()?;
        let mut config = SessionConfig::new(endpoint);

        if let Some(delay) = self.settle_delay {
            config.settle_delay = delay;
        }
        if let Some(policy) = self.reconnect {
            config.reconnect = policy;
        }
        if let Some(retries) = self.max_send_retries {
            config.max_send_retries = retries;
        }
        if let Some(delay) = self.send_retry_delay {
            config.send_retry_delay = delay;
        }
        if let Some(cooldown) = self.remote_error_cooldown {
            config.remote_error_cooldown = cooldown;
        }
        if let Some(cooldown) = self.connection_closed_cooldown {
            config.connection_closed_cooldown = cooldown;
        }
        if let Some(duration) = self.notification_duration {
            config.notification_duration = duration;
        }
        config.response_timeout = self.response_timeout;

        Ok(config)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SessionConfigBuilder {
    /// Resolves the endpoint from host or explicit URL.
    fn validate_endpoint(&self) -> Result<Url> {
        let url = match (&self.host, &self.endpoint) {
            (Some(host), None) => SessionConfig::endpoint_for_host(host)?,
            (None, Some(endpoint)) => Url::parse(endpoint)?,
            (Some(_), Some(_)) => {
                return Err(Error::config(
                    "Set either .host() or .endpoint(), not both.",
                ));
            }
            (None, None) => {
                return Err(Error::config(
                    "Device endpoint is required. Use .host() or .endpoint() to set it.\n\
                     Example: SessionConfig::builder().host(\"raspberrypi.local\")",
                ));
            }
        };

        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(Error::config(format!(
                "Endpoint scheme must be ws or wss, got: {other}"
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
