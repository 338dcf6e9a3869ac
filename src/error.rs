//! Error types for the device link.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use device_link::{Device, Result};
//!
//! async fn example(device: &Device) -> Result<()> {
//!     let contents = device.get_file("/etc/config").await?;
//!     println!("{contents}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidEndpoint`] |
//! | Connection | [`Error::ProviderEstablishment`], [`Error::NotConnected`], [`Error::Transport`], [`Error::ConnectionClosed`], [`Error::Superseded`], [`Error::Shutdown`] |
//! | Delivery | [`Error::SendExhausted`], [`Error::ResponseTimeout`] |
//! | Remote | [`Error::Remote`], [`Error::Protocol`] |
//! | Parsing | [`Error::Parse`], [`Error::Json`] |
//! | External | [`Error::Io`], [`Error::Base64`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when session configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Endpoint could not be parsed as a URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// The socket provider could not produce or start a connection.
    #[error("Failed to establish connection: {message}")]
    ProviderEstablishment {
        /// Description of the provider failure.
        message: String,
    },

    /// No usable connection is currently available.
    #[error("Not connected")]
    NotConnected,

    /// Writing to the current connection failed.
    #[error("Transport write failed: {message}")]
    Transport {
        /// Description of the write failure.
        message: String,
    },

    /// Connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    /// A readiness wait was invalidated by a newer connection generation.
    #[error("Connection generation {generation} was superseded")]
    Superseded {
        /// Generation the waiter was bound to.
        generation: u64,
    },

    /// The session was shut down while the operation was pending.
    #[error("Session shut down")]
    Shutdown,

    // ========================================================================
    // Delivery Errors
    // ========================================================================
    /// Every send attempt failed.
    ///
    /// Carries the wire text that could not be delivered.
    #[error("Reached maximum number of send attempts ({attempts}) for message: {message}")]
    SendExhausted {
        /// Total write attempts made.
        attempts: u32,
        /// The undeliverable wire message.
        message: String,
    },

    /// No reply with the expected name arrived before the deadline.
    #[error("No '{name}' response after {timeout_ms}ms")]
    ResponseTimeout {
        /// Reply name that was awaited.
        name: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Remote Errors
    // ========================================================================
    /// The device answered a request with an error.
    #[error("{operation} failed: {detail}")]
    Remote {
        /// Operation that failed (e.g. `getFile`).
        operation: String,
        /// Server-supplied error detail.
        detail: String,
    },

    /// A reply did not have the expected shape.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Parse Errors
    // ========================================================================
    /// Inbound frame is JSON but lacks a usable discriminator.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error.
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a provider establishment error.
    #[inline]
    pub fn provider(message: impl Into<String>) -> Self {
        Self::ProviderEstablishment {
            message: message.into(),
        }
    }

    /// Creates a transport write error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a superseded error.
    #[inline]
    pub fn superseded(generation: u64) -> Self {
        Self::Superseded { generation }
    }

    /// Creates a send exhausted error.
    #[inline]
    pub fn send_exhausted(attempts: u32, message: impl Into<String>) -> Self {
        Self::SendExhausted {
            attempts,
            message: message.into(),
        }
    }

    /// Creates a response timeout error.
    #[inline]
    pub fn response_timeout(name: impl Into<String>, timeout_ms: u64) -> Self {
        Self::ResponseTimeout {
            name: name.into(),
            timeout_ms,
        }
    }

    /// Creates a remote error.
    #[inline]
    pub fn remote(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Remote {
            operation: operation.into(),
            detail: detail.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a parse error.
    #[inline]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Accessors & Predicates
// ============================================================================

impl Error {
    /// Returns the server-supplied detail of a [`Error::Remote`].
    #[inline]
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Remote { detail, .. } => Some(detail),
            _ => None,
        }
    }

    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ResponseTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderEstablishment { .. }
                | Self::NotConnected
                | Self::Transport { .. }
                | Self::ConnectionClosed
                | Self::Superseded { .. }
        )
    }

    /// Returns `true` if the device itself reported the failure.
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::Transport { .. }
                | Self::ConnectionClosed
                | Self::Superseded { .. }
                | Self::ResponseTimeout { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
