//! Device Link - Persistent WebSocket session to a single remote device.
//!
//! This library keeps one logical connection to a device alive over an
//! unreliable transport, correlates named replies with outstanding requests
//! and tells the user about faults without flooding them.
//!
//! # Architecture
//!
//! The session follows a client-device model:
//!
//! - **Local End (Rust)**: Sends JSON commands, receives named JSON messages
//! - **Remote End (Device)**: Serves `wss://<host>/ws`, answers every command
//!   with a message named after it and may push `error` messages at any time
//!
//! Key design principles:
//!
//! - Every reconnect starts a new generation: new socket, new handler, new
//!   readiness. Events from older generations are ignored
//! - Replies are matched by name, not by id; register before sending
//! - Writes wait for readiness and are retried with a forced reconnect
//! - At most one notification is visible; faults are throttled per category
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use device_link::{Device, Result, SessionConfig, TracingSink, WsProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SessionConfig::for_host("device.local")?;
//!     let device = Device::connect(
//!         config,
//!         Arc::new(WsProvider::new()),
//!         Arc::new(TracingSink::new()),
//!     );
//!
//!     let contents = device.get_file("/etc/hostname").await?;
//!     println!("base64: {}", contents);
//!
//!     device.session().shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Session configuration and reconnect policy |
//! | [`device`] | High-level operations: [`Device`], [`FileSink`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`notify`] | Throttled user notification |
//! | [`protocol`] | Command and message types |
//! | [`session`] | Connection lifecycle, correlation, send pipeline |
//! | [`transport`] | Socket abstraction and WebSocket implementation |

// ============================================================================
// Modules
// ============================================================================

/// Session configuration.
///
/// Use [`SessionConfig::for_host`] or [`SessionConfig::builder`].
pub mod config;

/// High-level device operations.
pub mod device;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// User-facing fault notification.
pub mod notify;

/// Wire message types.
///
/// Outbound commands and inbound named messages.
pub mod protocol;

/// Persistent device session.
///
/// Lifecycle, readiness, listener bus, correlation and the send pipeline.
pub mod session;

/// Socket abstraction.
///
/// The session only talks to [`transport::Socket`] and
/// [`transport::SocketProvider`]; [`WsProvider`] is the WebSocket backend.
pub mod transport;

#[cfg(test)]
mod testutil;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration types
pub use config::{ReconnectPolicy, SessionConfig, SessionConfigBuilder};

// Device types
pub use device::{Device, DirectorySink, FileSink};

// Error types
pub use error::{Error, Result};

// Notification types
pub use notify::{
    FaultCategory, FaultNotifier, Notification, NotificationSink, NotificationToken, NullSink,
    Severity, TracingSink,
};

// Protocol types
pub use protocol::{Command, InboundMessage, Outbound};

// Session types
pub use session::{PendingResponse, Phase, ReadyState, Session};

// Transport types
pub use transport::{Socket, SocketEvent, SocketProvider, SocketState, WsProvider};
