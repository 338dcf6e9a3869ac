//! Duplex socket abstraction.
//!
//! The session never touches a network stream directly. It asks a
//! [`SocketProvider`] for a [`Socket`], binds one event handler to it and
//! writes text frames through it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Session (Rust) │                              │  Device         │
//! │                 │         WebSocket            │                 │
//! │  SocketProvider │◄────────────────────────────►│  /ws endpoint   │
//! │  → Socket       │        wss://host/ws         │                 │
//! │                 │                              │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Socket Lifecycle
//!
//! 1. `SocketProvider::socket_for` - Obtain a socket for the endpoint
//! 2. `Socket::bind` - Attach the event handler
//! 3. `Socket::reconnect` - Start connecting; `Open` follows on success
//! 4. `Socket::send` - Write text frames while open
//! 5. `Socket::unbind` - Detach before the socket is replaced
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `websocket` | `tokio-tungstenite` implementation |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket provider backed by `tokio-tungstenite`.
pub mod websocket;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use url::Url;

use crate::error::Result;

// ============================================================================
// Re-exports
// ============================================================================

pub use websocket::{WsProvider, WsSocket};

// ============================================================================
// Types
// ============================================================================

/// Event emitted by a socket to its bound handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The socket finished its opening handshake.
    Open,
    /// A text frame arrived.
    Message(String),
    /// The socket closed or failed to connect.
    Close,
}

/// Connection state reported by a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    /// Connect requested, not open yet.
    Connecting,
    /// Open and writable.
    Open,
    /// Closed, or never connected.
    Closed,
}

/// Event handler callback type.
///
/// Called synchronously for every event, in the order events occur.
pub type SocketHandler = Arc<dyn Fn(SocketEvent) + Send + Sync>;

// ============================================================================
// Traits
// ============================================================================

/// One duplex, event-emitting connection.
pub trait Socket: Send + Sync {
    /// Binds the event handler, replacing any previous one.
    fn bind(&self, handler: SocketHandler);

    /// Detaches the event handler. Later events are dropped.
    fn unbind(&self);

    /// Writes a text frame.
    ///
    /// # Errors
    ///
    /// Fails synchronously when the socket cannot accept the write.
    fn send(&self, data: &str) -> Result<()>;

    /// Starts (or restarts) the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connect call cannot be issued at all.
    fn reconnect(&self) -> Result<()>;

    /// Returns the current state.
    fn state(&self) -> SocketState;

    /// Closes the socket without emitting further events.
    fn close(&self) {}
}

/// Source of sockets for an endpoint.
pub trait SocketProvider: Send + Sync {
    /// Returns a socket for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderEstablishment`](crate::Error::ProviderEstablishment)
    /// if no socket can be produced.
    fn socket_for(&self, endpoint: &Url) -> Result<Arc<dyn Socket>>;
}
