//! Persistent device session.
//!
//! A [`Session`] keeps one connection to a device alive. Every reconnect
//! starts a new *generation*: a fresh socket, a fresh handler bound to it and
//! a fresh [`Readiness`]. Events from older generations are ignored.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Session struct, lifecycle and event handling |
//! | `readiness` | Per-generation readiness signal |
//! | `bus` | One-shot listener fan-out |
//! | `correlator` | Request/response correlation |
//! | `pipeline` | Readiness-gated send with retry |
//!
//! # Example
//!
//! ```ignore
//! let session = Session::connect(config, provider, sink);
//!
//! let reply = session.wait_for_response("getFile");
//! session.send(Command::get_file("/etc/hostname")).await?;
//! let message = reply.await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod bus;
mod core;
mod correlator;
mod pipeline;
mod readiness;

// ============================================================================
// Re-exports
// ============================================================================

pub use bus::{Listener, ListenerId, MessageBus};
pub use core::{Phase, Session};
pub use correlator::PendingResponse;
pub use readiness::{ReadyState, Readiness};
