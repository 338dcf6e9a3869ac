//! Wire protocol message types.
//!
//! Every frame on the wire is a flat JSON object carried in a text message.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`Command`] | Local → Device | Request with a `command` field and its parameters |
//! | [`InboundMessage`] | Device → Local | Reply or notification with a `name` discriminator |
//!
//! Replies echo the command name in `name` and carry payload fields, or an
//! `error` / `errorMessage` field. A message named `error` is an unsolicited
//! device fault and answers no request.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Outbound command builder |
//! | `message` | Inbound parsing and outbound wire form |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound command definitions.
pub mod command;

/// Inbound and outbound message types.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, GET_FILE};
pub use message::{DEVICE_FAULT_NAME, InboundMessage, Outbound};
