//! Outbound command definitions.
//!
//! A command serializes as `{"command": "<name>", ...params}`. The device
//! answers with a message whose `name` equals the command name.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{Map, Value};

// ============================================================================
// Constants
// ============================================================================

/// Command that reads a file from the device.
pub const GET_FILE: &str = "getFile";

/// Field carrying the command name on the wire.
const COMMAND_FIELD: &str = "command";

// ============================================================================
// Command
// ============================================================================

/// A command request from local end to the device.
///
/// # Format
///
/// ```json
/// {
///   "command": "getFile",
///   "path": "/etc/config"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    /// Command name, also used as the expected reply name.
    command: String,

    /// Command-specific fields, flattened beside `command`.
    #[serde(flatten)]
    params: Map<String, Value>,
}

impl Command {
    /// Creates a command with no parameters.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            command: name.into(),
            params: Map::new(),
        }
    }

    /// Creates a `getFile` command for `path`.
    #[inline]
    #[must_use]
    pub fn get_file(path: impl Into<String>) -> Self {
        Self::new(GET_FILE).with_param("path", path.into())
    }

    /// Adds a parameter.
    ///
    /// A parameter named `command` would shadow the command name and is ignored.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != COMMAND_FIELD {
            self.params.insert(key, value.into());
        }
        self
    }

    /// Returns the command name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.command
    }

    /// Returns the `name` the device uses for the reply.
    #[inline]
    #[must_use]
    pub fn reply_name(&self) -> &str {
        &self.command
    }

    /// Returns a parameter value.
    #[inline]
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

// ============================================================================
// Tests
// ============================================================================
