//! Inbound and outbound message types.
//!
//! Inbound frames must be JSON objects with a string `name`. Everything else
//! in the object is kept as-is for the code that awaits the reply.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};

use crate::error::{Error, Result};

use super::Command;

// ============================================================================
// Constants
// ============================================================================

/// Discriminator of unsolicited device fault notifications.
pub const DEVICE_FAULT_NAME: &str = "error";

/// Discriminator field present on every inbound message.
const NAME_FIELD: &str = "name";

// ============================================================================
// InboundMessage
// ============================================================================

/// A parsed message from the device.
///
/// # Format
///
/// ```json
/// {
///   "name": "getFile",
///   "base64": "Zm9v"
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Discriminator identifying the message type.
    name: String,
    /// Remaining payload fields.
    fields: Map<String, Value>,
}

impl InboundMessage {
    /// Creates a message from a name and payload fields.
    #[must_use]
    pub fn new(name: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.remove(NAME_FIELD);
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Parses a raw text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the frame is not valid JSON
    /// - [`Error::Parse`] if it is not an object with a string `name`
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        let Value::Object(mut fields) = value else {
            return Err(Error::parse("frame is not a JSON object"));
        };

        match fields.remove(NAME_FIELD) {
            Some(Value::String(name)) => Ok(Self { name, fields }),
            Some(other) => Err(Error::parse(format!("'name' is not a string: {other}"))),
            None => Err(Error::parse("missing 'name' field")),
        }
    }

    /// Returns the discriminator.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if this is an unsolicited device fault.
    #[inline]
    #[must_use]
    pub fn is_device_fault(&self) -> bool {
        self.name == DEVICE_FAULT_NAME
    }

    /// Returns a payload field.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns a payload field as a string slice.
    #[inline]
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Returns all payload fields.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns the error detail carried by the message, if any.
    ///
    /// `errorMessage` wins over `error`. Empty strings, `null` and `false`
    /// count as absent; other non-string values are rendered as JSON.
    #[must_use]
    pub fn error_detail(&self) -> Option<String> {
        ["errorMessage", "error"]
            .iter()
            .filter_map(|key| self.fields.get(*key))
            .find_map(|value| match value {
                Value::Null | Value::Bool(false) => None,
                Value::String(s) if s.is_empty() => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
    }
}

// ============================================================================
// Outbound
// ============================================================================

/// A message on its way to the device.
///
/// Text is sent verbatim; anything else is serialized to JSON first.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Already serialized wire text.
    Text(String),
    /// Arbitrary JSON value.
    Json(Value),
    /// A typed command.
    Command(Command),
}

impl Outbound {
    /// Serializes into wire text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn into_wire(self) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Json(value) => Ok(serde_json::to_string(&value)?),
            Self::Command(command) => Ok(serde_json::to_string(&command)?),
        }
    }
}

impl From<String> for Outbound {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Outbound {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for Outbound {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Command> for Outbound {
    fn from(command: Command) -> Self {
        Self::Command(command)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_parse_reply() {
        let msg = InboundMessage::parse(r#"{"name":"getFile","base64":"Zm9v"}"#).expect("parse");
        assert_eq!(msg.name(), "getFile");
        assert_eq!(msg.get_str("base64"), Some("Zm9v"));
        assert!(msg.get("name").is_none());
        assert!(!msg.is_device_fault());
        assert_eq!(msg.error_detail(), None);
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = InboundMessage::parse("not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_parse_rejects_missing_or_bad_name() {
        assert!(matches!(
            InboundMessage::parse(r#"{"base64":"Zm9v"}"#),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            InboundMessage::parse(r#"{"name":7}"#),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            InboundMessage::parse(r#"["name"]"#),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_device_fault() {
        let msg = InboundMessage::parse(r#"{"name":"error","error":"overheat"}"#).expect("parse");
        assert!(msg.is_device_fault());
        assert_eq!(msg.error_detail().as_deref(), Some("overheat"));
    }

    #[test]
    fn test_error_detail_precedence() {
        let msg = InboundMessage::parse(
            r#"{"name":"getFile","error":"ENOENT","errorMessage":"not found"}"#,
        )
        .expect("parse");
        assert_eq!(msg.error_detail().as_deref(), Some("not found"));

        let msg = InboundMessage::parse(r#"{"name":"getFile","error":"","errorMessage":null}"#)
            .expect("parse");
        assert_eq!(msg.error_detail(), None);

        let msg = InboundMessage::parse(r#"{"name":"getFile","error":{"code":2}}"#).expect("parse");
        assert_eq!(msg.error_detail().as_deref(), Some(r#"{"code":2}"#));
    }

    #[test]
    fn test_new_strips_name_field() {
        let mut fields = Map::new();
        fields.insert("name".into(), json!("shadow"));
        fields.insert("ok".into(), json!(true));

        let msg = InboundMessage::new("status", fields);
        assert_eq!(msg.name(), "status");
        assert!(msg.get("name").is_none());
        assert_eq!(msg.fields().len(), 1);
    }

    #[test]
    fn test_outbound_text_is_verbatim() {
        let wire = Outbound::from("{\"raw\":1}").into_wire().expect("wire");
        assert_eq!(wire, "{\"raw\":1}");
    }

    #[test]
    fn test_outbound_json_and_command() {
        let wire = Outbound::from(json!({"command": "ping"}))
            .into_wire()
            .expect("wire");
        assert_eq!(wire, r#"{"command":"ping"}"#);

        let wire = Outbound::from(Command::get_file("/a")).into_wire().expect("wire");
        let value: Value = serde_json::from_str(&wire).expect("json");
        assert_eq!(value, json!({"command": "getFile", "path": "/a"}));
    }
}
