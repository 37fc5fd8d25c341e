//! Pipeline message model.
//!
//! Filters treat inbound messages as opaque; only the host's matcher looks at
//! `logger`. Outbound records carry a text payload plus named fields that
//! downstream matchers can select on.

use serde::{Deserialize, Serialize};

/// Named annotation attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    /// Human-readable description of what the field is for.
    #[serde(default)]
    pub representation: String,
}

impl Field {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        representation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            representation: representation.into(),
        }
    }
}

/// A message flowing through the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message type (e.g. `"txt"`).
    #[serde(rename = "type", default)]
    pub msg_type: String,
    /// Name of the plugin that produced this message; empty for external input.
    #[serde(default)]
    pub logger: String,
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Message {
    pub fn new(msg_type: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            msg_type: msg_type.into(),
            payload: payload.into(),
            ..Self::default()
        }
    }

    pub fn set_type(&mut self, msg_type: impl Into<String>) {
        self.msg_type = msg_type.into();
    }

    pub fn set_payload(&mut self, payload: impl Into<String>) {
        self.payload = payload.into();
    }

    pub fn set_logger(&mut self, logger: impl Into<String>) {
        self.logger = logger.into();
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// First field with the given name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}
