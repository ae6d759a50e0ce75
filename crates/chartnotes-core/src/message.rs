#![forbid(unsafe_code)]

//! Annotation message records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Logical chart coordinate a card is attached to.
///
/// `time` is in the host's horizontal scale units (typically UTC seconds);
/// `value` is in price/value units of the vertical scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Anchor {
    pub time: f64,
    pub value: f64,
}

impl Anchor {
    #[must_use]
    pub const fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// One annotation card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub anchor: Anchor,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub text: String,
    /// Pre-formatted display timestamp.
    #[serde(default)]
    pub timestamp: String,
    /// Outbound link opened on click.
    #[serde(default)]
    pub url: String,
    /// Overrides the platform accent color when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Platform-specific badge data, passed through to the renderer untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Message {
    /// Create a message with empty display fields.
    #[must_use]
    pub fn new(id: impl Into<MessageId>, anchor: Anchor) -> Self {
        Self {
            id: id.into(),
            anchor,
            username: String::new(),
            text: String::new(),
            timestamp: String::new(),
            url: String::new(),
            color: None,
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_deserializes_with_sparse_fields() {
        let raw = r#"{"id":"m1","anchor":{"time":50.0,"value":100.0},"url":"https://example.com/p/1"}"#;
        let message: Message = serde_json::from_str(raw).expect("valid message json");
        assert_eq!(message.id, MessageId::from("m1"));
        assert_eq!(message.anchor, Anchor::new(50.0, 100.0));
        assert_eq!(message.url, "https://example.com/p/1");
        assert!(message.username.is_empty());
        assert!(message.color.is_none());
        assert!(message.metadata.is_empty());
    }

    #[test]
    fn metadata_survives_serialization() {
        let message = Message::new("m2", Anchor::new(1.0, 2.0))
            .with_username("alice")
            .with_metadata("verified", json!(true));
        let encoded = serde_json::to_string(&message).expect("serialize");
        assert!(encoded.contains("\"verified\":true"));
        assert!(!encoded.contains("\"color\""));
        let decoded: Message = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded, message);
    }
}
