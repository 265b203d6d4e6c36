//! Agent Replies
//!
//! The agent API returns loosely shaped JSON. [`AgentReply`] classifies it once
//! and [`AgentReply::project`] reduces it to a single piece of display text.

use serde_json::{Map, Value};

/// Raw reply from the send-message call
#[derive(Clone, Debug, PartialEq)]
pub enum AgentReply {
    /// JSON object; the usual case
    Structured(Map<String, Value>),

    /// Bare JSON string
    Text(String),

    /// Anything else (array, number, bool, null)
    Unknown(Value),
}

impl From<Value> for AgentReply {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Structured(map),
            Value::String(text) => Self::Text(text),
            other => Self::Unknown(other),
        }
    }
}

/// What to display for a reply
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Projection {
    /// Human-readable agent text
    Text(String),

    /// Pretty-printed JSON of the whole reply, shown when no text was found
    Dump(String),
}

impl Projection {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) | Self::Dump(text) => text,
        }
    }

    pub const fn is_dump(&self) -> bool {
        matches!(self, Self::Dump(_))
    }
}

impl AgentReply {
    /// Pick the text to show for this reply.
    ///
    /// Only the first non-blank `messages[].message` is kept; other chunks and
    /// metadata are dropped. Never fails.
    pub fn project(&self) -> Projection {
        match self {
            Self::Text(text) => Projection::Text(text.clone()),
            Self::Unknown(value) => Projection::Text(value.to_string()),
            Self::Structured(map) => first_message(map).map_or_else(
                || Projection::Dump(pretty(map)),
                |text| Projection::Text(text.to_string()),
            ),
        }
    }
}

fn first_message(map: &Map<String, Value>) -> Option<&str> {
    map.get("messages")?
        .as_array()?
        .iter()
        .filter_map(|entry| entry.as_object()?.get("message")?.as_str())
        .map(str::trim)
        .find(|text| !text.is_empty())
}

fn pretty(map: &Map<String, Value>) -> String {
    // Serializing a Map cannot fail; fall back to compact output regardless
    serde_json::to_string_pretty(map).unwrap_or_else(|_| Value::Object(map.clone()).to_string())
}
