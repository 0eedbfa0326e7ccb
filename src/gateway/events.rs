use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

pub const EVENT_ONLINE: &str = "online";

/// Named events relayed between a boat and its observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Command,
    Setup,
    Data,
}

impl EventKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "command" => Some(EventKind::Command),
            "setup" => Some(EventKind::Setup),
            "data" => Some(EventKind::Data),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Command => "command",
            EventKind::Setup => "setup",
            EventKind::Data => "data",
        }
    }
}

/// One text frame on the socket: `{"event": "...", "data": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default, deserialize_with = "payload_as_string")]
    pub data: String,
}

impl Frame {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    pub fn presence(online: bool) -> Self {
        Self::new(EVENT_ONLINE, online.to_string())
    }

    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

// Clients normally send pre-serialised strings; anything else is kept as the exact source text.
fn payload_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Box<RawValue>> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(String::new()),
        Some(raw) if raw.get().starts_with('"') => {
            serde_json::from_str(raw.get()).map_err(serde::de::Error::custom)
        }
        Some(raw) => Ok(raw.get().to_string()),
    }
}
