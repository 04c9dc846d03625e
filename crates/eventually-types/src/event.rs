use crate::StreamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known event type tags for agent and tool activity
///
/// Event types are open strings; these are the tags the demo session and
/// most tests use.
pub mod kinds {
    /// A message arrived from the user
    pub const USER_MESSAGE: &str = "USER_MESSAGE";

    /// The agent invoked a tool
    pub const TOOL_CALL: &str = "TOOL_CALL";

    /// A tool invocation finished
    pub const TOOL_RESULT: &str = "TOOL_RESULT";

    /// The agent produced a reply
    pub const ASSISTANT_MESSAGE: &str = "ASSISTANT_MESSAGE";

    /// Something failed while the operation was running
    pub const ERROR: &str = "ERROR";
}

/// An immutable record appended to an event stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub stream_id: StreamId,
    /// Zero-based insertion index within the stream
    pub sequence: u64,
    pub event_type: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(
        stream_id: StreamId,
        sequence: u64,
        event_type: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            stream_id,
            sequence,
            event_type: event_type.into(),
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Whether this event carries the given type tag
    pub fn is(&self, event_type: &str) -> bool {
        self.event_type == event_type
    }

    /// Look up a top-level field of an object payload
    pub fn payload_field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}
