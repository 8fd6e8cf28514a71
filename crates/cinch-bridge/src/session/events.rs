//! Lifecycle events emitted by an agent session.
//!
//! The wire shape is a JSON object discriminated on its `type` field with
//! snake_case tags and camelCase payload fields:
//!
//! ```json
//! {"type": "auto_compaction_end", "willRetry": true}
//! {"type": "tool_execution_start", "toolName": "read", "toolCallId": "t1", "args": {"path": "a.txt"}}
//! ```
//!
//! Tags this crate does not know decode to [`SessionEvent::Unknown`] so a
//! session that grows new event kinds never breaks older subscribers.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// Tags with a dedicated [`SessionEvent`] variant.
const KNOWN_TAGS: &[&str] = &[
    "agent_start",
    "agent_end",
    "auto_compaction_start",
    "auto_compaction_end",
    "tool_execution_start",
    "tool_execution_update",
    "tool_execution_end",
    "message_end",
];

/// An event received from the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A run started.
    AgentStart {
        #[serde(
            rename = "sessionId",
            default,
            deserialize_with = "lenient_text",
            skip_serializing_if = "Option::is_none"
        )]
        session_id: Option<String>,
    },
    /// A run completed. Each completion settles one outstanding compaction
    /// retry, if any.
    AgentEnd {
        #[serde(
            default,
            deserialize_with = "lenient_text",
            skip_serializing_if = "Option::is_none"
        )]
        error: Option<String>,
    },
    /// Automatic context compaction began.
    AutoCompactionStart {
        #[serde(
            default,
            deserialize_with = "lenient_text",
            skip_serializing_if = "Option::is_none"
        )]
        reason: Option<String>,
    },
    /// Automatic context compaction finished. When `will_retry` is set the
    /// session restarts the run and a later `agent_end` closes it out.
    AutoCompactionEnd {
        #[serde(rename = "willRetry", default)]
        will_retry: bool,
        #[serde(default, deserialize_with = "lenient_flag")]
        aborted: bool,
        #[serde(
            rename = "errorMessage",
            default,
            deserialize_with = "lenient_text",
            skip_serializing_if = "Option::is_none"
        )]
        error_message: Option<String>,
    },
    /// A tool call is about to execute.
    ToolExecutionStart {
        #[serde(rename = "toolName")]
        tool_name: String,
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(default)]
        args: Value,
    },
    /// Partial progress from a running tool call.
    ToolExecutionUpdate {
        #[serde(rename = "toolName")]
        tool_name: String,
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
    },
    /// A tool call finished.
    ToolExecutionEnd {
        #[serde(rename = "toolName")]
        tool_name: String,
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "isError", default, deserialize_with = "lenient_flag")]
        is_error: bool,
        #[serde(default)]
        result: Value,
    },
    /// A complete message (user, assistant, or tool result) was appended to
    /// the transcript.
    MessageEnd { message: AgentMessage },
    /// Any tag without a dedicated variant.
    #[serde(other)]
    Unknown,
}

/// Descriptive text fields only feed log lines, so any shape is accepted: a
/// string passes through, null is absent, anything else is kept as compact
/// JSON.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// Informational flags: anything but `true` reads as `false`.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_bool().unwrap_or(false))
}

impl SessionEvent {
    /// Decode a raw JSON event.
    ///
    /// Unrecognized tags yield [`SessionEvent::Unknown`]. Objects that carry a
    /// known tag but the wrong shape, and values that are not tagged objects
    /// at all, yield `None`.
    pub fn from_value(raw: &Value) -> Option<Self> {
        let Some(tag) = raw.get("type").and_then(Value::as_str) else {
            debug!("dropping session event without a string `type` tag");
            return None;
        };
        if !KNOWN_TAGS.contains(&tag) {
            return Some(SessionEvent::Unknown);
        }
        match serde_json::from_value(raw.clone()) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!("dropping malformed `{tag}` session event: {e}");
                None
            }
        }
    }

    /// The wire tag of this event, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::AgentStart { .. } => "agent_start",
            SessionEvent::AgentEnd { .. } => "agent_end",
            SessionEvent::AutoCompactionStart { .. } => "auto_compaction_start",
            SessionEvent::AutoCompactionEnd { .. } => "auto_compaction_end",
            SessionEvent::ToolExecutionStart { .. } => "tool_execution_start",
            SessionEvent::ToolExecutionUpdate { .. } => "tool_execution_update",
            SessionEvent::ToolExecutionEnd { .. } => "tool_execution_end",
            SessionEvent::MessageEnd { .. } => "message_end",
            SessionEvent::Unknown => "unknown",
        }
    }
}

/// A transcript message carried by [`SessionEvent::MessageEnd`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub role: String,
    /// Either a plain string or an array of content blocks.
    #[serde(default)]
    pub content: Value,
}

impl AgentMessage {
    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }

    /// Concatenated text content.
    ///
    /// String content is returned as-is. For block arrays, every
    /// `{"type": "text", "text": ...}` block is joined with newlines and all
    /// other block kinds (tool calls, images, thinking blocks) are skipped.
    pub fn text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            Value::Array(blocks) => blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        }
    }
}
