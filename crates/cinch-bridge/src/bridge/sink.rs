//! Caller-supplied receivers for formatted output.
//!
//! # Choosing a sink
//!
//! | Sink | Use case |
//! |------|----------|
//! | [`FnToolSummarySink`] / [`FnReplySink`] | Quick closures |
//! | [`BroadcastSummarySink`] | Fan out to several async consumers |
//! | Custom `impl ToolSummarySink` | Full control (TUI state, chat relay) |
//!
//! Sinks are always invoked from the subscription's delivery worker, never
//! from inside the session's event dispatch.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

/// A formatted summary of one tool call, produced when the call starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSummary {
    /// Human-readable one-liner, e.g. `📖 read: path=/tmp/a.txt`.
    pub text: String,
    pub tool_name: String,
    pub tool_call_id: String,
    /// Correlation token of the subscription that produced this summary.
    pub run_id: String,
    /// The raw arguments the summary was rendered from.
    pub args: Value,
}

/// Visible assistant text with reasoning spans removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    pub text: String,
    /// Reasoning spans that were removed from `text`, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasoning: Vec<String>,
    pub run_id: String,
}

/// Receives tool-call summaries.
pub trait ToolSummarySink: Send + Sync {
    fn on_tool_summary(&self, summary: ToolSummary);
}

/// Receives assistant replies.
pub trait ReplySink: Send + Sync {
    fn on_reply(&self, reply: AssistantReply);
}

/// A [`ToolSummarySink`] backed by a closure.
///
/// ```ignore
/// let sink = FnToolSummarySink::new(|summary| println!("{}", summary.text));
/// ```
pub struct FnToolSummarySink<F>(F)
where
    F: Fn(ToolSummary) + Send + Sync;

impl<F> FnToolSummarySink<F>
where
    F: Fn(ToolSummary) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ToolSummarySink for FnToolSummarySink<F>
where
    F: Fn(ToolSummary) + Send + Sync,
{
    fn on_tool_summary(&self, summary: ToolSummary) {
        (self.0)(summary)
    }
}

/// A [`ReplySink`] backed by a closure.
pub struct FnReplySink<F>(F)
where
    F: Fn(AssistantReply) + Send + Sync;

impl<F> FnReplySink<F>
where
    F: Fn(AssistantReply) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ReplySink for FnReplySink<F>
where
    F: Fn(AssistantReply) + Send + Sync,
{
    fn on_reply(&self, reply: AssistantReply) {
        (self.0)(reply)
    }
}

/// Broadcasts summaries to every receiver of a `tokio::sync::broadcast`
/// channel.
///
/// Send errors are ignored: having no receivers is fine, and a lagging
/// receiver sees `RecvError::Lagged` on its own side.
pub struct BroadcastSummarySink {
    sender: broadcast::Sender<ToolSummary>,
}

impl BroadcastSummarySink {
    pub fn new(sender: broadcast::Sender<ToolSummary>) -> Self {
        Self { sender }
    }

    /// Create a sink together with its first receiver.
    pub fn channel(capacity: usize) -> (Self, broadcast::Receiver<ToolSummary>) {
        let (sender, receiver) = broadcast::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Attach another receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<ToolSummary> {
        self.sender.subscribe()
    }
}

impl ToolSummarySink for BroadcastSummarySink {
    fn on_tool_summary(&self, summary: ToolSummary) {
        let _ = self.sender.send(summary);
    }
}
