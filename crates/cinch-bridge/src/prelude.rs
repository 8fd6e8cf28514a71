//! Convenience re-exports for common `cinch-bridge` types.
//!
//! ```ignore
//! use cinch_bridge::prelude::*;
//! ```
//!
//! Formatter building blocks (`headline`, `render_args`, tool name
//! constants) are left out; import those from [`crate::format`].

// ── Subscription ────────────────────────────────────────────────────
pub use crate::bridge::{
    AssistantReply, BroadcastSummarySink, CompactionRetryBarrier, FnReplySink,
    FnToolSummarySink, ReplySink, SubscribeOptions, SubscriptionHandle, ToolSummary,
    ToolSummarySink, VerboseLevel, subscribe,
};

// ── Session boundary ────────────────────────────────────────────────
pub use crate::session::{
    AgentMessage, AgentSession, FnListener, ManualSession, SessionEvent, SessionListener,
    Unsubscribe,
};

// ── Formatting ──────────────────────────────────────────────────────
pub use crate::format::{SummaryFormatter, ToolFormatter};
pub use crate::reasoning::ThinkingTags;

// ── Errors ──────────────────────────────────────────────────────────
pub use crate::error::{ConfigError, SubscribeError};
