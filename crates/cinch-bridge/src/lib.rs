//! Event-subscription bridge between a running agent session and the code
//! that observes it.
//!
//! An agent session emits a stream of events: runs start and end, context
//! compaction kicks in, tools are called. `cinch-bridge` attaches a single
//! listener to that stream and turns it into two things callers actually
//! want:
//!
//! - a **compaction retry barrier**, so a caller can `await` until every
//!   compaction that promised a retry has seen its retry finish, and
//! - **tool activity summaries**, one short human-readable line per tool
//!   call, delivered to a caller-supplied sink off the session's hot path.
//!
//! # Getting started
//!
//! ```ignore
//! use cinch_bridge::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SubscribeError> {
//!     let session = ManualSession::new();
//!
//!     let handle = subscribe(
//!         &session,
//!         "run-42",
//!         SubscribeOptions::default()
//!             .with_verbose_level(VerboseLevel::On)
//!             .with_tool_sink_fn(|summary| println!("{}", summary.text)),
//!     )?;
//!
//!     session.emit_raw(&serde_json::json!({
//!         "type": "tool_execution_start",
//!         "toolName": "read",
//!         "toolCallId": "tool-1",
//!         "args": {"path": "/tmp/a.txt"},
//!     }));
//!
//!     handle.flush_deliveries().await; // prints "📖 read: path=/tmp/a.txt"
//!     handle.wait_for_compaction_retry().await;
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! - **Connect to a session:** implement [`AgentSession`](session::AgentSession)
//!   for your session type, or drive a [`ManualSession`](session::ManualSession)
//!   by hand. Events are decoded into [`SessionEvent`](session::SessionEvent);
//!   unrecognized event types decode to `Unknown` and are ignored.
//!
//! - **Subscribe:** call [`subscribe`](bridge::subscribe) with
//!   [`SubscribeOptions`](bridge::SubscribeOptions). The returned
//!   [`SubscriptionHandle`](bridge::SubscriptionHandle) unsubscribes on drop.
//!
//! - **Receive summaries:** implement [`ToolSummarySink`](bridge::ToolSummarySink),
//!   pass a closure via [`FnToolSummarySink`](bridge::FnToolSummarySink), or
//!   fan out with [`BroadcastSummarySink`](bridge::BroadcastSummarySink).
//!
//! - **Customize summary text:** register a [`ToolFormatter`](format::ToolFormatter)
//!   on a [`SummaryFormatter`](format::SummaryFormatter).
//!
//! - **Strip model reasoning:** see [`ThinkingTags`](reasoning::ThinkingTags).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | Session boundary traits, event model, [`ManualSession`](session::ManualSession) |
//! | [`bridge`] | [`subscribe`](bridge::subscribe), retry barrier, summarizer, sinks, options |
//! | [`format`] | Tool summary formatters and tool name constants |
//! | [`reasoning`] | Reasoning tag stripping for assistant text |
//! | [`error`] | Error types |

pub mod bridge;
pub mod error;
pub mod format;
pub mod prelude;
pub mod reasoning;
pub mod session;

pub use bridge::{SubscriptionHandle, subscribe};
pub use error::{ConfigError, SubscribeError};
