//! The subscription bridge: one listener on the session, fanned out to the
//! compaction retry barrier and the tool activity summarizer.
//!
//! ```text
//! session ──event──▶ EventRouter ─┬─▶ CompactionRetryBarrier ◀── wait_for_compaction_retry()
//!                                 ├─▶ ToolActivitySummarizer ──▶ delivery worker ──▶ tool sink
//!                                 └─▶ reasoning stripper ──────▶ delivery worker ──▶ reply sink
//! ```
//!
//! Dispatch is synchronous and in emission order. Sinks are only ever called
//! from the delivery worker, so neither formatting nor a slow sink holds up
//! the session.
//!
//! # Example
//!
//! ```ignore
//! let handle = subscribe(
//!     &session,
//!     "run-42",
//!     SubscribeOptions::default()
//!         .with_verbose_level(VerboseLevel::On)
//!         .with_tool_sink_fn(|summary| println!("{}", summary.text)),
//! )?;
//!
//! // ... the session runs, possibly compacting and retrying ...
//!
//! handle.wait_for_compaction_retry().await;
//! handle.unsubscribe();
//! ```

pub mod barrier;
pub mod config;
mod delivery;
pub mod sink;
pub mod summarizer;

pub use barrier::CompactionRetryBarrier;
pub use config::{SubscribeOptions, VerboseLevel};
pub use sink::{
    AssistantReply, BroadcastSummarySink, FnReplySink, FnToolSummarySink, ReplySink,
    ToolSummary, ToolSummarySink,
};
pub use summarizer::ToolActivitySummarizer;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{Span, debug, info_span, trace};

use crate::error::SubscribeError;
use crate::reasoning::ThinkingTags;
use crate::session::{AgentMessage, AgentSession, SessionEvent, SessionListener, Unsubscribe};

use delivery::{Delivery, DeliveryQueue};

/// Subscribe to `session` and start routing its events.
///
/// `run_id` is an opaque correlation token: it is recorded on the tracing
/// span and copied into delivered payloads, and has no effect on routing.
///
/// # Errors
///
/// Returns [`SubscribeError::NoRuntime`] when a sink would receive output
/// but there is no Tokio runtime to run the delivery worker on. Without
/// sinks (or with verbosity off and no reply sink) no runtime is needed.
pub fn subscribe<S>(
    session: &S,
    run_id: impl Into<String>,
    options: SubscribeOptions,
) -> Result<SubscriptionHandle, SubscribeError>
where
    S: AgentSession + ?Sized,
{
    let run_id = run_id.into();
    let span = info_span!("session_bridge", run_id = %run_id);

    let summaries_enabled = options.summaries_enabled();
    let tool_sink = options.tool_sink.filter(|_| summaries_enabled);
    let reply_sink = options.reply_sink;
    let replies_enabled = reply_sink.is_some();

    let queue = if tool_sink.is_some() || reply_sink.is_some() {
        Some(DeliveryQueue::spawn(tool_sink, reply_sink, span.clone())?)
    } else {
        None
    };

    let router = Arc::new(EventRouter {
        barrier: CompactionRetryBarrier::new(),
        summarizer: ToolActivitySummarizer::new(summaries_enabled, options.formatter, &run_id),
        thinking_tags: options.thinking_tags,
        replies_enabled,
        assistant_texts: Mutex::new(Vec::new()),
        queue,
        closed: AtomicBool::new(false),
        run_id,
        span,
    });

    let unsubscribe = session.subscribe(router.clone());
    debug!(
        parent: &router.span,
        verbose = %options.verbose_level,
        summaries = summaries_enabled,
        replies = replies_enabled,
        "subscribed to session"
    );

    Ok(SubscriptionHandle {
        router,
        unsubscribe: Mutex::new(Some(unsubscribe)),
    })
}

/// Demultiplexes session events to the barrier and the summarizer.
///
/// Holds wiring only; all counting and dedup state lives in the components.
struct EventRouter {
    barrier: CompactionRetryBarrier,
    summarizer: ToolActivitySummarizer,
    thinking_tags: ThinkingTags,
    replies_enabled: bool,
    assistant_texts: Mutex<Vec<String>>,
    queue: Option<DeliveryQueue>,
    closed: AtomicBool,
    run_id: String,
    span: Span,
}

impl EventRouter {
    fn enqueue(&self, item: Delivery) {
        if let Some(queue) = &self.queue
            && !queue.push(item)
        {
            trace!("delivery queue closed; dropping output");
        }
    }

    fn on_message_end(&self, message: &AgentMessage) {
        if !message.is_assistant() {
            return;
        }
        let (text, reasoning) = self.thinking_tags.split(&message.text());
        if text.is_empty() {
            debug!(
                reasoning_spans = reasoning.len(),
                "assistant message had no visible text"
            );
            return;
        }
        self.assistant_texts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(text.clone());
        if self.replies_enabled {
            self.enqueue(Delivery::Reply(AssistantReply {
                text,
                reasoning,
                run_id: self.run_id.clone(),
            }));
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        if let Some(queue) = &self.queue {
            queue.close();
        }
    }
}

impl SessionListener for EventRouter {
    fn on_event(&self, event: &SessionEvent) {
        let _entered = self.span.enter();
        if self.closed.load(Ordering::Acquire) {
            trace!(kind = event.kind(), "event after unsubscribe; ignoring");
            return;
        }

        match event {
            SessionEvent::AutoCompactionEnd {
                will_retry,
                aborted,
                error_message,
            } => {
                if *aborted || error_message.is_some() {
                    debug!(
                        aborted,
                        error = error_message.as_deref().unwrap_or(""),
                        "compaction did not complete cleanly"
                    );
                }
                self.barrier.on_compaction_end(*will_retry);
            }
            SessionEvent::AgentEnd { .. } => self.barrier.on_agent_end(),
            SessionEvent::ToolExecutionStart {
                tool_name,
                tool_call_id,
                args,
            } => {
                if let Some(summary) = self.summarizer.on_tool_start(tool_name, tool_call_id, args)
                {
                    self.enqueue(Delivery::ToolSummary(summary));
                }
            }
            SessionEvent::ToolExecutionEnd {
                tool_name,
                tool_call_id,
                is_error,
                ..
            } => self.summarizer.on_tool_end(tool_name, tool_call_id, *is_error),
            SessionEvent::MessageEnd { message } => self.on_message_end(message),
            SessionEvent::AgentStart { .. }
            | SessionEvent::AutoCompactionStart { .. }
            | SessionEvent::ToolExecutionUpdate { .. } => {
                trace!(kind = event.kind(), "observed session event");
            }
            SessionEvent::Unknown => trace!("ignoring unrecognized session event"),
        }
    }
}

/// The caller's side of a subscription.
///
/// Dropping the handle unsubscribes. The handle keeps the subscription's
/// state alive on its own, so it stays usable after the session is gone.
pub struct SubscriptionHandle {
    router: Arc<EventRouter>,
    unsubscribe: Mutex<Option<Unsubscribe>>,
}

impl SubscriptionHandle {
    /// Detach from the session. Only the first call has any effect.
    ///
    /// Summaries already queued are still delivered. Pending
    /// [`wait_for_compaction_retry`](Self::wait_for_compaction_retry) futures
    /// are neither resolved nor cancelled; with no further events they stay
    /// pending.
    pub fn unsubscribe(&self) {
        let release = self
            .unsubscribe
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let Some(release) = release else {
            return;
        };
        release.call();
        self.router.close();
        debug!(parent: &self.router.span, "unsubscribed from session");
    }

    pub fn is_unsubscribed(&self) -> bool {
        self.router.closed.load(Ordering::Acquire)
    }

    /// Resolve once no compaction retries are outstanding. See
    /// [`CompactionRetryBarrier::wait_for_compaction_retry`].
    pub fn wait_for_compaction_retry(&self) -> impl Future<Output = ()> + Send + 'static {
        self.router.barrier.wait_for_compaction_retry()
    }

    pub fn pending_compaction_retries(&self) -> usize {
        self.router.barrier.pending_retries()
    }

    /// Whether a compaction retry is still outstanding.
    pub fn is_compacting(&self) -> bool {
        self.pending_compaction_retries() > 0
    }

    pub fn run_id(&self) -> &str {
        &self.router.run_id
    }

    /// Visible assistant texts seen so far, reasoning removed.
    pub fn assistant_texts(&self) -> Vec<String> {
        self.router
            .assistant_texts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Wait until every summary and reply queued so far has been handed to
    /// its sink. Returns immediately when no sink is configured.
    pub async fn flush_deliveries(&self) {
        if let Some(queue) = &self.router.queue {
            queue.flush().await;
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("run_id", &self.router.run_id)
            .field("pending_compaction_retries", &self.pending_compaction_retries())
            .field("unsubscribed", &self.is_unsubscribed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ManualSession;
    use serde_json::json;

    #[test]
    fn subscribe_without_sinks_needs_no_runtime() {
        let session = ManualSession::new();
        let handle = subscribe(&session, "run-1", SubscribeOptions::default()).unwrap();
        assert_eq!(session.listener_count(), 1);
        assert_eq!(handle.run_id(), "run-1");

        session.emit(&SessionEvent::AutoCompactionEnd {
            will_retry: true,
            aborted: false,
            error_message: None,
        });
        assert!(handle.is_compacting());
        session.emit(&SessionEvent::AgentEnd { error: None });
        assert!(!handle.is_compacting());
    }

    #[test]
    fn verbose_sink_outside_runtime_is_an_error() {
        let session = ManualSession::new();
        let options = SubscribeOptions::default()
            .with_verbose_level(VerboseLevel::On)
            .with_tool_sink_fn(|_| {});
        let result = subscribe(&session, "run-1", options);
        assert!(matches!(result, Err(SubscribeError::NoRuntime)));
        assert_eq!(session.listener_count(), 0);
    }

    #[test]
    fn quiet_sink_outside_runtime_is_fine() {
        // Verbosity off: the tool sink is never used, so no worker is needed.
        let session = ManualSession::new();
        let options = SubscribeOptions::default().with_tool_sink_fn(|_| {});
        assert!(subscribe(&session, "run-1", options).is_ok());
    }

    #[test]
    fn unsubscribe_is_idempotent_and_stops_routing() {
        let session = ManualSession::new();
        let handle = subscribe(&session, "run-1", SubscribeOptions::default()).unwrap();

        handle.unsubscribe();
        handle.unsubscribe();
        assert!(handle.is_unsubscribed());
        assert_eq!(session.listener_count(), 0);

        // Events delivered through a stale listener reference are ignored.
        handle.router.on_event(&SessionEvent::AutoCompactionEnd {
            will_retry: true,
            aborted: false,
            error_message: None,
        });
        assert_eq!(handle.pending_compaction_retries(), 0);
    }

    #[test]
    fn drop_unsubscribes() {
        let session = ManualSession::new();
        let handle = subscribe(&session, "run-1", SubscribeOptions::default()).unwrap();
        assert_eq!(session.listener_count(), 1);
        drop(handle);
        assert_eq!(session.listener_count(), 0);
    }

    #[test]
    fn assistant_texts_have_reasoning_removed() {
        let session = ManualSession::new();
        let handle = subscribe(&session, "run-1", SubscribeOptions::default()).unwrap();

        session.emit_raw(&json!({
            "type": "message_end",
            "message": {"role": "assistant", "content": "<think>plan</think>Here you go."},
        }));
        session.emit_raw(&json!({
            "type": "message_end",
            "message": {"role": "user", "content": "ignored"},
        }));
        session.emit_raw(&json!({
            "type": "message_end",
            "message": {"role": "assistant", "content": "<thinking>only reasoning</thinking>"},
        }));

        assert_eq!(handle.assistant_texts(), vec!["Here you go."]);
    }

    #[test]
    fn debug_output_names_run() {
        let session = ManualSession::new();
        let handle = subscribe(&session, "run-dbg", SubscribeOptions::default()).unwrap();
        let rendered = format!("{handle:?}");
        assert!(rendered.contains("run-dbg"));
    }
}
