//! Deferred delivery to caller sinks.
//!
//! The event-dispatch path only pushes onto an unbounded channel; a worker
//! task drains it and calls the sinks in the order items were queued. Sink
//! latency therefore never reaches the session, and a sink that panics is
//! logged and skipped without taking the worker down.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{Instrument, Span, debug, warn};

use crate::error::SubscribeError;

use super::sink::{AssistantReply, ReplySink, ToolSummary, ToolSummarySink};

pub(crate) enum Delivery {
    ToolSummary(ToolSummary),
    Reply(AssistantReply),
    /// Completes once everything queued before it has been delivered.
    Flush(oneshot::Sender<()>),
}

pub(crate) struct DeliveryQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<Delivery>>>,
    /// Flips to `true` once the worker has drained the queue and exited.
    stopped: watch::Receiver<bool>,
}

impl DeliveryQueue {
    /// Spawn the worker on the current Tokio runtime.
    pub(crate) fn spawn(
        tool_sink: Option<Arc<dyn ToolSummarySink>>,
        reply_sink: Option<Arc<dyn ReplySink>>,
        span: Span,
    ) -> Result<Self, SubscribeError> {
        let runtime = Handle::try_current().map_err(|_| SubscribeError::NoRuntime)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let (stopped_tx, stopped) = watch::channel(false);
        runtime.spawn(
            async move {
                run_worker(receiver, tool_sink, reply_sink).await;
                stopped_tx.send_replace(true);
            }
            .instrument(span),
        );
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            stopped,
        })
    }

    /// Queue an item. Returns `false` once the queue is closed.
    pub(crate) fn push(&self, item: Delivery) -> bool {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        match sender.as_ref() {
            Some(tx) => tx.send(item).is_ok(),
            None => false,
        }
    }

    /// Stop accepting items. Anything already queued is still delivered.
    pub(crate) fn close(&self) {
        self.sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
    }

    /// Wait until every item queued so far has reached its sink.
    pub(crate) async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.push(Delivery::Flush(done)) {
            let _ = wait.await;
            return;
        }
        // Closed: the worker exits after draining, so wait for it instead.
        // A dropped signal means the runtime tore the worker down.
        let mut stopped = self.stopped.clone();
        let _ = stopped.wait_for(|done| *done).await;
    }
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<Delivery>,
    tool_sink: Option<Arc<dyn ToolSummarySink>>,
    reply_sink: Option<Arc<dyn ReplySink>>,
) {
    while let Some(item) = receiver.recv().await {
        match item {
            Delivery::ToolSummary(summary) => {
                if let Some(sink) = &tool_sink {
                    let call_id = summary.tool_call_id.clone();
                    if !deliver(|| sink.on_tool_summary(summary)) {
                        warn!(call_id, "tool summary sink panicked; later deliveries continue");
                    }
                }
            }
            Delivery::Reply(reply) => {
                if let Some(sink) = &reply_sink
                    && !deliver(|| sink.on_reply(reply))
                {
                    warn!("reply sink panicked; later deliveries continue");
                }
            }
            Delivery::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("delivery worker stopped");
}

/// Run one sink call, containing a panic. Returns whether it completed.
fn deliver(f: impl FnOnce()) -> bool {
    catch_unwind(AssertUnwindSafe(f)).is_ok()
}
