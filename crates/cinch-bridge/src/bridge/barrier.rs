//! Counting barrier over automatic compaction retries.
//!
//! Every `auto_compaction_end` with `willRetry: true` means the session will
//! restart the run, and every `agent_end` closes one run out. The barrier
//! keeps the net count and releases waiters when it returns to zero, so a
//! caller can react only once the session has fully settled rather than
//! midway through a burst of retries.
//!
//! ```ignore
//! barrier.on_compaction_end(true);      // pending = 1
//! let settled = barrier.wait_for_compaction_retry();
//! barrier.on_compaction_end(true);      // pending = 2, the waiter re-arms
//! barrier.on_agent_end();               // pending = 1
//! barrier.on_agent_end();               // pending = 0, `settled` resolves
//! settled.await;
//! ```

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::{debug, info, trace};

#[derive(Default)]
struct BarrierState {
    pending: usize,
    waiters: Vec<oneshot::Sender<()>>,
}

/// Net count of outstanding compaction retries plus the callers waiting for
/// it to reach zero.
///
/// Counter and waiters live behind a single mutex so every update is one
/// step of a left-to-right fold over the event stream.
#[derive(Default)]
pub struct CompactionRetryBarrier {
    state: Mutex<BarrierState>,
}

impl CompactionRetryBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the end of an automatic compaction. Only a compaction that
    /// will retry the run adds to the count.
    pub fn on_compaction_end(&self, will_retry: bool) {
        if !will_retry {
            trace!("compaction finished without a retry");
            return;
        }
        let mut state = self.lock();
        state.pending += 1;
        debug!(pending = state.pending, "compaction retry scheduled");
    }

    /// Record a run completion. Settles one outstanding retry; when the
    /// count reaches zero every pending waiter is released in registration
    /// order. A completion with nothing outstanding is an idle run and leaves
    /// the count at zero.
    pub fn on_agent_end(&self) {
        let released = {
            let mut state = self.lock();
            if state.pending == 0 {
                trace!("agent_end with no pending compaction retry");
                return;
            }
            state.pending -= 1;
            if state.pending > 0 {
                debug!(pending = state.pending, "compaction retry settled");
                return;
            }
            std::mem::take(&mut state.waiters)
        };

        info!(waiters = released.len(), "all compaction retries settled");
        for waiter in released {
            // A dropped receiver just means that caller stopped waiting.
            let _ = waiter.send(());
        }
    }

    /// Outstanding retries.
    pub fn pending_retries(&self) -> usize {
        self.lock().pending
    }

    /// Wait until no compaction retries are outstanding.
    ///
    /// Registration happens immediately, when this method is called, not when
    /// the future is first polled. With nothing outstanding the future still
    /// yields once before completing. Otherwise it completes at the
    /// `agent_end` that brings the count back to zero, however many retries
    /// arrive in the meantime.
    ///
    /// There is no cancellation: drop the future, or race it against a
    /// timeout. If the barrier itself is dropped first, the future never
    /// completes.
    pub fn wait_for_compaction_retry(&self) -> impl Future<Output = ()> + Send + 'static {
        let receiver = {
            let mut state = self.lock();
            if state.pending == 0 {
                None
            } else {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                trace!(
                    pending = state.pending,
                    waiters = state.waiters.len(),
                    "waiting for compaction retries"
                );
                Some(rx)
            }
        };

        async move {
            match receiver {
                None => tokio::task::yield_now().await,
                Some(rx) => {
                    if rx.await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[tokio::test]
    async fn resolves_only_after_last_agent_end() {
        let barrier = CompactionRetryBarrier::new();
        barrier.on_compaction_end(true);
        barrier.on_compaction_end(true);

        let mut wait = Box::pin(barrier.wait_for_compaction_retry());
        assert!(futures::poll!(wait.as_mut()).is_pending());

        barrier.on_agent_end();
        assert!(futures::poll!(wait.as_mut()).is_pending());
        assert_eq!(barrier.pending_retries(), 1);

        barrier.on_agent_end();
        wait.await;
        assert_eq!(barrier.pending_retries(), 0);
    }

    #[tokio::test]
    async fn idle_wait_yields_then_completes() {
        let barrier = CompactionRetryBarrier::new();
        let mut wait = Box::pin(barrier.wait_for_compaction_retry());
        assert!(futures::poll!(wait.as_mut()).is_pending());
        wait.await;
    }

    #[tokio::test]
    async fn compaction_without_retry_is_ignored() {
        let barrier = CompactionRetryBarrier::new();
        barrier.on_compaction_end(false);
        assert_eq!(barrier.pending_retries(), 0);
        barrier.wait_for_compaction_retry().await;
    }

    #[tokio::test]
    async fn retry_after_wait_rearms() {
        let barrier = CompactionRetryBarrier::new();
        barrier.on_compaction_end(true);
        let mut wait = Box::pin(barrier.wait_for_compaction_retry());

        barrier.on_compaction_end(true);
        barrier.on_agent_end();
        assert!(futures::poll!(wait.as_mut()).is_pending());

        barrier.on_agent_end();
        wait.await;
    }

    #[tokio::test]
    async fn all_concurrent_waiters_release_together() {
        let barrier = CompactionRetryBarrier::new();
        barrier.on_compaction_end(true);

        let mut first = Box::pin(barrier.wait_for_compaction_retry());
        let mut second = Box::pin(barrier.wait_for_compaction_retry());
        let mut third = Box::pin(barrier.wait_for_compaction_retry());
        assert!(futures::poll!(first.as_mut()).is_pending());
        assert!(futures::poll!(second.as_mut()).is_pending());
        assert!(futures::poll!(third.as_mut()).is_pending());

        barrier.on_agent_end();
        assert!(first.now_or_never().is_some());
        assert!(second.now_or_never().is_some());
        assert!(third.now_or_never().is_some());
    }

    #[tokio::test]
    async fn underflow_clamps_to_zero() {
        let barrier = CompactionRetryBarrier::new();
        barrier.on_agent_end();
        barrier.on_agent_end();
        assert_eq!(barrier.pending_retries(), 0);

        // One retry still needs exactly one completion.
        barrier.on_compaction_end(true);
        let mut wait = Box::pin(barrier.wait_for_compaction_retry());
        assert!(futures::poll!(wait.as_mut()).is_pending());
        barrier.on_agent_end();
        wait.await;
    }

    #[tokio::test]
    async fn idle_wait_is_not_held_back_by_later_retry() {
        let barrier = CompactionRetryBarrier::new();
        let wait = barrier.wait_for_compaction_retry();
        barrier.on_compaction_end(true);
        wait.await;
        assert_eq!(barrier.pending_retries(), 1);
    }

    #[tokio::test]
    async fn dropped_waiter_does_not_disturb_others() {
        let barrier = CompactionRetryBarrier::new();
        barrier.on_compaction_end(true);
        drop(barrier.wait_for_compaction_retry());
        let kept = barrier.wait_for_compaction_retry();
        barrier.on_agent_end();
        kept.await;
    }

    #[test]
    fn wait_stays_pending_if_barrier_dropped() {
        let barrier = CompactionRetryBarrier::new();
        barrier.on_compaction_end(true);
        let wait = barrier.wait_for_compaction_retry();
        drop(barrier);
        assert!(wait.now_or_never().is_none());
    }

    #[test]
    fn many_retries_need_as_many_completions() {
        let barrier = CompactionRetryBarrier::new();
        for _ in 0..1000 {
            barrier.on_compaction_end(true);
        }
        let mut wait = Box::pin(barrier.wait_for_compaction_retry());
        for _ in 0..999 {
            barrier.on_agent_end();
        }
        assert!((&mut wait).now_or_never().is_none());
        barrier.on_agent_end();
        assert!(wait.now_or_never().is_some());
    }
}
