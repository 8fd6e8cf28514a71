//! The boundary with a running agent session.
//!
//! A session is a black box that emits [`SessionEvent`]s to whoever has
//! subscribed. This module defines the two traits on either side of that
//! boundary and an in-process [`ManualSession`] that tests and the replay
//! tool drive by hand.
//!
//! ```ignore
//! let session = ManualSession::new();
//! let unsubscribe = session.subscribe(Arc::new(FnListener::new(|event| {
//!     println!("{}", event.kind());
//! })));
//! session.emit(&SessionEvent::AgentEnd { error: None });
//! unsubscribe.call();
//! ```

pub mod events;

pub use events::{AgentMessage, SessionEvent};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;

/// Receives events from an [`AgentSession`].
///
/// Sessions call listeners synchronously from their own emission path, so
/// implementations must not block.
pub trait SessionListener: Send + Sync {
    /// Called once per event, in emission order.
    fn on_event(&self, event: &SessionEvent);

    /// Called with an undecoded event. The default decodes with
    /// [`SessionEvent::from_value`] and drops anything malformed.
    fn on_raw_event(&self, raw: &Value) {
        if let Some(event) = SessionEvent::from_value(raw) {
            self.on_event(&event);
        }
    }
}

/// A listener backed by a closure.
pub struct FnListener<F>(F)
where
    F: Fn(&SessionEvent) + Send + Sync;

impl<F> FnListener<F>
where
    F: Fn(&SessionEvent) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> SessionListener for FnListener<F>
where
    F: Fn(&SessionEvent) + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent) {
        (self.0)(event)
    }
}

/// The release half of a session subscription.
///
/// Consumed by [`call`](Unsubscribe::call), so the session-side release runs
/// at most once.
pub struct Unsubscribe(Box<dyn FnOnce() + Send>);

impl Unsubscribe {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    /// An unsubscribe that does nothing, for sessions with no release step.
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    pub fn call(self) {
        (self.0)()
    }
}

impl std::fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Unsubscribe")
    }
}

/// A source of session events.
pub trait AgentSession {
    /// Register `listener` and return the function that removes it.
    fn subscribe(&self, listener: Arc<dyn SessionListener>) -> Unsubscribe;
}

type ListenerList = Vec<(u64, Arc<dyn SessionListener>)>;

/// An in-process session whose events are pushed by the caller.
///
/// Cloning shares the listener list.
#[derive(Clone, Default)]
pub struct ManualSession {
    listeners: Arc<Mutex<ListenerList>>,
    next_id: Arc<AtomicU64>,
}

impl ManualSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every current listener in registration order.
    ///
    /// The listener list is snapshotted first so a listener may unsubscribe
    /// itself (or others) from inside `on_event`.
    pub fn emit(&self, event: &SessionEvent) {
        for listener in self.snapshot() {
            listener.on_event(event);
        }
    }

    /// Deliver an undecoded event to every current listener.
    pub fn emit_raw(&self, raw: &Value) {
        for listener in self.snapshot() {
            listener.on_raw_event(raw);
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn snapshot(&self) -> Vec<Arc<dyn SessionListener>> {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect()
    }
}

impl AgentSession for ManualSession {
    fn subscribe(&self, listener: Arc<dyn SessionListener>) -> Unsubscribe {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, listener));

        let listeners: Weak<Mutex<ListenerList>> = Arc::downgrade(&self.listeners);
        Unsubscribe::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .retain(|(lid, _)| *lid != id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recording_listener() -> (Arc<dyn SessionListener>, Arc<Mutex<Vec<&'static str>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let listener: Arc<dyn SessionListener> = Arc::new(FnListener::new(move |event: &SessionEvent| {
            s.lock().unwrap().push(event.kind());
        }));
        (listener, seen)
    }

    #[test]
    fn emit_reaches_every_listener_in_order() {
        let session = ManualSession::new();
        let (a, seen_a) = recording_listener();
        let (b, seen_b) = recording_listener();
        let _ua = session.subscribe(a);
        let _ub = session.subscribe(b);

        session.emit(&SessionEvent::AgentStart { session_id: None });
        session.emit(&SessionEvent::AgentEnd { error: None });

        assert_eq!(*seen_a.lock().unwrap(), vec!["agent_start", "agent_end"]);
        assert_eq!(*seen_b.lock().unwrap(), vec!["agent_start", "agent_end"]);
    }

    #[test]
    fn unsubscribe_removes_only_that_listener() {
        let session = ManualSession::new();
        let (a, seen_a) = recording_listener();
        let (b, seen_b) = recording_listener();
        let ua = session.subscribe(a);
        let _ub = session.subscribe(b);
        assert_eq!(session.listener_count(), 2);

        ua.call();
        assert_eq!(session.listener_count(), 1);

        session.emit(&SessionEvent::AgentEnd { error: None });
        assert!(seen_a.lock().unwrap().is_empty());
        assert_eq!(seen_b.lock().unwrap().len(), 1);
    }

    #[test]
    fn emit_raw_decodes_and_drops_malformed() {
        let session = ManualSession::new();
        let (listener, seen) = recording_listener();
        let _u = session.subscribe(listener);

        session.emit_raw(&json!({"type": "agent_end"}));
        session.emit_raw(&json!({"type": "tool_execution_start"}));
        session.emit_raw(&json!({"type": "something_new"}));

        assert_eq!(*seen.lock().unwrap(), vec!["agent_end", "unknown"]);
    }

    #[test]
    fn unsubscribe_after_session_dropped_is_harmless() {
        let session = ManualSession::new();
        let (listener, _seen) = recording_listener();
        let unsubscribe = session.subscribe(listener);
        drop(session);
        unsubscribe.call();
    }
}
