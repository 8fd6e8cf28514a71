//! Error types.
//!
//! The bridge has almost no failure surface: malformed events, counter
//! underflow, and repeated unsubscribes are all absorbed silently. What is
//! left is setup-time misuse.

use thiserror::Error;

/// Errors returned by [`subscribe`](crate::bridge::subscribe).
#[derive(Debug, Error)]
pub enum SubscribeError {
    /// Tool summaries or assistant replies need a delivery worker, and there
    /// is no Tokio runtime to spawn it on.
    #[error(
        "tool summary or reply delivery requires a Tokio runtime; call subscribe from within one"
    )]
    NoRuntime,
}

/// Errors produced while building [`SubscribeOptions`](crate::bridge::SubscribeOptions).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid verbose level `{0}` (expected `off` or `on`)")]
    InvalidVerboseLevel(String),
}
