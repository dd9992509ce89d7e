//! Error types used by the presence engine.
//!
//! Ordinary flow control never errors here: an unmatched unfetch, a duplicate
//! registration, a backend event for an identifier nobody watches, or a URI no
//! backend claims are all silent no-ops. [`CoreError`] covers only genuine
//! plumbing faults around the engine's own channels.

use thiserror::Error;

/// # Errors produced by the presence engine plumbing.
///
/// These represent failures of the engine's channels, not of presence flow
/// control (which is no-op based, see the module docs).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CoreError {
    /// A backend tried to deliver an update after the engine side of the
    /// sink was dropped.
    #[error("backend sink closed; engine is gone")]
    SinkClosed,

    /// `spawn_listener` was called twice; the backend receiver is already
    /// owned by the first listener loop.
    #[error("listener loop already claimed")]
    ListenerClaimed,
}

impl CoreError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use presentia::CoreError;
    ///
    /// assert_eq!(CoreError::SinkClosed.as_label(), "core_sink_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CoreError::SinkClosed => "core_sink_closed",
            CoreError::ListenerClaimed => "core_listener_claimed",
        }
    }

    /// Returns a human-readable message with details about the error.
    ///
    /// # Example
    /// ```
    /// use presentia::CoreError;
    ///
    /// assert_eq!(
    ///     CoreError::ListenerClaimed.as_message(),
    ///     "listener loop already claimed"
    /// );
    /// ```
    pub fn as_message(&self) -> String {
        match self {
            CoreError::SinkClosed => "backend sink closed".to_string(),
            CoreError::ListenerClaimed => "listener loop already claimed".to_string(),
        }
    }
}
