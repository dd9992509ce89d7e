//! # Backend update sink.
//!
//! [`BackendSink`] is the cloneable handle a fetcher uses to deliver
//! asynchronous presence/note updates to the engine. It wraps an unbounded
//! mpsc sender whose receiving end is drained by the engine's listener loop,
//! so all ledger mutations stay serialized in one place no matter how many
//! backend tasks emit concurrently.
//!
//! ## Rules
//! - `send` never blocks and never allocates a queue slot per subscriber;
//!   ordering is FIFO per sink clone.
//! - Updates for identifiers with no live interest are dropped by the engine
//!   (late stragglers after `unfetch` are expected and harmless).
//! - Once the engine is dropped, `send` fails with
//!   [`CoreError::SinkClosed`](crate::CoreError::SinkClosed); backends should
//!   treat that as a shutdown signal.

use tokio::sync::mpsc;

use crate::error::CoreError;

/// A raw update from a backend, before the ledger has accepted it.
#[derive(Debug, Clone)]
pub enum BackendUpdate {
    /// New presence value for an identifier.
    Presence {
        /// The identifier the update is about.
        uri: String,
        /// Backend-defined presence vocabulary.
        value: String,
    },
    /// New status note for an identifier.
    Note {
        /// The identifier the update is about.
        uri: String,
        /// Free-form note text.
        text: String,
    },
}

impl BackendUpdate {
    /// The identifier this update is about.
    ///
    /// # Example
    /// ```
    /// use presentia::BackendUpdate;
    ///
    /// let update = BackendUpdate::Note {
    ///     uri: "sip:alice@example.com".to_string(),
    ///     text: "out for lunch".to_string(),
    /// };
    /// assert_eq!(update.uri(), "sip:alice@example.com");
    /// ```
    pub fn uri(&self) -> &str {
        match self {
            BackendUpdate::Presence { uri, .. } => uri,
            BackendUpdate::Note { uri, .. } => uri,
        }
    }
}

/// Cloneable handle through which backends deliver updates to the engine.
#[derive(Clone, Debug)]
pub struct BackendSink {
    tx: mpsc::UnboundedSender<BackendUpdate>,
}

impl BackendSink {
    pub(crate) fn new(tx: mpsc::UnboundedSender<BackendUpdate>) -> Self {
        Self { tx }
    }

    /// Delivers a raw update to the engine.
    pub fn send(&self, update: BackendUpdate) -> Result<(), CoreError> {
        self.tx.send(update).map_err(|_| CoreError::SinkClosed)
    }

    /// Shorthand for sending a presence update.
    pub fn presence(&self, uri: &str, value: &str) -> Result<(), CoreError> {
        self.send(BackendUpdate::Presence {
            uri: uri.to_string(),
            value: value.to_string(),
        })
    }

    /// Shorthand for sending a note update.
    pub fn note(&self, uri: &str, text: &str) -> Result<(), CoreError> {
        self.send(BackendUpdate::Note {
            uri: uri.to_string(),
            text: text.to_string(),
        })
    }
}
