//! # Canonical events emitted by the presence engine.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Presence events**: accepted backend updates (presence value, status note)
//! - **Structural events**: cluster membership changes (added, removed)
//! - **Fan-out events**: listener delivery failures (overflow, panic)
//!
//! The [`PresenceEvent`] struct carries the identifier, the payload string,
//! and ordering metadata.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order across listeners.
//!
//! ## Fan-out decoupling
//! A presence event is emitted once per accepted backend update, no matter
//! how many `fetch_presence` calls share interest in the identifier. Filtering
//! by `uri` is the listener's job.
//!
//! ## Example
//! ```rust
//! use presentia::{EventKind, PresenceEvent};
//!
//! let ev = PresenceEvent::new(EventKind::PresenceReceived)
//!     .with_uri("sip:alice@example.com")
//!     .with_payload("Online");
//!
//! assert_eq!(ev.kind, EventKind::PresenceReceived);
//! assert_eq!(ev.uri.as_deref(), Some("sip:alice@example.com"));
//! assert_eq!(ev.payload.as_deref(), Some("Online"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of canonical events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Presence events ===
    /// A backend presence update was accepted into the ledger.
    ///
    /// Sets:
    /// - `uri`: the identifier the update is about
    /// - `payload`: the new presence value (backend vocabulary; `"unknown"`
    ///   is the only reserved sentinel)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    PresenceReceived,

    /// A backend status-note update was accepted into the ledger.
    ///
    /// Sets:
    /// - `uri`: the identifier the update is about
    /// - `payload`: the new note text (free-form)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    NoteReceived,

    // === Structural events ===
    /// An observer cluster was added to the engine.
    ///
    /// Sets:
    /// - `cluster`: cluster name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ClusterAdded,

    /// An observer cluster was removed from the engine.
    ///
    /// Sets:
    /// - `cluster`: cluster name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ClusterRemoved,

    // === Fan-out events ===
    /// A listener dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `cluster`: listener name
    /// - `payload`: reason string (e.g., "full", "closed")
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ListenerOverflow,

    /// A listener panicked during event processing.
    ///
    /// Sets:
    /// - `cluster`: listener name
    /// - `payload`: panic info/message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ListenerPanicked,
}

/// Canonical event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct PresenceEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Identifier the event is about, if applicable.
    pub uri: Option<Arc<str>>,
    /// Payload string: presence value, note text, or failure reason.
    pub payload: Option<Arc<str>>,
    /// Cluster or listener name for structural/fan-out events.
    pub cluster: Option<Arc<str>>,
}

impl PresenceEvent {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            uri: None,
            payload: None,
            cluster: None,
        }
    }

    /// Attaches an identifier.
    #[inline]
    pub fn with_uri(mut self, uri: impl Into<Arc<str>>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Attaches a payload string.
    #[inline]
    pub fn with_payload(mut self, payload: impl Into<Arc<str>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Attaches a cluster or listener name.
    #[inline]
    pub fn with_cluster(mut self, cluster: impl Into<Arc<str>>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    /// Creates a canonical presence event.
    #[inline]
    pub fn presence(uri: &str, value: &str) -> Self {
        PresenceEvent::new(EventKind::PresenceReceived)
            .with_uri(uri)
            .with_payload(value)
    }

    /// Creates a canonical note event.
    #[inline]
    pub fn note(uri: &str, text: &str) -> Self {
        PresenceEvent::new(EventKind::NoteReceived)
            .with_uri(uri)
            .with_payload(text)
    }

    /// Creates a listener overflow event.
    #[inline]
    pub fn listener_overflow(listener: &str, reason: &str) -> Self {
        PresenceEvent::new(EventKind::ListenerOverflow)
            .with_cluster(listener)
            .with_payload(reason)
    }

    /// Creates a listener panic event.
    #[inline]
    pub fn listener_panicked(listener: &str, info: String) -> Self {
        PresenceEvent::new(EventKind::ListenerPanicked)
            .with_cluster(listener)
            .with_payload(info)
    }

    /// True for fan-out failure reports (overflow/panic).
    ///
    /// The fan-out loop must not re-report drops of these, or a saturated
    /// listener queue would feed itself.
    #[inline]
    pub fn is_fanout_report(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ListenerOverflow | EventKind::ListenerPanicked
        )
    }
}
