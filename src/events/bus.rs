//! # Event bus for broadcasting canonical events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that carries
//! the engine's canonical [`PresenceEvent`]s to any number of receivers.
//!
//! ## Architecture
//! ```text
//! Publisher (one):                    Receivers (many):
//!                                       ┌────► fan-out loop ──► ListenerSet
//!   PresenceCore ──────► Bus ──────────┤
//!                  (broadcast chan)     └────► ad-hoc bus().subscribe()
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active receivers at send time.

use tokio::sync::broadcast;

use super::event::PresenceEvent;

/// Broadcast channel for canonical events.
///
/// Thin wrapper over [`tokio::sync::broadcast`] that provides a
/// `publish`/`subscribe` API. Receivers get clones of each event.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<PresenceEvent>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    ///
    /// ### Notes
    /// - Capacity is **shared** across all receivers (not per-receiver).
    /// - When receivers lag, they will observe `RecvError::Lagged`.
    /// - The minimum capacity is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<PresenceEvent>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// - Takes ownership of the event; the broadcast channel clones it for each receiver.
    /// - If there are no receivers, the event is dropped (this function still returns immediately).
    pub fn publish(&self, ev: PresenceEvent) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    ///
    /// - Each call creates an **independent** receiver.
    /// - A receiver only gets events **sent after** it subscribes.
    /// - Slow receivers get `RecvError::Lagged(n)` and skip over missed items.
    pub fn subscribe(&self) -> broadcast::Receiver<PresenceEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(PresenceEvent::presence("sip:a@b", "Online"));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::PresenceReceived);
        assert_eq!(ev.uri.as_deref(), Some("sip:a@b"));
    }

    #[tokio::test]
    async fn capacity_is_clamped() {
        // Must not panic on a zero capacity.
        let bus = Bus::new(0);
        bus.publish(PresenceEvent::note("sip:a@b", "hi"));
    }
}
