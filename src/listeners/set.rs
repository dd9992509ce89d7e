//! # ListenerSet: non-blocking fan-out over multiple listeners
//!
//! [`ListenerSet`] distributes each [`PresenceEvent`] to multiple listeners
//! **without awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&PresenceEvent)` returns immediately.
//! - Per-listener FIFO (queue order).
//! - Panics inside listeners are caught and reported (isolation).
//!
//! ## What it does **not** guarantee
//! - No global ordering across different listeners (use `seq` to re-order).
//! - No retries on per-listener queue overflow (events are dropped for that
//!   listener and a `ListenerOverflow` event is published).
//!
//! ## Diagram
//! ```text
//!    emit(&PresenceEvent)
//!        │                        (Arc-clone per listener)
//!        ├────────────────► [queue L1] ─► worker L1 ─► on_event()
//!        ├────────────────► [queue L2] ─► worker L2 ─► on_event()
//!        └────────────────► [queue LN] ─► worker LN ─► on_event()
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, PresenceEvent};

use super::Listen;

/// Per-listener channel with metadata.
struct ListenerChannel {
    name: String,
    sender: mpsc::Sender<Arc<PresenceEvent>>,
}

/// Composite fan-out with per-listener bounded queues and worker tasks.
pub struct ListenerSet {
    channels: Vec<ListenerChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl ListenerSet {
    /// Creates a new set and spawns one worker per listener.
    ///
    /// The bus is used to report delivery failures (overflow, panic) as
    /// events of their own.
    #[must_use]
    pub fn new(listeners: Vec<Arc<dyn Listen>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(listeners.len());
        let mut workers = Vec::with_capacity(listeners.len());

        for listener in listeners {
            let cap = listener.queue_capacity().max(1);
            let name = listener.name().to_string();
            let (tx, mut rx) = mpsc::channel::<Arc<PresenceEvent>>(cap);
            let l = Arc::clone(&listener);
            let report_bus = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = l.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        tracing::warn!(listener = l.name(), "listener panicked: {panic_err:?}");
                        report_bus
                            .publish(PresenceEvent::listener_panicked(l.name(), format!("{panic_err:?}")));
                    }
                }
            });

            channels.push(ListenerChannel { name, sender: tx });
            workers.push(handle);
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Fan-out one event to all listeners (non-blocking).
    ///
    /// If a listener's queue is **full** or **closed**, the event is dropped
    /// for it and a `ListenerOverflow` event is published. Drops of
    /// overflow/panic reports themselves are never re-reported, so a
    /// saturated queue cannot feed itself.
    pub fn emit(&self, event: &PresenceEvent) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.report_drop(event, &channel.name, "full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    self.report_drop(event, &channel.name, "closed");
                }
            }
        }
    }

    fn report_drop(&self, event: &PresenceEvent, listener: &str, reason: &str) {
        tracing::warn!(listener, reason, "listener dropped event");
        if !event.is_fanout_report() {
            self.bus
                .publish(PresenceEvent::listener_overflow(listener, reason));
        }
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no listeners.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}
