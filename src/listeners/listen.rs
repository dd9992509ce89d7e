//! # Core listener trait.
//!
//! `Listen` is the extension point for plugging custom event handlers into
//! the engine. Each listener is driven by a dedicated worker loop fed by a
//! bounded queue owned by the [`ListenerSet`](crate::listeners::ListenerSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching) – they do **not** block the
//!   engine nor other listeners.
//! - Each listener **declares** its preferred queue capacity via
//!   [`Listen::queue_capacity`]. If a queue overflows, events for that
//!   listener are **dropped** (reported on the bus as `ListenerOverflow`).

use async_trait::async_trait;

use crate::events::PresenceEvent;

/// Contract for canonical event listeners.
///
/// Called from a listener-dedicated worker task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Listen: Send + Sync + 'static {
    /// Handle a single canonical event for this listener.
    async fn on_event(&self, event: &PresenceEvent);

    /// Returns a stable, human-readable listener name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this listener's queue.
    ///
    /// On overflow, events for this listener are **dropped**.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
