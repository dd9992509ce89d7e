//! Canonical events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to the canonical events re-emitted by the engine.
//!
//! ## Contents
//! - [`EventKind`], [`PresenceEvent`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publisher**: [`PresenceCore`](crate::PresenceCore), the only writer.
//!   Backends never publish here directly; their raw updates go through the
//!   [`BackendSink`](crate::backends::BackendSink) and are re-emitted as
//!   canonical events once the ledger accepted them.
//! - **Consumers**: the [`ListenerSet`](crate::listeners::ListenerSet) fan-out
//!   loop, plus any ad-hoc `bus().subscribe()` receiver.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{EventKind, PresenceEvent};
