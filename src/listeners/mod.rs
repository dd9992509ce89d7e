//! # Canonical event listeners.
//!
//! This module provides the [`Listen`] trait and the [`ListenerSet`] fan-out
//! used to deliver the engine's canonical events to observers.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   PresenceCore ── publish(PresenceEvent) ──► Bus ──► fan-out loop
//!                                                        │
//!                                                   ListenerSet::emit
//!                                                  ┌─────┴─────┬────────┐
//!                                                  ▼           ▼        ▼
//!                                              LogWriter    Metrics   Custom...
//! ```
//!
//! Listeners receive **every** canonical event; filtering by URI is the
//! listener's job. There is one canonical event per accepted backend update,
//! regardless of how many observers share interest in the identifier.

mod listen;
#[cfg(feature = "logging")]
mod log;
mod set;

pub use listen::Listen;
#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::ListenerSet;
