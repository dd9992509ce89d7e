//! Backend contracts: presence fetchers, publishers, and the update sink.
//!
//! A backend owns a class of identifiers (a protocol, a directory, a test
//! double) and plugs into the engine through two abstract contracts:
//!
//! - [`Fetch`] claims identifiers and supplies presence data for them;
//! - [`Publish`] pushes the local user's own details out to a directory.
//!
//! Backends never touch the canonical [`Bus`](crate::events::Bus) directly.
//! Raw updates flow through a [`BackendSink`] into the engine, which consults
//! the ledger and re-emits exactly one canonical event per accepted update:
//!
//! ```text
//! Fetcher ── sink.presence(uri, value) ──► engine listener loop
//!                                              │ ledger accepts?
//!                                              ├─ yes ─► Bus (canonical event)
//!                                              └─ no  ─► dropped (no live interest)
//! ```
//!
//! Registration hands out opaque tokens ([`FetcherId`], [`PublisherId`]) so
//! removal is identity-stable regardless of how the backend is shared.

mod fetch;
mod publish;
mod sink;

pub use fetch::{Fetch, FetcherId, FetcherRef};
pub use publish::{Publish, PublisherId, PublisherRef};
pub use sink::{BackendSink, BackendUpdate};
