//! # presentia
//!
//! **Presentia** is a presence aggregation and subscription
//! reference-counting engine for Rust.
//!
//! Many independent observers (grouped into clusters) can request liveness
//! information for arbitrary contact identifiers (URIs) without knowing which
//! backend protocol owns each identifier or how many other observers share
//! interest in it. The crate is designed as a building block for rosters,
//! address books, and communication clients.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  observer #1 │   │  observer #2 │   │  observer #3 │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ fetch_presence / unfetch_presence   │
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  PresenceCore (aggregation engine)                                │
//! │  - Ledger (per-URI reference counts, last known presence/note)    │
//! │  - Fetcher/Publisher registrations (opaque tokens)                │
//! │  - Cluster registry (enumeration + structural events)             │
//! │  - QuestionRelay (backend → user form pass-through)               │
//! └──────┬──────────────────────────────┬───────────────────┬─────────┘
//!        │ fetch/unfetch                │ canonical events  │ publish
//!        │ (first/last edge only)       ▼                   ▼
//! ┌──────┴───────┐              ┌──────────────┐    ┌──────────────┐
//! │   Fetch      │              │     Bus      │    │   Publish    │
//! │  backends    │              │ (broadcast)  │    │  backends    │
//! └──────┬───────┘              └──────┬───────┘    └──────────────┘
//!        │ BackendSink                 ▼                   ▲
//!        │ (presence/note updates)  fan-out loop           │
//!        └────────────► engine      ListenerSet     DetailsStore
//!                       listener   (per-listener    (watch channel,
//!                       loop        queues+workers)  externally owned)
//! ```
//!
//! ### Reference counting
//! ```text
//! fetch_presence("sip:alice")   count 0 → 1   backend fetch("sip:alice")
//! fetch_presence("sip:alice")   count 1 → 2   (no backend call)
//! unfetch_presence("sip:alice") count 2 → 1   (no backend call)
//! unfetch_presence("sip:alice") count 1 → 0   backend unfetch("sip:alice")
//! unfetch_presence("sip:alice") untracked     no-op, never negative
//! ```
//!
//! One backend subscription per identifier, no matter how many observers
//! share it; one canonical event per accepted backend update, no matter how
//! many `fetch_presence` calls produced the interest.
//!
//! ## Error handling
//! Ordinary flow control never errors: unmatched unfetches, duplicate
//! registrations, URIs no backend claims, and events for untracked URIs are
//! all recoverable no-ops. [`CoreError`] covers only channel plumbing faults.
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use presentia::{
//!     BackendSink, CoreConfig, DetailsStore, Fetch, PersonalDetails, PresenceCore,
//! };
//!
//! struct DemoFetcher {
//!     sink: BackendSink,
//! }
//!
//! #[async_trait]
//! impl Fetch for DemoFetcher {
//!     fn name(&self) -> &str { "demo" }
//!     fn is_supported_uri(&self, uri: &str) -> bool { uri.starts_with("demo:") }
//!     async fn fetch(&self, uri: &str) {
//!         let _ = self.sink.presence(uri, "Online");
//!     }
//!     async fn unfetch(&self, _uri: &str) {}
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let details = DetailsStore::new(PersonalDetails::new("Online", ""));
//!     let core = PresenceCore::new(
//!         CoreConfig::default(),
//!         Vec::new(),
//!         Some(details.subscribe()),
//!     );
//!
//!     let token = CancellationToken::new();
//!     core.spawn_listener(token.clone()).unwrap();
//!
//!     core.add_fetcher(Arc::new(DemoFetcher { sink: core.backend_sink() })).await;
//!
//!     let mut events = core.subscribe();
//!     core.fetch_presence("demo:alice").await;
//!     let ev = events.recv().await.unwrap();
//!     assert_eq!(ev.uri.as_deref(), Some("demo:alice"));
//!
//!     core.unfetch_presence("demo:alice").await;
//!     token.cancel();
//! }
//! ```

mod backends;
mod config;
mod core;
mod details;
mod error;
mod events;
mod forms;
mod listeners;

// ---- Public re-exports ----

pub use crate::core::{Cluster, ClusterRef, PresenceCore};
pub use backends::{
    BackendSink, BackendUpdate, Fetch, FetcherId, FetcherRef, Publish, PublisherId, PublisherRef,
};
pub use config::CoreConfig;
pub use details::{DetailsStore, PersonalDetails};
pub use error::CoreError;
pub use events::{Bus, EventKind, PresenceEvent};
pub use forms::{FormField, FormRequest, HandleQuestion, QuestionRelay};
pub use listeners::{Listen, ListenerSet};

// Optional: expose a simple built-in logger listener (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use listeners::LogWriter;
