//! # Presence fetcher contract.
//!
//! [`Fetch`] is the extension point a backend implements to claim a class of
//! identifiers and monitor them. The engine calls [`Fetch::fetch`] exactly
//! once when the first observer becomes interested in a URI and
//! [`Fetch::unfetch`] exactly once when the last observer leaves; everything
//! in between is reference-counted by the engine's ledger.
//!
//! ## Contract
//! - [`Fetch::is_supported_uri`] is a pure predicate with no side effects.
//!   The engine consults fetchers in registration order and the **first** one
//!   answering `true` owns the URI (first-match, not best-match).
//! - `fetch` must tolerate being asked for a URI it already monitors.
//! - `unfetch` is never called for a URI that was not fetched.
//! - After `unfetch` the backend should stop emitting promptly; the engine
//!   drops late stragglers for unreferenced URIs.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use presentia::{BackendSink, Fetch};
//!
//! struct SipFetcher {
//!     sink: BackendSink,
//! }
//!
//! #[async_trait]
//! impl Fetch for SipFetcher {
//!     fn name(&self) -> &str { "sip" }
//!
//!     fn is_supported_uri(&self, uri: &str) -> bool {
//!         uri.starts_with("sip:")
//!     }
//!
//!     async fn fetch(&self, uri: &str) {
//!         // start a protocol subscription; later:
//!         let _ = self.sink.presence(uri, "Online");
//!     }
//!
//!     async fn unfetch(&self, _uri: &str) {
//!         // tear the protocol subscription down
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

/// Opaque registration token for a fetcher.
///
/// Returned by [`PresenceCore::add_fetcher`](crate::PresenceCore::add_fetcher)
/// and consumed by `remove_fetcher`. Identity-stable for the lifetime of the
/// engine regardless of how the backend itself is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetcherId(pub(crate) u64);

/// Shared handle to a fetcher backend.
pub type FetcherRef = Arc<dyn Fetch>;

/// Contract for presence-supplying backends.
///
/// Called from the engine while its registry lock is held: implementations
/// must not call back into the engine's registration or fetch methods from
/// inside `fetch`/`unfetch`. Delivering updates through the
/// [`BackendSink`](crate::backends::BackendSink) is always safe.
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    /// Returns a stable, human-readable backend name (for logs).
    fn name(&self) -> &str;

    /// Returns true if this backend can handle `uri`.
    ///
    /// Pure predicate: no side effects, no I/O.
    fn is_supported_uri(&self, uri: &str) -> bool;

    /// Starts monitoring `uri`.
    ///
    /// Called on the 0→1 reference edge only.
    async fn fetch(&self, uri: &str);

    /// Stops monitoring `uri`.
    ///
    /// Called on the 1→0 reference edge only, and only if this backend
    /// received the matching `fetch`.
    async fn unfetch(&self, uri: &str);
}
