//! # PresenceCore: aggregation engine for presence subscriptions.
//!
//! The [`PresenceCore`] owns the subscription ledger, the registered
//! fetcher/publisher backends, and the cluster registry. It deduplicates
//! overlapping interest into a single backend subscription per identifier,
//! routes teardown to the backend that owns the subscription, and re-emits
//! one canonical event per accepted backend update.
//!
//! ## Key responsibilities
//! - reference-count `fetch_presence`/`unfetch_presence` per identifier
//! - resolve the owning backend by first-match over registration order
//! - accept raw backend updates, drop stragglers, re-emit canonical events
//! - publish the personal details record to every publisher on change
//! - announce cluster membership changes as structural events
//!
//! ## High-level architecture
//! ```text
//! Observers:                         Backends:
//!   fetch_presence(uri) ─┐             Fetch::fetch / Fetch::unfetch
//!   unfetch_presence(uri)┼──► Ledger ◄─────────┘ (first/last edge only)
//!   is_supported_uri(uri)┘      │
//!                               │ accepted updates (BackendSink → listener loop)
//!                               ▼
//!                        canonical events ──► Bus ──► fan-out ──► ListenerSet
//!
//! Publication:
//!   DetailsStore (external) ── watch ──► listener loop ──► publish()
//!                                             └──► Publish::publish(&snapshot), in order
//! ```
//!
//! ## Serialization model
//! All mutable state sits behind one `tokio::sync::RwLock`. Backend
//! `fetch`/`unfetch` calls happen **while the write lock is held** and the
//! publisher fan-out happens while the read lock is held, so registration
//! changes are linearizable with respect to them: a backend removed is never
//! invoked by an operation that logically follows the removal. The price is
//! a reentrancy rule: backends must not call back into the engine from
//! inside their contract methods (delivering through the sink is always
//! safe, it goes through a channel).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use presentia::{BackendSink, CoreConfig, Fetch, PresenceCore};
//!
//! struct Echo { sink: BackendSink }
//!
//! #[async_trait]
//! impl Fetch for Echo {
//!     fn name(&self) -> &str { "echo" }
//!     fn is_supported_uri(&self, uri: &str) -> bool { uri.starts_with("echo:") }
//!     async fn fetch(&self, uri: &str) { let _ = self.sink.presence(uri, "Online"); }
//!     async fn unfetch(&self, _uri: &str) {}
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let core = PresenceCore::new(CoreConfig::default(), Vec::new(), None);
//!     let token = CancellationToken::new();
//!     core.spawn_listener(token.clone()).unwrap();
//!
//!     let echo = Arc::new(Echo { sink: core.backend_sink() });
//!     core.add_fetcher(echo).await;
//!
//!     let mut events = core.subscribe();
//!     core.fetch_presence("echo:alice").await;
//!     let ev = events.recv().await.unwrap();
//!     assert_eq!(ev.payload.as_deref(), Some("Online"));
//!
//!     core.unfetch_presence("echo:alice").await;
//!     token.cancel();
//! }
//! ```

use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use tokio::sync::{mpsc, watch, RwLock};
use tokio_util::sync::CancellationToken;

use crate::backends::{
    BackendSink, BackendUpdate, FetcherId, FetcherRef, PublisherId, PublisherRef,
};
use crate::config::CoreConfig;
use crate::core::cluster::ClusterRef;
use crate::core::ledger::{Acquire, Ledger, Release};
use crate::details::PersonalDetails;
use crate::error::CoreError;
use crate::events::{Bus, EventKind, PresenceEvent};
use crate::forms::QuestionRelay;
use crate::listeners::{Listen, ListenerSet};

/// A registered fetcher with its registration token.
struct FetcherSlot {
    id: FetcherId,
    backend: FetcherRef,
}

/// A registered publisher with its registration token.
struct PublisherSlot {
    id: PublisherId,
    backend: PublisherRef,
}

/// Mutable engine state, serialized behind a single lock.
#[derive(Default)]
struct Inner {
    ledger: Ledger,
    fetchers: Vec<FetcherSlot>,
    publishers: Vec<PublisherSlot>,
    clusters: Vec<ClusterRef>,
    next_token: u64,
}

impl Inner {
    fn next_token(&mut self) -> u64 {
        let t = self.next_token;
        self.next_token += 1;
        t
    }
}

/// Aggregation engine: owns the ledger, the backend registrations, and the
/// cluster registry.
pub struct PresenceCore {
    bus: Bus,
    listeners: Arc<ListenerSet>,
    questions: QuestionRelay,
    inner: RwLock<Inner>,

    backend_tx: mpsc::UnboundedSender<BackendUpdate>,
    /// Taken once by `spawn_listener`.
    backend_rx: StdMutex<Option<mpsc::UnboundedReceiver<BackendUpdate>>>,

    /// Read side of the externally-owned personal details record, if any.
    details: Option<watch::Receiver<PersonalDetails>>,
}

impl PresenceCore {
    /// Creates a new engine.
    ///
    /// `listeners` get a dedicated fan-out worker each; `details` is the
    /// read side of the externally-owned [`DetailsStore`](crate::DetailsStore)
    /// (pass `None` to disable publication entirely).
    pub fn new(
        cfg: CoreConfig,
        listeners: Vec<Arc<dyn Listen>>,
        details: Option<watch::Receiver<PersonalDetails>>,
    ) -> Arc<Self> {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let set = Arc::new(ListenerSet::new(listeners, bus.clone()));
        let (backend_tx, backend_rx) = mpsc::unbounded_channel();

        Arc::new(Self {
            bus,
            listeners: set,
            questions: QuestionRelay::new(),
            inner: RwLock::new(Inner::default()),
            backend_tx,
            backend_rx: StdMutex::new(Some(backend_rx)),
            details,
        })
    }

    // ---------------------------
    // Wiring
    // ---------------------------

    /// Spawns the engine's listener loop.
    ///
    /// The loop drains backend updates from the sink, fans canonical events
    /// out to the listener set, and publishes personal details on change.
    /// It runs until `token` is cancelled. Call once during setup; a second
    /// call fails with [`CoreError::ListenerClaimed`].
    pub fn spawn_listener(self: &Arc<Self>, token: CancellationToken) -> Result<(), CoreError> {
        let mut rx = self
            .backend_rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .ok_or(CoreError::ListenerClaimed)?;

        let mut bus_rx = self.bus.subscribe();
        let mut details = self.details.clone();
        let me = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    update = rx.recv() => match update {
                        Some(update) => me.handle_update(update).await,
                        None => break,
                    },
                    msg = bus_rx.recv() => match msg {
                        Ok(ev) => me.listeners.emit(&ev),
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "fan-out loop lagged behind the bus");
                            continue;
                        }
                    },
                    changed = async {
                        match details.as_mut() {
                            Some(d) => d.changed().await,
                            None => std::future::pending().await,
                        }
                    } => match changed {
                        Ok(()) => me.publish().await,
                        // Owner dropped the store; publication stops for good.
                        Err(_) => details = None,
                    },
                }
            }
            tracing::debug!("engine listener loop stopped");
        });

        Ok(())
    }

    /// Routes one raw backend update to the matching handler.
    async fn handle_update(&self, update: BackendUpdate) {
        match update {
            BackendUpdate::Presence { uri, value } => self.on_presence_received(&uri, &value).await,
            BackendUpdate::Note { uri, text } => self.on_note_received(&uri, &text).await,
        }
    }

    // ---------------------------
    // Fetcher registration
    // ---------------------------

    /// Registers a fetcher, returning its registration token.
    ///
    /// Adding a backend that is already registered (pointer identity) is a
    /// no-op returning the existing token. Registration order matters: it is
    /// the consultation order for [`Self::is_supported_uri`] resolution.
    pub async fn add_fetcher(&self, backend: FetcherRef) -> FetcherId {
        let mut inner = self.inner.write().await;
        if let Some(slot) = inner
            .fetchers
            .iter()
            .find(|s| same_instance(&s.backend, &backend))
        {
            tracing::debug!(backend = backend.name(), "fetcher already registered");
            return slot.id;
        }
        let id = FetcherId(inner.next_token());
        tracing::debug!(backend = backend.name(), ?id, "fetcher registered");
        inner.fetchers.push(FetcherSlot { id, backend });
        id
    }

    /// Removes a fetcher; unknown tokens are a no-op.
    ///
    /// Outstanding identifiers resolved to this backend are **not**
    /// force-unfetched: their ledger entries keep the stale token, and the
    /// unfetch at last release is skipped. Known limitation, kept
    /// deliberately to avoid surprising side effects on the backend.
    pub async fn remove_fetcher(&self, id: FetcherId) {
        let mut inner = self.inner.write().await;
        match inner.fetchers.iter().position(|s| s.id == id) {
            Some(at) => {
                let slot = inner.fetchers.remove(at);
                tracing::debug!(backend = slot.backend.name(), ?id, "fetcher removed");
            }
            None => tracing::trace!(?id, "remove_fetcher: unknown token, ignoring"),
        }
    }

    // ---------------------------
    // Fetch / unfetch
    // ---------------------------

    /// Declares interest in presence information for `uri`.
    ///
    /// On the first interest the registered fetchers are consulted in
    /// registration order and the first one claiming the identifier receives
    /// the single backend `fetch`. Further calls only bump the reference
    /// count. A URI no backend claims is still tracked (count only) and is
    /// never retroactively re-resolved when fetchers are added later.
    pub async fn fetch_presence(&self, uri: &str) {
        let mut inner = self.inner.write().await;
        match inner.ledger.acquire(uri) {
            Acquire::Shared(count) => {
                tracing::trace!(uri, count, "interest shared, no backend call");
            }
            Acquire::First => {
                let owner = inner
                    .fetchers
                    .iter()
                    .find(|s| s.backend.is_supported_uri(uri))
                    .map(|s| (s.id, Arc::clone(&s.backend)));

                match owner {
                    Some((id, backend)) => {
                        inner.ledger.bind_backend(uri, id);
                        tracing::debug!(
                            uri,
                            backend = backend.name(),
                            tracked = inner.ledger.len(),
                            "first interest, fetching"
                        );
                        // Lock stays held: a concurrent remove_fetcher cannot
                        // slip between resolution and the fetch call.
                        backend.fetch(uri).await;
                    }
                    None => {
                        tracing::debug!(uri, "no backend claims uri; tracking without subscription");
                    }
                }
            }
        }
    }

    /// Withdraws one interest in `uri`.
    ///
    /// A no-op when nothing tracks the identifier; the count never goes
    /// negative. When the last interest leaves, the backend that owns the
    /// subscription receives the single `unfetch` and the cached value is
    /// discarded immediately.
    pub async fn unfetch_presence(&self, uri: &str) {
        let mut inner = self.inner.write().await;
        match inner.ledger.release(uri) {
            Release::Untracked => {
                tracing::trace!(uri, "unfetch for untracked uri, ignoring");
            }
            Release::Shared(count) => {
                tracing::trace!(uri, count, "interest remains");
            }
            Release::Last { backend } => match backend {
                Some(id) => {
                    let owner = inner
                        .fetchers
                        .iter()
                        .find(|s| s.id == id)
                        .map(|s| Arc::clone(&s.backend));
                    match owner {
                        Some(backend) => {
                            tracing::debug!(uri, backend = backend.name(), "last interest, unfetching");
                            backend.unfetch(uri).await;
                        }
                        None => {
                            tracing::debug!(uri, "owning backend gone, skipping unfetch");
                        }
                    }
                }
                None => tracing::trace!(uri, "last interest for unresolved uri"),
            },
        }
    }

    /// True iff any registered fetcher claims `uri`.
    ///
    /// Same first-match resolution as [`Self::fetch_presence`]: registration
    /// order decides which backend would receive the fetch.
    pub async fn is_supported_uri(&self, uri: &str) -> bool {
        let inner = self.inner.read().await;
        inner.fetchers.iter().any(|s| s.backend.is_supported_uri(uri))
    }

    // ---------------------------
    // Backend update handling
    // ---------------------------

    /// Accepts a presence update from a backend.
    ///
    /// The ledger is updated only when a live entry exists; otherwise the
    /// event is a late straggler and is dropped. One canonical event is
    /// re-emitted per accepted update, regardless of how many observers
    /// share interest in `uri`.
    pub async fn on_presence_received(&self, uri: &str, value: &str) {
        let accepted = {
            let mut inner = self.inner.write().await;
            inner.ledger.set_presence(uri, value)
        };
        if accepted {
            tracing::debug!(uri, value, "presence accepted");
            self.bus.publish(PresenceEvent::presence(uri, value));
        } else {
            tracing::trace!(uri, "presence for untracked uri, ignoring");
        }
    }

    /// Accepts a status-note update from a backend.
    ///
    /// Same acceptance rules as [`Self::on_presence_received`].
    pub async fn on_note_received(&self, uri: &str, text: &str) {
        let accepted = {
            let mut inner = self.inner.write().await;
            inner.ledger.set_note(uri, text)
        };
        if accepted {
            tracing::debug!(uri, "note accepted");
            self.bus.publish(PresenceEvent::note(uri, text));
        } else {
            tracing::trace!(uri, "note for untracked uri, ignoring");
        }
    }

    // ---------------------------
    // Publisher registration and publication
    // ---------------------------

    /// Registers a publisher, returning its registration token.
    ///
    /// Duplicate registration (pointer identity) is a no-op returning the
    /// existing token.
    pub async fn add_publisher(&self, backend: PublisherRef) -> PublisherId {
        let mut inner = self.inner.write().await;
        if let Some(slot) = inner
            .publishers
            .iter()
            .find(|s| same_instance(&s.backend, &backend))
        {
            tracing::debug!(backend = backend.name(), "publisher already registered");
            return slot.id;
        }
        let id = PublisherId(inner.next_token());
        tracing::debug!(backend = backend.name(), ?id, "publisher registered");
        inner.publishers.push(PublisherSlot { id, backend });
        id
    }

    /// Removes a publisher; unknown tokens are a no-op.
    ///
    /// Once removal returns, no further `publish` call reaches the backend:
    /// the publication fan-out runs under the same lock.
    pub async fn remove_publisher(&self, id: PublisherId) {
        let mut inner = self.inner.write().await;
        match inner.publishers.iter().position(|s| s.id == id) {
            Some(at) => {
                let slot = inner.publishers.remove(at);
                tracing::debug!(backend = slot.backend.name(), ?id, "publisher removed");
            }
            None => tracing::trace!(?id, "remove_publisher: unknown token, ignoring"),
        }
    }

    /// Pushes the current personal details snapshot to every publisher, in
    /// registration order.
    ///
    /// Invoked automatically by the listener loop whenever the details
    /// record changes; callable directly to force a publication. Skips
    /// silently when the engine was built without a details record. Failures
    /// are each publisher's concern and cannot abort the fan-out.
    pub async fn publish(&self) {
        let Some(details) = &self.details else {
            tracing::trace!("no details record attached, skipping publication");
            return;
        };
        let snapshot = details.borrow().clone();

        // Read lock held across the fan-out: remove_publisher linearizes
        // against in-flight publications.
        let inner = self.inner.read().await;
        tracing::debug!(
            publishers = inner.publishers.len(),
            presence = %snapshot.presence,
            "publishing personal details"
        );
        for slot in &inner.publishers {
            slot.backend.publish(&snapshot).await;
        }
    }

    // ---------------------------
    // Cluster registry
    // ---------------------------

    /// Adds a cluster and announces it as a structural event.
    ///
    /// Adding the same cluster handle twice is a no-op.
    pub async fn add_cluster(&self, cluster: ClusterRef) {
        let name = {
            let mut inner = self.inner.write().await;
            if inner.clusters.iter().any(|c| same_instance(c, &cluster)) {
                tracing::debug!(cluster = cluster.name(), "cluster already registered");
                return;
            }
            let name = cluster.name().to_string();
            inner.clusters.push(cluster);
            name
        };
        self.bus
            .publish(PresenceEvent::new(EventKind::ClusterAdded).with_cluster(name));
    }

    /// Removes a cluster and announces it; unknown handles are a no-op.
    pub async fn remove_cluster(&self, cluster: &ClusterRef) {
        let removed = {
            let mut inner = self.inner.write().await;
            match inner.clusters.iter().position(|c| same_instance(c, cluster)) {
                Some(at) => Some(inner.clusters.remove(at).name().to_string()),
                None => None,
            }
        };
        match removed {
            Some(name) => self
                .bus
                .publish(PresenceEvent::new(EventKind::ClusterRemoved).with_cluster(name)),
            None => tracing::trace!(cluster = cluster.name(), "remove_cluster: unknown handle"),
        }
    }

    /// Visits clusters in registration order.
    ///
    /// The visitor returns `false` to stop the iteration early. Enumeration
    /// only; the registry is not mutable through the visitor.
    pub async fn visit_clusters(&self, mut visitor: impl FnMut(&ClusterRef) -> bool) {
        let inner = self.inner.read().await;
        for cluster in &inner.clusters {
            if !visitor(cluster) {
                break;
            }
        }
    }

    // ---------------------------
    // Accessors
    // ---------------------------

    /// Last accepted presence value for `uri`, if it is currently tracked.
    ///
    /// `"unknown"` until a backend update is accepted; `None` once the last
    /// interest leaves (cached values do not outlive the subscription).
    pub async fn presence_of(&self, uri: &str) -> Option<String> {
        let inner = self.inner.read().await;
        inner.ledger.presence_of(uri).map(str::to_string)
    }

    /// Last accepted status note for `uri`, if it is currently tracked.
    pub async fn note_of(&self, uri: &str) -> Option<String> {
        let inner = self.inner.read().await;
        inner.ledger.note_of(uri).map(str::to_string)
    }

    /// Current reference count for `uri`; 0 when untracked.
    pub async fn reference_count(&self, uri: &str) -> u32 {
        let inner = self.inner.read().await;
        inner.ledger.count_of(uri)
    }

    /// The canonical event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Shorthand for `bus().subscribe()`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PresenceEvent> {
        self.bus.subscribe()
    }

    /// A cloneable sink for backends to deliver updates through.
    pub fn backend_sink(&self) -> BackendSink {
        BackendSink::new(self.backend_tx.clone())
    }

    /// The configuration question relay.
    pub fn questions(&self) -> &QuestionRelay {
        &self.questions
    }
}

/// Pointer identity for shared trait-object handles.
///
/// Compares data pointers only, sidestepping vtable-address instability.
fn same_instance<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
