//! End-to-end scenarios for the aggregation engine: reference counting,
//! backend edge calls, canonical re-emission, publication, and clusters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast::error::TryRecvError;
use tokio_util::sync::CancellationToken;

use presentia::{
    Cluster, CoreConfig, DetailsStore, EventKind, Fetch, Listen, PersonalDetails, PresenceCore,
    PresenceEvent, Publish,
};

/// Fetcher double that records every fetch/unfetch it receives.
struct MockFetcher {
    scheme: &'static str,
    fetched: Mutex<Vec<String>>,
    unfetched: Mutex<Vec<String>>,
}

impl MockFetcher {
    fn new(scheme: &'static str) -> Arc<Self> {
        Arc::new(Self {
            scheme,
            fetched: Mutex::new(Vec::new()),
            unfetched: Mutex::new(Vec::new()),
        })
    }

    fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    fn unfetched(&self) -> Vec<String> {
        self.unfetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    fn name(&self) -> &str {
        self.scheme
    }

    fn is_supported_uri(&self, uri: &str) -> bool {
        uri.starts_with(self.scheme)
    }

    async fn fetch(&self, uri: &str) {
        self.fetched.lock().unwrap().push(uri.to_string());
    }

    async fn unfetch(&self, uri: &str) {
        self.unfetched.lock().unwrap().push(uri.to_string());
    }
}

/// Publisher double that records every snapshot it receives.
struct MockPublisher {
    seen: Mutex<Vec<PersonalDetails>>,
}

impl MockPublisher {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<PersonalDetails> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publish for MockPublisher {
    fn name(&self) -> &str {
        "mock-publisher"
    }

    async fn publish(&self, details: &PersonalDetails) {
        self.seen.lock().unwrap().push(details.clone());
    }
}

struct NamedCluster(&'static str);

impl Cluster for NamedCluster {
    fn name(&self) -> &str {
        self.0
    }
}

fn core() -> Arc<PresenceCore> {
    PresenceCore::new(CoreConfig::default(), Vec::new(), None)
}

#[tokio::test]
async fn shared_interest_yields_single_backend_subscription() {
    let core = core();
    let sip = MockFetcher::new("sip:");
    core.add_fetcher(sip.clone()).await;

    // Two observers share interest; the backend sees exactly one fetch.
    core.fetch_presence("sip:alice@example.com").await;
    core.fetch_presence("sip:alice@example.com").await;
    assert_eq!(sip.fetched(), vec!["sip:alice@example.com"]);

    // First unfetch leaves the subscription active.
    core.unfetch_presence("sip:alice@example.com").await;
    assert!(sip.unfetched().is_empty());

    // Second unfetch tears it down.
    core.unfetch_presence("sip:alice@example.com").await;
    assert_eq!(sip.unfetched(), vec!["sip:alice@example.com"]);

    // Extra unfetch is a no-op; the count never goes negative.
    core.unfetch_presence("sip:alice@example.com").await;
    assert_eq!(sip.unfetched().len(), 1);
    assert_eq!(sip.fetched().len(), 1);
}

#[tokio::test]
async fn refetch_after_teardown_issues_a_fresh_backend_fetch() {
    let core = core();
    let sip = MockFetcher::new("sip:");
    core.add_fetcher(sip.clone()).await;

    core.fetch_presence("sip:bob@x.org").await;
    core.unfetch_presence("sip:bob@x.org").await;
    core.fetch_presence("sip:bob@x.org").await;

    // One backend call per 0→1 edge, one per 1→0 edge.
    assert_eq!(sip.fetched().len(), 2);
    assert_eq!(sip.unfetched().len(), 1);
}

#[tokio::test]
async fn registration_order_decides_the_owning_backend() {
    let core = core();
    let first = MockFetcher::new("sip:");
    let second = MockFetcher::new("sip:");
    core.add_fetcher(first.clone()).await;
    core.add_fetcher(second.clone()).await;

    assert!(core.is_supported_uri("sip:carol@x.org").await);
    core.fetch_presence("sip:carol@x.org").await;

    // First-match wins; the later registration never hears about the URI.
    assert_eq!(first.fetched(), vec!["sip:carol@x.org"]);
    assert!(second.fetched().is_empty());

    core.unfetch_presence("sip:carol@x.org").await;
    assert_eq!(first.unfetched(), vec!["sip:carol@x.org"]);
    assert!(second.unfetched().is_empty());
}

#[tokio::test]
async fn unsupported_uri_is_tracked_without_a_subscription() {
    let core = core();
    let sip = MockFetcher::new("sip:");
    core.add_fetcher(sip.clone()).await;

    assert!(!core.is_supported_uri("xmpp:dave@x.org").await);
    core.fetch_presence("xmpp:dave@x.org").await;
    assert!(sip.fetched().is_empty());

    // A fetcher registered later does not retroactively pick the URI up.
    let xmpp = MockFetcher::new("xmpp:");
    core.add_fetcher(xmpp.clone()).await;
    core.fetch_presence("xmpp:dave@x.org").await;
    assert!(xmpp.fetched().is_empty());

    // Teardown of an unresolved entry reaches no backend.
    core.unfetch_presence("xmpp:dave@x.org").await;
    core.unfetch_presence("xmpp:dave@x.org").await;
    assert!(xmpp.unfetched().is_empty());
    assert!(sip.unfetched().is_empty());
}

#[tokio::test]
async fn cached_values_are_queryable_only_while_tracked() {
    let core = core();
    let sip = MockFetcher::new("sip:");
    core.add_fetcher(sip.clone()).await;

    assert_eq!(core.reference_count("sip:alice@example.com").await, 0);
    assert_eq!(core.presence_of("sip:alice@example.com").await, None);

    core.fetch_presence("sip:alice@example.com").await;
    assert_eq!(core.reference_count("sip:alice@example.com").await, 1);
    assert_eq!(
        core.presence_of("sip:alice@example.com").await.as_deref(),
        Some("unknown")
    );

    core.on_presence_received("sip:alice@example.com", "Online")
        .await;
    core.on_note_received("sip:alice@example.com", "brb").await;
    assert_eq!(
        core.presence_of("sip:alice@example.com").await.as_deref(),
        Some("Online")
    );
    assert_eq!(
        core.note_of("sip:alice@example.com").await.as_deref(),
        Some("brb")
    );

    // Teardown discards the cached value with the entry.
    core.unfetch_presence("sip:alice@example.com").await;
    assert_eq!(core.reference_count("sip:alice@example.com").await, 0);
    assert_eq!(core.presence_of("sip:alice@example.com").await, None);
    assert_eq!(core.note_of("sip:alice@example.com").await, None);
}

#[tokio::test]
async fn duplicate_fetcher_registration_is_a_noop() {
    let core = core();
    let sip = MockFetcher::new("sip:");
    let a = core.add_fetcher(sip.clone()).await;
    let b = core.add_fetcher(sip.clone()).await;
    assert_eq!(a, b);

    core.fetch_presence("sip:erin@x.org").await;
    assert_eq!(sip.fetched().len(), 1);
}

#[tokio::test]
async fn removing_the_owning_backend_skips_the_final_unfetch() {
    let core = core();
    let sip = MockFetcher::new("sip:");
    let id = core.add_fetcher(sip.clone()).await;

    core.fetch_presence("sip:frank@x.org").await;
    core.remove_fetcher(id).await;

    // Entry still dies cleanly; the gone backend just never hears about it.
    core.unfetch_presence("sip:frank@x.org").await;
    assert!(sip.unfetched().is_empty());
}

#[tokio::test]
async fn straggler_events_are_ignored() {
    let core = core();
    let mut events = core.subscribe();

    // No live interest in this identifier: no ledger entry, no re-emission.
    core.on_presence_received("sip:ghost@x.org", "Online").await;
    core.on_note_received("sip:ghost@x.org", "boo").await;

    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn one_canonical_event_per_accepted_update() {
    let core = core();
    let sip = MockFetcher::new("sip:");
    core.add_fetcher(sip.clone()).await;

    // Two observers share the identifier.
    core.fetch_presence("sip:alice@example.com").await;
    core.fetch_presence("sip:alice@example.com").await;

    let mut events = core.subscribe();
    core.on_presence_received("sip:alice@example.com", "Online")
        .await;

    let ev = events.recv().await.unwrap();
    assert_eq!(ev.kind, EventKind::PresenceReceived);
    assert_eq!(ev.uri.as_deref(), Some("sip:alice@example.com"));
    assert_eq!(ev.payload.as_deref(), Some("Online"));

    // Exactly one, not one per observer.
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn note_updates_re_emit_canonical_note_events() {
    let core = core();
    let sip = MockFetcher::new("sip:");
    core.add_fetcher(sip.clone()).await;
    core.fetch_presence("sip:alice@example.com").await;

    let mut events = core.subscribe();
    core.on_note_received("sip:alice@example.com", "in a meeting")
        .await;

    let ev = events.recv().await.unwrap();
    assert_eq!(ev.kind, EventKind::NoteReceived);
    assert_eq!(ev.payload.as_deref(), Some("in a meeting"));
}

#[tokio::test]
async fn backend_sink_drives_the_full_pipeline() {
    struct CountingListener {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl Listen for CountingListener {
        async fn on_event(&self, event: &PresenceEvent) {
            if event.kind == EventKind::PresenceReceived {
                self.seen.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    let listener = Arc::new(CountingListener {
        seen: AtomicUsize::new(0),
    });
    let core = PresenceCore::new(CoreConfig::default(), vec![listener.clone()], None);
    let token = CancellationToken::new();
    core.spawn_listener(token.clone()).unwrap();

    let sip = MockFetcher::new("sip:");
    core.add_fetcher(sip.clone()).await;
    core.fetch_presence("sip:alice@example.com").await;

    let sink = core.backend_sink();
    sink.presence("sip:alice@example.com", "Online").unwrap();
    sink.presence("sip:alice@example.com", "Away").unwrap();

    // Give the listener loop and the fan-out worker a beat.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(listener.seen.load(Ordering::SeqCst), 2);

    token.cancel();
}

#[tokio::test]
async fn listener_loop_can_only_be_claimed_once() {
    let core = core();
    let token = CancellationToken::new();
    assert!(core.spawn_listener(token.clone()).is_ok());
    let err = core.spawn_listener(token.clone()).unwrap_err();
    assert_eq!(err.as_label(), "core_listener_claimed");
    token.cancel();
}

#[tokio::test]
async fn details_change_publishes_to_all_publishers_in_order() {
    let details = DetailsStore::new(PersonalDetails::new("Online", ""));
    let core = PresenceCore::new(CoreConfig::default(), Vec::new(), Some(details.subscribe()));
    let token = CancellationToken::new();
    core.spawn_listener(token.clone()).unwrap();

    let publisher = MockPublisher::new();
    core.add_publisher(publisher.clone()).await;

    details.set_presence("Away");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let seen = publisher.seen();
    assert!(
        seen.iter().any(|d| d.presence == "Away"),
        "publisher never saw the change: {seen:?}"
    );

    token.cancel();
}

#[tokio::test]
async fn removed_publisher_receives_no_further_snapshots() {
    let details = DetailsStore::new(PersonalDetails::new("Online", ""));
    let core = PresenceCore::new(CoreConfig::default(), Vec::new(), Some(details.subscribe()));
    let token = CancellationToken::new();
    core.spawn_listener(token.clone()).unwrap();

    let publisher = MockPublisher::new();
    let id = core.add_publisher(publisher.clone()).await;

    details.set_presence("Away");
    tokio::time::sleep(Duration::from_millis(100)).await;
    core.remove_publisher(id).await;
    let before = publisher.seen().len();

    details.set_note("gone fishing");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        publisher.seen().len(),
        before,
        "publisher was invoked after removal"
    );

    token.cancel();
}

#[tokio::test]
async fn direct_publish_without_details_record_is_a_noop() {
    let core = core();
    let publisher = MockPublisher::new();
    core.add_publisher(publisher.clone()).await;

    core.publish().await;
    assert!(publisher.seen().is_empty());
}

#[tokio::test]
async fn cluster_changes_emit_structural_events() {
    let core = core();
    let mut events = core.subscribe();

    let roster: Arc<dyn Cluster> = Arc::new(NamedCluster("roster"));
    core.add_cluster(roster.clone()).await;

    let ev = events.recv().await.unwrap();
    assert_eq!(ev.kind, EventKind::ClusterAdded);
    assert_eq!(ev.cluster.as_deref(), Some("roster"));

    // Duplicate add is silent.
    core.add_cluster(roster.clone()).await;
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    core.remove_cluster(&roster).await;
    let ev = events.recv().await.unwrap();
    assert_eq!(ev.kind, EventKind::ClusterRemoved);
    assert_eq!(ev.cluster.as_deref(), Some("roster"));
}

#[tokio::test]
async fn questions_reach_the_first_willing_handler() {
    use presentia::{FormField, FormRequest, HandleQuestion};

    struct Ui {
        asked: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HandleQuestion for Ui {
        async fn on_question(&self, request: &FormRequest) -> bool {
            self.asked.lock().unwrap().push(request.title.clone());
            true
        }
    }

    let core = core();
    let ui = Arc::new(Ui {
        asked: Mutex::new(Vec::new()),
    });
    core.questions().add_handler(ui.clone()).await;

    let request = FormRequest {
        title: "XCAP credentials".to_string(),
        instructions: "Enter the credentials for the XCAP server".to_string(),
        fields: vec![FormField::new("user", "Username")],
    };
    assert!(core.questions().submit(request).await);
    assert_eq!(ui.asked.lock().unwrap().as_slice(), ["XCAP credentials"]);
}

#[tokio::test]
async fn visit_clusters_stops_when_the_visitor_declines() {
    let core = core();
    core.add_cluster(Arc::new(NamedCluster("a"))).await;
    core.add_cluster(Arc::new(NamedCluster("b"))).await;
    core.add_cluster(Arc::new(NamedCluster("c"))).await;

    let mut names = Vec::new();
    core.visit_clusters(|c| {
        names.push(c.name().to_string());
        names.len() < 2
    })
    .await;
    assert_eq!(names, vec!["a", "b"]);
}
