//! # Subscription ledger - per-identifier reference counting.
//!
//! The ledger is the engine's central data structure: one entry per
//! identifier with live interest, holding the reference count, the last
//! known presence value and status note, and the backend that owns the
//! subscription.
//!
//! ## Rules
//! - An entry exists iff its count is positive; the `1→0` edge removes it
//!   immediately, so a later re-fetch starts clean at `"unknown"` / `""`.
//! - The count never goes negative: releasing an untracked identifier is
//!   reported as [`Release::Untracked`] and changes nothing.
//! - Updates for identifiers without a live entry are rejected (`false`),
//!   which is how the engine drops late straggler events.
//!
//! ## Entry state machine
//! ```text
//! ABSENT ──acquire──► count=1 ──acquire──► count=n
//!    ▲                   │                    │
//!    └──────release──────┘   (release×(n-1))──┘
//! ```

use std::collections::HashMap;

use crate::backends::FetcherId;

/// Sentinel presence value meaning "no data yet".
pub(crate) const PRESENCE_UNKNOWN: &str = "unknown";

/// Per-identifier state while at least one observer is interested.
#[derive(Debug)]
struct UriEntry {
    /// Fetch calls not yet matched by unfetch. Always positive while the
    /// entry exists.
    count: u32,
    /// Last known presence value.
    presence: String,
    /// Last known status note.
    note: String,
    /// Backend that received the fetch, if any claimed the identifier.
    backend: Option<FetcherId>,
}

impl UriEntry {
    fn new() -> Self {
        Self {
            count: 1,
            presence: PRESENCE_UNKNOWN.to_string(),
            note: String::new(),
            backend: None,
        }
    }
}

/// Outcome of acquiring interest in an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Acquire {
    /// First interest; the caller must resolve a backend and issue the fetch.
    First,
    /// Interest was already live; `count` is the new total.
    Shared(u32),
}

/// Outcome of releasing interest in an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Release {
    /// Last interest left; the entry is gone and the caller must unfetch
    /// from the owning backend, if one was resolved.
    Last { backend: Option<FetcherId> },
    /// Interest remains; `count` is the new total.
    Shared(u32),
    /// No entry existed; nothing changed.
    Untracked,
}

/// Reference-counted record of interest per identifier.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    entries: HashMap<String, UriEntry>,
}

impl Ledger {
    /// Registers one more interest in `uri`, creating the entry on first use.
    pub(crate) fn acquire(&mut self, uri: &str) -> Acquire {
        match self.entries.get_mut(uri) {
            Some(entry) => {
                entry.count += 1;
                Acquire::Shared(entry.count)
            }
            None => {
                self.entries.insert(uri.to_string(), UriEntry::new());
                Acquire::First
            }
        }
    }

    /// Releases one interest in `uri`, discarding the entry at zero.
    pub(crate) fn release(&mut self, uri: &str) -> Release {
        let Some(entry) = self.entries.get_mut(uri) else {
            return Release::Untracked;
        };
        if entry.count > 1 {
            entry.count -= 1;
            return Release::Shared(entry.count);
        }
        // Cached value is discarded with the entry; the next acquire starts
        // from "unknown"/"".
        let backend = self.entries.remove(uri).and_then(|e| e.backend);
        Release::Last { backend }
    }

    /// Records which backend received the fetch for `uri`.
    ///
    /// No-op when the entry died between resolution and binding.
    pub(crate) fn bind_backend(&mut self, uri: &str, backend: FetcherId) {
        if let Some(entry) = self.entries.get_mut(uri) {
            entry.backend = Some(backend);
        }
    }

    /// Stores a new presence value; `false` when no live entry exists.
    pub(crate) fn set_presence(&mut self, uri: &str, value: &str) -> bool {
        match self.entries.get_mut(uri) {
            Some(entry) => {
                entry.presence = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Stores a new status note; `false` when no live entry exists.
    pub(crate) fn set_note(&mut self, uri: &str, text: &str) -> bool {
        match self.entries.get_mut(uri) {
            Some(entry) => {
                entry.note = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Last known presence value for a live identifier.
    pub(crate) fn presence_of(&self, uri: &str) -> Option<&str> {
        self.entries.get(uri).map(|e| e.presence.as_str())
    }

    /// Last known status note for a live identifier.
    pub(crate) fn note_of(&self, uri: &str) -> Option<&str> {
        self.entries.get(uri).map(|e| e.note.as_str())
    }

    /// Current reference count, 0 when untracked.
    pub(crate) fn count_of(&self, uri: &str) -> u32 {
        self.entries.get(uri).map_or(0, |e| e.count)
    }

    /// Number of identifiers with live interest.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_acquire_creates_entry_with_defaults() {
        let mut ledger = Ledger::default();
        assert_eq!(ledger.acquire("sip:alice@example.com"), Acquire::First);
        assert_eq!(ledger.count_of("sip:alice@example.com"), 1);
        assert_eq!(
            ledger.presence_of("sip:alice@example.com"),
            Some(PRESENCE_UNKNOWN)
        );
        assert_eq!(ledger.note_of("sip:alice@example.com"), Some(""));
    }

    #[test]
    fn shared_interest_counts_up_and_down() {
        let mut ledger = Ledger::default();
        assert_eq!(ledger.acquire("u"), Acquire::First);
        assert_eq!(ledger.acquire("u"), Acquire::Shared(2));
        assert_eq!(ledger.acquire("u"), Acquire::Shared(3));

        assert_eq!(ledger.release("u"), Release::Shared(2));
        assert_eq!(ledger.release("u"), Release::Shared(1));
        assert!(matches!(ledger.release("u"), Release::Last { .. }));
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn release_of_untracked_uri_is_a_noop() {
        let mut ledger = Ledger::default();
        assert_eq!(ledger.release("nobody"), Release::Untracked);
        // And the count can never go negative through repeated releases.
        ledger.acquire("u");
        assert!(matches!(ledger.release("u"), Release::Last { .. }));
        assert_eq!(ledger.release("u"), Release::Untracked);
        assert_eq!(ledger.count_of("u"), 0);
    }

    #[test]
    fn last_release_reports_bound_backend() {
        let mut ledger = Ledger::default();
        ledger.acquire("u");
        ledger.bind_backend("u", FetcherId(7));
        match ledger.release("u") {
            Release::Last { backend } => assert_eq!(backend, Some(FetcherId(7))),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn values_do_not_leak_across_lifecycles() {
        let mut ledger = Ledger::default();
        ledger.acquire("u");
        assert!(ledger.set_presence("u", "Online"));
        assert!(ledger.set_note("u", "brb"));
        ledger.release("u");

        // Fresh lifecycle starts from scratch.
        ledger.acquire("u");
        assert_eq!(ledger.presence_of("u"), Some(PRESENCE_UNKNOWN));
        assert_eq!(ledger.note_of("u"), Some(""));
    }

    #[test]
    fn updates_for_untracked_uris_are_rejected() {
        let mut ledger = Ledger::default();
        assert!(!ledger.set_presence("ghost", "Online"));
        assert!(!ledger.set_note("ghost", "boo"));
        assert_eq!(ledger.len(), 0);
    }
}
