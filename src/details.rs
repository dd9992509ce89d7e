//! # Personal details record.
//!
//! [`PersonalDetails`] is the local user's own presence/note snapshot. The
//! record is owned **outside** the engine by a [`DetailsStore`]; the engine
//! holds only a read-side `watch::Receiver` taken at construction and reacts
//! to changes by calling every registered publisher.
//!
//! ```text
//! DetailsStore::set_presence("Away")
//!        │ watch::Sender
//!        ▼
//! engine listener loop ──► PresenceCore::publish() ──► Publish::publish(&snapshot)
//! ```
//!
//! An engine constructed without a details receiver simply never publishes;
//! absence of the record is tolerated, not an error.

use tokio::sync::watch;

/// Snapshot of the local user's own presence state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonalDetails {
    /// The user's chosen presence value.
    pub presence: String,
    /// The user's free-form status note.
    pub note: String,
}

impl PersonalDetails {
    /// Creates a snapshot from the given presence and note.
    pub fn new(presence: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            presence: presence.into(),
            note: note.into(),
        }
    }
}

/// Owner-side handle for the local user's details.
///
/// Every mutation notifies all subscribed receivers (the engine among them).
#[derive(Debug)]
pub struct DetailsStore {
    tx: watch::Sender<PersonalDetails>,
}

impl DetailsStore {
    /// Creates a store with the given initial snapshot.
    pub fn new(initial: PersonalDetails) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Returns a read-only receiver observing every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<PersonalDetails> {
        self.tx.subscribe()
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> PersonalDetails {
        self.tx.borrow().clone()
    }

    /// Replaces the whole snapshot.
    pub fn set(&self, details: PersonalDetails) {
        let _ = self.tx.send(details);
    }

    /// Updates only the presence value.
    pub fn set_presence(&self, presence: impl Into<String>) {
        let presence = presence.into();
        self.tx.send_modify(|d| d.presence = presence);
    }

    /// Updates only the status note.
    pub fn set_note(&self, note: impl Into<String>) {
        let note = note.into();
        self.tx.send_modify(|d| d.note = note);
    }
}

impl Default for DetailsStore {
    fn default() -> Self {
        Self::new(PersonalDetails::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_observe_changes() {
        let store = DetailsStore::new(PersonalDetails::new("Online", ""));
        let mut rx = store.subscribe();

        store.set_presence("Away");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().presence, "Away");

        store.set_note("out for lunch");
        rx.changed().await.unwrap();
        let snap = rx.borrow().clone();
        assert_eq!(snap.presence, "Away");
        assert_eq!(snap.note, "out for lunch");
    }

    #[test]
    fn snapshot_reflects_latest_set() {
        let store = DetailsStore::default();
        store.set(PersonalDetails::new("DND", "focus"));
        assert_eq!(store.snapshot(), PersonalDetails::new("DND", "focus"));
    }
}
