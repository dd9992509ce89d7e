//! # Simple logging listener for debugging and demos.
//!
//! [`LogWriter`] prints canonical events to stdout in a human-readable
//! format. This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [presence] uri=sip:alice@example.com value=Online
//! [note] uri=sip:alice@example.com text="out for lunch"
//! [cluster-added] name=roster
//! [cluster-removed] name=roster
//! [listener-overflow] listener=metrics reason=full
//! ```

use async_trait::async_trait;

use crate::events::{EventKind, PresenceEvent};
use crate::listeners::Listen;

/// Simple stdout logging listener.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use - implement a custom [`Listen`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Listen for LogWriter {
    async fn on_event(&self, e: &PresenceEvent) {
        match e.kind {
            EventKind::PresenceReceived => {
                if let (Some(uri), Some(value)) = (&e.uri, &e.payload) {
                    println!("[presence] uri={uri} value={value}");
                }
            }
            EventKind::NoteReceived => {
                if let (Some(uri), Some(text)) = (&e.uri, &e.payload) {
                    println!("[note] uri={uri} text={text:?}");
                }
            }
            EventKind::ClusterAdded => {
                println!("[cluster-added] name={:?}", e.cluster);
            }
            EventKind::ClusterRemoved => {
                println!("[cluster-removed] name={:?}", e.cluster);
            }
            EventKind::ListenerOverflow => {
                println!(
                    "[listener-overflow] listener={:?} reason={:?}",
                    e.cluster, e.payload
                );
            }
            EventKind::ListenerPanicked => {
                println!(
                    "[listener-panicked] listener={:?} info={:?}",
                    e.cluster, e.payload
                );
            }
        }
    }

    fn name(&self) -> &str {
        "log_writer"
    }
}
