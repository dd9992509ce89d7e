//! # Presence publisher contract.
//!
//! [`Publish`] is the outbound counterpart of [`Fetch`](crate::Fetch): a
//! backend implements it to push the local user's own details to an external
//! directory. The engine calls every registered publisher, in registration
//! order, whenever the personal details record changes.
//!
//! ## Contract
//! - `publish` is fire-and-forget from the engine's point of view. Failures
//!   are the publisher's concern: log, retry, or drop, but never propagate.
//!   A failing publisher must not prevent the remaining publishers from
//!   being called, which the infallible signature enforces by construction.

use std::sync::Arc;

use async_trait::async_trait;

use crate::details::PersonalDetails;

/// Opaque registration token for a publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublisherId(pub(crate) u64);

/// Shared handle to a publisher backend.
pub type PublisherRef = Arc<dyn Publish>;

/// Contract for backends publishing the local user's details outward.
#[async_trait]
pub trait Publish: Send + Sync + 'static {
    /// Returns a stable, human-readable backend name (for logs).
    fn name(&self) -> &str;

    /// Pushes the given snapshot to the external directory.
    async fn publish(&self, details: &PersonalDetails);
}
