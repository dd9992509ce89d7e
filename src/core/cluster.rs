//! # Observer cluster handles.
//!
//! A cluster is an externally managed group of observers (a roster, an
//! address book view). The engine only enumerates clusters and announces
//! membership changes as structural events; it never looks inside one.

use std::sync::Arc;

/// Contract for observer groups registered with the engine.
pub trait Cluster: Send + Sync + 'static {
    /// Returns a stable, human-readable cluster name.
    fn name(&self) -> &str;
}

/// Shared handle to a cluster.
pub type ClusterRef = Arc<dyn Cluster>;
