//! Engine core: subscription ledger and aggregation.
//!
//! The only public API from this module is [`PresenceCore`], which owns the
//! ledger, the registered backends, and the cluster registry.
//!
//! Internal modules:
//! - [`ledger`]: per-identifier reference counts and last-known values;
//! - [`engine`]: routes fetch/unfetch, accepts backend updates, re-emits
//!   canonical events, publishes personal details;
//! - [`cluster`]: observer group handles, enumeration only.

mod cluster;
mod engine;
mod ledger;

pub use cluster::{Cluster, ClusterRef};
pub use engine::PresenceCore;
