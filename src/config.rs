//! # Engine configuration.
//!
//! Provides [`CoreConfig`], the settings shared by the whole engine instance.
//!
//! ## Sentinel values
//! - `bus_capacity` is clamped to a minimum of 1 by the [`Bus`](crate::events::Bus).

/// Configuration for a [`PresenceCore`](crate::PresenceCore) instance.
///
/// All fields are public for flexibility; prefer the accessors where a
/// sentinel check applies.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    /// Capacity of the canonical event bus ring buffer.
    ///
    /// Slow bus receivers that lag behind more than `bus_capacity` events
    /// will observe `RecvError::Lagged` and skip older items. Minimum value
    /// is 1 (enforced by the bus).
    pub bus_capacity: usize,
}

impl CoreConfig {
    /// Returns the bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for CoreConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024` (good baseline for chatty backends)
    fn default() -> Self {
        Self { bus_capacity: 1024 }
    }
}
