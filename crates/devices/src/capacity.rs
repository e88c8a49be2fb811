//! Cache capacity tiers.
//!
//! Capacities are configurable within clamped bounds and resolved once at
//! startup into an explicit table that cache instances share by reference;
//! there is no ambient global.

/// Number of cache tiers, including the creative tier 0.
pub const CACHE_TIERS: usize = 5;

/// Default per-tier capacities. Tier 0 is the creative (effectively
/// unbounded) tier and is not configurable.
pub const DEFAULT_CAPACITY: [u32; CACHE_TIERS] = [u32::MAX, 10_000, 40_000, 160_000, 640_000];

/// Upper bound for any configured capacity.
pub const ABSOLUTE_CEILING: u32 = 1_000_000_000;

/// Resolved capacity per cache tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityTable {
    capacities: [u32; CACHE_TIERS],
}

impl CapacityTable {
    /// Clamp requested capacities into a consistent ascending table.
    ///
    /// Resolution runs from the highest tier downward: each tier's upper
    /// bound is the already-resolved capacity of the tier above it, so the
    /// table stays monotonic whatever the configuration asks for.
    pub fn resolve(requested: [u32; CACHE_TIERS]) -> Self {
        let mut capacities = DEFAULT_CAPACITY;
        let top = CACHE_TIERS - 1;
        capacities[top] = requested[top].clamp(DEFAULT_CAPACITY[top] / 8, ABSOLUTE_CEILING);
        for tier in (1..top).rev() {
            capacities[tier] =
                requested[tier].clamp(DEFAULT_CAPACITY[tier] / 8, capacities[tier + 1]);
        }
        Self { capacities }
    }

    /// Capacity for a tier; out-of-range tiers resolve to the top tier.
    pub fn capacity(&self, tier: u8) -> u32 {
        self.capacities[(tier as usize).min(CACHE_TIERS - 1)]
    }
}

impl Default for CapacityTable {
    fn default() -> Self {
        Self::resolve(DEFAULT_CAPACITY)
    }
}
