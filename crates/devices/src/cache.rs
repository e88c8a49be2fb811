//! Deep storage cache: one item kind at arbitrary quantity behind two slots.
//!
//! The cache owns a single logical kind+count pair bounded by its tier
//! capacity and presents it through two physical slots so slot-based
//! collaborators can interact with it: slot 1 always mirrors up to one
//! native stack for extraction, slot 0 absorbs the overflow beyond what the
//! main count may represent. All mutation funnels through methods that
//! rebalance the slots and recompute the change trackers, so no caller can
//! leave the two views out of sync.
//!
//! Tick dispatch is single-threaded; remainder math intentionally uses the
//! pre-insertion count without re-reading.

use crate::capacity::CapacityTable;
use crate::change::ChangeSet;
use crate::inventory::ItemHandler;
use blockvault_core::{Direction, Facing, ItemKind, ItemStack};
use serde::{Deserialize, Serialize};

/// Physical slot accepting insertion (and holding balanced overflow).
pub const SLOT_INPUT: usize = 0;
/// Physical slot permitting extraction (holds up to one native stack).
pub const SLOT_OUTPUT: usize = 1;

/// A tiered deep storage cache.
#[derive(Debug, Clone)]
pub struct DeepCache {
    tier: u8,
    capacity: u32,
    facing: Facing,
    locked: bool,
    /// Main portion of the stored quantity; the two slots hold the rest.
    stored: Option<ItemStack>,
    slots: [Option<ItemStack>; 2],
    compare_tracker: u8,
    meter_tracker: u8,
    changes: ChangeSet,
}

impl DeepCache {
    /// Create an empty cache of the given tier.
    pub fn new(tier: u8, table: &CapacityTable) -> Self {
        Self {
            tier,
            capacity: table.capacity(tier),
            facing: Facing::DEFAULT,
            locked: false,
            stored: None,
            slots: [None, None],
            compare_tracker: 0,
            meter_tracker: 0,
            changes: ChangeSet::empty(),
        }
    }

    /// Capacity tier.
    pub fn tier(&self) -> u8 {
        self.tier
    }

    /// Total quantity this cache can hold.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Current facing.
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Whether the kind binding survives emptying.
    pub fn locked(&self) -> bool {
        self.locked
    }

    /// The kind this cache is bound to, if any. A locked cache stays bound
    /// at count zero until explicitly cleared.
    pub fn bound_kind(&self) -> Option<ItemKind> {
        self.stored.as_ref().map(|stack| stack.kind)
    }

    /// Logical stored quantity: main portion plus both physical slots.
    pub fn stored_count(&self) -> u32 {
        let Some(stored) = self.stored.as_ref() else {
            return 0;
        };
        self.slots
            .iter()
            .flatten()
            .fold(stored.count, |total, slot| {
                total.saturating_add(slot.count)
            })
    }

    /// The stored contents as a single logical stack, `None` when empty.
    pub fn stored_item(&self) -> Option<ItemStack> {
        let stored = self.stored.as_ref()?;
        stored.with_count(self.stored_count()).nonzero()
    }

    /// Read a physical slot.
    pub fn slot(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(|slot| slot.as_ref())
    }

    /// Comparator-style signal derived from the fill level, 0..=15.
    pub fn comparator_value(&self) -> u8 {
        self.compare_tracker
    }

    /// Display meter level derived from the fill level, 0..=8.
    pub fn meter_level(&self) -> u8 {
        self.meter_tracker
    }

    /// Drain the side effects accumulated since the last call.
    pub fn take_changes(&mut self) -> ChangeSet {
        std::mem::take(&mut self.changes)
    }

    /// Slots reachable from any side.
    pub const fn accessible_slots() -> [usize; 2] {
        [SLOT_INPUT, SLOT_OUTPUT]
    }

    /// Only slot 0 accepts insertion, and only of the bound kind.
    pub fn can_insert(&self, slot: usize, stack: &ItemStack) -> bool {
        slot == SLOT_INPUT
            && self
                .stored
                .as_ref()
                .map_or(true, |bound| bound.matches(stack))
    }

    /// Only slot 1 permits extraction.
    pub fn can_extract(&self, slot: usize) -> bool {
        slot == SLOT_OUTPUT
    }

    /// Redistribute the logical total across the two physical slots.
    ///
    /// Expects `stored` to carry the full logical count on entry. Slot 1
    /// receives up to one native stack; whatever the main count may not
    /// represent beyond `capacity - 2 * native` spills into slot 0.
    fn balance_stacks(&mut self) {
        let Some(stored) = self.stored.as_mut() else {
            self.slots = [None, None];
            return;
        };
        let native_max = stored.max_stack_size();
        let max_main = self.capacity.saturating_sub(native_max * 2);

        self.slots[SLOT_INPUT] = None;
        let visible = stored.count.min(native_max);
        self.slots[SLOT_OUTPUT] = stored.with_count(visible).nonzero();
        stored.count -= visible;

        if stored.count > max_main {
            self.slots[SLOT_INPUT] = Some(stored.with_count(stored.count - max_main));
            stored.count = max_main;
        }
    }

    /// Empty the cache, keeping the kind binding when locked.
    fn clear_inventory(&mut self) {
        if self.locked {
            if let Some(stored) = self.stored.as_mut() {
                stored.count = 0;
            }
        } else {
            self.stored = None;
            self.changes |= ChangeSet::SYNC;
        }
        self.slots = [None, None];
    }

    fn scaled_stored(&self, scale: u8) -> u8 {
        let scaled = self.stored_count() as u64 * scale as u64 / self.capacity.max(1) as u64;
        scaled.min(scale as u64) as u8
    }

    /// Recompute the comparator and meter trackers, recording a
    /// neighbor-notify or client-sync change only when the respective value
    /// moved. The two thresholds are decoupled on purpose.
    fn update_trackers(&mut self) {
        let compare = self.scaled_stored(15);
        if compare != self.compare_tracker {
            self.compare_tracker = compare;
            self.changes |= ChangeSet::NEIGHBOR;
        }

        let meter = self.scaled_stored(9).min(8);
        if meter != self.meter_tracker {
            self.meter_tracker = meter;
            self.changes |= ChangeSet::SYNC;
        }
    }

    /// Overwrite the logical count, keeping the bound kind. No-op on an
    /// unbound cache.
    pub fn set_stored_count(&mut self, amount: u32) {
        if self.stored.is_none() {
            return;
        }
        let amount = amount.min(self.capacity);
        if let Some(stored) = self.stored.as_mut() {
            stored.count = amount;
        }
        if amount > 0 {
            self.balance_stacks();
        } else {
            self.clear_inventory();
        }
        self.update_trackers();
        self.changes |= ChangeSet::DIRTY;
    }

    /// Replace the stored contents outright (network-apply path).
    pub fn set_stored_item(&mut self, stack: Option<ItemStack>) {
        match stack.and_then(ItemStack::nonzero) {
            Some(stack) => {
                self.stored = Some(stack.with_count(stack.count.min(self.capacity)));
                self.balance_stacks();
            }
            None => self.clear_inventory(),
        }
        self.update_trackers();
        self.changes |= ChangeSet::SYNC | ChangeSet::DIRTY;
    }

    /// Insert a stack, returning the unaccepted remainder.
    ///
    /// An empty cache binds to the incoming kind; a bound cache accepts only
    /// matching kinds, partially when the capacity would overflow. The
    /// remainder is computed from the pre-insertion count in both modes.
    pub fn insert(&mut self, stack: ItemStack, simulate: bool) -> Option<ItemStack> {
        let stack = stack.nonzero()?;

        let Some(bound) = self.stored.as_ref() else {
            let accepted = stack.count.min(self.capacity);
            let remainder = stack.with_count(stack.count - accepted).nonzero();
            if !simulate {
                self.set_stored_item(Some(stack.with_count(accepted)));
            }
            return remainder;
        };

        if !stack.matches(bound) {
            return Some(stack);
        }

        let held = self.stored_count();
        let space = self.capacity.saturating_sub(held);
        if space == 0 {
            return Some(stack);
        }
        if stack.count > space {
            let remainder = stack.with_count(stack.count - space);
            if !simulate {
                self.set_stored_count(self.capacity);
            }
            return Some(remainder);
        }
        if !simulate {
            self.set_stored_count(held + stack.count);
        }
        None
    }

    /// Extract up to one native stack, `None` when empty.
    pub fn extract(&mut self, max_extract: u32, simulate: bool) -> Option<ItemStack> {
        let stored = self.stored.as_ref()?;
        let native_max = stored.max_stack_size();
        let taken = self.stored_count().min(max_extract).min(native_max);
        let out = stored.with_count(taken).nonzero()?;
        if !simulate {
            let remaining = self.stored_count() - out.count;
            self.set_stored_count(remaining);
        }
        Some(out)
    }

    /// External slot write: the single funnel for collaborators that talk to
    /// the cache through the raw slot protocol.
    ///
    /// A write to slot 0 is the insertion path (binding the kind when
    /// empty); any other write is the extraction path. Both fold the slot
    /// counts back into the logical total and rebalance.
    pub fn set_slot(&mut self, slot: usize, value: Option<ItemStack>) {
        if slot >= self.slots.len() {
            return;
        }
        self.slots[slot] = value.and_then(ItemStack::nonzero);

        let was_empty = self.stored.is_none();

        if slot == SLOT_INPUT {
            if self.slots[SLOT_INPUT].is_none() {
                return;
            }
            if self.stored.is_none() {
                self.stored = self.slots[SLOT_INPUT].take();
            } else {
                self.fold_slots_into_stored();
            }
            self.balance_stacks();
        } else {
            if self.stored.is_none() {
                return;
            }
            self.fold_slots_into_stored();
            let total = self.stored.as_ref().map_or(0, |stored| stored.count);
            if total > 0 {
                self.balance_stacks();
            } else {
                self.clear_inventory();
            }
        }

        self.update_trackers();
        if was_empty != self.stored.is_none() {
            self.changes |= ChangeSet::SYNC;
        }
        self.changes |= ChangeSet::DIRTY;
    }

    /// Add both slot counts onto the main count; `balance_stacks` rebuilds
    /// the slots from scratch afterwards.
    fn fold_slots_into_stored(&mut self) {
        let extra: u32 = self
            .slots
            .iter()
            .flatten()
            .fold(0u32, |total, slot| total.saturating_add(slot.count));
        if let Some(stored) = self.stored.as_mut() {
            stored.count = stored.count.saturating_add(extra);
        }
    }

    /// Flip the lock. Unlocking an empty cache releases the kind binding.
    pub fn toggle_lock(&mut self) -> bool {
        self.locked = !self.locked;
        if self.stored_count() == 0 && !self.locked {
            self.clear_inventory();
        }
        self.changes |= ChangeSet::SYNC | ChangeSet::DIRTY;
        self.locked
    }

    /// Rotate one step through the four horizontal facings.
    pub fn rotate(&mut self) -> bool {
        self.facing = self.facing.rotate_left();
        self.changes |= ChangeSet::SYNC | ChangeSet::DIRTY;
        true
    }

    /// Set the facing; vertical directions are rejected.
    pub fn set_facing(&mut self, direction: Direction) -> bool {
        let Ok(facing) = Facing::new(direction) else {
            return false;
        };
        self.facing = facing;
        self.changes |= ChangeSet::SYNC | ChangeSet::DIRTY;
        true
    }

    /// Apply a full-tile sync from the wire (client side): replaces facing,
    /// lock and contents, then rebuilds the slot views.
    pub fn apply_sync(&mut self, facing: Facing, locked: bool, stored: Option<ItemStack>) {
        self.facing = facing;
        self.locked = locked;
        match stored.and_then(ItemStack::nonzero) {
            Some(stack) => {
                self.stored = Some(stack);
                self.slots = [None, None];
                self.balance_stacks();
            }
            None => {
                self.stored = None;
                self.slots = [None, None];
            }
        }
        self.update_trackers();
    }

    /// Capture persistent state.
    pub fn to_record(&self) -> CacheRecord {
        CacheRecord {
            tier: self.tier,
            facing: self.facing,
            locked: self.locked,
            stored: self
                .stored
                .as_ref()
                .map(|stored| stored.with_count(self.stored_count())),
        }
    }

    /// Rebuild a cache from persistent state. Malformed fields fall back to
    /// safe values: an unknown tier resolves to the top tier, a zero-count
    /// record on an unlocked cache means empty, counts clamp to capacity.
    pub fn from_record(record: CacheRecord, table: &CapacityTable) -> Self {
        let mut cache = DeepCache::new(record.tier, table);
        cache.facing = record.facing;
        cache.locked = record.locked;

        let stored = record
            .stored
            .filter(|stack| stack.count > 0 || record.locked);
        if let Some(stack) = stored {
            cache.stored = Some(stack.with_count(stack.count.min(cache.capacity)));
            cache.balance_stacks();
        }

        cache.update_trackers();
        cache.changes = ChangeSet::empty();
        cache
    }
}

impl ItemHandler for DeepCache {
    fn insert_item(&mut self, stack: ItemStack, simulate: bool) -> Option<ItemStack> {
        self.insert(stack, simulate)
    }

    fn extract_item(&mut self, max_count: u32, simulate: bool) -> Option<ItemStack> {
        self.extract(max_count, simulate)
    }
}

/// Persisted cache state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Capacity tier.
    pub tier: u8,
    /// Block facing.
    #[serde(default)]
    pub facing: Facing,
    /// Lock flag.
    #[serde(default)]
    pub locked: bool,
    /// Logical stored contents; a zero count is only meaningful together
    /// with `locked`.
    #[serde(default)]
    pub stored: Option<ItemStack>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const STONE: ItemKind = ItemKind::Block(1);
    const DIRT: ItemKind = ItemKind::Block(2);
    const PEARL: ItemKind = ItemKind::Bundle(7);

    fn tier2() -> DeepCache {
        DeepCache::new(2, &CapacityTable::default())
    }

    fn logical_total(cache: &DeepCache) -> u32 {
        cache.stored_count()
    }

    #[test]
    fn empty_cache_binds_and_balances() {
        let mut cache = tier2();
        assert_eq!(cache.capacity(), 40_000);

        let remainder = cache.insert(ItemStack::new(STONE, 500), false);
        assert!(remainder.is_none());
        assert_eq!(cache.stored_count(), 500);
        assert_eq!(cache.bound_kind(), Some(STONE));
        // A single native stack is always visible for extraction.
        assert_eq!(cache.slot(SLOT_OUTPUT).map(|s| s.count), Some(64));
        assert!(cache.slot(SLOT_INPUT).is_none());
    }

    #[test]
    fn oversized_insert_into_empty_cache_returns_remainder() {
        let mut cache = tier2();
        let remainder = cache.insert(ItemStack::new(STONE, 50_000), false);

        assert_eq!(remainder.map(|s| s.count), Some(10_000));
        assert_eq!(cache.stored_count(), 40_000);

        // Balanced views: output holds one native stack, overflow holds what
        // the main count may not represent.
        let max_main = 40_000 - 2 * 64;
        assert_eq!(cache.slot(SLOT_OUTPUT).map(|s| s.count), Some(64));
        assert_eq!(
            cache.slot(SLOT_INPUT).map(|s| s.count),
            Some(40_000 - 64 - max_main)
        );
    }

    #[test]
    fn kind_mismatch_rejects_whole_stack() {
        let mut cache = tier2();
        cache.insert(ItemStack::new(STONE, 10), false);

        let rejected = cache.insert(ItemStack::new(DIRT, 10), false);
        assert_eq!(rejected, Some(ItemStack::new(DIRT, 10)));
        assert_eq!(cache.stored_count(), 10);
    }

    #[test]
    fn full_cache_rejects_whole_stack() {
        let mut cache = tier2();
        cache.insert(ItemStack::new(STONE, 40_000), false);

        let rejected = cache.insert(ItemStack::new(STONE, 1), false);
        assert_eq!(rejected.map(|s| s.count), Some(1));
    }

    #[test]
    fn simulate_insert_reports_without_mutating() {
        let mut cache = tier2();
        cache.insert(ItemStack::new(STONE, 39_990), false);

        let remainder = cache.insert(ItemStack::new(STONE, 100), true);
        assert_eq!(remainder.map(|s| s.count), Some(90));
        assert_eq!(cache.stored_count(), 39_990);
    }

    #[test]
    fn insertion_conserves_items() {
        let mut cache = tier2();
        for incoming in [1u32, 63, 64, 65, 5_000, 39_999, 40_000, 50_000] {
            let mut cache = cache.clone();
            let before = logical_total(&cache);
            let remainder = cache
                .insert(ItemStack::new(STONE, incoming), false)
                .map_or(0, |s| s.count);
            let accepted = logical_total(&cache) - before;
            assert_eq!(accepted + remainder, incoming);
        }
        // Same conservation from a part-filled cache.
        cache.insert(ItemStack::new(STONE, 35_000), false);
        let remainder = cache
            .insert(ItemStack::new(STONE, 10_000), false)
            .map_or(0, |s| s.count);
        assert_eq!(logical_total(&cache) - 35_000 + remainder, 10_000);
    }

    #[test]
    fn extract_is_bounded_by_native_stack() {
        let mut cache = tier2();
        cache.insert(ItemStack::new(STONE, 1_000), false);

        let out = cache.extract(999, false).unwrap();
        assert_eq!(out.count, 64);
        assert_eq!(cache.stored_count(), 936);

        let out = cache.extract(10, false).unwrap();
        assert_eq!(out.count, 10);
        assert_eq!(cache.stored_count(), 926);

        assert!(cache.extract(0, false).is_none());
    }

    #[test]
    fn extract_from_empty_returns_none() {
        let mut cache = tier2();
        assert!(cache.extract(64, false).is_none());
    }

    #[test]
    fn simulate_extract_does_not_mutate() {
        let mut cache = tier2();
        cache.insert(ItemStack::new(STONE, 100), false);
        let out = cache.extract(64, true).unwrap();
        assert_eq!(out.count, 64);
        assert_eq!(cache.stored_count(), 100);
    }

    #[test]
    fn small_stack_kinds_balance_on_their_own_limit() {
        let mut cache = tier2();
        cache.insert(ItemStack::new(PEARL, 100), false);
        assert_eq!(cache.slot(SLOT_OUTPUT).map(|s| s.count), Some(16));
        let out = cache.extract(64, false).unwrap();
        assert_eq!(out.count, 16);
    }

    #[test]
    fn lock_keeps_kind_bound_through_empty() {
        let mut cache = tier2();
        cache.insert(ItemStack::new(STONE, 64), false);
        cache.toggle_lock();

        let out = cache.extract(64, false).unwrap();
        assert_eq!(out.count, 64);
        assert_eq!(cache.stored_count(), 0);
        assert_eq!(cache.bound_kind(), Some(STONE));
        assert!(cache.stored_item().is_none());

        // Other kinds are still rejected while the binding holds.
        let rejected = cache.insert(ItemStack::new(DIRT, 5), false);
        assert_eq!(rejected.map(|s| s.count), Some(5));
        // The bound kind is accepted again.
        assert!(cache.insert(ItemStack::new(STONE, 5), false).is_none());
    }

    #[test]
    fn unlocking_empty_cache_releases_binding() {
        let mut cache = tier2();
        cache.insert(ItemStack::new(STONE, 10), false);
        cache.toggle_lock();
        cache.extract(64, false);
        assert_eq!(cache.bound_kind(), Some(STONE));

        cache.toggle_lock();
        assert_eq!(cache.bound_kind(), None);
        assert!(cache.insert(ItemStack::new(DIRT, 5), false).is_none());
    }

    #[test]
    fn emptying_unlocked_cache_clears_binding() {
        let mut cache = tier2();
        cache.insert(ItemStack::new(STONE, 30), false);
        cache.extract(64, false);
        assert_eq!(cache.bound_kind(), None);
    }

    #[test]
    fn slot_write_insertion_binds_and_folds() {
        let mut cache = tier2();
        cache.set_slot(SLOT_INPUT, Some(ItemStack::new(STONE, 40)));
        assert_eq!(cache.stored_count(), 40);
        assert_eq!(cache.bound_kind(), Some(STONE));
        assert_eq!(cache.slot(SLOT_OUTPUT).map(|s| s.count), Some(40));

        cache.set_slot(SLOT_INPUT, Some(ItemStack::new(STONE, 64)));
        assert_eq!(cache.stored_count(), 104);
        assert_eq!(cache.slot(SLOT_OUTPUT).map(|s| s.count), Some(64));
    }

    #[test]
    fn slot_write_extraction_folds_and_clears() {
        let mut cache = tier2();
        cache.insert(ItemStack::new(STONE, 64), false);
        assert_eq!(cache.slot(SLOT_OUTPUT).map(|s| s.count), Some(64));

        // A collaborator empties the output slot through the raw protocol.
        cache.set_slot(SLOT_OUTPUT, None);
        assert_eq!(cache.stored_count(), 0);
        assert_eq!(cache.bound_kind(), None);
    }

    #[test]
    fn balance_invariant_holds_after_mutations() {
        let mut cache = tier2();
        for amount in [1u32, 64, 129, 10_000, 39_936, 40_000] {
            cache.set_stored_item(Some(ItemStack::new(STONE, amount)));
            let main = cache
                .stored_item()
                .map_or(0, |s| s.count)
                - cache.slot(SLOT_INPUT).map_or(0, |s| s.count)
                - cache.slot(SLOT_OUTPUT).map_or(0, |s| s.count);
            let total = main
                + cache.slot(SLOT_INPUT).map_or(0, |s| s.count)
                + cache.slot(SLOT_OUTPUT).map_or(0, |s| s.count);
            assert_eq!(total, amount);
            let out = cache.slot(SLOT_OUTPUT).map_or(0, |s| s.count);
            assert!(out <= 64);
            assert!(out == amount.min(64));
        }
    }

    #[test]
    fn trackers_fire_on_thresholds_only() {
        let mut cache = tier2();
        cache.take_changes();

        // 40000 / 15 ≈ 2667 per comparator step; a tiny insert moves nothing.
        cache.insert(ItemStack::new(STONE, 10), false);
        let changes = cache.take_changes();
        // Binding an empty cache is always a visible change.
        assert!(changes.contains(ChangeSet::SYNC));
        assert!(!changes.contains(ChangeSet::NEIGHBOR));

        cache.insert(ItemStack::new(STONE, 3_000), false);
        let changes = cache.take_changes();
        assert!(changes.contains(ChangeSet::NEIGHBOR));
        assert_eq!(cache.comparator_value(), 1);

        // Another small step moves neither tracker.
        cache.insert(ItemStack::new(STONE, 10), false);
        let changes = cache.take_changes();
        assert!(!changes.contains(ChangeSet::NEIGHBOR));
        assert!(!changes.contains(ChangeSet::SYNC));
    }

    #[test]
    fn meter_saturates_at_eight() {
        let mut cache = tier2();
        cache.set_stored_item(Some(ItemStack::new(STONE, 40_000)));
        assert_eq!(cache.meter_level(), 8);
        assert_eq!(cache.comparator_value(), 15);
    }

    #[test]
    fn facing_rules() {
        let mut cache = tier2();
        assert!(!cache.set_facing(Direction::Up));
        assert!(!cache.set_facing(Direction::Down));
        assert!(cache.set_facing(Direction::West));
        assert_eq!(cache.facing().direction(), Direction::West);
        assert!(cache.rotate());
        assert_ne!(cache.facing().direction(), Direction::West);
    }

    #[test]
    fn side_access_policy() {
        let mut cache = tier2();
        let stone = ItemStack::new(STONE, 1);
        let dirt = ItemStack::new(DIRT, 1);

        assert!(cache.can_insert(SLOT_INPUT, &stone));
        assert!(!cache.can_insert(SLOT_OUTPUT, &stone));
        assert!(cache.can_extract(SLOT_OUTPUT));
        assert!(!cache.can_extract(SLOT_INPUT));

        cache.insert(stone, false);
        assert!(cache.can_insert(SLOT_INPUT, &ItemStack::new(STONE, 9)));
        assert!(!cache.can_insert(SLOT_INPUT, &dirt));
    }

    #[test]
    fn record_roundtrip_preserves_contents() {
        let table = CapacityTable::default();
        let mut cache = DeepCache::new(3, &table);
        cache.insert(ItemStack::new(STONE, 70_000), false);
        cache.toggle_lock();
        cache.set_facing(Direction::East);

        let record = cache.to_record();
        let restored = DeepCache::from_record(record, &table);
        assert_eq!(restored.tier(), 3);
        assert_eq!(restored.stored_count(), 70_000);
        assert!(restored.locked());
        assert_eq!(restored.facing().direction(), Direction::East);
    }

    #[test]
    fn record_normalizes_zero_counts() {
        let table = CapacityTable::default();
        let record = CacheRecord {
            tier: 2,
            facing: Facing::DEFAULT,
            locked: false,
            stored: Some(ItemStack::new(STONE, 0)),
        };
        let cache = DeepCache::from_record(record, &table);
        assert_eq!(cache.bound_kind(), None);

        let record = CacheRecord {
            tier: 2,
            facing: Facing::DEFAULT,
            locked: true,
            stored: Some(ItemStack::new(STONE, 0)),
        };
        let cache = DeepCache::from_record(record, &table);
        assert_eq!(cache.bound_kind(), Some(STONE));
        assert_eq!(cache.stored_count(), 0);
    }

    #[test]
    fn record_clamps_overlarge_counts() {
        let table = CapacityTable::default();
        let record = CacheRecord {
            tier: 1,
            facing: Facing::DEFAULT,
            locked: false,
            stored: Some(ItemStack::new(STONE, u32::MAX)),
        };
        let cache = DeepCache::from_record(record, &table);
        assert_eq!(cache.stored_count(), table.capacity(1));
    }

    #[test]
    fn creative_tier_swallows_everything() {
        let table = CapacityTable::default();
        let mut cache = DeepCache::new(0, &table);
        assert!(cache.insert(ItemStack::new(STONE, u32::MAX), false).is_none());
        assert_eq!(cache.stored_count(), u32::MAX);
    }

    proptest! {
        #[test]
        fn insertion_conservation_property(
            seed in 0u32..45_000,
            incoming in 1u32..100_000,
        ) {
            let mut cache = tier2();
            if seed > 0 {
                cache.set_stored_item(Some(ItemStack::new(STONE, seed)));
            }
            let before = cache.stored_count();
            let remainder = cache
                .insert(ItemStack::new(STONE, incoming), false)
                .map_or(0, |s| s.count);
            let accepted = cache.stored_count() - before;
            prop_assert_eq!(accepted + remainder, incoming);
            prop_assert!(cache.stored_count() <= cache.capacity());
        }

        #[test]
        fn extraction_bound_property(
            stored in 1u32..45_000,
            requested in 0u32..200,
        ) {
            let mut cache = tier2();
            cache.set_stored_item(Some(ItemStack::new(STONE, stored)));
            let available = cache.stored_count();
            let out = cache.extract(requested, false).map_or(0, |s| s.count);
            prop_assert!(out <= requested.min(available).min(64));
            prop_assert_eq!(cache.stored_count(), available - out);
        }

        #[test]
        fn balance_invariant_property(amount in 0u32..45_000) {
            let mut cache = tier2();
            cache.set_stored_item(Some(ItemStack::new(STONE, amount)));
            let clamped = amount.min(cache.capacity());
            prop_assert_eq!(cache.stored_count(), clamped);
            let out = cache.slot(SLOT_OUTPUT).map_or(0, |s| s.count);
            prop_assert_eq!(out, clamped.min(64));
        }
    }
}
