//! Slot-based inventory abstraction shared by devices and their neighbors.
//!
//! Devices never talk to each other directly; every cross-block interaction
//! goes through [`ItemHandler`] (a single inventory) or [`NeighborAccess`]
//! (per-direction routing). Failed or partial transfers are expressed as
//! returned remainders, never as errors.

use blockvault_core::{Direction, ItemStack};
use serde::{Deserialize, Serialize};

/// Remainder-returning inventory contract.
///
/// `simulate = true` computes the result without mutating; both calls of a
/// simulate/commit pair must agree for well-behaved implementations.
pub trait ItemHandler {
    /// Insert a stack, returning the portion that was not accepted.
    fn insert_item(&mut self, stack: ItemStack, simulate: bool) -> Option<ItemStack>;

    /// Extract up to `max_count` items, `None` when nothing is available.
    fn extract_item(&mut self, max_count: u32, simulate: bool) -> Option<ItemStack>;
}

/// Per-direction routing to adjacent inventories.
pub trait NeighborAccess {
    /// Insert into the inventory adjacent in `direction`; the full stack
    /// comes back when no neighbor is present.
    fn insert(&mut self, direction: Direction, stack: ItemStack, simulate: bool)
        -> Option<ItemStack>;

    /// Extract from the inventory adjacent in `direction`.
    fn extract(
        &mut self,
        direction: Direction,
        max_count: u32,
        simulate: bool,
    ) -> Option<ItemStack>;
}

/// Merge a stack into a slot array: matching non-full stacks first, then
/// empty slots (splitting at the native per-slot limit). Returns the portion
/// that did not fit.
pub fn merge_into_slots(slots: &mut [Option<ItemStack>], mut stack: ItemStack) -> Option<ItemStack> {
    for slot in slots.iter_mut().flatten() {
        if slot.matches(&stack) && slot.count < slot.max_stack_size() {
            let space = slot.max_stack_size() - slot.count;
            let moved = stack.count.min(space);
            slot.count += moved;
            stack.count -= moved;
            if stack.count == 0 {
                return None;
            }
        }
    }
    for slot in slots.iter_mut() {
        if slot.is_none() {
            let placed = stack.count.min(stack.max_stack_size());
            *slot = Some(stack.with_count(placed));
            stack.count -= placed;
            if stack.count == 0 {
                return None;
            }
        }
    }
    stack.nonzero()
}

/// Fill-fraction comparator signal over a slot array: 0 when empty, else
/// `1 + floor(fill * 14)`, saturating at 15.
pub fn comparator_signal(slots: &[Option<ItemStack>]) -> u8 {
    if slots.is_empty() {
        return 0;
    }

    let mut fill_64ths: u64 = 0;
    let mut has_any = false;

    for stack in slots.iter().flatten() {
        if stack.count == 0 {
            continue;
        }
        has_any = true;
        let max = stack.max_stack_size().max(1) as u64;
        fill_64ths = fill_64ths.saturating_add((stack.count as u64) * 64 / max);
    }

    if !has_any {
        return 0;
    }

    let denom = (slots.len() as u64) * 64;
    let base = (fill_64ths.saturating_mul(14) / denom) as u8;
    base.saturating_add(1).min(15)
}

/// A plain fixed-slot container (chest-like) used by neighbors in tests and
/// the demo simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotInventory {
    slots: Vec<Option<ItemStack>>,
}

impl SlotInventory {
    /// Create an empty inventory with `len` slots.
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether every slot is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }

    /// Read one slot.
    pub fn slot(&self, index: usize) -> Option<&ItemStack> {
        self.slots.get(index).and_then(|slot| slot.as_ref())
    }

    /// Overwrite one slot, normalizing zero-count stacks to empty.
    pub fn set_slot(&mut self, index: usize, stack: Option<ItemStack>) -> bool {
        if index >= self.slots.len() {
            return false;
        }
        self.slots[index] = stack.and_then(ItemStack::nonzero);
        true
    }

    /// Total item count across all slots.
    pub fn total_count(&self) -> u64 {
        self.slots
            .iter()
            .flatten()
            .map(|stack| stack.count as u64)
            .sum()
    }

    fn insert_commit(&mut self, stack: ItemStack) -> Option<ItemStack> {
        merge_into_slots(&mut self.slots, stack)
    }
}

impl ItemHandler for SlotInventory {
    fn insert_item(&mut self, stack: ItemStack, simulate: bool) -> Option<ItemStack> {
        let stack = stack.nonzero()?;
        if simulate {
            self.clone().insert_commit(stack)
        } else {
            self.insert_commit(stack)
        }
    }

    fn extract_item(&mut self, max_count: u32, simulate: bool) -> Option<ItemStack> {
        if max_count == 0 {
            return None;
        }
        for slot in self.slots.iter_mut() {
            let Some(stack) = slot.as_mut() else {
                continue;
            };
            let taken = stack.count.min(max_count).min(stack.max_stack_size());
            let out = stack.with_count(taken);
            if !simulate {
                stack.count -= taken;
                if stack.count == 0 {
                    *slot = None;
                }
            }
            return Some(out);
        }
        None
    }
}

/// Six optional neighbor inventories, one per direction.
#[derive(Debug, Clone, Default)]
pub struct NeighborInventories {
    sides: [Option<SlotInventory>; 6],
}

impl NeighborInventories {
    /// No neighbors on any side.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an inventory on one side.
    pub fn attach(&mut self, direction: Direction, inventory: SlotInventory) {
        self.sides[direction.index()] = Some(inventory);
    }

    /// Remove and return the inventory on one side.
    pub fn detach(&mut self, direction: Direction) -> Option<SlotInventory> {
        self.sides[direction.index()].take()
    }

    /// Read the inventory on one side.
    pub fn side(&self, direction: Direction) -> Option<&SlotInventory> {
        self.sides[direction.index()].as_ref()
    }

    /// Mutable access to the inventory on one side.
    pub fn side_mut(&mut self, direction: Direction) -> Option<&mut SlotInventory> {
        self.sides[direction.index()].as_mut()
    }
}

impl NeighborAccess for NeighborInventories {
    fn insert(
        &mut self,
        direction: Direction,
        stack: ItemStack,
        simulate: bool,
    ) -> Option<ItemStack> {
        match self.sides[direction.index()].as_mut() {
            Some(inventory) => inventory.insert_item(stack, simulate),
            None => Some(stack),
        }
    }

    fn extract(
        &mut self,
        direction: Direction,
        max_count: u32,
        simulate: bool,
    ) -> Option<ItemStack> {
        self.sides[direction.index()]
            .as_mut()
            .and_then(|inventory| inventory.extract_item(max_count, simulate))
    }
}
