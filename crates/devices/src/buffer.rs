//! Round-robin item buffer: pulls and pushes through configured sides.
//!
//! Each scheduling tick the buffer services at most one output direction and
//! one input direction. Scans start one past the last direction that
//! actually moved items, so a serviced side cedes priority to the next
//! candidate and no neighbor can monopolize transfer bandwidth.
//!
//! The host guarantees single-threaded tick dispatch; nothing here is safe
//! to drive from two ticks at once.

use crate::change::ChangeSet;
use crate::inventory::{comparator_signal, merge_into_slots, NeighborAccess};
use blockvault_core::{ControlMode, Direction, ItemStack, SideMode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of buffer slots.
pub const BUFFER_SLOT_COUNT: usize = 9;

/// Upper clamp for per-tick transfer quantities.
pub const MAX_TRANSFER_AMOUNT: u32 = 64;

/// Default per-tick transfer quantity.
pub const DEFAULT_TRANSFER_AMOUNT: u32 = 4;

fn default_side_modes() -> [SideMode; 6] {
    let mut sides = [SideMode::Omni; 6];
    sides[0] = SideMode::Open;
    sides
}

/// A nine-slot item buffer with per-side transfer modes.
#[derive(Debug, Clone)]
pub struct TransferBuffer {
    slots: [Option<ItemStack>; BUFFER_SLOT_COUNT],
    sides: [SideMode; 6],
    control: ControlMode,
    input_tracker: u8,
    output_tracker: u8,
    amount_input: u32,
    amount_output: u32,
    transfer_in: bool,
    transfer_out: bool,
    active: bool,
    changes: ChangeSet,
}

impl Default for TransferBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferBuffer {
    /// Create an empty buffer with the default side table (side 0 open,
    /// everything else omni).
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            sides: default_side_modes(),
            control: ControlMode::Ignored,
            input_tracker: 0,
            output_tracker: 0,
            amount_input: DEFAULT_TRANSFER_AMOUNT,
            amount_output: DEFAULT_TRANSFER_AMOUNT,
            transfer_in: true,
            transfer_out: true,
            active: false,
            changes: ChangeSet::empty(),
        }
    }

    /// Read one slot.
    pub fn slot(&self, index: usize) -> Option<&ItemStack> {
        self.slots.get(index).and_then(|slot| slot.as_ref())
    }

    /// Overwrite one slot, normalizing zero-count stacks to empty.
    pub fn set_slot(&mut self, index: usize, stack: Option<ItemStack>) -> bool {
        if index >= BUFFER_SLOT_COUNT {
            return false;
        }
        self.slots[index] = stack.and_then(ItemStack::nonzero);
        self.changes |= ChangeSet::DIRTY;
        true
    }

    /// Whether every slot is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }

    /// Whether transfer runs this tick.
    pub fn active(&self) -> bool {
        self.active
    }

    /// Per-tick input quantity cap.
    pub fn amount_input(&self) -> u32 {
        self.amount_input
    }

    /// Per-tick output quantity cap.
    pub fn amount_output(&self) -> u32 {
        self.amount_output
    }

    /// Last direction serviced by the input phase.
    pub fn input_tracker(&self) -> u8 {
        self.input_tracker
    }

    /// Last direction serviced by the output phase.
    pub fn output_tracker(&self) -> u8 {
        self.output_tracker
    }

    /// Redstone gating policy.
    pub fn control(&self) -> ControlMode {
        self.control
    }

    /// Set the redstone gating policy.
    pub fn set_control(&mut self, control: ControlMode) {
        if control != self.control {
            self.control = control;
            self.changes |= ChangeSet::SYNC | ChangeSet::DIRTY;
        }
    }

    /// Mode of one side.
    pub fn side_mode(&self, direction: Direction) -> SideMode {
        self.sides[direction.index()]
    }

    /// Reconfigure one side.
    pub fn set_side_mode(&mut self, direction: Direction, mode: SideMode) {
        if self.sides[direction.index()] != mode {
            self.sides[direction.index()] = mode;
            self.changes |= ChangeSet::SYNC | ChangeSet::DIRTY;
        }
    }

    /// The full side table.
    pub fn side_modes(&self) -> [SideMode; 6] {
        self.sides
    }

    /// Set the per-tick input cap, clamped to `0..=64`.
    pub fn set_amount_input(&mut self, amount: u32) {
        let clamped = amount.min(MAX_TRANSFER_AMOUNT);
        if clamped != self.amount_input {
            self.amount_input = clamped;
            self.changes |= ChangeSet::SYNC | ChangeSet::DIRTY;
        }
    }

    /// Set the per-tick output cap, clamped to `0..=64`.
    pub fn set_amount_output(&mut self, amount: u32) {
        let clamped = amount.min(MAX_TRANSFER_AMOUNT);
        if clamped != self.amount_output {
            self.amount_output = clamped;
            self.changes |= ChangeSet::SYNC | ChangeSet::DIRTY;
        }
    }

    /// Enable or disable the input phase.
    pub fn set_transfer_in(&mut self, enabled: bool) {
        self.transfer_in = enabled;
    }

    /// Enable or disable the output phase.
    pub fn set_transfer_out(&mut self, enabled: bool) {
        self.transfer_out = enabled;
    }

    /// Apply a client reconfiguration (network mode-update path).
    pub fn apply_mode(&mut self, amount_input: u32, amount_output: u32) {
        self.set_amount_input(amount_input);
        self.set_amount_output(amount_output);
    }

    /// Comparator-style signal derived from the slot fill, 0..=15.
    pub fn comparator_value(&self) -> u8 {
        comparator_signal(&self.slots)
    }

    /// Drain the side effects accumulated since the last call.
    pub fn take_changes(&mut self) -> ChangeSet {
        std::mem::take(&mut self.changes)
    }

    /// Run one scheduling tick.
    ///
    /// While active: one output transfer, one input transfer, then the
    /// redstone predicate decides whether to stay active. An idle buffer
    /// only re-evaluates the predicate.
    pub fn tick(&mut self, powered: bool, neighbors: &mut dyn NeighborAccess) {
        let was_active = self.active;

        if self.active {
            self.run_output(neighbors);
            self.run_input(neighbors);
            if !self.control.allows(powered) {
                self.active = false;
            }
        } else if self.control.allows(powered) {
            self.active = true;
        }

        if was_active != self.active {
            self.changes |= ChangeSet::SYNC | ChangeSet::DIRTY;
        }
    }

    fn run_output(&mut self, neighbors: &mut dyn NeighborAccess) {
        if !self.transfer_out || self.amount_output == 0 {
            return;
        }
        for step in 1..=6usize {
            let side = (self.output_tracker as usize + step) % 6;
            if !self.sides[side].admits_output() {
                continue;
            }
            let direction = Direction::ALL[side];
            for slot in (0..BUFFER_SLOT_COUNT).rev() {
                if self.push_slot(slot, direction, neighbors) {
                    self.output_tracker = side as u8;
                    self.changes |= ChangeSet::DIRTY;
                    return;
                }
            }
        }
    }

    fn run_input(&mut self, neighbors: &mut dyn NeighborAccess) {
        if !self.transfer_in || self.amount_input == 0 {
            return;
        }
        for step in 1..=6usize {
            let side = (self.input_tracker as usize + step) % 6;
            if !self.sides[side].admits_input() {
                continue;
            }
            let direction = Direction::ALL[side];
            for slot in 0..BUFFER_SLOT_COUNT {
                if self.pull_slot(slot, direction, neighbors) {
                    self.input_tracker = side as u8;
                    self.changes |= ChangeSet::DIRTY;
                    return;
                }
            }
        }
    }

    /// Push up to `amount_output` items from one slot to a neighbor.
    /// Partial acceptance commits the accepted portion.
    fn push_slot(
        &mut self,
        slot: usize,
        direction: Direction,
        neighbors: &mut dyn NeighborAccess,
    ) -> bool {
        let Some(stack) = self.slots[slot].as_ref() else {
            return false;
        };
        let offer = stack.count.min(self.amount_output);
        if offer == 0 {
            return false;
        }
        let probe = stack.with_count(offer);

        let rejected = neighbors
            .insert(direction, probe.clone(), true)
            .map_or(0, |r| r.count);
        let accepted = offer.saturating_sub(rejected);
        if accepted == 0 {
            return false;
        }

        let leftover = neighbors
            .insert(direction, probe.with_count(accepted), false)
            .map_or(0, |r| r.count);
        let moved = accepted.saturating_sub(leftover);
        if moved == 0 {
            return false;
        }

        if let Some(stack) = self.slots[slot].as_mut() {
            stack.count = stack.count.saturating_sub(moved);
            if stack.count == 0 {
                self.slots[slot] = None;
            }
        }
        debug!(side = direction.as_str(), slot, moved, "buffer pushed items");
        true
    }

    /// Pull up to `amount_input` items from a neighbor into one slot. Only
    /// an empty slot or a matching-kind slot with native space accepts.
    fn pull_slot(
        &mut self,
        slot: usize,
        direction: Direction,
        neighbors: &mut dyn NeighborAccess,
    ) -> bool {
        let want = match &self.slots[slot] {
            Some(stack) => stack
                .max_stack_size()
                .saturating_sub(stack.count)
                .min(self.amount_input),
            None => self.amount_input,
        };
        if want == 0 {
            return false;
        }

        let Some(preview) = neighbors
            .extract(direction, want, true)
            .and_then(ItemStack::nonzero)
        else {
            return false;
        };
        if let Some(existing) = &self.slots[slot] {
            if !existing.matches(&preview) {
                return false;
            }
        }

        let Some(taken) = neighbors
            .extract(direction, preview.count.min(want), false)
            .and_then(ItemStack::nonzero)
        else {
            return false;
        };

        let moved = taken.count;
        if let Some(existing) = self.slots[slot].as_mut() {
            if existing.matches(&taken) {
                existing.count = existing.count.saturating_add(taken.count);
            } else {
                // The neighbor handed over a different kind on commit than on
                // simulate; stash it wherever it fits rather than lose items.
                let _ = merge_into_slots(&mut self.slots, taken);
            }
        } else {
            self.slots[slot] = Some(taken);
        }
        debug!(side = direction.as_str(), slot, moved, "buffer pulled items");
        true
    }

    /// Capture persistent state.
    pub fn to_record(&self) -> BufferRecord {
        BufferRecord {
            slots: self.slots.clone(),
            sides: self.sides,
            control: self.control,
            input_tracker: self.input_tracker,
            output_tracker: self.output_tracker,
            amount_input: self.amount_input,
            amount_output: self.amount_output,
            transfer_in: self.transfer_in,
            transfer_out: self.transfer_out,
            active: self.active,
        }
    }

    /// Rebuild a buffer from persistent state, clamping amounts and
    /// trackers and normalizing zero-count slots.
    pub fn from_record(record: BufferRecord) -> Self {
        let mut slots = record.slots;
        for slot in slots.iter_mut() {
            if slot.as_ref().is_some_and(|stack| stack.count == 0) {
                *slot = None;
            }
        }
        Self {
            slots,
            sides: record.sides,
            control: record.control,
            input_tracker: record.input_tracker.min(5),
            output_tracker: record.output_tracker.min(5),
            amount_input: record.amount_input.min(MAX_TRANSFER_AMOUNT),
            amount_output: record.amount_output.min(MAX_TRANSFER_AMOUNT),
            transfer_in: record.transfer_in,
            transfer_out: record.transfer_out,
            active: record.active,
            changes: ChangeSet::empty(),
        }
    }
}

fn default_amount() -> u32 {
    DEFAULT_TRANSFER_AMOUNT
}

fn default_true() -> bool {
    true
}

fn empty_slots() -> [Option<ItemStack>; BUFFER_SLOT_COUNT] {
    std::array::from_fn(|_| None)
}

/// Persisted buffer state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferRecord {
    /// Slot contents.
    #[serde(default = "empty_slots")]
    pub slots: [Option<ItemStack>; BUFFER_SLOT_COUNT],
    /// Per-side transfer modes.
    #[serde(default = "default_side_modes")]
    pub sides: [SideMode; 6],
    /// Redstone gating policy.
    #[serde(default)]
    pub control: ControlMode,
    /// Rotation state of the input scan.
    #[serde(default)]
    pub input_tracker: u8,
    /// Rotation state of the output scan.
    #[serde(default)]
    pub output_tracker: u8,
    /// Per-tick input cap.
    #[serde(default = "default_amount")]
    pub amount_input: u32,
    /// Per-tick output cap.
    #[serde(default = "default_amount")]
    pub amount_output: u32,
    /// Input phase enabled.
    #[serde(default = "default_true")]
    pub transfer_in: bool,
    /// Output phase enabled.
    #[serde(default = "default_true")]
    pub transfer_out: bool,
    /// Whether the buffer was running.
    #[serde(default)]
    pub active: bool,
}
