//! Storage and transfer devices: the deep storage cache and the round-robin
//! item buffer, plus the slot/side abstraction they share.

mod buffer;
mod cache;
mod capacity;
mod change;
mod inventory;
mod persist;

pub use buffer::{
    BufferRecord, TransferBuffer, BUFFER_SLOT_COUNT, DEFAULT_TRANSFER_AMOUNT, MAX_TRANSFER_AMOUNT,
};
pub use cache::{CacheRecord, DeepCache, SLOT_INPUT, SLOT_OUTPUT};
pub use capacity::{CapacityTable, ABSOLUTE_CEILING, CACHE_TIERS, DEFAULT_CAPACITY};
pub use change::ChangeSet;
pub use inventory::{
    comparator_signal, merge_into_slots, ItemHandler, NeighborAccess, NeighborInventories,
    SlotInventory,
};
pub use persist::{DevicePos, DeviceRecord, DeviceStore};
