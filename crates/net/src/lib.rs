//! Sync message payloads for storage devices.

mod codec;
mod protocol;

pub use codec::{decode_message, encode_message};
pub use protocol::{
    DeviceMessage, DeviceSnapshot, ModeUpdate, MAX_CACHE_TIER, MAX_STORED_COUNT,
    MAX_TRANSFER_AMOUNT, PROTOCOL_VERSION, SIDE_COUNT,
};
