//! Message encoding and decoding with framing.
//!
//! Provides length-prefixed encoding so payloads survive stream transports
//! that deliver partial reads.

use crate::protocol::DeviceMessage;
use anyhow::{Context, Result};

/// Frame format: [length: u32][message_type: u8][payload: bytes]
const FRAME_HEADER_LEN: usize = 5;

fn message_type_tag(msg: &DeviceMessage) -> u8 {
    match msg {
        DeviceMessage::Snapshot(_) => 0,
        DeviceMessage::Mode(_) => 1,
    }
}

/// Encode a device message with length prefix.
pub fn encode_message(msg: &DeviceMessage) -> Result<Vec<u8>> {
    let payload = postcard::to_allocvec(msg).context("Failed to serialize device message")?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());

    // Length (excluding length field itself).
    let length = (1 + payload.len()) as u32;
    frame.extend_from_slice(&length.to_le_bytes());

    // Message type tag (for multiplexing if needed).
    frame.push(message_type_tag(msg));

    frame.extend_from_slice(&payload);

    Ok(frame)
}

/// Decode a device message from frame data.
///
/// Expects data to start with the length prefix.
pub fn decode_message(data: &[u8]) -> Result<DeviceMessage> {
    if data.len() < FRAME_HEADER_LEN {
        anyhow::bail!(
            "Frame too short: {} bytes (minimum {})",
            data.len(),
            FRAME_HEADER_LEN
        );
    }

    let length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if length == 0 {
        anyhow::bail!("Frame length must include the tag byte");
    }
    if data.len() < 4 + length {
        anyhow::bail!(
            "Frame truncated: expected {} bytes, got {}",
            4 + length,
            data.len()
        );
    }

    let payload = &data[5..4 + length];
    let msg: DeviceMessage =
        postcard::from_bytes(payload).context("Failed to deserialize device message")?;

    // Tag and payload variant must agree.
    if message_type_tag(&msg) != data[4] {
        anyhow::bail!("Frame tag does not match payload variant");
    }

    Ok(msg)
}
