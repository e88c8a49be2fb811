//! Protocol message definitions for device synchronization.
//!
//! Two message shapes exist: a full-tile snapshot broadcast to observing
//! clients whenever a device reports a client-visible change, and a
//! mode-change message travelling client -> server -> broadcast when a user
//! reconfigures transfer quantities. All messages use postcard serialization
//! for compact binary encoding.

use blockvault_core::{Facing, ItemStack, SideMode};
use serde::{Deserialize, Serialize};

/// Protocol version for compatibility checking.
pub const PROTOCOL_VERSION: u16 = 1;

/// Number of configurable device sides.
pub const SIDE_COUNT: usize = 6;

/// Highest valid cache tier on the wire.
pub const MAX_CACHE_TIER: u8 = 4;

/// Maximum stored count a non-creative cache snapshot may claim.
/// Prevents nonsense quantities from reaching the display path.
pub const MAX_STORED_COUNT: u32 = 1_000_000_000;

/// Transfer quantities are clamped into `0..=MAX_TRANSFER_AMOUNT` on receipt.
pub const MAX_TRANSFER_AMOUNT: i32 = 64;

/// Full-tile state broadcast (server -> client).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeviceSnapshot {
    /// Deep storage cache state.
    Cache {
        /// Capacity tier.
        tier: u8,
        /// Block facing.
        facing: Facing,
        /// Lock flag.
        locked: bool,
        /// Bound kind and logical count; `None` when empty.
        stored: Option<ItemStack>,
    },
    /// Transfer buffer state.
    Buffer {
        /// Per-tick input cap.
        amount_input: u32,
        /// Per-tick output cap.
        amount_output: u32,
        /// Whether transfer is running.
        active: bool,
        /// Per-side transfer modes.
        sides: [SideMode; SIDE_COUNT],
    },
}

/// Transfer-quantity reconfiguration (client -> server -> broadcast).
///
/// Values are signed on the wire; out-of-range values are clamped on
/// receipt rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeUpdate {
    /// Requested per-tick input cap.
    pub amount_input: i32,
    /// Requested per-tick output cap.
    pub amount_output: i32,
}

impl ModeUpdate {
    /// Clamp both quantities into the accepted range.
    pub fn clamped(&self) -> (u32, u32) {
        (
            self.amount_input.clamp(0, MAX_TRANSFER_AMOUNT) as u32,
            self.amount_output.clamp(0, MAX_TRANSFER_AMOUNT) as u32,
        )
    }
}

/// Envelope for all device sync traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeviceMessage {
    /// Server -> client full-tile broadcast.
    Snapshot(DeviceSnapshot),
    /// Client -> server reconfiguration.
    Mode(ModeUpdate),
}

impl DeviceMessage {
    /// Verify message limits and validity.
    ///
    /// This should be called on all received messages to keep malformed
    /// payloads away from device state.
    pub fn verify(&self) -> Result<(), &'static str> {
        match self {
            DeviceMessage::Snapshot(DeviceSnapshot::Cache { tier, stored, .. }) => {
                if *tier > MAX_CACHE_TIER {
                    return Err("Cache tier out of range");
                }
                // The creative tier (0) stores unbounded quantities.
                if *tier > 0 {
                    if let Some(stack) = stored {
                        if stack.count > MAX_STORED_COUNT {
                            return Err("Stored count exceeds ceiling");
                        }
                    }
                }
            }
            DeviceMessage::Snapshot(DeviceSnapshot::Buffer {
                amount_input,
                amount_output,
                ..
            }) => {
                if *amount_input > MAX_TRANSFER_AMOUNT as u32
                    || *amount_output > MAX_TRANSFER_AMOUNT as u32
                {
                    return Err("Transfer amount exceeds clamp range");
                }
            }
            // Mode updates are clamped on receipt, never rejected.
            DeviceMessage::Mode(_) => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockvault_core::{Direction, ItemKind};
    use proptest::prelude::*;

    fn open_omni_sides() -> [SideMode; SIDE_COUNT] {
        let mut sides = [SideMode::Omni; SIDE_COUNT];
        sides[0] = SideMode::Open;
        sides
    }

    #[test]
    fn valid_snapshots_verify() {
        let msg = DeviceMessage::Snapshot(DeviceSnapshot::Cache {
            tier: 2,
            facing: Facing::DEFAULT,
            locked: false,
            stored: Some(ItemStack::new(ItemKind::Block(1), 40_000)),
        });
        assert!(msg.verify().is_ok());

        let msg = DeviceMessage::Snapshot(DeviceSnapshot::Buffer {
            amount_input: 4,
            amount_output: 64,
            active: true,
            sides: open_omni_sides(),
        });
        assert!(msg.verify().is_ok());
    }

    #[test]
    fn creative_tier_skips_count_ceiling() {
        let msg = DeviceMessage::Snapshot(DeviceSnapshot::Cache {
            tier: 0,
            facing: Facing::DEFAULT,
            locked: false,
            stored: Some(ItemStack::new(ItemKind::Block(1), u32::MAX)),
        });
        assert!(msg.verify().is_ok());
    }

    #[test]
    fn out_of_range_fields_fail_verify() {
        let msg = DeviceMessage::Snapshot(DeviceSnapshot::Cache {
            tier: 5,
            facing: Facing::DEFAULT,
            locked: false,
            stored: None,
        });
        assert_eq!(msg.verify(), Err("Cache tier out of range"));

        let msg = DeviceMessage::Snapshot(DeviceSnapshot::Cache {
            tier: 1,
            facing: Facing::DEFAULT,
            locked: false,
            stored: Some(ItemStack::new(ItemKind::Block(1), MAX_STORED_COUNT + 1)),
        });
        assert_eq!(msg.verify(), Err("Stored count exceeds ceiling"));

        let msg = DeviceMessage::Snapshot(DeviceSnapshot::Buffer {
            amount_input: 65,
            amount_output: 4,
            active: false,
            sides: open_omni_sides(),
        });
        assert!(msg.verify().is_err());
    }

    #[test]
    fn facing_rejects_vertical_on_decode() {
        // Facing deserializes through Direction and refuses vertical values.
        let bytes = postcard::to_allocvec(&Direction::Down).unwrap();
        assert!(postcard::from_bytes::<Facing>(&bytes).is_err());

        let bytes = postcard::to_allocvec(&Direction::East).unwrap();
        let facing = postcard::from_bytes::<Facing>(&bytes).unwrap();
        assert_eq!(facing.direction(), Direction::East);
    }

    proptest! {
        #[test]
        fn mode_clamp_is_idempotent(input in any::<i32>(), output in any::<i32>()) {
            let update = ModeUpdate { amount_input: input, amount_output: output };
            let (cin, cout) = update.clamped();
            prop_assert!(cin <= 64 && cout <= 64);
            let again = ModeUpdate {
                amount_input: cin as i32,
                amount_output: cout as i32,
            };
            prop_assert_eq!(again.clamped(), (cin, cout));
        }
    }
}
