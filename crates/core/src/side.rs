//! Side configuration and redstone control vocabulary.
//!
//! Devices assign one mode per world direction. Automatic transfer only
//! services *primary* sides (`Input`, `Output`, `Omni`); `Open` leaves a side
//! reachable for external pipes and players without the device pushing or
//! pulling through it on its own.

use serde::{Deserialize, Serialize};

/// Access mode assigned to one side of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SideMode {
    /// Side is sealed.
    None,
    /// Side accepts insertion and is auto-pulled from.
    Input,
    /// Side permits extraction and is auto-pushed to.
    Output,
    /// Side is externally usable both ways but never auto-serviced.
    Open,
    /// Side is fully bidirectional, including auto transfer.
    Omni,
}

impl SideMode {
    /// Whether the device auto-pulls through a side with this mode.
    pub const fn admits_input(self) -> bool {
        matches!(self, SideMode::Input | SideMode::Omni)
    }

    /// Whether the device auto-pushes through a side with this mode.
    pub const fn admits_output(self) -> bool {
        matches!(self, SideMode::Output | SideMode::Omni)
    }

    /// Whether external collaborators may insert through this side.
    pub const fn allows_insert(self) -> bool {
        matches!(self, SideMode::Input | SideMode::Open | SideMode::Omni)
    }

    /// Whether external collaborators may extract through this side.
    pub const fn allows_extract(self) -> bool {
        matches!(self, SideMode::Output | SideMode::Open | SideMode::Omni)
    }
}

/// Redstone gating policy for tick-driven devices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlMode {
    /// Run regardless of signal.
    #[default]
    Ignored,
    /// Run only while the signal is low.
    Low,
    /// Run only while the signal is high.
    High,
}

impl ControlMode {
    /// Evaluate the policy against the current powered state.
    pub const fn allows(self, powered: bool) -> bool {
        match self {
            ControlMode::Ignored => true,
            ControlMode::Low => !powered,
            ControlMode::High => powered,
        }
    }
}
