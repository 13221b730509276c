//! Kernel lifecycle state.
//!
//! `#[repr(u8)]` so the state can be mirrored into diagnostics without
//! conversion tables.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a control kernel.
///
/// `Stopped → Initializing → Running → Finalizing → Stopped`. A failed
/// initialization returns directly to `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum KernelState {
    /// Not executing; registry mutation allowed.
    #[default]
    Stopped = 0,
    /// Support components and execution strategy are starting.
    Initializing = 1,
    /// Cascade executes every step; selection allowed.
    Running = 2,
    /// Execution strategy and Support components are shutting down.
    Finalizing = 3,
}

impl KernelState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Stopped),
            1 => Some(Self::Initializing),
            2 => Some(Self::Running),
            3 => Some(Self::Finalizing),
            _ => None,
        }
    }

    /// Whether `next` is a legal successor of `self`.
    pub const fn can_transition_to(self, next: KernelState) -> bool {
        matches!(
            (self, next),
            (Self::Stopped, Self::Initializing)
                | (Self::Initializing, Self::Running)
                | (Self::Initializing, Self::Stopped)
                | (Self::Running, Self::Finalizing)
                | (Self::Finalizing, Self::Stopped)
        )
    }
}
