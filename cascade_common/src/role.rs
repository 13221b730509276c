//! Component roles and data-object channels.
//!
//! `RoleKind` names the six roles of the sensor-based control pattern.
//! `Channels` is a bitset over the five data objects. Together they encode
//! the fixed dataflow contract: which channels a role reads and which it
//! writes never depend on the component instance.

use bitflags::bitflags;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

// ─── Channels ───────────────────────────────────────────────────────

bitflags! {
    /// Set of data-object channels.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Channels: u8 {
        const COMMANDS  = 0x01;
        const SETPOINTS = 0x02;
        const INPUTS    = 0x04;
        const MODELS    = 0x08;
        const OUTPUTS   = 0x10;
    }
}

impl Channels {
    /// Human-readable channel name used in data-object names
    /// (`<kernel>::<name>`). Only meaningful for a single channel.
    pub const fn object_name(self) -> &'static str {
        match self.bits() {
            0x01 => "Commands",
            0x02 => "SetPoints",
            0x04 => "Inputs",
            0x08 => "Models",
            0x10 => "Outputs",
            _ => "Mixed",
        }
    }
}

// ─── RoleKind ───────────────────────────────────────────────────────

/// Role of a component within the control cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RoleKind {
    Sensor = 0,
    Estimator = 1,
    Generator = 2,
    Controller = 3,
    Effector = 4,
    Support = 5,
}

impl RoleKind {
    /// Single-selection roles in cascade execution order.
    pub const CASCADE: [RoleKind; 5] = [
        RoleKind::Sensor,
        RoleKind::Estimator,
        RoleKind::Generator,
        RoleKind::Controller,
        RoleKind::Effector,
    ];

    /// Channels this role reads.
    pub const fn reads(self) -> Channels {
        match self {
            Self::Sensor => Channels::empty(),
            Self::Estimator => Channels::INPUTS,
            Self::Generator => Channels::MODELS
                .union(Channels::INPUTS)
                .union(Channels::COMMANDS),
            Self::Controller => Channels::SETPOINTS
                .union(Channels::MODELS)
                .union(Channels::INPUTS),
            Self::Effector => Channels::OUTPUTS,
            Self::Support => Channels::empty(),
        }
    }

    /// Channels this role writes.
    pub const fn writes(self) -> Channels {
        match self {
            Self::Sensor => Channels::INPUTS,
            Self::Estimator => Channels::MODELS,
            Self::Generator => Channels::SETPOINTS,
            Self::Controller => Channels::OUTPUTS,
            Self::Effector | Self::Support => Channels::empty(),
        }
    }

    /// Support components are all active at once; every other role has
    /// exactly one active component.
    #[inline]
    pub const fn is_single_selection(self) -> bool {
        !matches!(self, Self::Support)
    }

    /// Name of the always-present default component for this role.
    pub const fn default_component_name(self) -> &'static str {
        match self {
            Self::Sensor => "DefaultSensor",
            Self::Estimator => "DefaultEstimator",
            Self::Generator => "DefaultGenerator",
            Self::Controller => "DefaultController",
            Self::Effector => "DefaultEffector",
            Self::Support => "DefaultSupport",
        }
    }

    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Sensor),
            1 => Some(Self::Estimator),
            2 => Some(Self::Generator),
            3 => Some(Self::Controller),
            4 => Some(Self::Effector),
            5 => Some(Self::Support),
            _ => None,
        }
    }
}

static_assertions::assert_eq_size!(RoleKind, u8);
static_assertions::assert_eq_size!(Channels, u8);

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sensor => "Sensor",
            Self::Estimator => "Estimator",
            Self::Generator => "Generator",
            Self::Controller => "Controller",
            Self::Effector => "Effector",
            Self::Support => "Support",
        };
        f.write_str(s)
    }
}

impl FromStr for RoleKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Sensor" => Ok(Self::Sensor),
            "Estimator" => Ok(Self::Estimator),
            "Generator" => Ok(Self::Generator),
            "Controller" => Ok(Self::Controller),
            "Effector" => Ok(Self::Effector),
            "Support" => Ok(Self::Support),
            _ => Err(format!("unknown RoleKind: {s:?}")),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
