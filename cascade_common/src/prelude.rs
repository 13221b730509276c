//! Prelude module for common re-exports.
//!
//! Consumers can do `use cascade_common::prelude::*;` and get the role,
//! channel and configuration vocabulary without listing individual paths.
//!
//! # Usage
//!
//! ```rust
//! use cascade_common::prelude::*;
//!
//! assert_eq!(DEFAULT_CONTROL_PERIOD.as_micros(), DEFAULT_PERIOD_US as u128);
//! ```

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ChannelPrefixes, ConfigError, ConfigLoader, KernelConfig, KernelSection, OverrunPolicy,
    RunnerConfig, SharedConfig,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_PERIOD_US, MAX_COMPONENTS_PER_ROLE, MAX_SUPPORTS, NAME_CAPACITY};

// ─── Roles & Lifecycle ──────────────────────────────────────────────
pub use crate::role::{Channels, RoleKind};
pub use crate::state::KernelState;

/// Default control period as Duration.
pub const DEFAULT_CONTROL_PERIOD: Duration = Duration::from_micros(DEFAULT_PERIOD_US as u64);
