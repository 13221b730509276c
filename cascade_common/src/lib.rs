//! Cascade Common Library
//!
//! Shared constants, role/channel vocabulary and configuration loading
//! utilities for all Cascade workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Capacity limits and timing defaults
//! - [`role`] - Component roles and data-object channels
//! - [`state`] - Kernel lifecycle state
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use cascade_common::prelude::*;
//!
//! assert!(RoleKind::Controller.writes().contains(Channels::OUTPUTS));
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
pub mod role;
pub mod state;
