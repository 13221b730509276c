//! # Cascade Kernel
//!
//! A reusable control kernel that runs one control cycle as a fixed cascade
//! of five component roles over five shared data objects:
//!
//! ```text
//!            Commands
//!               │
//! Sensor ─▶ Inputs ─▶ Estimator ─▶ Models ─▶ Generator ─▶ SetPoints
//!                                                                │
//!                      Effector ◀─ Outputs ◀─ Controller ◀───────┘
//! ```
//!
//! Each single-selection role holds any number of loaded components, exactly
//! one of which is active. Components are loaded and unloaded while the
//! kernel is stopped and hot-swapped with `select_*` while it runs. Support
//! components run after the cascade every cycle.
//!
//! ## Layers
//!
//! 1. [`data_object`]: seqlock-published values shared by ports
//! 2. [`port`]: typed read/write bindings, fixed per role
//! 3. [`component`]: the component contract and no-op defaults
//! 4. [`kernel`]: registries, selection and the lifecycle state machine
//! 5. [`extension`]: the per-cycle execution strategy
//! 6. [`runner`]: periodic driver with cycle statistics
//!
//! ## Zero-Allocation Cycle
//!
//! Registries are fixed-capacity and names in error payloads are inline
//! strings. `Kernel::step` neither allocates nor logs. `select_*` allocates
//! nothing in the kernel itself but logs its outcome through `tracing`, so
//! an installed subscriber may allocate; select from a non-RT thread when
//! that matters.

#![deny(clippy::disallowed_types)]

pub mod component;
pub mod data_object;
pub mod error;
pub mod event;
pub mod extension;
pub mod kernel;
pub mod name_server;
pub mod port;
pub mod registry;
pub mod runner;
pub mod sim;

pub use component::{
    AspectContext, Component, Controller, Effector, Estimator, Generator, Sensor, Support,
};
pub use data_object::{DataObject, DataSlots, KernelTypes};
pub use error::{ConfigurationError, KernelError, Rejected};
pub use event::StopHandle;
pub use extension::{Cascade, CascadeExtension, Extension};
pub use kernel::Kernel;
pub use name_server::NameServer;
pub use port::{ReadPort, WritePort};
pub use runner::{CycleStats, PeriodicRunner, RunnerError};
