//! # Cascade Transport
//!
//! The contract between a kernel's data objects and anything that moves
//! their values across a process or host boundary, plus a remote command
//! surface over kernel selection.
//!
//! - [`marshal`]: per-type transporters (value ⇄ external representation),
//!   a type-erased form that narrows untyped data objects, and a registry
//!   keyed by type name. The JSON transporter is a reference implementation;
//!   the kernel itself never sees a wire format.
//! - [`reflection`]: introspectable `select*` commands and `using*` queries
//!   dispatched by name against a kernel.

pub mod error;
pub mod marshal;
pub mod reflection;

pub use error::{TransportError, TransportResult};
pub use marshal::{ErasedTransporter, JsonTransporter, TransporterRegistry, TypeTransporter};
pub use reflection::{MethodInfo, MethodKind, Request, Response};
