//! Kernel error taxonomy.
//!
//! All kernel operations report failure through `Result`; nothing unwinds
//! across the cycle boundary. Every failure is local and recoverable except
//! [`KernelError::ExtensionInitFailure`], which aborts the startup attempt.
//!
//! Names carried in errors are fixed-capacity strings so that a failing
//! `select` inside a running kernel does not allocate.

use crate::component::Component;
use cascade_common::config::ConfigError;
use cascade_common::consts::NAME_CAPACITY;
use cascade_common::role::RoleKind;
use cascade_common::state::KernelState;
use thiserror::Error;

/// Component name as carried in error payloads. Truncated to
/// [`NAME_CAPACITY`] bytes at a char boundary.
pub type ComponentName = heapless::String<NAME_CAPACITY>;

/// Copy `name` into a [`ComponentName`], truncating if needed.
pub fn component_name(name: &str) -> ComponentName {
    let mut out = ComponentName::new();
    for ch in name.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// Registry mutation or lookup refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("operation not allowed while the kernel is {0:?}")]
    KernelRunning(KernelState),

    #[error("operation requires a running kernel (state: {0:?})")]
    KernelNotRunning(KernelState),

    /// Stop requested or aborted; the kernel falls back to defaults at the
    /// next step and accepts selections again only after reinitializing.
    #[error("stop pending; selection refused until the kernel is reinitialized")]
    StopPending,

    #[error("{role} '{name}' is not loaded")]
    NotLoaded { role: RoleKind, name: ComponentName },

    #[error("{role} '{name}' is already loaded")]
    AlreadyLoaded { role: RoleKind, name: ComponentName },

    #[error("{role} '{name}' is not registered in the name server")]
    UnknownName { role: RoleKind, name: ComponentName },

    #[error("{role} registry is full")]
    RegistryFull { role: RoleKind },

    #[error("{role} '{name}' is the default component and cannot be unloaded")]
    DefaultComponent { role: RoleKind, name: ComponentName },

    #[error("{role} '{name}' is active and cannot be unloaded")]
    ActiveComponent { role: RoleKind, name: ComponentName },

    #[error("{role} components are not selectable")]
    NotSelectable { role: RoleKind },

    #[error("invalid kernel properties: {0}")]
    Properties(#[from] ConfigError),
}

/// Kernel operation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Aspect enable rejected at load; every port bound by the load was
    /// released again.
    #[error("{role} '{name}' rejected aspect enable; wiring rolled back")]
    WiringFailure { role: RoleKind, name: ComponentName },

    /// Component refused to start. `restored` reports whether the previously
    /// active component (or, during `initialize`, the rollback) came back up.
    #[error("{role} '{name}' failed to start (previous state restored: {restored})")]
    StartupFailure {
        role: RoleKind,
        name: ComponentName,
        restored: bool,
    },

    /// Execution strategy failed to initialize; all Support components were
    /// shut down and the kernel is `Stopped`.
    #[error("execution strategy failed to initialize")]
    ExtensionInitFailure,
}

impl KernelError {
    /// `false` only for failures that abort the current startup attempt.
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ExtensionInitFailure)
    }

    pub(crate) fn not_loaded(role: RoleKind, name: &str) -> Self {
        ConfigurationError::NotLoaded {
            role,
            name: component_name(name),
        }
        .into()
    }
}

/// A component handed back by a failed pointer-style load.
///
/// The kernel never drops a component it did not keep.
pub struct Rejected<C: ?Sized> {
    pub component: Box<C>,
    pub error: KernelError,
}

impl<C: ?Sized> Rejected<C> {
    pub(crate) fn new(component: Box<C>, error: impl Into<KernelError>) -> Self {
        Self {
            component,
            error: error.into(),
        }
    }

    /// Discard the component, keeping the error.
    pub fn into_error(self) -> KernelError {
        self.error
    }
}

impl<C: ?Sized + Component> core::fmt::Debug for Rejected<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Rejected")
            .field("component", &self.component.name())
            .field("error", &self.error)
            .finish()
    }
}

impl<C: ?Sized + Component> core::fmt::Display for Rejected<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} rejected: {}", self.component.name(), self.error)
    }
}

impl<C: ?Sized + Component> std::error::Error for Rejected<C> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<C: ?Sized> From<Rejected<C>> for KernelError {
    fn from(rejected: Rejected<C>) -> Self {
        rejected.error
    }
}
