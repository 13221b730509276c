//! Component contract, role traits and the default no-op components.
//!
//! A component is a [`Component`] plus exactly one role trait. The role trait
//! hands the kernel the component's port set; which channels it reads and
//! writes is therefore a property of the role, never of the instance.
//!
//! ## Hook Discipline
//!
//! `startup`/`shutdown` run synchronously inside `select` while the kernel is
//! running. `pull`/`calculate`/`push` run inside `step`. All of them must be
//! bounded-time and must not allocate.

use crate::data_object::{DataSlots, KernelTypes};
use crate::port::{
    ControllerPorts, EffectorPorts, EstimatorPorts, GeneratorPorts, PortSet, SensorPorts,
};
use cascade_common::role::RoleKind;
use std::time::Duration;

// ─── Component ──────────────────────────────────────────────────────

/// Runtime facts handed to a component when its aspect is enabled.
#[derive(Debug, Clone, Copy)]
pub struct AspectContext<'a> {
    pub kernel_name: &'a str,
    pub role: RoleKind,
    pub period: Duration,
}

/// Lifecycle and execution hooks shared by every role.
///
/// Identity within a role is the component name.
pub trait Component: Send {
    fn name(&self) -> &str;

    /// Called once at load, after the ports are bound. Returning `false`
    /// rejects the load; the kernel then unbinds every port.
    fn enable_aspect(&mut self, _ctx: &AspectContext<'_>) -> bool {
        true
    }

    /// Called once at unload, before the ports are released.
    fn disable_aspect(&mut self) {}

    /// Called when the component becomes active. `false` refuses activation.
    fn startup(&mut self) -> bool {
        true
    }

    /// Called when the component stops being active.
    fn shutdown(&mut self) {}

    /// Read phase: sample bound inputs.
    fn pull(&mut self) {}

    /// Compute phase.
    fn calculate(&mut self) {}

    /// Write phase: publish to bound outputs.
    fn push(&mut self) {}
}

// ─── Roles ──────────────────────────────────────────────────────────

pub trait Sensor<K: KernelTypes>: Component {
    fn ports(&mut self) -> &mut SensorPorts<K>;
}

pub trait Estimator<K: KernelTypes>: Component {
    fn ports(&mut self) -> &mut EstimatorPorts<K>;
}

pub trait Generator<K: KernelTypes>: Component {
    fn ports(&mut self) -> &mut GeneratorPorts<K>;
}

pub trait Controller<K: KernelTypes>: Component {
    fn ports(&mut self) -> &mut ControllerPorts<K>;
}

pub trait Effector<K: KernelTypes>: Component {
    fn ports(&mut self) -> &mut EffectorPorts<K>;
}

/// Auxiliary component: no data-object ports, every loaded Support runs
/// every cycle.
pub trait Support: Component {}

// ─── Wiring ─────────────────────────────────────────────────────────

/// Role-generic access used by the registry: the role tag and how to bind
/// the role's port set.
pub trait Wiring<K: KernelTypes>: Component {
    const ROLE: RoleKind;
    fn wire(&mut self, slots: &DataSlots<K>);
    fn unwire(&mut self, slots: &DataSlots<K>);
}

macro_rules! role_wiring {
    ($role_trait:ident, $kind:expr) => {
        impl<K: KernelTypes> Wiring<K> for dyn $role_trait<K> {
            const ROLE: RoleKind = $kind;
            fn wire(&mut self, slots: &DataSlots<K>) {
                self.ports().connect(slots);
            }
            fn unwire(&mut self, slots: &DataSlots<K>) {
                self.ports().disconnect(slots);
            }
        }
    };
}

role_wiring!(Sensor, RoleKind::Sensor);
role_wiring!(Estimator, RoleKind::Estimator);
role_wiring!(Generator, RoleKind::Generator);
role_wiring!(Controller, RoleKind::Controller);
role_wiring!(Effector, RoleKind::Effector);

impl<K: KernelTypes> Wiring<K> for dyn Support {
    const ROLE: RoleKind = RoleKind::Support;
    fn wire(&mut self, _slots: &DataSlots<K>) {}
    fn unwire(&mut self, _slots: &DataSlots<K>) {}
}

// ─── Defaults ───────────────────────────────────────────────────────

macro_rules! default_component {
    ($(#[$doc:meta])* $name:ident, $role_trait:ident, $ports:ident, $kind:expr) => {
        $(#[$doc])*
        pub struct $name<K: KernelTypes> {
            ports: $ports<K>,
        }

        impl<K: KernelTypes> $name<K> {
            pub const fn new() -> Self {
                Self { ports: $ports::new() }
            }
        }

        impl<K: KernelTypes> Default for $name<K> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<K: KernelTypes> Component for $name<K> {
            fn name(&self) -> &str {
                $kind.default_component_name()
            }
        }

        impl<K: KernelTypes> $role_trait<K> for $name<K> {
            fn ports(&mut self) -> &mut $ports<K> {
                &mut self.ports
            }
        }
    };
}

default_component!(
    /// Writes nothing; Inputs keep their last value.
    DefaultSensor, Sensor, SensorPorts, RoleKind::Sensor
);
default_component!(
    /// Writes nothing; Models keep their last value.
    DefaultEstimator, Estimator, EstimatorPorts, RoleKind::Estimator
);
default_component!(
    /// Writes nothing; SetPoints keep their last value.
    DefaultGenerator, Generator, GeneratorPorts, RoleKind::Generator
);
default_component!(
    /// Writes nothing; Outputs keep their last value.
    DefaultController, Controller, ControllerPorts, RoleKind::Controller
);
default_component!(
    /// Ignores Outputs.
    DefaultEffector, Effector, EffectorPorts, RoleKind::Effector
);
