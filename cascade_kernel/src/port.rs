//! Ports: directed bindings between a component and a data object.
//!
//! Direction is fixed by type. A role's port struct lists exactly the
//! channels that role reads ([`ReadPort`]) and writes ([`WritePort`]), so a
//! component cannot bind against the dataflow contract.
//!
//! Binding is idempotent per (port, data object); `disconnect` always
//! succeeds and leaves the stored value untouched.

use crate::data_object::{DataObject, DataSlots, KernelTypes};
use std::sync::Arc;

// ─── ReadPort / WritePort ───────────────────────────────────────────

/// Read side of a data-object binding.
pub struct ReadPort<T> {
    slot: Option<Arc<DataObject<T>>>,
}

impl<T: Copy> ReadPort<T> {
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Bind to `slot`, replacing any previous binding.
    pub fn read_from(&mut self, slot: &Arc<DataObject<T>>) {
        if let Some(current) = &self.slot {
            if Arc::ptr_eq(current, slot) {
                return;
            }
            current.remove_reader();
        }
        slot.add_reader();
        self.slot = Some(Arc::clone(slot));
    }

    /// Drop the binding to `slot`. No-op if bound elsewhere or unbound.
    pub fn disconnect(&mut self, slot: &Arc<DataObject<T>>) {
        if self.is_bound_to(slot) {
            slot.remove_reader();
            self.slot = None;
        }
    }

    pub fn is_connected(&self) -> bool {
        self.slot.is_some()
    }

    pub fn is_bound_to(&self, slot: &Arc<DataObject<T>>) -> bool {
        self.slot.as_ref().is_some_and(|s| Arc::ptr_eq(s, slot))
    }

    /// Latest value, or `None` if unbound or the read kept colliding with
    /// a writer.
    #[inline]
    pub fn get(&self) -> Option<T> {
        self.slot.as_ref().and_then(|s| s.try_get())
    }

    /// Completed writes of the bound object. `None` if unbound.
    pub fn version(&self) -> Option<u64> {
        self.slot.as_ref().map(|s| s.version())
    }
}

impl<T: Copy + Default> ReadPort<T> {
    #[inline]
    pub fn get_or_default(&self) -> T {
        self.get().unwrap_or_default()
    }
}

impl<T: Copy> Default for ReadPort<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write side of a data-object binding.
pub struct WritePort<T> {
    slot: Option<Arc<DataObject<T>>>,
}

impl<T: Copy> WritePort<T> {
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Bind to `slot`, replacing any previous binding.
    pub fn write_to(&mut self, slot: &Arc<DataObject<T>>) {
        if let Some(current) = &self.slot {
            if Arc::ptr_eq(current, slot) {
                return;
            }
            current.remove_writer();
        }
        slot.add_writer();
        self.slot = Some(Arc::clone(slot));
    }

    /// Drop the binding to `slot`. No-op if bound elsewhere or unbound.
    pub fn disconnect(&mut self, slot: &Arc<DataObject<T>>) {
        if self.is_bound_to(slot) {
            slot.remove_writer();
            self.slot = None;
        }
    }

    pub fn is_connected(&self) -> bool {
        self.slot.is_some()
    }

    pub fn is_bound_to(&self, slot: &Arc<DataObject<T>>) -> bool {
        self.slot.as_ref().is_some_and(|s| Arc::ptr_eq(s, slot))
    }

    /// Publish `value`. `false` if unbound or another write is in flight.
    #[inline]
    pub fn set(&self, value: T) -> bool {
        self.slot.as_ref().is_some_and(|s| s.set(value))
    }

    /// Read back the bound value.
    #[inline]
    pub fn get(&self) -> Option<T> {
        self.slot.as_ref().and_then(|s| s.try_get())
    }
}

impl<T: Copy> Default for WritePort<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Role Port Sets ─────────────────────────────────────────────────

/// Sensor: writes Inputs.
pub struct SensorPorts<K: KernelTypes> {
    pub inputs: WritePort<K::Input>,
}

/// Estimator: reads Inputs, writes Models.
pub struct EstimatorPorts<K: KernelTypes> {
    pub inputs: ReadPort<K::Input>,
    pub models: WritePort<K::Model>,
}

/// Generator: reads Models, Inputs and Commands, writes SetPoints.
pub struct GeneratorPorts<K: KernelTypes> {
    pub models: ReadPort<K::Model>,
    pub inputs: ReadPort<K::Input>,
    pub commands: ReadPort<K::Command>,
    pub setpoints: WritePort<K::SetPoint>,
}

/// Controller: reads SetPoints, Models and Inputs, writes Outputs.
pub struct ControllerPorts<K: KernelTypes> {
    pub setpoints: ReadPort<K::SetPoint>,
    pub models: ReadPort<K::Model>,
    pub inputs: ReadPort<K::Input>,
    pub outputs: WritePort<K::Output>,
}

/// Effector: reads Outputs.
pub struct EffectorPorts<K: KernelTypes> {
    pub outputs: ReadPort<K::Output>,
}

/// Bind / unbind a whole port set against the kernel's current slots.
///
/// `connect` binds in declaration order, `disconnect` releases in reverse.
pub trait PortSet<K: KernelTypes> {
    fn connect(&mut self, slots: &DataSlots<K>);
    fn disconnect(&mut self, slots: &DataSlots<K>);
    /// Every port of the set is bound to the matching slot.
    fn is_wired_to(&self, slots: &DataSlots<K>) -> bool;
    /// No port of the set is bound.
    fn is_unwired(&self) -> bool;
}

impl<K: KernelTypes> PortSet<K> for SensorPorts<K> {
    fn connect(&mut self, slots: &DataSlots<K>) {
        self.inputs.write_to(&slots.inputs);
    }
    fn disconnect(&mut self, slots: &DataSlots<K>) {
        self.inputs.disconnect(&slots.inputs);
    }
    fn is_wired_to(&self, slots: &DataSlots<K>) -> bool {
        self.inputs.is_bound_to(&slots.inputs)
    }
    fn is_unwired(&self) -> bool {
        !self.inputs.is_connected()
    }
}

impl<K: KernelTypes> PortSet<K> for EstimatorPorts<K> {
    fn connect(&mut self, slots: &DataSlots<K>) {
        self.inputs.read_from(&slots.inputs);
        self.models.write_to(&slots.models);
    }
    fn disconnect(&mut self, slots: &DataSlots<K>) {
        self.models.disconnect(&slots.models);
        self.inputs.disconnect(&slots.inputs);
    }
    fn is_wired_to(&self, slots: &DataSlots<K>) -> bool {
        self.inputs.is_bound_to(&slots.inputs) && self.models.is_bound_to(&slots.models)
    }
    fn is_unwired(&self) -> bool {
        !self.inputs.is_connected() && !self.models.is_connected()
    }
}

impl<K: KernelTypes> PortSet<K> for GeneratorPorts<K> {
    fn connect(&mut self, slots: &DataSlots<K>) {
        self.models.read_from(&slots.models);
        self.inputs.read_from(&slots.inputs);
        self.commands.read_from(&slots.commands);
        self.setpoints.write_to(&slots.setpoints);
    }
    fn disconnect(&mut self, slots: &DataSlots<K>) {
        self.setpoints.disconnect(&slots.setpoints);
        self.commands.disconnect(&slots.commands);
        self.inputs.disconnect(&slots.inputs);
        self.models.disconnect(&slots.models);
    }
    fn is_wired_to(&self, slots: &DataSlots<K>) -> bool {
        self.models.is_bound_to(&slots.models)
            && self.inputs.is_bound_to(&slots.inputs)
            && self.commands.is_bound_to(&slots.commands)
            && self.setpoints.is_bound_to(&slots.setpoints)
    }
    fn is_unwired(&self) -> bool {
        !self.models.is_connected()
            && !self.inputs.is_connected()
            && !self.commands.is_connected()
            && !self.setpoints.is_connected()
    }
}

impl<K: KernelTypes> PortSet<K> for ControllerPorts<K> {
    fn connect(&mut self, slots: &DataSlots<K>) {
        self.setpoints.read_from(&slots.setpoints);
        self.models.read_from(&slots.models);
        self.inputs.read_from(&slots.inputs);
        self.outputs.write_to(&slots.outputs);
    }
    fn disconnect(&mut self, slots: &DataSlots<K>) {
        self.outputs.disconnect(&slots.outputs);
        self.inputs.disconnect(&slots.inputs);
        self.models.disconnect(&slots.models);
        self.setpoints.disconnect(&slots.setpoints);
    }
    fn is_wired_to(&self, slots: &DataSlots<K>) -> bool {
        self.setpoints.is_bound_to(&slots.setpoints)
            && self.models.is_bound_to(&slots.models)
            && self.inputs.is_bound_to(&slots.inputs)
            && self.outputs.is_bound_to(&slots.outputs)
    }
    fn is_unwired(&self) -> bool {
        !self.setpoints.is_connected()
            && !self.models.is_connected()
            && !self.inputs.is_connected()
            && !self.outputs.is_connected()
    }
}

impl<K: KernelTypes> PortSet<K> for EffectorPorts<K> {
    fn connect(&mut self, slots: &DataSlots<K>) {
        self.outputs.read_from(&slots.outputs);
    }
    fn disconnect(&mut self, slots: &DataSlots<K>) {
        self.outputs.disconnect(&slots.outputs);
    }
    fn is_wired_to(&self, slots: &DataSlots<K>) -> bool {
        self.outputs.is_bound_to(&slots.outputs)
    }
    fn is_unwired(&self) -> bool {
        !self.outputs.is_connected()
    }
}

macro_rules! port_set_default {
    ($ty:ident { $($field:ident: $port:ident),+ }) => {
        impl<K: KernelTypes> $ty<K> {
            pub const fn new() -> Self {
                Self { $($field: $port::new()),+ }
            }
        }

        impl<K: KernelTypes> Default for $ty<K> {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

port_set_default!(SensorPorts { inputs: WritePort });
port_set_default!(EstimatorPorts { inputs: ReadPort, models: WritePort });
port_set_default!(GeneratorPorts {
    models: ReadPort,
    inputs: ReadPort,
    commands: ReadPort,
    setpoints: WritePort
});
port_set_default!(ControllerPorts {
    setpoints: ReadPort,
    models: ReadPort,
    inputs: ReadPort,
    outputs: WritePort
});
port_set_default!(EffectorPorts { outputs: ReadPort });

// ─── Tests ──────────────────────────────────────────────────────────
