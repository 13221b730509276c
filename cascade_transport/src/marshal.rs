//! Data-object marshaling.
//!
//! A transporter converts between a data object's value and an external
//! representation ([`Repr`]). The typed contract is [`TypeTransporter`];
//! [`ErasedTransporter`] is the same contract over `dyn Any` objects, for
//! transports that only know a type by name. Narrowing to the wrong value
//! type fails cleanly and is logged; it never panics.

use crate::error::{TransportError, TransportResult};
use cascade_kernel::data_object::{DataObject, DataSlots, KernelTypes};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error};

/// External representation of a value.
pub type Repr = serde_json::Value;

// ─── Typed Contract ─────────────────────────────────────────────────

pub trait TypeTransporter<T: Copy>: Send + Sync {
    /// Representation of the current value of `source`.
    fn create_repr(&self, source: &DataObject<T>) -> TransportResult<Repr>;

    /// Standalone value decoded from `repr`.
    fn create_value(&self, repr: &Repr) -> TransportResult<T>;

    /// Decode `repr` and publish it into `target`.
    ///
    /// `false` if `repr` does not decode or a write was already in flight;
    /// `target` is untouched in both cases.
    fn update_from_repr(&self, repr: &Repr, target: &DataObject<T>) -> bool {
        match self.create_value(repr) {
            Ok(value) => target.set(value),
            Err(e) => {
                debug!(target_object = target.name(), error = %e, "representation rejected");
                false
            }
        }
    }
}

/// Reference transporter: values as JSON through serde.
pub struct JsonTransporter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonTransporter<T> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonTransporter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> core::fmt::Debug for JsonTransporter<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "JsonTransporter<{}>", type_name::<T>())
    }
}

impl<T> TypeTransporter<T> for JsonTransporter<T>
where
    T: Copy + Serialize + DeserializeOwned,
{
    fn create_repr(&self, source: &DataObject<T>) -> TransportResult<Repr> {
        Ok(serde_json::to_value(source.get())?)
    }

    fn create_value(&self, repr: &Repr) -> TransportResult<T> {
        Ok(serde_json::from_value(repr.clone())?)
    }
}

// ─── Type-Erased Contract ───────────────────────────────────────────

/// [`TypeTransporter`] over untyped objects.
///
/// Sources and targets may be a `DataObject<T>` or an `Arc<DataObject<T>>`.
pub trait ErasedTransporter: Send + Sync {
    /// Name of the value type this transporter handles.
    fn type_name(&self) -> &'static str;

    fn create_repr(&self, source: &dyn Any) -> TransportResult<Repr>;

    /// `false` on a type mismatch, an undecodable `repr` or a concurrent
    /// write.
    fn update_from_repr(&self, repr: &Repr, target: &dyn Any) -> bool;
}

fn narrow<T: 'static>(object: &dyn Any) -> Option<&DataObject<T>> {
    object
        .downcast_ref::<DataObject<T>>()
        .or_else(|| object.downcast_ref::<Arc<DataObject<T>>>().map(|a| &**a))
}

impl<T> ErasedTransporter for JsonTransporter<T>
where
    T: Copy + Serialize + DeserializeOwned + 'static,
{
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn create_repr(&self, source: &dyn Any) -> TransportResult<Repr> {
        match narrow::<T>(source) {
            Some(object) => TypeTransporter::create_repr(self, object),
            None => {
                error!(expected = type_name::<T>(), "failed to narrow source data object");
                Err(TransportError::TypeMismatch {
                    expected: type_name::<T>(),
                })
            }
        }
    }

    fn update_from_repr(&self, repr: &Repr, target: &dyn Any) -> bool {
        match narrow::<T>(target) {
            Some(object) => TypeTransporter::update_from_repr(self, repr, object),
            None => {
                error!(expected = type_name::<T>(), "failed to narrow target data object");
                false
            }
        }
    }
}

// ─── Registry ───────────────────────────────────────────────────────

/// Transporters keyed by value type name.
#[derive(Default)]
pub struct TransporterRegistry {
    transporters: HashMap<&'static str, Box<dyn ErasedTransporter>>,
}

impl TransporterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with JSON transporters for the five value types
    /// of `K`.
    pub fn for_kernel<K>() -> Self
    where
        K: KernelTypes,
        K::Command: Serialize + DeserializeOwned,
        K::SetPoint: Serialize + DeserializeOwned,
        K::Input: Serialize + DeserializeOwned,
        K::Model: Serialize + DeserializeOwned,
        K::Output: Serialize + DeserializeOwned,
    {
        let mut registry = Self::new();
        registry.register_json::<K::Command>();
        registry.register_json::<K::SetPoint>();
        registry.register_json::<K::Input>();
        registry.register_json::<K::Model>();
        registry.register_json::<K::Output>();
        registry
    }

    /// Register `transporter` under its type name. `false` if one is
    /// already registered for that type.
    pub fn insert(&mut self, transporter: Box<dyn ErasedTransporter>) -> bool {
        let name = transporter.type_name();
        if self.transporters.contains_key(name) {
            return false;
        }
        self.transporters.insert(name, transporter);
        true
    }

    pub fn register_json<T>(&mut self) -> bool
    where
        T: Copy + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.insert(Box::new(JsonTransporter::<T>::new()))
    }

    pub fn get(&self, type_name: &str) -> Option<&dyn ErasedTransporter> {
        self.transporters.get(type_name).map(|t| &**t)
    }

    pub fn get_for<T: 'static>(&self) -> Option<&dyn ErasedTransporter> {
        self.get(type_name::<T>())
    }

    /// Marshal `source` with the transporter registered as `type_name`.
    pub fn create_repr(&self, type_name: &str, source: &dyn Any) -> TransportResult<Repr> {
        self.get(type_name)
            .ok_or_else(|| TransportError::UnknownType(type_name.to_string()))?
            .create_repr(source)
    }

    /// Update `target` with the transporter registered as `type_name`.
    pub fn update_from_repr(&self, type_name: &str, repr: &Repr, target: &dyn Any) -> bool {
        match self.get(type_name) {
            Some(transporter) => transporter.update_from_repr(repr, target),
            None => {
                error!(type_name, "no transporter registered");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.transporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transporters.is_empty()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.transporters.keys().copied()
    }
}

// ─── Snapshots ──────────────────────────────────────────────────────

/// Current values of all five data objects, keyed by object name.
pub fn snapshot<K>(slots: &DataSlots<K>) -> TransportResult<serde_json::Map<String, Repr>>
where
    K: KernelTypes,
    K::Command: Serialize,
    K::SetPoint: Serialize,
    K::Input: Serialize,
    K::Model: Serialize,
    K::Output: Serialize,
{
    fn entry<T: Copy + Serialize>(
        map: &mut serde_json::Map<String, Repr>,
        object: &DataObject<T>,
    ) -> TransportResult<()> {
        map.insert(object.name().to_string(), serde_json::to_value(object.get())?);
        Ok(())
    }

    let mut map = serde_json::Map::new();
    entry(&mut map, &slots.commands)?;
    entry(&mut map, &slots.setpoints)?;
    entry(&mut map, &slots.inputs)?;
    entry(&mut map, &slots.models)?;
    entry(&mut map, &slots.outputs)?;
    Ok(map)
}
