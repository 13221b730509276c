//! Name-keyed component directories for lookup by (role, name).
//!
//! The application wiring layer owns a [`NameServer`]: it registers
//! components by name, and the kernel's `*_named` operations take them out
//! on load and give them back on unload. Lookups allocate and hash; they
//! belong off the cycle path.

use crate::component::{Component, Controller, Effector, Estimator, Generator, Sensor, Support};
use crate::data_object::KernelTypes;
use std::collections::HashMap;

/// Components of one role, keyed by name.
pub struct Directory<C: ?Sized> {
    entries: HashMap<String, Box<C>>,
}

impl<C: ?Sized + Component> Directory<C> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register under the component's own name. Hands the component back if
    /// the name is taken.
    pub fn register(&mut self, component: Box<C>) -> Result<(), Box<C>> {
        let name = component.name();
        if self.entries.contains_key(name) {
            return Err(component);
        }
        self.entries.insert(name.to_string(), component);
        Ok(())
    }

    /// Remove and return the component registered as `name`.
    pub fn take(&mut self, name: &str) -> Option<Box<C>> {
        self.entries.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<C: ?Sized + Component> Default for Directory<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// One [`Directory`] per role.
pub struct NameServer<K: KernelTypes> {
    pub sensors: Directory<dyn Sensor<K>>,
    pub estimators: Directory<dyn Estimator<K>>,
    pub generators: Directory<dyn Generator<K>>,
    pub controllers: Directory<dyn Controller<K>>,
    pub effectors: Directory<dyn Effector<K>>,
    pub supports: Directory<dyn Support>,
}

impl<K: KernelTypes> NameServer<K> {
    pub fn new() -> Self {
        Self {
            sensors: Directory::new(),
            estimators: Directory::new(),
            generators: Directory::new(),
            controllers: Directory::new(),
            effectors: Directory::new(),
            supports: Directory::new(),
        }
    }
}

impl<K: KernelTypes> Default for NameServer<K> {
    fn default() -> Self {
        Self::new()
    }
}
