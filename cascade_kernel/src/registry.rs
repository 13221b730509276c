//! Per-role component registries.
//!
//! [`RoleRegistry`] backs the five single-selection roles: an always-present
//! default, a fixed-capacity list of loaded components and the active
//! selection. [`SupportSet`] backs the Support role, whose members are all
//! active at once.
//!
//! Registries only store and look up. Wiring, aspect hooks and the
//! running-state checks live in the kernel.

use crate::component::{Component, Support};
use cascade_common::consts::{MAX_COMPONENTS_PER_ROLE, MAX_SUPPORTS};

/// Which component of a role is active (or targeted).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Default,
    Loaded(usize),
}

// ─── RoleRegistry ───────────────────────────────────────────────────

pub struct RoleRegistry<C: ?Sized> {
    default: Box<C>,
    loaded: heapless::Vec<Box<C>, MAX_COMPONENTS_PER_ROLE>,
    active: Slot,
}

impl<C: ?Sized + Component> RoleRegistry<C> {
    pub fn new(default: Box<C>) -> Self {
        Self {
            default,
            loaded: heapless::Vec::new(),
            active: Slot::Default,
        }
    }

    /// Resolve `name`, including the default component.
    pub fn find(&self, name: &str) -> Option<Slot> {
        if self.default.name() == name {
            return Some(Slot::Default);
        }
        self.loaded
            .iter()
            .position(|c| c.name() == name)
            .map(Slot::Loaded)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn is_full(&self) -> bool {
        self.loaded.is_full()
    }

    /// Loaded components, default excluded.
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// Append a component. Hands it back if the registry is full.
    pub fn push(&mut self, component: Box<C>) -> Result<(), Box<C>> {
        self.loaded.push(component)
    }

    /// Remove a loaded component, keeping the active selection pointing at
    /// the same component. `None` for the default, the active component or
    /// an out-of-range index.
    pub fn remove(&mut self, index: usize) -> Option<Box<C>> {
        if index >= self.loaded.len() || self.active == Slot::Loaded(index) {
            return None;
        }
        let removed = self.loaded.remove(index);
        if let Slot::Loaded(active) = self.active {
            if active > index {
                self.active = Slot::Loaded(active - 1);
            }
        }
        Some(removed)
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut C> {
        match slot {
            Slot::Default => Some(&mut *self.default),
            Slot::Loaded(i) => self.loaded.get_mut(i).map(|c| &mut **c),
        }
    }

    pub fn active_slot(&self) -> Slot {
        self.active
    }

    pub fn active(&self) -> &C {
        match self.active {
            Slot::Loaded(i) => match self.loaded.get(i) {
                Some(c) => &**c,
                None => &*self.default,
            },
            Slot::Default => &*self.default,
        }
    }

    pub fn active_mut(&mut self) -> &mut C {
        match self.active {
            Slot::Loaded(i) if i < self.loaded.len() => &mut *self.loaded[i],
            _ => &mut *self.default,
        }
    }

    /// Point the selection at `slot`. Ignored if `slot` does not exist.
    pub fn set_active(&mut self, slot: Slot) {
        match slot {
            Slot::Loaded(i) if i >= self.loaded.len() => {}
            _ => self.active = slot,
        }
    }

    /// Every component of the role, default first.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut C> {
        core::iter::once(&mut *self.default).chain(self.loaded.iter_mut().map(|c| &mut **c))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        core::iter::once(self.default.name()).chain(self.loaded.iter().map(|c| c.name()))
    }
}

// ─── SupportSet ─────────────────────────────────────────────────────

/// Loaded Support components, in registration order.
pub struct SupportSet {
    members: heapless::Vec<Box<dyn Support>, MAX_SUPPORTS>,
}

impl SupportSet {
    pub const fn new() -> Self {
        Self {
            members: heapless::Vec::new(),
        }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|c| c.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn is_full(&self) -> bool {
        self.members.is_full()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn push(&mut self, component: Box<dyn Support>) -> Result<(), Box<dyn Support>> {
        self.members.push(component)
    }

    pub fn remove(&mut self, index: usize) -> Option<Box<dyn Support>> {
        (index < self.members.len()).then(|| self.members.remove(index))
    }

    pub fn as_mut_slice(&mut self) -> &mut [Box<dyn Support>] {
        self.members.as_mut_slice()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|c| c.name())
    }
}

impl Default for SupportSet {
    fn default() -> Self {
        Self::new()
    }
}
