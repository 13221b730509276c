//! Execution strategies.
//!
//! The kernel owns lifecycle and selection; an [`Extension`] owns the
//! per-cycle mechanics. [`CascadeExtension`] is the standard strategy: the
//! fixed Sensor → Estimator → Generator → Controller → Effector order with
//! every Support component run after the cascade.

use crate::component::{Controller, Effector, Estimator, Generator, Sensor, Support};
use crate::data_object::KernelTypes;
use crate::event::StopHandle;

/// Active component of every role for the duration of one call.
pub struct Cascade<'a, K: KernelTypes> {
    pub sensor: &'a mut dyn Sensor<K>,
    pub estimator: &'a mut dyn Estimator<K>,
    pub generator: &'a mut dyn Generator<K>,
    pub controller: &'a mut dyn Controller<K>,
    pub effector: &'a mut dyn Effector<K>,
    pub supports: &'a mut [Box<dyn Support>],
}

/// Pluggable execution mechanics composed into the kernel.
pub trait Extension<K: KernelTypes>: Send {
    /// Prepare for execution. `false` aborts `Kernel::initialize`.
    fn initialize(&mut self, _cascade: &mut Cascade<'_, K>) -> bool {
        true
    }

    /// One control cycle. Must not block or allocate.
    fn step(&mut self, cascade: &mut Cascade<'_, K>);

    fn finalize(&mut self, _cascade: &mut Cascade<'_, K>) {}

    /// Running predicate consulted before every step.
    fn is_running(&self) -> bool {
        true
    }

    /// Make the running predicate false until the next `initialize`.
    fn abort(&mut self) {}
}

/// Standard cascade strategy.
#[derive(Debug, Default)]
pub struct CascadeExtension {
    aborted: StopHandle,
    cycles: u64,
}

impl CascadeExtension {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that trips the abort flag from another thread.
    pub fn abort_handle(&self) -> StopHandle {
        self.aborted.clone()
    }

    /// Cycles executed since the last `initialize`.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

impl<K: KernelTypes> Extension<K> for CascadeExtension {
    fn initialize(&mut self, _cascade: &mut Cascade<'_, K>) -> bool {
        self.aborted.clear();
        self.cycles = 0;
        true
    }

    #[inline]
    fn step(&mut self, c: &mut Cascade<'_, K>) {
        c.sensor.pull();
        c.sensor.calculate();
        c.sensor.push();

        c.estimator.pull();
        c.estimator.calculate();
        c.estimator.push();

        c.generator.pull();
        c.generator.calculate();
        c.generator.push();

        c.controller.pull();
        c.controller.calculate();
        c.controller.push();

        c.effector.pull();
        c.effector.calculate();
        c.effector.push();

        for support in c.supports.iter_mut() {
            support.pull();
            support.calculate();
            support.push();
        }

        self.cycles += 1;
    }

    fn is_running(&self) -> bool {
        !self.aborted.is_requested()
    }

    fn abort(&mut self) {
        self.aborted.request();
    }
}
