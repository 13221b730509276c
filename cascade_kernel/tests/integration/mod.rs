//! Shared fixtures: an `i32` type family and instrumented components.

mod hot_swap;
mod lifecycle;
mod runner;
mod wiring;

use cascade_kernel::component::{AspectContext, Component, Controller, Generator, Support};
use cascade_kernel::data_object::KernelTypes;
use cascade_kernel::port::{ControllerPorts, GeneratorPorts};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

pub struct Ints;

impl KernelTypes for Ints {
    type Command = i32;
    type SetPoint = i32;
    type Input = i32;
    type Model = i32;
    type Output = i32;
}

/// Hook call counters, shared with the test body.
#[derive(Default)]
pub struct Calls {
    pub enables: AtomicU32,
    pub disables: AtomicU32,
    pub startups: AtomicU32,
    pub shutdowns: AtomicU32,
    pub cycles: AtomicU32,
}

impl Calls {
    pub fn startups(&self) -> u32 {
        self.startups.load(Ordering::SeqCst)
    }
    pub fn shutdowns(&self) -> u32 {
        self.shutdowns.load(Ordering::SeqCst)
    }
    pub fn cycles(&self) -> u32 {
        self.cycles.load(Ordering::SeqCst)
    }
}

// ─── Controller ─────────────────────────────────────────────────────

/// Writes a constant to Outputs every cycle.
pub struct ConstController {
    name: &'static str,
    value: i32,
    ports: ControllerPorts<Ints>,
    pub calls: Arc<Calls>,
    accept_aspect: bool,
    accept_startup: Arc<AtomicBool>,
}

impl ConstController {
    pub fn new(name: &'static str, value: i32) -> Self {
        Self {
            name,
            value,
            ports: ControllerPorts::new(),
            calls: Arc::new(Calls::default()),
            accept_aspect: true,
            accept_startup: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn rejecting_aspect(mut self) -> Self {
        self.accept_aspect = false;
        self
    }

    /// Flip to make the next `startup` fail.
    pub fn startup_gate(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.accept_startup)
    }

    pub fn boxed(self) -> Box<dyn Controller<Ints>> {
        Box::new(self)
    }
}

impl Component for ConstController {
    fn name(&self) -> &str {
        self.name
    }
    fn enable_aspect(&mut self, _ctx: &AspectContext<'_>) -> bool {
        self.calls.enables.fetch_add(1, Ordering::SeqCst);
        self.accept_aspect
    }
    fn disable_aspect(&mut self) {
        self.calls.disables.fetch_add(1, Ordering::SeqCst);
    }
    fn startup(&mut self) -> bool {
        self.calls.startups.fetch_add(1, Ordering::SeqCst);
        self.accept_startup.load(Ordering::SeqCst)
    }
    fn shutdown(&mut self) {
        self.calls.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
    fn calculate(&mut self) {
        self.calls.cycles.fetch_add(1, Ordering::SeqCst);
    }
    fn push(&mut self) {
        self.ports.outputs.set(self.value);
    }
}

impl Controller<Ints> for ConstController {
    fn ports(&mut self) -> &mut ControllerPorts<Ints> {
        &mut self.ports
    }
}

// ─── Generator ──────────────────────────────────────────────────────

/// Copies Commands to SetPoints; optionally rejects its aspect.
pub struct EchoGenerator {
    ports: GeneratorPorts<Ints>,
    accept_aspect: bool,
    command: i32,
}

impl EchoGenerator {
    pub const NAME: &'static str = "Echo";

    pub fn new() -> Self {
        Self {
            ports: GeneratorPorts::new(),
            accept_aspect: true,
            command: 0,
        }
    }

    pub fn rejecting_aspect() -> Self {
        Self {
            accept_aspect: false,
            ..Self::new()
        }
    }
}

impl Component for EchoGenerator {
    fn name(&self) -> &str {
        Self::NAME
    }
    fn enable_aspect(&mut self, _ctx: &AspectContext<'_>) -> bool {
        self.accept_aspect
    }
    fn pull(&mut self) {
        self.command = self.ports.commands.get_or_default();
    }
    fn push(&mut self) {
        self.ports.setpoints.set(self.command);
    }
}

impl Generator<Ints> for EchoGenerator {
    fn ports(&mut self) -> &mut GeneratorPorts<Ints> {
        &mut self.ports
    }
}

// ─── Support ────────────────────────────────────────────────────────

pub struct CountingSupport {
    name: &'static str,
    pub calls: Arc<Calls>,
    accept_startup: bool,
}

impl CountingSupport {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            calls: Arc::new(Calls::default()),
            accept_startup: true,
        }
    }

    pub fn refusing_startup(name: &'static str) -> Self {
        Self {
            accept_startup: false,
            ..Self::new(name)
        }
    }

    pub fn boxed(self) -> Box<dyn Support> {
        Box::new(self)
    }
}

impl Component for CountingSupport {
    fn name(&self) -> &str {
        self.name
    }
    fn startup(&mut self) -> bool {
        self.calls.startups.fetch_add(1, Ordering::SeqCst);
        self.accept_startup
    }
    fn shutdown(&mut self) {
        self.calls.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
    fn calculate(&mut self) {
        self.calls.cycles.fetch_add(1, Ordering::SeqCst);
    }
}

impl Support for CountingSupport {}
