//! Simulated single-axis plant and a reference component set.
//!
//! The plant is a velocity-driven axis: the effector commands a velocity
//! (clamped to the axis limit), the plant integrates it into position once
//! per cycle. The remaining components close the loop:
//!
//! ```text
//! PlantSensor ─Inputs─▶ VelocityEstimator ─Models─▶ RampGenerator
//!                                   Commands ───────────┘   │
//!                                                       SetPoints
//!                                                           ▼
//!                     PlantEffector ◀─Outputs─ PiController
//! ```
//!
//! All components take their sample time from the kernel period handed to
//! them when their aspect is enabled.

use crate::component::{
    AspectContext, Component, Controller, Effector, Estimator, Generator, Sensor, Support,
};
use crate::data_object::KernelTypes;
use crate::name_server::NameServer;
use crate::port::{ControllerPorts, EffectorPorts, EstimatorPorts, GeneratorPorts, SensorPorts};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

// ─── Value Types ────────────────────────────────────────────────────

/// Motion request from outside the cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisCommand {
    /// Target position [mm].
    pub target: f64,
    /// Velocity limit for the move [mm/s]; 0 selects the axis default.
    pub max_velocity: f64,
}

/// Trajectory sample produced by the generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisSetPoint {
    pub position: f64,
    pub velocity: f64,
}

/// Raw measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisInput {
    pub position: f64,
}

/// Estimated axis state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisModel {
    pub position: f64,
    pub velocity: f64,
}

/// Drive command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisOutput {
    pub velocity: f64,
}

/// Type family of the simulated axis.
#[derive(Debug)]
pub enum SimTypes {}

impl KernelTypes for SimTypes {
    type Command = AxisCommand;
    type SetPoint = AxisSetPoint;
    type Input = AxisInput;
    type Model = AxisModel;
    type Output = AxisOutput;
}

// ─── Plant ──────────────────────────────────────────────────────────

/// Shared axis state. Lock-free: `f64` values stored as bits.
#[derive(Debug)]
pub struct Plant {
    position: AtomicU64,
    velocity: AtomicU64,
    max_velocity: f64,
}

impl Plant {
    pub fn new(max_velocity: f64) -> Self {
        Self {
            position: AtomicU64::new(0f64.to_bits()),
            velocity: AtomicU64::new(0f64.to_bits()),
            max_velocity: max_velocity.abs(),
        }
    }

    pub fn position(&self) -> f64 {
        f64::from_bits(self.position.load(Ordering::Acquire))
    }

    pub fn velocity(&self) -> f64 {
        f64::from_bits(self.velocity.load(Ordering::Acquire))
    }

    pub fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    pub fn set_position(&self, position: f64) {
        self.position.store(position.to_bits(), Ordering::Release);
    }

    /// Apply `velocity` for `dt` seconds.
    pub fn drive(&self, velocity: f64, dt: f64) {
        let v = velocity.clamp(-self.max_velocity, self.max_velocity);
        self.velocity.store(v.to_bits(), Ordering::Release);
        self.set_position(self.position() + v * dt);
    }
}

fn sample_time(ctx: &AspectContext<'_>) -> Option<f64> {
    let dt = ctx.period.as_secs_f64();
    (dt > 0.0).then_some(dt)
}

// ─── Sensor ─────────────────────────────────────────────────────────

pub struct PlantSensor {
    plant: Arc<Plant>,
    ports: SensorPorts<SimTypes>,
    sample: AxisInput,
}

impl PlantSensor {
    pub const NAME: &'static str = "PlantSensor";

    pub fn new(plant: Arc<Plant>) -> Self {
        Self {
            plant,
            ports: SensorPorts::new(),
            sample: AxisInput::default(),
        }
    }
}

impl Component for PlantSensor {
    fn name(&self) -> &str {
        Self::NAME
    }
    fn pull(&mut self) {
        self.sample.position = self.plant.position();
    }
    fn push(&mut self) {
        self.ports.inputs.set(self.sample);
    }
}

impl Sensor<SimTypes> for PlantSensor {
    fn ports(&mut self) -> &mut SensorPorts<SimTypes> {
        &mut self.ports
    }
}

// ─── Estimator ──────────────────────────────────────────────────────

/// Position pass-through with backward-difference velocity.
#[derive(Default)]
pub struct VelocityEstimator {
    ports: EstimatorPorts<SimTypes>,
    dt: f64,
    input: AxisInput,
    model: AxisModel,
    primed: bool,
}

impl VelocityEstimator {
    pub const NAME: &'static str = "VelocityEstimator";

    pub fn new() -> Self {
        Self::default()
    }
}

impl Component for VelocityEstimator {
    fn name(&self) -> &str {
        Self::NAME
    }
    fn enable_aspect(&mut self, ctx: &AspectContext<'_>) -> bool {
        match sample_time(ctx) {
            Some(dt) => {
                self.dt = dt;
                true
            }
            None => false,
        }
    }
    fn startup(&mut self) -> bool {
        self.primed = false;
        true
    }
    fn pull(&mut self) {
        if let Some(input) = self.ports.inputs.get() {
            self.input = input;
        }
    }
    fn calculate(&mut self) {
        let velocity = if self.primed {
            (self.input.position - self.model.position) / self.dt
        } else {
            0.0
        };
        self.model = AxisModel {
            position: self.input.position,
            velocity,
        };
        self.primed = true;
    }
    fn push(&mut self) {
        self.ports.models.set(self.model);
    }
}

impl Estimator<SimTypes> for VelocityEstimator {
    fn ports(&mut self) -> &mut EstimatorPorts<SimTypes> {
        &mut self.ports
    }
}

// ─── Generator ──────────────────────────────────────────────────────

/// Constant-velocity ramp from the current setpoint towards the commanded
/// target.
pub struct RampGenerator {
    ports: GeneratorPorts<SimTypes>,
    default_velocity: f64,
    dt: f64,
    command: AxisCommand,
    setpoint: AxisSetPoint,
}

impl RampGenerator {
    pub const NAME: &'static str = "RampGenerator";

    pub fn new(default_velocity: f64) -> Self {
        Self {
            ports: GeneratorPorts::new(),
            default_velocity: default_velocity.abs(),
            dt: 0.0,
            command: AxisCommand::default(),
            setpoint: AxisSetPoint::default(),
        }
    }
}

impl Component for RampGenerator {
    fn name(&self) -> &str {
        Self::NAME
    }
    fn enable_aspect(&mut self, ctx: &AspectContext<'_>) -> bool {
        match sample_time(ctx) {
            Some(dt) => {
                self.dt = dt;
                true
            }
            None => false,
        }
    }
    /// Bumpless start from the estimated position.
    fn startup(&mut self) -> bool {
        let here = self.ports.models.get_or_default().position;
        self.setpoint = AxisSetPoint {
            position: here,
            velocity: 0.0,
        };
        self.command = AxisCommand {
            target: here,
            max_velocity: 0.0,
        };
        true
    }
    fn pull(&mut self) {
        // Commands holds its default until first written.
        if self.ports.commands.version().is_some_and(|v| v > 0) {
            if let Some(command) = self.ports.commands.get() {
                self.command = command;
            }
        }
    }
    fn calculate(&mut self) {
        let limit = if self.command.max_velocity > 0.0 {
            self.command.max_velocity
        } else {
            self.default_velocity
        };
        let max_step = limit * self.dt;
        let remaining = self.command.target - self.setpoint.position;
        let step = remaining.clamp(-max_step, max_step);
        self.setpoint.position += step;
        self.setpoint.velocity = if self.dt > 0.0 { step / self.dt } else { 0.0 };
    }
    fn push(&mut self) {
        self.ports.setpoints.set(self.setpoint);
    }
}

impl Generator<SimTypes> for RampGenerator {
    fn ports(&mut self) -> &mut GeneratorPorts<SimTypes> {
        &mut self.ports
    }
}

// ─── Controller ─────────────────────────────────────────────────────

/// PI gains with output limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PiGains {
    pub kp: f64,
    pub ki: f64,
    /// Output saturation [mm/s].
    pub out_max: f64,
}

impl Default for PiGains {
    fn default() -> Self {
        Self {
            kp: 40.0,
            ki: 5.0,
            out_max: 200.0,
        }
    }
}

/// Velocity feed-forward plus PI on position error, with conditional
/// integration as anti-windup.
pub struct PiController {
    ports: ControllerPorts<SimTypes>,
    gains: PiGains,
    dt: f64,
    integral: f64,
    setpoint: AxisSetPoint,
    model: AxisModel,
    output: AxisOutput,
}

impl PiController {
    pub const NAME: &'static str = "PiController";

    pub fn new(gains: PiGains) -> Self {
        Self {
            ports: ControllerPorts::new(),
            gains,
            dt: 0.0,
            integral: 0.0,
            setpoint: AxisSetPoint::default(),
            model: AxisModel::default(),
            output: AxisOutput::default(),
        }
    }
}

impl Component for PiController {
    fn name(&self) -> &str {
        Self::NAME
    }
    fn enable_aspect(&mut self, ctx: &AspectContext<'_>) -> bool {
        match sample_time(ctx) {
            Some(dt) if self.gains.out_max > 0.0 => {
                self.dt = dt;
                true
            }
            _ => false,
        }
    }
    fn startup(&mut self) -> bool {
        self.integral = 0.0;
        true
    }
    fn pull(&mut self) {
        if let Some(sp) = self.ports.setpoints.get() {
            self.setpoint = sp;
        }
        if let Some(model) = self.ports.models.get() {
            self.model = model;
        }
    }
    fn calculate(&mut self) {
        let error = self.setpoint.position - self.model.position;
        let unsat = self.setpoint.velocity + self.gains.kp * error + self.gains.ki * self.integral;
        let out = unsat.clamp(-self.gains.out_max, self.gains.out_max);
        // Integrate only while unsaturated or when the error pulls back.
        if out == unsat || error.signum() != unsat.signum() {
            self.integral += error * self.dt;
        }
        self.output.velocity = out;
    }
    fn push(&mut self) {
        self.ports.outputs.set(self.output);
    }
}

impl Controller<SimTypes> for PiController {
    fn ports(&mut self) -> &mut ControllerPorts<SimTypes> {
        &mut self.ports
    }
}

// ─── Effector ───────────────────────────────────────────────────────

pub struct PlantEffector {
    plant: Arc<Plant>,
    ports: EffectorPorts<SimTypes>,
    dt: f64,
    output: AxisOutput,
}

impl PlantEffector {
    pub const NAME: &'static str = "PlantEffector";

    pub fn new(plant: Arc<Plant>) -> Self {
        Self {
            plant,
            ports: EffectorPorts::new(),
            dt: 0.0,
            output: AxisOutput::default(),
        }
    }
}

impl Component for PlantEffector {
    fn name(&self) -> &str {
        Self::NAME
    }
    fn enable_aspect(&mut self, ctx: &AspectContext<'_>) -> bool {
        match sample_time(ctx) {
            Some(dt) => {
                self.dt = dt;
                true
            }
            None => false,
        }
    }
    /// Drive stops when the effector is deselected.
    fn shutdown(&mut self) {
        self.plant.drive(0.0, 0.0);
    }
    fn pull(&mut self) {
        if let Some(output) = self.ports.outputs.get() {
            self.output = output;
        }
    }
    fn push(&mut self) {
        self.plant.drive(self.output.velocity, self.dt);
    }
}

impl Effector<SimTypes> for PlantEffector {
    fn ports(&mut self) -> &mut EffectorPorts<SimTypes> {
        &mut self.ports
    }
}

// ─── Support ────────────────────────────────────────────────────────

/// Counts cycles while the kernel runs.
pub struct Heartbeat {
    beats: Arc<AtomicU64>,
}

impl Heartbeat {
    pub const NAME: &'static str = "Heartbeat";

    pub fn new() -> Self {
        Self {
            beats: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared counter, readable from any thread.
    pub fn counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.beats)
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Heartbeat {
    fn name(&self) -> &str {
        Self::NAME
    }
    fn startup(&mut self) -> bool {
        self.beats.store(0, Ordering::Relaxed);
        true
    }
    fn calculate(&mut self) {
        self.beats.fetch_add(1, Ordering::Relaxed);
    }
}

impl Support for Heartbeat {}

// ─── Assembly ───────────────────────────────────────────────────────

/// Register the full reference component set under their `NAME`s.
///
/// Returns the heartbeat counter.
pub fn register_axis(
    names: &mut NameServer<SimTypes>,
    plant: &Arc<Plant>,
    gains: PiGains,
) -> Arc<AtomicU64> {
    let heartbeat = Heartbeat::new();
    let beats = heartbeat.counter();
    let _ = names.sensors.register(Box::new(PlantSensor::new(Arc::clone(plant))));
    let _ = names.estimators.register(Box::new(VelocityEstimator::new()));
    let _ = names
        .generators
        .register(Box::new(RampGenerator::new(plant.max_velocity() / 2.0)));
    let _ = names.controllers.register(Box::new(PiController::new(gains)));
    let _ = names.effectors.register(Box::new(PlantEffector::new(Arc::clone(plant))));
    let _ = names.supports.register(Box::new(heartbeat));
    beats
}

static_assertions::assert_impl_all!(crate::kernel::Kernel<SimTypes>: Send);
static_assertions::assert_impl_all!(Plant: Send, Sync);
