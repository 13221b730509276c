//! Periodic runner: cycle limits, stop requests, overrun policies and the
//! simulated axis closing its loop.

use super::{Calls, Ints};
use cascade_common::config::{KernelConfig, OverrunPolicy};
use cascade_common::state::KernelState;
use cascade_kernel::component::{Component, Controller};
use cascade_kernel::kernel::Kernel;
use cascade_kernel::name_server::NameServer;
use cascade_kernel::port::ControllerPorts;
use cascade_kernel::runner::PeriodicRunner;
use cascade_kernel::sim::{
    AxisCommand, Heartbeat, PiController, PiGains, Plant, PlantEffector, PlantSensor,
    RampGenerator, SimTypes, VelocityEstimator, register_axis,
};
use cascade_kernel::CascadeExtension;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

// ─── Helpers ────────────────────────────────────────────────────────

fn fast_config(policy: OverrunPolicy, max_cycles: Option<u64>) -> KernelConfig {
    let mut config = KernelConfig::default();
    config.kernel.period_us = 100;
    config.runner.overrun_policy = policy;
    config.runner.max_cycles = max_cycles;
    config
}

/// Controller whose calculate takes far longer than the test period.
struct Sluggish {
    ports: ControllerPorts<Ints>,
    calls: Arc<Calls>,
}

impl Component for Sluggish {
    fn name(&self) -> &str {
        "Sluggish"
    }
    fn calculate(&mut self) {
        self.calls.cycles.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(2));
    }
}

impl Controller<Ints> for Sluggish {
    fn ports(&mut self) -> &mut ControllerPorts<Ints> {
        &mut self.ports
    }
}

fn sluggish_runner(
    policy: OverrunPolicy,
    cycles: u64,
) -> (PeriodicRunner<Ints, CascadeExtension>, Arc<Calls>) {
    let config = fast_config(policy, Some(cycles));
    let mut kernel: Kernel<Ints> = Kernel::with_config(&config, CascadeExtension::new()).unwrap();
    let calls = Arc::new(Calls::default());
    kernel
        .load_controller(Box::new(Sluggish {
            ports: ControllerPorts::new(),
            calls: Arc::clone(&calls),
        }))
        .unwrap();
    kernel.initialize().unwrap();
    kernel.select_controller("Sluggish").unwrap();
    (PeriodicRunner::new(kernel, &config.runner), calls)
}

// ─── Tests ──────────────────────────────────────────────────────────

#[test]
fn runner_stops_at_cycle_limit_and_finalizes() {
    let config = fast_config(OverrunPolicy::Ignore, Some(25));
    let kernel: Kernel<Ints> = Kernel::with_config(&config, CascadeExtension::new()).unwrap();
    let mut runner = PeriodicRunner::new(kernel, &config.runner);

    let stats = runner.run().unwrap();
    assert_eq!(stats.cycle_count, 25);
    assert!(stats.min_cycle_ns <= stats.max_cycle_ns);
    assert_eq!(runner.kernel().state(), KernelState::Stopped);
    assert_eq!(runner.kernel().extension().cycles(), 25);
}

#[test]
fn stop_request_from_another_thread_ends_run() {
    let config = fast_config(OverrunPolicy::Ignore, None);
    let kernel: Kernel<Ints> = Kernel::with_config(&config, CascadeExtension::new()).unwrap();
    let mut runner = PeriodicRunner::new(kernel, &config.runner);
    let stop = runner.stop_handle();

    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        stop.request();
    });
    let stats = runner.run().unwrap();
    stopper.join().unwrap();

    assert!(stats.cycle_count > 0);
    assert_eq!(runner.kernel().state(), KernelState::Stopped);
    assert!(!runner.stop_handle().is_requested());
}

#[test]
fn abort_policy_falls_back_to_defaults_after_overrun() {
    let (mut runner, calls) = sluggish_runner(OverrunPolicy::Abort, 5);
    let stats = runner.run().unwrap();

    assert!(runner.was_aborted());
    assert!(stats.overruns >= 1);
    assert_eq!(stats.cycle_count, 5);
    // Only the first cycle ran the sluggish controller.
    assert_eq!(calls.cycles(), 1);
    assert!(runner.kernel().is_selected_controller("DefaultController"));
}

#[test]
fn ignore_policy_keeps_running_through_overruns() {
    let (mut runner, calls) = sluggish_runner(OverrunPolicy::Ignore, 3);
    let stats = runner.run().unwrap();

    assert!(!runner.was_aborted());
    assert_eq!(stats.overruns, 3);
    assert_eq!(calls.cycles(), 3);
}

#[test]
fn simulated_axis_reaches_commanded_target() {
    let config = fast_config(OverrunPolicy::Ignore, Some(3000));
    let plant = Arc::new(Plant::new(200.0));
    let mut names = NameServer::new();
    let beats = register_axis(&mut names, &plant, PiGains::default());

    let mut kernel: Kernel<SimTypes> =
        Kernel::with_config(&config, CascadeExtension::new()).unwrap();
    kernel.load_sensor_named(&mut names, PlantSensor::NAME).unwrap();
    kernel.load_estimator_named(&mut names, VelocityEstimator::NAME).unwrap();
    kernel.load_generator_named(&mut names, RampGenerator::NAME).unwrap();
    kernel.load_controller_named(&mut names, PiController::NAME).unwrap();
    kernel.load_effector_named(&mut names, PlantEffector::NAME).unwrap();
    kernel.load_support_named(&mut names, Heartbeat::NAME).unwrap();

    kernel.initialize().unwrap();
    kernel.select_sensor(PlantSensor::NAME).unwrap();
    kernel.select_estimator(VelocityEstimator::NAME).unwrap();
    kernel.select_generator(RampGenerator::NAME).unwrap();
    kernel.select_controller(PiController::NAME).unwrap();
    kernel.select_effector(PlantEffector::NAME).unwrap();
    kernel.commands().set(AxisCommand {
        target: 10.0,
        max_velocity: 0.0,
    });

    let mut runner = PeriodicRunner::new(kernel, &config.runner);
    let stats = runner.run().unwrap();

    assert_eq!(stats.cycle_count, 3000);
    assert_eq!(beats.load(Ordering::Relaxed), 3000);
    assert!(
        (plant.position() - 10.0).abs() < 0.5,
        "axis settled at {}",
        plant.position()
    );
    // Finalize deselected the effector, which stops the drive.
    assert_eq!(plant.velocity(), 0.0);
}

#[test]
fn runner_built_from_config_file() {
    use cascade_common::config::ConfigLoader;

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("kernel.toml");
    std::fs::write(
        &path,
        r#"
[shared]
service_name = "axis-x"

[kernel]
name = "AxisX"
period_us = 200

[kernel.prefixes]
outputs = "drive"

[runner]
overrun_policy = "ignore"
max_cycles = 10
"#,
    )
    .unwrap();

    let config = KernelConfig::load(&path).unwrap();
    config.validate().unwrap();
    let kernel: Kernel<Ints> = Kernel::with_config(&config, CascadeExtension::new()).unwrap();
    assert_eq!(kernel.period(), Duration::from_micros(200));
    assert_eq!(kernel.outputs().prefix(), "drive");

    let mut runner = PeriodicRunner::new(kernel, &config.runner);
    assert_eq!(runner.run().unwrap().cycle_count, 10);
}
