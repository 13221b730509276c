//! # Cascade Kernel Runner
//!
//! Runs the simulated single-axis cascade at the configured period.
//!
//! Without `--config` the built-in defaults apply (1 ms period, overruns
//! ignored). The runner loads the reference components by name, selects
//! them, writes one move command and cycles until Ctrl-C or `--cycles`.

use cascade_common::config::{ConfigLoader, KernelConfig, LogLevel};
use cascade_kernel::kernel::Kernel;
use cascade_kernel::name_server::NameServer;
use cascade_kernel::runner::{PeriodicRunner, rt_setup};
use cascade_kernel::sim::{
    AxisCommand, Heartbeat, PiController, PiGains, Plant, PlantEffector, PlantSensor,
    RampGenerator, SimTypes, VelocityEstimator, register_axis,
};
use cascade_kernel::{CascadeExtension, KernelError};
use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Cascade Kernel: five-role control loop on a simulated axis
#[derive(Parser, Debug)]
#[command(name = "cascade_kernel")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Periodic five-role control kernel driving a simulated axis")]
struct Args {
    /// Path to the kernel configuration TOML.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// CPU core to pin the RT thread to (overrides the config file).
    #[arg(long)]
    cpu_core: Option<usize>,

    /// SCHED_FIFO priority (overrides the config file).
    #[arg(long)]
    rt_priority: Option<i32>,

    /// Stop after this many cycles (overrides the config file).
    #[arg(long)]
    cycles: Option<u64>,

    /// Target position of the move command [mm].
    #[arg(long, default_value_t = 100.0)]
    target: f64,

    /// Axis velocity limit [mm/s].
    #[arg(long, default_value_t = 200.0)]
    max_velocity: f64,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            setup_tracing(&args, LogLevel::default());
            error!("FATAL: {e}");
            process::exit(1);
        }
    };
    setup_tracing(&args, config.shared.log_level);

    info!(
        service = %config.shared.service_name,
        "Cascade Kernel v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run(&args, &config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Cascade Kernel shutdown complete");
}

fn load_config(args: &Args) -> Result<KernelConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => KernelConfig::load(path)?,
        None => KernelConfig::default(),
    };
    if let Some(core) = args.cpu_core {
        config.runner.cpu_core = core;
    }
    if let Some(priority) = args.rt_priority {
        config.runner.rt_priority = priority;
    }
    if args.cycles.is_some() {
        config.runner.max_cycles = args.cycles;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: &Args, config: &KernelConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Config OK: kernel={}, period={}µs",
        config.kernel.name, config.kernel.period_us
    );

    rt_setup(config.runner.cpu_core, config.runner.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        config.runner.cpu_core, config.runner.rt_priority
    );

    let mut kernel: Kernel<SimTypes> = Kernel::with_config(config, CascadeExtension::new())?;
    let plant = Arc::new(Plant::new(args.max_velocity));
    let mut names = NameServer::new();
    let beats = register_axis(&mut names, &plant, PiGains::default());

    kernel.load_sensor_named(&mut names, PlantSensor::NAME)?;
    kernel.load_estimator_named(&mut names, VelocityEstimator::NAME)?;
    kernel.load_generator_named(&mut names, RampGenerator::NAME)?;
    kernel.load_controller_named(&mut names, PiController::NAME)?;
    kernel.load_effector_named(&mut names, PlantEffector::NAME)?;
    kernel.load_support_named(&mut names, Heartbeat::NAME)?;

    kernel.on_started(|name| info!(kernel = name, "started"));
    kernel.on_stopped(|name| info!(kernel = name, "stopped"));

    kernel.initialize()?;
    select_axis(&mut kernel)?;
    kernel.commands().set(AxisCommand {
        target: args.target,
        max_velocity: 0.0,
    });

    let mut runner = PeriodicRunner::new(kernel, &config.runner);
    let stop = runner.stop_handle();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        stop.request();
    })?;

    let stats = runner.run()?;
    info!(
        cycles = stats.cycle_count,
        overruns = stats.overruns,
        heartbeat = beats.load(Ordering::Relaxed),
        position = plant.position(),
        aborted = runner.was_aborted(),
        "run complete"
    );
    Ok(())
}

/// Selection order follows the cascade so every component starts from an
/// already-running upstream.
fn select_axis(kernel: &mut Kernel<SimTypes>) -> Result<(), KernelError> {
    kernel.select_sensor(PlantSensor::NAME)?;
    kernel.select_estimator(VelocityEstimator::NAME)?;
    kernel.select_generator(RampGenerator::NAME)?;
    kernel.select_controller(PiController::NAME)?;
    kernel.select_effector(PlantEffector::NAME)?;
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()))
    };

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
