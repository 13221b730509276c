//! Lifecycle: construction, initialize / finalize, events, extension
//! failures and stop requests.

use super::{ConstController, CountingSupport, Ints};
use cascade_common::role::RoleKind;
use cascade_common::state::KernelState;
use cascade_kernel::error::{ConfigurationError, KernelError};
use cascade_kernel::extension::{Cascade, Extension};
use cascade_kernel::kernel::Kernel;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

// ─── Helpers ────────────────────────────────────────────────────────

/// Strategy whose initialize always fails.
struct RefusingExtension;

impl Extension<Ints> for RefusingExtension {
    fn initialize(&mut self, _cascade: &mut Cascade<'_, Ints>) -> bool {
        false
    }
    fn step(&mut self, _cascade: &mut Cascade<'_, Ints>) {}
}

fn assert_one_active_per_role(kernel: &Kernel<Ints, impl Extension<Ints>>) {
    for role in RoleKind::CASCADE {
        let active = kernel.active_name(role).expect("single-selection role");
        assert!(kernel.is_loaded(role, active));
        let selected = kernel
            .loaded_names(role)
            .into_iter()
            .filter(|name| kernel.is_selected(role, name))
            .count();
        assert_eq!(selected, 1, "{role} must have exactly one active component");
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[test]
fn exactly_one_active_component_through_the_lifecycle() {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    assert_one_active_per_role(&kernel);

    kernel.load_controller(ConstController::new("PI", 3).boxed()).unwrap();
    assert_one_active_per_role(&kernel);

    kernel.initialize().unwrap();
    kernel.select_controller("PI").unwrap();
    assert_one_active_per_role(&kernel);
    assert_eq!(kernel.active_controller_name(), "PI");

    kernel.finalize().unwrap();
    assert_one_active_per_role(&kernel);
    assert_eq!(kernel.active_controller_name(), "DefaultController");
}

#[test]
fn started_and_stopped_events_fire_once_per_transition() {
    let started = Arc::new(AtomicU32::new(0));
    let stopped = Arc::new(AtomicU32::new(0));
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    {
        let started = Arc::clone(&started);
        kernel.on_started(move |name| {
            assert_eq!(name, "Axis");
            started.fetch_add(1, Ordering::SeqCst);
        });
        let stopped = Arc::clone(&stopped);
        kernel.on_stopped(move |_| {
            stopped.fetch_add(1, Ordering::SeqCst);
        });
    }

    kernel.initialize().unwrap();
    assert_eq!(kernel.state(), KernelState::Running);
    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(stopped.load(Ordering::SeqCst), 0);

    kernel.finalize().unwrap();
    assert_eq!(kernel.state(), KernelState::Stopped);
    assert_eq!(stopped.load(Ordering::SeqCst), 1);

    kernel.initialize().unwrap();
    assert_eq!(started.load(Ordering::SeqCst), 2);
}

#[test]
fn extension_init_failure_shuts_down_each_support_once() {
    let mut kernel: Kernel<Ints, RefusingExtension> =
        Kernel::with_extension("Axis", RefusingExtension);
    let a = CountingSupport::new("A");
    let b = CountingSupport::new("B");
    let (a_calls, b_calls) = (Arc::clone(&a.calls), Arc::clone(&b.calls));
    kernel.load_support(a.boxed()).unwrap();
    kernel.load_support(b.boxed()).unwrap();

    let err = kernel.initialize().unwrap_err();
    assert_eq!(err, KernelError::ExtensionInitFailure);
    assert!(!err.is_recoverable());
    assert_eq!(kernel.state(), KernelState::Stopped);

    for calls in [&a_calls, &b_calls] {
        assert_eq!(calls.startups(), 1);
        assert_eq!(calls.shutdowns(), 1);
    }
}

#[test]
fn support_startup_failure_rolls_back_started_supports() {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    let good = CountingSupport::new("Good");
    let bad = CountingSupport::refusing_startup("Bad");
    let (good_calls, bad_calls) = (Arc::clone(&good.calls), Arc::clone(&bad.calls));
    kernel.load_support(good.boxed()).unwrap();
    kernel.load_support(bad.boxed()).unwrap();

    let err = kernel.initialize().unwrap_err();
    assert!(matches!(
        err,
        KernelError::StartupFailure {
            role: RoleKind::Support,
            ref name,
            ..
        } if name.as_str() == "Bad"
    ));
    assert_eq!(kernel.state(), KernelState::Stopped);
    assert_eq!(good_calls.shutdowns(), 1);
    assert_eq!(bad_calls.shutdowns(), 0);
}

#[test]
fn supports_run_every_cycle_and_stop_in_finalize() {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    let hb = CountingSupport::new("Heartbeat");
    let calls = Arc::clone(&hb.calls);
    kernel.load_support(hb.boxed()).unwrap();
    assert_eq!(kernel.support_count(), 1);

    kernel.initialize().unwrap();
    for _ in 0..5 {
        kernel.step();
    }
    kernel.finalize().unwrap();

    assert_eq!(calls.cycles(), 5);
    assert_eq!(calls.startups(), 1);
    assert_eq!(calls.shutdowns(), 1);
}

#[test]
fn load_while_running_fails_and_succeeds_after_finalize() {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    kernel.initialize().unwrap();

    let rejected = kernel
        .load_controller(ConstController::new("PI", 1).boxed())
        .unwrap_err();
    assert!(matches!(
        rejected.error,
        KernelError::Configuration(ConfigurationError::KernelRunning(KernelState::Running))
    ));
    assert!(!kernel.is_loaded_controller("PI"));
    assert_eq!(kernel.loaded_names(RoleKind::Controller), ["DefaultController"]);

    kernel.finalize().unwrap();
    kernel.load_controller(rejected.component).unwrap();
    assert!(kernel.is_loaded_controller("PI"));
}

#[test]
fn unload_while_running_fails() {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    kernel.load_controller(ConstController::new("PI", 1).boxed()).unwrap();
    kernel.initialize().unwrap();
    assert!(matches!(
        kernel.unload_controller("PI"),
        Err(KernelError::Configuration(ConfigurationError::KernelRunning(_)))
    ));
    assert!(kernel.is_loaded_controller("PI"));
}

#[test]
fn stop_request_reverts_to_defaults_at_next_step() {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    let pi = ConstController::new("PI", 9);
    let calls = Arc::clone(&pi.calls);
    kernel.load_controller(pi.boxed()).unwrap();
    kernel.initialize().unwrap();
    kernel.select_controller("PI").unwrap();
    kernel.step();
    assert_eq!(calls.cycles(), 1);

    let stop = kernel.stop_handle();
    std::thread::spawn(move || stop.request()).join().unwrap();
    assert!(!kernel.is_running());

    kernel.step();
    assert_eq!(calls.cycles(), 1);
    assert_eq!(calls.shutdowns(), 1);
    assert!(kernel.is_selected_controller("DefaultController"));

    kernel.finalize().unwrap();
    assert!(!kernel.stop_handle().is_requested());
}

#[test]
fn abort_falls_back_to_defaults_until_reinitialized() {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    kernel.load_controller(ConstController::new("PI", 9).boxed()).unwrap();
    kernel.initialize().unwrap();
    kernel.select_controller("PI").unwrap();

    kernel.abort();
    assert!(!kernel.is_running());
    kernel.step();
    assert!(kernel.is_selected_controller("DefaultController"));
    assert_eq!(kernel.state(), KernelState::Running);

    kernel.finalize().unwrap();
    kernel.initialize().unwrap();
    assert!(kernel.is_running());
}
