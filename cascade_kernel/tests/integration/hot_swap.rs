//! Hot-swapping active components while the kernel runs.

use super::{ConstController, Ints};
use cascade_common::role::RoleKind;
use cascade_common::state::KernelState;
use cascade_kernel::error::{ConfigurationError, KernelError};
use cascade_kernel::kernel::Kernel;
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn running_with(controllers: Vec<ConstController>) -> Kernel<Ints> {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    for c in controllers {
        kernel.load_controller(c.boxed()).unwrap();
    }
    kernel.initialize().unwrap();
    kernel
}

#[test]
fn select_unloaded_component_fails_and_keeps_active() {
    let mut kernel = running_with(vec![ConstController::new("A", 1)]);
    kernel.select_controller("A").unwrap();

    let err = kernel.select_controller("Missing").unwrap_err();
    assert!(matches!(
        err,
        KernelError::Configuration(ConfigurationError::NotLoaded {
            role: RoleKind::Controller,
            ref name,
        }) if name.as_str() == "Missing"
    ));
    assert_eq!(kernel.active_controller_name(), "A");
}

#[test]
fn select_requires_running_kernel() {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    kernel.load_controller(ConstController::new("A", 1).boxed()).unwrap();
    assert!(matches!(
        kernel.select_controller("A"),
        Err(KernelError::Configuration(ConfigurationError::KernelNotRunning(
            KernelState::Stopped
        )))
    ));
    assert!(kernel.is_selected_controller("DefaultController"));
}

#[test]
fn refused_startup_restores_previous_component() {
    let a = ConstController::new("A", 1);
    let b = ConstController::new("B", 2);
    let a_calls = Arc::clone(&a.calls);
    b.startup_gate().store(false, Ordering::SeqCst);
    let mut kernel = running_with(vec![a, b]);
    kernel.select_controller("A").unwrap();

    let err = kernel.select_controller("B").unwrap_err();
    assert_eq!(
        err,
        KernelError::StartupFailure {
            role: RoleKind::Controller,
            name: cascade_kernel::error::component_name("B"),
            restored: true,
        }
    );
    assert_eq!(kernel.active_controller_name(), "A");
    // Started on the first select and again on restoration.
    assert_eq!(a_calls.startups(), 2);
    assert_eq!(a_calls.shutdowns(), 1);

    kernel.step();
    assert_eq!(kernel.outputs().get(), 1);
}

#[test]
fn failed_restoration_is_reported() {
    let a = ConstController::new("A", 1);
    let b = ConstController::new("B", 2);
    let a_gate = a.startup_gate();
    b.startup_gate().store(false, Ordering::SeqCst);
    let mut kernel = running_with(vec![a, b]);
    kernel.select_controller("A").unwrap();

    a_gate.store(false, Ordering::SeqCst);
    assert!(matches!(
        kernel.select_controller("B"),
        Err(KernelError::StartupFailure { restored: false, .. })
    ));
    assert_eq!(kernel.active_controller_name(), "A");
}

#[test]
fn reselecting_active_component_restarts_it() {
    let a = ConstController::new("A", 1);
    let calls = Arc::clone(&a.calls);
    let mut kernel = running_with(vec![a]);
    kernel.select_controller("A").unwrap();
    kernel.select_controller("A").unwrap();
    assert_eq!(calls.startups(), 2);
    assert_eq!(calls.shutdowns(), 1);
    assert!(kernel.is_selected_controller("A"));
}

#[test]
fn select_after_abort_is_refused() {
    let a = ConstController::new("A", 1);
    let calls = Arc::clone(&a.calls);
    let mut kernel = running_with(vec![a]);

    kernel.abort();
    assert_eq!(kernel.state(), KernelState::Running);
    assert!(matches!(
        kernel.select_controller("A"),
        Err(KernelError::Configuration(ConfigurationError::StopPending))
    ));
    assert!(kernel.is_selected_controller("DefaultController"));
    assert_eq!(calls.startups(), 0);

    kernel.step();
    assert_eq!(calls.shutdowns(), 0);
    assert!(kernel.is_selected_controller("DefaultController"));
}

#[test]
fn select_after_stop_request_is_refused() {
    let mut kernel = running_with(vec![ConstController::new("A", 1)]);
    kernel.stop_handle().request();
    assert!(matches!(
        kernel.select(RoleKind::Controller, "A"),
        Err(KernelError::Configuration(ConfigurationError::StopPending))
    ));

    kernel.finalize().unwrap();
    kernel.initialize().unwrap();
    kernel.select_controller("A").unwrap();
    assert!(kernel.is_selected_controller("A"));
}

#[test]
fn value_survives_deselect_and_reselect() {
    let mut kernel = running_with(vec![ConstController::new("X", 42)]);
    kernel.select_controller("X").unwrap();
    kernel.step();
    assert_eq!(kernel.outputs().get(), 42);

    kernel.select_controller("DefaultController").unwrap();
    kernel.step();
    kernel.select_controller("X").unwrap();
    assert_eq!(kernel.outputs().get(), 42);
}

#[test]
fn only_the_active_component_runs() {
    let a = ConstController::new("A", 1);
    let b = ConstController::new("B", 2);
    let (a_calls, b_calls) = (Arc::clone(&a.calls), Arc::clone(&b.calls));
    let mut kernel = running_with(vec![a, b]);

    kernel.select(RoleKind::Controller, "A").unwrap();
    kernel.step();
    kernel.step();
    kernel.select(RoleKind::Controller, "B").unwrap();
    kernel.step();

    assert_eq!(a_calls.cycles(), 2);
    assert_eq!(b_calls.cycles(), 1);
    assert_eq!(kernel.outputs().get(), 2);
    assert!(kernel.is_selected(RoleKind::Controller, "B"));
    assert_eq!(kernel.active_name(RoleKind::Controller), Some("B"));
}
