//! Port wiring: load-time rollback, data-object substitution and named
//! operations through the name server.

use super::{ConstController, CountingSupport, EchoGenerator, Ints};
use cascade_common::config::KernelConfig;
use cascade_common::consts::MAX_COMPONENTS_PER_ROLE;
use cascade_common::role::{Channels, RoleKind};
use cascade_kernel::data_object::DataObject;
use cascade_kernel::error::{ConfigurationError, KernelError};
use cascade_kernel::kernel::Kernel;
use cascade_kernel::name_server::NameServer;
use cascade_kernel::port::PortSet;
use cascade_kernel::{CascadeExtension, Component, Generator};
use std::sync::Arc;
use std::sync::atomic::Ordering;

#[test]
fn rejected_aspect_leaves_no_bindings() {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    let slots = kernel.slots().clone();
    let before = (
        slots.models.reader_count(),
        slots.inputs.reader_count(),
        slots.commands.reader_count(),
        slots.setpoints.writer_count(),
    );

    let rejected = kernel
        .load_generator(Box::new(EchoGenerator::rejecting_aspect()))
        .unwrap_err();
    assert!(matches!(
        rejected.error,
        KernelError::WiringFailure { role: RoleKind::Generator, .. }
    ));

    let after = (
        slots.models.reader_count(),
        slots.inputs.reader_count(),
        slots.commands.reader_count(),
        slots.setpoints.writer_count(),
    );
    assert_eq!(before, after);
    let mut component = rejected.component;
    assert!(component.ports().is_unwired());
    assert!(!kernel.is_loaded_generator(EchoGenerator::NAME));
}

#[test]
fn rejected_aspect_is_reported_once() {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    let pi = ConstController::new("PI", 1).rejecting_aspect();
    let calls = Arc::clone(&pi.calls);
    assert!(kernel.load_controller(pi.boxed()).is_err());
    assert_eq!(calls.enables.load(Ordering::SeqCst), 1);
    assert_eq!(calls.disables.load(Ordering::SeqCst), 0);
}

#[test]
fn loaded_component_is_wired_to_current_slots() {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    kernel.load_generator(Box::new(EchoGenerator::new())).unwrap();
    // Default generator plus Echo.
    assert_eq!(kernel.commands().reader_count(), 2);
    assert_eq!(kernel.setpoints().writer_count(), 2);

    kernel.initialize().unwrap();
    kernel.select_generator(EchoGenerator::NAME).unwrap();
    kernel.commands().set(17);
    kernel.step();
    assert_eq!(kernel.setpoints().get(), 17);
}

#[test]
fn outputs_switch_from_local_to_external() {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    assert!(Arc::ptr_eq(kernel.outputs(), &kernel.local_slots().outputs));
    assert!(!kernel.is_external(Channels::OUTPUTS));

    kernel.load_controller(ConstController::new("PI", 5).boxed()).unwrap();
    let external = Arc::new(DataObject::new("Remote::Outputs", "remote", 0));
    kernel.set_outputs(Arc::clone(&external)).unwrap();

    assert!(Arc::ptr_eq(kernel.outputs(), &external));
    assert!(kernel.is_external(Channels::OUTPUTS));
    assert_eq!(kernel.external_channels(), Channels::OUTPUTS);
    // Every controller and effector moved over; the local object kept its value.
    assert_eq!(external.writer_count(), 2);
    assert_eq!(external.reader_count(), 1);
    assert_eq!(kernel.local_slots().outputs.writer_count(), 0);
    assert_eq!(kernel.local_slots().outputs.reader_count(), 0);

    kernel.initialize().unwrap();
    kernel.select_controller("PI").unwrap();
    kernel.step();
    assert_eq!(external.get(), 5);
    assert_eq!(kernel.local_slots().outputs.get(), 0);
}

#[test]
fn substitution_requires_stopped_kernel() {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    kernel.initialize().unwrap();
    let external = Arc::new(DataObject::new("Remote::Commands", "remote", 0));
    assert!(matches!(
        kernel.set_commands(external),
        Err(KernelError::Configuration(ConfigurationError::KernelRunning(_)))
    ));
    assert!(!kernel.is_external(Channels::COMMANDS));
}

#[test]
fn data_objects_take_names_and_prefixes_from_config() {
    let mut config = KernelConfig::default();
    config.kernel.name = "AxisX".to_string();
    config.kernel.prefixes.inputs = "plant".to_string();
    let kernel: Kernel<Ints> = Kernel::with_config(&config, CascadeExtension::new()).unwrap();

    assert_eq!(kernel.name(), "AxisX");
    assert_eq!(kernel.inputs().name(), "AxisX::Inputs");
    assert_eq!(kernel.inputs().prefix(), "plant");
    assert_eq!(kernel.setpoints().name(), "AxisX::SetPoints");
}

#[test]
fn named_load_and_unload_move_through_the_name_server() {
    let mut names = NameServer::<Ints>::new();
    names
        .controllers
        .register(ConstController::new("PI", 1).boxed())
        .ok()
        .unwrap();
    names
        .supports
        .register(CountingSupport::new("Heartbeat").boxed())
        .ok()
        .unwrap();

    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    kernel.load_controller_named(&mut names, "PI").unwrap();
    kernel.load_support_named(&mut names, "Heartbeat").unwrap();
    assert!(names.controllers.is_empty());
    assert!(kernel.is_loaded_controller("PI"));
    assert!(kernel.is_loaded(RoleKind::Support, "Heartbeat"));

    kernel.unload_controller_named(&mut names, "PI").unwrap();
    kernel.unload_support_named(&mut names, "Heartbeat").unwrap();
    assert!(names.controllers.contains("PI"));
    assert!(names.supports.contains("Heartbeat"));
    assert!(!kernel.is_loaded_support("Heartbeat"));
}

#[test]
fn unknown_name_fails_named_load() {
    let mut names = NameServer::<Ints>::new();
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    assert!(matches!(
        kernel.load_sensor_named(&mut names, "Encoder"),
        Err(KernelError::Configuration(ConfigurationError::UnknownName {
            role: RoleKind::Sensor,
            ..
        }))
    ));
}

#[test]
fn failed_named_load_returns_component_to_name_server() {
    let mut names = NameServer::<Ints>::new();
    names
        .controllers
        .register(ConstController::new("PI", 1).boxed())
        .ok()
        .unwrap();
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    kernel.initialize().unwrap();

    assert!(kernel.load_controller_named(&mut names, "PI").is_err());
    assert!(names.controllers.contains("PI"));
}

#[test]
fn finalize_makes_selected_component_unloadable() {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    kernel.load_controller(ConstController::new("PI", 1).boxed()).unwrap();
    kernel.initialize().unwrap();
    kernel.select_controller("PI").unwrap();
    // Finalize reselects the default, so PI becomes unloadable.
    kernel.finalize().unwrap();
    let pi = kernel.unload_controller("PI").unwrap();
    assert_eq!(pi.name(), "PI");
}

#[test]
fn registry_capacity_is_enforced() {
    let mut kernel: Kernel<Ints> = Kernel::new("Axis");
    for i in 0..MAX_COMPONENTS_PER_ROLE {
        let name: &'static str = Box::leak(format!("C{i}").into_boxed_str());
        kernel.load_controller(ConstController::new(name, 0).boxed()).unwrap();
    }
    let rejected = kernel
        .load_controller(ConstController::new("Overflow", 0).boxed())
        .unwrap_err();
    assert_eq!(
        rejected.error,
        KernelError::Configuration(ConfigurationError::RegistryFull {
            role: RoleKind::Controller
        })
    );
    assert_eq!(kernel.loaded_names(RoleKind::Controller).len(), MAX_COMPONENTS_PER_ROLE + 1);
}
