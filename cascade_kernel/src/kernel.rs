//! The control kernel: data objects, per-role registries, selection and
//! the lifecycle state machine.
//!
//! ```text
//!   Stopped ──initialize──▶ Initializing ──ok──▶ Running ──finalize──▶ Finalizing ──▶ Stopped
//!                                │                  │
//!                                └──fail──▶ Stopped  └─ step() / select_*()
//! ```
//!
//! ## Rules
//!
//! - Every single-selection role has exactly one active component at all
//!   times; a no-op default is installed at construction.
//! - `load_*`/`unload_*` and data-object substitution require `Stopped`.
//! - `select_*` requires `Running`, a true running predicate and a loaded
//!   target. Reselecting the active component restarts it.
//! - `step` never blocks, allocates or logs. When the running predicate is
//!   false it reselects every default instead of running the cascade.
//!
//! A stop requested from another thread through [`StopHandle`] is observed
//! at the next step boundary; `finalize` then runs on the kernel's own
//! thread, so it never races an in-flight step.

use crate::component::{
    AspectContext, Component, Controller, DefaultController, DefaultEffector, DefaultEstimator,
    DefaultGenerator, DefaultSensor, Effector, Estimator, Generator, Sensor, Support, Wiring,
};
use crate::data_object::{DataObject, DataSlots, KernelTypes};
use crate::error::{ConfigurationError, KernelError, Rejected, component_name};
use crate::event::{Event, StopHandle};
use crate::extension::{Cascade, CascadeExtension, Extension};
use crate::name_server::NameServer;
use crate::registry::{RoleRegistry, Slot, SupportSet};
use cascade_common::config::{ChannelPrefixes, ConfigError, KernelConfig};
use cascade_common::consts::DEFAULT_PERIOD_US;
use cascade_common::role::{Channels, RoleKind};
use cascade_common::state::KernelState;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

// ─── Roles ──────────────────────────────────────────────────────────

/// Registries of all six roles.
struct Roles<K: KernelTypes> {
    sensors: RoleRegistry<dyn Sensor<K>>,
    estimators: RoleRegistry<dyn Estimator<K>>,
    generators: RoleRegistry<dyn Generator<K>>,
    controllers: RoleRegistry<dyn Controller<K>>,
    effectors: RoleRegistry<dyn Effector<K>>,
    supports: SupportSet,
}

impl<K: KernelTypes> Roles<K> {
    /// Defaults installed and wired to `slots`.
    fn new(slots: &DataSlots<K>) -> Self {
        let mut roles = Self {
            sensors: RoleRegistry::new(Box::new(DefaultSensor::<K>::new())),
            estimators: RoleRegistry::new(Box::new(DefaultEstimator::<K>::new())),
            generators: RoleRegistry::new(Box::new(DefaultGenerator::<K>::new())),
            controllers: RoleRegistry::new(Box::new(DefaultController::<K>::new())),
            effectors: RoleRegistry::new(Box::new(DefaultEffector::<K>::new())),
            supports: SupportSet::new(),
        };
        roles.wire_all(slots);
        roles
    }

    fn cascade(&mut self) -> Cascade<'_, K> {
        Cascade {
            sensor: self.sensors.active_mut(),
            estimator: self.estimators.active_mut(),
            generator: self.generators.active_mut(),
            controller: self.controllers.active_mut(),
            effector: self.effectors.active_mut(),
            supports: self.supports.as_mut_slice(),
        }
    }

    fn wire_all(&mut self, slots: &DataSlots<K>) {
        self.sensors.iter_mut().for_each(|c| c.wire(slots));
        self.estimators.iter_mut().for_each(|c| c.wire(slots));
        self.generators.iter_mut().for_each(|c| c.wire(slots));
        self.controllers.iter_mut().for_each(|c| c.wire(slots));
        self.effectors.iter_mut().for_each(|c| c.wire(slots));
    }

    fn unwire_all(&mut self, slots: &DataSlots<K>) {
        self.effectors.iter_mut().for_each(|c| c.unwire(slots));
        self.controllers.iter_mut().for_each(|c| c.unwire(slots));
        self.generators.iter_mut().for_each(|c| c.unwire(slots));
        self.estimators.iter_mut().for_each(|c| c.unwire(slots));
        self.sensors.iter_mut().for_each(|c| c.unwire(slots));
    }

    /// Reselect every default. Bounded: at most one shutdown and one
    /// startup per role.
    fn reset_to_defaults(&mut self) {
        reset_to_default(&mut self.sensors);
        reset_to_default(&mut self.estimators);
        reset_to_default(&mut self.generators);
        reset_to_default(&mut self.controllers);
        reset_to_default(&mut self.effectors);
    }

    fn start_supports(&mut self) -> Result<(), KernelError> {
        let supports = self.supports.as_mut_slice();
        for i in 0..supports.len() {
            if !supports[i].startup() {
                for started in supports[..i].iter_mut().rev() {
                    started.shutdown();
                }
                return Err(KernelError::StartupFailure {
                    role: RoleKind::Support,
                    name: component_name(supports[i].name()),
                    restored: true,
                });
            }
        }
        Ok(())
    }

    fn stop_supports(&mut self) {
        for support in self.supports.as_mut_slice().iter_mut().rev() {
            support.shutdown();
        }
    }
}

fn reset_to_default<C: ?Sized + Component>(registry: &mut RoleRegistry<C>) {
    if registry.active_slot() != Slot::Default {
        registry.active_mut().shutdown();
        registry.set_active(Slot::Default);
        registry.active_mut().startup();
    }
}

// ─── Registry Operations ────────────────────────────────────────────

/// Facts about the kernel needed by registry operations, borrowed apart
/// from the registries themselves.
struct Env<'a, K: KernelTypes> {
    name: &'a str,
    period: Duration,
    state: KernelState,
    slots: &'a DataSlots<K>,
}

fn load_into<K, C>(
    registry: &mut RoleRegistry<C>,
    env: &Env<'_, K>,
    mut component: Box<C>,
) -> Result<(), Rejected<C>>
where
    K: KernelTypes,
    C: ?Sized + Wiring<K>,
{
    let role = <C as Wiring<K>>::ROLE;
    if env.state != KernelState::Stopped {
        return Err(Rejected::new(
            component,
            ConfigurationError::KernelRunning(env.state),
        ));
    }
    if registry.contains(component.name()) {
        let name = component_name(component.name());
        return Err(Rejected::new(
            component,
            ConfigurationError::AlreadyLoaded { role, name },
        ));
    }
    if registry.is_full() {
        return Err(Rejected::new(
            component,
            ConfigurationError::RegistryFull { role },
        ));
    }

    component.wire(env.slots);
    let ctx = AspectContext {
        kernel_name: env.name,
        role,
        period: env.period,
    };
    if !component.enable_aspect(&ctx) {
        component.unwire(env.slots);
        warn!(
            kernel = env.name,
            %role,
            component = component.name(),
            "aspect enable rejected, load rolled back"
        );
        let name = component_name(component.name());
        return Err(Rejected::new(
            component,
            KernelError::WiringFailure { role, name },
        ));
    }

    let name = component_name(component.name());
    if let Err(mut component) = registry.push(component) {
        component.disable_aspect();
        component.unwire(env.slots);
        return Err(Rejected::new(
            component,
            ConfigurationError::RegistryFull { role },
        ));
    }
    info!(kernel = env.name, %role, component = %name, "loaded");
    Ok(())
}

fn unload_from<K, C>(
    registry: &mut RoleRegistry<C>,
    env: &Env<'_, K>,
    name: &str,
) -> Result<Box<C>, KernelError>
where
    K: KernelTypes,
    C: ?Sized + Wiring<K>,
{
    let role = <C as Wiring<K>>::ROLE;
    if env.state != KernelState::Stopped {
        return Err(ConfigurationError::KernelRunning(env.state).into());
    }
    let slot = registry
        .find(name)
        .ok_or_else(|| KernelError::not_loaded(role, name))?;
    let Slot::Loaded(index) = slot else {
        return Err(ConfigurationError::DefaultComponent {
            role,
            name: component_name(name),
        }
        .into());
    };
    if registry.active_slot() == slot {
        return Err(ConfigurationError::ActiveComponent {
            role,
            name: component_name(name),
        }
        .into());
    }

    if let Some(component) = registry.get_mut(slot) {
        component.disable_aspect();
        component.unwire(env.slots);
    }
    let component = registry
        .remove(index)
        .ok_or_else(|| KernelError::not_loaded(role, name))?;
    info!(kernel = env.name, %role, component = name, "unloaded");
    Ok(component)
}

/// Selection gate: the lifecycle state plus the running predicate.
#[derive(Clone, Copy)]
struct Gate {
    state: KernelState,
    running: bool,
}

/// Shut down the active component and start `name` in its place.
/// Reselecting the active component restarts it.
fn select_in<C>(
    registry: &mut RoleRegistry<C>,
    role: RoleKind,
    gate: Gate,
    name: &str,
) -> Result<(), KernelError>
where
    C: ?Sized + Component,
{
    if gate.state != KernelState::Running {
        return Err(ConfigurationError::KernelNotRunning(gate.state).into());
    }
    if !gate.running {
        return Err(ConfigurationError::StopPending.into());
    }
    let target = registry
        .find(name)
        .ok_or_else(|| KernelError::not_loaded(role, name))?;

    registry.active_mut().shutdown();
    let started = registry.get_mut(target).is_some_and(|c| c.startup());
    if started {
        registry.set_active(target);
    }
    if started && registry.active_slot() == target {
        debug!(%role, component = name, "selected");
        return Ok(());
    }

    let restored = registry.active_mut().startup();
    warn!(
        %role,
        component = name,
        previous = registry.active().name(),
        restored,
        "startup refused, previous component restarted"
    );
    Err(KernelError::StartupFailure {
        role,
        name: component_name(name),
        restored,
    })
}

// ─── Kernel ─────────────────────────────────────────────────────────

/// Five-role control kernel.
pub struct Kernel<K: KernelTypes, E: Extension<K> = CascadeExtension> {
    name: String,
    period: Duration,
    state: KernelState,
    local: DataSlots<K>,
    current: DataSlots<K>,
    external: Channels,
    roles: Roles<K>,
    extension: E,
    stop: StopHandle,
    started: Event,
    stopped: Event,
}

impl<K: KernelTypes> Kernel<K, CascadeExtension> {
    /// Kernel with the standard cascade strategy and default prefixes.
    pub fn new(name: &str) -> Self {
        Self::with_extension(name, CascadeExtension::new())
    }
}

impl<K: KernelTypes, E: Extension<K>> Kernel<K, E> {
    pub fn with_extension(name: &str, extension: E) -> Self {
        Self::build(
            name,
            Duration::from_micros(u64::from(DEFAULT_PERIOD_US)),
            &ChannelPrefixes::default(),
            extension,
        )
    }

    /// Kernel named, paced and prefixed from a validated `[kernel]` section.
    pub fn with_config(config: &KernelConfig, extension: E) -> Result<Self, ConfigError> {
        config.kernel.validate()?;
        Ok(Self::build(
            &config.kernel.name,
            Duration::from_micros(u64::from(config.kernel.period_us)),
            &config.kernel.prefixes,
            extension,
        ))
    }

    fn build(name: &str, period: Duration, prefixes: &ChannelPrefixes, extension: E) -> Self {
        let local = DataSlots::new(name, prefixes);
        let current = local.clone();
        let roles = Roles::new(&current);
        debug!(kernel = name, ?period, "kernel constructed");
        Self {
            name: name.to_string(),
            period,
            state: KernelState::Stopped,
            local,
            current,
            external: Channels::empty(),
            roles,
            extension,
            stop: StopHandle::new(),
            started: Event::new(),
            stopped: Event::new(),
        }
    }

    // ── Queries ──

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> KernelState {
        self.state
    }

    /// Running predicate: initialized, no stop requested, and the execution
    /// strategy still running.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == KernelState::Running
            && !self.stop.is_requested()
            && self.extension.is_running()
    }

    fn gate(&self) -> Gate {
        Gate {
            state: self.state,
            running: self.is_running(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn extension(&self) -> &E {
        &self.extension
    }

    pub fn extension_mut(&mut self) -> &mut E {
        &mut self.extension
    }

    /// Subscribe to the one-shot "started" event of each `initialize`.
    pub fn on_started(&mut self, handler: impl FnMut(&str) + Send + 'static) {
        self.started.connect(handler);
    }

    /// Subscribe to the "stopped" event fired at the end of `finalize`.
    pub fn on_stopped(&mut self, handler: impl FnMut(&str) + Send + 'static) {
        self.stopped.connect(handler);
    }

    /// Change name and period from a property set. Data-object names are
    /// fixed at construction.
    pub fn update_properties(&mut self, config: &KernelConfig) -> Result<(), KernelError> {
        if self.state != KernelState::Stopped {
            return Err(ConfigurationError::KernelRunning(self.state).into());
        }
        config
            .kernel
            .validate()
            .map_err(ConfigurationError::from)?;
        self.name.clone_from(&config.kernel.name);
        self.period = Duration::from_micros(u64::from(config.kernel.period_us));
        info!(kernel = %self.name, period_us = config.kernel.period_us, "properties updated");
        Ok(())
    }

    // ── Data Objects ──

    pub fn commands(&self) -> &Arc<DataObject<K::Command>> {
        &self.current.commands
    }

    pub fn setpoints(&self) -> &Arc<DataObject<K::SetPoint>> {
        &self.current.setpoints
    }

    pub fn inputs(&self) -> &Arc<DataObject<K::Input>> {
        &self.current.inputs
    }

    pub fn models(&self) -> &Arc<DataObject<K::Model>> {
        &self.current.models
    }

    pub fn outputs(&self) -> &Arc<DataObject<K::Output>> {
        &self.current.outputs
    }

    /// Data objects components are currently wired to.
    pub fn slots(&self) -> &DataSlots<K> {
        &self.current
    }

    /// The kernel's own data objects, kept even when substituted.
    pub fn local_slots(&self) -> &DataSlots<K> {
        &self.local
    }

    pub fn is_external(&self, channel: Channels) -> bool {
        self.external.contains(channel)
    }

    pub fn external_channels(&self) -> Channels {
        self.external
    }

    pub fn set_commands(&mut self, object: Arc<DataObject<K::Command>>) -> Result<(), KernelError> {
        self.substitute(Channels::COMMANDS, |slots| slots.commands = object)
    }

    pub fn set_setpoints(
        &mut self,
        object: Arc<DataObject<K::SetPoint>>,
    ) -> Result<(), KernelError> {
        self.substitute(Channels::SETPOINTS, |slots| slots.setpoints = object)
    }

    pub fn set_inputs(&mut self, object: Arc<DataObject<K::Input>>) -> Result<(), KernelError> {
        self.substitute(Channels::INPUTS, |slots| slots.inputs = object)
    }

    pub fn set_models(&mut self, object: Arc<DataObject<K::Model>>) -> Result<(), KernelError> {
        self.substitute(Channels::MODELS, |slots| slots.models = object)
    }

    pub fn set_outputs(&mut self, object: Arc<DataObject<K::Output>>) -> Result<(), KernelError> {
        self.substitute(Channels::OUTPUTS, |slots| slots.outputs = object)
    }

    /// Rewire every component of every role onto the replaced slot set.
    fn substitute(
        &mut self,
        channel: Channels,
        replace: impl FnOnce(&mut DataSlots<K>),
    ) -> Result<(), KernelError> {
        if self.state != KernelState::Stopped {
            return Err(ConfigurationError::KernelRunning(self.state).into());
        }
        self.roles.unwire_all(&self.current);
        replace(&mut self.current);
        self.roles.wire_all(&self.current);
        self.external |= channel;
        info!(
            kernel = %self.name,
            channel = channel.object_name(),
            "external data object installed"
        );
        Ok(())
    }

    // ── Lifecycle ──

    /// Start Support components in registration order, then the execution
    /// strategy. Fires "started" on success.
    pub fn initialize(&mut self) -> Result<(), KernelError> {
        if self.state != KernelState::Stopped {
            return Err(ConfigurationError::KernelRunning(self.state).into());
        }
        self.state = KernelState::Initializing;
        info!(kernel = %self.name, supports = self.roles.supports.len(), "initializing");

        if let Err(e) = self.roles.start_supports() {
            self.state = KernelState::Stopped;
            warn!(kernel = %self.name, error = %e, "support startup failed");
            return Err(e);
        }

        if !self.extension.initialize(&mut self.roles.cascade()) {
            self.roles.stop_supports();
            self.state = KernelState::Stopped;
            error!(kernel = %self.name, "execution strategy failed to initialize");
            return Err(KernelError::ExtensionInitFailure);
        }

        self.state = KernelState::Running;
        self.started.fire(&self.name);
        info!(kernel = %self.name, "running");
        Ok(())
    }

    /// One control cycle.
    #[inline]
    pub fn step(&mut self) {
        if self.is_running() {
            self.extension.step(&mut self.roles.cascade());
        } else {
            self.roles.reset_to_defaults();
        }
    }

    /// Make the running predicate false; the next `step` reselects defaults.
    pub fn abort(&mut self) {
        self.extension.abort();
    }

    /// Stop the execution strategy, reselect defaults, shut down Support
    /// components in reverse order and fire "stopped".
    pub fn finalize(&mut self) -> Result<(), KernelError> {
        if self.state != KernelState::Running {
            return Err(ConfigurationError::KernelNotRunning(self.state).into());
        }
        self.state = KernelState::Finalizing;
        info!(kernel = %self.name, "finalizing");

        self.extension.finalize(&mut self.roles.cascade());
        self.roles.reset_to_defaults();
        self.roles.stop_supports();

        self.state = KernelState::Stopped;
        self.stop.clear();
        self.stopped.fire(&self.name);
        info!(kernel = %self.name, "stopped");
        Ok(())
    }

    // ── Role-generic dispatch ──

    /// Select by role and name.
    pub fn select(&mut self, role: RoleKind, name: &str) -> Result<(), KernelError> {
        let gate = self.gate();
        match role {
            RoleKind::Sensor => select_in(&mut self.roles.sensors, role, gate, name),
            RoleKind::Estimator => select_in(&mut self.roles.estimators, role, gate, name),
            RoleKind::Generator => select_in(&mut self.roles.generators, role, gate, name),
            RoleKind::Controller => select_in(&mut self.roles.controllers, role, gate, name),
            RoleKind::Effector => select_in(&mut self.roles.effectors, role, gate, name),
            RoleKind::Support => Err(ConfigurationError::NotSelectable { role }.into()),
        }
    }

    /// Name of the active component. `None` for Support.
    pub fn active_name(&self, role: RoleKind) -> Option<&str> {
        match role {
            RoleKind::Sensor => Some(self.roles.sensors.active().name()),
            RoleKind::Estimator => Some(self.roles.estimators.active().name()),
            RoleKind::Generator => Some(self.roles.generators.active().name()),
            RoleKind::Controller => Some(self.roles.controllers.active().name()),
            RoleKind::Effector => Some(self.roles.effectors.active().name()),
            RoleKind::Support => None,
        }
    }

    pub fn is_selected(&self, role: RoleKind, name: &str) -> bool {
        self.active_name(role) == Some(name)
    }

    pub fn is_loaded(&self, role: RoleKind, name: &str) -> bool {
        match role {
            RoleKind::Sensor => self.roles.sensors.contains(name),
            RoleKind::Estimator => self.roles.estimators.contains(name),
            RoleKind::Generator => self.roles.generators.contains(name),
            RoleKind::Controller => self.roles.controllers.contains(name),
            RoleKind::Effector => self.roles.effectors.contains(name),
            RoleKind::Support => self.roles.supports.contains(name),
        }
    }

    /// Names of every component of `role`, default first.
    pub fn loaded_names(&self, role: RoleKind) -> Vec<&str> {
        match role {
            RoleKind::Sensor => self.roles.sensors.names().collect(),
            RoleKind::Estimator => self.roles.estimators.names().collect(),
            RoleKind::Generator => self.roles.generators.names().collect(),
            RoleKind::Controller => self.roles.controllers.names().collect(),
            RoleKind::Effector => self.roles.effectors.names().collect(),
            RoleKind::Support => self.roles.supports.names().collect(),
        }
    }
}

// ─── Per-Role API ───────────────────────────────────────────────────

macro_rules! role_api {
    (
        $role:literal, $trait_:ident, $field:ident,
        load: $load:ident, load_named: $load_named:ident,
        unload: $unload:ident, unload_named: $unload_named:ident,
        select: $select:ident, is_loaded: $is_loaded:ident,
        is_selected: $is_selected:ident, active_name: $active_name:ident
    ) => {
        #[doc = concat!("Load a ", $role, ": bind its ports, then enable its aspect.")]
        ///
        /// All-or-nothing: on failure no port stays bound and the component
        /// is handed back.
        pub fn $load(
            &mut self,
            component: Box<dyn $trait_<K>>,
        ) -> Result<(), Rejected<dyn $trait_<K>>> {
            let env = Env {
                name: &self.name,
                period: self.period,
                state: self.state,
                slots: &self.current,
            };
            load_into(&mut self.roles.$field, &env, component)
        }

        #[doc = concat!("Load the ", $role, " registered as `name` in `names`.")]
        pub fn $load_named(
            &mut self,
            names: &mut NameServer<K>,
            name: &str,
        ) -> Result<(), KernelError> {
            let component = names.$field.take(name).ok_or_else(|| {
                KernelError::from(ConfigurationError::UnknownName {
                    role: <dyn $trait_<K> as Wiring<K>>::ROLE,
                    name: component_name(name),
                })
            })?;
            self.$load(component).map_err(|rejected| {
                let Rejected { component, error } = rejected;
                let _ = names.$field.register(component);
                error
            })
        }

        #[doc = concat!(
            "Unload a ", $role, ": disable its aspect, release its ports, and hand it back."
        )]
        pub fn $unload(&mut self, name: &str) -> Result<Box<dyn $trait_<K>>, KernelError> {
            let env = Env {
                name: &self.name,
                period: self.period,
                state: self.state,
                slots: &self.current,
            };
            unload_from(&mut self.roles.$field, &env, name)
        }

        #[doc = concat!("Unload a ", $role, " and return it to `names`.")]
        pub fn $unload_named(
            &mut self,
            names: &mut NameServer<K>,
            name: &str,
        ) -> Result<(), KernelError> {
            let component = self.$unload(name)?;
            if let Err(component) = names.$field.register(component) {
                warn!(component = component.name(), "name already registered; component dropped");
            }
            Ok(())
        }

        #[doc = concat!("Make the loaded ", $role, " `name` active.")]
        pub fn $select(&mut self, name: &str) -> Result<(), KernelError> {
            let gate = self.gate();
            select_in(
                &mut self.roles.$field,
                <dyn $trait_<K> as Wiring<K>>::ROLE,
                gate,
                name,
            )
        }

        pub fn $is_loaded(&self, name: &str) -> bool {
            self.roles.$field.contains(name)
        }

        pub fn $is_selected(&self, name: &str) -> bool {
            self.roles.$field.active().name() == name
        }

        pub fn $active_name(&self) -> &str {
            self.roles.$field.active().name()
        }
    };
}

impl<K: KernelTypes, E: Extension<K>> Kernel<K, E> {
    role_api!("Sensor", Sensor, sensors,
        load: load_sensor, load_named: load_sensor_named,
        unload: unload_sensor, unload_named: unload_sensor_named,
        select: select_sensor, is_loaded: is_loaded_sensor,
        is_selected: is_selected_sensor, active_name: active_sensor_name);

    role_api!("Estimator", Estimator, estimators,
        load: load_estimator, load_named: load_estimator_named,
        unload: unload_estimator, unload_named: unload_estimator_named,
        select: select_estimator, is_loaded: is_loaded_estimator,
        is_selected: is_selected_estimator, active_name: active_estimator_name);

    role_api!("Generator", Generator, generators,
        load: load_generator, load_named: load_generator_named,
        unload: unload_generator, unload_named: unload_generator_named,
        select: select_generator, is_loaded: is_loaded_generator,
        is_selected: is_selected_generator, active_name: active_generator_name);

    role_api!("Controller", Controller, controllers,
        load: load_controller, load_named: load_controller_named,
        unload: unload_controller, unload_named: unload_controller_named,
        select: select_controller, is_loaded: is_loaded_controller,
        is_selected: is_selected_controller, active_name: active_controller_name);

    role_api!("Effector", Effector, effectors,
        load: load_effector, load_named: load_effector_named,
        unload: unload_effector, unload_named: unload_effector_named,
        select: select_effector, is_loaded: is_loaded_effector,
        is_selected: is_selected_effector, active_name: active_effector_name);

    // ── Support ──

    /// Load a Support component. It starts with the kernel and runs every
    /// cycle after the cascade.
    pub fn load_support(
        &mut self,
        mut component: Box<dyn Support>,
    ) -> Result<(), Rejected<dyn Support>> {
        let role = RoleKind::Support;
        if self.state != KernelState::Stopped {
            return Err(Rejected::new(
                component,
                ConfigurationError::KernelRunning(self.state),
            ));
        }
        if self.roles.supports.contains(component.name()) {
            let name = component_name(component.name());
            return Err(Rejected::new(
                component,
                ConfigurationError::AlreadyLoaded { role, name },
            ));
        }
        if self.roles.supports.is_full() {
            return Err(Rejected::new(component, ConfigurationError::RegistryFull { role }));
        }
        let ctx = AspectContext {
            kernel_name: &self.name,
            role,
            period: self.period,
        };
        if !component.enable_aspect(&ctx) {
            warn!(
                kernel = %self.name,
                component = component.name(),
                "support aspect enable rejected"
            );
            let name = component_name(component.name());
            return Err(Rejected::new(component, KernelError::WiringFailure { role, name }));
        }
        let name = component_name(component.name());
        if let Err(mut component) = self.roles.supports.push(component) {
            component.disable_aspect();
            return Err(Rejected::new(component, ConfigurationError::RegistryFull { role }));
        }
        info!(kernel = %self.name, component = %name, "support loaded");
        Ok(())
    }

    pub fn load_support_named(
        &mut self,
        names: &mut NameServer<K>,
        name: &str,
    ) -> Result<(), KernelError> {
        let component = names.supports.take(name).ok_or_else(|| {
            KernelError::from(ConfigurationError::UnknownName {
                role: RoleKind::Support,
                name: component_name(name),
            })
        })?;
        self.load_support(component).map_err(|rejected| {
            let Rejected { component, error } = rejected;
            let _ = names.supports.register(component);
            error
        })
    }

    pub fn unload_support(&mut self, name: &str) -> Result<Box<dyn Support>, KernelError> {
        if self.state != KernelState::Stopped {
            return Err(ConfigurationError::KernelRunning(self.state).into());
        }
        let index = self
            .roles
            .supports
            .position(name)
            .ok_or_else(|| KernelError::not_loaded(RoleKind::Support, name))?;
        let mut component = self
            .roles
            .supports
            .remove(index)
            .ok_or_else(|| KernelError::not_loaded(RoleKind::Support, name))?;
        component.disable_aspect();
        info!(kernel = %self.name, component = name, "support unloaded");
        Ok(component)
    }

    pub fn unload_support_named(
        &mut self,
        names: &mut NameServer<K>,
        name: &str,
    ) -> Result<(), KernelError> {
        let component = self.unload_support(name)?;
        if let Err(component) = names.supports.register(component) {
            warn!(component = component.name(), "name already registered; component dropped");
        }
        Ok(())
    }

    pub fn is_loaded_support(&self, name: &str) -> bool {
        self.roles.supports.contains(name)
    }

    pub fn support_count(&self) -> usize {
        self.roles.supports.len()
    }
}
