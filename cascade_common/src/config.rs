//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! across all Cascade applications, plus the kernel/runner configuration.
//!
//! # Usage
//!
//! ```rust,no_run
//! use cascade_common::config::{ConfigLoader, ConfigError, KernelConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = KernelConfig::load(Path::new("kernel.toml"))?;
//!     config.validate()?;
//!     println!("Kernel: {}", config.kernel.name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::consts::{
    DEFAULT_CPU_CORE, DEFAULT_KERNEL_NAME, DEFAULT_PERIOD_US, DEFAULT_PREFIX,
    DEFAULT_RT_PRIORITY, MAX_PERIOD_US, MIN_PERIOD_US,
};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared across all Cascade applications.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "cascade-axis-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: "cascade".to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// Blanket-implemented for every `serde::de::DeserializeOwned` type.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

// ─── Kernel Config ──────────────────────────────────────────────────

/// Top-level configuration of a control kernel process.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "axis-x"
///
/// [kernel]
/// name = "AxisX"
/// period_us = 1000
///
/// [kernel.prefixes]
/// inputs = "plant"
///
/// [runner]
/// cpu_core = 2
/// overrun_policy = "abort"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KernelConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub kernel: KernelSection,
    #[serde(default)]
    pub runner: RunnerConfig,
}

impl KernelConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.kernel.validate()?;
        self.runner.validate()
    }
}

/// Kernel identity and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KernelSection {
    /// Kernel name; data objects are named `<name>::<Channel>`.
    #[serde(default = "default_kernel_name")]
    pub name: String,

    /// Control period in microseconds.
    #[serde(default = "default_period_us")]
    pub period_us: u32,

    /// External-lookup prefixes of the five data objects.
    #[serde(default)]
    pub prefixes: ChannelPrefixes,
}

fn default_kernel_name() -> String {
    DEFAULT_KERNEL_NAME.to_string()
}
fn default_period_us() -> u32 {
    DEFAULT_PERIOD_US
}
fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl Default for KernelSection {
    fn default() -> Self {
        Self {
            name: default_kernel_name(),
            period_us: DEFAULT_PERIOD_US,
            prefixes: ChannelPrefixes::default(),
        }
    }
}

impl KernelSection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "kernel.name cannot be empty".to_string(),
            ));
        }
        if self.period_us < MIN_PERIOD_US || self.period_us > MAX_PERIOD_US {
            return Err(ConfigError::ValidationError(format!(
                "kernel.period_us {} out of range [{}, {}]",
                self.period_us, MIN_PERIOD_US, MAX_PERIOD_US
            )));
        }
        self.prefixes.validate()
    }
}

/// Per-channel data-object prefixes used by external (distributed) lookup.
/// Data objects sharing a prefix are visible to each other's servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelPrefixes {
    #[serde(default = "default_prefix")]
    pub commands: String,
    #[serde(default = "default_prefix")]
    pub setpoints: String,
    #[serde(default = "default_prefix")]
    pub inputs: String,
    #[serde(default = "default_prefix")]
    pub models: String,
    #[serde(default = "default_prefix")]
    pub outputs: String,
}

impl Default for ChannelPrefixes {
    fn default() -> Self {
        Self {
            commands: default_prefix(),
            setpoints: default_prefix(),
            inputs: default_prefix(),
            models: default_prefix(),
            outputs: default_prefix(),
        }
    }
}

impl ChannelPrefixes {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("commands", &self.commands),
            ("setpoints", &self.setpoints),
            ("inputs", &self.inputs),
            ("models", &self.models),
            ("outputs", &self.outputs),
        ] {
            if value.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "kernel.prefixes.{field} cannot be empty"
                )));
            }
        }
        Ok(())
    }
}

// ─── Runner Config ──────────────────────────────────────────────────

/// Reaction to a step that exceeds its period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrunPolicy {
    /// Count the overrun and keep going.
    #[default]
    Ignore,
    /// Abort the cascade: defaults are selected at the next step boundary.
    Abort,
}

/// Periodic runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// CPU core to pin the RT thread to.
    #[serde(default = "default_cpu_core")]
    pub cpu_core: usize,

    /// SCHED_FIFO priority (1..=99).
    #[serde(default = "default_rt_priority")]
    pub rt_priority: i32,

    #[serde(default)]
    pub overrun_policy: OverrunPolicy,

    /// Stop after this many cycles (`None` = until stop is requested).
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

fn default_cpu_core() -> usize {
    DEFAULT_CPU_CORE
}
fn default_rt_priority() -> i32 {
    DEFAULT_RT_PRIORITY
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            cpu_core: DEFAULT_CPU_CORE,
            rt_priority: DEFAULT_RT_PRIORITY,
            overrun_policy: OverrunPolicy::default(),
            max_cycles: None,
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=99).contains(&self.rt_priority) {
            return Err(ConfigError::ValidationError(format!(
                "runner.rt_priority {} out of range [1, 99]",
                self.rt_priority
            )));
        }
        if self.max_cycles == Some(0) {
            return Err(ConfigError::ValidationError(
                "runner.max_cycles must be > 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}
