//! System-wide constants for the Cascade workspace.
//!
//! Single source of truth for registry capacities and timing limits.
//! Imported by all crates; no duplication permitted.

/// Maximum number of components loaded per single-selection role
/// (default component excluded).
pub const MAX_COMPONENTS_PER_ROLE: usize = 16;

/// Maximum number of loaded Support components.
pub const MAX_SUPPORTS: usize = 16;

/// Capacity (bytes) of a component name stored in RT-safe error payloads.
/// Longer names are truncated at a char boundary.
pub const NAME_CAPACITY: usize = 32;

/// Default control period in microseconds (1 kHz = 1000 µs).
pub const DEFAULT_PERIOD_US: u32 = 1000;

/// Lower bound for the control period [µs].
pub const MIN_PERIOD_US: u32 = 50;

/// Upper bound for the control period [µs] (1 s).
pub const MAX_PERIOD_US: u32 = 1_000_000;

/// Default kernel name.
pub const DEFAULT_KERNEL_NAME: &str = "Default";

/// Default data-object lookup prefix.
pub const DEFAULT_PREFIX: &str = "Default";

/// Default CPU core for the RT thread.
pub const DEFAULT_CPU_CORE: usize = 1;

/// Default SCHED_FIFO priority.
pub const DEFAULT_RT_PRIORITY: i32 = 80;

/// Maximum optimistic read attempts on a data object before giving up.
pub const MAX_READ_RETRIES: u32 = 16;

static_assertions::const_assert!(MIN_PERIOD_US <= DEFAULT_PERIOD_US);
static_assertions::const_assert!(DEFAULT_PERIOD_US <= MAX_PERIOD_US);
static_assertions::const_assert!(NAME_CAPACITY >= 8);
