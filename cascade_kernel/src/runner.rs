//! Periodic execution of a kernel: initialize → step every period → finalize.
//!
//! ## RT Setup
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` to the configured core.
//! 4. `sched_setscheduler(SCHED_FIFO, priority)`.
//!
//! All four are no-ops without the `rt` feature.
//!
//! ## Pacing
//! With `rt`: absolute-time `clock_nanosleep` on `CLOCK_MONOTONIC`, drift
//! free. Without: `std::thread::sleep` for the remainder of the period.
//!
//! ## Overruns
//! A step longer than the period is counted. Under
//! [`OverrunPolicy::Abort`] the kernel is also aborted: from the next step on
//! every role runs its default until the runner stops.

use crate::data_object::KernelTypes;
use crate::error::KernelError;
use crate::event::StopHandle;
use crate::extension::Extension;
use crate::kernel::Kernel;
use cascade_common::config::{OverrunPolicy, RunnerConfig};
use cascade_common::state::KernelState;
use thiserror::Error;
use tracing::{info, warn};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics; `record` never allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub cycle_count: u64,
    /// Last step duration [ns].
    pub last_cycle_ns: i64,
    pub min_cycle_ns: i64,
    pub max_cycle_ns: i64,
    sum_cycle_ns: i64,
    /// Steps that exceeded the period.
    pub overruns: u64,
    /// Worst wake-up latency against the scheduled start [ns].
    pub max_latency_ns: i64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Mean step duration [ns]; 0 before the first cycle.
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        match self.cycle_count {
            0 => 0,
            n => self.sum_cycle_ns / n as i64,
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("RT setup error: {0}")]
    RtSetup(String),

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Bytes of stack touched before entering the loop.
const PREFAULT_STACK_BYTES: usize = 512 * 1024;

fn prefault_stack() {
    let mut page = [0u8; PREFAULT_STACK_BYTES];
    for byte in page.iter_mut().step_by(4096) {
        // SAFETY: in-bounds write to a local buffer.
        unsafe { core::ptr::write_volatile(byte, 1) };
    }
    core::hint::black_box(&page);
}

/// Lock memory, prefault the stack, pin to `cpu_core` and switch to
/// `SCHED_FIFO` at `rt_priority`. Only the prefault runs without the `rt`
/// feature.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), RunnerError> {
    #[cfg(feature = "rt")]
    {
        use nix::sched::{CpuSet, sched_setaffinity};
        use nix::sys::mman::{MlockallFlags, mlockall};
        use nix::unistd::Pid;

        mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
            .map_err(|e| RunnerError::RtSetup(format!("mlockall: {e}")))?;
        prefault_stack();

        let mut cpus = CpuSet::new();
        cpus.set(cpu_core)
            .map_err(|e| RunnerError::RtSetup(format!("CpuSet::set({cpu_core}): {e}")))?;
        sched_setaffinity(Pid::from_raw(0), &cpus)
            .map_err(|e| RunnerError::RtSetup(format!("sched_setaffinity: {e}")))?;

        let param = libc::sched_param {
            sched_priority: rt_priority,
        };
        // SAFETY: valid param pointer; pid 0 is the calling thread.
        if unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) } != 0 {
            return Err(RunnerError::RtSetup(format!(
                "sched_setscheduler(SCHED_FIFO, {rt_priority}): {}",
                std::io::Error::last_os_error()
            )));
        }
    }

    #[cfg(not(feature = "rt"))]
    {
        let _ = (cpu_core, rt_priority);
        prefault_stack();
    }

    Ok(())
}

// ─── Periodic Runner ────────────────────────────────────────────────

/// Owns a kernel and drives it at its period.
pub struct PeriodicRunner<K: KernelTypes, E: Extension<K>> {
    kernel: Kernel<K, E>,
    policy: OverrunPolicy,
    max_cycles: Option<u64>,
    stats: CycleStats,
    stop: StopHandle,
    aborted: bool,
}

impl<K: KernelTypes, E: Extension<K>> PeriodicRunner<K, E> {
    pub fn new(kernel: Kernel<K, E>, config: &RunnerConfig) -> Self {
        let stop = kernel.stop_handle();
        Self {
            kernel,
            policy: config.overrun_policy,
            max_cycles: config.max_cycles,
            stats: CycleStats::new(),
            stop,
            aborted: false,
        }
    }

    /// Requests made through this handle end `run` at the next cycle.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn kernel(&self) -> &Kernel<K, E> {
        &self.kernel
    }

    pub fn kernel_mut(&mut self) -> &mut Kernel<K, E> {
        &mut self.kernel
    }

    pub fn into_kernel(self) -> Kernel<K, E> {
        self.kernel
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Whether an overrun tripped the abort policy during the last run.
    pub fn was_aborted(&self) -> bool {
        self.aborted
    }

    /// Run until a stop is requested or the cycle limit is reached.
    ///
    /// Initializes the kernel unless the caller already did (so components
    /// can be selected before the first cycle), and always finalizes it.
    pub fn run(&mut self) -> Result<CycleStats, RunnerError> {
        if self.kernel.state() != KernelState::Running {
            self.kernel.initialize()?;
        }
        self.stats = CycleStats::new();
        self.aborted = false;

        let period_ns = i64::try_from(self.kernel.period().as_nanos()).unwrap_or(i64::MAX);
        info!(
            kernel = self.kernel.name(),
            period_ns,
            policy = ?self.policy,
            max_cycles = ?self.max_cycles,
            "entering cycle loop"
        );

        #[cfg(feature = "rt")]
        let looped = self.run_rt_loop(period_ns);
        #[cfg(not(feature = "rt"))]
        let looped = self.run_sim_loop(period_ns);

        let finalized = self.kernel.finalize();
        info!(
            kernel = self.kernel.name(),
            cycles = self.stats.cycle_count,
            overruns = self.stats.overruns,
            avg_ns = self.stats.avg_cycle_ns(),
            max_ns = self.stats.max_cycle_ns,
            "cycle loop finished"
        );
        looped?;
        finalized?;
        Ok(self.stats)
    }

    #[inline]
    fn should_stop(&self) -> bool {
        self.stop.is_requested()
            || self
                .max_cycles
                .is_some_and(|max| self.stats.cycle_count >= max)
    }

    /// Record one step and apply the overrun policy.
    #[inline]
    fn account(&mut self, duration_ns: i64, latency_ns: i64, period_ns: i64) {
        self.stats.record(duration_ns, latency_ns);
        if duration_ns <= period_ns {
            return;
        }
        self.stats.overruns += 1;
        if self.policy == OverrunPolicy::Abort && !self.aborted {
            self.aborted = true;
            self.kernel.abort();
            warn!(
                kernel = self.kernel.name(),
                duration_ns, period_ns, "cycle overrun, cascade aborted to defaults"
            );
        }
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self, period_ns: i64) -> Result<(), RunnerError> {
        use std::time::{Duration, Instant};

        let period = Duration::from_nanos(u64::try_from(period_ns).unwrap_or(0));
        let mut next_wake = Instant::now();

        while !self.should_stop() {
            let start = Instant::now();
            let latency_ns = start
                .checked_duration_since(next_wake)
                .map_or(0, |d| d.as_nanos() as i64);

            self.kernel.step();

            let duration_ns = start.elapsed().as_nanos() as i64;
            self.account(duration_ns, latency_ns, period_ns);

            next_wake += period;
            if let Some(remaining) = next_wake.checked_duration_since(Instant::now()) {
                std::thread::sleep(remaining);
            } else {
                // Behind schedule: restart pacing from now.
                next_wake = Instant::now();
            }
        }
        Ok(())
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self, period_ns: i64) -> Result<(), RunnerError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = || {
            clock_gettime(clock).map_err(|e| RunnerError::RtSetup(format!("clock_gettime: {e}")))
        };
        let mut next_wake = now()?;

        while !self.should_stop() {
            let start = now()?;
            let latency_ns = timespec_diff_ns(&start, &next_wake).max(0);

            self.kernel.step();

            let end = now()?;
            self.account(timespec_diff_ns(&end, &start), latency_ns, period_ns);

            next_wake = timespec_add_ns(next_wake, period_ns);
            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }
}

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    const NS_PER_SEC: i64 = 1_000_000_000;
    let total = ts.tv_nsec() + ns;
    nix::sys::time::TimeSpec::new(
        ts.tv_sec() + total.div_euclid(NS_PER_SEC),
        total.rem_euclid(NS_PER_SEC),
    )
}

#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
