//! Fixed-period scan loop: latch → evaluate → commit.
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`: lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity`: pin to a CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO, prio)`.
//!
//! Steps 1, 3 and 4 are no-ops without the `rt` feature.
//!
//! ## Cycle Body
//! Operator writes staged since the last scan are applied at the boundary,
//! then inputs are latched, one engine scan runs, outputs are committed and
//! the status view is published to the panel.
//!
//! ## Pacing
//! `clock_nanosleep(TIMER_ABSTIME)` with the `rt` feature, `thread::sleep`
//! otherwise. [`Pacing::Fast`] skips sleeping altogether (tests, replays).
//! An overrun is counted and logged; the loop keeps going.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use conveyor_common::line::config::EngineConfig;
use conveyor_common::line::io::OutputCommand;
use conveyor_common::line::params::Parameters;
use conveyor_common::line::status::StatusView;
use tracing::{info, warn};

use crate::engine::ControlEngine;
use crate::error::CycleError;
use crate::io::ProcessIo;
use crate::operator::OperatorPanel;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle compute time [ns].
    pub last_cycle_ns: i64,
    pub min_cycle_ns: i64,
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Cycles whose compute time exceeded the scan period.
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
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
        self.sum_cycle_ns += duration_ns;
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 256 KiB of stack so the scan never takes a page fault on it.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, aligned, exclusive reference.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Prepare the calling thread for the scan loop.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Loop pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Sleep to the next scan boundary.
    #[default]
    RealTime,
    /// Back-to-back scans, engine time only.
    Fast,
}

/// Owns the engine, the operator panel and the process source.
pub struct CycleRunner<P: ProcessIo> {
    engine: ControlEngine,
    panel: OperatorPanel,
    io: P,
    stats: CycleStats,
    cycle_time_ns: i64,
}

impl<P: ProcessIo> CycleRunner<P> {
    pub fn new(config: &EngineConfig, parameters: Parameters, mut io: P) -> Self {
        io.apply_parameters(&parameters);
        Self {
            engine: ControlEngine::new(config, parameters),
            panel: OperatorPanel::new(parameters),
            io,
            stats: CycleStats::new(),
            cycle_time_ns: i64::from(config.scan_period_us) * 1_000,
        }
    }

    /// Run one scan.
    pub fn step(&mut self) -> Result<OutputCommand, CycleError> {
        // ═══ BOUNDARY ═══
        if let Some(parameters) = self.panel.take_parameters() {
            self.engine.apply_parameters(parameters);
            self.io.apply_parameters(&parameters);
        }
        let commands = self.panel.take_commands();

        // ═══ READ ═══
        let inputs = self.io.read_inputs()?;

        // ═══ PROCESS ═══
        let outputs = self.engine.scan(&inputs, &commands);

        // ═══ WRITE ═══
        self.io.write_outputs(&outputs)?;
        self.panel.publish(self.engine.status());

        Ok(outputs)
    }

    /// Scan until `max_cycles` is reached or `shutdown` is set.
    ///
    /// `operator` runs at every cycle boundary with the panel and the last
    /// committed status, standing in for the display side.
    pub fn run<F>(
        &mut self,
        max_cycles: Option<u64>,
        pacing: Pacing,
        shutdown: &AtomicBool,
        mut operator: F,
    ) -> Result<(), CycleError>
    where
        F: FnMut(&mut OperatorPanel, &StatusView),
    {
        info!(
            "Scan loop started: period={}us pacing={:?}",
            self.cycle_time_ns / 1_000,
            pacing
        );

        let done = |stats: &CycleStats| {
            shutdown.load(Ordering::Relaxed) || max_cycles.is_some_and(|n| stats.cycle_count >= n)
        };

        match pacing {
            Pacing::Fast => {
                while !done(&self.stats) {
                    let status = *self.panel.status();
                    operator(&mut self.panel, &status);
                    let start = Instant::now();
                    self.step()?;
                    self.stats.record(start.elapsed().as_nanos() as i64, 0);
                }
            }
            Pacing::RealTime => self.run_paced(&done, &mut operator)?,
        }

        info!(
            "Scan loop finished: cycles={} avg={}ns max={}ns overruns={}",
            self.stats.cycle_count,
            self.stats.avg_cycle_ns(),
            self.stats.max_cycle_ns,
            self.stats.overruns
        );
        Ok(())
    }

    /// Record one cycle's timing and flag an overrun.
    fn finish_cycle(&mut self, duration_ns: i64, latency_ns: i64) {
        self.stats.record(duration_ns, latency_ns);
        if duration_ns > self.cycle_time_ns {
            self.stats.overruns += 1;
            warn!(
                "cycle overrun: {duration_ns}ns > {}ns budget (cycle {})",
                self.cycle_time_ns, self.stats.cycle_count
            );
        }
    }

    #[cfg(feature = "rt")]
    fn run_paced<D, F>(&mut self, done: &D, operator: &mut F) -> Result<(), CycleError>
    where
        D: Fn(&CycleStats) -> bool,
        F: FnMut(&mut OperatorPanel, &StatusView),
    {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = || clock_gettime(clock).map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")));
        let mut next_wake = now()?;

        while !done(&self.stats) {
            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);

            let cycle_start = now()?;
            let latency_ns = timespec_diff_ns(&cycle_start, &next_wake).abs();

            let status = *self.panel.status();
            operator(&mut self.panel, &status);
            self.step()?;

            let cycle_end = now()?;
            self.finish_cycle(timespec_diff_ns(&cycle_end, &cycle_start), latency_ns);

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_paced<D, F>(&mut self, done: &D, operator: &mut F) -> Result<(), CycleError>
    where
        D: Fn(&CycleStats) -> bool,
        F: FnMut(&mut OperatorPanel, &StatusView),
    {
        let period = std::time::Duration::from_nanos(self.cycle_time_ns as u64);

        while !done(&self.stats) {
            let cycle_start = Instant::now();

            let status = *self.panel.status();
            operator(&mut self.panel, &status);
            self.step()?;

            let elapsed = cycle_start.elapsed();
            self.finish_cycle(elapsed.as_nanos() as i64, 0);

            if let Some(remaining) = period.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }

    pub fn engine(&self) -> &ControlEngine {
        &self.engine
    }

    pub fn panel(&self) -> &OperatorPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut OperatorPanel {
        &mut self.panel
    }

    pub fn io(&self) -> &P {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut P {
        &mut self.io
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// `a - b` in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}
