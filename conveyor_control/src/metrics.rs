//! Operational metrics accumulated per scan.
//!
//! Running and fault time advance by one scan period in the matching state.
//! A transit opens on the infeed rising edge (only if none is open) and
//! closes on the first outfeed rising edge, producing one cycle-time sample.
//! A reset request zeroes everything after this scan's accumulation, so the
//! committed snapshot of a resetting scan is all zeros.

use std::time::Duration;

use conveyor_common::line::metrics::MetricsSnapshot;
use conveyor_common::line::state::{FaultCode, SystemState};
use tracing::{debug, info};

use crate::scan::ScanContext;

const SECS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    scan_period: Duration,
    box_count: u64,
    jam_count: u64,
    running_time: Duration,
    fault_time: Duration,
    last_cycle_time: Duration,
    cycle_time_total: Duration,
    cycle_samples: u64,
    /// Engine time of the infeed edge that opened the current transit.
    transit_start: Option<Duration>,
}

impl MetricsAggregator {
    pub fn new(scan_period: Duration) -> Self {
        Self {
            scan_period,
            box_count: 0,
            jam_count: 0,
            running_time: Duration::ZERO,
            fault_time: Duration::ZERO,
            last_cycle_time: Duration::ZERO,
            cycle_time_total: Duration::ZERO,
            cycle_samples: 0,
            transit_start: None,
        }
    }

    /// Accumulate one scan.
    ///
    /// `state` is the state after this scan's transition. `fault_entry`
    /// carries the fault code when the line entered `Fault` this scan.
    pub fn evaluate(&mut self, ctx: &ScanContext, state: SystemState, fault_entry: Option<FaultCode>) {
        match state {
            SystemState::Running(_) => self.running_time += self.scan_period,
            SystemState::Fault => self.fault_time += self.scan_period,
            SystemState::Stopped | SystemState::Starting => {}
        }

        if ctx.edges.infeed.is_rising() && self.transit_start.is_none() {
            self.transit_start = Some(ctx.now);
        }

        let completed =
            u64::from(ctx.edges.outfeed_b.is_rising()) + u64::from(ctx.edges.outfeed_c.is_rising());
        if completed > 0 {
            self.box_count += completed;
            if let Some(start) = self.transit_start.take() {
                let sample = ctx.now.saturating_sub(start);
                self.last_cycle_time = sample;
                self.cycle_time_total += sample;
                self.cycle_samples += 1;
                debug!("transit complete in {:.2}s", sample.as_secs_f64());
            }
        }

        if fault_entry.is_some_and(|code| code.is_jam()) {
            self.jam_count += 1;
        }

        if ctx.edges.reset_metrics.is_rising() {
            self.reset();
        }
    }

    /// Zero every counter and drop any open transit.
    pub fn reset(&mut self) {
        *self = Self::new(self.scan_period);
        info!("Metrics reset");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let running_sec = self.running_time.as_secs_f64();
        let fault_sec = self.fault_time.as_secs_f64();

        let avg_cycle_time_sec = if self.cycle_samples > 0 {
            self.cycle_time_total.as_secs_f64() / self.cycle_samples as f64
        } else {
            0.0
        };
        let throughput_per_hour = if running_sec > 0.0 {
            self.box_count as f64 / (running_sec / SECS_PER_HOUR)
        } else {
            0.0
        };
        let active_sec = running_sec + fault_sec;
        let uptime_percent = if active_sec > 0.0 {
            running_sec / active_sec * 100.0
        } else {
            0.0
        };

        MetricsSnapshot {
            box_count: self.box_count,
            jam_count: self.jam_count,
            running_time_sec: running_sec,
            fault_time_sec: fault_sec,
            last_cycle_time_sec: self.last_cycle_time.as_secs_f64(),
            avg_cycle_time_sec,
            throughput_per_hour,
            uptime_percent,
        }
    }

    #[inline]
    pub fn transit_open(&self) -> bool {
        self.transit_start.is_some()
    }
}
