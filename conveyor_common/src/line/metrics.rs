//! Display-facing snapshot of the operational counters.

use serde::{Deserialize, Serialize};

/// Committed metrics as published to the display once per scan.
///
/// Durations are expressed in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Boxes that completed transit (outfeed B or C).
    pub box_count: u64,
    /// Fault entries caused by a jam.
    pub jam_count: u64,
    pub running_time_sec: f64,
    pub fault_time_sec: f64,
    /// Most recent infeed → outfeed transit time.
    pub last_cycle_time_sec: f64,
    /// Mean transit time since the last reset.
    pub avg_cycle_time_sec: f64,
    /// Completed boxes per running hour (0 while running time is 0).
    pub throughput_per_hour: f64,
    /// Running share of running + fault time (0 while both are 0).
    pub uptime_percent: f64,
}

impl MetricsSnapshot {
    /// Returns true when every counter is zero (freshly reset).
    pub fn is_zeroed(&self) -> bool {
        *self == Self::default()
    }
}
