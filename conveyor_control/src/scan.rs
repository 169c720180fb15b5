//! Per-scan context shared by every component.
//!
//! The orchestrator samples all edge detectors once at the start of a scan
//! and hands components a read-only [`ScanContext`]. Components never keep
//! their own copy of the previous input sample.

use std::time::Duration;

use conveyor_common::line::io::InputSnapshot;
use conveyor_common::line::state::SystemState;

use crate::operator::OperatorCommands;
use crate::signal::{Edge, EdgeDetector};

/// Transitions of every edge-triggered signal for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanEdges {
    /// Start request (button or panel).
    pub start: Edge,
    /// Stop request (stop button pressed or panel).
    pub stop: Edge,
    pub acknowledge: Edge,
    pub reset_metrics: Edge,
    pub infeed: Edge,
    pub diverter: Edge,
    pub outfeed_b: Edge,
    pub outfeed_c: Edge,
}

/// Edge detectors for every edge-triggered signal.
#[derive(Debug, Clone, Default)]
pub struct EdgeBank {
    start: EdgeDetector,
    stop: EdgeDetector,
    acknowledge: EdgeDetector,
    reset_metrics: EdgeDetector,
    infeed: EdgeDetector,
    diverter: EdgeDetector,
    outfeed_b: EdgeDetector,
    outfeed_c: EdgeDetector,
}

impl EdgeBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample every signal once. Must be called exactly once per scan.
    pub fn sample(&mut self, inputs: &InputSnapshot, commands: &OperatorCommands) -> ScanEdges {
        ScanEdges {
            start: self.start.update(start_request(inputs, commands)),
            stop: self.stop.update(stop_request(inputs, commands)),
            acknowledge: self.acknowledge.update(commands.acknowledge),
            reset_metrics: self.reset_metrics.update(commands.reset_metrics),
            infeed: self.infeed.update(inputs.pe_infeed),
            diverter: self.diverter.update(inputs.pe_diverter),
            outfeed_b: self.outfeed_b.update(inputs.pe_outfeed_b),
            outfeed_c: self.outfeed_c.update(inputs.pe_outfeed_c),
        }
    }
}

/// Start button pressed or start requested from the panel.
#[inline]
pub const fn start_request(inputs: &InputSnapshot, commands: &OperatorCommands) -> bool {
    inputs.start_button || commands.start
}

/// Stop button pressed (NC contact open) or stop requested from the panel.
#[inline]
pub const fn stop_request(inputs: &InputSnapshot, commands: &OperatorCommands) -> bool {
    !inputs.stop_ok || commands.stop
}

/// Read-only view of one scan handed to every component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanContext {
    /// Scan counter, starting at 1 for the first scan.
    pub cycle: u64,
    /// Engine time at this scan (`cycle × scan period`).
    pub now: Duration,
    pub inputs: InputSnapshot,
    pub commands: OperatorCommands,
    pub edges: ScanEdges,
    /// State at the start of the scan, before any transition.
    pub state: SystemState,
}
