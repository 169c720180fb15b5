//! Read-only status published to the operator display each scan.

use serde::Serialize;

use super::io::OutputCommand;
use super::metrics::MetricsSnapshot;
use super::params::Parameters;
use super::state::{FaultCode, RunMode, SystemState};

/// Consistent view of the line committed at a scan boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusView {
    /// Scan counter of the committing scan.
    pub cycle: u64,
    pub state: SystemState,
    /// 0 = Stopped, 1 = Starting, 2 = Running, 3 = Fault.
    pub state_code: u8,
    /// Submode while running.
    pub run_mode: Option<RunMode>,
    pub fault_code: FaultCode,
    /// Catalog text for `fault_code`.
    pub fault_message: &'static str,
    pub outputs: OutputCommand,
    pub metrics: MetricsSnapshot,
    pub parameters: Parameters,
    /// Boxes seen at the infeed since start (routing counter).
    pub box_counter: u64,
}

impl Default for StatusView {
    fn default() -> Self {
        let state = SystemState::default();
        let fault_code = FaultCode::default();
        Self {
            cycle: 0,
            state,
            state_code: state.code(),
            run_mode: state.run_mode(),
            fault_code,
            fault_message: fault_code.message(),
            outputs: OutputCommand::OFF,
            metrics: MetricsSnapshot::default(),
            parameters: Parameters::default(),
            box_counter: 0,
        }
    }
}
