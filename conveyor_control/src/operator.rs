//! Operator panel: display-side commands, parameter writes and status.
//!
//! Requests are staged between scans and handed to the engine at the next
//! scan boundary via [`OperatorPanel::take_commands`]. Pulsed requests
//! (start, stop, acknowledge, reset metrics) are cleared once taken, so each
//! one produces a single rising edge. Jog is a level held by the operator.

use conveyor_common::line::params::{ParameterError, Parameters};
use conveyor_common::line::status::StatusView;
use tracing::{info, warn};

/// Operator requests consumed by one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperatorCommands {
    pub start: bool,
    pub stop: bool,
    pub acknowledge: bool,
    pub reset_metrics: bool,
    /// Hold-to-run jog in Manual mode.
    pub jog: bool,
}

/// Operator display state.
#[derive(Debug, Clone)]
pub struct OperatorPanel {
    pending: OperatorCommands,
    parameters: Parameters,
    parameters_dirty: bool,
    status: StatusView,
}

impl OperatorPanel {
    pub fn new(parameters: Parameters) -> Self {
        Self {
            pending: OperatorCommands::default(),
            parameters,
            parameters_dirty: false,
            status: StatusView::default(),
        }
    }

    pub fn request_start(&mut self) {
        self.pending.start = true;
    }

    pub fn request_stop(&mut self) {
        self.pending.stop = true;
    }

    pub fn acknowledge_fault(&mut self) {
        self.pending.acknowledge = true;
    }

    pub fn reset_metrics(&mut self) {
        self.pending.reset_metrics = true;
    }

    /// Hold (`true`) or release the jog input.
    pub fn set_jog(&mut self, held: bool) {
        self.pending.jog = held;
    }

    /// Write the jam timeout [s]. Out-of-range values are rejected.
    pub fn write_jam_timeout(&mut self, value: f64) -> Result<(), ParameterError> {
        let result = self.parameters.set_jam_timeout_sec(value);
        self.record_write("jam_timeout_sec", value, result)
    }

    /// Write the conveyor speed [fraction]. Out-of-range values are rejected.
    pub fn write_conveyor_speed(&mut self, value: f64) -> Result<(), ParameterError> {
        let result = self.parameters.set_conveyor_speed(value);
        self.record_write("conveyor_speed", value, result)
    }

    fn record_write(
        &mut self,
        name: &str,
        value: f64,
        result: Result<(), ParameterError>,
    ) -> Result<(), ParameterError> {
        match result {
            Ok(()) => {
                self.parameters_dirty = true;
                info!("Parameter {name} set to {value}");
                Ok(())
            }
            Err(e) => {
                warn!("Parameter write rejected: {e}");
                Err(e)
            }
        }
    }

    /// Staged parameters (validated).
    #[inline]
    pub fn parameters(&self) -> Parameters {
        self.parameters
    }

    /// Parameters written since the last call, if any.
    pub fn take_parameters(&mut self) -> Option<Parameters> {
        std::mem::take(&mut self.parameters_dirty).then_some(self.parameters)
    }

    /// Requests for the next scan. Pulses are cleared, jog is kept.
    pub fn take_commands(&mut self) -> OperatorCommands {
        let commands = self.pending;
        self.pending = OperatorCommands {
            jog: commands.jog,
            ..OperatorCommands::default()
        };
        commands
    }

    /// Store the status committed by the last scan.
    pub fn publish(&mut self, status: StatusView) {
        self.status = status;
    }

    /// Last committed status.
    #[inline]
    pub fn status(&self) -> &StatusView {
        &self.status
    }
}

impl Default for OperatorPanel {
    fn default() -> Self {
        Self::new(Parameters::default())
    }
}
