//! Process-side I/O boundary.
//!
//! The engine never touches hardware. A [`ProcessIo`] implementation
//! latches the input image at the start of each scan and receives the whole
//! output command at its end.

use conveyor_common::line::io::{InputSnapshot, OutputCommand};
use conveyor_common::line::params::Parameters;

use crate::error::IoError;

/// Source of inputs and sink of outputs for the scan loop.
pub trait ProcessIo {
    /// Latch the input image for the coming scan.
    fn read_inputs(&mut self) -> Result<InputSnapshot, IoError>;

    /// Commit the output command of the finished scan.
    fn write_outputs(&mut self, outputs: &OutputCommand) -> Result<(), IoError>;

    /// Receive parameters applied at a cycle boundary (e.g. belt speed).
    fn apply_parameters(&mut self, _parameters: &Parameters) {}
}

/// In-memory process image: inputs set by the caller, outputs recorded.
#[derive(Debug, Clone, Default)]
pub struct LoopbackIo {
    pub inputs: InputSnapshot,
    pub outputs: OutputCommand,
    /// Parameters last forwarded by the runner.
    pub parameters: Option<Parameters>,
    /// Completed write cycles.
    pub writes: u64,
}

impl LoopbackIo {
    pub fn new(inputs: InputSnapshot) -> Self {
        Self {
            inputs,
            ..Default::default()
        }
    }
}

impl ProcessIo for LoopbackIo {
    fn read_inputs(&mut self) -> Result<InputSnapshot, IoError> {
        Ok(self.inputs)
    }

    fn write_outputs(&mut self, outputs: &OutputCommand) -> Result<(), IoError> {
        self.outputs = *outputs;
        self.writes += 1;
        Ok(())
    }

    fn apply_parameters(&mut self, parameters: &Parameters) {
        self.parameters = Some(*parameters);
    }
}
