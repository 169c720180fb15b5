//! Runtime error types.
//!
//! Configuration errors live in `conveyor_common::config::ConfigError` and
//! parameter rejections in `conveyor_common::line::params::ParameterError`.
//! Neither ever changes line state.

use thiserror::Error;

/// Failure of the process I/O source.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("input read failed: {0}")]
    Read(String),

    #[error("output write failed: {0}")]
    Write(String),

    #[error("process source disconnected")]
    Disconnected,
}

/// Errors during RT setup or cycle execution.
#[derive(Debug, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),

    #[error("process I/O: {0}")]
    Io(#[from] IoError),
}
