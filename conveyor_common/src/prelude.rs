//! Prelude module for common re-exports.
//!
//! # Usage
//!
//! ```rust
//! use conveyor_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};
pub use crate::line::config::EngineConfig;

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{PHOTOEYE_COUNT, SCAN_PERIOD_US};

// ─── Line Types ─────────────────────────────────────────────────────
pub use crate::line::io::{InputBits, InputSnapshot, OutputBits, OutputCommand};
pub use crate::line::metrics::MetricsSnapshot;
pub use crate::line::params::{ParameterError, Parameters};
pub use crate::line::state::{FaultCode, Photoeye, RunMode, SystemState};
pub use crate::line::status::StatusView;
