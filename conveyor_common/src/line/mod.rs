//! Conveyor line shared types.
//!
//! Everything exchanged between the control engine, the process side and
//! the operator display lives here: state enums, the I/O images, operator
//! parameters, metrics and status views, and engine configuration.

pub mod config;
pub mod io;
pub mod metrics;
pub mod params;
pub mod state;
pub mod status;
