//! Conveyor Common Library
//!
//! Shared constants, types and configuration loading utilities for all
//! conveyor workspace crates.
//!
//! # Module Structure
//!
//! - [`line`] - Line state, I/O images, parameters, metrics and status
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - System-wide limits and defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use conveyor_common::prelude::*;
//!
//! let status = StatusView::default();
//! assert_eq!(status.state, SystemState::Stopped);
//! ```

pub mod config;
pub mod consts;
pub mod line;
pub mod prelude;
