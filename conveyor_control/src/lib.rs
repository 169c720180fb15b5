//! # Conveyor Control Library
//!
//! Fixed-cycle control engine for a single-belt conveyor line with a
//! diverter. Every scan (10 ms by default) latches one input image,
//! evaluates the safety interlock, jam detection, state machine, routing
//! and metrics in a fixed order, and commits one output command.
//!
//! ## Components
//!
//! 1. **Safety interlock** ([`safety`]): e-stop latch and the composite
//!    safe-to-run term, evaluated first in every scan.
//! 2. **Jam detector** ([`jam`]): per-photoeye blocked timers.
//! 3. **State machine** ([`state`]): Stopped / Starting / Running / Fault.
//! 4. **Diverter router** ([`routing`]): every third box to reject.
//! 5. **Metrics** ([`metrics`]): counts, times, throughput, uptime.
//! 6. **Orchestrator** ([`engine`]): owns all of the above.
//!
//! ## No Allocation in the Scan
//!
//! All engine state is fixed-size. The transition journal is a
//! `heapless::Deque`; the scan performs no heap allocation.

#![deny(clippy::disallowed_types)]

pub mod config;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod io;
pub mod jam;
pub mod metrics;
pub mod operator;
pub mod routing;
pub mod safety;
pub mod scan;
pub mod signal;
pub mod sim;
pub mod state;
