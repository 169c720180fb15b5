//! Line state machine module root.
//!
//! The transition table is a pure function of the current state and the
//! conditions gathered by the engine for one scan.

pub mod machine;

pub use machine::{LineStateMachine, ScanConditions, TransitionReason, TransitionResult};
