//! Signal primitives shared by every component.
//!
//! Edge detection, elapsed-duration timing and blink generation.

pub mod blink;
pub mod edge;
pub mod timer;

pub use blink::Blinker;
pub use edge::{Edge, EdgeDetector};
pub use timer::ElapsedTimer;
