//! Safety module root.
//!
//! E-stop latching and the composite safe-to-run condition.

pub mod interlock;
