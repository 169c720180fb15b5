//! System-wide constants for the conveyor workspace.
//!
//! Single source of truth for numeric limits and defaults.
//! Imported by all crates; not duplicated elsewhere.

use static_assertions::const_assert;

/// Default scan period in microseconds (100 Hz).
pub const SCAN_PERIOD_US: u32 = 10_000;

/// Shortest accepted scan period [µs].
pub const SCAN_PERIOD_US_MIN: u32 = 10_000;

/// Longest accepted scan period [µs].
pub const SCAN_PERIOD_US_MAX: u32 = 20_000;

/// Pre-run delay spent in `Starting` before the belt may run [s].
pub const STARTUP_DELAY_SEC: f64 = 1.0;

/// Half-period of the status indicator blink [s].
pub const BLINK_HALF_PERIOD_SEC: f64 = 0.5;

/// Default jam timeout [s].
pub const JAM_TIMEOUT_SEC_DEFAULT: f64 = 4.0;
/// Lower bound for the jam timeout [s].
pub const JAM_TIMEOUT_SEC_MIN: f64 = 1.0;
/// Upper bound for the jam timeout [s].
pub const JAM_TIMEOUT_SEC_MAX: f64 = 10.0;

/// Default conveyor speed [fraction of full belt speed].
pub const CONVEYOR_SPEED_DEFAULT: f64 = 1.0;
/// Lower bound for the conveyor speed.
pub const CONVEYOR_SPEED_MIN: f64 = 0.1;
/// Upper bound for the conveyor speed.
pub const CONVEYOR_SPEED_MAX: f64 = 1.0;

/// Every N-th box entering the infeed is routed to the reject station.
pub const REJECT_EVERY_NTH_BOX: u64 = 3;

/// Number of photoeyes on the line.
pub const PHOTOEYE_COUNT: usize = 4;

/// Capacity of the transition journal.
pub const JOURNAL_CAPACITY: usize = 32;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/conveyor.toml";

const_assert!(SCAN_PERIOD_US_MIN <= SCAN_PERIOD_US);
const_assert!(SCAN_PERIOD_US <= SCAN_PERIOD_US_MAX);
const_assert!(REJECT_EVERY_NTH_BOX > 0);
const_assert!(JOURNAL_CAPACITY > 0);
