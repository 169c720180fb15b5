//! Engine timing configuration.
//!
//! All fields have serde defaults so an empty `[engine]` table is valid.
//! Numeric parameters have const `MIN`/`MAX` bounds in [`crate::consts`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::consts::{
    BLINK_HALF_PERIOD_SEC, SCAN_PERIOD_US, SCAN_PERIOD_US_MAX, SCAN_PERIOD_US_MIN,
    STARTUP_DELAY_SEC,
};

/// Scan timing configuration of the control engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Fixed scan period in microseconds (default: 10 000 = 10 ms).
    #[serde(default = "default_scan_period_us")]
    pub scan_period_us: u32,

    /// Pre-run delay in `Starting` [s] (default: 1.0).
    #[serde(default = "default_startup_delay")]
    pub startup_delay_sec: f64,

    /// Half-period of the green blink during `Starting` [s] (default: 0.5).
    #[serde(default = "default_blink_half_period")]
    pub blink_half_period_sec: f64,
}

fn default_scan_period_us() -> u32 {
    SCAN_PERIOD_US
}
fn default_startup_delay() -> f64 {
    STARTUP_DELAY_SEC
}
fn default_blink_half_period() -> f64 {
    BLINK_HALF_PERIOD_SEC
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan_period_us: SCAN_PERIOD_US,
            startup_delay_sec: STARTUP_DELAY_SEC,
            blink_half_period_sec: BLINK_HALF_PERIOD_SEC,
        }
    }
}

impl EngineConfig {
    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_period_us < SCAN_PERIOD_US_MIN || self.scan_period_us > SCAN_PERIOD_US_MAX {
            return Err(ConfigError::ValidationError(format!(
                "scan_period_us {} out of range [{}, {}]",
                self.scan_period_us, SCAN_PERIOD_US_MIN, SCAN_PERIOD_US_MAX
            )));
        }
        if !(self.startup_delay_sec.is_finite() && self.startup_delay_sec > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "startup_delay_sec {} must be a positive number",
                self.startup_delay_sec
            )));
        }
        if !(self.blink_half_period_sec.is_finite() && self.blink_half_period_sec > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "blink_half_period_sec {} must be a positive number",
                self.blink_half_period_sec
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn scan_period(&self) -> Duration {
        Duration::from_micros(u64::from(self.scan_period_us))
    }

    #[inline]
    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs_f64(self.startup_delay_sec)
    }

    #[inline]
    pub fn blink_half_period(&self) -> Duration {
        Duration::from_secs_f64(self.blink_half_period_sec)
    }
}
