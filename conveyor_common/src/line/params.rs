//! Operator-tunable parameters with strict range validation.
//!
//! Writes outside the documented range are rejected, never clamped.
//! A rejected write leaves the current value unchanged.

use core::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{
    CONVEYOR_SPEED_DEFAULT, CONVEYOR_SPEED_MAX, CONVEYOR_SPEED_MIN, JAM_TIMEOUT_SEC_DEFAULT,
    JAM_TIMEOUT_SEC_MAX, JAM_TIMEOUT_SEC_MIN,
};

/// Accepted jam timeout range [s].
pub const JAM_TIMEOUT_RANGE: RangeInclusive<f64> = JAM_TIMEOUT_SEC_MIN..=JAM_TIMEOUT_SEC_MAX;

/// Accepted conveyor speed range [fraction].
pub const CONVEYOR_SPEED_RANGE: RangeInclusive<f64> = CONVEYOR_SPEED_MIN..=CONVEYOR_SPEED_MAX;

/// Parameter write rejection.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ParameterError {
    #[error("jam_timeout_sec {0} out of range [{min}, {max}]", min = JAM_TIMEOUT_SEC_MIN, max = JAM_TIMEOUT_SEC_MAX)]
    JamTimeoutOutOfRange(f64),

    #[error("conveyor_speed {0} out of range [{min}, {max}]", min = CONVEYOR_SPEED_MIN, max = CONVEYOR_SPEED_MAX)]
    ConveyorSpeedOutOfRange(f64),
}

/// Operator-tunable settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    /// Blocked time after which a photoeye reports a jam [s].
    #[serde(default = "default_jam_timeout")]
    jam_timeout_sec: f64,

    /// Belt speed as a fraction of full speed, consumed by the process side.
    #[serde(default = "default_conveyor_speed")]
    conveyor_speed: f64,
}

fn default_jam_timeout() -> f64 {
    JAM_TIMEOUT_SEC_DEFAULT
}
fn default_conveyor_speed() -> f64 {
    CONVEYOR_SPEED_DEFAULT
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            jam_timeout_sec: JAM_TIMEOUT_SEC_DEFAULT,
            conveyor_speed: CONVEYOR_SPEED_DEFAULT,
        }
    }
}

impl Parameters {
    /// Build validated parameters.
    pub fn new(jam_timeout_sec: f64, conveyor_speed: f64) -> Result<Self, ParameterError> {
        let mut params = Self::default();
        params.set_jam_timeout_sec(jam_timeout_sec)?;
        params.set_conveyor_speed(conveyor_speed)?;
        Ok(params)
    }

    #[inline]
    pub const fn jam_timeout_sec(&self) -> f64 {
        self.jam_timeout_sec
    }

    /// Jam timeout as a duration.
    #[inline]
    pub fn jam_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.jam_timeout_sec)
    }

    #[inline]
    pub const fn conveyor_speed(&self) -> f64 {
        self.conveyor_speed
    }

    /// Set the jam timeout. Rejects NaN and values outside [1.0, 10.0].
    pub fn set_jam_timeout_sec(&mut self, value: f64) -> Result<(), ParameterError> {
        validate_jam_timeout(value)?;
        self.jam_timeout_sec = value;
        Ok(())
    }

    /// Set the conveyor speed. Rejects NaN and values outside [0.1, 1.0].
    pub fn set_conveyor_speed(&mut self, value: f64) -> Result<(), ParameterError> {
        validate_conveyor_speed(value)?;
        self.conveyor_speed = value;
        Ok(())
    }

    /// Re-check both fields (e.g. after deserialization).
    pub fn validate(&self) -> Result<(), ParameterError> {
        validate_jam_timeout(self.jam_timeout_sec)?;
        validate_conveyor_speed(self.conveyor_speed)
    }
}

/// NaN never satisfies `RangeInclusive::contains`, so it is rejected too.
pub fn validate_jam_timeout(value: f64) -> Result<(), ParameterError> {
    if JAM_TIMEOUT_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(ParameterError::JamTimeoutOutOfRange(value))
    }
}

pub fn validate_conveyor_speed(value: f64) -> Result<(), ParameterError> {
    if CONVEYOR_SPEED_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(ParameterError::ConveyorSpeedOutOfRange(value))
    }
}
