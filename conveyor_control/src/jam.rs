//! Per-photoeye jam detection.
//!
//! One [`ElapsedTimer`] per photoeye. A timer accumulates while its photoeye
//! is blocked and the detector is armed (line running), and resets the scan
//! the photoeye clears. The first timer to reach the jam timeout latches a
//! located jam; simultaneous crossings resolve by fixed priority
//! Infeed > Diverter > OutfeedB > OutfeedC.
//!
//! A latched jam clears only on acknowledge while the triggering photoeye is
//! clear. Acknowledging a still-blocked photoeye changes nothing.

use std::time::Duration;

use conveyor_common::line::state::{FaultCode, Photoeye};
use tracing::{debug, info, warn};

use crate::signal::ElapsedTimer;

/// Tracking state of one photoeye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JamStatus {
    pub blocked: bool,
    pub blocked_duration: Duration,
    /// Shared jam timeout [s].
    pub threshold_sec: f64,
}

/// Per-scan jam evaluation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JamReport {
    /// Latched jam location after this scan.
    pub active: Option<Photoeye>,
}

impl JamReport {
    /// Fault code of the latched jam (`FaultCode::None` when clear).
    #[inline]
    pub fn fault_code(&self) -> FaultCode {
        self.active.map_or(FaultCode::None, |pe| pe.jam_code())
    }
}

#[derive(Debug, Clone)]
pub struct JamDetector {
    timers: [ElapsedTimer; 4],
    blocked: [bool; 4],
    threshold: Duration,
    latched: Option<Photoeye>,
}

impl JamDetector {
    pub fn new(scan_period: Duration, threshold: Duration) -> Self {
        Self {
            timers: [ElapsedTimer::new(scan_period); 4],
            blocked: [false; 4],
            threshold,
            latched: None,
        }
    }

    /// Update the shared jam timeout. Applied at a scan boundary.
    pub fn set_threshold(&mut self, threshold: Duration) {
        if threshold != self.threshold {
            debug!(
                "jam timeout {:.2}s -> {:.2}s",
                self.threshold.as_secs_f64(),
                threshold.as_secs_f64()
            );
            self.threshold = threshold;
        }
    }

    #[inline]
    pub const fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Latched jam location, if any.
    #[inline]
    pub const fn latched(&self) -> Option<Photoeye> {
        self.latched
    }

    /// Advance all four timers one scan and latch a jam on threshold crossing.
    ///
    /// `photoeyes` in priority order; `armed` is false outside `Running`,
    /// which holds every timer at zero.
    pub fn evaluate(&mut self, photoeyes: [bool; 4], armed: bool) -> JamReport {
        for pe in Photoeye::ALL {
            let i = pe.index();
            self.blocked[i] = photoeyes[i];
            self.timers[i].update(armed && photoeyes[i]);
        }

        if self.latched.is_none() {
            let crossed = Photoeye::ALL
                .into_iter()
                .find(|pe| self.timers[pe.index()].has_reached(self.threshold));
            if let Some(pe) = crossed {
                self.latched = Some(pe);
                warn!(
                    "Jam at {pe}: blocked {:.2}s >= {:.2}s",
                    self.timers[pe.index()].elapsed().as_secs_f64(),
                    self.threshold.as_secs_f64()
                );
            }
        }

        JamReport {
            active: self.latched,
        }
    }

    /// Latch a jam at `pe` directly (obstruction found during start checks).
    pub fn raise(&mut self, pe: Photoeye) {
        if self.latched.is_none() {
            self.latched = Some(pe);
            warn!("Obstruction at {pe} during start-up");
        }
    }

    /// Clear the latched jam if its photoeye is clear.
    pub fn acknowledge(&mut self, photoeyes: [bool; 4]) {
        match self.latched {
            Some(pe) if !photoeyes[pe.index()] => {
                self.latched = None;
                info!("Jam at {pe} acknowledged");
            }
            Some(pe) => debug!("Acknowledge ignored: {pe} still blocked"),
            None => {}
        }
    }

    /// Blocked time of one photoeye.
    #[inline]
    pub fn blocked_duration(&self, pe: Photoeye) -> Duration {
        self.timers[pe.index()].elapsed()
    }

    /// Tracking state of every photoeye in priority order.
    pub fn statuses(&self) -> [JamStatus; 4] {
        let threshold_sec = self.threshold.as_secs_f64();
        Photoeye::ALL.map(|pe| JamStatus {
            blocked: self.blocked[pe.index()],
            blocked_duration: self.timers[pe.index()].elapsed(),
            threshold_sec,
        })
    }
}
