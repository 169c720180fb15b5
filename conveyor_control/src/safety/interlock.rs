//! E-stop latch and composite safe-to-run condition.
//!
//! The e-stop check runs first in every scan and cannot be bypassed by any
//! state-machine condition. Once latched, the fault stays latched after the
//! circuit is restored, until an explicit acknowledge arrives while the
//! circuit is healthy.
//!
//! `safe_to_run = estop_ok && !latched && stop_ok`

use tracing::{debug, info, warn};

/// Per-scan result of the interlock evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterlockStatus {
    /// E-stop latch after this scan's evaluation.
    pub estop_latched: bool,
    /// Composite run permission.
    pub safe_to_run: bool,
}

/// Safety interlock holding the e-stop latch.
#[derive(Debug, Clone, Default)]
pub struct SafetyInterlock {
    latched: bool,
}

impl SafetyInterlock {
    pub const fn new() -> Self {
        Self { latched: false }
    }

    #[inline]
    pub const fn is_latched(&self) -> bool {
        self.latched
    }

    /// Evaluate the interlock for one scan.
    ///
    /// The latch is set before the acknowledge is considered, so an
    /// acknowledge arriving with the circuit open never releases it.
    pub fn check(&mut self, estop_ok: bool, stop_ok: bool, acknowledge: bool) -> InterlockStatus {
        if !estop_ok && !self.latched {
            self.latched = true;
            warn!("E-stop circuit opened, safety latch set");
        }
        if acknowledge {
            self.release(estop_ok);
        }

        InterlockStatus {
            estop_latched: self.latched,
            safe_to_run: Self::safe_to_run(estop_ok, self.latched, stop_ok),
        }
    }

    fn release(&mut self, estop_ok: bool) {
        match (self.latched, estop_ok) {
            (true, true) => {
                self.latched = false;
                info!("E-stop latch acknowledged");
            }
            (true, false) => debug!("Acknowledge ignored: e-stop circuit still open"),
            (false, _) => {}
        }
    }

    /// Pure floor-gate term, recomputed from raw inputs.
    #[inline]
    pub const fn safe_to_run(estop_ok: bool, latched: bool, stop_ok: bool) -> bool {
        estop_ok && !latched && stop_ok
    }
}
