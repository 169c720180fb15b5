//! Elapsed-duration timer.
//!
//! Accumulates one scan period per scan while its condition holds and resets
//! to zero the scan the condition drops. Basis for the startup delay and the
//! per-photoeye jam timers.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElapsedTimer {
    /// Amount added per scan.
    period: Duration,
    elapsed: Duration,
}

impl ElapsedTimer {
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            elapsed: Duration::ZERO,
        }
    }

    /// Advance one scan: accumulate while `condition`, otherwise reset.
    ///
    /// Returns the elapsed time after the update.
    #[inline]
    pub fn update(&mut self, condition: bool) -> Duration {
        if condition {
            self.accumulate();
        } else {
            self.reset();
        }
        self.elapsed
    }

    /// Add one scan period (saturating).
    #[inline]
    pub fn accumulate(&mut self) {
        self.elapsed = self.elapsed.saturating_add(self.period);
    }

    #[inline]
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    #[inline]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns true once the elapsed time reached `threshold`.
    #[inline]
    pub fn has_reached(&self, threshold: Duration) -> bool {
        self.elapsed >= threshold
    }

    #[inline]
    pub const fn period(&self) -> Duration {
        self.period
    }
}
