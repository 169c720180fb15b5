//! Square-wave generator for blinking indicators.

use std::time::Duration;

/// Blink generator counted in scans.
///
/// Lit for the first half-period after [`Blinker::restart`], dark for the
/// next, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blinker {
    half_period_scans: u64,
    scans: u64,
}

impl Blinker {
    /// `half_period` is rounded up to whole scans (minimum one).
    pub fn new(half_period: Duration, scan_period: Duration) -> Self {
        let scan_ns = scan_period.as_nanos().max(1);
        let half_ns = half_period.as_nanos();
        let half_period_scans = half_ns.div_ceil(scan_ns).max(1) as u64;
        Self {
            half_period_scans,
            scans: 0,
        }
    }

    /// Restart the phase so the next output is lit.
    #[inline]
    pub fn restart(&mut self) {
        self.scans = 0;
    }

    /// Output for this scan, then advance one scan.
    #[inline]
    pub fn tick(&mut self) -> bool {
        let lit = (self.scans / self.half_period_scans) % 2 == 0;
        self.scans = self.scans.wrapping_add(1);
        lit
    }

    #[inline]
    pub const fn half_period_scans(&self) -> u64 {
        self.half_period_scans
    }
}
