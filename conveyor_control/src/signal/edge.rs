//! Rising/falling edge detection on a boolean signal.
//!
//! The detector remembers the previous scan's sample. Call [`EdgeDetector::update`]
//! exactly once per scan per signal; the returned [`Edge`] describes the
//! transition between the previous and the current sample.

/// Transition of a boolean signal between two consecutive scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Edge {
    /// Signal unchanged.
    #[default]
    None,
    /// false → true.
    Rising,
    /// true → false.
    Falling,
}

impl Edge {
    #[inline]
    pub const fn is_rising(&self) -> bool {
        matches!(self, Self::Rising)
    }

    #[inline]
    pub const fn is_falling(&self) -> bool {
        matches!(self, Self::Falling)
    }
}

/// Stateful edge observer for one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDetector {
    previous: bool,
}

impl EdgeDetector {
    /// Detector whose previous sample is `initial`.
    ///
    /// NC signals should start `true` so power-up does not read as a press.
    pub const fn new(initial: bool) -> Self {
        Self { previous: initial }
    }

    /// Sample the signal for this scan and report the transition.
    #[inline]
    pub fn update(&mut self, current: bool) -> Edge {
        let edge = match (self.previous, current) {
            (false, true) => Edge::Rising,
            (true, false) => Edge::Falling,
            _ => Edge::None,
        };
        self.previous = current;
        edge
    }

    /// Sample from the previous scan.
    #[inline]
    pub const fn previous(&self) -> bool {
        self.previous
    }
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::new(false)
    }
}
