//! Diverter routing.
//!
//! Every infeed rising edge counts a box. When the count is a multiple of
//! three the box is marked for rejection. The decision is buffered until the
//! box reaches the diverter: the actuator extends on the diverter photoeye
//! rising edge and retracts (and drops the pending mark) on its falling edge.
//!
//! Actuation is only enabled in `Running(Auto)`. Outside it the actuator is
//! forced retracted regardless of any buffered decision.

use conveyor_common::consts::REJECT_EVERY_NTH_BOX;
use tracing::debug;

use crate::scan::ScanContext;

/// Routing counters exposed for display and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoutingState {
    /// Boxes seen at the infeed.
    pub box_counter: u64,
    /// Next box at the diverter is to be rejected.
    pub pending_reject: bool,
    /// Actuator commanded extended.
    pub extended: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DiverterRouter {
    state: RoutingState,
}

impl DiverterRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one scan and return the actuator command.
    ///
    /// `enabled` is true only while the line is in `Running(Auto)` after
    /// this scan's transition.
    pub fn evaluate(&mut self, ctx: &ScanContext, enabled: bool) -> bool {
        let st = &mut self.state;

        if ctx.edges.infeed.is_rising() {
            st.box_counter += 1;
            st.pending_reject = st.box_counter % REJECT_EVERY_NTH_BOX == 0;
            debug!(
                "box #{} at infeed, {}",
                st.box_counter,
                if st.pending_reject { "reject" } else { "accept" }
            );
        }

        if ctx.edges.diverter.is_rising() && enabled && st.pending_reject {
            st.extended = true;
            debug!("diverter extended for box #{}", st.box_counter);
        }

        if ctx.edges.diverter.is_falling() {
            st.extended = false;
            st.pending_reject = false;
        }

        // Re-enabling mid-box must not extend onto a box already in the gate.
        if !enabled {
            st.extended = false;
        }

        st.extended
    }

    #[inline]
    pub fn state(&self) -> RoutingState {
        self.state
    }

    #[inline]
    pub fn box_counter(&self) -> u64 {
        self.state.box_counter
    }
}
