//! `SystemState` transitions.
//!
//! Stopped → Starting → Running(Auto|Manual) → Stopped, with any state
//! falling into Fault and Fault returning to Stopped on acknowledge.
//!
//! Rules are evaluated in priority order, at most one transition per scan:
//!
//! 1. E-stop latched forces `Fault` from every state.
//! 2. `Starting`: a latched fault or a blocked photoeye → `Fault`; a stop
//!    request aborts to `Stopped`; the elapsed startup delay → `Running`.
//! 3. `Running`: a latched jam → `Fault` (wins over a same-scan stop).
//! 4. `Running`: stop request rising edge → `Stopped`.
//! 5. `Stopped`: start request rising edge with run permission, no active
//!    fault and all photoeyes clear → `Starting`.
//! 6. `Fault`: acknowledge with every latch released → `Stopped`.

use core::fmt;

use conveyor_common::line::state::{FaultCode, Photoeye, RunMode, SystemState};

/// Everything the transition table looks at, gathered once per scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConditions {
    /// E-stop latch after this scan's interlock evaluation.
    pub estop_latched: bool,
    pub safe_to_run: bool,
    /// Active fault after acknowledge handling and jam evaluation.
    pub active_fault: FaultCode,
    /// Start request rising edge.
    pub start_requested: bool,
    /// Stop request rising edge.
    pub stop_requested: bool,
    /// Stop request level (button pressed or panel pulse).
    pub stop_held: bool,
    /// Acknowledge rising edge.
    pub acknowledged: bool,
    /// Highest-priority blocked photoeye.
    pub blocked: Option<Photoeye>,
    /// Startup delay has elapsed in `Starting`.
    pub startup_elapsed: bool,
    /// Mode selector position.
    pub mode: RunMode,
}

impl Default for ScanConditions {
    fn default() -> Self {
        Self {
            estop_latched: false,
            safe_to_run: true,
            active_fault: FaultCode::None,
            start_requested: false,
            stop_requested: false,
            stop_held: false,
            acknowledged: false,
            blocked: None,
            startup_elapsed: false,
            mode: RunMode::Auto,
        }
    }
}

/// Why a transition fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionReason {
    EStop,
    Jam(Photoeye),
    /// Photoeye blocked during the startup delay.
    Obstruction(Photoeye),
    StartRequest,
    StartupComplete,
    StartAborted,
    StopRequest,
    ModeChange,
    FaultCleared,
}

impl fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EStop => write!(f, "e-stop"),
            Self::Jam(pe) => write!(f, "jam at {pe}"),
            Self::Obstruction(pe) => write!(f, "{pe} blocked during start-up"),
            Self::StartRequest => write!(f, "start request"),
            Self::StartupComplete => write!(f, "start-up delay elapsed"),
            Self::StartAborted => write!(f, "stop during start-up"),
            Self::StopRequest => write!(f, "stop request"),
            Self::ModeChange => write!(f, "mode selector"),
            Self::FaultCleared => write!(f, "fault acknowledged"),
        }
    }
}

/// Outcome of one scan's evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// No rule fired.
    Hold,
    /// Transition taken.
    Ok(SystemState, TransitionReason),
    /// A request was refused; state unchanged.
    Rejected(&'static str),
}

/// Holder of the single global `SystemState`.
#[derive(Debug, Clone, Default)]
pub struct LineStateMachine {
    state: SystemState,
}

impl LineStateMachine {
    /// New machine in `Stopped`.
    pub const fn new() -> Self {
        Self {
            state: SystemState::Stopped,
        }
    }

    #[inline]
    pub const fn state(&self) -> SystemState {
        self.state
    }

    /// Evaluate the rules for one scan and apply the result.
    pub fn evaluate(&mut self, c: &ScanConditions) -> TransitionResult {
        let result = Self::decide(self.state, c);
        if let TransitionResult::Ok(next, _) = result {
            self.state = next;
        }
        result
    }

    /// Pure transition table.
    pub fn decide(state: SystemState, c: &ScanConditions) -> TransitionResult {
        use SystemState::*;
        use TransitionResult::{Hold, Ok, Rejected};

        if c.estop_latched {
            return if state == Fault {
                Hold
            } else {
                Ok(Fault, TransitionReason::EStop)
            };
        }

        match state {
            Stopped => {
                if !c.start_requested {
                    Hold
                } else if !c.safe_to_run {
                    Rejected("start refused: not safe to run")
                } else if c.active_fault != FaultCode::None {
                    Rejected("start refused: fault active")
                } else if c.blocked.is_some() {
                    Rejected("start refused: photoeye blocked")
                } else {
                    Ok(Starting, TransitionReason::StartRequest)
                }
            }
            Starting => {
                if let Some(pe) = c.active_fault.photoeye() {
                    Ok(Fault, TransitionReason::Jam(pe))
                } else if let Some(pe) = c.blocked {
                    Ok(Fault, TransitionReason::Obstruction(pe))
                } else if c.stop_held {
                    Ok(Stopped, TransitionReason::StartAborted)
                } else if c.startup_elapsed {
                    Ok(Running(c.mode), TransitionReason::StartupComplete)
                } else {
                    Hold
                }
            }
            Running(mode) => {
                if let Some(pe) = c.active_fault.photoeye() {
                    Ok(Fault, TransitionReason::Jam(pe))
                } else if c.stop_requested {
                    Ok(Stopped, TransitionReason::StopRequest)
                } else if mode != c.mode {
                    Ok(Running(c.mode), TransitionReason::ModeChange)
                } else {
                    Hold
                }
            }
            Fault => {
                if !c.acknowledged {
                    Hold
                } else if c.active_fault == FaultCode::None {
                    Ok(Stopped, TransitionReason::FaultCleared)
                } else {
                    Rejected("acknowledge refused: fault not resolved")
                }
            }
        }
    }
}
