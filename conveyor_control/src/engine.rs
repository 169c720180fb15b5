//! Scan orchestrator.
//!
//! One call to [`ControlEngine::scan`] is one fixed-period control cycle:
//!
//! 1. Sample every edge detector into a [`ScanContext`].
//! 2. Safety interlock (latch, then acknowledge release).
//! 3. Jam acknowledge and jam timers (armed only if the scan began in
//!    `Running`).
//! 4. State transition, at most one per scan.
//! 5. Outputs: floor-gated motor, diverter routing, indicators.
//! 6. Metrics accumulation, then any reset request.
//!
//! Outputs are computed from the post-transition state and returned whole.
//! The engine owns all mutable line state; nothing else writes to it.

use std::time::Duration;

use conveyor_common::consts::JOURNAL_CAPACITY;
use conveyor_common::line::config::EngineConfig;
use conveyor_common::line::io::{InputSnapshot, OutputCommand};
use conveyor_common::line::metrics::MetricsSnapshot;
use conveyor_common::line::params::Parameters;
use conveyor_common::line::state::{FaultCode, Photoeye, RunMode, SystemState};
use conveyor_common::line::status::StatusView;
use heapless::Deque;
use tracing::{debug, info, warn};

use crate::jam::{JamDetector, JamStatus};
use crate::metrics::MetricsAggregator;
use crate::operator::OperatorCommands;
use crate::routing::{DiverterRouter, RoutingState};
use crate::safety::interlock::SafetyInterlock;
use crate::scan::{EdgeBank, ScanContext, stop_request};
use crate::signal::{Blinker, ElapsedTimer};
use crate::state::{LineStateMachine, ScanConditions, TransitionReason, TransitionResult};

/// One entry of the transition journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRecord {
    pub cycle: u64,
    pub from: SystemState,
    pub to: SystemState,
    pub reason: TransitionReason,
    /// Fault code committed by the transitioning scan.
    pub fault: FaultCode,
}

/// Fixed-cycle conveyor control engine.
#[derive(Debug)]
pub struct ControlEngine {
    scan_period: Duration,
    startup_delay: Duration,
    cycle: u64,
    now: Duration,
    machine: LineStateMachine,
    edges: EdgeBank,
    interlock: SafetyInterlock,
    jam: JamDetector,
    router: DiverterRouter,
    metrics: MetricsAggregator,
    startup_timer: ElapsedTimer,
    blinker: Blinker,
    parameters: Parameters,
    fault_code: FaultCode,
    outputs: OutputCommand,
    journal: Deque<TransitionRecord, JOURNAL_CAPACITY>,
}

impl ControlEngine {
    /// Engine in `Stopped` with all outputs off.
    pub fn new(config: &EngineConfig, parameters: Parameters) -> Self {
        let scan_period = config.scan_period();
        Self {
            scan_period,
            startup_delay: config.startup_delay(),
            cycle: 0,
            now: Duration::ZERO,
            machine: LineStateMachine::new(),
            edges: EdgeBank::new(),
            interlock: SafetyInterlock::new(),
            jam: JamDetector::new(scan_period, parameters.jam_timeout()),
            router: DiverterRouter::new(),
            metrics: MetricsAggregator::new(scan_period),
            startup_timer: ElapsedTimer::new(scan_period),
            blinker: Blinker::new(config.blink_half_period(), scan_period),
            parameters,
            fault_code: FaultCode::None,
            outputs: OutputCommand::OFF,
            journal: Deque::new(),
        }
    }

    /// Execute one scan.
    pub fn scan(&mut self, inputs: &InputSnapshot, commands: &OperatorCommands) -> OutputCommand {
        self.cycle += 1;
        self.now += self.scan_period;

        let state = self.machine.state();
        let ctx = ScanContext {
            cycle: self.cycle,
            now: self.now,
            inputs: *inputs,
            commands: *commands,
            edges: self.edges.sample(inputs, commands),
            state,
        };

        // Acknowledge is only meaningful in Fault.
        let acknowledged = state.is_fault() && ctx.edges.acknowledge.is_rising();
        let interlock = self
            .interlock
            .check(inputs.estop_ok, inputs.stop_ok, acknowledged);
        if acknowledged {
            self.jam.acknowledge(inputs.photoeyes());
        }
        let jam = self.jam.evaluate(inputs.photoeyes(), state.is_running());
        self.startup_timer.update(state == SystemState::Starting);

        let conditions = ScanConditions {
            estop_latched: interlock.estop_latched,
            safe_to_run: interlock.safe_to_run,
            active_fault: if interlock.estop_latched {
                FaultCode::EStop
            } else {
                jam.fault_code()
            },
            start_requested: ctx.edges.start.is_rising(),
            stop_requested: ctx.edges.stop.is_rising(),
            stop_held: stop_request(inputs, commands),
            acknowledged,
            blocked: Photoeye::ALL.into_iter().find(|pe| inputs.photoeye(*pe)),
            startup_elapsed: self.startup_timer.has_reached(self.startup_delay),
            mode: RunMode::from_selector(inputs.mode_manual),
        };

        let mut fault_entry = None;
        match self.machine.evaluate(&conditions) {
            TransitionResult::Ok(next, reason) => {
                if let TransitionReason::Obstruction(pe) = reason {
                    self.jam.raise(pe);
                }
                if next.is_fault() {
                    fault_entry = Some(self.active_fault());
                }
                self.enter(state, next, reason);
            }
            TransitionResult::Rejected(why) => debug!("{why}"),
            TransitionResult::Hold => {}
        }

        let next = self.machine.state();
        self.fault_code = if next.is_fault() {
            self.active_fault()
        } else {
            FaultCode::None
        };
        let outputs = self.compute_outputs(&ctx, next);
        self.metrics.evaluate(&ctx, next, fault_entry);

        self.outputs = outputs;
        outputs
    }

    /// Fault implied by the current latches. E-stop outranks a jam.
    fn active_fault(&self) -> FaultCode {
        if self.interlock.is_latched() {
            FaultCode::EStop
        } else {
            self.jam.latched().map_or(FaultCode::None, |pe| pe.jam_code())
        }
    }

    fn enter(&mut self, from: SystemState, to: SystemState, reason: TransitionReason) {
        let fault = if to.is_fault() {
            self.active_fault()
        } else {
            FaultCode::None
        };
        if to.is_fault() {
            warn!("{from} -> {to} ({reason}): {}", fault.message());
        } else {
            info!("{from} -> {to} ({reason})");
        }

        if to == SystemState::Starting {
            self.startup_timer.reset();
            self.blinker.restart();
        }

        if self.journal.is_full() {
            self.journal.pop_front();
        }
        // Cannot fail: a slot was freed above.
        let _ = self.journal.push_back(TransitionRecord {
            cycle: self.cycle,
            from,
            to,
            reason,
            fault,
        });
    }

    fn compute_outputs(&mut self, ctx: &ScanContext, state: SystemState) -> OutputCommand {
        let floor = SafetyInterlock::safe_to_run(
            ctx.inputs.estop_ok,
            self.interlock.is_latched(),
            ctx.inputs.stop_ok,
        );
        let run_term = match state {
            SystemState::Running(RunMode::Auto) => true,
            SystemState::Running(RunMode::Manual) => ctx.commands.jog,
            _ => false,
        };
        let diverter = self
            .router
            .evaluate(ctx, state == SystemState::Running(RunMode::Auto));
        let green = match state {
            SystemState::Running(_) => true,
            SystemState::Starting => self.blinker.tick(),
            SystemState::Stopped | SystemState::Fault => false,
        };
        let fault = state.is_fault();

        OutputCommand {
            motor: run_term && floor,
            diverter,
            buzzer: fault,
            green,
            red: fault,
        }
    }

    /// Replace the operator parameters. Takes effect from the next scan.
    pub fn apply_parameters(&mut self, parameters: Parameters) {
        if parameters != self.parameters {
            info!(
                "Parameters applied: jam_timeout={:.2}s speed={:.2}",
                parameters.jam_timeout_sec(),
                parameters.conveyor_speed()
            );
        }
        self.parameters = parameters;
        self.jam.set_threshold(parameters.jam_timeout());
    }

    /// Status view committed by the last scan.
    pub fn status(&self) -> StatusView {
        let state = self.machine.state();
        StatusView {
            cycle: self.cycle,
            state,
            state_code: state.code(),
            run_mode: state.run_mode(),
            fault_code: self.fault_code,
            fault_message: self.fault_code.message(),
            outputs: self.outputs,
            metrics: self.metrics.snapshot(),
            parameters: self.parameters,
            box_counter: self.router.box_counter(),
        }
    }

    #[inline]
    pub fn state(&self) -> SystemState {
        self.machine.state()
    }

    #[inline]
    pub fn fault_code(&self) -> FaultCode {
        self.fault_code
    }

    #[inline]
    pub fn outputs(&self) -> OutputCommand {
        self.outputs
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn routing(&self) -> RoutingState {
        self.router.state()
    }

    pub fn jam_statuses(&self) -> [JamStatus; 4] {
        self.jam.statuses()
    }

    #[inline]
    pub fn estop_latched(&self) -> bool {
        self.interlock.is_latched()
    }

    #[inline]
    pub fn parameters(&self) -> Parameters {
        self.parameters
    }

    /// Scans executed so far.
    #[inline]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    #[inline]
    pub fn scan_period(&self) -> Duration {
        self.scan_period
    }

    /// Recent transitions, oldest first.
    pub fn journal(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.journal.iter()
    }
}
