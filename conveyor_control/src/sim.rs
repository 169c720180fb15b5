//! Deterministic single-box conveyor model for demonstration runs.
//!
//! Boxes arrive upstream of the infeed at a fixed interval and ride the belt
//! while the motor is on. A photoeye is blocked while the box centre is
//! within half a box length of it. The diverter actuator is read when the
//! box centre passes the diverter: extended sends it to outfeed C (reject),
//! retracted to outfeed B (accept). Only one box is on the belt at a time.
//!
//! Every `jam_every_n`-th box sticks at `jam_location` for `jam_hold_sec`;
//! after that the operator pushes it clear of the sensor. An outfeed jam
//! sticks at whichever outfeed the box was routed to.

use std::time::Duration;

use conveyor_common::config::ConfigError;
use conveyor_common::line::io::{InputSnapshot, OutputCommand};
use conveyor_common::line::params::Parameters;
use conveyor_common::line::state::{Photoeye, SystemState};
use conveyor_common::line::status::StatusView;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::IoError;
use crate::io::ProcessIo;
use crate::operator::OperatorPanel;

// ─── Configuration ──────────────────────────────────────────────────

/// `[simulation]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SimulationConfig {
    /// Demo run length [s]. Overridden by `--duration`.
    pub duration_sec: f64,
    /// Time between box arrivals [s].
    pub box_interval_sec: f64,
    /// Belt speed at `conveyor_speed = 1.0` [mm/s].
    pub belt_speed_mms: f64,
    pub box_length_mm: f64,
    pub diverter_position_mm: f64,
    pub outfeed_position_mm: f64,
    /// Every n-th box jams (0 = never).
    pub jam_every_n: u64,
    pub jam_location: Photoeye,
    /// Time a jammed box stays stuck before the operator clears it [s].
    pub jam_hold_sec: f64,
    /// Delay before the scripted operator acknowledges a fault [s].
    pub auto_ack_delay_sec: f64,
    /// Restart the line after a fault has been acknowledged.
    pub auto_restart: bool,
    /// Mode selector position.
    pub mode_manual: bool,
    /// Open the e-stop circuit at this time [s].
    pub estop_at_sec: Option<f64>,
    /// How long the e-stop circuit stays open [s].
    pub estop_hold_sec: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_sec: 120.0,
            box_interval_sec: 10.0,
            belt_speed_mms: 500.0,
            box_length_mm: 200.0,
            diverter_position_mm: 1500.0,
            outfeed_position_mm: 2500.0,
            jam_every_n: 0,
            jam_location: Photoeye::Diverter,
            jam_hold_sec: 6.0,
            auto_ack_delay_sec: 1.0,
            auto_restart: true,
            mode_manual: false,
            estop_at_sec: None,
            estop_hold_sec: 2.0,
        }
    }
}

/// Upper bound for configured model times [s].
pub const MAX_TIME_SEC: f64 = 1.0e9;

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("duration_sec", self.duration_sec),
            ("box_interval_sec", self.box_interval_sec),
            ("belt_speed_mms", self.belt_speed_mms),
            ("box_length_mm", self.box_length_mm),
            ("jam_hold_sec", self.jam_hold_sec),
            ("estop_hold_sec", self.estop_hold_sec),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::ValidationError(format!(
                    "simulation.{name} must be > 0, got {value}"
                )));
            }
        }
        if self.auto_ack_delay_sec.is_nan() || self.auto_ack_delay_sec < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "simulation.auto_ack_delay_sec must be >= 0, got {}",
                self.auto_ack_delay_sec
            )));
        }
        // Fields added to the model clock as `Duration`.
        let durations = [
            ("box_interval_sec", self.box_interval_sec),
            ("jam_hold_sec", self.jam_hold_sec),
            ("estop_hold_sec", self.estop_hold_sec),
            ("auto_ack_delay_sec", self.auto_ack_delay_sec),
        ];
        for (name, value) in durations {
            if !(value <= MAX_TIME_SEC && Duration::try_from_secs_f64(value).is_ok()) {
                return Err(ConfigError::ValidationError(format!(
                    "simulation.{name} must be <= {MAX_TIME_SEC} s, got {value}"
                )));
            }
        }
        if !(self.box_length_mm < self.diverter_position_mm
            && self.diverter_position_mm + self.box_length_mm <= self.outfeed_position_mm)
        {
            return Err(ConfigError::ValidationError(format!(
                "simulation positions must satisfy box_length < diverter and \
                 diverter + box_length <= outfeed (box={}, diverter={}, outfeed={})",
                self.box_length_mm, self.diverter_position_mm, self.outfeed_position_mm
            )));
        }
        if let Some(at) = self.estop_at_sec.filter(|at| at.is_nan() || *at < 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "simulation.estop_at_sec must be >= 0, got {at}"
            )));
        }
        Ok(())
    }
}

// ─── Box Model ──────────────────────────────────────────────────────

/// Outfeed a box was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Outfeed B.
    Accept,
    /// Outfeed C.
    Reject,
}

#[derive(Debug, Clone, Copy)]
struct SimBox {
    id: u64,
    /// Box centre along the belt; the infeed photoeye is at 0.
    position_mm: f64,
    route: Option<Route>,
    jam_at: Option<Photoeye>,
    stuck_until: Option<Duration>,
}

/// Totals observed by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimCounters {
    pub arrived: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub jams_injected: u64,
}

/// Single-box conveyor process.
#[derive(Debug, Clone)]
pub struct ConveyorSim {
    config: SimulationConfig,
    scan_period: Duration,
    time: Duration,
    speed: f64,
    motor: bool,
    diverter_extended: bool,
    next_arrival: Duration,
    item: Option<SimBox>,
    counters: SimCounters,
}

impl ConveyorSim {
    pub fn new(config: SimulationConfig, scan_period: Duration) -> Self {
        let next_arrival = Duration::from_secs_f64(config.box_interval_sec);
        Self {
            config,
            scan_period,
            time: Duration::ZERO,
            speed: 1.0,
            motor: false,
            diverter_extended: false,
            next_arrival,
            item: None,
            counters: SimCounters::default(),
        }
    }

    /// Model time.
    #[inline]
    pub fn time(&self) -> Duration {
        self.time
    }

    #[inline]
    pub fn counters(&self) -> SimCounters {
        self.counters
    }

    /// Centre position of the box on the belt, if any.
    pub fn box_position_mm(&self) -> Option<f64> {
        self.item.map(|b| b.position_mm)
    }

    fn sensor_position(&self, pe: Photoeye) -> f64 {
        match pe {
            Photoeye::Infeed => 0.0,
            Photoeye::Diverter => self.config.diverter_position_mm,
            Photoeye::OutfeedB | Photoeye::OutfeedC => self.config.outfeed_position_mm,
        }
    }

    fn spawn_if_due(&mut self) {
        if self.item.is_some() || self.time < self.next_arrival {
            return;
        }
        self.counters.arrived += 1;
        let id = self.counters.arrived;
        let jam_at = (self.config.jam_every_n > 0 && id % self.config.jam_every_n == 0)
            .then_some(self.config.jam_location);
        self.item = Some(SimBox {
            id,
            position_mm: -self.config.box_length_mm,
            route: None,
            jam_at,
            stuck_until: None,
        });
        self.next_arrival = self.time + Duration::from_secs_f64(self.config.box_interval_sec);
        debug!("sim: box {id} arrived");
    }

    fn advance(&mut self) {
        let Some(mut b) = self.item else {
            return;
        };
        let half = self.config.box_length_mm / 2.0;

        if let Some(until) = b.stuck_until {
            if self.time < until {
                return;
            }
            // Operator pushes the box clear of the sensor it was stuck on.
            let pe = b.jam_at.unwrap_or(Photoeye::Infeed);
            b.position_mm = self.sensor_position(pe) + half + 1.0;
            b.stuck_until = None;
            b.jam_at = None;
            info!("sim: box {} cleared from {pe}", b.id);
        }

        if self.motor {
            b.position_mm +=
                self.config.belt_speed_mms * self.speed * self.scan_period.as_secs_f64();
        }

        if b.route.is_none() && b.position_mm >= self.config.diverter_position_mm {
            let route = if self.diverter_extended {
                Route::Reject
            } else {
                Route::Accept
            };
            b.route = Some(route);
            debug!("sim: box {} routed {route:?}", b.id);
        }

        if let Some(pe) = b.jam_at {
            let pe = match (pe, b.route) {
                (Photoeye::OutfeedB | Photoeye::OutfeedC, Some(Route::Reject)) => Photoeye::OutfeedC,
                (Photoeye::OutfeedB | Photoeye::OutfeedC, _) => Photoeye::OutfeedB,
                (pe, _) => pe,
            };
            let at = self.sensor_position(pe);
            if b.position_mm >= at {
                b.position_mm = at;
                b.jam_at = Some(pe);
                b.stuck_until = Some(self.time + Duration::from_secs_f64(self.config.jam_hold_sec));
                self.counters.jams_injected += 1;
                info!("sim: box {} stuck at {pe}", b.id);
            }
        }

        if b.position_mm >= self.config.outfeed_position_mm + self.config.box_length_mm {
            match b.route {
                Some(Route::Reject) => self.counters.rejected += 1,
                _ => self.counters.accepted += 1,
            }
            debug!("sim: box {} exited", b.id);
            self.item = None;
        } else {
            self.item = Some(b);
        }
    }

    fn blocked(&self, pe: Photoeye) -> bool {
        let Some(b) = self.item else {
            return false;
        };
        let on_branch = match pe {
            Photoeye::OutfeedB => b.route != Some(Route::Reject),
            Photoeye::OutfeedC => b.route == Some(Route::Reject),
            Photoeye::Infeed | Photoeye::Diverter => true,
        };
        on_branch && (b.position_mm - self.sensor_position(pe)).abs() < self.config.box_length_mm / 2.0
    }

    fn estop_open(&self) -> bool {
        let t = self.time.as_secs_f64();
        self.config
            .estop_at_sec
            .is_some_and(|at| t >= at && t < at + self.config.estop_hold_sec)
    }
}

impl ProcessIo for ConveyorSim {
    fn read_inputs(&mut self) -> Result<InputSnapshot, IoError> {
        self.time += self.scan_period;
        self.spawn_if_due();
        self.advance();

        Ok(InputSnapshot {
            start_button: false,
            stop_ok: true,
            estop_ok: !self.estop_open(),
            mode_manual: self.config.mode_manual,
            pe_infeed: self.blocked(Photoeye::Infeed),
            pe_diverter: self.blocked(Photoeye::Diverter),
            pe_outfeed_b: self.blocked(Photoeye::OutfeedB),
            pe_outfeed_c: self.blocked(Photoeye::OutfeedC),
        })
    }

    fn write_outputs(&mut self, outputs: &OutputCommand) -> Result<(), IoError> {
        self.motor = outputs.motor;
        self.diverter_extended = outputs.diverter;
        Ok(())
    }

    fn apply_parameters(&mut self, parameters: &Parameters) {
        self.speed = parameters.conveyor_speed();
    }
}

// ─── Operator Script ────────────────────────────────────────────────

/// Scripted operator for unattended demo runs.
///
/// Starts the line, acknowledges faults after a delay and restarts after
/// recovery. Requests are re-issued at most once per second so each one
/// reaches the engine as a fresh pulse.
#[derive(Debug, Clone)]
pub struct OperatorScript {
    scan_period: Duration,
    ack_delay: Duration,
    auto_restart: bool,
    started: bool,
    fault_since: Option<Duration>,
    last_request: Option<Duration>,
}

const REQUEST_RETRY: Duration = Duration::from_secs(1);

impl OperatorScript {
    pub fn new(config: &SimulationConfig, scan_period: Duration) -> Self {
        Self {
            scan_period,
            ack_delay: Duration::from_secs_f64(config.auto_ack_delay_sec),
            auto_restart: config.auto_restart,
            started: false,
            fault_since: None,
            last_request: None,
        }
    }

    /// Engine time at the end of scan `cycle`.
    fn elapsed(&self, cycle: u64) -> Duration {
        let nanos = self.scan_period.as_nanos().saturating_mul(u128::from(cycle));
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    fn may_request(&self, now: Duration) -> bool {
        self.last_request
            .is_none_or(|t| now.saturating_sub(t) >= REQUEST_RETRY)
    }

    /// Act on the last committed status at a cycle boundary.
    pub fn on_boundary(&mut self, panel: &mut OperatorPanel, status: &StatusView) {
        let now = self.elapsed(status.cycle);
        match status.state {
            SystemState::Stopped => {
                self.fault_since = None;
                if (!self.started || self.auto_restart) && self.may_request(now) {
                    panel.request_start();
                    self.started = true;
                    self.last_request = Some(now);
                }
            }
            SystemState::Fault => {
                let since = *self.fault_since.get_or_insert(now);
                if now.saturating_sub(since) >= self.ack_delay && self.may_request(now) {
                    panel.acknowledge_fault();
                    self.last_request = Some(now);
                }
            }
            SystemState::Starting | SystemState::Running(_) => self.fault_since = None,
        }
    }
}
