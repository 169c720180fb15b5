//! Integration test: normal operation, jams, routing and operator writes.
//!
//! Validates the full line lifecycle scan by scan:
//! 1. Stopped → Starting → Running → Stopped with metrics
//! 2. Jam detection, acknowledge and recovery
//! 3. Every third box diverted to reject
//! 4. Manual mode, jog and parameter writes

use conveyor_common::line::config::EngineConfig;
use conveyor_common::line::io::InputSnapshot;
use conveyor_common::line::params::Parameters;
use conveyor_common::line::state::{FaultCode, Photoeye, RunMode, SystemState};
use conveyor_control::cycle::CycleRunner;
use conveyor_control::io::LoopbackIo;
use conveyor_control::state::TransitionReason;

use super::{JAM_SCANS, Line, RUN_AUTO, STARTUP_SCANS};

fn reasons(line: &Line) -> Vec<TransitionReason> {
    line.engine.journal().map(|r| r.reason).collect()
}

// ── Start / Run / Stop ──────────────────────────────────────────────

#[test]
fn start_run_stop_cycle() {
    let mut line = Line::new();
    assert_eq!(line.state(), SystemState::Stopped);
    assert_eq!(line.scan(), Default::default());

    let out = line.press_start();
    assert_eq!(line.state(), SystemState::Starting);
    assert!(!out.motor);

    // Scans 2..=100 of the delay stay in Starting with the belt off.
    for _ in 1..STARTUP_SCANS {
        assert!(!line.scan().motor);
        assert_eq!(line.state(), SystemState::Starting);
    }

    let out = line.scan();
    assert_eq!(line.state(), RUN_AUTO);
    assert!(out.motor);
    assert!(out.green);
    assert!(!out.red && !out.buzzer);

    let out = line.press_stop();
    assert_eq!(line.state(), SystemState::Stopped);
    assert!(!out.motor && !out.green);

    assert_eq!(
        reasons(&line),
        vec![
            TransitionReason::StartRequest,
            TransitionReason::StartupComplete,
            TransitionReason::StopRequest,
        ]
    );
}

#[test]
fn green_blinks_during_start_up() {
    let mut line = Line::new();
    let mut pattern = vec![line.press_start().green];
    pattern.extend((1..STARTUP_SCANS).map(|_| line.scan().green));

    assert!(pattern[..50].iter().all(|&lit| lit));
    assert!(pattern[50..].iter().all(|&lit| !lit));
    assert!(line.scan().green);
}

#[test]
fn boxes_update_metrics() {
    let mut line = Line::new();
    line.run_up();

    for _ in 0..3 {
        line.pass_box();
    }

    let m = line.engine.metrics();
    assert_eq!(m.box_count, 3);
    assert_eq!(m.jam_count, 0);
    // Infeed edge to outfeed edge: four 5-scan segments.
    assert!((m.last_cycle_time_sec - 0.2).abs() < 1e-9);
    assert!((m.avg_cycle_time_sec - 0.2).abs() < 1e-9);
    assert!(m.running_time_sec > 0.0);
    assert!(m.throughput_per_hour > 0.0);
    assert_eq!(m.uptime_percent, 100.0);
}

#[test]
fn stop_during_start_up_aborts() {
    let mut line = Line::new();
    line.press_start();
    line.scan_n(10);

    line.inputs.stop_ok = false;
    let out = line.scan();
    assert_eq!(line.state(), SystemState::Stopped);
    assert!(!out.motor);
    assert_eq!(reasons(&line).last(), Some(&TransitionReason::StartAborted));
}

#[test]
fn start_refused_with_stop_circuit_open() {
    let mut line = Line::new();
    line.inputs.stop_ok = false;
    line.press_start();
    assert_eq!(line.state(), SystemState::Stopped);
    assert_eq!(line.engine.journal().count(), 0);
}

#[test]
fn start_refused_with_photoeye_blocked() {
    let mut line = Line::new();
    line.block(Photoeye::OutfeedB, true);
    line.press_start();
    assert_eq!(line.state(), SystemState::Stopped);
    assert_eq!(line.engine.fault_code(), FaultCode::None);
}

#[test]
fn start_from_physical_button() {
    let mut line = Line::new();
    line.inputs.start_button = true;
    line.scan();
    line.inputs.start_button = false;
    assert_eq!(line.state(), SystemState::Starting);
}

// ── Jams ────────────────────────────────────────────────────────────

#[test]
fn jam_at_timeout_then_recover() {
    let mut line = Line::new();
    line.run_up();

    line.block(Photoeye::Diverter, true);
    line.scan_n(JAM_SCANS - 1);
    assert_eq!(line.state(), RUN_AUTO);

    let out = line.scan();
    assert_eq!(line.state(), SystemState::Fault);
    assert_eq!(line.engine.fault_code(), FaultCode::JamDiverter);
    assert!(!out.motor && !out.green);
    assert!(out.red && out.buzzer);
    assert_eq!(line.engine.metrics().jam_count, 1);

    // Acknowledge with the box still in the photoeye changes nothing.
    line.press_acknowledge();
    line.scan();
    assert_eq!(line.state(), SystemState::Fault);
    assert_eq!(line.engine.fault_code(), FaultCode::JamDiverter);

    line.block(Photoeye::Diverter, false);
    line.scan();
    assert_eq!(line.state(), SystemState::Fault);

    let out = line.press_acknowledge();
    assert_eq!(line.state(), SystemState::Stopped);
    assert_eq!(line.engine.fault_code(), FaultCode::None);
    assert!(!out.red && !out.buzzer);

    line.scan();
    line.run_up();
    assert_eq!(line.engine.metrics().jam_count, 1);
}

#[test]
fn jam_threshold_follows_parameter() {
    let mut line = Line::with_parameters(Parameters::new(2.0, 1.0).unwrap());
    line.run_up();
    line.block(Photoeye::Infeed, true);
    line.scan_n(199);
    assert_eq!(line.engine.fault_code(), FaultCode::None);
    line.scan();
    assert_eq!(line.engine.fault_code(), FaultCode::JamInfeed);

    // 5 s blocked against an 8 s timeout never jams.
    let mut line = Line::with_parameters(Parameters::new(8.0, 1.0).unwrap());
    line.run_up();
    line.block(Photoeye::Infeed, true);
    line.scan_n(500);
    line.block(Photoeye::Infeed, false);
    line.scan_n(500);
    assert_eq!(line.state(), RUN_AUTO);
    assert_eq!(line.engine.metrics().jam_count, 0);
}

#[test]
fn eight_boxes_with_one_jam() {
    let mut line = Line::new();
    line.run_up();
    for _ in 0..4 {
        line.pass_box();
    }

    // Fifth box sticks in the diverter.
    line.occupy(Photoeye::Infeed);
    line.block(Photoeye::Diverter, true);
    line.scan_n(JAM_SCANS);
    assert_eq!(line.engine.fault_code(), FaultCode::JamDiverter);
    line.scan_n(100);
    line.block(Photoeye::Diverter, false);
    line.scan();
    line.press_acknowledge();
    assert_eq!(line.state(), SystemState::Stopped);
    line.scan();
    line.run_up();
    line.occupy(Photoeye::OutfeedB);

    for _ in 0..3 {
        line.pass_box();
    }

    let m = line.engine.metrics();
    assert_eq!(m.box_count, 8);
    assert_eq!(m.jam_count, 1);
    assert!(m.running_time_sec > 0.0);
    assert!(m.fault_time_sec > 0.0);
    let expected = m.box_count as f64 / (m.running_time_sec / 3600.0);
    assert!((m.throughput_per_hour - expected).abs() < 1e-6);
    assert!(m.uptime_percent > 0.0 && m.uptime_percent < 100.0);
}

#[test]
fn jam_timer_resets_when_photoeye_clears() {
    let mut line = Line::new();
    line.run_up();

    line.block(Photoeye::Infeed, true);
    line.scan_n(JAM_SCANS - 1);
    line.block(Photoeye::Infeed, false);
    line.scan();
    line.block(Photoeye::Infeed, true);
    line.scan_n(JAM_SCANS - 1);

    assert_eq!(line.state(), RUN_AUTO);
    line.scan();
    assert_eq!(line.engine.fault_code(), FaultCode::JamInfeed);
}

#[test]
fn no_jam_outside_running() {
    let mut line = Line::new();
    line.block(Photoeye::Infeed, true);
    line.scan_n(3 * JAM_SCANS);

    assert_eq!(line.state(), SystemState::Stopped);
    assert_eq!(line.engine.fault_code(), FaultCode::None);
    let status = line.engine.jam_statuses()[Photoeye::Infeed.index()];
    assert!(status.blocked);
    assert!(status.blocked_duration.is_zero());
}

#[test]
fn obstruction_during_start_up_faults_immediately() {
    let mut line = Line::new();
    line.press_start();
    line.scan_n(20);

    line.block(Photoeye::OutfeedC, true);
    line.scan();
    assert_eq!(line.state(), SystemState::Fault);
    assert_eq!(line.engine.fault_code(), FaultCode::JamOutfeedC);
    assert_eq!(
        reasons(&line).last(),
        Some(&TransitionReason::Obstruction(Photoeye::OutfeedC))
    );
    assert_eq!(line.engine.metrics().jam_count, 1);
}

#[test]
fn jam_wins_over_same_scan_stop() {
    let mut line = Line::new();
    line.run_up();

    line.block(Photoeye::Infeed, true);
    line.scan_n(JAM_SCANS - 1);
    line.press_stop();

    assert_eq!(line.state(), SystemState::Fault);
    assert_eq!(line.engine.fault_code(), FaultCode::JamInfeed);
}

#[test]
fn simultaneous_jams_resolve_by_priority() {
    let mut line = Line::new();
    line.run_up();

    line.block(Photoeye::OutfeedC, true);
    line.block(Photoeye::Diverter, true);
    line.scan_n(JAM_SCANS);
    assert_eq!(line.engine.fault_code(), FaultCode::JamDiverter);
}

// ── Routing ─────────────────────────────────────────────────────────

#[test]
fn every_third_box_is_rejected() {
    let mut line = Line::new();
    line.run_up();

    let diverted: Vec<bool> = (0..9).map(|_| line.pass_box()).collect();
    assert_eq!(
        diverted,
        vec![false, false, true, false, false, true, false, false, true]
    );
    assert_eq!(line.engine.routing().box_counter, 9);
    assert_eq!(line.engine.metrics().box_count, 9);
    assert!(!line.engine.outputs().diverter);
}

#[test]
fn diverter_retracts_when_line_stops() {
    let mut line = Line::new();
    line.run_up();
    line.pass_box();
    line.pass_box();

    line.block(Photoeye::Infeed, true);
    line.scan();
    line.block(Photoeye::Infeed, false);
    line.block(Photoeye::Diverter, true);
    assert!(line.scan().diverter);

    let out = line.press_stop();
    assert_eq!(line.state(), SystemState::Stopped);
    assert!(!out.diverter);
}

#[test]
fn routing_counter_survives_metrics_reset() {
    let mut line = Line::new();
    line.run_up();
    for _ in 0..3 {
        line.pass_box();
    }

    line.press_reset_metrics();
    assert!(line.engine.metrics().is_zeroed());
    assert_eq!(line.engine.routing().box_counter, 3);

    line.scan();
    assert!(line.engine.metrics().running_time_sec > 0.0);
}

// ── Manual Mode ─────────────────────────────────────────────────────

#[test]
fn manual_mode_runs_only_on_jog() {
    let mut line = Line::new();
    line.run_up();

    line.inputs.mode_manual = true;
    let out = line.scan();
    assert_eq!(line.state(), SystemState::Running(RunMode::Manual));
    assert!(!out.motor);
    assert!(out.green);
    assert_eq!(reasons(&line).last(), Some(&TransitionReason::ModeChange));

    line.commands.jog = true;
    assert!(line.scan().motor);
    line.commands.jog = false;
    assert!(!line.scan().motor);

    line.inputs.mode_manual = false;
    line.scan();
    assert_eq!(line.state(), RUN_AUTO);
}

#[test]
fn manual_mode_never_diverts() {
    let mut line = Line::new();
    line.inputs.mode_manual = true;
    line.run_up();
    assert_eq!(line.state(), SystemState::Running(RunMode::Manual));
    line.commands.jog = true;

    let diverted: Vec<bool> = (0..3).map(|_| line.pass_box()).collect();
    assert_eq!(diverted, vec![false, false, false]);
}

// ── Parameters ──────────────────────────────────────────────────────

#[test]
fn shorter_jam_timeout_applies_next_scan() {
    let mut line = Line::new();
    line.run_up();
    line.engine
        .apply_parameters(Parameters::new(1.0, 0.5).unwrap());

    line.block(Photoeye::OutfeedB, true);
    line.scan_n(99);
    assert_eq!(line.state(), RUN_AUTO);
    line.scan();
    assert_eq!(line.engine.fault_code(), FaultCode::JamOutfeedB);
    assert_eq!(line.engine.status().parameters.conveyor_speed(), 0.5);
}

#[test]
fn panel_writes_reach_engine_at_boundary() {
    let io = LoopbackIo::new(InputSnapshot::default());
    let mut runner = CycleRunner::new(&EngineConfig::default(), Parameters::default(), io);

    runner.panel_mut().write_jam_timeout(2.5).unwrap();
    runner.panel_mut().write_conveyor_speed(0.4).unwrap();
    assert!(runner.panel_mut().write_jam_timeout(0.5).is_err());
    assert!(runner.panel_mut().write_conveyor_speed(1.5).is_err());
    assert_eq!(runner.engine().parameters(), Parameters::default());

    runner.step().unwrap();
    let params = runner.engine().parameters();
    assert_eq!(params.jam_timeout_sec(), 2.5);
    assert_eq!(params.conveyor_speed(), 0.4);
    assert_eq!(runner.io().parameters, Some(params));
    assert_eq!(runner.panel().status().parameters, params);
}

#[test]
fn panel_start_runs_line_through_runner() {
    let io = LoopbackIo::new(InputSnapshot::default());
    let mut runner = CycleRunner::new(&EngineConfig::default(), Parameters::default(), io);

    runner.panel_mut().request_start();
    runner.step().unwrap();
    assert_eq!(runner.panel().status().state, SystemState::Starting);

    for _ in 0..STARTUP_SCANS {
        runner.step().unwrap();
    }
    assert_eq!(runner.panel().status().state, RUN_AUTO);
    assert!(runner.io().outputs.motor);
}

// ── Journal ─────────────────────────────────────────────────────────

#[test]
fn journal_keeps_most_recent_transitions() {
    let mut line = Line::new();
    for _ in 0..20 {
        line.press_start();
        line.press_stop();
    }

    let records: Vec<_> = line.engine.journal().collect();
    assert_eq!(records.len(), 32);
    assert!(records.windows(2).all(|w| w[0].cycle < w[1].cycle));
    assert_eq!(records.last().unwrap().cycle, line.engine.cycle());
}
