//! Integration test: emergency stop latch and recovery.
//!
//! Validates the safety lifecycle:
//! 1. E-stop → Fault from every state, motor off in the same scan
//! 2. Latch survives circuit restoration until acknowledged
//! 3. Acknowledge with the circuit still open is refused
//! 4. E-stop outranks a concurrent jam and both must clear

use conveyor_common::line::state::{FaultCode, Photoeye, SystemState};
use conveyor_control::state::TransitionReason;

use super::{JAM_SCANS, Line, RUN_AUTO};

fn trip(line: &mut Line) {
    line.inputs.estop_ok = false;
    let out = line.scan();
    assert_eq!(line.state(), SystemState::Fault);
    assert_eq!(line.engine.fault_code(), FaultCode::EStop);
    assert!(line.engine.estop_latched());
    assert!(!out.motor && !out.green);
    assert!(out.red && out.buzzer);
}

#[test]
fn estop_from_stopped() {
    let mut line = Line::new();
    line.scan();
    trip(&mut line);
}

#[test]
fn estop_from_starting() {
    let mut line = Line::new();
    line.press_start();
    line.scan_n(30);
    trip(&mut line);
}

#[test]
fn estop_from_running_cuts_motor_same_scan() {
    let mut line = Line::new();
    line.run_up();
    assert!(line.engine.outputs().motor);
    trip(&mut line);

    let last = line.engine.journal().last().unwrap();
    assert_eq!(last.from, RUN_AUTO);
    assert_eq!(last.reason, TransitionReason::EStop);
    assert_eq!(last.fault, FaultCode::EStop);
    // An e-stop is not a jam.
    assert_eq!(line.engine.metrics().jam_count, 0);
}

#[test]
fn latch_holds_after_circuit_restored() {
    let mut line = Line::new();
    line.run_up();
    trip(&mut line);

    line.inputs.estop_ok = true;
    let out = line.scan_n(50);
    assert_eq!(line.state(), SystemState::Fault);
    assert!(line.engine.estop_latched());
    assert!(!out.motor);

    // Start is ignored in Fault.
    line.press_start();
    assert_eq!(line.state(), SystemState::Fault);
}

#[test]
fn acknowledge_with_circuit_open_is_refused() {
    let mut line = Line::new();
    trip(&mut line);

    line.press_acknowledge();
    assert_eq!(line.state(), SystemState::Fault);
    assert!(line.engine.estop_latched());

    line.inputs.estop_ok = true;
    line.scan();
    line.press_acknowledge();
    assert_eq!(line.state(), SystemState::Stopped);
    assert!(!line.engine.estop_latched());
    assert_eq!(line.engine.fault_code(), FaultCode::None);
    assert_eq!(
        line.engine.journal().last().map(|r| r.reason),
        Some(TransitionReason::FaultCleared)
    );
}

#[test]
fn stop_circuit_gates_motor() {
    let mut line = Line::new();
    line.run_up();

    line.inputs.stop_ok = false;
    let out = line.scan();
    assert_eq!(line.state(), SystemState::Stopped);
    assert!(!out.motor);

    // Restoring the circuit does not restart the line.
    line.inputs.stop_ok = true;
    assert!(!line.scan_n(10).motor);
    assert_eq!(line.state(), SystemState::Stopped);
}

#[test]
fn estop_outranks_jam_and_both_must_clear() {
    let mut line = Line::new();
    line.run_up();

    line.block(Photoeye::Diverter, true);
    line.scan_n(JAM_SCANS);
    assert_eq!(line.engine.fault_code(), FaultCode::JamDiverter);

    line.inputs.estop_ok = false;
    line.scan();
    assert_eq!(line.state(), SystemState::Fault);
    assert_eq!(line.engine.fault_code(), FaultCode::EStop);

    // Circuit restored: the acknowledge releases the e-stop, the jam stays.
    line.inputs.estop_ok = true;
    line.scan();
    line.press_acknowledge();
    assert!(!line.engine.estop_latched());
    assert_eq!(line.state(), SystemState::Fault);
    assert_eq!(line.engine.fault_code(), FaultCode::JamDiverter);

    line.block(Photoeye::Diverter, false);
    line.scan();
    line.press_acknowledge();
    assert_eq!(line.state(), SystemState::Stopped);
    assert_eq!(line.engine.fault_code(), FaultCode::None);
    assert_eq!(line.engine.metrics().jam_count, 1);
}

#[test]
fn estop_during_acknowledge_scan_wins() {
    let mut line = Line::new();
    line.run_up();
    line.block(Photoeye::Infeed, true);
    line.scan_n(JAM_SCANS);
    line.block(Photoeye::Infeed, false);
    line.scan();

    line.inputs.estop_ok = false;
    line.press_acknowledge();
    assert_eq!(line.state(), SystemState::Fault);
    assert_eq!(line.engine.fault_code(), FaultCode::EStop);
}

#[test]
fn jam_latched_with_estop_in_same_scan_is_not_counted() {
    let mut line = Line::new();
    line.run_up();

    line.block(Photoeye::Diverter, true);
    line.scan_n(JAM_SCANS - 1);
    assert_eq!(line.state(), RUN_AUTO);

    // The jam timer crosses in the scan the e-stop opens: the entry is an e-stop.
    line.inputs.estop_ok = false;
    line.scan();
    assert_eq!(line.state(), SystemState::Fault);
    assert_eq!(line.engine.fault_code(), FaultCode::EStop);
    let entry = *line.engine.journal().last().unwrap();
    assert_eq!(entry.reason, TransitionReason::EStop);
    assert_eq!(entry.fault, FaultCode::EStop);
    assert_eq!(line.engine.metrics().jam_count, 0);

    // Releasing the e-stop uncovers the jam without a new Fault entry.
    line.inputs.estop_ok = true;
    line.scan();
    line.press_acknowledge();
    assert_eq!(line.state(), SystemState::Fault);
    assert_eq!(line.engine.fault_code(), FaultCode::JamDiverter);
    assert_eq!(line.engine.journal().last(), Some(&entry));
    assert_eq!(line.engine.metrics().jam_count, 0);

    line.block(Photoeye::Diverter, false);
    line.scan();
    line.press_acknowledge();
    assert_eq!(line.state(), SystemState::Stopped);
    assert_eq!(line.engine.metrics().jam_count, 0);
}
