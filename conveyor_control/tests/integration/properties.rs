//! Property tests: scan invariants under arbitrary input sequences.

use conveyor_common::line::io::InputSnapshot;
use conveyor_common::line::params::Parameters;
use conveyor_common::line::state::{FaultCode, Photoeye, SystemState};
use conveyor_control::operator::OperatorCommands;
use proptest::prelude::*;

use super::{Line, RUN_AUTO};

/// One input image and operator request held for a number of scans.
#[derive(Debug, Clone, Copy)]
struct Step {
    inputs: InputSnapshot,
    commands: OperatorCommands,
    hold: usize,
}

fn inputs_strategy() -> impl Strategy<Value = InputSnapshot> {
    (
        prop::bool::weighted(0.2),
        prop::bool::weighted(0.9),
        prop::bool::weighted(0.9),
        prop::bool::weighted(0.2),
        any::<[bool; 4]>(),
    )
        .prop_map(|(start_button, stop_ok, estop_ok, mode_manual, pe)| InputSnapshot {
            start_button,
            stop_ok,
            estop_ok,
            mode_manual,
            pe_infeed: pe[0],
            pe_diverter: pe[1],
            pe_outfeed_b: pe[2],
            pe_outfeed_c: pe[3],
        })
}

fn commands_strategy() -> impl Strategy<Value = OperatorCommands> {
    (
        prop::bool::weighted(0.2),
        prop::bool::weighted(0.1),
        prop::bool::weighted(0.3),
        prop::bool::weighted(0.05),
        any::<bool>(),
    )
        .prop_map(|(start, stop, acknowledge, reset_metrics, jog)| OperatorCommands {
            start,
            stop,
            acknowledge,
            reset_metrics,
            jog,
        })
}

fn step_strategy() -> impl Strategy<Value = Step> {
    (inputs_strategy(), commands_strategy(), 1usize..150)
        .prop_map(|(inputs, commands, hold)| Step {
            inputs,
            commands,
            hold,
        })
}

fn photoeye_strategy() -> impl Strategy<Value = Photoeye> {
    prop::sample::select(Photoeye::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Fault code, indicators and the motor floor hold after every scan.
    #[test]
    fn scan_invariants_hold(steps in prop::collection::vec(step_strategy(), 1..40)) {
        let parameters = Parameters::new(1.0, 1.0).unwrap();
        let mut line = Line::with_parameters(parameters);

        for step in steps {
            line.inputs = step.inputs;
            line.commands = step.commands;
            for _ in 0..step.hold {
                let out = line.scan();
                let state = line.state();
                let fault = line.engine.fault_code();

                prop_assert_eq!(state.is_fault(), fault != FaultCode::None);
                prop_assert_eq!(out.red, state.is_fault());
                prop_assert_eq!(out.buzzer, state.is_fault());
                if out.motor {
                    prop_assert!(step.inputs.estop_ok && step.inputs.stop_ok);
                    prop_assert!(!line.engine.estop_latched());
                    prop_assert!(state.is_running());
                }
                if out.diverter {
                    prop_assert_eq!(state, RUN_AUTO);
                }
                if line.engine.estop_latched() {
                    prop_assert_eq!(fault, FaultCode::EStop);
                }
                if matches!(state, SystemState::Stopped | SystemState::Fault) {
                    prop_assert!(!out.green);
                }
            }
        }
    }

    /// Acknowledge pulses outside `Fault` leave the line untouched.
    #[test]
    fn acknowledge_outside_fault_is_ignored(
        steps in prop::collection::vec(
            (any::<bool>(), prop::bool::weighted(0.8), any::<bool>(), any::<bool>(), any::<bool>(), 1usize..120),
            1..30,
        )
    ) {
        let mut plain = Line::new();
        let mut acked = Line::new();

        for (start, stop_ok, mode_manual, jog, ack, hold) in steps {
            for line in [&mut plain, &mut acked] {
                line.inputs.stop_ok = stop_ok;
                line.inputs.mode_manual = mode_manual;
                line.commands.start = start;
                line.commands.jog = jog;
            }
            acked.commands.acknowledge = ack;

            for _ in 0..hold {
                let a = plain.scan();
                let b = acked.scan();
                prop_assert_eq!(a, b);
                prop_assert_eq!(plain.state(), acked.state());
                prop_assert_eq!(acked.engine.fault_code(), FaultCode::None);
            }
        }
        prop_assert_eq!(plain.engine.metrics(), acked.engine.metrics());
    }

    /// Repeated acknowledges while the jam is still blocked keep the fault.
    #[test]
    fn acknowledge_while_blocked_is_idempotent(pe in photoeye_strategy(), presses in 1usize..8) {
        let mut line = Line::new();
        line.run_up();
        line.block(pe, true);
        line.scan_n(super::JAM_SCANS);
        prop_assert_eq!(line.engine.fault_code(), pe.jam_code());

        for _ in 0..presses {
            line.press_acknowledge();
            line.scan();
            prop_assert_eq!(line.state(), SystemState::Fault);
            prop_assert_eq!(line.engine.fault_code(), pe.jam_code());
        }

        line.block(pe, false);
        line.scan();
        line.press_acknowledge();
        prop_assert_eq!(line.state(), SystemState::Stopped);
        prop_assert_eq!(line.engine.metrics().jam_count, 1);
    }
}
