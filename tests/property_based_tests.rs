//! Property-based tests for the control plane
//!
//! Uses proptest to cover the FSM rejection property and the gate verdict
//! invariant across arbitrary inputs.

use std::collections::HashMap;

use aureus::fsm::{GoalGuardFSM, State};
use aureus::gates::GateResult;
use aureus::reflexion::ReflexionLoop;
use aureus::tools::ToolType;
use proptest::prelude::*;
use proptest::sample::select;

fn any_state() -> impl Strategy<Value = State> {
    select(State::ALL.to_vec())
}

fn any_tool() -> impl Strategy<Value = ToolType> {
    select(ToolType::ALL.to_vec())
}

proptest! {
    /// A rejected transition never mutates the machine.
    #[test]
    fn rejected_transitions_leave_state_unchanged(
        state in any_state(),
        tool in any_tool(),
    ) {
        let mut fsm = GoalGuardFSM::new();
        if state != State::Init {
            fsm.force_transition(state);
        }
        let history_len = fsm.state_history().len();

        let accepted = fsm.transition(tool);
        if accepted {
            prop_assert_eq!(fsm.state_history().len(), history_len + 1);
            prop_assert_eq!(*fsm.state_history().last().unwrap(), state);
        } else {
            prop_assert_eq!(fsm.current_state(), state);
            prop_assert_eq!(fsm.state_history().len(), history_len);
        }
    }

    /// `can_execute` and `transition` always agree.
    #[test]
    fn can_execute_predicts_transition(
        state in any_state(),
        tool in any_tool(),
    ) {
        let mut fsm = GoalGuardFSM::new();
        if state != State::Init {
            fsm.force_transition(state);
        }
        let predicted = fsm.can_execute(tool);
        prop_assert_eq!(fsm.transition(tool), predicted);
    }

    /// Tool-driven transitions keep the two history logs parallel.
    #[test]
    fn tool_histories_stay_parallel(tools in proptest::collection::vec(any_tool(), 0..32)) {
        let mut fsm = GoalGuardFSM::new();
        for tool in tools {
            let _ = fsm.transition(tool);
        }
        prop_assert_eq!(fsm.state_history().len(), fsm.tool_history().len());
    }

    /// The gate verdict is exactly the conjunction of its checks.
    #[test]
    fn gate_verdict_is_conjunction(
        checks in proptest::collection::vec(("[a-z_]{1,16}", any::<bool>()), 0..8),
    ) {
        let expected = checks.iter().all(|(_, ok)| *ok);
        let result = GateResult::from_checks(checks, vec![], HashMap::new());
        prop_assert_eq!(result.passed, expected);
    }

    /// `should_retry` is true exactly on the half-open interval
    /// `[0, max_retries)`.
    #[test]
    fn retry_window_is_half_open(max_retries in 0u32..16, attempts in 0u32..24) {
        let mut reflexion = ReflexionLoop::new(max_retries);
        for _ in 0..attempts {
            reflexion.increment_attempt();
        }
        prop_assert_eq!(reflexion.should_retry(), attempts < max_retries);
    }
}
