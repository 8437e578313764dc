//! Goal-guard finite state machine
//!
//! Enforces the legal ordering of pipeline tool calls (strategy generation →
//! backtest → dev gate → product gate → commit) and records the path taken.
//! The machine only encodes legality of individual tool calls; aggregate
//! pass/fail semantics belong to the gate framework, which advances the
//! machine through [`GoalGuardFSM::force_transition`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tools::ToolType;

/// Pipeline states. Exactly one is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Init,
    StrategyDesign,
    BacktestReady,
    BacktestComplete,
    DevGate,
    DevGatePassed,
    ProductGate,
    ProductGatePassed,
    Reflexion,
    Committed,
    Error,
}

impl State {
    /// Returns the string representation of the state
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::StrategyDesign => "strategy_design",
            Self::BacktestReady => "backtest_ready",
            Self::BacktestComplete => "backtest_complete",
            Self::DevGate => "dev_gate",
            Self::DevGatePassed => "dev_gate_passed",
            Self::ProductGate => "product_gate",
            Self::ProductGatePassed => "product_gate_passed",
            Self::Reflexion => "reflexion",
            Self::Committed => "committed",
            Self::Error => "error",
        }
    }

    /// All states, in pipeline order. Used to enumerate the full
    /// `(state, tool)` grid in tests.
    pub const ALL: [Self; 11] = [
        Self::Init,
        Self::StrategyDesign,
        Self::BacktestReady,
        Self::BacktestComplete,
        Self::DevGate,
        Self::DevGatePassed,
        Self::ProductGate,
        Self::ProductGatePassed,
        Self::Reflexion,
        Self::Committed,
        Self::Error,
    ];
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable FSM state: the current state plus append-only logs of prior
/// states and the tool types that caused each tool-driven transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FSMState {
    pub current_state: State,
    pub history: Vec<State>,
    pub tool_history: Vec<ToolType>,
}

impl FSMState {
    fn transition(&mut self, new_state: State, tool_type: ToolType) {
        self.history.push(self.current_state);
        self.tool_history.push(tool_type);
        self.current_state = new_state;
    }
}

impl Default for FSMState {
    fn default() -> Self {
        Self {
            current_state: State::Init,
            history: Vec::new(),
            tool_history: Vec::new(),
        }
    }
}

type TransitionTable = HashMap<State, HashMap<ToolType, State>>;

/// FSM that rejects tool invocations that are not valid in the current
/// pipeline phase.
///
/// The transition table is immutable and constructed once per machine.
/// Rejections are communicated through `bool` returns, never panics, so
/// callers must check the return value of [`transition`](Self::transition)
/// before assuming state advanced.
pub struct GoalGuardFSM {
    state: FSMState,
    transitions: TransitionTable,
}

impl GoalGuardFSM {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: FSMState::default(),
            transitions: build_transitions(),
        }
    }

    /// True iff `(current_state, tool_type)` has an entry in the table.
    #[must_use]
    pub fn can_execute(&self, tool_type: ToolType) -> bool {
        self.transitions
            .get(&self.state.current_state)
            .is_some_and(|row| row.contains_key(&tool_type))
    }

    /// Tools that may legally be attempted in the current state.
    #[must_use]
    pub fn allowed_tools(&self) -> HashSet<ToolType> {
        self.transitions
            .get(&self.state.current_state)
            .map(|row| row.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Attempt a tool-driven transition.
    ///
    /// Returns `false` and leaves all state untouched when the tool is not
    /// allowed in the current state. On success, appends to both history
    /// logs and advances `current_state`.
    pub fn transition(&mut self, tool_type: ToolType) -> bool {
        let Some(next_state) = self
            .transitions
            .get(&self.state.current_state)
            .and_then(|row| row.get(&tool_type))
            .copied()
        else {
            debug!(
                state = %self.state.current_state,
                tool = %tool_type,
                "transition rejected"
            );
            return false;
        };

        debug!(
            from = %self.state.current_state,
            to = %next_state,
            tool = %tool_type,
            "transition"
        );
        self.state.transition(next_state, tool_type);
        true
    }

    /// Unconditionally move to `new_state`, recording the prior state.
    ///
    /// Used by the gate framework and orchestrator to reflect externally
    /// determined verdicts ("all dev gate checks passed") that are not
    /// themselves single tool invocations. Only the state history is
    /// appended; the tool history is untouched.
    pub fn force_transition(&mut self, new_state: State) {
        debug!(from = %self.state.current_state, to = %new_state, "forced transition");
        self.state.history.push(self.state.current_state);
        self.state.current_state = new_state;
    }

    /// Enter the reflexion state for failure recovery.
    pub fn to_reflexion_state(&mut self) {
        self.force_transition(State::Reflexion);
    }

    /// Enter the terminal error state.
    pub fn to_error_state(&mut self) {
        self.force_transition(State::Error);
    }

    #[must_use]
    pub fn current_state(&self) -> State {
        self.state.current_state
    }

    #[must_use]
    pub fn state_history(&self) -> &[State] {
        &self.state.history
    }

    #[must_use]
    pub fn tool_history(&self) -> &[ToolType] {
        &self.state.tool_history
    }

    /// Return to `Init` with empty histories.
    pub fn reset(&mut self) {
        self.state = FSMState::default();
    }
}

impl Default for GoalGuardFSM {
    fn default() -> Self {
        Self::new()
    }
}

/// The authoritative transition table.
fn build_transitions() -> TransitionTable {
    use State as S;
    use ToolType as T;

    let rows: [(S, &[(T, S)]); 11] = [
        (
            S::Init,
            &[
                (T::GenerateStrategy, S::StrategyDesign),
                (T::MemorySearch, S::Init),
            ],
        ),
        (
            S::StrategyDesign,
            &[
                // Strategy generation can iterate in place
                (T::GenerateStrategy, S::StrategyDesign),
                (T::Backtest, S::BacktestComplete),
                (T::MemorySearch, S::StrategyDesign),
            ],
        ),
        (S::BacktestReady, &[(T::Backtest, S::BacktestComplete)]),
        (
            S::BacktestComplete,
            &[
                (T::RunTests, S::DevGate),
                // Backtests can be re-run
                (T::Backtest, S::BacktestComplete),
            ],
        ),
        (
            S::DevGate,
            // Self-loops: multiple checks run inside one gate phase before
            // an external verdict advances the machine.
            &[
                (T::CheckDeterminism, S::DevGate),
                (T::Lint, S::DevGate),
                (T::RunTests, S::DevGate),
            ],
        ),
        (S::DevGatePassed, &[(T::CrvVerify, S::ProductGate)]),
        (S::ProductGate, &[(T::CrvVerify, S::ProductGate)]),
        (S::ProductGatePassed, &[(T::MemoryCommit, S::Committed)]),
        (
            S::Committed,
            &[
                (T::MemoryShow, S::Committed),
                (T::MemorySearch, S::Committed),
            ],
        ),
        (
            S::Reflexion,
            // Repair can restart from several points
            &[
                (T::GenerateStrategy, S::StrategyDesign),
                (T::Backtest, S::BacktestComplete),
                (T::RunTests, S::DevGate),
            ],
        ),
        // Error has no tool-triggered exits; only force_transition leaves it.
        (S::Error, &[]),
    ];

    rows.into_iter()
        .map(|(state, row)| (state, row.iter().copied().collect()))
        .collect()
}
