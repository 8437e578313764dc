//! Reflexion loop: failure classification and bounded, directed retries
//!
//! Consumes a failed [`GateResult`], classifies it into a known failure
//! category, and emits a [`RepairPlan`] naming the remedial actions and
//! the pipeline state to resume from. A simple bounded counter governs how
//! many repair attempts a goal run may make; there is no time-based
//! back-off.

use serde::{Deserialize, Serialize};

use crate::fsm::State;
use crate::gates::GateResult;

/// Known failure categories, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    TestFailure,
    DeterminismFailure,
    LintFailure,
    CrvFailure,
    Unknown,
}

impl FailureType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TestFailure => "test_failure",
            Self::DeterminismFailure => "determinism_failure",
            Self::LintFailure => "lint_failure",
            Self::CrvFailure => "crv_failure",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured repair suggestion produced after a gate failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairPlan {
    pub failure_type: FailureType,
    pub description: String,
    /// Ordered remedial actions for the operator or a retrying agent
    pub actions: Vec<String>,
    /// Pipeline state to resume from on retry
    pub retry_state: State,
}

/// Bounded-retry failure analysis for one in-flight goal run.
///
/// Owned exclusively by a single goal run; reset between goals.
#[derive(Debug, Clone)]
pub struct ReflexionLoop {
    max_retries: u32,
    attempt_count: u32,
}

impl ReflexionLoop {
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            attempt_count: 0,
        }
    }

    /// Translate a failed gate result into a repair plan.
    ///
    /// Classification inspects only the four named check keys, in priority
    /// order, and stops at the first failing one. A result lacking a key
    /// treats that key as passed, so an unrecognized failing check falls
    /// through to `Unknown`.
    #[must_use]
    pub fn analyze_failure(&self, gate_result: &GateResult) -> RepairPlan {
        match self.classify_failure(gate_result) {
            FailureType::TestFailure => RepairPlan {
                failure_type: FailureType::TestFailure,
                description: "Tests failed - code quality issues detected".to_string(),
                actions: vec![
                    "Review test failures in gate details".to_string(),
                    "Fix failing tests".to_string(),
                    "Re-run dev gate".to_string(),
                ],
                retry_state: State::DevGate,
            },
            FailureType::DeterminismFailure => RepairPlan {
                failure_type: FailureType::DeterminismFailure,
                description: "Determinism check failed - non-deterministic behavior detected"
                    .to_string(),
                actions: vec![
                    "Check for unseeded random number generators".to_string(),
                    "Verify no system time dependencies".to_string(),
                    "Ensure all operations are reproducible".to_string(),
                    "Re-run determinism check".to_string(),
                ],
                retry_state: State::DevGate,
            },
            FailureType::LintFailure => RepairPlan {
                failure_type: FailureType::LintFailure,
                description: "Lint check failed - code style issues detected".to_string(),
                actions: vec![
                    "Review lint errors in gate details".to_string(),
                    "Fix lint warnings".to_string(),
                    "Re-run lint check".to_string(),
                ],
                retry_state: State::DevGate,
            },
            FailureType::CrvFailure => RepairPlan {
                failure_type: FailureType::CrvFailure,
                description: "CRV verification failed - strategy violates constraints".to_string(),
                actions: vec![
                    "Review CRV violations".to_string(),
                    "Adjust strategy parameters to meet constraints".to_string(),
                    "Re-run backtest".to_string(),
                    "Re-run product gate".to_string(),
                ],
                retry_state: State::BacktestReady,
            },
            FailureType::Unknown => RepairPlan {
                failure_type: FailureType::Unknown,
                description: "Unknown failure type".to_string(),
                actions: vec![
                    "Review error messages".to_string(),
                    "Check logs for details".to_string(),
                    "Consider manual intervention".to_string(),
                ],
                retry_state: State::Init,
            },
        }
    }

    fn classify_failure(&self, gate_result: &GateResult) -> FailureType {
        if !gate_result.check("tests_pass").unwrap_or(true) {
            return FailureType::TestFailure;
        }
        if !gate_result.check("determinism").unwrap_or(true) {
            return FailureType::DeterminismFailure;
        }
        if !gate_result.check("lint").unwrap_or(true) {
            return FailureType::LintFailure;
        }
        if !gate_result.check("crv_pass").unwrap_or(true) {
            return FailureType::CrvFailure;
        }
        FailureType::Unknown
    }

    /// Whether another repair attempt is allowed.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        self.attempt_count < self.max_retries
    }

    pub const fn increment_attempt(&mut self) {
        self.attempt_count += 1;
    }

    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Reset the attempt counter for a fresh goal run.
    pub const fn reset(&mut self) {
        self.attempt_count = 0;
    }

    /// Human-readable report: each check with a pass/fail marker plus the
    /// accumulated error list, in insertion order.
    #[must_use]
    pub fn generate_failure_summary(&self, gate_result: &GateResult) -> String {
        let mut lines = vec![
            "=== Failure Summary ===".to_string(),
            format!("Gate Result: {gate_result}"),
            String::new(),
            "Failed Checks:".to_string(),
        ];

        for (name, passed) in &gate_result.checks {
            let marker = if *passed { "✓" } else { "✗" };
            lines.push(format!("  {marker} {name}"));
        }

        if !gate_result.errors.is_empty() {
            lines.push(String::new());
            lines.push("Errors:".to_string());
            for error in &gate_result.errors {
                lines.push(format!("  - {error}"));
            }
        }

        lines.join("\n")
    }
}

impl Default for ReflexionLoop {
    fn default() -> Self {
        Self::new(3)
    }
}
