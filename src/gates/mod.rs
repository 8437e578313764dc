//! Gate framework: ordered check batteries with a single verdict
//!
//! A gate runs a fixed battery of checks, each expressed as one or more
//! tool contract invocations, and reduces them to a [`GateResult`]. Checks
//! are never skipped because an earlier check failed; failures accumulate
//! so every run carries full diagnostics.

mod dev;
mod product;

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::ToolExecutor;

pub use dev::DevGate;
pub use product::ProductGate;

/// Verdict of a single gate run.
///
/// `checks` preserves insertion order, which callers rely on when
/// rendering summaries. Invariant: `passed == checks.iter().all(passed)`,
/// enforced by [`from_checks`](Self::from_checks).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub passed: bool,
    pub checks: Vec<(String, bool)>,
    pub errors: Vec<String>,
    pub details: HashMap<String, Value>,
}

impl GateResult {
    /// Build a result whose verdict is the conjunction of its checks.
    #[must_use]
    pub fn from_checks(
        checks: Vec<(String, bool)>,
        errors: Vec<String>,
        details: HashMap<String, Value>,
    ) -> Self {
        let passed = checks.iter().all(|(_, ok)| *ok);
        Self {
            passed,
            checks,
            errors,
            details,
        }
    }

    /// Look up a check outcome by name.
    #[must_use]
    pub fn check(&self, name: &str) -> Option<bool> {
        self.checks
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ok)| *ok)
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|(_, ok)| *ok).count()
    }
}

impl std::fmt::Display for GateResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.passed { "PASSED" } else { "FAILED" };
        write!(
            f,
            "Gate {status}: {}/{} checks passed",
            self.passed_count(),
            self.checks.len()
        )
    }
}

/// Context handed to gates by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct GateContext {
    /// Strategy spec file, required by the determinism check
    pub spec_path: Option<PathBuf>,
    /// Market data file, required by the determinism check
    pub data_path: Option<PathBuf>,
    /// Directory holding backtest artifacts, required by the product gate
    pub output_dir: Option<PathBuf>,
}

/// Common contract for evidence gates.
///
/// Gates are stateless per call: all inputs arrive through the executor
/// and the context, so one gate instance is safe to reuse across runs.
pub trait Gate {
    fn name(&self) -> &'static str;

    fn run(&self, executor: &dyn ToolExecutor, ctx: &GateContext) -> GateResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_is_conjunction_of_checks() {
        let result = GateResult::from_checks(
            vec![("a".into(), true), ("b".into(), false), ("c".into(), true)],
            vec![],
            HashMap::new(),
        );
        assert!(!result.passed);
        assert_eq!(result.passed_count(), 2);
        assert_eq!(result.check("b"), Some(false));
        assert_eq!(result.check("missing"), None);
    }

    #[test]
    fn empty_battery_passes() {
        let result = GateResult::from_checks(vec![], vec![], HashMap::new());
        assert!(result.passed);
        assert_eq!(result.to_string(), "Gate PASSED: 0/0 checks passed");
    }

    #[test]
    fn display_reports_failed_ratio() {
        let result = GateResult::from_checks(
            vec![("tests_pass".into(), false)],
            vec!["Tests failed: boom".into()],
            HashMap::new(),
        );
        assert_eq!(result.to_string(), "Gate FAILED: 0/1 checks passed");
    }
}
