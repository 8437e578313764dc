//! Development gate: tests, determinism, and lint

use std::collections::HashMap;

use serde_json::{Value, json};
use tracing::info;

use crate::gates::{Gate, GateContext, GateResult};
use crate::tools::{ToolCall, ToolExecutor, ToolType};

/// Number of repeated runs the determinism check performs.
const DETERMINISM_RUNS: u32 = 3;

/// Code-quality gate run after a completed backtest.
///
/// Three checks in fixed order: `tests_pass`, `determinism`, `lint`.
/// All three always run; a failing check never short-circuits the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct DevGate;

impl DevGate {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Gate for DevGate {
    fn name(&self) -> &'static str {
        "DevGate"
    }

    fn run(&self, executor: &dyn ToolExecutor, ctx: &GateContext) -> GateResult {
        let mut checks = Vec::new();
        let mut errors = Vec::new();
        let mut details = HashMap::new();

        info!(gate = self.name(), "running tests");
        let test_result = executor.invoke(&ToolCall::empty(ToolType::RunTests));
        checks.push(("tests_pass".to_string(), test_result.success));
        if !test_result.success {
            errors.push(format!(
                "Tests failed: {}",
                test_result.error.as_deref().unwrap_or("no error reported")
            ));
        }
        details.insert(
            "tests".to_string(),
            test_result.output.unwrap_or(Value::Null),
        );

        info!(gate = self.name(), "checking determinism");
        match (&ctx.spec_path, &ctx.data_path) {
            (Some(spec_path), Some(data_path)) => {
                let det_result = executor.invoke(&ToolCall::new(
                    ToolType::CheckDeterminism,
                    json!({
                        "spec_path": spec_path,
                        "data_path": data_path,
                        "runs": DETERMINISM_RUNS,
                    }),
                ));
                checks.push(("determinism".to_string(), det_result.success));
                if !det_result.success {
                    errors.push(format!(
                        "Determinism check failed: {}",
                        det_result.error.as_deref().unwrap_or("no error reported")
                    ));
                }
                details.insert(
                    "determinism".to_string(),
                    det_result.output.unwrap_or(Value::Null),
                );
            }
            _ => {
                // The tool is never invoked without both paths.
                checks.push(("determinism".to_string(), false));
                errors.push("Missing spec_path or data_path for determinism check".to_string());
            }
        }

        info!(gate = self.name(), "running lint");
        let lint_result = executor.invoke(&ToolCall::empty(ToolType::Lint));
        checks.push(("lint".to_string(), lint_result.success));
        if !lint_result.success {
            errors.push(format!(
                "Lint failed: {}",
                lint_result.error.as_deref().unwrap_or("no error reported")
            ));
        }
        details.insert(
            "lint".to_string(),
            lint_result.output.unwrap_or(Value::Null),
        );

        GateResult::from_checks(checks, errors, details)
    }
}
