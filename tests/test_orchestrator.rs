//! End-to-end orchestration tests against a scripted executor
//!
//! Drives full goal runs through the state machine, gates, and reflexion
//! loop without touching any external binary.

mod common;

use std::path::{Path, PathBuf};

use aureus::config::OrchestratorConfig;
use aureus::fsm::State;
use aureus::orchestrator::Orchestrator;
use aureus::reflexion::FailureType;
use aureus::tools::{ToolResult, ToolType};
use common::{ScriptedExecutor, artifact_id, ok_with};
use serde_json::json;
use tempfile::TempDir;

/// Artifact directory with a CRV report present, so the product gate runs
/// its verification battery.
fn artifact_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("crv_report.json"), "{}").unwrap();
    dir
}

fn config(output_dir: &Path, max_retries: u32) -> OrchestratorConfig {
    OrchestratorConfig {
        output_dir: output_dir.to_path_buf(),
        max_retries,
        ..Default::default()
    }
}

fn script_happy_path(executor: &ScriptedExecutor) {
    executor.script(
        ToolType::GenerateStrategy,
        ok_with(json!({"spec_path": "spec.yaml"})),
    );
    executor.script(
        ToolType::Backtest,
        ok_with(json!({"stats": {
            "total_return": 0.42,
            "sharpe_ratio": 1.8,
            "max_drawdown": 0.05,
        }})),
    );
    executor.script(
        ToolType::MemoryCommit,
        ToolResult::ok(None, Some(artifact_id('a'))),
    );
}

#[test]
fn successful_goal_runs_to_committed() {
    let dir = artifact_dir();
    let executor = ScriptedExecutor::new();
    script_happy_path(&executor);

    let mut orchestrator =
        Orchestrator::new(Box::new(executor.clone()), config(dir.path(), 3));
    let report = orchestrator.run_goal("trend strategy", Path::new("data.parquet"));

    assert!(report.success, "run failed: {:?}", report.error);
    assert_eq!(report.artifact_id.as_deref(), Some(artifact_id('a').as_str()));
    assert_eq!(report.final_state, State::Committed);
    assert_eq!(report.repair_attempts, 0);
    assert_eq!(report.stats.unwrap()["total_return"], 0.42);

    // Only guarded invocations appear in the FSM tool history; the gate
    // batteries call the executor directly.
    assert_eq!(
        report.tools_invoked,
        vec![
            ToolType::GenerateStrategy,
            ToolType::Backtest,
            ToolType::RunTests,
            ToolType::CrvVerify,
            ToolType::MemoryCommit,
        ]
    );
    // RunTests ran twice: once to enter the dev gate phase, once inside
    // the battery.
    assert_eq!(executor.invocations_of(ToolType::RunTests), 2);
    assert_eq!(executor.invocations_of(ToolType::CrvVerify), 2);
}

#[test]
fn strict_mode_response_cites_the_artifact() {
    let dir = artifact_dir();
    let executor = ScriptedExecutor::new();
    script_happy_path(&executor);

    let mut orchestrator =
        Orchestrator::new(Box::new(executor), config(dir.path(), 3));
    let report = orchestrator.run_goal("trend strategy", Path::new("data.parquet"));

    let response = report.response.expect("strict mode is on by default");
    assert!(response.contains(&artifact_id('a')));
    assert!(response.contains("Artifacts:"));
}

#[test]
fn dev_gate_failure_retries_then_succeeds() {
    let dir = artifact_dir();
    let executor = ScriptedExecutor::new();
    script_happy_path(&executor);
    // First attempt: both the phase-entry call and the battery call fail.
    // The retry observes the sticky trailing success.
    executor.script(ToolType::RunTests, ToolResult::failure("assertion failed"));
    executor.script(ToolType::RunTests, ToolResult::failure("assertion failed"));
    executor.script(ToolType::RunTests, ToolResult::ok(None, None));

    let mut orchestrator =
        Orchestrator::new(Box::new(executor.clone()), config(dir.path(), 3));
    let report = orchestrator.run_goal("trend strategy", Path::new("data.parquet"));

    assert!(report.success, "run failed: {:?}", report.error);
    assert_eq!(report.repair_attempts, 1);
    // The retry resumed at the dev gate, not from strategy generation.
    assert_eq!(executor.invocations_of(ToolType::GenerateStrategy), 1);
    assert_eq!(executor.invocations_of(ToolType::Backtest), 1);
    assert!(report.states_visited.contains(&State::DevGate));
}

#[test]
fn exhausted_retries_end_in_error_state_with_plan() {
    let dir = artifact_dir();
    let executor = ScriptedExecutor::new();
    script_happy_path(&executor);
    executor.script(ToolType::RunTests, ToolResult::failure("always broken"));

    let mut orchestrator =
        Orchestrator::new(Box::new(executor), config(dir.path(), 2));
    let report = orchestrator.run_goal("trend strategy", Path::new("data.parquet"));

    assert!(!report.success);
    assert_eq!(report.final_state, State::Error);
    assert_eq!(report.repair_attempts, 2);
    let plan = report.repair_plan.expect("exhaustion carries the last plan");
    assert_eq!(plan.failure_type, FailureType::TestFailure);
    assert!(report.error.unwrap().contains("retry budget exhausted"));
}

#[test]
fn crv_failure_resumes_from_backtest() {
    let dir = artifact_dir();
    let executor = ScriptedExecutor::new();
    script_happy_path(&executor);
    // Phase-entry and battery calls fail on the first pass through the
    // product gate; the retried pass observes the sticky success.
    executor.script(ToolType::CrvVerify, ToolResult::failure("dd exceeded"));
    executor.script(
        ToolType::CrvVerify,
        ToolResult::failure_with_output(
            "dd exceeded",
            json!({"crv_report": {"passed": false, "violations": [
                {"rule_id": "max_drawdown", "severity": "error", "message": "0.31 > 0.10"},
            ]}}),
        ),
    );
    executor.script(ToolType::CrvVerify, ToolResult::ok(None, None));

    let mut orchestrator =
        Orchestrator::new(Box::new(executor.clone()), config(dir.path(), 3));
    let report = orchestrator.run_goal("trend strategy", Path::new("data.parquet"));

    assert!(report.success, "run failed: {:?}", report.error);
    assert_eq!(report.repair_attempts, 1);
    // The repair re-ran the backtest but not strategy generation.
    assert_eq!(executor.invocations_of(ToolType::Backtest), 2);
    assert_eq!(executor.invocations_of(ToolType::GenerateStrategy), 1);
}

#[test]
fn failing_pipeline_tool_aborts_without_repair_plan() {
    let dir = artifact_dir();
    let executor = ScriptedExecutor::new();
    executor.script(
        ToolType::GenerateStrategy,
        ok_with(json!({"spec_path": "spec.yaml"})),
    );
    executor.script(ToolType::Backtest, ToolResult::failure("bad data file"));

    let mut orchestrator =
        Orchestrator::new(Box::new(executor), config(dir.path(), 3));
    let report = orchestrator.run_goal("trend strategy", Path::new("data.parquet"));

    assert!(!report.success);
    assert_eq!(report.final_state, State::Error);
    assert!(report.repair_plan.is_none());
    let error = report.error.unwrap();
    assert!(error.contains("backtest failed"));
    assert!(error.contains("bad data file"));
}

#[test]
fn missing_crv_report_classifies_as_unknown() {
    // No CRV report and no gate-relevant checks recognized by the
    // classifier: the run burns its retries from Init and fails.
    let dir = TempDir::new().unwrap(); // no crv_report.json
    let executor = ScriptedExecutor::new();
    script_happy_path(&executor);

    let mut orchestrator =
        Orchestrator::new(Box::new(executor), config(dir.path(), 1));
    let report = orchestrator.run_goal("trend strategy", Path::new("data.parquet"));

    assert!(!report.success);
    assert_eq!(report.final_state, State::Error);
    let plan = report.repair_plan.unwrap();
    assert_eq!(plan.failure_type, FailureType::Unknown);
}

#[test]
fn reports_serialize_for_json_output() {
    let dir = artifact_dir();
    let executor = ScriptedExecutor::new();
    script_happy_path(&executor);

    let mut orchestrator =
        Orchestrator::new(Box::new(executor), config(dir.path(), 3));
    let report = orchestrator.run_goal("trend strategy", Path::new("data.parquet"));

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["final_state"], "committed");
    assert_eq!(value["tools_invoked"][0], "generate_strategy");
    assert!(value.get("error").is_none());
}

#[test]
fn backtest_params_carry_spec_and_output_dir() {
    let dir = artifact_dir();
    let executor = ScriptedExecutor::new();
    script_happy_path(&executor);

    let mut orchestrator =
        Orchestrator::new(Box::new(executor.clone()), config(dir.path(), 3));
    let _ = orchestrator.run_goal("trend strategy", Path::new("data.parquet"));

    let params = executor.params_of(ToolType::Backtest);
    assert_eq!(params[0]["spec_path"], "spec.yaml");
    assert_eq!(params[0]["data_path"], "data.parquet");
    assert_eq!(
        params[0]["output_dir"],
        PathBuf::from(dir.path()).to_str().unwrap()
    );
}
