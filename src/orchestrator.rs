//! Composition root: drives one goal through the state machine, gates, and
//! reflexion loop until commit, failure, or retry exhaustion
//!
//! A single goal run executes on one logical thread of control. Every tool
//! invocation blocks until the underlying process completes, and the only
//! bound on runaway retries is the reflexion budget. The FSM histories and
//! the attempt counter are owned exclusively by this struct, so nothing
//! here needs locking.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::config::OrchestratorConfig;
use crate::error::ToolError;
use crate::fsm::{GoalGuardFSM, State};
use crate::gates::{DevGate, Gate, GateContext, GateResult, ProductGate};
use crate::reflexion::{ReflexionLoop, RepairPlan};
use crate::strict_mode::StrictMode;
use crate::tools::{EngineWrapper, ToolCall, ToolExecutor, ToolResult, ToolType};

/// Serializable receipt for one goal run.
#[derive(Debug, Clone, Serialize)]
pub struct GoalReport {
    pub success: bool,
    pub goal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Value>,
    /// Strict-mode response surfaced to collaborators, when enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair_plan: Option<RepairPlan>,
    pub final_state: State,
    pub states_visited: Vec<State>,
    pub tools_invoked: Vec<ToolType>,
    pub repair_attempts: u32,
    pub emitted_at: DateTime<Utc>,
}

/// Where to resume the pipeline after a directed retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResumeFrom {
    Strategy,
    Backtest,
    DevGate,
}

impl ResumeFrom {
    fn for_retry_state(state: State) -> Self {
        match state {
            State::DevGate => Self::DevGate,
            State::BacktestReady => Self::Backtest,
            _ => Self::Strategy,
        }
    }
}

enum GateOutcome {
    Retry(ResumeFrom),
    Exhausted(RepairPlan),
}

/// Drives one goal to completion.
pub struct Orchestrator {
    executor: Box<dyn ToolExecutor>,
    fsm: GoalGuardFSM,
    reflexion: ReflexionLoop,
    dev_gate: DevGate,
    product_gate: ProductGate,
    strict: StrictMode,
    config: OrchestratorConfig,
}

impl Orchestrator {
    #[must_use]
    pub fn new(executor: Box<dyn ToolExecutor>, config: OrchestratorConfig) -> Self {
        Self {
            fsm: GoalGuardFSM::new(),
            reflexion: ReflexionLoop::new(config.max_retries),
            dev_gate: DevGate::new(),
            product_gate: ProductGate::new(config.max_drawdown_limit),
            strict: StrictMode::new(config.strict),
            executor,
            config,
        }
    }

    /// Build an orchestrator backed by the discovered external binaries.
    pub fn discover(config: OrchestratorConfig) -> Result<Self, ToolError> {
        let wrapper = EngineWrapper::discover(
            config.engine_cli.as_deref(),
            config.memory_cli.as_deref(),
        )?;
        Ok(Self::new(Box::new(wrapper), config))
    }

    #[must_use]
    pub fn fsm(&self) -> &GoalGuardFSM {
        &self.fsm
    }

    #[must_use]
    pub fn reflexion(&self) -> &ReflexionLoop {
        &self.reflexion
    }

    /// Run one goal until commit, failure, or retry exhaustion.
    pub fn run_goal(&mut self, goal: &str, data_path: &Path) -> GoalReport {
        self.fsm.reset();
        self.reflexion.reset();
        info!(goal, data = %data_path.display(), "starting goal run");

        let mut resume = ResumeFrom::Strategy;
        let mut spec_path: Option<PathBuf> = None;
        let mut stats: Option<Value> = None;

        loop {
            // Step 1: strategy generation
            if resume == ResumeFrom::Strategy {
                let result = match self.guarded_invoke(
                    ToolType::GenerateStrategy,
                    json!({ "goal": goal, "data_path": data_path }),
                ) {
                    Ok(result) => result,
                    Err(err) => return self.failure_report(goal, err, None, stats.clone()),
                };
                if !result.success {
                    return self.abort(goal, "strategy generation", &result, stats.clone());
                }
                spec_path = result
                    .output
                    .as_ref()
                    .and_then(|o| o.get("spec_path"))
                    .and_then(Value::as_str)
                    .map(PathBuf::from);
            }

            // Step 2: backtest
            if matches!(resume, ResumeFrom::Strategy | ResumeFrom::Backtest) {
                let result = match self.guarded_invoke(
                    ToolType::Backtest,
                    json!({
                        "spec_path": spec_path,
                        "data_path": data_path,
                        "output_dir": self.config.output_dir,
                    }),
                ) {
                    Ok(result) => result,
                    Err(err) => return self.failure_report(goal, err, None, stats.clone()),
                };
                if !result.success {
                    return self.abort(goal, "backtest", &result, stats.clone());
                }
                stats = result
                    .output
                    .as_ref()
                    .and_then(|o| o.get("stats").cloned())
                    .or_else(|| result.output.clone());
            }

            let ctx = GateContext {
                spec_path: spec_path.clone(),
                data_path: Some(data_path.to_path_buf()),
                output_dir: Some(self.config.output_dir.clone()),
            };

            // Step 3: enter the dev gate phase, then run the full battery.
            // The FSM only records that a RunTests call occurred; the gate
            // computes the aggregate verdict, so the entry result is not
            // inspected here.
            if let Err(err) = self.guarded_invoke(ToolType::RunTests, json!({})) {
                return self.failure_report(goal, err, None, stats.clone());
            }
            let dev_result = self.dev_gate.run(&*self.executor, &ctx);
            info!(gate = self.dev_gate.name(), verdict = %dev_result, "dev gate finished");

            // Step 4: reflexion on dev gate failure
            if !dev_result.passed {
                match self.handle_gate_failure(&dev_result) {
                    GateOutcome::Retry(point) => {
                        resume = point;
                        continue;
                    }
                    GateOutcome::Exhausted(plan) => {
                        return self.exhausted_report(goal, &dev_result, plan, stats.clone());
                    }
                }
            }

            // Step 5: product gate phase
            self.fsm.force_transition(State::DevGatePassed);
            let crv_params = json!({
                "stats_path": self.config.output_dir.join("stats.json"),
                "trades_path": self.config.output_dir.join("trades.csv"),
                "equity_path": self.config.output_dir.join("equity_curve.csv"),
                "max_drawdown_limit": self.config.max_drawdown_limit,
            });
            if let Err(err) = self.guarded_invoke(ToolType::CrvVerify, crv_params) {
                return self.failure_report(goal, err, None, stats.clone());
            }
            let prod_result = self.product_gate.run(&*self.executor, &ctx);
            info!(gate = self.product_gate.name(), verdict = %prod_result, "product gate finished");

            // Step 6: reflexion on product gate failure
            if !prod_result.passed {
                match self.handle_gate_failure(&prod_result) {
                    GateOutcome::Retry(point) => {
                        resume = point;
                        continue;
                    }
                    GateOutcome::Exhausted(plan) => {
                        return self.exhausted_report(goal, &prod_result, plan, stats.clone());
                    }
                }
            }

            // Step 7: commit
            self.fsm.force_transition(State::ProductGatePassed);
            let commit = match self.guarded_invoke(
                ToolType::MemoryCommit,
                json!({ "goal": goal, "output_dir": self.config.output_dir }),
            ) {
                Ok(result) => result,
                Err(err) => return self.failure_report(goal, err, None, stats.clone()),
            };
            if !commit.success {
                return self.abort(goal, "memory commit", &commit, stats.clone());
            }

            return self.success_report(goal, commit.artifact_id, stats);
        }
    }

    /// Guarded invocation: the FSM must accept the tool in the current
    /// state before the executor is touched. The transition is recorded
    /// regardless of the tool's own success.
    fn guarded_invoke(&mut self, tool_type: ToolType, params: Value) -> Result<ToolResult, String> {
        if !self.fsm.transition(tool_type) {
            return Err(format!(
                "tool '{tool_type}' is not allowed in state '{}'",
                self.fsm.current_state()
            ));
        }
        Ok(self.executor.invoke(&ToolCall::new(tool_type, params)))
    }

    fn handle_gate_failure(&mut self, gate_result: &GateResult) -> GateOutcome {
        let summary = self.reflexion.generate_failure_summary(gate_result);
        warn!("gate failed\n{summary}");

        let plan = self.reflexion.analyze_failure(gate_result);
        if self.reflexion.should_retry() {
            self.reflexion.increment_attempt();
            info!(
                failure = %plan.failure_type,
                retry_state = %plan.retry_state,
                attempt = self.reflexion.attempt_count(),
                max_retries = self.reflexion.max_retries(),
                "retrying with repair plan"
            );
            self.fsm.force_transition(plan.retry_state);
            GateOutcome::Retry(ResumeFrom::for_retry_state(plan.retry_state))
        } else {
            warn!(failure = %plan.failure_type, "retry budget exhausted");
            self.fsm.to_error_state();
            GateOutcome::Exhausted(plan)
        }
    }

    fn success_report(
        &self,
        goal: &str,
        artifact_id: Option<String>,
        stats: Option<Value>,
    ) -> GoalReport {
        let response = if self.strict.is_enabled() {
            let ids: Vec<String> = artifact_id.iter().cloned().collect();
            let response = self.strict.format_artifact_response(&ids, Some("Goal committed"));
            if !self.strict.validate_response(&response) {
                warn!("strict-mode response failed validation");
            }
            Some(response)
        } else {
            None
        };

        GoalReport {
            success: true,
            goal: goal.to_string(),
            artifact_id,
            stats,
            response,
            error: None,
            repair_plan: None,
            final_state: self.fsm.current_state(),
            states_visited: self.fsm.state_history().to_vec(),
            tools_invoked: self.fsm.tool_history().to_vec(),
            repair_attempts: self.reflexion.attempt_count(),
            emitted_at: Utc::now(),
        }
    }

    /// Failure of a pipeline tool itself (not a gate verdict). Fatal for
    /// the run: there is no repair plan to follow.
    fn abort(
        &mut self,
        goal: &str,
        step: &str,
        result: &ToolResult,
        stats: Option<Value>,
    ) -> GoalReport {
        let error = format!(
            "{step} failed: {}",
            result.error.as_deref().unwrap_or("no error reported")
        );
        self.fsm.to_error_state();
        self.failure_report(goal, error, None, stats)
    }

    fn exhausted_report(
        &self,
        goal: &str,
        gate_result: &GateResult,
        plan: RepairPlan,
        stats: Option<Value>,
    ) -> GoalReport {
        let error = format!(
            "retry budget exhausted after {} attempts ({gate_result})",
            self.reflexion.attempt_count()
        );
        self.failure_report(goal, error, Some(plan), stats)
    }

    fn failure_report(
        &self,
        goal: &str,
        error: String,
        repair_plan: Option<RepairPlan>,
        stats: Option<Value>,
    ) -> GoalReport {
        GoalReport {
            success: false,
            goal: goal.to_string(),
            artifact_id: None,
            stats,
            response: None,
            error: Some(error),
            repair_plan,
            final_state: self.fsm.current_state(),
            states_visited: self.fsm.state_history().to_vec(),
            tools_invoked: self.fsm.tool_history().to_vec(),
            repair_attempts: self.reflexion.attempt_count(),
            emitted_at: Utc::now(),
        }
    }
}
