//! Command implementations for the aureus CLI

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::config::OrchestratorConfig;
use crate::error::AureusError;
use crate::exit_codes::{codes, error_to_exit_code};
use crate::orchestrator::{GoalReport, Orchestrator};
use crate::tools::{ENGINE_BIN, MEMORY_BIN, EngineWrapper};

/// Options for the `run` command, assembled by the CLI layer.
pub struct RunOptions {
    pub goal: String,
    pub data: PathBuf,
    pub max_drawdown: f64,
    pub strict: bool,
    pub max_retries: u32,
    pub engine_cli: Option<PathBuf>,
    pub memory_cli: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub json: bool,
}

/// Execute one goal. Returns the process exit code.
pub fn run_command(opts: RunOptions) -> Result<i32> {
    let config = OrchestratorConfig {
        engine_cli: opts.engine_cli,
        memory_cli: opts.memory_cli,
        max_drawdown_limit: opts.max_drawdown,
        strict: opts.strict,
        max_retries: opts.max_retries,
        output_dir: opts.output_dir,
    };
    if let Err(err) = config.validate() {
        eprintln!("✗ {err}");
        return Ok(error_to_exit_code(&AureusError::Config(err)));
    }

    let mut orchestrator = match Orchestrator::discover(config) {
        Ok(orchestrator) => orchestrator,
        Err(err) => {
            eprintln!("✗ {err}");
            eprintln!("\nBuild the external binaries or pass --engine-cli/--memory-cli.");
            return Ok(error_to_exit_code(&AureusError::Tool(err)));
        }
    };

    let report = orchestrator.run_goal(&opts.goal, &opts.data);

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(if report.success {
            codes::SUCCESS
        } else {
            codes::GOAL_FAILED
        });
    }

    print_report(&report);
    Ok(if report.success {
        codes::SUCCESS
    } else {
        codes::GOAL_FAILED
    })
}

fn print_report(report: &GoalReport) {
    print!("{}", render_report(report));
}

/// Human-readable rendering of a goal report.
fn render_report(report: &GoalReport) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let rule = "=".repeat(60);
    if report.success {
        let _ = writeln!(out, "\n{rule}");
        let _ = writeln!(out, "✓ Goal completed successfully!");
        let _ = writeln!(out, "{rule}");

        if let Some(artifact_id) = &report.artifact_id {
            let _ = writeln!(out, "\nArtifact ID: {artifact_id}");
        }

        if let Some(response) = &report.response {
            let _ = writeln!(out, "\n{response}");
        }

        if let Some(stats) = &report.stats {
            let _ = writeln!(out, "\nFinal Statistics:");
            render_stat_pct(&mut out, stats, "total_return", "Total Return");
            render_stat(&mut out, stats, "sharpe_ratio", "Sharpe Ratio");
            render_stat_pct(&mut out, stats, "max_drawdown", "Max Drawdown");
        }
    } else {
        let _ = writeln!(out, "\n{rule}");
        let _ = writeln!(out, "✗ Goal failed");
        let _ = writeln!(out, "{rule}");

        if let Some(error) = &report.error {
            let _ = writeln!(out, "\nError: {error}");
        }

        if let Some(plan) = &report.repair_plan {
            let _ = writeln!(out, "\nRepair plan generated:");
            let _ = writeln!(out, "  Type: {}", plan.failure_type);
            let _ = writeln!(out, "  Description: {}", plan.description);
            let _ = writeln!(out, "\nSuggested actions:");
            for action in &plan.actions {
                let _ = writeln!(out, "  - {action}");
            }
        }
    }
    out
}

fn render_stat(out: &mut String, stats: &serde_json::Value, key: &str, label: &str) {
    use std::fmt::Write;
    if let Some(value) = stats.get(key).and_then(serde_json::Value::as_f64) {
        let _ = writeln!(out, "  {label}: {value:.2}");
    }
}

fn render_stat_pct(out: &mut String, stats: &serde_json::Value, key: &str, label: &str) {
    use std::fmt::Write;
    if let Some(value) = stats.get(key).and_then(serde_json::Value::as_f64) {
        let _ = writeln!(out, "  {label}: {:.2}%", value * 100.0);
    }
}

/// Check that the required external binaries are discoverable.
pub fn validate_command(engine_cli: Option<&Path>, memory_cli: Option<&Path>) -> Result<i32> {
    println!("Validating aureus installation...");

    match EngineWrapper::discover(engine_cli, memory_cli) {
        Ok(wrapper) => {
            println!("✓ Engine CLI found: {}", wrapper.engine_cli().display());
            match wrapper.memory_cli() {
                Some(path) => println!("✓ Memory CLI found: {}", path.display()),
                None => println!("✗ Memory CLI not found (optional; commit will fail softly)"),
            }
            println!("\n✓ Installation valid");
            Ok(codes::SUCCESS)
        }
        Err(err) => {
            debug!("binary discovery failed: {err}");
            println!("\n✗ Validation failed: {err}");
            println!("\nExpected binaries: {ENGINE_BIN} (required), {MEMORY_BIN} (optional)");
            Ok(codes::GOAL_FAILED)
        }
    }
}
