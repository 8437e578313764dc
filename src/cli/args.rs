//! CLI argument definitions and parsing structures

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{DEFAULT_MAX_DRAWDOWN, DEFAULT_MAX_RETRIES, DEFAULT_OUTPUT_DIR};

/// aureus - evidence-gated goal orchestrator for quant strategy pipelines
#[derive(Parser)]
#[command(name = "aureus")]
#[command(about = "Evidence-gated goal orchestrator for quant strategy pipelines")]
#[command(long_about = r#"
aureus drives one quant-strategy goal through a guarded pipeline:
strategy generation, backtest, dev gate (tests/determinism/lint),
product gate (CRV verification), and commit to the memory store.
Gate failures are classified by the reflexion loop into bounded,
directed retries.

EXAMPLES:
  # Run a goal against a market data file
  aureus run --goal "design a trend strategy under DD<10%" --data data/spy.parquet

  # Loosen the drawdown limit and disable strict responses
  aureus run --goal "mean reversion" --data data/spy.parquet \
      --max-drawdown 0.25 --no-strict

  # Point at explicitly built tool binaries
  aureus run --goal "carry strategy" --data data/fx.parquet \
      --engine-cli target/release/aureus-engine \
      --memory-cli target/release/aureus-memory

  # Check that the required external binaries are discoverable
  aureus validate

EXIT CODES:
  0   goal committed (or validation passed)
  1   goal failed (gate failure with exhausted retries)
  2   invalid command-line arguments
  70  required external binary not found
"#)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one goal through the gated pipeline
    Run {
        /// Goal description (e.g. "design a trend strategy under DD<10%")
        #[arg(long)]
        goal: String,

        /// Path to the market data file
        #[arg(long)]
        data: PathBuf,

        /// Maximum allowed drawdown as a fraction (0.10 = 10%)
        #[arg(long, default_value_t = DEFAULT_MAX_DRAWDOWN)]
        max_drawdown: f64,

        /// Enforce artifact-ID-only responses (the default)
        #[arg(long, overrides_with = "no_strict")]
        strict: bool,

        /// Disable strict mode
        #[arg(long, overrides_with = "strict")]
        no_strict: bool,

        /// Repair attempt budget per goal run
        #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
        max_retries: u32,

        /// Path to the engine binary (discovered on PATH if omitted)
        #[arg(long)]
        engine_cli: Option<PathBuf>,

        /// Path to the memory store binary (discovered on PATH if omitted)
        #[arg(long)]
        memory_cli: Option<PathBuf>,

        /// Directory the backtest writes artifacts into
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Emit the full goal report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tool binaries are discoverable
    Validate {
        /// Path to the engine binary (discovered on PATH if omitted)
        #[arg(long)]
        engine_cli: Option<PathBuf>,

        /// Path to the memory store binary (discovered on PATH if omitted)
        #[arg(long)]
        memory_cli: Option<PathBuf>,
    },
}

/// Effective strict-mode setting for the `--strict`/`--no-strict` pair.
///
/// Strict is the default; `--no-strict` opts out and `--strict` re-asserts
/// it. The flags override each other, so at most one survives parsing.
#[must_use]
pub fn effective_strict(strict: bool, no_strict: bool) -> bool {
    strict || !no_strict
}
