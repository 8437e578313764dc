//! Command-line interface for the aureus orchestrator

mod args;
mod commands;

use anyhow::Result;
use clap::Parser;

pub use args::{Cli, Commands, effective_strict};
pub use commands::{RunOptions, run_command, validate_command};

use crate::logging::init_tracing;

/// Parse arguments, dispatch the subcommand, and return the exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(cli.verbose) {
        eprintln!("warning: failed to initialize logging: {err}");
    }

    match cli.command {
        Commands::Run {
            goal,
            data,
            max_drawdown,
            strict,
            no_strict,
            max_retries,
            engine_cli,
            memory_cli,
            output_dir,
            json,
        } => run_command(RunOptions {
            goal,
            data,
            max_drawdown,
            strict: effective_strict(strict, no_strict),
            max_retries,
            engine_cli,
            memory_cli,
            output_dir,
            json,
        }),
        Commands::Validate {
            engine_cli,
            memory_cli,
        } => validate_command(engine_cli.as_deref(), memory_cli.as_deref()),
    }
}
