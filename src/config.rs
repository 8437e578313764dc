//! Orchestrator configuration
//!
//! Explicit, passed-in configuration built from CLI arguments. There is no
//! process-wide mutable config; each goal run owns its own copy.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Default maximum allowed drawdown fraction (10%).
pub const DEFAULT_MAX_DRAWDOWN: f64 = 0.10;

/// Default repair attempt budget per goal run.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default directory for backtest artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "artifacts";

/// Configuration for one goal run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Override path to the engine binary; discovered on PATH when `None`
    pub engine_cli: Option<PathBuf>,
    /// Override path to the memory store binary
    pub memory_cli: Option<PathBuf>,
    /// Maximum allowed drawdown enforced by the product gate
    pub max_drawdown_limit: f64,
    /// Enforce artifact-ID-only responses
    pub strict: bool,
    /// Repair attempt budget
    pub max_retries: u32,
    /// Directory the backtest writes artifacts into
    pub output_dir: PathBuf,
}

impl OrchestratorConfig {
    /// Validate field ranges. Fails on values the gates cannot act on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_drawdown_limit > 0.0 && self.max_drawdown_limit <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "max_drawdown".to_string(),
                reason: format!(
                    "must be in (0, 1], got {}",
                    self.max_drawdown_limit
                ),
            });
        }
        if self.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_retries".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            engine_cli: None,
            memory_cli: None,
            max_drawdown_limit: DEFAULT_MAX_DRAWDOWN,
            strict: true,
            max_retries: DEFAULT_MAX_RETRIES,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}
