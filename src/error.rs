//! Error types with exit-code mapping
//!
//! Library code returns [`AureusError`] and does not call
//! `std::process::exit()`; the CLI maps errors to exit codes at the
//! boundary. Tool-level failures are NOT errors: they flow through
//! `ToolResult::success = false` so orchestration stays inspectable
//! without catching anything.

use thiserror::Error;

/// Top-level error type for aureus operations.
#[derive(Error, Debug)]
pub enum AureusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration and CLI argument errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// External binary discovery errors.
///
/// Note that tool *invocation* failures never surface here; only failures
/// to locate a binary at all do.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("required binary '{name}' not found (not on PATH and no override given)")]
    BinaryNotFound { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_with_context() {
        let err = AureusError::from(ToolError::BinaryNotFound {
            name: "aureus-engine".to_string(),
        });
        let msg = err.to_string();
        assert!(msg.contains("aureus-engine"));
        assert!(msg.starts_with("Tool error"));
    }

    #[test]
    fn config_error_names_the_field() {
        let err = AureusError::from(ConfigError::InvalidValue {
            field: "max_drawdown".to_string(),
            reason: "must be in (0, 1]".to_string(),
        });
        assert!(err.to_string().contains("max_drawdown"));
    }
}
