//! Typed request/response envelope for external tool invocations
//!
//! Every side effect of the control plane flows through this contract:
//! a [`ToolCall`] goes out, a [`ToolResult`] comes back. Executors never
//! panic or return `Err` for tool-level failures; everything is reported
//! through `ToolResult::success = false`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of invokable action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    GenerateStrategy,
    Backtest,
    RunTests,
    CheckDeterminism,
    Lint,
    CrvVerify,
    MemorySearch,
    MemoryCommit,
    MemoryShow,
}

impl ToolType {
    /// Returns the string representation of the tool type
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GenerateStrategy => "generate_strategy",
            Self::Backtest => "backtest",
            Self::RunTests => "run_tests",
            Self::CheckDeterminism => "check_determinism",
            Self::Lint => "lint",
            Self::CrvVerify => "crv_verify",
            Self::MemorySearch => "memory_search",
            Self::MemoryCommit => "memory_commit",
            Self::MemoryShow => "memory_show",
        }
    }

    /// All tool types, in declaration order. Used by tests and by the FSM
    /// to enumerate the full `(state, tool)` grid.
    pub const ALL: [Self; 9] = [
        Self::GenerateStrategy,
        Self::Backtest,
        Self::RunTests,
        Self::CheckDeterminism,
        Self::Lint,
        Self::CrvVerify,
        Self::MemorySearch,
        Self::MemoryCommit,
        Self::MemoryShow,
    ];
}

impl std::fmt::Display for ToolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tool invocation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Which action to perform
    pub tool_type: ToolType,
    /// Tool-specific structured parameters
    pub parameters: Value,
}

impl ToolCall {
    #[must_use]
    pub const fn new(tool_type: ToolType, parameters: Value) -> Self {
        Self {
            tool_type,
            parameters,
        }
    }

    /// A call with no parameters (`{}`).
    #[must_use]
    pub fn empty(tool_type: ToolType) -> Self {
        Self::new(tool_type, Value::Object(serde_json::Map::new()))
    }
}

/// Outcome of a tool invocation.
///
/// Invariant: `success == false` implies `error` is present. Use the
/// [`ok`](Self::ok) and [`failure`](Self::failure) constructors rather than
/// building the struct by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool completed successfully
    pub success: bool,
    /// Structured output from the tool, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Error description when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Content-derived identifier (64 hex chars) for the produced artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
}

impl ToolResult {
    /// Successful result with structured output.
    #[must_use]
    pub const fn ok(output: Option<Value>, artifact_id: Option<String>) -> Self {
        Self {
            success: true,
            output,
            error: None,
            artifact_id,
        }
    }

    /// Failed result. The error message is mandatory by construction.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            artifact_id: None,
        }
    }

    /// Failed result that still carries partial tool output (e.g. a CRV
    /// report with violations).
    #[must_use]
    pub fn failure_with_output(error: impl Into<String>, output: Value) -> Self {
        Self {
            success: false,
            output: Some(output),
            error: Some(error.into()),
            artifact_id: None,
        }
    }
}

/// The sole interface through which the control plane affects or observes
/// the outside world.
///
/// `invoke` may block the calling thread (tools run out of process to
/// completion) and must not panic; all failure is communicated through
/// `ToolResult::success = false`. The trait is object safe so the state
/// machine, gates, and reflexion loop can be unit tested against a scripted
/// fake executor.
pub trait ToolExecutor {
    fn invoke(&self, call: &ToolCall) -> ToolResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_type_serializes_snake_case() {
        let json = serde_json::to_string(&ToolType::GenerateStrategy).unwrap();
        assert_eq!(json, r#""generate_strategy""#);
        let json = serde_json::to_string(&ToolType::CrvVerify).unwrap();
        assert_eq!(json, r#""crv_verify""#);
    }

    #[test]
    fn failure_always_carries_error() {
        let result = ToolResult::failure("boom");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert!(result.artifact_id.is_none());
    }

    #[test]
    fn ok_result_roundtrips() {
        let result = ToolResult::ok(
            Some(serde_json::json!({"sharpe_ratio": 1.2})),
            Some("ab".repeat(32)),
        );
        let json = serde_json::to_string(&result).unwrap();
        let back: ToolResult = serde_json::from_str(&json).unwrap();
        assert!(back.success);
        assert_eq!(back.artifact_id.unwrap().len(), 64);
        assert!(!json.contains("error"));
    }
}
