//! Exit code constants and error mapping
//!
//! Standardized exit codes for the CLI, with mapping from [`AureusError`].

use crate::error::AureusError;

/// Exit code constants for aureus
pub mod codes {
    /// Success - goal committed or validation passed
    pub const SUCCESS: i32 = 0;

    /// Goal failed - gate failure with exhausted retries, or a failed
    /// pipeline tool invocation
    pub const GOAL_FAILED: i32 = 1;

    /// CLI arguments error - invalid or missing command-line arguments
    pub const CLI_ARGS: i32 = 2;

    /// Tool failure - a required external binary could not be located
    pub const TOOL_FAILURE: i32 = 70;
}

/// Map an error to its CLI exit code.
#[must_use]
pub fn error_to_exit_code(error: &AureusError) -> i32 {
    match error {
        AureusError::Config(_) => codes::CLI_ARGS,
        AureusError::Tool(_) => codes::TOOL_FAILURE,
        _ => codes::GOAL_FAILED,
    }
}
