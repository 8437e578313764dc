//! Out-of-process adapter for the tool contract
//!
//! Translates [`ToolCall`]s into argv-only process invocations of the two
//! external binaries: the quant engine (strategy generation, backtests,
//! checks) and the memory store (artifact search/commit/show). No shell
//! string evaluation occurs anywhere; arguments are passed via
//! `Command::new().args()` only.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::error::ToolError;
use crate::tools::contract::{ToolCall, ToolExecutor, ToolResult, ToolType};

/// Default binary name for the quant engine CLI.
pub const ENGINE_BIN: &str = "aureus-engine";

/// Default binary name for the memory store CLI.
pub const MEMORY_BIN: &str = "aureus-memory";

/// Maximum bytes of stderr retained in a failure message.
const STDERR_CAP_BYTES: usize = 2048;

/// Builder for argv-style process invocation.
///
/// Mirrors `std::process::Command` construction but keeps the program and
/// arguments inspectable, which the tests use to assert that no shell
/// evaluation can occur.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: OsString,
    args: Vec<OsString>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Convert into a `std::process::Command` for blocking execution.
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    #[must_use]
    pub fn program(&self) -> &OsString {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

/// Real [`ToolExecutor`] backed by the engine and memory binaries.
///
/// The engine binary is mandatory; the memory binary is optional at
/// discovery time, and memory tools fail softly (through `ToolResult`)
/// when it is absent.
pub struct EngineWrapper {
    engine_cli: PathBuf,
    memory_cli: Option<PathBuf>,
}

impl EngineWrapper {
    /// Discover the external binaries, preferring explicit overrides over
    /// `PATH` lookup.
    pub fn discover(
        engine_override: Option<&Path>,
        memory_override: Option<&Path>,
    ) -> Result<Self, ToolError> {
        let engine_cli = resolve_binary(ENGINE_BIN, engine_override)?;
        let memory_cli = match resolve_binary(MEMORY_BIN, memory_override) {
            Ok(path) => Some(path),
            Err(err) => {
                warn!("memory CLI unavailable: {err}");
                None
            }
        };
        Ok(Self {
            engine_cli,
            memory_cli,
        })
    }

    /// Construct from known binary paths. Used by tests and embedders.
    #[must_use]
    pub const fn with_paths(engine_cli: PathBuf, memory_cli: Option<PathBuf>) -> Self {
        Self {
            engine_cli,
            memory_cli,
        }
    }

    #[must_use]
    pub fn engine_cli(&self) -> &Path {
        &self.engine_cli
    }

    #[must_use]
    pub fn memory_cli(&self) -> Option<&Path> {
        self.memory_cli.as_deref()
    }

    /// Map a tool type to the binary that serves it, or `None` when the
    /// memory binary was not discovered.
    fn binary_for(&self, tool_type: ToolType) -> Option<&Path> {
        match tool_type {
            ToolType::MemorySearch | ToolType::MemoryCommit | ToolType::MemoryShow => {
                self.memory_cli.as_deref()
            }
            _ => Some(&self.engine_cli),
        }
    }

    fn build_spec(&self, binary: &Path, call: &ToolCall) -> CommandSpec {
        CommandSpec::new(binary)
            .arg(subcommand_for(call.tool_type))
            .arg("--params")
            .arg(call.parameters.to_string())
    }
}

impl ToolExecutor for EngineWrapper {
    fn invoke(&self, call: &ToolCall) -> ToolResult {
        let Some(binary) = self.binary_for(call.tool_type) else {
            return ToolResult::failure(format!(
                "memory CLI not available for tool '{}'",
                call.tool_type
            ));
        };

        let spec = self.build_spec(binary, call);
        debug!(tool = %call.tool_type, program = %binary.display(), "invoking tool");

        let output = match spec.to_command().output() {
            Ok(output) => output,
            Err(err) => {
                return ToolResult::failure(format!(
                    "failed to spawn {}: {err}",
                    binary.display()
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        match serde_json::from_str::<ToolResult>(&stdout) {
            Ok(result) => result,
            Err(parse_err) if output.status.success() => ToolResult::failure(format!(
                "tool '{}' produced undecodable output: {parse_err}",
                call.tool_type
            )),
            Err(_) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                ToolResult::failure(format!(
                    "tool '{}' exited with {}: {}",
                    call.tool_type,
                    output.status,
                    tail(&stderr, STDERR_CAP_BYTES)
                ))
            }
        }
    }
}

/// Subcommand name on the external binary for each tool type.
#[must_use]
pub const fn subcommand_for(tool_type: ToolType) -> &'static str {
    match tool_type {
        ToolType::GenerateStrategy => "generate-strategy",
        ToolType::Backtest => "backtest",
        ToolType::RunTests => "run-tests",
        ToolType::CheckDeterminism => "check-determinism",
        ToolType::Lint => "lint",
        ToolType::CrvVerify => "crv-verify",
        ToolType::MemorySearch => "search",
        ToolType::MemoryCommit => "commit",
        ToolType::MemoryShow => "show",
    }
}

fn resolve_binary(name: &str, override_path: Option<&Path>) -> Result<PathBuf, ToolError> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(ToolError::BinaryNotFound {
            name: path.display().to_string(),
        });
    }
    which::which(name).map_err(|_| ToolError::BinaryNotFound {
        name: name.to_string(),
    })
}

/// Last `max_bytes` of a string, on a char boundary.
fn tail(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s.trim_end();
    }
    let mut start = s.len() - max_bytes;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    s[start..].trim_end()
}
