//! Tool contract and the out-of-process wrapper that implements it

pub mod contract;
pub mod wrapper;

pub use contract::{ToolCall, ToolExecutor, ToolResult, ToolType};
pub use wrapper::{CommandSpec, ENGINE_BIN, EngineWrapper, MEMORY_BIN, subcommand_for};
