//! aureus - evidence-gated goal orchestrator for quant strategy pipelines
//!
//! This crate provides the goal-execution control plane for a quant
//! reasoning system: a finite state machine that enforces legal ordering of
//! pipeline actions, a gate framework that verifies artifacts produced by
//! external tools, and a reflexion loop that turns gate failures into
//! bounded, directed retries.
//!
//! aureus can be used in two ways:
//! - **CLI**: run goals from the command line (`aureus run`, `aureus validate`)
//! - **Library**: embed the [`Orchestrator`] with a custom [`ToolExecutor`]
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! aureus run --goal "design a trend strategy under DD<10%" --data data/spy.parquet
//! aureus validate
//! ```
//!
//! # Quick Start (Library)
//!
//! The external-process boundary is a single injectable trait, so the whole
//! control plane can run against a scripted executor:
//!
//! ```rust
//! use aureus::config::OrchestratorConfig;
//! use aureus::orchestrator::Orchestrator;
//! use aureus::tools::{ToolCall, ToolExecutor, ToolResult};
//!
//! struct AlwaysFails;
//!
//! impl ToolExecutor for AlwaysFails {
//!     fn invoke(&self, _call: &ToolCall) -> ToolResult {
//!         ToolResult::failure("engine offline")
//!     }
//! }
//!
//! let mut orchestrator =
//!     Orchestrator::new(Box::new(AlwaysFails), OrchestratorConfig::default());
//! let report = orchestrator.run_goal("demo", std::path::Path::new("data.parquet"));
//! assert!(!report.success);
//! ```
//!
//! # Architecture
//!
//! Leaf to root:
//! - [`tools`]: typed `ToolCall`/`ToolResult` envelope plus the
//!   out-of-process wrapper for the engine and memory binaries
//! - [`fsm`]: the goal-guard state machine (transition legality + history)
//! - [`gates`]: dev gate (tests/determinism/lint) and product gate (CRV)
//! - [`reflexion`]: failure classification and the bounded retry budget
//! - [`orchestrator`]: composition root driving one goal to commit

pub mod cli;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod fsm;
pub mod gates;
pub mod logging;
pub mod orchestrator;
pub mod reflexion;
pub mod strict_mode;
pub mod tools;

pub use config::OrchestratorConfig;
pub use error::AureusError;
pub use fsm::{FSMState, GoalGuardFSM, State};
pub use gates::{DevGate, Gate, GateContext, GateResult, ProductGate};
pub use orchestrator::{GoalReport, Orchestrator};
pub use reflexion::{FailureType, ReflexionLoop, RepairPlan};
pub use strict_mode::StrictMode;
pub use tools::{EngineWrapper, ToolCall, ToolExecutor, ToolResult, ToolType};
