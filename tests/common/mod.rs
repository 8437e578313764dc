//! Shared test support: a scripted fake executor for the tool contract

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use aureus::tools::{ToolCall, ToolExecutor, ToolResult, ToolType};
use serde_json::Value;

#[derive(Default)]
struct Inner {
    scripts: HashMap<ToolType, VecDeque<ToolResult>>,
    calls: Vec<ToolCall>,
}

/// Scripted [`ToolExecutor`] that replays canned results per tool type.
///
/// Results are consumed front to back; the final scripted result for a
/// tool is sticky so repeated invocations (e.g. gate re-runs on retry)
/// keep observing it. Unscripted tools succeed with empty output. The
/// executor records every call for assertion.
#[derive(Clone, Default)]
pub struct ScriptedExecutor {
    inner: Rc<RefCell<Inner>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for the given tool.
    pub fn script(&self, tool_type: ToolType, result: ToolResult) -> &Self {
        self.inner
            .borrow_mut()
            .scripts
            .entry(tool_type)
            .or_default()
            .push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.inner.borrow().calls.clone()
    }

    pub fn invocations_of(&self, tool_type: ToolType) -> usize {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|call| call.tool_type == tool_type)
            .count()
    }

    pub fn params_of(&self, tool_type: ToolType) -> Vec<Value> {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|call| call.tool_type == tool_type)
            .map(|call| call.parameters.clone())
            .collect()
    }
}

impl ToolExecutor for ScriptedExecutor {
    fn invoke(&self, call: &ToolCall) -> ToolResult {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(call.clone());
        match inner.scripts.get_mut(&call.tool_type) {
            Some(queue) if queue.len() > 1 => queue.pop_front().expect("len checked"),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| ToolResult::ok(None, None)),
            None => ToolResult::ok(None, None),
        }
    }
}

/// A plausible 64-hex artifact id.
pub fn artifact_id(seed: char) -> String {
    seed.to_string().repeat(64)
}

/// Successful result carrying structured output.
pub fn ok_with(output: Value) -> ToolResult {
    ToolResult::ok(Some(output), None)
}
