//! complete - the model declares the task finished

use super::ToolResult;
use crate::llm::Parameters;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Complete {
    pub result: String,
}

impl Complete {
    pub fn from_parameters(params: &Parameters) -> Self {
        Self {
            result: params.get("result").cloned().unwrap_or_default(),
        }
    }

    pub fn execute(&self) -> ToolResult {
        ToolResult::success(format!("Task complete: {}", self.result))
    }
}
