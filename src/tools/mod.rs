//! Tool system for model-driven actions
//!
//! The model can call exactly six tools. Each lives in its own module as a
//! typed parameter struct built from the parsed invocation. The dispatcher
//! matches over the closed `ToolCall` enum, so adding a tool is a compile
//! error until every match handles it.

mod ask_question;
mod complete;
mod context;
mod dispatcher;
mod execute_command;
mod list_file;
mod read_file;
mod write_file;

pub use ask_question::AskQuestion;
pub use complete::Complete;
pub use context::{ToolContext, ToolError, normalize_path};
pub use dispatcher::{Dispatch, DispatchOutcome, Dispatcher, InputReply, PendingCall, ToolCall};
pub use execute_command::ExecuteCommand;
pub use list_file::ListFile;
pub use read_file::ReadFile;
pub use write_file::WriteFile;

use serde::Serialize;

/// Message for a response with no tool block
pub const NO_VALID_TOOL: &str = "no valid tool found";

/// The fixed tool set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    ListFile,
    ReadFile,
    WriteFile,
    AskQuestion,
    ExecuteCommand,
    Complete,
}

impl ToolName {
    pub const ALL: [ToolName; 6] = [
        ToolName::ListFile,
        ToolName::ReadFile,
        ToolName::WriteFile,
        ToolName::AskQuestion,
        ToolName::ExecuteCommand,
        ToolName::Complete,
    ];

    /// Wire name, as used in the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ListFile => "list_file",
            ToolName::ReadFile => "read_file",
            ToolName::WriteFile => "write_file",
            ToolName::AskQuestion => "ask_question",
            ToolName::ExecuteCommand => "execute_command",
            ToolName::Complete => "complete",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    /// Comma-separated wire names of every tool
    pub fn list() -> String {
        Self::ALL.map(|tool| tool.as_str()).join(", ")
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong, for callers that want more than the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    NoToolFound,
    UnknownTool,
    NotFound,
    PermissionDenied,
    Declined,
    Rejected,
    LaunchFailed,
    TimedOut,
    InvalidInput,
    Io,
    Interaction,
}

/// Uniform outcome of one tool operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ToolErrorKind>,
}

impl ToolResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error_kind: None,
        }
    }

    pub fn failure(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_kind: Some(kind),
        }
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        ToolResult::failure(err.kind(), err.to_string())
    }
}

/// Text-to-bool for parameters that arrive as strings
///
/// `yes`, `true`, `t`, `1`, `on` and `y` (any case) are true; anything else is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "yes" | "true" | "t" | "1" | "on" | "y"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success("Operation completed");
        assert_eq!(result.message, "Operation completed");
        assert!(result.success);
        assert_eq!(result.error_kind, None);
    }

    #[test]
    fn test_tool_result_failure() {
        let result = ToolResult::failure(ToolErrorKind::NotFound, "missing");
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ToolErrorKind::NotFound));
    }

    #[test]
    fn test_tool_result_from_error() {
        let result = ToolResult::from(ToolError::Declined);
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ToolErrorKind::Declined));
        assert!(result.message.contains("declined"));
    }

    #[test]
    fn test_tool_names_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(ToolName::from_name(tool.as_str()), Some(tool));
        }
        assert_eq!(ToolName::from_name("run_command"), None);
        assert_eq!(ToolName::from_name(""), None);
    }

    #[test]
    fn test_tool_list() {
        assert_eq!(
            ToolName::list(),
            "list_file, read_file, write_file, ask_question, execute_command, complete"
        );
    }

    #[test]
    fn test_parse_bool_true_values() {
        for value in ["yes", "true", "t", "1", "on", "y", "TRUE", "Yes", " on "] {
            assert!(parse_bool(value), "{value} should be true");
        }
    }

    #[test]
    fn test_parse_bool_false_values() {
        for value in ["no", "false", "0", "off", "", "maybe", "yep"] {
            assert!(!parse_bool(value), "{value} should be false");
        }
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_string(&ToolErrorKind::PermissionDenied).unwrap();
        assert_eq!(json, "\"permission_denied\"");
    }
}
