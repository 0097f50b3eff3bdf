//! Dispatcher - validates a parsed invocation and runs the matching tool
//!
//! Dispatch is two-phase. `begin` either completes the call or returns a
//! `PendingCall` that needs operator input; `finish` completes it with the
//! reply. Whatever happens, the caller gets a `DispatchOutcome`, never an
//! error, and exactly one `tool_result` audit entry is written per outcome.

use serde_json::json;

use super::context::{ToolContext, ToolError};
use super::{
    AskQuestion, Complete, ExecuteCommand, ListFile, NO_VALID_TOOL, ReadFile, ToolErrorKind, ToolName, ToolResult,
    WriteFile,
};
use crate::audit::{self, AuditLog};
use crate::interaction::{InputRequest, Interaction};
use crate::llm::ToolInvocation;

/// A recognised invocation with its typed parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    ListFile(ListFile),
    ReadFile(ReadFile),
    WriteFile(WriteFile),
    AskQuestion(AskQuestion),
    ExecuteCommand(ExecuteCommand),
    Complete(Complete),
}

impl ToolCall {
    /// `None` when the name is not one of the six tools
    pub fn from_invocation(invocation: &ToolInvocation) -> Option<Self> {
        let params = &invocation.parameters;
        let call = match ToolName::from_name(&invocation.name)? {
            ToolName::ListFile => ToolCall::ListFile(ListFile::from_parameters(params)),
            ToolName::ReadFile => ToolCall::ReadFile(ReadFile::from_parameters(params)),
            ToolName::WriteFile => ToolCall::WriteFile(WriteFile::from_parameters(params)),
            ToolName::AskQuestion => ToolCall::AskQuestion(AskQuestion::from_parameters(params)),
            ToolName::ExecuteCommand => ToolCall::ExecuteCommand(ExecuteCommand::from_parameters(params)),
            ToolName::Complete => ToolCall::Complete(Complete::from_parameters(params)),
        };
        Some(call)
    }

    pub fn name(&self) -> ToolName {
        match self {
            ToolCall::ListFile(_) => ToolName::ListFile,
            ToolCall::ReadFile(_) => ToolName::ReadFile,
            ToolCall::WriteFile(_) => ToolName::WriteFile,
            ToolCall::AskQuestion(_) => ToolName::AskQuestion,
            ToolCall::ExecuteCommand(_) => ToolName::ExecuteCommand,
            ToolCall::Complete(_) => ToolName::Complete,
        }
    }

    /// Operator input this call must wait for, if any
    pub fn input_request(&self) -> Option<InputRequest> {
        match self {
            ToolCall::AskQuestion(ask) => Some(ask.input_request()),
            ToolCall::ExecuteCommand(exec) => exec.confirmation(),
            _ => None,
        }
    }

    async fn execute(&self, ctx: &ToolContext, reply: Option<&str>) -> Result<ToolResult, ToolError> {
        match self {
            ToolCall::ListFile(tool) => tool.execute(ctx).await,
            ToolCall::ReadFile(tool) => tool.execute(ctx).await,
            ToolCall::WriteFile(tool) => tool.execute(ctx).await,
            ToolCall::AskQuestion(tool) => Ok(tool.answer(reply.unwrap_or_default())),
            ToolCall::ExecuteCommand(tool) => tool.execute(ctx, reply).await,
            ToolCall::Complete(tool) => Ok(tool.execute()),
        }
    }
}

/// Result of one completed dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub result: ToolResult,
    /// Empty when the response held no tool block
    pub tool_name: String,
    /// True only for `complete`
    pub is_terminal: bool,
}

impl DispatchOutcome {
    pub fn no_tool_found(&self) -> bool {
        self.tool_name.is_empty()
    }
}

/// A call suspended until the operator answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    invocation: ToolInvocation,
    call: ToolCall,
    request: InputRequest,
}

impl PendingCall {
    pub fn request(&self) -> &InputRequest {
        &self.request
    }

    pub fn tool_name(&self) -> ToolName {
        self.call.name()
    }

    pub fn invocation(&self) -> &ToolInvocation {
        &self.invocation
    }
}

/// What the interaction channel produced for a pending call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputReply {
    Answer(String),
    /// The channel failed; the reason is reported back as the tool failure
    Unavailable(String),
}

#[derive(Debug)]
pub enum Dispatch {
    Done(DispatchOutcome),
    NeedsInput(PendingCall),
}

pub struct Dispatcher {
    ctx: ToolContext,
    audit: AuditLog,
}

impl Dispatcher {
    pub fn new(ctx: ToolContext, audit: AuditLog) -> Self {
        Self { ctx, audit }
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    /// Run the invocation as far as possible without operator input
    pub async fn begin(&self, invocation: ToolInvocation) -> Dispatch {
        if invocation.is_none() {
            let result = ToolResult::failure(ToolErrorKind::NoToolFound, NO_VALID_TOOL);
            return Dispatch::Done(self.conclude(&invocation, String::new(), false, result));
        }

        let Some(call) = ToolCall::from_invocation(&invocation) else {
            log::warn!("Model requested unknown tool: {}", invocation.name);
            let result = ToolResult::failure(
                ToolErrorKind::UnknownTool,
                format!("unknown tool: {}", invocation.name),
            );
            let name = invocation.name.clone();
            return Dispatch::Done(self.conclude(&invocation, name, false, result));
        };

        // Gate before confirmation: an unsafe command is never offered for approval
        if let ToolCall::ExecuteCommand(exec) = &call {
            if let Err(e) = exec.screen(&self.ctx) {
                return Dispatch::Done(self.conclude_call(&invocation, &call, Err(e)));
            }
        }

        if let Some(request) = call.input_request() {
            log::debug!("{} waiting for operator input", call.name());
            return Dispatch::NeedsInput(PendingCall {
                invocation,
                call,
                request,
            });
        }

        let result = call.execute(&self.ctx, None).await;
        Dispatch::Done(self.conclude_call(&invocation, &call, result))
    }

    /// Complete a suspended call with the operator's reply
    pub async fn finish(&self, pending: PendingCall, reply: InputReply) -> DispatchOutcome {
        let PendingCall { invocation, call, .. } = pending;
        let result = match reply {
            InputReply::Answer(answer) => call.execute(&self.ctx, Some(&answer)).await,
            InputReply::Unavailable(message) => Err(ToolError::Interaction { message }),
        };
        self.conclude_call(&invocation, &call, result)
    }

    /// Both phases, asking `interaction` for input when needed
    pub async fn dispatch(&self, invocation: ToolInvocation, interaction: &dyn Interaction) -> DispatchOutcome {
        match self.begin(invocation).await {
            Dispatch::Done(outcome) => outcome,
            Dispatch::NeedsInput(pending) => {
                let reply = match interaction.request(pending.request()).await {
                    Ok(answer) => InputReply::Answer(answer),
                    Err(e) => InputReply::Unavailable(e.to_string()),
                };
                self.finish(pending, reply).await
            }
        }
    }

    fn conclude_call(
        &self,
        invocation: &ToolInvocation,
        call: &ToolCall,
        result: Result<ToolResult, ToolError>,
    ) -> DispatchOutcome {
        let name = call.name();
        let result = result.unwrap_or_else(ToolResult::from);
        self.conclude(invocation, name.to_string(), name == ToolName::Complete, result)
    }

    fn conclude(
        &self,
        invocation: &ToolInvocation,
        tool_name: String,
        is_terminal: bool,
        result: ToolResult,
    ) -> DispatchOutcome {
        if result.success {
            log::info!("Tool {} succeeded", tool_name);
        } else {
            log::info!("Tool '{}' failed: {}", tool_name, result.message);
        }

        self.audit.record(
            audit::TOOL_RESULT,
            json!({
                "tool_name": tool_name,
                "parameters": invocation.parameters,
                "success": result.success,
                "error_kind": result.error_kind,
                "message": result.message,
            }),
        );

        DispatchOutcome {
            result,
            tool_name,
            is_terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::ScriptedInteraction;
    use crate::llm::Parameters;
    use std::fs;
    use tempfile::TempDir;

    fn invocation(name: &str, pairs: &[(&str, &str)]) -> ToolInvocation {
        let params: Parameters = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ToolInvocation::new(name, params)
    }

    fn dispatcher(temp_dir: &TempDir) -> Dispatcher {
        Dispatcher::new(
            ToolContext::new(temp_dir.path().to_path_buf()),
            AuditLog::new(temp_dir.path().join("logs")),
        )
    }

    fn audit_entries(d: &Dispatcher) -> Vec<serde_json::Value> {
        let Some(path) = d.audit.current_file() else {
            return Vec::new();
        };
        fs::read_to_string(path)
            .map(|content| {
                content
                    .lines()
                    .map(|line| serde_json::from_str(line).unwrap())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_tool_call_from_invocation() {
        let call = ToolCall::from_invocation(&invocation("read_file", &[("path", "a.txt")])).unwrap();
        assert_eq!(call.name(), ToolName::ReadFile);
        assert_eq!(call.input_request(), None);

        assert!(ToolCall::from_invocation(&invocation("delete_file", &[])).is_none());
    }

    #[tokio::test]
    async fn test_no_tool_found() {
        let temp_dir = TempDir::new().unwrap();
        let d = dispatcher(&temp_dir);

        let Dispatch::Done(outcome) = d.begin(ToolInvocation::none()).await else {
            panic!("expected Done");
        };
        assert!(outcome.no_tool_found());
        assert!(!outcome.is_terminal);
        assert!(!outcome.result.success);
        assert_eq!(outcome.result.message, "no valid tool found");
        assert_eq!(outcome.result.error_kind, Some(ToolErrorKind::NoToolFound));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let temp_dir = TempDir::new().unwrap();
        let d = dispatcher(&temp_dir);

        let Dispatch::Done(outcome) = d.begin(invocation("delete_file", &[("path", "x")])).await else {
            panic!("expected Done");
        };
        assert_eq!(outcome.tool_name, "delete_file");
        assert_eq!(outcome.result.message, "unknown tool: delete_file");
        assert_eq!(outcome.result.error_kind, Some(ToolErrorKind::UnknownTool));
        assert!(!outcome.is_terminal);
    }

    #[tokio::test]
    async fn test_complete_is_terminal() {
        let temp_dir = TempDir::new().unwrap();
        let d = dispatcher(&temp_dir);

        let Dispatch::Done(outcome) = d.begin(invocation("complete", &[("result", "done")])).await else {
            panic!("expected Done");
        };
        assert!(outcome.is_terminal);
        assert!(outcome.result.success);
        assert_eq!(outcome.result.message, "Task complete: done");
    }

    #[tokio::test]
    async fn test_write_then_read_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let d = dispatcher(&temp_dir);
        let channel = ScriptedInteraction::default();

        let written = d
            .dispatch(
                invocation("write_file", &[("path", "pkg/sub/hello.py"), ("content", "print('hi')")]),
                &channel,
            )
            .await;
        assert!(written.result.success);
        assert!(!written.is_terminal);
        assert!(temp_dir.path().join("pkg/sub").is_dir());

        let read = d
            .dispatch(invocation("read_file", &[("path", "pkg/sub/hello.py")]), &channel)
            .await;
        assert_eq!(read.result.message, "print('hi')");
        assert!(channel.requests().is_empty());
    }

    #[tokio::test]
    async fn test_ask_question_suspends() {
        let temp_dir = TempDir::new().unwrap();
        let d = dispatcher(&temp_dir);

        let Dispatch::NeedsInput(pending) = d.begin(invocation("ask_question", &[("question", "Port?")])).await
        else {
            panic!("expected NeedsInput");
        };
        assert_eq!(pending.tool_name(), ToolName::AskQuestion);
        assert_eq!(
            pending.request(),
            &InputRequest::Question {
                question: "Port?".to_string()
            }
        );

        let outcome = d.finish(pending, InputReply::Answer("8080".to_string())).await;
        assert_eq!(outcome.result.message, "User answered: 8080");
        assert_eq!(outcome.tool_name, "ask_question");
    }

    #[tokio::test]
    async fn test_unsafe_command_never_prompts() {
        let temp_dir = TempDir::new().unwrap();
        let d = dispatcher(&temp_dir);
        let channel = ScriptedInteraction::new(["y"]);

        let outcome = d
            .dispatch(invocation("execute_command", &[("command", "rm -rf /")]), &channel)
            .await;

        assert!(!outcome.result.success);
        assert_eq!(outcome.result.error_kind, Some(ToolErrorKind::Rejected));
        assert!(channel.requests().is_empty());
    }

    #[tokio::test]
    async fn test_declined_command_does_not_run() {
        let temp_dir = TempDir::new().unwrap();
        let d = dispatcher(&temp_dir);
        let channel = ScriptedInteraction::new(["n"]);

        let outcome = d
            .dispatch(invocation("execute_command", &[("command", "touch ran.txt")]), &channel)
            .await;

        assert!(!outcome.result.success);
        assert_eq!(outcome.result.error_kind, Some(ToolErrorKind::Declined));
        assert_eq!(channel.requests().len(), 1);
        assert!(!temp_dir.path().join("ran.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_without_approval_runs_immediately() {
        let temp_dir = TempDir::new().unwrap();
        let d = dispatcher(&temp_dir);

        let Dispatch::Done(outcome) = d
            .begin(invocation(
                "execute_command",
                &[("command", "echo hi"), ("requires_approval", "false")],
            ))
            .await
        else {
            panic!("expected Done");
        };
        assert!(outcome.result.success);
        assert!(outcome.result.message.contains("Output:\nhi"));
    }

    #[tokio::test]
    async fn test_unavailable_reply_is_interaction_failure() {
        let temp_dir = TempDir::new().unwrap();
        let d = dispatcher(&temp_dir);
        let channel = ScriptedInteraction::default();

        let outcome = d
            .dispatch(invocation("ask_question", &[("question", "Anyone there?")]), &channel)
            .await;

        assert!(!outcome.result.success);
        assert_eq!(outcome.result.error_kind, Some(ToolErrorKind::Interaction));
    }

    #[tokio::test]
    async fn test_failures_are_results() {
        let temp_dir = TempDir::new().unwrap();
        let d = dispatcher(&temp_dir);
        let channel = ScriptedInteraction::default();

        let outcome = d.dispatch(invocation("read_file", &[("path", "missing.txt")]), &channel).await;
        assert!(!outcome.result.success);
        assert_eq!(outcome.result.error_kind, Some(ToolErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_each_outcome_is_audited() {
        let temp_dir = TempDir::new().unwrap();
        let d = dispatcher(&temp_dir);
        let channel = ScriptedInteraction::default();

        d.dispatch(ToolInvocation::none(), &channel).await;
        d.dispatch(invocation("complete", &[("result", "ok")]), &channel).await;

        let entries = audit_entries(&d);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e["type"] == "tool_result"));
        assert_eq!(entries[0]["data"]["tool_name"], "");
        assert_eq!(entries[0]["data"]["error_kind"], "no_tool_found");
        assert_eq!(entries[1]["data"]["tool_name"], "complete");
        assert_eq!(entries[1]["data"]["parameters"]["result"], "ok");
        assert_eq!(entries[1]["data"]["success"], true);
    }
}
