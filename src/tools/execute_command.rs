//! execute_command - run a shell command in the working directory
//!
//! The command gate is consulted before anything else; an unsafe command is
//! rejected whatever the approval answer. A non-zero exit status is still a
//! successful tool result, since the model needs to see the output.

use std::fmt::Write as _;
use std::process::Stdio;

use tokio::process::Command;

use super::context::{ToolContext, ToolError};
use super::{ToolResult, parse_bool};
use crate::interaction::InputRequest;
use crate::llm::Parameters;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteCommand {
    pub command: String,
    pub requires_approval: bool,
}

impl ExecuteCommand {
    /// `requires_approval` defaults to true
    pub fn from_parameters(params: &Parameters) -> Self {
        Self {
            command: params.get("command").cloned().unwrap_or_default(),
            requires_approval: params.get("requires_approval").is_none_or(|v| parse_bool(v)),
        }
    }

    /// Validation that needs no operator input
    pub fn screen(&self, ctx: &ToolContext) -> Result<(), ToolError> {
        if self.command.trim().is_empty() {
            return Err(ToolError::InvalidInput {
                message: "execute_command requires a command".to_string(),
            });
        }

        ctx.gate().check(&self.command).map_err(|matched| {
            log::warn!("Rejected unsafe command '{}' (matched '{}')", self.command, matched);
            ToolError::Rejected {
                command: self.command.clone(),
                matched,
            }
        })
    }

    pub fn confirmation(&self) -> Option<InputRequest> {
        self.requires_approval.then(|| InputRequest::Confirm {
            command: self.command.clone(),
        })
    }

    /// Screen, check approval, then run
    ///
    /// `approval` is the operator's answer to the confirmation; when approval
    /// is required and the answer is missing or not affirmative the command
    /// is declined without launching anything.
    pub async fn execute(&self, ctx: &ToolContext, approval: Option<&str>) -> Result<ToolResult, ToolError> {
        self.screen(ctx)?;

        if self.requires_approval && !approval.is_some_and(parse_bool) {
            log::info!("Command declined: {}", self.command);
            return Err(ToolError::Declined);
        }

        self.run(ctx).await
    }

    async fn run(&self, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        log::info!("Executing command in {}: {}", ctx.workdir().display(), self.command);

        let child = shell_command(&self.command)
            .current_dir(ctx.workdir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::LaunchFailed {
                command: self.command.clone(),
                source,
            })?;

        let waited = match ctx.command_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| ToolError::Timeout {
                    command: self.command.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                })?,
            None => child.wait_with_output().await,
        };
        let output = waited.map_err(|source| ToolError::LaunchFailed {
            command: self.command.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut message = match output.status.code() {
            Some(0) => format!("Command '{}' completed successfully (exit code 0).", self.command),
            Some(code) => format!("Command '{}' exited with code {}.", self.command, code),
            None => format!("Command '{}' was terminated by a signal.", self.command),
        };
        if !stdout.is_empty() {
            let _ = write!(message, "\n\nOutput:\n{}", truncate_output(&stdout, ctx.max_output_chars()));
        }
        if !stderr.is_empty() {
            let _ = write!(message, "\n\nErrors:\n{}", truncate_output(&stderr, ctx.max_output_chars()));
        }

        Ok(ToolResult::success(message))
    }
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("powershell.exe");
        cmd.arg("-Command").arg(command);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

/// Cut `text` to `max_chars` characters, noting how much was dropped
fn truncate_output(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars).collect();
    format!("{}\n... [output truncated, {} of {} chars shown]", kept, max_chars, total)
}
