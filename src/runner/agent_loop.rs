//! Agent loop implementation
//!
//! Each `step` performs exactly one transition:
//! - `Running`: send the full history to the model, append the response,
//!   parse and dispatch it. The state becomes `AwaitingInput` when the tool
//!   needs the operator, `Terminated` after `complete`, else stays `Running`.
//! - `AwaitingInput`: ask the interaction channel and finish the pending call.
//! - `Terminated`: absorbing; stepping is an error and changes nothing.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::audit::{self, AuditLog};
use crate::error::{AgentError, Result};
use crate::interaction::Interaction;
use crate::llm::{Message, ModelClient, ModelError, parse_invocation};
use crate::prompt::{corrective_instruction, format_tool_result};
use crate::tools::{Dispatch, DispatchOutcome, Dispatcher, InputReply, PendingCall, ToolName};

/// Where the loop is between steps
#[derive(Debug)]
pub enum LoopState {
    Running,
    /// A tool is suspended until the operator answers
    AwaitingInput(PendingCall),
    Terminated,
}

impl LoopState {
    pub fn name(&self) -> &'static str {
        match self {
            LoopState::Running => "running",
            LoopState::AwaitingInput(_) => "awaiting_input",
            LoopState::Terminated => "terminated",
        }
    }
}

/// A run that reached `complete`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    /// Message of the final `complete` result
    pub summary: String,
    /// Model calls made
    pub turns: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AgentLoopConfig {
    /// Abort a model call that takes longer than this
    pub model_timeout: Option<Duration>,
}

pub struct AgentLoop<M, I>
where
    M: ModelClient,
    I: Interaction,
{
    model: Arc<M>,
    interaction: Arc<I>,
    dispatcher: Dispatcher,
    audit: AuditLog,
    history: Vec<Message>,
    state: LoopState,
    config: AgentLoopConfig,
    turns: usize,
    summary: Option<String>,
}

impl<M, I> AgentLoop<M, I>
where
    M: ModelClient,
    I: Interaction,
{
    /// History starts as `[system, task]`
    pub fn new(
        model: Arc<M>,
        interaction: Arc<I>,
        dispatcher: Dispatcher,
        audit: AuditLog,
        system_prompt: impl Into<String>,
        task: impl Into<String>,
    ) -> Self {
        Self {
            model,
            interaction,
            dispatcher,
            audit,
            history: vec![Message::system(system_prompt), Message::user(task)],
            state: LoopState::Running,
            config: AgentLoopConfig::default(),
            turns: 0,
            summary: None,
        }
    }

    pub fn with_config(mut self, config: AgentLoopConfig) -> Self {
        self.config = config;
        self
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, LoopState::Terminated)
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    /// Step until `complete` is dispatched
    ///
    /// Returns the first fatal error (model or interaction channel failure);
    /// the loop is left non-terminated in that case.
    pub async fn run(&mut self) -> Result<LoopOutcome> {
        while !self.is_terminated() {
            self.step().await?;
        }

        Ok(LoopOutcome {
            summary: self.summary.clone().unwrap_or_default(),
            turns: self.turns,
        })
    }

    /// Perform exactly one transition
    pub async fn step(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, LoopState::Running) {
            LoopState::Running => self.model_turn().await,
            LoopState::AwaitingInput(pending) => {
                let answer = self.interaction.request(pending.request()).await;
                match answer {
                    Ok(answer) => {
                        self.finish_pending(pending, InputReply::Answer(answer)).await;
                        Ok(())
                    }
                    Err(e) => {
                        self.finish_pending(pending, InputReply::Unavailable(e.to_string()))
                            .await;
                        self.audit.record(
                            audit::ERROR,
                            json!({"stage": "interaction", "error": e.to_string()}),
                        );
                        log::error!("Interaction channel failed: {}", e);
                        Err(e.into())
                    }
                }
            }
            LoopState::Terminated => {
                self.state = LoopState::Terminated;
                Err(AgentError::InvalidState("loop already terminated".to_string()))
            }
        }
    }

    /// Satisfy `AwaitingInput` from an external channel
    pub async fn resume(&mut self, reply: InputReply) -> Result<()> {
        match std::mem::replace(&mut self.state, LoopState::Running) {
            LoopState::AwaitingInput(pending) => {
                self.finish_pending(pending, reply).await;
                Ok(())
            }
            other => {
                let name = other.name();
                self.state = other;
                Err(AgentError::InvalidState(format!("cannot resume while {}", name)))
            }
        }
    }

    async fn model_turn(&mut self) -> Result<()> {
        self.turns += 1;
        log::info!("Turn {}: sending {} messages to {}", self.turns, self.history.len(), self.model.model());
        self.audit.record(audit::REQUEST, json!(self.history));

        let response = match self.call_model().await {
            Ok(response) => response,
            Err(e) => {
                log::error!("Model call failed: {}", e);
                self.audit
                    .record(audit::ERROR, json!({"stage": "model", "error": e.to_string()}));
                return Err(e.into());
            }
        };
        self.audit.record(audit::RESPONSE, json!(response));

        let invocation = parse_invocation(&response);
        self.history.push(Message::assistant(response));

        match self.dispatcher.begin(invocation).await {
            Dispatch::Done(outcome) => self.apply(outcome),
            Dispatch::NeedsInput(pending) => self.state = LoopState::AwaitingInput(pending),
        }
        Ok(())
    }

    async fn call_model(&self) -> std::result::Result<String, ModelError> {
        match self.config.model_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.model.complete(&self.history))
                .await
                .map_err(|_| ModelError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                })?,
            None => self.model.complete(&self.history).await,
        }
    }

    async fn finish_pending(&mut self, pending: PendingCall, reply: InputReply) {
        let outcome = self.dispatcher.finish(pending, reply).await;
        self.apply(outcome);
    }

    /// Feed one dispatch outcome back into the history and pick the next state
    fn apply(&mut self, outcome: DispatchOutcome) {
        let interactive = [ToolName::AskQuestion.as_str(), ToolName::ExecuteCommand.as_str()];
        if !interactive.contains(&outcome.tool_name.as_str()) {
            self.interaction
                .display(&format!("\n[{}] {}", outcome.tool_name, outcome.result.message));
        }

        if outcome.no_tool_found() {
            self.history.push(Message::user(corrective_instruction()));
        } else {
            self.history.push(Message::user(format_tool_result(
                &outcome.tool_name,
                &outcome.result.message,
            )));
        }

        if outcome.is_terminal {
            log::info!("Task complete after {} turns", self.turns);
            self.summary = Some(outcome.result.message);
            self.state = LoopState::Terminated;
        } else {
            self.state = LoopState::Running;
        }
    }
}
