//! Operator interaction channel
//!
//! Confirmations and questions are the only points where a run waits on a
//! human. The loop models them as an explicit `AwaitingInput` state and asks
//! an `Interaction` implementation to satisfy them.

use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

/// Something the run needs from the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputRequest {
    /// Approve running a shell command
    Confirm { command: String },
    /// Free-text answer to a model question
    Question { question: String },
}

impl InputRequest {
    /// Text shown to the operator
    pub fn prompt(&self) -> String {
        match self {
            InputRequest::Confirm { command } => {
                format!("\nRun the following command?\n{}\n[y/n]: ", command)
            }
            InputRequest::Question { question } => format!("\nQuestion: {}\nAnswer: ", question),
        }
    }
}

/// Errors from the interaction channel
#[derive(Debug, thiserror::Error)]
pub enum InteractionError {
    #[error("input stream closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no scripted answer left for: {0}")]
    Exhausted(String),
}

/// Line-based prompt/response primitive
#[async_trait]
pub trait Interaction: Send + Sync {
    /// Present the request and wait for one line of input
    async fn request(&self, request: &InputRequest) -> Result<String, InteractionError>;

    /// Show operator-facing output
    fn display(&self, _text: &str) {}
}

/// Interaction over the process stdin/stdout
///
/// Stdin is read on a dedicated thread so a pending read never holds the
/// runtime open after an interrupt.
pub struct ConsoleInteraction {
    lines: tokio::sync::Mutex<mpsc::UnboundedReceiver<std::io::Result<String>>>,
}

impl ConsoleInteraction {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        });
        Self {
            lines: tokio::sync::Mutex::new(rx),
        }
    }

    /// Print `prompt` and read one line (without the trailing newline)
    pub async fn read_line(&self, prompt: &str) -> Result<String, InteractionError> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        match self.lines.lock().await.recv().await {
            Some(line) => Ok(line?),
            None => Err(InteractionError::Closed),
        }
    }
}

impl Default for ConsoleInteraction {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interaction for ConsoleInteraction {
    async fn request(&self, request: &InputRequest) -> Result<String, InteractionError> {
        let answer = self.read_line(&request.prompt()).await?;
        Ok(answer.trim().to_string())
    }

    fn display(&self, text: &str) {
        println!("{}", text);
    }
}

/// Pre-recorded answers, for tests and unattended runs
#[derive(Debug, Default)]
pub struct ScriptedInteraction {
    answers: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<InputRequest>>,
    displayed: Mutex<Vec<String>>,
}

impl ScriptedInteraction {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<InputRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Lines passed to `display`
    pub fn displayed(&self) -> Vec<String> {
        self.displayed.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Interaction for ScriptedInteraction {
    async fn request(&self, request: &InputRequest) -> Result<String, InteractionError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .ok_or_else(|| InteractionError::Exhausted(request.prompt().trim().to_string()))
    }

    fn display(&self, text: &str) {
        if let Ok(mut displayed) = self.displayed.lock() {
            displayed.push(text.to_string());
        }
    }
}
