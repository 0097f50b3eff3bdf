//! Tool execution context - working directory, command gate, limits

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use super::ToolErrorKind;
use crate::safety::CommandGate;

/// Default cap on captured command output
pub const DEFAULT_MAX_OUTPUT_CHARS: usize = 30_000;

/// Execution context shared by every tool in a run
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Relative paths and commands resolve here
    workdir: PathBuf,

    gate: CommandGate,

    /// Kill commands running longer than this
    command_timeout: Option<Duration>,

    max_output_chars: usize,
}

impl ToolContext {
    pub fn new(workdir: PathBuf) -> Self {
        Self {
            workdir,
            gate: CommandGate::default(),
            command_timeout: None,
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
        }
    }

    pub fn with_gate(mut self, gate: CommandGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_max_output_chars(mut self, max: usize) -> Self {
        self.max_output_chars = max;
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn gate(&self) -> &CommandGate {
        &self.gate
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout
    }

    pub fn max_output_chars(&self) -> usize {
        self.max_output_chars
    }

    /// Normalize a model-supplied path and anchor it at the working directory
    pub fn resolve_path(&self, raw: &str) -> PathBuf {
        let path = normalize_path(raw);
        if path.is_absolute() {
            path
        } else {
            lexical_normalize(&self.workdir.join(path))
        }
    }
}

/// Expand `~` and collapse `.`/`..` without touching the filesystem
pub fn normalize_path(raw: &str) -> PathBuf {
    lexical_normalize(&expand_home(raw.trim()))
}

fn expand_home(raw: &str) -> PathBuf {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\"))
    };

    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Errors that can occur during tool execution
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("No such file or directory: {path}")]
    NotFound { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Command execution was declined by the user")]
    Declined,

    #[error("Refused to run unsafe command '{command}' (matched '{matched}')")]
    Rejected { command: String, matched: String },

    #[error("Failed to launch command '{command}': {source}")]
    LaunchFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{command}' timed out after {timeout_ms}ms")]
    Timeout { command: String, timeout_ms: u64 },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("IO error during {operation} on {path}: {source}")]
    Io {
        operation: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Interaction channel failed: {message}")]
    Interaction { message: String },
}

impl ToolError {
    /// Classify an IO failure on `path`
    pub fn io(operation: &str, path: &str, source: std::io::Error) -> Self {
        match source.kind() {
            ErrorKind::NotFound => ToolError::NotFound { path: path.to_string() },
            ErrorKind::PermissionDenied => ToolError::PermissionDenied { path: path.to_string() },
            _ => ToolError::Io {
                operation: operation.to_string(),
                path: path.to_string(),
                source,
            },
        }
    }

    pub fn kind(&self) -> ToolErrorKind {
        match self {
            ToolError::NotFound { .. } => ToolErrorKind::NotFound,
            ToolError::PermissionDenied { .. } => ToolErrorKind::PermissionDenied,
            ToolError::Declined => ToolErrorKind::Declined,
            ToolError::Rejected { .. } => ToolErrorKind::Rejected,
            ToolError::LaunchFailed { .. } => ToolErrorKind::LaunchFailed,
            ToolError::Timeout { .. } => ToolErrorKind::TimedOut,
            ToolError::InvalidInput { .. } => ToolErrorKind::InvalidInput,
            ToolError::Io { .. } => ToolErrorKind::Io,
            ToolError::Interaction { .. } => ToolErrorKind::Interaction,
        }
    }
}
