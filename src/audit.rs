//! Append-only JSONL audit trail of a run
//!
//! One file per local calendar day, `agent_log_YYYYMMDD.jsonl`. Every entry is
//! a single line `{"timestamp", "type", "data"}` written with one `write_all`
//! on an append-mode handle.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde_json::{Value, json};

use crate::error::Result;

/// Entry type for a model request
pub const REQUEST: &str = "request";
/// Entry type for a model response
pub const RESPONSE: &str = "response";
/// Entry type for a completed tool dispatch
pub const TOOL_RESULT: &str = "tool_result";
/// Entry type for a fatal error
pub const ERROR: &str = "error";
/// Entry type for an operator interrupt
pub const INTERRUPTED: &str = "interrupted";

#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: Option<PathBuf>,
}

impl AuditLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: Some(dir.into()) }
    }

    /// Log that writes nothing
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn file_for(dir: &Path, date: NaiveDate) -> PathBuf {
        dir.join(format!("agent_log_{}.jsonl", date.format("%Y%m%d")))
    }

    /// Today's file, if enabled
    pub fn current_file(&self) -> Option<PathBuf> {
        self.dir
            .as_deref()
            .map(|dir| Self::file_for(dir, Local::now().date_naive()))
    }

    /// Append one entry; failures are logged, never returned
    pub fn record(&self, kind: &str, data: Value) {
        if let Err(e) = self.try_record(kind, data) {
            log::warn!("Failed to write {} audit entry: {}", kind, e);
        }
    }

    pub fn try_record(&self, kind: &str, data: Value) -> Result<()> {
        let Some(dir) = self.dir.as_deref() else {
            return Ok(());
        };

        fs::create_dir_all(dir)?;

        let now = Local::now();
        let entry = json!({
            "timestamp": now.to_rfc3339(),
            "type": kind,
            "data": data,
        });
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let path = Self::file_for(dir, now.date_naive());
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(line.as_bytes())?;

        log::trace!("Audit {} -> {}", kind, path.display());
        Ok(())
    }
}
