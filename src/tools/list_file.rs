//! list_file - files under a directory

use std::path::{Path, PathBuf};

use super::context::{ToolContext, ToolError};
use super::{ToolResult, parse_bool};
use crate::llm::Parameters;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFile {
    pub path: String,
    pub recursive: bool,
}

impl ListFile {
    /// `path` defaults to `.`, `recursive` to false
    pub fn from_parameters(params: &Parameters) -> Self {
        let path = params
            .get("path")
            .filter(|p| !p.is_empty())
            .cloned()
            .unwrap_or_else(|| ".".to_string());
        let recursive = params.get("recursive").is_some_and(|v| parse_bool(v));
        Self { path, recursive }
    }

    pub async fn execute(&self, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let dir = ctx.resolve_path(&self.path);

        let metadata = tokio::fs::metadata(&dir)
            .await
            .map_err(|e| ToolError::io("list directory", &self.path, e))?;
        if !metadata.is_dir() {
            return Err(ToolError::InvalidInput {
                message: format!("'{}' is not a directory", self.path),
            });
        }

        let files = collect_files(&dir, self.recursive)?;
        log::debug!("list_file {} found {} files", dir.display(), files.len());

        if files.is_empty() {
            return Ok(ToolResult::success(format!("No files in '{}'.", self.path)));
        }

        let shown = Path::new(&self.path);
        let lines: Vec<String> = files
            .iter()
            .map(|rel| {
                let entry = if self.path == "." { rel.clone() } else { shown.join(rel) };
                format!("- {}", entry.display())
            })
            .collect();

        Ok(ToolResult::success(format!(
            "Files in '{}':\n{}",
            self.path,
            lines.join("\n")
        )))
    }
}

/// Regular files under `dir`, relative to it, sorted
///
/// Symlinked directories are not followed.
fn collect_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, ToolError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        for path in entries_in(&current)? {
            let Ok(metadata) = path.symlink_metadata() else {
                continue;
            };
            if metadata.is_dir() {
                if recursive {
                    pending.push(path);
                }
            } else if path.is_file() {
                if let Ok(rel) = path.strip_prefix(dir) {
                    files.push(rel.to_path_buf());
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Direct children of `dir`
fn entries_in(dir: &Path) -> Result<Vec<PathBuf>, ToolError> {
    let pattern = format!("{}/*", glob::Pattern::escape(&dir.to_string_lossy()));
    let entries = glob::glob(&pattern).map_err(|e| ToolError::InvalidInput {
        message: format!("bad directory pattern: {}", e),
    })?;

    Ok(entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .collect())
}
