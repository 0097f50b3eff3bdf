//! write_file - create or overwrite a file

use super::ToolResult;
use super::context::{ToolContext, ToolError};
use crate::llm::Parameters;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFile {
    pub path: String,
    pub content: String,
}

impl WriteFile {
    pub fn from_parameters(params: &Parameters) -> Self {
        Self {
            path: params.get("path").cloned().unwrap_or_default(),
            content: params.get("content").cloned().unwrap_or_default(),
        }
    }

    pub async fn execute(&self, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        if self.path.trim().is_empty() {
            return Err(ToolError::InvalidInput {
                message: "write_file requires a path".to_string(),
            });
        }

        let full_path = ctx.resolve_path(&self.path);

        // Create parent directories if needed
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::io("create directories", &self.path, e))?;
        }

        tokio::fs::write(&full_path, &self.content)
            .await
            .map_err(|e| ToolError::io("write file", &self.path, e))?;

        log::info!("Wrote {} bytes to {}", self.content.len(), full_path.display());
        Ok(ToolResult::success(format!(
            "Wrote {} bytes to '{}'",
            self.content.len(),
            self.path
        )))
    }
}
