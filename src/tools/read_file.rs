//! read_file - whole file contents as text

use super::ToolResult;
use super::context::{ToolContext, ToolError};
use crate::llm::Parameters;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFile {
    pub path: String,
}

impl ReadFile {
    pub fn from_parameters(params: &Parameters) -> Self {
        Self {
            path: params.get("path").cloned().unwrap_or_default(),
        }
    }

    pub async fn execute(&self, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let full_path = ctx.resolve_path(&self.path);
        let content = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|e| ToolError::io("read file", &self.path, e))?;

        if content.is_empty() {
            return Ok(ToolResult::success(format!("File '{}' is empty.", self.path)));
        }
        Ok(ToolResult::success(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolErrorKind;
    use std::fs;
    use tempfile::TempDir;

    fn read(path: &str) -> ReadFile {
        ReadFile { path: path.to_string() }
    }

    #[tokio::test]
    async fn test_read_contents() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("test.txt"), "line 1\nline 2\n").unwrap();
        let ctx = ToolContext::new(temp_dir.path().to_path_buf());

        let result = read("test.txt").execute(&ctx).await.unwrap();
        assert!(result.success);
        assert_eq!(result.message, "line 1\nline 2\n");
    }

    #[tokio::test]
    async fn test_read_absolute_path() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("abs.txt");
        fs::write(&file, "absolute").unwrap();
        let ctx = ToolContext::new(std::env::temp_dir());

        let result = read(&file.to_string_lossy()).execute(&ctx).await.unwrap();
        assert_eq!(result.message, "absolute");
    }

    #[tokio::test]
    async fn test_read_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("empty.txt"), "").unwrap();
        let ctx = ToolContext::new(temp_dir.path().to_path_buf());

        let result = read("empty.txt").execute(&ctx).await.unwrap();
        assert!(result.success);
        assert_eq!(result.message, "File 'empty.txt' is empty.");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(temp_dir.path().to_path_buf());

        let err = read("nonexistent.txt").execute(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::NotFound);
        assert!(err.to_string().contains("nonexistent.txt"));
    }

    #[tokio::test]
    async fn test_read_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("dir")).unwrap();
        let ctx = ToolContext::new(temp_dir.path().to_path_buf());

        assert!(read("dir").execute(&ctx).await.is_err());
    }
}
