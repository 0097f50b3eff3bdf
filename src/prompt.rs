//! System prompt and the user-message shapes fed back to the model

use std::fs;
use std::path::Path;

use crate::error::{AgentError, Result};
use crate::tools::ToolName;

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a coding agent. Complete the task using the following tools:

# ListFile
List the files in a directory.
<list_file>
<path>directory path</path>
<recursive>true or false</recursive>
</list_file>

# ReadFile
Read the contents of a file.
<read_file>
<path>file path</path>
</read_file>

# WriteFile
Write content to a file.
<write_file>
<path>file path</path>
<content>
content to write
</content>
</write_file>

# AskQuestion
Ask the user a question.
<ask_question>
<question>the question</question>
</ask_question>

# ExecuteCommand
Run a shell command.
<execute_command>
<command>the command to run</command>
<requires_approval>true or false</requires_approval>
</execute_command>

# Complete
Signal that the task is finished.
<complete>
<result>description of the result or deliverables</result>
</complete>

Important rules:
1. Every response must use exactly one of the tools above.
2. Never answer directly without a tool.
3. Do not print code in your reply; create files with WriteFile instead.
4. When the task is done, finish explicitly with Complete.
5. If the task is unclear or complex, ask for details with AskQuestion first.
6. Parameter values are XML text: write `&` as `&amp;` and `<` as `&lt;`, or wrap the value in <![CDATA[ ... ]]>.

Example: to build a calculator, write calculator.py with WriteFile, run its tests with ExecuteCommand if needed, and finish with Complete.

Example response:
<write_file>
<path>example.py</path>
<content>
print("Hello World")
</content>
</write_file>
"#;

/// Read the prompt from `path`, creating it with the default text when missing
pub fn load_system_prompt(path: Option<&Path>) -> Result<String> {
    let Some(path) = path else {
        return Ok(DEFAULT_SYSTEM_PROMPT.to_string());
    };

    if !path.exists() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_SYSTEM_PROMPT)?;
        log::info!("Created default system prompt at {}", path.display());
        return Ok(DEFAULT_SYSTEM_PROMPT.to_string());
    }

    let prompt = fs::read_to_string(path)?;
    if prompt.trim().is_empty() {
        return Err(AgentError::Config(format!("system prompt file {} is empty", path.display())));
    }
    log::info!("Loaded system prompt from {}", path.display());
    Ok(prompt)
}

/// Fed back when a response contains no usable tool block
pub fn corrective_instruction() -> String {
    format!(
        "[Error] Error: no valid tool found. Use one of the following tools: {}. Respond in the proper XML format.",
        ToolName::list()
    )
}

/// Fed back after a dispatched tool
pub fn format_tool_result(tool_name: &str, message: &str) -> String {
    format!("[{} Result] {}", tool_name, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_prompt_documents_every_tool() {
        for tool in ToolName::ALL {
            assert!(
                DEFAULT_SYSTEM_PROMPT.contains(&format!("<{}>", tool.as_str())),
                "missing {}",
                tool
            );
        }
    }

    #[test]
    fn test_corrective_instruction_lists_tools() {
        assert_eq!(
            corrective_instruction(),
            "[Error] Error: no valid tool found. Use one of the following tools: list_file, read_file, write_file, ask_question, execute_command, complete. Respond in the proper XML format."
        );
    }

    #[test]
    fn test_format_tool_result() {
        assert_eq!(format_tool_result("read_file", "hello"), "[read_file Result] hello");
    }

    #[test]
    fn test_load_without_path_uses_default() {
        assert_eq!(load_system_prompt(None).unwrap(), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_load_creates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prompts").join("system_prompt.txt");

        let prompt = load_system_prompt(Some(&path)).unwrap();
        assert_eq!(prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_load_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("system_prompt.txt");
        fs::write(&path, "Be brief.").unwrap();
        assert_eq!(load_system_prompt(Some(&path)).unwrap(), "Be brief.");
    }

    #[test]
    fn test_load_empty_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("system_prompt.txt");
        fs::write(&path, "  \n").unwrap();
        assert!(matches!(load_system_prompt(Some(&path)), Err(AgentError::Config(_))));
    }
}
