//! ask_question - put a question to the operator

use super::ToolResult;
use crate::interaction::InputRequest;
use crate::llm::Parameters;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskQuestion {
    pub question: String,
}

impl AskQuestion {
    pub fn from_parameters(params: &Parameters) -> Self {
        Self {
            question: params.get("question").cloned().unwrap_or_default(),
        }
    }

    pub fn input_request(&self) -> InputRequest {
        InputRequest::Question {
            question: self.question.clone(),
        }
    }

    pub fn answer(&self, answer: &str) -> ToolResult {
        ToolResult::success(format!("User answered: {}", answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_question() {
        let mut params = Parameters::new();
        params.insert("question".to_string(), "Which port?".to_string());
        let tool = AskQuestion::from_parameters(&params);

        assert_eq!(
            tool.input_request(),
            InputRequest::Question {
                question: "Which port?".to_string()
            }
        );
    }

    #[test]
    fn test_answer_message() {
        let tool = AskQuestion::from_parameters(&Parameters::new());
        assert_eq!(tool.question, "");
        let result = tool.answer("8080");
        assert!(result.success);
        assert_eq!(result.message, "User answered: 8080");
    }
}
