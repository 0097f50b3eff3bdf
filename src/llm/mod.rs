//! Model layer - conversation types, the model client seam, and tool parsing
//!
//! This module provides:
//! - Message types for the conversation history
//! - ModelClient trait for API abstraction
//! - OpenAiClient implementation and a scripted MockModelClient
//! - Tool invocation parsing from free-text responses

pub mod client;
pub mod openai;
pub mod tool_parser;
pub mod types;

pub use client::{MockModelClient, ModelClient, ModelError};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use tool_parser::parse_invocation;
pub use types::{Message, Parameters, Role, ToolInvocation};
