//! codeagent - a single-agent tool loop
//!
//! A language model answers in free text; each response carries one XML tool
//! call which is parsed, vetted, executed locally, and fed back as a user
//! message until the model calls `complete`.

pub mod audit;
pub mod config;
pub mod error;
pub mod interaction;
pub mod llm;
pub mod prompt;
pub mod runner;
pub mod safety;
pub mod tools;

pub use error::{AgentError, Result};
