//! CLI module for codeagent - command-line interface.
//!
//! A single command: run one task through the agent loop.

pub mod commands;

pub use commands::Cli;
