//! Agent loop - drives model turns and tool dispatch until `complete`
//!
//! This module provides:
//! - AgentLoop, the explicit Running / AwaitingInput / Terminated state machine
//! - LoopOutcome for a finished run

mod agent_loop;

pub use agent_loop::{AgentLoop, AgentLoopConfig, LoopOutcome, LoopState};
