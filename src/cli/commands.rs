//! CLI definition using clap.

use clap::Parser;
use std::path::PathBuf;

/// codeagent - a single-agent coding loop driven by a language model
#[derive(Parser, Debug)]
#[command(name = "codeagent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory tools operate in (defaults to the current directory)
    #[arg(short, long)]
    pub workdir: Option<PathBuf>,

    /// Command denylist file (JSON with common/windows/linux lists)
    #[arg(short, long)]
    pub policy: Option<PathBuf>,

    /// Model name, overriding the config file
    #[arg(short, long)]
    pub model: Option<String>,

    /// Task for the agent; prompted for when omitted
    pub task: Option<String>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Task text, if given and not blank
    pub fn task(&self) -> Option<&str> {
        self.task.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}
