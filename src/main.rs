use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use codeagent::audit::{self, AuditLog};
use codeagent::config::Config;
use codeagent::interaction::ConsoleInteraction;
use codeagent::llm::{OpenAiClient, OpenAiConfig};
use codeagent::prompt::load_system_prompt;
use codeagent::runner::AgentLoop;
use codeagent::safety::{CommandGate, CommandPolicy};
use codeagent::tools::{Dispatcher, ToolContext};

mod cli;

use cli::Cli;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("codeagent")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("codeagent.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Fold command-line overrides into the loaded config
fn apply_overrides(cli: &Cli, config: &mut Config) {
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    if let Some(workdir) = &cli.workdir {
        config.tools.workdir = Some(workdir.clone());
    }
    if let Some(policy) = &cli.policy {
        config.safety.policy_file = Some(policy.clone());
    }
}

fn load_env_file() {
    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("Failed to load .env: {}", e),
    }
}

type Agent = AgentLoop<OpenAiClient, ConsoleInteraction>;

/// How a stage raced against Ctrl-C ended
enum Raced<T> {
    Finished(T),
    Interrupted,
}

/// Drive `work` until it finishes or `interrupt` fires
async fn race_interrupt<T, W, S>(work: W, interrupt: S) -> Raced<T>
where
    W: Future<Output = T>,
    S: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(work);
    tokio::select! {
        out = &mut work => Raced::Finished(out),
        signal = interrupt => match signal {
            Ok(()) => Raced::Interrupted,
            Err(e) => {
                log::warn!("Failed to listen for Ctrl-C: {}", e);
                Raced::Finished(work.await)
            }
        },
    }
}

fn audit_log(config: &Config) -> AuditLog {
    if config.audit.enabled {
        AuditLog::new(&config.audit.dir)
    } else {
        AuditLog::disabled()
    }
}

fn report_failure(audit: &AuditLog, e: &eyre::Report) {
    log::error!("{:?}", e);
    eprintln!("\n{} {:#}", "Error:".red(), e);
    audit.record(audit::ERROR, json!({"stage": "setup", "error": format!("{:#}", e)}));
}

fn report_interrupt(audit: &AuditLog, turns: usize) {
    info!("Interrupted after {} turns", turns);
    println!("\n{}", "Interrupted by user.".yellow());
    audit.record(audit::INTERRUPTED, json!({"turns": turns}));
}

fn print_banner() {
    println!("{}", "Coding agent session ended.".cyan());
}

/// Build the agent and read the task; `None` when no task was given
async fn prepare_session(cli: &Cli, config: &Config, audit: &AuditLog) -> Result<Option<Agent>> {
    load_env_file();

    let workdir = match &config.tools.workdir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to resolve working directory")?,
    };

    let policy = CommandPolicy::load(config.safety.policy_path().as_deref());
    let gate = CommandGate::for_current_platform(policy);

    let system_prompt =
        load_system_prompt(config.prompt.system_prompt_file.as_deref()).context("Failed to load system prompt")?;

    let client = OpenAiClient::from_env(&config.llm.api_key_env, OpenAiConfig::from(&config.llm))
        .context("Failed to create model client")?;

    let interaction = Arc::new(ConsoleInteraction::new());

    let task = match cli.task() {
        Some(task) => task.to_string(),
        None => interaction
            .read_line("Enter a task for the coding agent:\n")
            .await
            .context("Failed to read task")?
            .trim()
            .to_string(),
    };
    if task.is_empty() {
        return Ok(None);
    }

    let ctx = ToolContext::new(workdir)
        .with_gate(gate)
        .with_command_timeout(config.tools.command_timeout())
        .with_max_output_chars(config.tools.max_output_chars);
    let dispatcher = Dispatcher::new(ctx, audit.clone());

    Ok(Some(AgentLoop::new(
        Arc::new(client),
        interaction,
        dispatcher,
        audit.clone(),
        system_prompt,
        task,
    )))
}

async fn run_application(cli: &Cli, config: &Config, audit: &AuditLog) -> Result<ExitCode> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let prepared = race_interrupt(prepare_session(cli, config, audit), tokio::signal::ctrl_c()).await;
    let mut agent = match prepared {
        Raced::Finished(Ok(Some(agent))) => agent,
        Raced::Finished(Ok(None)) => {
            println!("{}", "No task given.".yellow());
            return Ok(ExitCode::SUCCESS);
        }
        Raced::Finished(Err(e)) => return Err(e),
        Raced::Interrupted => {
            report_interrupt(audit, 0);
            return Ok(ExitCode::SUCCESS);
        }
    };

    println!("\n{}", "Initializing the coding agent...".cyan());
    println!("The agent uses tools to work through the task. This can take a while.\n");

    let result = race_interrupt(agent.run(), tokio::signal::ctrl_c()).await;

    match result {
        Raced::Finished(Ok(outcome)) => {
            info!("Run finished after {} turns", outcome.turns);
            println!("\n{} {}", "Done:".green(), outcome.summary);
            Ok(ExitCode::SUCCESS)
        }
        Raced::Finished(Err(e)) => {
            // the loop has already written the error entry
            log::error!("Run failed: {}", e);
            eprintln!("\n{} {}", "Error:".red(), e);
            Ok(ExitCode::FAILURE)
        }
        Raced::Interrupted => {
            report_interrupt(audit, agent.turns());
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(cli.config.as_ref()).context("Failed to load configuration") {
        Ok(mut config) => {
            apply_overrides(&cli, &mut config);
            config
        }
        Err(e) => {
            report_failure(&AuditLog::disabled(), &e);
            print_banner();
            return Ok(ExitCode::FAILURE);
        }
    };

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    let audit = audit_log(&config);
    let code = match run_application(&cli, &config, &audit).await {
        Ok(code) => code,
        Err(e) => {
            report_failure(&audit, &e);
            ExitCode::FAILURE
        }
    };

    print_banner();
    Ok(code)
}
