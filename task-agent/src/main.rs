//! Interactive task agent.
//!
//! Asks a local model for a plan and code, shows both, runs the code after
//! approval and retries with the user's feedback until the task is done.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;

use task_agent::exit_codes;
use task_agent::io::artifact::ArtifactRunner;
use task_agent::io::config::{AgentConfig, DEFAULT_CONFIG_FILE, load_config, write_config};
use task_agent::io::console::StdConsole;
use task_agent::io::model::CommandModelClient;
use task_agent::logging;
use task_agent::session::{SessionConfig, run_session};

#[derive(Parser)]
#[command(
    name = "task-agent",
    version,
    about = "Plan, approve and run model-generated code for a task"
)]
struct Cli {
    /// Config file; defaults apply when it does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Model name, overriding `model.name` from the config.
    #[arg(long)]
    model: Option<String>,

    /// Directory artifacts are written to and run from.
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Task to work on; skips the task prompt.
    #[arg(long)]
    task: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default config file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Some(Command::InitConfig { force }) => cmd_init_config(&cli.config, force),
        None => cmd_session(&cli),
    }
}

fn cmd_init_config(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    write_config(path, &AgentConfig::default())?;
    println!("{}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_session(cli: &Cli) -> Result<i32> {
    let cfg = resolve_config(cli)?;
    let workdir = match &cli.workdir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("resolve current directory")?,
    };
    if !workdir.is_dir() {
        bail!("workdir {} is not a directory", workdir.display());
    }
    debug!(workdir = %workdir.display(), model = %cfg.model.name, "starting session");

    let model = CommandModelClient::new(cfg.model.clone(), cfg.run_limits());
    let artifacts = ArtifactRunner {
        workdir,
        interpreters: cfg.interpreters.clone(),
        limits: cfg.run_limits(),
    };
    let session_config = SessionConfig {
        retry_pause: cfg.retry_pause(),
        max_iterations: cfg.max_iterations,
        initial_task: cli.task.clone(),
    };

    let mut console = StdConsole::stdio();
    run_session(&model, &mut console, &artifacts, &session_config)?;
    Ok(exit_codes::OK)
}

/// Config file values with command-line overrides applied.
fn resolve_config(cli: &Cli) -> Result<AgentConfig> {
    let mut cfg = load_config(&cli.config)?;
    if let Some(model) = &cli.model {
        cfg.model.name = model.clone();
    }
    cfg.validate().context("invalid command-line overrides")?;
    Ok(cfg)
}
