//! Model client abstraction for text generation.
//!
//! The [`ModelClient`] trait decouples planning from the actual model backend
//! (by default `ollama run <model> <prompt>`). Tests use scripted clients that
//! return predetermined responses without spawning processes.

use std::process::Command;

use tracing::{debug, info, instrument, warn};

use crate::io::config::{ModelConfig, PromptPassing};
use crate::io::process::{RunLimits, run_command, shell_command};

/// Prefix of the response when the model command exits nonzero.
pub const ERROR_MARKER: &str = "Error: ";
/// Prefix of the response when the model command cannot be launched.
pub const EXCEPTION_MARKER: &str = "Exception occurred: ";

/// Abstraction over text-generation backends.
pub trait ModelClient {
    /// Send `prompt` and return the raw response text.
    ///
    /// Failures are folded into the returned text, prefixed with
    /// [`ERROR_MARKER`] or [`EXCEPTION_MARKER`].
    fn query(&self, prompt: &str) -> String;
}

/// Client that runs a local model through its command-line tool.
pub struct CommandModelClient {
    config: ModelConfig,
    limits: RunLimits,
}

impl CommandModelClient {
    pub fn new(config: ModelConfig, limits: RunLimits) -> Self {
        Self { config, limits }
    }

    /// Command line used in [`PromptPassing::Shell`] mode. The prompt is not
    /// escaped.
    pub fn shell_line(&self, prompt: &str) -> String {
        format!(
            "{} {} \"{}\"",
            self.config.command.join(" "),
            self.config.name,
            prompt
        )
    }

    fn query_argv(&self, prompt: &str) -> String {
        let (program, args) = match self.config.command.split_first() {
            Some(split) => split,
            None => return format!("{EXCEPTION_MARKER}model command is empty"),
        };
        let mut cmd = Command::new(program);
        cmd.args(args).arg(&self.config.name).arg(prompt);
        self.run_model(cmd)
    }

    fn query_shell(&self, prompt: &str) -> String {
        self.run_model(shell_command(&self.shell_line(prompt)))
    }

    /// Run the model command, folding failures into marked response text.
    fn run_model(&self, cmd: Command) -> String {
        match run_command(cmd, &self.limits) {
            Ok(output) if output.success() => output.stdout_text(),
            Ok(output) => {
                warn!(exit_code = ?output.status.code(), "model command failed");
                format!("{ERROR_MARKER}{}", output.stderr_text())
            }
            Err(err) => {
                warn!(err = %err, "model command could not be launched");
                format!("{EXCEPTION_MARKER}{err:#}")
            }
        }
    }
}

impl ModelClient for CommandModelClient {
    #[instrument(skip_all, fields(model = %self.config.name, passing = ?self.config.prompt_passing, prompt_len = prompt.len()))]
    fn query(&self, prompt: &str) -> String {
        info!("querying model");
        let response = match self.config.prompt_passing {
            PromptPassing::Argv => self.query_argv(prompt),
            PromptPassing::Shell => self.query_shell(prompt),
        };
        debug!(response_len = response.len(), "model responded");
        response
    }
}
