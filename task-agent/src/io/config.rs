//! Agent configuration stored in `task-agent.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::io::process::RunLimits;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "task-agent.toml";

/// Agent configuration (TOML).
///
/// Every field is optional in the file. Missing fields take the defaults, which
/// reproduce the plain interactive behaviour: `ollama run deepseek-coder:6.7b`,
/// no timeouts, unbounded retries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Kill executed commands after this many seconds. Unset waits forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,

    /// Keep at most this many bytes of stdout and of stderr per command.
    pub output_limit_bytes: usize,

    /// Pause after a failed attempt before planning again.
    pub retry_pause_ms: u64,

    /// Stop after this many planning rounds. Unset means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,

    pub model: ModelConfig,

    pub interpreters: InterpreterConfig,
}

/// How the prompt reaches the model command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PromptPassing {
    /// Spawn the command directly with the prompt as its own argument.
    #[default]
    Argv,
    /// Build one command line with the prompt interpolated between double
    /// quotes and hand it to the shell. Quotes or metacharacters in the prompt
    /// change the command.
    Shell,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    /// Program and leading arguments; the model name and prompt follow.
    pub command: Vec<String>,
    /// Model identifier passed after `command`.
    pub name: String,
    pub prompt_passing: PromptPassing,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            command: vec!["ollama".to_string(), "run".to_string()],
            name: "deepseek-coder:6.7b".to_string(),
            prompt_passing: PromptPassing::Argv,
        }
    }
}

/// Interpreters used to run artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InterpreterConfig {
    pub python: String,
    pub shell: String,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            shell: "bash".to_string(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: None,
            output_limit_bytes: 1_000_000,
            retry_pause_ms: 1_000,
            max_iterations: None,
            model: ModelConfig::default(),
            interpreters: InterpreterConfig::default(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout_secs == Some(0) {
            return Err(anyhow!("command_timeout_secs must be > 0 when set"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.max_iterations == Some(0) {
            return Err(anyhow!("max_iterations must be > 0 when set"));
        }
        if self.model.command.is_empty() || self.model.command[0].trim().is_empty() {
            return Err(anyhow!("model.command must be a non-empty array"));
        }
        if self.model.name.trim().is_empty() {
            return Err(anyhow!("model.name must not be empty"));
        }
        if self.interpreters.python.trim().is_empty() {
            return Err(anyhow!("interpreters.python must not be empty"));
        }
        if self.interpreters.shell.trim().is_empty() {
            return Err(anyhow!("interpreters.shell must not be empty"));
        }
        Ok(())
    }

    pub fn run_limits(&self) -> RunLimits {
        RunLimits {
            timeout: self.command_timeout_secs.map(Duration::from_secs),
            output_limit_bytes: self.output_limit_bytes,
        }
    }

    pub fn retry_pause(&self) -> Duration {
        Duration::from_millis(self.retry_pause_ms)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `AgentConfig::default()`.
pub fn load_config(path: &Path) -> Result<AgentConfig> {
    if !path.exists() {
        let cfg = AgentConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: AgentConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &AgentConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
