//! Test-only helpers: scripted model and console, and scratch workspaces.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::io::artifact::ArtifactRunner;
use crate::io::config::{AgentConfig, InterpreterConfig, ModelConfig, write_config};
use crate::io::console::Console;
use crate::io::model::ModelClient;
use crate::io::process::RunLimits;

/// Model client that replays canned responses in order and records prompts.
///
/// Once the script is exhausted it answers with an empty string, or with the
/// repeating response when built by [`ScriptedModel::repeating`].
pub struct ScriptedModel {
    responses: RefCell<VecDeque<String>>,
    repeat: Option<String>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedModel {
    pub fn new<S: Into<String>>(responses: Vec<S>) -> Self {
        Self {
            responses: RefCell::new(responses.into_iter().map(Into::into).collect()),
            repeat: None,
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn repeating(response: impl Into<String>) -> Self {
        Self {
            repeat: Some(response.into()),
            ..Self::new(Vec::<String>::new())
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl ModelClient for ScriptedModel {
    fn query(&self, prompt: &str) -> String {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .or_else(|| self.repeat.clone())
            .unwrap_or_default()
    }
}

/// Console that answers prompts from a script and records everything shown.
///
/// `ask` returns `None` once the script runs out, like a closed stdin.
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<S: Into<String>>(answers: Vec<S>) -> Self {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// Everything said and asked, one entry per line, joined with newlines.
    pub fn transcript(&self) -> String {
        self.transcript.join("\n")
    }

    /// Answers not consumed by the session.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Console for ScriptedConsole {
    fn say(&mut self, text: &str) -> Result<()> {
        self.transcript.push(text.to_string());
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        self.transcript.push(prompt.to_string());
        Ok(self.answers.pop_front())
    }
}

/// Artifact runner that executes both kinds with `sh`, so tests do not
/// depend on a Python install.
pub fn shell_artifact_runner(workdir: &Path) -> ArtifactRunner {
    ArtifactRunner {
        workdir: workdir.to_path_buf(),
        interpreters: InterpreterConfig {
            python: "sh".to_string(),
            shell: "sh".to_string(),
        },
        limits: RunLimits::default(),
    }
}

/// Scratch directory with a fake model command and a config pointing at it.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create tempdir")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("task-agent.toml")
    }

    /// Write a fake model script answering plan prompts with `plan` and code
    /// prompts with `code`, plus a config that uses it with no retry pause.
    ///
    /// Every prompt is appended to `prompts.log` in the workspace.
    pub fn install_fake_model(&self, plan: &str, code: &str) -> Result<()> {
        let script_path = self.path().join("fake-model.sh");
        let plan_path = self.path().join("plan.txt");
        let code_path = self.path().join("code.txt");
        fs::write(&plan_path, plan).context("write plan response")?;
        fs::write(&code_path, code).context("write code response")?;

        // $1 is the model name, $2 the prompt.
        let script = format!(
            "#!/bin/sh\nprintf '%s\\n---\\n' \"$2\" >> '{log}'\ncase \"$2\" in\n  Generate*) cat '{plan}' ;;\n  *) cat '{code}' ;;\nesac\n",
            log = self.path().join("prompts.log").display(),
            plan = plan_path.display(),
            code = code_path.display(),
        );
        fs::write(&script_path, script).context("write fake model")?;

        let config = AgentConfig {
            retry_pause_ms: 0,
            model: ModelConfig {
                command: vec!["sh".to_string(), script_path.display().to_string()],
                name: "fake".to_string(),
                ..ModelConfig::default()
            },
            interpreters: InterpreterConfig {
                python: "sh".to_string(),
                shell: "sh".to_string(),
            },
            ..AgentConfig::default()
        };
        write_config(&self.config_path(), &config)
    }

    /// Prompts seen by the fake model, in order.
    pub fn logged_prompts(&self) -> Result<Vec<String>> {
        let log_path = self.path().join("prompts.log");
        if !log_path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&log_path).context("read prompts.log")?;
        Ok(raw
            .split("\n---\n")
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect())
    }
}
