//! Writing the generated code to disk and running it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::core::artifact::{ArtifactKind, artifact_file_name};
use crate::core::types::ExecutionReport;
use crate::io::config::InterpreterConfig;
use crate::io::process::{RunLimits, run_shell_in};

/// Where artifacts are written and how they are run.
#[derive(Debug, Clone)]
pub struct ArtifactRunner {
    /// Directory artifacts are written to and run from.
    pub workdir: PathBuf,
    pub interpreters: InterpreterConfig,
    pub limits: RunLimits,
}

/// An artifact file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    pub kind: ArtifactKind,
    pub file_name: String,
    /// Absolute path when it can be resolved, else `workdir/file_name`.
    pub path: PathBuf,
}

impl ArtifactRunner {
    /// Create or overwrite the artifact for `task` with `code`.
    #[instrument(skip_all, fields(workdir = %self.workdir.display()))]
    pub fn write(&self, code: &str, task: &str) -> Result<WrittenArtifact> {
        let kind = ArtifactKind::detect(code);
        let file_name = artifact_file_name(task, kind);
        let path = self.workdir.join(&file_name);
        fs::write(&path, code).with_context(|| format!("write artifact {}", path.display()))?;
        let path = absolute(&path);
        info!(path = %path.display(), ?kind, "artifact written");
        Ok(WrittenArtifact {
            kind,
            file_name,
            path,
        })
    }

    /// Shell command line that runs `artifact`.
    pub fn command_line(&self, artifact: &WrittenArtifact) -> String {
        let interpreter = match artifact.kind {
            ArtifactKind::Python => &self.interpreters.python,
            ArtifactKind::Shell => &self.interpreters.shell,
        };
        format!("{interpreter} {}", artifact.file_name)
    }

    /// Run a previously written artifact from the working directory.
    #[instrument(skip_all, fields(file = %artifact.file_name))]
    pub fn run(&self, artifact: &WrittenArtifact) -> ExecutionReport {
        let command = self.command_line(artifact);
        debug!(%command, "running artifact");
        let outcome = run_shell_in(&command, Some(&self.workdir), &self.limits);
        debug!(success = outcome.success, "artifact finished");
        ExecutionReport {
            stdout: outcome.stdout,
            stderr: outcome.stderr,
            success: outcome.success,
            file_name: artifact.file_name.clone(),
            path: artifact.path.clone(),
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
