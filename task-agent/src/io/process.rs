//! Child process execution with captured, bounded output.

use std::io::Read;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Limits applied to every spawned command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    /// `None` waits for the child indefinitely.
    pub timeout: Option<Duration>,
    /// Bytes of stdout/stderr kept in memory per stream.
    pub output_limit_bytes: usize,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            timeout: None,
            output_limit_bytes: 1_000_000,
        }
    }
}

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    /// Stdout as text, with a notice appended when bytes were dropped.
    pub fn stdout_text(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stdout).into_owned();
        if self.stdout_truncated > 0 {
            text.push_str(&format!(
                "\n[stdout truncated {} bytes]\n",
                self.stdout_truncated
            ));
        }
        text
    }

    /// Stderr as text, with truncation and timeout notices appended.
    pub fn stderr_text(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stderr).into_owned();
        if self.stderr_truncated > 0 {
            text.push_str(&format!(
                "\n[stderr truncated {} bytes]\n",
                self.stderr_truncated
            ));
        }
        if self.timed_out {
            text.push_str("\n[command timed out]\n");
        }
        text
    }

    pub fn success(&self) -> bool {
        !self.timed_out && self.status.success()
    }
}

/// Outcome of a shell command: captured text plus a success flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutcome {
    pub stdout: String,
    pub stderr: String,
    /// True iff the command ran to completion with exit code zero.
    pub success: bool,
}

/// Run `command` through the platform shell.
///
/// Never fails: a command that cannot be launched yields `success = false`
/// with the launch error in `stderr`.
#[instrument(skip_all, fields(command = %command))]
pub fn run_shell(command: &str, limits: &RunLimits) -> ShellOutcome {
    run_shell_in(command, None, limits)
}

/// Like [`run_shell`], with an explicit working directory.
pub fn run_shell_in(
    command: &str,
    workdir: Option<&std::path::Path>,
    limits: &RunLimits,
) -> ShellOutcome {
    let mut cmd = shell_command(command);
    if let Some(dir) = workdir {
        cmd.current_dir(dir);
    }
    match run_command(cmd, limits) {
        Ok(output) => ShellOutcome {
            stdout: output.stdout_text(),
            stderr: output.stderr_text(),
            success: output.success(),
        },
        Err(err) => ShellOutcome {
            stdout: String::new(),
            stderr: format!("{err:#}"),
            success: false,
        },
    }
}

/// `command` wrapped for the platform shell (`sh -c` or `cmd /C`).
#[cfg(unix)]
pub fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
pub fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Run a command and capture stdout/stderr without risking pipe deadlocks.
///
/// Output is read concurrently while the child runs. `limits.output_limit_bytes`
/// bounds the amount of stdout/stderr stored in memory (bytes beyond this are
/// discarded while still draining the pipe). With a timeout set, the child
/// runs in its own process group and a child that outlives the timeout is
/// killed together with everything it started, then reported as timed out.
#[instrument(skip_all, fields(timeout_secs = limits.timeout.map(|t| t.as_secs()), output_limit_bytes = limits.output_limit_bytes))]
pub fn run_command(mut cmd: Command, limits: &RunLimits) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    // Grandchildren hold the output pipes open; only a group kill closes them.
    #[cfg(unix)]
    {
        if limits.timeout.is_some() {
            cmd.process_group(0);
        }
    }

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let limit = limits.output_limit_bytes;
    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, limit));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, limit));

    let mut timed_out = false;
    let status = match limits.timeout {
        None => child.wait().context("wait for command")?,
        Some(timeout) => match child.wait_timeout(timeout).context("wait for command")? {
            Some(status) => status,
            None => {
                warn!(
                    timeout_secs = timeout.as_secs(),
                    "command timed out, killing"
                );
                timed_out = true;
                kill_process_tree(&mut child)?;
                child.wait().context("wait command after kill")?
            }
        },
    };

    let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
    let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

#[cfg(unix)]
fn kill_process_tree(child: &mut Child) -> Result<()> {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let pgid = i32::try_from(child.id()).context("child pid out of range")?;
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) => Ok(()),
        Err(errno) => {
            warn!(%errno, "process group kill failed, killing child only");
            child.kill().context("kill command")
        }
    }
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) -> Result<()> {
    child.kill().context("kill command")
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn zero_exit_is_success() {
        let out = run_shell("true", &RunLimits::default());
        assert!(out.success);
        assert!(out.stderr.is_empty());
    }

    #[test]
    fn nonzero_exit_is_failure() {
        assert!(!run_shell("false", &RunLimits::default()).success);
        assert!(!run_shell("exit 7", &RunLimits::default()).success);
    }

    #[test]
    fn captures_both_streams() {
        let out = run_shell("echo out; echo err 1>&2", &RunLimits::default());
        assert!(out.success);
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
    }

    #[test]
    fn missing_executable_fails_through_the_shell() {
        let out = run_shell("definitely-not-a-real-binary-xyz", &RunLimits::default());
        assert!(!out.success);
        assert!(!out.stderr.is_empty());
    }

    #[test]
    fn launch_failure_is_reported_in_stderr() {
        let cmd = Command::new("/nonexistent/path/to/binary");
        let err = run_command(cmd, &RunLimits::default()).unwrap_err();
        assert!(format!("{err:#}").contains("spawn command"));
    }

    #[test]
    fn output_beyond_limit_is_truncated() {
        let limits = RunLimits {
            timeout: None,
            output_limit_bytes: 4,
        };
        let out = run_shell("printf abcdefgh", &limits);
        assert!(out.success);
        assert!(out.stdout.starts_with("abcd"));
        assert!(out.stdout.contains("[stdout truncated 4 bytes]"));
    }

    #[test]
    fn timeout_kills_and_fails() {
        let limits = RunLimits {
            timeout: Some(Duration::from_millis(200)),
            output_limit_bytes: 1000,
        };
        let out = run_shell("exec sleep 5", &limits);
        assert!(!out.success);
        assert!(out.stderr.contains("timed out"));
    }

    #[test]
    fn timeout_also_kills_grandchildren() {
        let limits = RunLimits {
            timeout: Some(Duration::from_millis(200)),
            output_limit_bytes: 1000,
        };
        let started = std::time::Instant::now();
        let out = run_shell("echo started; sleep 5; true", &limits);

        assert!(!out.success);
        assert!(out.stderr.contains("timed out"));
        assert_eq!(out.stdout, "started\n");
        assert!(
            started.elapsed() < Duration::from_secs(3),
            "returned after {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn workdir_is_honoured() {
        let temp = tempfile::tempdir().expect("tempdir");
        let out = run_shell_in("pwd", Some(temp.path()), &RunLimits::default());
        let reported = std::path::PathBuf::from(out.stdout.trim());
        assert_eq!(
            reported.canonicalize().expect("canonical pwd"),
            temp.path().canonicalize().expect("canonical temp")
        );
    }
}
