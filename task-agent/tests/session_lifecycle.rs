//! Session-level tests for the approve → execute → feedback → retry loop.
//!
//! These drive `run_session` with a scripted model and console, and run the
//! generated artifacts for real with `sh` in a scratch directory.

#![cfg(unix)]

use std::fs;
use std::time::Duration;

use task_agent::core::types::SessionState;
use task_agent::session::{SessionConfig, run_session};
use task_agent::test_support::{ScriptedConsole, ScriptedModel, shell_artifact_runner};

fn fast() -> SessionConfig {
    SessionConfig {
        retry_pause: Duration::ZERO,
        ..SessionConfig::default()
    }
}

/// Approve on the first attempt, script succeeds, user confirms.
#[test]
fn approved_first_attempt_finishes_in_one_iteration() {
    let temp = tempfile::tempdir().expect("tempdir");
    let model = ScriptedModel::new(vec![
        "Here is the plan:\n1. Print a greeting\n   echo hello",
        "```bash\necho hello\n```",
    ]);
    let mut console = ScriptedConsole::new(vec!["Say hello", "yes", "y"]);

    let outcome = run_session(
        &model,
        &mut console,
        &shell_artifact_runner(temp.path()),
        &fast(),
    )
    .expect("session");

    assert_eq!(outcome.state, SessionState::Done);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.executions, 1);
    assert_eq!(console.remaining(), 0);

    let transcript = console.transcript();
    assert!(transcript.contains("1. Print a greeting\n   echo hello"));
    assert!(transcript.contains("Output:\nhello\n"));
    assert!(transcript.contains("🎉 Great! Task completed successfully."));

    let artifact = outcome.last_artifact.expect("artifact path");
    assert!(artifact.ends_with("say_hello.sh"));
    assert_eq!(
        fs::read_to_string(temp.path().join("say_hello.sh")).expect("read artifact"),
        "echo hello"
    );
}

/// Decline approval and decline feedback: nothing runs.
#[test]
fn declined_without_feedback_cancels_immediately() {
    let temp = tempfile::tempdir().expect("tempdir");
    let model = ScriptedModel::new(vec!["1. Remove everything", "rm -rf ./*"]);
    let mut console = ScriptedConsole::new(vec!["Clean up", "no", "no"]);

    let outcome = run_session(
        &model,
        &mut console,
        &shell_artifact_runner(temp.path()),
        &fast(),
    )
    .expect("session");

    assert_eq!(outcome.state, SessionState::Cancelled);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.executions, 0);
    assert!(outcome.last_artifact.is_none());
    assert_eq!(model.prompts().len(), 2);
    assert_eq!(
        fs::read_dir(temp.path()).expect("read dir").count(),
        0,
        "no artifact may be written"
    );
    assert!(console.transcript().ends_with("(yes/no): "));
}

/// Decline approval but give feedback: the whole plan is regenerated.
#[test]
fn declined_with_feedback_regenerates_plan() {
    let temp = tempfile::tempdir().expect("tempdir");
    let model = ScriptedModel::new(vec![
        "1. Delete the folder",
        "rm -rf out",
        "1. Create the folder",
        "```sh\nmkdir out\n```",
    ]);
    let mut console = ScriptedConsole::new(vec![
        "Make out dir",
        "n",
        "y",
        "create it, do not delete it",
        "y",
        "y",
    ]);

    let outcome = run_session(
        &model,
        &mut console,
        &shell_artifact_runner(temp.path()),
        &fast(),
    )
    .expect("session");

    assert_eq!(outcome.state, SessionState::Done);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.executions, 1);
    assert!(temp.path().join("out").is_dir());
    assert!(console.transcript().contains("❌ Execution cancelled."));

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 4);
    assert!(prompts[2].contains("Previous attempt feedback: create it, do not delete it"));
    assert!(prompts[3].contains("Previous attempt feedback: create it, do not delete it"));
}

/// Process-level success but the user reports failure: feedback goes into
/// the next planning round, after the original task.
#[test]
fn reported_failure_feeds_back_into_next_plan() {
    let temp = tempfile::tempdir().expect("tempdir");
    let model = ScriptedModel::new(vec![
        "1. List files",
        "```bash\nls\n```",
        "1. List all files\n2. Include hidden ones",
        "```bash\nls -a\n```",
    ]);
    let mut console = ScriptedConsole::new(vec![
        "List files",
        "y",
        "no",
        "hidden files are missing",
        "y",
        "yes",
    ]);

    let outcome = run_session(
        &model,
        &mut console,
        &shell_artifact_runner(temp.path()),
        &fast(),
    )
    .expect("session");

    assert_eq!(outcome.state, SessionState::Done);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.executions, 2);

    let prompts = model.prompts();
    assert!(!prompts[0].contains("Previous attempt feedback"));
    let retry_plan = &prompts[2];
    let task_at = retry_plan.find("Task: List files").expect("task in retry");
    let feedback_at = retry_plan
        .find("Previous attempt feedback: hidden files are missing")
        .expect("feedback in retry");
    assert!(task_at < feedback_at);

    let transcript = console.transcript();
    assert!(transcript.contains("❌ Task was not successful."));
    assert!(transcript.contains("🔄 I'll refine the solution based on your feedback..."));
    // The artifact keeps the original task's name across retries. `ls` has
    // no shell token, so it is typed as Python.
    assert!(
        outcome
            .last_artifact
            .expect("artifact")
            .ends_with("list_files.py")
    );
}

/// A failing script shows its stderr and leaves the decision to the user.
#[test]
fn failing_script_output_is_shown() {
    let temp = tempfile::tempdir().expect("tempdir");
    let model = ScriptedModel::new(vec!["1. Fail", "```bash\necho broken >&2\nexit 3\n```"]);
    let mut console = ScriptedConsole::new(vec!["Fail loudly", "y", "y"]);

    let outcome = run_session(
        &model,
        &mut console,
        &shell_artifact_runner(temp.path()),
        &fast(),
    )
    .expect("session");

    assert_eq!(outcome.state, SessionState::Done);
    let transcript = console.transcript();
    assert!(transcript.contains("Errors:\nbroken\n"));
    assert!(!transcript.contains("Output:"));
}

/// No code in the response: an empty artifact is still written and run.
#[test]
fn empty_extraction_still_executes_empty_artifact() {
    let temp = tempfile::tempdir().expect("tempdir");
    let model = ScriptedModel::new(vec!["I am not sure.", "Sorry, I cannot help."]);
    let mut console = ScriptedConsole::new(vec!["Do magic", "y", "y"]);

    let outcome = run_session(
        &model,
        &mut console,
        &shell_artifact_runner(temp.path()),
        &fast(),
    )
    .expect("session");

    assert_eq!(outcome.state, SessionState::Done);
    assert_eq!(outcome.executions, 1);
    let written = fs::read_to_string(temp.path().join("do_magic.py")).expect("read artifact");
    assert!(written.is_empty());
    assert!(console.transcript().contains("📋 Here's my plan:\nI am not sure."));
}
