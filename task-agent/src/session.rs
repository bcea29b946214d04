//! Interactive approve → execute → feedback → retry loop.
//!
//! The loop is an explicit state machine over [`SessionState`]. Every step
//! blocks on the previous one and on user input; there is no concurrency.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::core::answer::is_affirmative;
use crate::core::types::{ExecutionReport, Proposal, SessionOutcome, SessionState};
use crate::io::artifact::ArtifactRunner;
use crate::io::console::Console;
use crate::io::model::ModelClient;
use crate::io::prompt::PromptEngine;
use crate::planner::{PlanPhase, generate_proposal};

/// Settings for one interactive session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pause after a reported failure before planning again.
    pub retry_pause: Duration,
    /// Stop after this many planning rounds. `None` is unbounded.
    pub max_iterations: Option<u32>,
    /// Task supplied up front; skips the task prompt when set.
    pub initial_task: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retry_pause: Duration::from_secs(1),
            max_iterations: None,
            initial_task: None,
        }
    }
}

/// Loop values threaded through the state machine.
#[derive(Debug, Default)]
struct Session {
    task: String,
    feedback: Option<String>,
    proposal: Proposal,
    iterations: u32,
    executions: u32,
    last_artifact: Option<PathBuf>,
}

/// Drive one session to `Done` or `Cancelled`.
///
/// Errors are reserved for terminal I/O and artifact write failures. A failed
/// model call or a failing script is shown to the user, who decides what
/// happens next.
pub fn run_session<M: ModelClient, C: Console>(
    model: &M,
    console: &mut C,
    artifacts: &ArtifactRunner,
    config: &SessionConfig,
) -> Result<SessionOutcome> {
    let prompts = PromptEngine::new();
    let mut session = Session::default();
    let mut state = SessionState::AwaitingTask;

    console.say("🤖 AI Task Agent")?;
    console.say("----------------")?;

    while !state.is_terminal() {
        debug!(%state, iterations = session.iterations, "session state");
        state = match state {
            SessionState::AwaitingTask => await_task(console, &mut session, config)?,
            SessionState::Planning => plan(model, &prompts, console, &mut session, config)?,
            SessionState::AwaitingApproval => await_approval(console, &mut session)?,
            SessionState::Executing => execute(artifacts, console, &mut session)?,
            SessionState::AwaitingOutcome => await_outcome(console, &mut session, config)?,
            SessionState::Done | SessionState::Cancelled => state,
        };
    }

    info!(
        %state,
        iterations = session.iterations,
        executions = session.executions,
        "session finished"
    );
    Ok(SessionOutcome {
        state,
        iterations: session.iterations,
        executions: session.executions,
        last_artifact: session.last_artifact,
    })
}

fn await_task<C: Console>(
    console: &mut C,
    session: &mut Session,
    config: &SessionConfig,
) -> Result<SessionState> {
    if let Some(task) = config.initial_task.as_deref().filter(|t| !t.trim().is_empty()) {
        console.say(&format!("Task: {task}"))?;
        session.task = task.to_string();
        return Ok(SessionState::Planning);
    }
    loop {
        match console.ask("Enter the task you'd like me to perform: ")? {
            None => return Ok(SessionState::Cancelled),
            Some(task) if task.trim().is_empty() => continue,
            Some(task) => {
                session.task = task;
                return Ok(SessionState::Planning);
            }
        }
    }
}

fn plan<M: ModelClient, C: Console>(
    model: &M,
    prompts: &PromptEngine,
    console: &mut C,
    session: &mut Session,
    config: &SessionConfig,
) -> Result<SessionState> {
    if let Some(max) = config.max_iterations
        && session.iterations >= max
    {
        console.say(&format!(
            "🛑 Stopping after {max} attempts without success."
        ))?;
        return Ok(SessionState::Cancelled);
    }
    session.iterations += 1;

    let task = prompts.render_task(&session.task, session.feedback.as_deref())?;
    let proposal = generate_proposal(model, prompts, &task, |phase| match phase {
        PlanPhase::Plan => console.say("\n🧠 Generating plan..."),
        PlanPhase::Code => console.say("🧠 Generating code..."),
    })?;

    console.say("\n📋 Here's my plan:")?;
    console.say(&proposal.plan)?;
    console.say("\n📝 Here's the code I'll execute:")?;
    console.say(&proposal.code)?;

    session.proposal = proposal;
    Ok(SessionState::AwaitingApproval)
}

fn await_approval<C: Console>(console: &mut C, session: &mut Session) -> Result<SessionState> {
    let Some(answer) = console.ask("\n⚠️ Approve execution? (yes/no): ")? else {
        return Ok(SessionState::Cancelled);
    };
    if is_affirmative(&answer) {
        return Ok(SessionState::Executing);
    }

    console.say("❌ Execution cancelled.")?;
    let Some(wants_feedback) =
        console.ask("Would you like to provide feedback to refine the plan? (yes/no): ")?
    else {
        return Ok(SessionState::Cancelled);
    };
    if !is_affirmative(&wants_feedback) {
        return Ok(SessionState::Cancelled);
    }
    match console.ask("Please provide your feedback: ")? {
        None => Ok(SessionState::Cancelled),
        Some(feedback) => {
            session.feedback = Some(feedback);
            Ok(SessionState::Planning)
        }
    }
}

fn execute<C: Console>(
    artifacts: &ArtifactRunner,
    console: &mut C,
    session: &mut Session,
) -> Result<SessionState> {
    console.say("\n🚀 Executing code...")?;
    let artifact = artifacts.write(&session.proposal.code, &session.task)?;
    console.say(&format!("\n✅ Code saved to {}", artifact.path.display()))?;

    let report = artifacts.run(&artifact);
    session.executions += 1;
    session.last_artifact = Some(artifact.path);
    show_report(console, &report)?;
    Ok(SessionState::AwaitingOutcome)
}

fn show_report<C: Console>(console: &mut C, report: &ExecutionReport) -> Result<()> {
    console.say("\n📊 Execution Results:")?;
    if !report.stdout.is_empty() {
        console.say("Output:")?;
        console.say(&report.stdout)?;
    }
    if !report.stderr.is_empty() {
        console.say("Errors:")?;
        console.say(&report.stderr)?;
    }
    Ok(())
}

fn await_outcome<C: Console>(
    console: &mut C,
    session: &mut Session,
    config: &SessionConfig,
) -> Result<SessionState> {
    let Some(answer) = console.ask("\n✅ Was the task completed successfully? (yes/no): ")? else {
        return Ok(SessionState::Cancelled);
    };
    if is_affirmative(&answer) {
        console.say("🎉 Great! Task completed successfully.")?;
        return Ok(SessionState::Done);
    }

    console.say("❌ Task was not successful.")?;
    let Some(feedback) = console.ask("Please explain what went wrong: ")? else {
        return Ok(SessionState::Cancelled);
    };
    session.feedback = Some(feedback);
    console.say("\n🔄 I'll refine the solution based on your feedback...")?;
    if !config.retry_pause.is_zero() {
        thread::sleep(config.retry_pause);
    }
    Ok(SessionState::Planning)
}
