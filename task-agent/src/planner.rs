//! Plan generation: one plan query and one independent code query.

use anyhow::Result;
use tracing::{debug, instrument, warn};

use crate::core::extract::extract_code;
use crate::core::plan::isolate_plan;
use crate::core::types::Proposal;
use crate::io::model::ModelClient;
use crate::io::prompt::PromptEngine;

/// Which query is about to be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanPhase {
    Plan,
    Code,
}

/// Ask the model for a plan and for code to accomplish `task`.
///
/// `task` may already carry feedback from a previous attempt. The two queries
/// share no context, so plan and code can disagree. `on_phase` is called
/// before each query.
#[instrument(skip_all, fields(task_len = task.len()))]
pub fn generate_proposal<M: ModelClient, F: FnMut(PlanPhase) -> Result<()>>(
    model: &M,
    prompts: &PromptEngine,
    task: &str,
    mut on_phase: F,
) -> Result<Proposal> {
    on_phase(PlanPhase::Plan)?;
    let plan_response = model.query(&prompts.render_plan(task)?);
    let plan = isolate_plan(&plan_response);

    on_phase(PlanPhase::Code)?;
    let code_response = model.query(&prompts.render_code(task)?);
    let code = extract_code(&code_response);
    if code.is_empty() {
        warn!("no code found in model response; the artifact will be empty");
    }

    debug!(plan_len = plan.len(), code_len = code.len(), "proposal ready");
    Ok(Proposal { plan, code })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;

    #[test]
    fn plan_is_isolated_and_code_extracted() {
        let model = ScriptedModel::new(vec![
            "Sure!\n1. Make a folder\n2. Print done",
            "```bash\nmkdir out\necho done\n```",
        ]);
        let mut phases = Vec::new();

        let proposal = generate_proposal(&model, &PromptEngine::new(), "make out", |phase| {
            phases.push(phase);
            Ok(())
        })
        .expect("proposal");

        assert_eq!(proposal.plan, "1. Make a folder\n2. Print done");
        assert_eq!(proposal.code, "mkdir out\necho done");
        assert_eq!(phases, vec![PlanPhase::Plan, PlanPhase::Code]);
    }

    #[test]
    fn prompts_embed_the_task() {
        let model = ScriptedModel::new(vec!["plan", "code"]);
        generate_proposal(&model, &PromptEngine::new(), "list files", |_| Ok(()))
            .expect("proposal");

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].starts_with("Generate a step-by-step plan"));
        assert!(prompts[0].contains("'list files'"));
        assert!(prompts[1].starts_with("Write code to accomplish this task: 'list files'"));
    }

    #[test]
    fn unnumbered_plan_and_codeless_answer_fall_back() {
        let model = ScriptedModel::new(vec!["Just do it.", "I cannot help with that."]);
        let proposal = generate_proposal(&model, &PromptEngine::new(), "t", |_| Ok(()))
            .expect("proposal");

        assert_eq!(proposal.plan, "Just do it.");
        assert_eq!(proposal.code, "");
    }

    #[test]
    fn error_responses_flow_through_as_text() {
        let model = ScriptedModel::new(vec!["Error: model not found", "Error: model not found"]);
        let proposal = generate_proposal(&model, &PromptEngine::new(), "t", |_| Ok(()))
            .expect("proposal");

        assert_eq!(proposal.plan, "Error: model not found");
    }
}
