//! Prompt rendering for model queries.

use anyhow::Result;
use minijinja::{Environment, context};

const PLAN_TEMPLATE: &str = include_str!("prompts/plan.md");
const CODE_TEMPLATE: &str = include_str!("prompts/code.md");
const RETRY_TEMPLATE: &str = include_str!("prompts/retry.md");

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("plan", PLAN_TEMPLATE)
            .expect("plan template should be valid");
        env.add_template("code", CODE_TEMPLATE)
            .expect("code template should be valid");
        env.add_template("retry", RETRY_TEMPLATE)
            .expect("retry template should be valid");
        Self { env }
    }

    /// Request for a numbered step-by-step plan.
    pub fn render_plan(&self, task: &str) -> Result<String> {
        let template = self.env.get_template("plan")?;
        Ok(template.render(context! { task => task })?)
    }

    /// Request for bare code with no explanation.
    pub fn render_code(&self, task: &str) -> Result<String> {
        let template = self.env.get_template("code")?;
        Ok(template.render(context! { task => task })?)
    }

    /// Task text for a planning round.
    ///
    /// Without feedback this is the task itself. With feedback the task is
    /// wrapped together with the user's explanation of the previous failure.
    pub fn render_task(&self, task: &str, feedback: Option<&str>) -> Result<String> {
        match feedback.filter(|f| !f.is_empty()) {
            None => Ok(task.to_string()),
            Some(feedback) => {
                let template = self.env.get_template("retry")?;
                Ok(template.render(context! { task => task, feedback => feedback })?)
            }
        }
    }
}
