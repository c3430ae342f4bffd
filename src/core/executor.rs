//! Plan execution — walk the step sequence against a client.
//!
//! Execution is best-effort and exhaustive: every step is attempted exactly
//! once, in plan order, and a failed step never aborts the remainder. The
//! fold produces one result per step; there is no early return.

use super::types::{Plan, Step, StepAction, StepOutcome, StepResult};
use crate::transport::{self, VkClient};
use indexmap::IndexMap;

/// Execute a plan against a client. Returns one result per step, same order.
pub fn execute(plan: &Plan, client: &mut dyn VkClient, project_id: &str) -> Vec<StepResult> {
    let mut results = Vec::with_capacity(plan.steps.len());
    // Title → assigned task id, scoped to this run. Last writer wins on
    // colliding titles.
    let mut task_ids: IndexMap<String, String> = IndexMap::new();

    for step in &plan.steps {
        let result = match step {
            Step::CreateTask {
                title, description, ..
            } => run_create(client, project_id, title, description, &mut task_ids),
            Step::StartWorkspace {
                title,
                executor,
                repo,
                base_branch,
            } => run_start(client, &task_ids, title, executor, repo, base_branch),
        };
        results.push(result);
    }

    results
}

/// Results for a plan that was never executed (dry run).
pub fn skip_plan(plan: &Plan) -> Vec<StepResult> {
    plan.steps
        .iter()
        .map(|step| StepResult {
            action: step.action(),
            title: step.title().to_string(),
            outcome: StepOutcome::Skipped,
        })
        .collect()
}

fn run_create(
    client: &mut dyn VkClient,
    project_id: &str,
    title: &str,
    description: &str,
    task_ids: &mut IndexMap<String, String>,
) -> StepResult {
    let outcome = match client.create_task(project_id, title, description) {
        Ok(resp) => {
            let task_id = transport::issue_id(&resp);
            task_ids.insert(title.to_string(), task_id.clone());
            StepOutcome::Success {
                task_id,
                workspace_id: None,
                executor: None,
                detail: resp,
            }
        }
        // Nothing recorded: the paired workspace step proceeds unlinked
        Err(error) => StepOutcome::Error { error },
    };

    StepResult {
        action: StepAction::CreateTask,
        title: title.to_string(),
        outcome,
    }
}

fn run_start(
    client: &mut dyn VkClient,
    task_ids: &IndexMap<String, String>,
    title: &str,
    executor: &str,
    repo: &str,
    base_branch: &str,
) -> StepResult {
    let task_id = task_ids.get(title).cloned().unwrap_or_default();

    let outcome = match client.start_workspace(&task_id, title, executor, repo, base_branch) {
        Ok(resp) => StepOutcome::Success {
            task_id,
            workspace_id: Some(transport::workspace_id(&resp)),
            executor: Some(executor.to_string()),
            detail: resp,
        },
        Err(error) => StepOutcome::Error { error },
    };

    StepResult {
        action: StepAction::StartWorkspace,
        title: title.to_string(),
        outcome,
    }
}
