//! Plan generation — expand a manifest into an ordered step sequence.
//!
//! Pure and deterministic. Only defined for manifests that passed validation.

use super::types::{Manifest, Plan, PlanSummary, Step};

/// Executor used when neither the task nor the defaults name one.
pub const FALLBACK_EXECUTOR: &str = "claude-code";

/// Base branch used when neither the task nor the defaults name one.
pub const FALLBACK_BRANCH: &str = "main";

/// Expand a manifest into an execution plan.
///
/// Per task, in declared order: a `CreateTask` step, then a `StartWorkspace`
/// step, then one `CreateTask` step per subtask. The workspace step must stay
/// behind the task's create step — it consumes the identifier that step
/// produces at execution time.
pub fn plan(manifest: &Manifest) -> Plan {
    let default_executor = manifest
        .defaults
        .executor
        .as_deref()
        .unwrap_or(FALLBACK_EXECUTOR);
    let default_repo = manifest.defaults.repo.as_deref().unwrap_or("");
    let default_branch = manifest
        .defaults
        .base_branch
        .as_deref()
        .unwrap_or(FALLBACK_BRANCH);

    let mut steps = Vec::new();
    let mut total_subtasks = 0u32;

    for task in &manifest.tasks {
        let executor = task.executor.as_deref().unwrap_or(default_executor);
        let repo = task.repo.as_deref().unwrap_or(default_repo);
        let branch = task.base_branch.as_deref().unwrap_or(default_branch);

        steps.push(Step::CreateTask {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            priority: task.priority.unwrap_or_default(),
            tags: task.tags.clone(),
            parent_title: None,
        });

        steps.push(Step::StartWorkspace {
            title: task.title.clone(),
            executor: executor.to_string(),
            repo: repo.to_string(),
            base_branch: branch.to_string(),
        });

        // Subtasks inherit the parent's priority and tags, and only get a
        // create step — no workspace of their own.
        for subtask in &task.subtasks {
            total_subtasks += 1;
            steps.push(Step::CreateTask {
                title: subtask.title().to_string(),
                description: format!("Subtask of: {}", task.title),
                priority: task.priority.unwrap_or_default(),
                tags: task.tags.clone(),
                parent_title: Some(task.title.clone()),
            });
        }
    }

    let total_tasks = manifest.tasks.len() as u32;
    let total_workspaces = steps
        .iter()
        .filter(|s| matches!(s, Step::StartWorkspace { .. }))
        .count() as u32;

    Plan {
        steps,
        summary: PlanSummary {
            total_tasks,
            total_subtasks,
            total_workspaces,
        },
    }
}
