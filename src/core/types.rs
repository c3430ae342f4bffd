//! Manifest, plan, and report types for the vkrun JSON schema.
//!
//! The manifest mirrors the `.vk.json` format; plans and reports are the
//! intermediate and output shapes of the pipeline. Everything derives
//! Serialize/Deserialize so reports round-trip as JSON artifacts.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Executor kinds accepted by Vibe Kanban workspace sessions.
pub const VALID_EXECUTORS: &[&str] = &[
    "amp",
    "claude-code",
    "codex",
    "copilot",
    "cursor_agent",
    "droid",
    "gemini",
    "opencode",
    "qwen-code",
];

/// Issue priority levels, as the service spells them.
pub const VALID_PRIORITIES: &[&str] = &["Urgent", "High", "Medium", "Low"];

/// Keys every manifest must declare.
pub const REQUIRED_MANIFEST_KEYS: &[&str] = &["version", "project", "tasks"];

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

// ============================================================================
// Manifest
// ============================================================================

/// Root manifest — a project plus its ordered task declarations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest schema version
    pub version: String,

    /// Project name
    pub project: String,

    /// Provenance metadata, carried through to the report untouched
    #[serde(default = "empty_object")]
    pub source: Value,

    /// Fallback values applied to tasks that don't override them
    #[serde(default)]
    pub defaults: Defaults,

    /// Ordered task declarations
    pub tasks: Vec<TaskDecl>,
}

/// Manifest-level defaults for executor, repository, and base branch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub executor: Option<String>,

    #[serde(default)]
    pub repo: Option<String>,

    #[serde(default)]
    pub base_branch: Option<String>,
}

/// A single task declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDecl {
    /// Task title (required, non-empty)
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub priority: Option<Priority>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Executor override (falls back to manifest defaults)
    #[serde(default)]
    pub executor: Option<String>,

    /// Repository override
    #[serde(default)]
    pub repo: Option<String>,

    /// Base branch override
    #[serde(default)]
    pub base_branch: Option<String>,

    /// Ordered subtask declarations
    #[serde(default)]
    pub subtasks: Vec<SubtaskDecl>,
}

/// Subtask declaration — a bare title string or a structured record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubtaskDecl {
    Title(String),
    Detailed {
        #[serde(default)]
        title: String,
    },
}

impl SubtaskDecl {
    pub fn title(&self) -> &str {
        match self {
            Self::Title(title) | Self::Detailed { title } => title,
        }
    }
}

/// Issue priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Urgent => write!(f, "Urgent"),
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

// ============================================================================
// Plan
// ============================================================================

/// One planned remote operation.
///
/// A `StartWorkspace` step for a title is only valid after the `CreateTask`
/// step for the same title — it consumes that step's assigned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    CreateTask {
        title: String,
        description: String,
        priority: Priority,
        tags: Vec<String>,
        /// Parent task title, set only for subtask-derived steps
        parent_title: Option<String>,
    },
    StartWorkspace {
        title: String,
        executor: String,
        repo: String,
        base_branch: String,
    },
}

impl Step {
    pub fn title(&self) -> &str {
        match self {
            Self::CreateTask { title, .. } | Self::StartWorkspace { title, .. } => title,
        }
    }

    pub fn action(&self) -> StepAction {
        match self {
            Self::CreateTask { .. } => StepAction::CreateTask,
            Self::StartWorkspace { .. } => StepAction::StartWorkspace,
        }
    }
}

/// Step action kind, used to tag results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    CreateTask,
    StartWorkspace,
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateTask => write!(f, "create_task"),
            Self::StartWorkspace => write!(f, "start_workspace"),
        }
    }
}

/// Ordered step sequence plus summary counts. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<Step>,
    pub summary: PlanSummary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_tasks: u32,
    pub total_subtasks: u32,
    pub total_workspaces: u32,
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of one executed step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub action: StepAction,
    pub title: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Status-tagged step outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Success {
        /// Identifier assigned to the created task, or the identifier a
        /// workspace was linked to (possibly empty)
        task_id: String,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        workspace_id: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        executor: Option<String>,

        /// Raw response payload from the service
        #[serde(default = "empty_object")]
        detail: Value,
    },
    Error {
        error: String,
    },
    /// Dry-run placeholder — the step was planned but never attempted
    Skipped,
}

impl StepResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, StepOutcome::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, StepOutcome::Error { .. })
    }
}

// ============================================================================
// Report
// ============================================================================

/// Final execution report — one entry per planned step, plus summary counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub project: String,
    pub project_id: String,
    pub executed_at: String,
    #[serde(default = "empty_object")]
    pub source: Value,
    pub summary: ReportSummary,
    pub results: Vec<StepResult>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_steps: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub total_tasks: u32,
    pub total_workspaces: u32,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_manifest_parse() {
        let manifest: Manifest = serde_json::from_value(json!({
            "version": "1.0.0",
            "project": "Test Project",
            "defaults": {"executor": "claude-code", "repo": "repo-uuid-123", "base_branch": "main"},
            "tasks": [
                {
                    "title": "Build the widget",
                    "description": "Implement the widget feature",
                    "executor": "claude-code",
                    "priority": "High",
                    "tags": ["feature"]
                }
            ]
        }))
        .unwrap();
        assert_eq!(manifest.project, "Test Project");
        assert_eq!(manifest.tasks.len(), 1);
        assert_eq!(manifest.tasks[0].priority, Some(Priority::High));
        assert_eq!(manifest.defaults.repo.as_deref(), Some("repo-uuid-123"));
        assert!(manifest.source.as_object().is_some_and(|o| o.is_empty()));
    }

    #[test]
    fn test_subtask_forms() {
        let task: TaskDecl = serde_json::from_value(json!({
            "title": "Parent",
            "subtasks": ["Sub A", {"title": "Sub B"}, {}]
        }))
        .unwrap();
        let titles: Vec<&str> = task.subtasks.iter().map(SubtaskDecl::title).collect();
        assert_eq!(titles, vec!["Sub A", "Sub B", ""]);
    }

    #[test]
    fn test_priority_default_and_display() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Priority::Urgent.to_string(), "Urgent");
        let p: Priority = serde_json::from_value(json!("Low")).unwrap();
        assert_eq!(p, Priority::Low);
    }

    #[test]
    fn test_step_action_tag() {
        let step = Step::CreateTask {
            title: "x".to_string(),
            description: String::new(),
            priority: Priority::Medium,
            tags: vec![],
            parent_title: None,
        };
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["action"], "create_task");
        assert_eq!(step.action(), StepAction::CreateTask);
        assert_eq!(step.title(), "x");
    }

    #[test]
    fn test_step_action_display() {
        assert_eq!(StepAction::CreateTask.to_string(), "create_task");
        assert_eq!(StepAction::StartWorkspace.to_string(), "start_workspace");
    }

    #[test]
    fn test_outcome_status_tags() {
        let success = StepResult {
            action: StepAction::CreateTask,
            title: "a".to_string(),
            outcome: StepOutcome::Success {
                task_id: "task-001".to_string(),
                workspace_id: None,
                executor: None,
                detail: json!({"issue_id": "task-001"}),
            },
        };
        let value = serde_json::to_value(&success).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["task_id"], "task-001");
        assert!(value.get("workspace_id").is_none());

        let skipped = StepResult {
            action: StepAction::StartWorkspace,
            title: "a".to_string(),
            outcome: StepOutcome::Skipped,
        };
        let value = serde_json::to_value(&skipped).unwrap();
        assert_eq!(value["status"], "skipped");
    }

    #[test]
    fn test_result_roundtrip() {
        let result = StepResult {
            action: StepAction::StartWorkspace,
            title: "b".to_string(),
            outcome: StepOutcome::Error {
                error: "MCP error: boom".to_string(),
            },
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: StepResult = serde_json::from_str(&json).unwrap();
        assert!(back.is_error());
        assert!(!back.is_success());
    }

    #[test]
    fn test_constants() {
        assert!(VALID_EXECUTORS.contains(&"claude-code"));
        assert!(VALID_PRIORITIES.contains(&"Urgent"));
        assert_eq!(REQUIRED_MANIFEST_KEYS, &["version", "project", "tasks"]);
    }
}
