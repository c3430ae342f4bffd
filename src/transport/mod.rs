//! Vibe Kanban client boundary — blocking request/response surface.
//!
//! The executor only sees this trait; the MCP stdio adapter lives in
//! `mcp`. Every failure collapses to a message string at this boundary —
//! timeouts, malformed responses, and remote rejections are not
//! distinguished above the adapter.

pub mod mcp;

use serde_json::Value;

/// Blocking client surface against the Vibe Kanban service.
pub trait VkClient {
    /// Create an issue in a project. Returns the raw response payload.
    fn create_task(
        &mut self,
        project_id: &str,
        title: &str,
        description: &str,
    ) -> Result<Value, String>;

    /// Start a workspace session. `task_id` may be empty (unlinked session);
    /// an empty `repo_id` starts the session with no repository binding.
    fn start_workspace(
        &mut self,
        task_id: &str,
        title: &str,
        executor: &str,
        repo_id: &str,
        base_branch: &str,
    ) -> Result<Value, String>;

    /// List projects visible to an organization.
    fn list_projects(&mut self, organization_id: &str) -> Result<Vec<Value>, String>;

    /// List issues in a project.
    fn list_tasks(&mut self, project_id: &str) -> Result<Vec<Value>, String>;
}

/// Pull the created issue identifier out of a create response.
/// Falls back to `id`, then to empty.
pub fn issue_id(resp: &Value) -> String {
    resp.get("issue_id")
        .or_else(|| resp.get("id"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Pull the workspace identifier out of a start_workspace response.
pub fn workspace_id(resp: &Value) -> String {
    resp.get("workspace_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
