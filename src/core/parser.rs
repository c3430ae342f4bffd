//! Manifest loading and validation.
//!
//! Loading errors (missing file, malformed JSON) surface from `load_manifest`;
//! `validate_manifest` never fails — it accumulates every violation it finds
//! in the raw JSON so callers can report them all at once. Typed parsing via
//! `parse_manifest` is only defined for manifests that validated cleanly.

use super::types::{Manifest, REQUIRED_MANIFEST_KEYS, VALID_EXECUTORS, VALID_PRIORITIES};
use serde_json::Value;
use std::path::Path;

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn err(message: String) -> ValidationError {
    ValidationError { message }
}

/// Load a `.vk.json` manifest from disk as raw JSON.
pub fn load_manifest(path: &Path) -> Result<Value, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read manifest {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("failed to parse JSON: {}", e))
}

/// Validate a raw manifest. Returns a list of errors (empty = valid).
pub fn validate_manifest(raw: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let Some(manifest) = raw.as_object() else {
        return vec![err("manifest must be a JSON object".to_string())];
    };

    for key in REQUIRED_MANIFEST_KEYS {
        if !manifest.contains_key(*key) {
            errors.push(err(format!("Missing required key: '{}'", key)));
        }
    }

    if let Some(project) = manifest.get("project") {
        match project.as_str() {
            Some(name) if name.is_empty() => {
                errors.push(err("Project name must not be empty".to_string()));
            }
            Some(_) => {}
            None => errors.push(err("'project' must be a string".to_string())),
        }
    }

    if let Some(tasks) = manifest.get("tasks") {
        match tasks.as_array() {
            None => errors.push(err("'tasks' must be a list".to_string())),
            Some(tasks) if tasks.is_empty() => {
                errors.push(err("No tasks found -- tasks list is empty".to_string()));
            }
            Some(tasks) => {
                for (i, task) in tasks.iter().enumerate() {
                    validate_task(i, task, &mut errors);
                }
            }
        }
    }

    errors
}

fn validate_task(index: usize, task: &Value, errors: &mut Vec<ValidationError>) {
    let Some(task) = task.as_object() else {
        errors.push(err(format!("Task {} is not an object", index)));
        return;
    };

    if !task.contains_key("title") {
        errors.push(err(format!("Task {} missing required key: 'title'", index)));
    }

    if let Some(executor) = task.get("executor") {
        let executor = executor.as_str().unwrap_or_default();
        if !VALID_EXECUTORS.contains(&executor) {
            errors.push(err(format!(
                "Task {} has invalid executor: '{}'. Must be one of: {}",
                index,
                executor,
                VALID_EXECUTORS.join(", ")
            )));
        }
    }

    if let Some(priority) = task.get("priority") {
        let priority = priority.as_str().unwrap_or_default();
        if !VALID_PRIORITIES.contains(&priority) {
            errors.push(err(format!(
                "Task {} has invalid priority: '{}'. Must be one of: {}",
                index,
                priority,
                VALID_PRIORITIES.join(", ")
            )));
        }
    }
}

/// Convert a validated raw manifest into its typed form.
pub fn parse_manifest(raw: &Value) -> Result<Manifest, String> {
    serde_json::from_value(raw.clone()).map_err(|e| format!("manifest parse error: {}", e))
}
