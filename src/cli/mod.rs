//! CLI entrypoint — read input, compile the manifest, run the plan, write
//! report artifacts and the output listing.

use crate::core::{executor, parser, planner, report};
use crate::io::{self, Artifact};
use crate::transport::mcp::McpClient;
use clap::Parser;
use serde_json::{json, Map, Value};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vkrun",
    version,
    about = "Drive a Vibe Kanban board from a declarative task manifest over MCP"
)]
pub struct Args {
    /// Path to the input JSON (simple task description or full manifest)
    pub input: PathBuf,

    /// Path to write the artifact listing JSON
    pub output: PathBuf,

    /// Directory for report artifacts
    #[arg(default_value = ".")]
    pub work_dir: PathBuf,
}

/// Run the full pipeline. Validation failure aborts before any remote call.
pub fn run(args: &Args) -> Result<(), String> {
    let inputs = io::read_input(&args.input)?;
    let task_data = resolve_task_data(inputs)?;

    let project_id = str_field(&task_data, "project_id");
    if project_id.is_empty() {
        return Err("'project_id' is required".to_string());
    }
    let dry_run = bool_field(&task_data, "dry_run");

    let manifest_value = manifest_from_input(&task_data)?;
    let errors = parser::validate_manifest(&manifest_value);
    if !errors.is_empty() {
        eprintln!("Manifest validation errors:");
        for e in &errors {
            eprintln!("  - {}", e);
        }
        return Err(format!("{} validation error(s)", errors.len()));
    }

    let manifest = parser::parse_manifest(&manifest_value)?;
    let plan = planner::plan(&manifest);

    println!("Project: {} ({})", manifest.project, project_id);
    println!(
        "Plan: {} steps ({} tasks, {} subtasks, {} workspaces)",
        plan.steps.len(),
        plan.summary.total_tasks,
        plan.summary.total_subtasks,
        plan.summary.total_workspaces
    );

    let results = if dry_run {
        println!("DRY RUN -- skipping execution");
        executor::skip_plan(&plan)
    } else {
        let mut client = McpClient::new();
        let results = executor::execute(&plan, &mut client, &project_id);
        client.close();
        results
    };

    let report = report::build_report(&manifest, &plan, &results, &project_id);
    println!(
        "Results: {} succeeded, {} failed",
        report.summary.succeeded, report.summary.failed
    );

    // Artifact paths in the listing must be absolute
    let work_dir = std::fs::canonicalize(&args.work_dir)
        .map_err(|e| format!("cannot resolve work dir {}: {}", args.work_dir.display(), e))?;

    let stem = artifact_stem(&manifest.project);
    let mut artifacts = Vec::new();

    let report_path = work_dir.join(format!("{}_report.json", stem));
    let report_json =
        serde_json::to_string_pretty(&report).map_err(|e| format!("JSON serialize error: {}", e))?;
    std::fs::write(&report_path, report_json)
        .map_err(|e| format!("cannot write {}: {}", report_path.display(), e))?;
    println!("Wrote report: {}", report_path.display());
    artifacts.push(Artifact::file("execution_report", &report_path));

    let html_path = work_dir.join(format!("{}_report.html", stem));
    std::fs::write(&html_path, report::render_html(&report))
        .map_err(|e| format!("cannot write {}: {}", html_path.display(), e))?;
    artifacts.push(Artifact::file("execution_report_html", &html_path));

    io::write_output(&args.output, &artifacts)?;
    println!("Done.");
    Ok(())
}

/// Follow the `task_file` indirection when present; otherwise the input
/// itself is the task data.
fn resolve_task_data(inputs: Map<String, Value>) -> Result<Map<String, Value>, String> {
    let Some(task_file) = inputs.get("task_file").and_then(Value::as_str) else {
        return Ok(inputs);
    };
    let content = std::fs::read_to_string(task_file)
        .map_err(|e| format!("cannot read task file {}: {}", task_file, e))?;
    let value: Value = serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse task file {}: {}", task_file, e))?;
    match value {
        Value::Object(data) => Ok(data),
        _ => Err(format!("task file {} must contain a JSON object", task_file)),
    }
}

/// Build a manifest from the task data: pass a full manifest through
/// untouched, or wrap the simple single-task form.
fn manifest_from_input(task_data: &Map<String, Value>) -> Result<Value, String> {
    if task_data.contains_key("tasks") {
        return Ok(Value::Object(task_data.clone()));
    }

    let task = str_field(task_data, "task");
    if task.is_empty() {
        return Err("'task' is required".to_string());
    }
    let agent = task_data
        .get("agent")
        .and_then(Value::as_str)
        .unwrap_or(planner::FALLBACK_EXECUTOR);
    let repo_id = str_field(task_data, "repo_id");
    let base_branch = task_data
        .get("base_branch")
        .and_then(Value::as_str)
        .unwrap_or(planner::FALLBACK_BRANCH);

    Ok(json!({
        "version": "1.0.0",
        "project": task,
        "defaults": {
            "executor": agent,
            "repo": repo_id,
            "base_branch": base_branch,
        },
        "tasks": [
            {
                "title": task,
                "executor": agent,
            }
        ],
    }))
}

fn str_field(data: &Map<String, Value>, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Accepts both a JSON boolean and the string "true".
fn bool_field(data: &Map<String, Value>, key: &str) -> bool {
    match data.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Lowercased, underscored, truncated file stem for report artifacts.
fn artifact_stem(name: &str) -> String {
    name.to_lowercase().replace(' ', "_").chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_json(path: &std::path::Path, value: &Value) {
        std::fs::write(path, value.to_string()).unwrap();
    }

    #[test]
    fn test_manifest_from_simple_input() {
        let data = json!({
            "project_id": "proj-1",
            "task": "Build the widget",
            "agent": "codex",
            "repo_id": "repo-1"
        });
        let manifest = manifest_from_input(data.as_object().unwrap()).unwrap();
        assert_eq!(manifest["project"], "Build the widget");
        assert_eq!(manifest["defaults"]["executor"], "codex");
        assert_eq!(manifest["defaults"]["repo"], "repo-1");
        assert_eq!(manifest["defaults"]["base_branch"], "main");
        assert_eq!(manifest["tasks"][0]["title"], "Build the widget");
    }

    #[test]
    fn test_manifest_defaults_applied() {
        let data = json!({"project_id": "p", "task": "Do it"});
        let manifest = manifest_from_input(data.as_object().unwrap()).unwrap();
        assert_eq!(manifest["defaults"]["executor"], "claude-code");
        assert_eq!(manifest["defaults"]["repo"], "");
    }

    #[test]
    fn test_full_manifest_passes_through() {
        let data = json!({
            "project_id": "p",
            "version": "1.0.0",
            "project": "Big",
            "tasks": [{"title": "A"}, {"title": "B"}]
        });
        let manifest = manifest_from_input(data.as_object().unwrap()).unwrap();
        assert_eq!(manifest["tasks"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_task_required_in_simple_form() {
        let data = json!({"project_id": "p"});
        let err = manifest_from_input(data.as_object().unwrap()).unwrap_err();
        assert!(err.contains("task"));
    }

    #[test]
    fn test_bool_field_forms() {
        let data = json!({"a": true, "b": "true", "c": "TRUE", "d": "false", "e": 1});
        let data = data.as_object().unwrap();
        assert!(bool_field(data, "a"));
        assert!(bool_field(data, "b"));
        assert!(bool_field(data, "c"));
        assert!(!bool_field(data, "d"));
        assert!(!bool_field(data, "e"));
        assert!(!bool_field(data, "missing"));
    }

    #[test]
    fn test_artifact_stem() {
        assert_eq!(artifact_stem("Build the Widget"), "build_the_widget");
        let long = "x".repeat(80);
        assert_eq!(artifact_stem(&long).len(), 50);
    }

    #[test]
    fn test_dry_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.json");
        let output = dir.path().join("output.json");
        write_json(
            &input,
            &json!({
                "project_id": "proj-1",
                "task": "Build the widget",
                "agent": "claude-code",
                "dry_run": "true"
            }),
        );

        let args = Args {
            input,
            output: output.clone(),
            work_dir: dir.path().to_path_buf(),
        };
        run(&args).unwrap();

        let report_path = dir.path().join("build_the_widget_report.json");
        let report: Value =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(report["summary"]["total_steps"], 2);
        assert_eq!(report["summary"]["succeeded"], 0);
        assert_eq!(report["summary"]["failed"], 0);
        assert_eq!(report["results"][0]["status"], "skipped");

        let html = std::fs::read_to_string(dir.path().join("build_the_widget_report.html")).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));

        let artifacts: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0]["name"], "execution_report");
        assert_eq!(artifacts[1]["name"], "execution_report_html");
    }

    #[test]
    fn test_dry_run_full_manifest_with_subtasks() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.json");
        write_json(
            &input,
            &json!({
                "project_id": "proj-1",
                "dry_run": true,
                "version": "1.0.0",
                "project": "Widget Program",
                "tasks": [
                    {"title": "Parent", "subtasks": ["Sub A", "Sub B"]}
                ]
            }),
        );

        let args = Args {
            input,
            output: dir.path().join("output.json"),
            work_dir: dir.path().to_path_buf(),
        };
        run(&args).unwrap();

        let report: Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("widget_program_report.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(report["summary"]["total_steps"], 4);
    }

    #[test]
    fn test_task_file_indirection() {
        let dir = tempfile::tempdir().unwrap();
        let task_file = dir.path().join("task.json");
        write_json(
            &task_file,
            &json!({"project_id": "proj-1", "task": "Indirect", "dry_run": true}),
        );
        let input = dir.path().join("input.json");
        write_json(
            &input,
            &json!({"task_file": {"type": "user_model", "value": task_file.to_str().unwrap()}}),
        );

        let args = Args {
            input,
            output: dir.path().join("output.json"),
            work_dir: dir.path().to_path_buf(),
        };
        run(&args).unwrap();
        assert!(dir.path().join("indirect_report.json").exists());
    }

    #[test]
    fn test_missing_arguments_are_a_parse_error() {
        // main maps any parse error to exit 1
        assert!(Args::try_parse_from(["vkrun"]).is_err());
        assert!(Args::try_parse_from(["vkrun", "input.json"]).is_err());
        assert!(Args::try_parse_from(["vkrun", "input.json", "output.json"]).is_ok());
    }

    #[test]
    fn test_artifact_paths_are_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.json");
        let output = dir.path().join("output.json");
        write_json(
            &input,
            &json!({"project_id": "p", "task": "Abs paths", "dry_run": true}),
        );

        let args = Args {
            input,
            output: output.clone(),
            work_dir: dir.path().to_path_buf(),
        };
        run(&args).unwrap();

        let artifacts: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        for artifact in &artifacts {
            let path = std::path::Path::new(artifact["path"].as_str().unwrap());
            assert!(path.is_absolute(), "relative artifact path: {:?}", path);
            assert!(path.exists());
        }
    }

    #[test]
    fn test_missing_work_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.json");
        write_json(
            &input,
            &json!({"project_id": "p", "task": "No dir", "dry_run": true}),
        );

        let args = Args {
            input,
            output: dir.path().join("output.json"),
            work_dir: dir.path().join("does-not-exist"),
        };
        let err = run(&args).unwrap_err();
        assert!(err.contains("work dir"));
    }

    #[test]
    fn test_missing_project_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.json");
        write_json(&input, &json!({"task": "No project"}));

        let args = Args {
            input,
            output: dir.path().join("output.json"),
            work_dir: dir.path().to_path_buf(),
        };
        let err = run(&args).unwrap_err();
        assert!(err.contains("project_id"));
    }

    #[test]
    fn test_validation_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.json");
        write_json(
            &input,
            &json!({"project_id": "p", "task": "Bad agent", "agent": "bad-bot"}),
        );

        let args = Args {
            input,
            output: dir.path().join("output.json"),
            work_dir: dir.path().to_path_buf(),
        };
        let err = run(&args).unwrap_err();
        assert!(err.contains("validation error"));
        // no artifacts written on validation failure
        assert!(!dir.path().join("output.json").exists());
    }
}
