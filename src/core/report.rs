//! Execution report — aggregation and HTML rendering.

use super::types::{Manifest, Plan, Report, ReportSummary, StepAction, StepOutcome, StepResult};
use chrono::Utc;

/// Aggregate executor results into a report. Pure apart from the timestamp.
pub fn build_report(
    manifest: &Manifest,
    plan: &Plan,
    results: &[StepResult],
    project_id: &str,
) -> Report {
    let succeeded = results.iter().filter(|r| r.is_success()).count() as u32;
    let failed = results.iter().filter(|r| r.is_error()).count() as u32;

    Report {
        project: manifest.project.clone(),
        project_id: project_id.to_string(),
        executed_at: Utc::now().to_rfc3339(),
        source: manifest.source.clone(),
        summary: ReportSummary {
            total_steps: results.len() as u32,
            succeeded,
            failed,
            total_tasks: plan.summary.total_tasks,
            total_workspaces: plan.summary.total_workspaces,
        },
        results: results.to_vec(),
    }
}

const HTML_STYLE: &str = "\
  body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
         max-width: 900px; margin: 2em auto; padding: 0 1em; line-height: 1.6; color: #24292e; }
  h1 { border-bottom: 1px solid #eaecef; padding-bottom: 0.3em; }
  table { border-collapse: collapse; width: 100%; margin-top: 1em; }
  th, td { border: 1px solid #dfe2e5; padding: 8px 12px; text-align: left; }
  th { background: #f6f8fa; font-weight: 600; }
  .success { background: #f0fff0; }
  .error { background: #fff0f0; }
  .skipped { color: #6a737d; }
  .summary { background: #f0f7ff; border: 1px solid #c8e1ff; border-radius: 6px; padding: 1em; margin-bottom: 1em; }";

/// Render a report as a standalone HTML document: a summary box plus one
/// table row per result.
pub fn render_html(report: &Report) -> String {
    let mut rows = String::new();
    for result in &report.results {
        let (class, status) = match &result.outcome {
            StepOutcome::Success { .. } => ("success", "success"),
            StepOutcome::Error { .. } => ("error", "error"),
            StepOutcome::Skipped => ("skipped", "skipped"),
        };
        rows.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            class,
            result.action,
            escape(&result.title),
            status,
            escape(&detail_cell(result)),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8"/>
<title>VK Execution Report - {project}</title>
<style>
{style}
</style>
</head>
<body>
<h1>Execution Report: {project}</h1>
<div class="summary">
  <strong>Project:</strong> {project}<br/>
  <strong>Total Steps:</strong> {total}<br/>
  <strong>Succeeded:</strong> {succeeded}<br/>
  <strong>Failed:</strong> {failed}
</div>
<table>
<tr><th>Action</th><th>Title</th><th>Status</th><th>Detail</th></tr>
{rows}</table>
</body>
</html>"#,
        project = escape(&report.project),
        style = HTML_STYLE,
        total = report.summary.total_steps,
        succeeded = report.summary.succeeded,
        failed = report.summary.failed,
        rows = rows,
    )
}

/// Status-dependent detail column.
fn detail_cell(result: &StepResult) -> String {
    match &result.outcome {
        StepOutcome::Success {
            task_id,
            workspace_id,
            executor,
            ..
        } => match result.action {
            StepAction::CreateTask => format!("Task: {}", dash(task_id)),
            StepAction::StartWorkspace => format!(
                "WS: {} ({})",
                dash(workspace_id.as_deref().unwrap_or("")),
                dash(executor.as_deref().unwrap_or("")),
            ),
        },
        StepOutcome::Error { error } => format!("Error: {}", error),
        StepOutcome::Skipped => "-".to_string(),
    }
}

fn dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
