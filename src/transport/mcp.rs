//! MCP stdio adapter.
//!
//! Spawns the Vibe Kanban MCP server (`npx -y vibe-kanban@latest --mcp` by
//! default) and speaks line-delimited JSON-RPC 2.0 over its stdio. The server
//! is started lazily on the first call: an `initialize` request and the
//! `notifications/initialized` acknowledgment precede any tool call. The
//! child is torn down exactly once — explicitly via `close`, or on drop.

use super::VkClient;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

/// MCP protocol revision spoken by this client.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC-over-stdio client for the Vibe Kanban MCP server.
pub struct McpClient {
    command: String,
    args: Vec<String>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
    initialized: bool,
    next_id: u64,
}

impl McpClient {
    /// Client for the published Vibe Kanban server.
    pub fn new() -> Self {
        Self::with_command("npx", ["-y", "vibe-kanban@latest", "--mcp"])
    }

    /// Client for an arbitrary MCP server command. Used in tests to point at
    /// a scripted stand-in.
    pub fn with_command<I, S>(command: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            child: None,
            stdin: None,
            stdout: None,
            initialized: false,
            next_id: 1,
        }
    }

    /// Spawn the server and perform the initialize handshake, once.
    fn ensure_initialized(&mut self) -> Result<(), String> {
        if self.initialized {
            return Ok(());
        }
        if self.child.is_none() {
            let mut child = Command::new(&self.command)
                .args(&self.args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .map_err(|e| format!("failed to spawn {}: {}", self.command, e))?;
            self.stdin = child.stdin.take();
            self.stdout = child.stdout.take().map(BufReader::new);
            self.child = Some(child);
        }

        let init = json!({
            "jsonrpc": "2.0",
            "id": self.take_id(),
            "method": "initialize",
            "params": {
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": "vkrun",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            },
        });
        self.send(&init)?;
        self.read_line()?; // consume the initialize response
        self.send(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))?;
        self.initialized = true;
        Ok(())
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn send(&mut self, message: &Value) -> Result<(), String> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| "MCP server stdin is closed".to_string())?;
        let line =
            serde_json::to_string(message).map_err(|e| format!("JSON serialize error: {}", e))?;
        writeln!(stdin, "{}", line).map_err(|e| format!("stdin write error: {}", e))?;
        stdin.flush().map_err(|e| format!("stdin flush error: {}", e))
    }

    fn read_line(&mut self) -> Result<String, String> {
        let stdout = self
            .stdout
            .as_mut()
            .ok_or_else(|| "MCP server stdout is closed".to_string())?;
        let mut line = String::new();
        let n = stdout
            .read_line(&mut line)
            .map_err(|e| format!("stdout read error: {}", e))?;
        if n == 0 {
            return Err("MCP server closed the connection".to_string());
        }
        Ok(line)
    }

    /// Issue a `tools/call` request and unwrap the response envelope.
    fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value, String> {
        self.ensure_initialized()?;
        let request = json!({
            "jsonrpc": "2.0",
            "id": self.take_id(),
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments},
        });
        self.send(&request)?;
        let line = self.read_line()?;
        let envelope: Value =
            serde_json::from_str(&line).map_err(|e| format!("malformed MCP response: {}", e))?;
        tool_result(envelope)
    }

    /// Terminate the server. Safe to call more than once.
    pub fn close(&mut self) {
        // Dropping stdin signals EOF before the kill
        self.stdin = None;
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.initialized = false;
    }
}

impl Default for McpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for McpClient {
    fn drop(&mut self) {
        self.close();
    }
}

impl VkClient for McpClient {
    fn create_task(
        &mut self,
        project_id: &str,
        title: &str,
        description: &str,
    ) -> Result<Value, String> {
        self.call_tool(
            "create_issue",
            json!({
                "project_id": project_id,
                "title": title,
                "description": description,
            }),
        )
    }

    fn start_workspace(
        &mut self,
        task_id: &str,
        title: &str,
        executor: &str,
        repo_id: &str,
        base_branch: &str,
    ) -> Result<Value, String> {
        self.call_tool(
            "start_workspace_session",
            workspace_args(task_id, title, executor, repo_id, base_branch),
        )
    }

    fn list_projects(&mut self, organization_id: &str) -> Result<Vec<Value>, String> {
        let result = self.call_tool("list_projects", json!({"organization_id": organization_id}))?;
        Ok(result
            .get("projects")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    fn list_tasks(&mut self, project_id: &str) -> Result<Vec<Value>, String> {
        let result = self.call_tool("list_issues", json!({"project_id": project_id}))?;
        Ok(result
            .get("issues")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

/// Build the `start_workspace_session` argument object. An empty `repo_id`
/// omits the repository binding; an empty `task_id` leaves the session
/// unlinked to any issue.
fn workspace_args(
    task_id: &str,
    title: &str,
    executor: &str,
    repo_id: &str,
    base_branch: &str,
) -> Value {
    let repos = if repo_id.is_empty() {
        json!([])
    } else {
        json!([{"repo_id": repo_id, "base_branch": base_branch}])
    };
    let mut args = json!({
        "title": title,
        "executor": executor.to_uppercase(),
        "repos": repos,
    });
    if !task_id.is_empty() {
        args["issue_id"] = json!(task_id);
    }
    args
}

/// Unwrap a `tools/call` response envelope. An `error` member maps to a
/// message string; otherwise the tool payload is `result.content[0].text`
/// parsed as JSON, falling back to the raw result object.
fn tool_result(envelope: Value) -> Result<Value, String> {
    if let Some(error) = envelope.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(format!("MCP error: {}", message));
    }

    let result = envelope.get("result").cloned().unwrap_or_else(|| json!({}));
    let text = result
        .get("content")
        .and_then(|content| content.get(0))
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .and_then(|block| block.get("text"))
        .and_then(Value::as_str);

    match text {
        Some(text) => {
            serde_json::from_str(text).map_err(|e| format!("malformed tool payload: {}", e))
        }
        None => Ok(result),
    }
}
