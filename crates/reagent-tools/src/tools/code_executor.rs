//! Code execution tool — runs a Python snippet under a timeout.
//!
//! Shells out to a `python3` interpreter (spawn + `tokio::time::timeout`,
//! capture stdout/stderr) so a misbehaving snippet cannot corrupt the host
//! process.

use crate::registry::{Tool, ToolResult};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

pub struct CodeExecutorTool {
    default_timeout_secs: u64,
}

impl CodeExecutorTool {
    pub fn new(default_timeout_secs: u64) -> Self {
        Self { default_timeout_secs }
    }
}

#[async_trait::async_trait]
impl Tool for CodeExecutorTool {
    fn name(&self) -> &str {
        "code_executor"
    }

    fn description(&self) -> &str {
        "Execute Python code safely. Use a fenced ```python code block (no JSON wrapper \
         required). Useful for calculations, data processing, or testing code snippets."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Python code to execute (extracted from a ```python block)"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Execution timeout in seconds",
                    "default": 30
                }
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let code = match args["code"].as_str() {
            Some(c) => c,
            None => return ToolResult::err("Missing required parameter: code"),
        };
        let timeout_secs = args["timeout"]
            .as_u64()
            .unwrap_or(self.default_timeout_secs)
            .min(600);

        debug!(chars = code.len(), timeout_secs, "code_executor running");

        let output = match tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            Command::new("python3").arg("-c").arg(code).output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return ToolResult::err(format!("Failed to execute: {e}")),
            Err(_) => return ToolResult::err(format!("Code execution timed out after {timeout_secs}s")),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if output.status.success() {
            let text = if stdout.is_empty() {
                "Code executed successfully (no output)".to_string()
            } else {
                stdout
            };
            ToolResult::ok(json!({ "output": text, "code": code }))
        } else {
            ToolResult::err(format!("Code execution error: {stderr}"))
        }
    }
}
