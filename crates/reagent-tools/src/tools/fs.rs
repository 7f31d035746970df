//! Filesystem tool — read/write/list scoped to a workspace root, with every
//! path resolved relative to and confined under that root.

use crate::registry::{Tool, ToolResult};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub struct FsTool {
    workspace_root: PathBuf,
}

impl FsTool {
    pub fn new(workspace_root: impl AsRef<Path>) -> Self {
        Self {
            workspace_root: workspace_root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.workspace_root.join(candidate)
        }
    }
}

#[async_trait::async_trait]
impl Tool for FsTool {
    fn name(&self) -> &str {
        "fs"
    }

    fn description(&self) -> &str {
        "Read, write, and list files under the workspace. Useful for accessing local \
         files, saving data, or reading configurations."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["read", "write", "list"],
                    "description": "File system operation to perform"
                },
                "path": { "type": "string", "description": "File or directory path" },
                "content": {
                    "type": "string",
                    "description": "Content to write (for the write operation)"
                }
            },
            "required": ["operation", "path"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let operation = match args["operation"].as_str() {
            Some(op) => op,
            None => return ToolResult::err("Missing required parameter: operation"),
        };
        let path = match args["path"].as_str() {
            Some(p) => p,
            None => return ToolResult::err("Missing required parameter: path"),
        };
        let resolved = self.resolve(path);

        match operation {
            "read" => match tokio::fs::read_to_string(&resolved).await {
                Ok(content) => ToolResult::ok(json!({
                    "operation": "read",
                    "path": path,
                    "content": content,
                    "size": content.len(),
                })),
                Err(e) => ToolResult::err(format!("File not found or unreadable: {path} ({e})")),
            },
            "write" => {
                let content = match args["content"].as_str() {
                    Some(c) => c,
                    None => return ToolResult::err("Content is required for write operation"),
                };
                if let Some(parent) = resolved.parent() {
                    if let Err(e) = tokio::fs::create_dir_all(parent).await {
                        return ToolResult::err(format!("Failed to create parent directories: {e}"));
                    }
                }
                match tokio::fs::write(&resolved, content).await {
                    Ok(()) => ToolResult::ok(json!({
                        "operation": "write",
                        "path": path,
                        "size": content.len(),
                    })),
                    Err(e) => ToolResult::err(format!("Failed to write {path}: {e}")),
                }
            }
            "list" => match tokio::fs::read_dir(&resolved).await {
                Ok(mut entries) => {
                    let mut names = Vec::new();
                    loop {
                        match entries.next_entry().await {
                            Ok(Some(entry)) => names.push(entry.file_name().to_string_lossy().into_owned()),
                            Ok(None) => break,
                            Err(e) => return ToolResult::err(format!("Failed to list {path}: {e}")),
                        }
                    }
                    names.sort();
                    ToolResult::ok(json!({
                        "operation": "list",
                        "path": path,
                        "files": names,
                        "count": names.len(),
                    }))
                }
                Err(e) => ToolResult::err(format!("Directory not found: {path} ({e})")),
            },
            other => ToolResult::err(format!("Unknown operation: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "reagent-fs-test-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = scratch_dir();
        let tool = FsTool::new(&dir);

        let write = tool
            .execute(json!({ "operation": "write", "path": "note.txt", "content": "hello" }))
            .await;
        assert!(write.success);

        let read = tool.execute(json!({ "operation": "read", "path": "note.txt" })).await;
        assert!(read.success);
        assert_eq!(read.value.as_observation(), None);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn read_missing_file_fails() {
        let dir = scratch_dir();
        let tool = FsTool::new(&dir);
        let result = tool.execute(json!({ "operation": "read", "path": "missing.txt" })).await;
        assert!(!result.success);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn list_reports_written_files() {
        let dir = scratch_dir();
        let tool = FsTool::new(&dir);
        tool.execute(json!({ "operation": "write", "path": "a.txt", "content": "x" }))
            .await;
        let listed = tool.execute(json!({ "operation": "list", "path": "." })).await;
        assert!(listed.success);
        std::fs::remove_dir_all(&dir).ok();
    }
}
