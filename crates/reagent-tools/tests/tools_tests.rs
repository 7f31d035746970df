//! Integration tests for reagent-tools: ToolRegistry wiring, create_default_registry,
//! and each builtin tool driven through the registry rather than called directly.

use reagent_tools::*;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

fn test_workspace() -> PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("reagent-tools-test-{}-{}", std::process::id(), id));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn cleanup(dir: &std::path::Path) {
    let _ = std::fs::remove_dir_all(dir);
}

fn default_prompt_builder() -> Arc<dyn Fn(&str) -> String + Send + Sync> {
    Arc::new(|q: &str| format!("Provide a final answer for: {q}"))
}

// ===========================================================================
// ToolRegistry basics
// ===========================================================================

#[tokio::test]
async fn registry_default_is_empty() {
    let reg = ToolRegistry::new();
    assert!(reg.list().is_empty());
    assert!(reg.get_definitions().is_empty());
    assert!(reg.catalog().is_empty());
}

#[tokio::test]
async fn registry_execute_missing_tool() {
    let reg = ToolRegistry::new();
    let result = reg.execute_tool("nonexistent", json!({})).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("not found"));
}

// ===========================================================================
// create_default_registry
// ===========================================================================

#[test]
fn create_default_registry_has_all_six_tools() {
    let ws = test_workspace();
    let reg = create_default_registry(&ws, ToolBackends::unavailable(), 2025, 30, default_prompt_builder()).unwrap();
    let names = reg.list();
    for expected in ["fs", "code_executor", "web_search", "market_data", "sec_filings", "final_answer"] {
        assert!(names.contains(&expected), "missing tool: {expected}");
    }
    assert_eq!(names.len(), 6);
    assert_eq!(reg.get_definitions().len(), 6);
    cleanup(&ws);
}

#[test]
fn create_default_registry_tools_have_well_formed_schemas() {
    let ws = test_workspace();
    let reg = create_default_registry(&ws, ToolBackends::unavailable(), 2025, 30, default_prompt_builder()).unwrap();
    for def in reg.get_definitions() {
        assert!(!def.name.is_empty());
        assert!(!def.description.is_empty());
        assert!(def.input_schema.is_object());
        assert_eq!(def.input_schema["type"], "object");
    }
    cleanup(&ws);
}

#[test]
fn registry_catalog_is_sorted_by_name() {
    let ws = test_workspace();
    let reg = create_default_registry(&ws, ToolBackends::unavailable(), 2025, 30, default_prompt_builder()).unwrap();
    let catalog = reg.catalog();
    let mut sorted = catalog.clone();
    sorted.sort_by_key(|(name, _)| *name);
    assert_eq!(catalog, sorted);
}

// ===========================================================================
// fs tool — driven through the registry
// ===========================================================================

#[tokio::test]
async fn fs_write_then_read_through_registry() {
    let ws = test_workspace();
    let reg = create_default_registry(&ws, ToolBackends::unavailable(), 2025, 30, default_prompt_builder()).unwrap();

    let write = reg
        .execute_tool("fs", json!({"operation": "write", "path": "note.txt", "content": "hello world"}))
        .await;
    assert!(write.success, "write failed: {:?}", write.error);

    let read = reg.execute_tool("fs", json!({"operation": "read", "path": "note.txt"})).await;
    assert!(read.success);
    assert_eq!(read.output_text().contains("hello world"), true);

    cleanup(&ws);
}

#[tokio::test]
async fn fs_read_missing_file_reports_error_and_bookkeeping() {
    let ws = test_workspace();
    let reg = create_default_registry(&ws, ToolBackends::unavailable(), 2025, 30, default_prompt_builder()).unwrap();

    let result = reg.execute_tool("fs", json!({"operation": "read", "path": "missing.txt"})).await;
    assert!(!result.success);
    assert!(result.metadata.contains_key("invocation_count"));
    assert_eq!(result.metadata["invocation_count"], json!(1));
    assert_eq!(result.metadata["success_rate"], json!(0.0));

    cleanup(&ws);
}

// ===========================================================================
// code_executor tool — driven through the registry
// ===========================================================================

#[tokio::test]
async fn code_executor_runs_python_and_captures_stdout() {
    let ws = test_workspace();
    let reg = create_default_registry(&ws, ToolBackends::unavailable(), 2025, 30, default_prompt_builder()).unwrap();

    let result = reg.execute_tool("code_executor", json!({"code": "print(2 + 2)"})).await;
    assert!(result.success, "execution failed: {:?}", result.error);
    assert!(result.output_text().contains('4'));

    cleanup(&ws);
}

#[tokio::test]
async fn code_executor_missing_code_param_is_rejected() {
    let ws = test_workspace();
    let reg = create_default_registry(&ws, ToolBackends::unavailable(), 2025, 30, default_prompt_builder()).unwrap();

    let result = reg.execute_tool("code_executor", json!({})).await;
    assert!(!result.success);

    cleanup(&ws);
}

// ===========================================================================
// web_search / market_data / sec_filings — unavailable-backend wiring
// ===========================================================================

#[tokio::test]
async fn web_search_reports_unavailable_backend() {
    let ws = test_workspace();
    let reg = create_default_registry(&ws, ToolBackends::unavailable(), 2025, 30, default_prompt_builder()).unwrap();

    let result = reg.execute_tool("web_search", json!({"query": "rust async runtimes"})).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("not configured"));

    cleanup(&ws);
}

#[tokio::test]
async fn market_data_reports_unavailable_backend() {
    let ws = test_workspace();
    let reg = create_default_registry(&ws, ToolBackends::unavailable(), 2025, 30, default_prompt_builder()).unwrap();

    let result = reg.execute_tool("market_data", json!({"ticker": "AAPL"})).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("not configured"));

    cleanup(&ws);
}

#[tokio::test]
async fn sec_filings_reports_unavailable_backend() {
    let ws = test_workspace();
    let reg = create_default_registry(&ws, ToolBackends::unavailable(), 2025, 30, default_prompt_builder()).unwrap();

    let result = reg.execute_tool("sec_filings", json!({"corp": "Acme Corp"})).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("not configured"));

    cleanup(&ws);
}

// ===========================================================================
// final_answer — observation override surfaces through the registry
// ===========================================================================

#[tokio::test]
async fn final_answer_short_circuits_with_observation_override() {
    let ws = test_workspace();
    let reg = create_default_registry(&ws, ToolBackends::unavailable(), 2025, 30, default_prompt_builder()).unwrap();

    let result = reg
        .execute_tool("final_answer", json!({"original_query": "what is the capital of France?"}))
        .await;
    assert!(result.success);
    let obs = result.value.as_observation().expect("expected an observation override");
    assert!(obs.skip_llm);
    assert!(!obs.store_result);
    assert!(obs.data["prompt"].as_str().unwrap().contains("what is the capital of France?"));

    cleanup(&ws);
}

// ===========================================================================
// Success-rate bookkeeping across mixed success/failure calls
// ===========================================================================

#[tokio::test]
async fn invocation_bookkeeping_tracks_mixed_outcomes() {
    let ws = test_workspace();
    let reg = create_default_registry(&ws, ToolBackends::unavailable(), 2025, 30, default_prompt_builder()).unwrap();

    reg.execute_tool("fs", json!({"operation": "write", "path": "a.txt", "content": "x"})).await;
    let second = reg.execute_tool("fs", json!({"operation": "read", "path": "nonexistent.txt"})).await;

    assert_eq!(second.metadata["invocation_count"], json!(2));
    assert_eq!(second.metadata["success_rate"], json!(0.5));

    cleanup(&ws);
}
