//! Tool contract and registry: a name-keyed set of tools sharing a common
//! execution-bookkeeping wrapper (invocation counts, success rate, timing).

use reagent_llm::LlmTool;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// The in-band signal a tool can return instead of a free-form value,
/// letting it tell the engine how to render the observation and whether to
/// skip the LLM observation-summarization roundtrip entirely.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ObservationOverride {
    pub data: Value,
    pub observation_text: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default = "default_true")]
    pub store_output: bool,
    #[serde(default = "default_true")]
    pub store_result: bool,
    #[serde(default)]
    pub skip_llm: bool,
    #[serde(default)]
    pub log_query: Option<String>,
    #[serde(default)]
    pub log_response: Option<String>,
}

fn default_true() -> bool {
    true
}

/// The value carried by a `ToolResult`: either a plain JSON payload, or an
/// `ObservationOverride` a tool uses to bypass LLM summarization.
#[derive(Clone, Debug)]
pub enum ToolValue {
    Json(Value),
    Observation(ObservationOverride),
}

impl ToolValue {
    pub fn as_observation(&self) -> Option<&ObservationOverride> {
        match self {
            ToolValue::Observation(o) => Some(o),
            _ => None,
        }
    }
}

impl From<Value> for ToolValue {
    fn from(v: Value) -> Self {
        ToolValue::Json(v)
    }
}

/// `{success, value, error, metadata}`. Invariant: `success=false => error is Some`.
#[derive(Clone, Debug)]
pub struct ToolResult {
    pub success: bool,
    pub value: ToolValue,
    pub error: Option<String>,
    pub metadata: HashMap<String, Value>,
}

impl ToolResult {
    pub fn ok(value: impl Into<ToolValue>) -> Self {
        Self {
            success: true,
            value: value.into(),
            error: None,
            metadata: HashMap::new(),
        }
    }

    pub fn ok_text(s: impl Into<String>) -> Self {
        Self::ok(Value::String(s.into()))
    }

    pub fn observation(obs: ObservationOverride) -> Self {
        Self {
            success: true,
            value: ToolValue::Observation(obs),
            error: None,
            metadata: HashMap::new(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            value: ToolValue::Json(Value::Null),
            error: Some(message),
            metadata: HashMap::new(),
        }
    }

    /// Convenience accessor used by the Observation step when the tool did
    /// not return an override: a human-readable rendering of the value.
    pub fn output_text(&self) -> String {
        match &self.value {
            ToolValue::Json(v) => match v {
                Value::String(s) => s.clone(),
                other => serde_json::to_string_pretty(other).unwrap_or_default(),
            },
            ToolValue::Observation(o) => o.observation_text.clone(),
        }
    }
}

/// A callable exposed to the LLM: name, description, argument schema, and an
/// `execute` operation. No inheritance hierarchy — just a trait object in a
/// name-keyed registry.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> Value;
    async fn execute(&self, args: Value) -> ToolResult;
}

#[derive(Default)]
struct ToolStats {
    invocation_count: u64,
    success_count: u64,
}

/// Maps tool name to tool, rejecting duplicate registration, and wraps every
/// invocation in timing + invocation-count + rolling success-rate
/// bookkeeping so it applies uniformly regardless of tool implementation.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    stats: Mutex<HashMap<String, ToolStats>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            stats: Mutex::new(HashMap::new()),
        }
    }

    /// Register a tool. Rejects a name already present.
    pub fn register(&mut self, tool: impl Tool + 'static) -> reagent_core::Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(reagent_core::Error::DuplicateTool(name));
        }
        self.tools.insert(name, Arc::new(tool));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Execute by name, wrapping the result in timing/counting metadata.
    /// Missing tools and tool panics never propagate — both surface as
    /// `success: false`.
    pub async fn execute_tool(&self, name: &str, args: Value) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            return ToolResult::err(format!("Tool not found: {name}"));
        };

        let start = Instant::now();
        let mut result = tool.execute(args).await;
        let elapsed = start.elapsed().as_secs_f64();

        let mut stats = self.stats.lock().await;
        let entry = stats.entry(name.to_string()).or_default();
        entry.invocation_count += 1;
        if result.success {
            entry.success_count += 1;
        }
        let success_rate = entry.success_count as f64 / entry.invocation_count as f64;

        result
            .metadata
            .insert("execution_time_seconds".to_string(), elapsed.into());
        result
            .metadata
            .insert("invocation_count".to_string(), entry.invocation_count.into());
        result
            .metadata
            .insert("success_rate".to_string(), success_rate.into());

        result
    }

    /// Tool catalog for the system prompt: `(name, description)` pairs.
    pub fn catalog(&self) -> Vec<(&str, &str)> {
        let mut items: Vec<_> = self
            .tools
            .values()
            .map(|t| (t.name(), t.description()))
            .collect();
        items.sort_by_key(|(name, _)| *name);
        items
    }

    pub fn get_definitions(&self) -> Vec<LlmTool> {
        self.tools
            .values()
            .map(|t| LlmTool {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.schema(),
            })
            .collect()
    }

    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait::async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes its input"
        }
        fn schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, args: Value) -> ToolResult {
            ToolResult::ok(args)
        }
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo).unwrap();
        let err = registry.register(Echo).unwrap_err();
        assert!(matches!(err, reagent_core::Error::DuplicateTool(_)));
    }

    #[tokio::test]
    async fn execute_missing_tool_reports_not_found() {
        let registry = ToolRegistry::new();
        let result = registry.execute_tool("nope", Value::Null).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn execute_tracks_invocation_count_and_success_rate() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo).unwrap();
        registry.execute_tool("echo", json!({"a": 1})).await;
        let second = registry.execute_tool("echo", json!({"a": 2})).await;
        assert_eq!(second.metadata["invocation_count"], json!(2));
        assert_eq!(second.metadata["success_rate"], json!(1.0));
    }
}
