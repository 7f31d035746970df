//! Final answer tool — the loop's designated exit. Invoking it builds a
//! final-answer prompt from the original query and returns an
//! `ObservationOverride` with `skip_llm: true`/`store_result: false`, so
//! the engine renders the final answer directly instead of routing it
//! through another LLM observation-summarization call.
//!
//! The prompt text itself lives in the engine's prompt templates module,
//! which in turn depends on this tool being registered — to avoid a
//! dependency cycle between the tools and engine crates, the prompt is
//! built by a closure supplied at construction time rather than imported
//! directly.

use crate::registry::{ObservationOverride, Tool, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct FinalAnswerTool {
    prompt_builder: Arc<dyn Fn(&str) -> String + Send + Sync>,
}

impl FinalAnswerTool {
    pub fn new(prompt_builder: Arc<dyn Fn(&str) -> String + Send + Sync>) -> Self {
        Self { prompt_builder }
    }
}

#[async_trait]
impl Tool for FinalAnswerTool {
    fn name(&self) -> &str {
        "final_answer"
    }

    fn description(&self) -> &str {
        "Signal that you have gathered enough information to answer the original query. \
         Call this when you are ready to produce the final answer."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "original_query": {
                    "type": "string",
                    "description": "The user's original query, verbatim"
                }
            },
            "required": ["original_query"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let original_query = match args["original_query"].as_str() {
            Some(q) => q,
            None => return ToolResult::err("Missing required parameter: original_query"),
        };

        let prompt = (self.prompt_builder)(original_query);

        ToolResult::observation(ObservationOverride {
            data: json!({
                "prompt": prompt,
                "original_query": original_query,
            }),
            observation_text: "final_answer".to_string(),
            error: None,
            store_output: true,
            store_result: false,
            skip_llm: true,
            log_query: Some("final_answer".to_string()),
            log_response: Some(String::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_prompt_and_skips_llm() {
        let tool = FinalAnswerTool::new(Arc::new(|q: &str| format!("Answer: {q}")));
        let result = tool.execute(json!({"original_query": "what is 2+2"})).await;
        assert!(result.success);
        let obs = result.value.as_observation().expect("observation override");
        assert!(obs.skip_llm);
        assert!(!obs.store_result);
        assert_eq!(obs.data["prompt"], json!("Answer: what is 2+2"));
    }
}
