//! Web search tool — a single query in, `{query, answer, sources}` out,
//! citations falling back to a URL scan of the answer text when the
//! backend doesn't report them structurally.
//!
//! The concrete backend (e.g. a Perplexity-style HTTP client) is a vendor
//! collaborator out of scope here; this tool depends on a narrow trait so a
//! real backend can be substituted without touching the engine.

use crate::registry::{Tool, ToolResult};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};

/// Narrow seam a concrete web-search backend must satisfy.
#[async_trait]
pub trait WebSearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<String, String>;
}

/// Backend that reports it is unavailable, used when no API key/client is
/// configured — mirrors `PerplexitySearchTool`'s `self.available = False`
/// path rather than panicking at startup.
pub struct UnavailableBackend {
    pub reason: String,
}

#[async_trait]
impl WebSearchBackend for UnavailableBackend {
    async fn search(&self, _query: &str) -> Result<String, String> {
        Err(self.reason.clone())
    }
}

pub struct WebSearchTool {
    backend: Arc<dyn WebSearchBackend>,
}

impl WebSearchTool {
    pub fn new(backend: Arc<dyn WebSearchBackend>) -> Self {
        Self { backend }
    }
}

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s)]+").unwrap())
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Provides real-time web results with citations."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query for current web information"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let query = match args["query"].as_str() {
            Some(q) => q,
            None => return ToolResult::err("Missing required parameter: query"),
        };

        match self.backend.search(query).await {
            Ok(answer) => {
                let sources: Vec<&str> = url_pattern()
                    .find_iter(&answer)
                    .map(|m| m.as_str())
                    .collect();
                ToolResult::ok(json!({
                    "query": query,
                    "answer": answer,
                    "sources": sources,
                }))
            }
            Err(e) => ToolResult::err(format!("Search failed: {e}")),
        }
    }
}
