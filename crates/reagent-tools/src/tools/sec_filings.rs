//! SEC filings tool — fetches 10-K filing content for a company, given
//! `corp`/`year` parameters (`year` defaults to the current filing cycle),
//! returning a single `content` string or an error surfaced verbatim when
//! the backend can't resolve a filing. The concrete lookup (ticker/CIK
//! resolution against SEC EDGAR, fetching and cleaning the filing body) is
//! a vendor/network collaborator out of scope here; this tool depends on
//! a narrow trait so a real backend can be substituted without touching
//! the engine.

use crate::registry::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Narrow seam a concrete SEC EDGAR backend must satisfy.
#[async_trait]
pub trait SecFilingsBackend: Send + Sync {
    async fn fetch_10k(&self, corp: &str, year: i64) -> Result<String, String>;
}

pub struct UnavailableBackend {
    pub reason: String,
}

#[async_trait]
impl SecFilingsBackend for UnavailableBackend {
    async fn fetch_10k(&self, _corp: &str, _year: i64) -> Result<String, String> {
        Err(self.reason.clone())
    }
}

pub struct SecFilingsTool {
    backend: Arc<dyn SecFilingsBackend>,
    default_year: i64,
}

impl SecFilingsTool {
    pub fn new(backend: Arc<dyn SecFilingsBackend>, default_year: i64) -> Self {
        Self {
            backend,
            default_year,
        }
    }
}

#[async_trait]
impl Tool for SecFilingsTool {
    fn name(&self) -> &str {
        "sec_filings"
    }

    fn description(&self) -> &str {
        "Fetch SEC 10-K filing content for a company by ticker or name."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "corp": {
                    "type": "string",
                    "description": "Company ticker or name"
                },
                "year": {
                    "type": "integer",
                    "description": "10-K filing year (YYYY)",
                    "default": self.default_year
                }
            },
            "required": ["corp"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let corp = match args["corp"]
            .as_str()
            .or_else(|| args["company_name"].as_str())
            .or_else(|| args["ticker"].as_str())
        {
            Some(c) => c,
            None => return ToolResult::err("'corp' is required"),
        };
        let year = args["year"].as_i64().unwrap_or(self.default_year);

        match self.backend.fetch_10k(corp, year).await {
            Ok(content) => ToolResult::ok(json!({
                "corp": corp,
                "year": year,
                "content": content,
            })),
            Err(e) => ToolResult::err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echoing;

    #[async_trait]
    impl SecFilingsBackend for Echoing {
        async fn fetch_10k(&self, corp: &str, year: i64) -> Result<String, String> {
            Ok(format!("10-K for {corp} ({year})"))
        }
    }

    #[tokio::test]
    async fn missing_corp_is_rejected() {
        let tool = SecFilingsTool::new(Arc::new(Echoing), 2025);
        let result = tool.execute(json!({})).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn defaults_year_when_omitted() {
        let tool = SecFilingsTool::new(Arc::new(Echoing), 2025);
        let result = tool.execute(json!({"corp": "AAPL"})).await;
        assert!(result.success);
    }
}
