//! Tool implementations for the problem-solving loop.
//!
//! Each tool is a self-contained file in `src/tools/`. To add a tool:
//! create the file, implement `Tool`, register it in `create_default_registry`.

pub mod registry;
pub mod tools;

pub use registry::{ObservationOverride, Tool, ToolRegistry, ToolResult, ToolValue};
pub use tools::{
    CodeExecutorTool, FinalAnswerTool, FsTool, MarketDataBackend, MarketDataTool,
    SecFilingsBackend, SecFilingsTool, WebSearchBackend, WebSearchTool,
};

use std::path::Path;
use std::sync::Arc;

/// Backends for the three network-bound tools, so callers can plug in a
/// real vendor client without this crate depending on one.
pub struct ToolBackends {
    pub web_search: Arc<dyn WebSearchBackend>,
    pub market_data: Arc<dyn MarketDataBackend>,
    pub sec_filings: Arc<dyn SecFilingsBackend>,
}

impl ToolBackends {
    /// All three backends report unavailable. Useful for wiring a registry
    /// before real API keys/clients are configured.
    pub fn unavailable() -> Self {
        Self {
            web_search: Arc::new(tools::web_search::UnavailableBackend {
                reason: "web_search is not configured".to_string(),
            }),
            market_data: Arc::new(tools::market_data::UnavailableBackend {
                reason: "market_data is not configured".to_string(),
            }),
            sec_filings: Arc::new(tools::sec_filings::UnavailableBackend {
                reason: "sec_filings is not configured".to_string(),
            }),
        }
    }
}

/// Build the default registry: filesystem + code execution scoped to
/// `workspace_root`, the three network-bound tools wired to `backends`,
/// and a `final_answer` tool that builds its prompt via `prompt_builder`.
pub fn create_default_registry(
    workspace_root: impl AsRef<Path>,
    backends: ToolBackends,
    default_filing_year: i64,
    code_timeout_secs: u64,
    prompt_builder: Arc<dyn Fn(&str) -> String + Send + Sync>,
) -> reagent_core::Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    let root = workspace_root.as_ref();

    registry.register(FsTool::new(root))?;
    registry.register(CodeExecutorTool::new(code_timeout_secs))?;
    registry.register(WebSearchTool::new(backends.web_search))?;
    registry.register(MarketDataTool::new(backends.market_data))?;
    registry.register(SecFilingsTool::new(backends.sec_filings, default_filing_year))?;
    registry.register(FinalAnswerTool::new(prompt_builder))?;

    Ok(registry)
}
