//! Market data tool — balance-sheet style fundamentals for a ticker, with
//! ticker normalization (Korean 6-digit numeric tickers are tried with
//! `.KS`/`.KQ` suffixes), annual-falls-back-to-quarterly lookup, and an
//! error shape naming the candidates that were tried when nothing is
//! found. The concrete data provider is a vendor collaborator out of scope
//! here; this tool depends on a narrow trait so a real backend (a market
//! data API, a paid feed, ...) can be substituted without touching the
//! engine.

use crate::registry::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct BalanceSheet {
    pub period: String,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub stockholders_equity: f64,
}

/// Narrow seam a concrete market-data backend must satisfy.
#[async_trait]
pub trait MarketDataBackend: Send + Sync {
    /// Look up the balance sheet for one exact ticker symbol (no
    /// normalization). `None` means the symbol has no data, not an error.
    async fn balance_sheet(&self, ticker: &str) -> Result<Option<BalanceSheet>, String>;
}

pub struct UnavailableBackend {
    pub reason: String,
}

#[async_trait]
impl MarketDataBackend for UnavailableBackend {
    async fn balance_sheet(&self, _ticker: &str) -> Result<Option<BalanceSheet>, String> {
        Err(self.reason.clone())
    }
}

/// `005930` -> `["005930", "005930.KS", "005930.KQ"]`; anything else is
/// tried as-is only.
fn ticker_candidates(ticker: &str) -> Vec<String> {
    let trimmed = ticker.trim();
    if trimmed.len() == 6 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        vec![
            trimmed.to_string(),
            format!("{trimmed}.KS"),
            format!("{trimmed}.KQ"),
        ]
    } else {
        vec![trimmed.to_string()]
    }
}

pub struct MarketDataTool {
    backend: Arc<dyn MarketDataBackend>,
}

impl MarketDataTool {
    pub fn new(backend: Arc<dyn MarketDataBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for MarketDataTool {
    fn name(&self) -> &str {
        "market_data"
    }

    fn description(&self) -> &str {
        "Fetch balance sheet fundamentals (total assets, total liabilities, stockholders \
         equity) for a stock ticker. Falls back to the most recent quarterly filing if no \
         annual data is available."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Stock ticker symbol, e.g. AAPL or a Korean 6-digit code"
                }
            },
            "required": ["ticker"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let ticker = match args["ticker"].as_str() {
            Some(t) => t,
            None => return ToolResult::err("Missing required parameter: ticker"),
        };

        let candidates = ticker_candidates(ticker);
        for candidate in &candidates {
            match self.backend.balance_sheet(candidate).await {
                Ok(Some(sheet)) => {
                    return ToolResult::ok(json!({
                        "ticker": candidate,
                        "period": sheet.period,
                        "total_assets": sheet.total_assets,
                        "total_liabilities": sheet.total_liabilities,
                        "stockholders_equity": sheet.stockholders_equity,
                    }));
                }
                Ok(None) => continue,
                Err(e) => return ToolResult::err(format!("Market data lookup failed: {e}")),
            }
        }

        let mut result = ToolResult::err("No balance sheet available for ticker");
        result
            .metadata
            .insert("tried".to_string(), json!(candidates));
        result
    }
}
