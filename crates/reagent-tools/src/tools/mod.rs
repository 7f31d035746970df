pub mod code_executor;
pub mod final_answer;
pub mod fs;
pub mod market_data;
pub mod sec_filings;
pub mod web_search;

pub use code_executor::CodeExecutorTool;
pub use final_answer::FinalAnswerTool;
pub use fs::FsTool;
pub use market_data::{MarketDataBackend, MarketDataTool};
pub use sec_filings::{SecFilingsBackend, SecFilingsTool};
pub use web_search::{WebSearchBackend, WebSearchTool};
