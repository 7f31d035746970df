//! LLM provider adapters, rate limiting, and stateful chat sessions.

pub mod anthropic;
pub mod chat_session;
pub mod provider;
pub mod rate_limiter;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use chat_session::{ChatReply, ChatSession};
pub use provider::{LlmError, LlmProvider, LlmResult, LlmStream};
pub use rate_limiter::{model_key, RateLimiter};
pub use types::*;
