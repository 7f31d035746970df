//! LLM Provider trait — the vendor seam. Concrete vendor SDKs are an external
//! collaborator; only this trait and one reference HTTP/SSE implementation
//! live in this workspace.

use crate::types::{LlmRequest, StreamDelta};
use futures::Stream;
use std::pin::Pin;

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// LLM error types
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Stream type for LLM responses
pub type LlmStream = Pin<Box<dyn Stream<Item = LlmResult<StreamDelta>> + Send>>;

/// A stateless adapter to one vendor's completion API.
///
/// `ChatSession` (see `chat_session.rs`) is the stateful seam the rest of the
/// engine talks to; this trait is the narrow interface a vendor SDK must
/// satisfy underneath it.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;
    fn models(&self) -> &[&str];

    fn supports_model(&self, model: &str) -> bool {
        self.models()
            .iter()
            .any(|m| *m == model || model.starts_with(m))
    }

    /// Stream a completion response as a sequence of deltas, terminated by
    /// `StreamDelta::Done`.
    async fn complete_stream(&self, request: LlmRequest) -> LlmResult<LlmStream>;
}
