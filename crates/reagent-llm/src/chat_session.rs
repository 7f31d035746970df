//! Stateful multi-turn chat session bound to one model, rate-limited and
//! streaming-capable.

use crate::provider::{LlmProvider, LlmResult};
use crate::rate_limiter::RateLimiter;
use crate::types::{LlmMessage, LlmRequest, LlmTool, StreamDelta, Usage};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Result of a single `send`/`stream` call.
#[derive(Clone, Debug)]
pub struct ChatReply {
    pub content: String,
    pub usage: Option<Usage>,
}

/// A stateful conversation: system prompt + running message history, bound
/// to one model and bracketed by the shared rate limiter on every call.
pub struct ChatSession {
    provider: Arc<dyn LlmProvider>,
    limiter: Arc<RateLimiter>,
    model: String,
    tools: Option<Vec<LlmTool>>,
    system_prompt: RwLock<Option<String>>,
    history: RwLock<Vec<LlmMessage>>,
}

impl ChatSession {
    pub fn new(provider: Arc<dyn LlmProvider>, limiter: Arc<RateLimiter>, model: impl Into<String>) -> Self {
        Self {
            provider,
            limiter,
            model: model.into(),
            tools: None,
            system_prompt: RwLock::new(None),
            history: RwLock::new(Vec::new()),
        }
    }

    pub fn with_tools(mut self, tools: Vec<LlmTool>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Instantiate with a system instruction and any initial turns.
    pub async fn start(&self, system_prompt: impl Into<String>, initial_messages: Vec<LlmMessage>) {
        *self.system_prompt.write().await = Some(system_prompt.into());
        *self.history.write().await = initial_messages;
    }

    pub async fn history(&self) -> Vec<LlmMessage> {
        self.history.read().await.clone()
    }

    /// Remove the last two turns (assistant then user) — used to prune a
    /// planning pass out of the conversational history after the fact.
    pub async fn pop_last_turn_pair(&self) {
        let mut history = self.history.write().await;
        history.pop();
        history.pop();
    }

    async fn build_request(&self, messages: Vec<LlmMessage>) -> LlmRequest {
        LlmRequest {
            model: self.model.clone(),
            messages,
            tools: self.tools.clone(),
            max_tokens: Some(8192),
            temperature: None,
            system: self.system_prompt.read().await.clone(),
        }
    }

    /// Append a user message, call the model non-streaming (collecting the
    /// stream to completion), append the assistant reply, and return it.
    /// Brackets the call with `wait_if_needed`/`record_usage`.
    pub async fn send(&self, message: impl Into<String>) -> LlmResult<ChatReply> {
        let message = LlmMessage::user(message.into());
        self.history.write().await.push(message);
        let (content, chunks, usage) = self.call_model().await?;
        let _ = chunks;
        self.history
            .write()
            .await
            .push(LlmMessage::assistant(content.clone()));
        Ok(ChatReply { content, usage })
    }

    /// Stream text chunks for the same conversational turn; falls back to
    /// yielding the single joined result if the provider produced no
    /// intermediate text chunks (vendor sent the whole reply as one delta).
    pub async fn stream_collect(&self, message: impl Into<String>) -> LlmResult<Vec<String>> {
        let message = LlmMessage::user(message.into());
        self.history.write().await.push(message);
        let (content, chunks, _usage) = self.call_model().await?;
        self.history
            .write()
            .await
            .push(LlmMessage::assistant(content.clone()));
        if chunks.is_empty() {
            Ok(vec![content])
        } else {
            Ok(chunks)
        }
    }

    /// Issue one model call against the current history, brackets it with
    /// the rate limiter, and returns (joined content, text chunks, usage).
    /// Does not mutate history — callers append the resulting turn.
    async fn call_model(&self) -> LlmResult<(String, Vec<String>, Option<Usage>)> {
        self.limiter.wait_if_needed(&self.model).await;

        let request = self.build_request(self.history.read().await.clone()).await;
        let mut stream = self.provider.complete_stream(request).await?;

        let mut chunks = Vec::new();
        let mut usage = None;
        use futures::StreamExt;
        while let Some(delta) = stream.next().await {
            match delta? {
                StreamDelta::Text(t) => chunks.push(t),
                StreamDelta::Done { usage: u, .. } => usage = u,
                StreamDelta::Error(e) => return Err(crate::provider::LlmError::StreamError(e)),
                _ => {}
            }
        }

        if let Some(u) = &usage {
            self.limiter.record_usage(&self.model, u.total() as u64).await;
        }

        let content = chunks.concat();
        Ok((content, chunks, usage))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}
