//! Shared application state handed to every route.

use reagent_engine::{EngineConfig, ReActEngine, SessionManager, SessionRepository, SolveContext};
use reagent_llm::{LlmProvider, RateLimiter};
use reagent_tools::ToolRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn LlmProvider>,
    pub limiter: Arc<RateLimiter>,
    pub tools: Arc<ToolRegistry>,
    pub config: EngineConfig,
    pub manager: Arc<SessionManager>,
    pub repository: Arc<dyn SessionRepository>,
}

impl AppState {
    /// Resolve the model a session request asked for (falling back to the
    /// configured default for an absent or unsupported name) and build a
    /// fresh engine bound to it. Building one per session is cheap: every
    /// field is an `Arc` clone plus the owned config/model strings.
    pub fn engine_for(&self, requested_model: Option<&str>) -> (Arc<ReActEngine>, String) {
        let model = match requested_model {
            Some(m) if self.config.model_supported(m) => m.to_string(),
            _ => self.config.agent_model.clone(),
        };
        let engine = Arc::new(ReActEngine::new(
            self.provider.clone(),
            self.limiter.clone(),
            self.tools.clone(),
            model.clone(),
            self.config.clone(),
        ));
        (engine, model)
    }

    /// Map the request body's `context` field onto `SolveContext`: when
    /// present it replaces the default tool-catalog system prompt outright
    /// (there is no partial-override shape in `SolveContext`), otherwise the
    /// engine builds its usual default.
    pub fn solve_context(&self, system_context: Option<String>) -> SolveContext {
        match system_context {
            Some(text) => SolveContext {
                skip_default_prompt: true,
                system_context: Some(text),
                ..SolveContext::default()
            },
            None => SolveContext::default(),
        }
    }
}
