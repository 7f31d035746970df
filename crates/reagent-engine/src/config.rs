//! Engine configuration, read from the environment via plain
//! `std::env::var` lookups with typed defaults.

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Default model used when a session doesn't request one explicitly.
    pub agent_model: String,
    /// Models a request is allowed to ask for.
    pub supported_models: Vec<String>,
    /// Per-action retry cap (parsing/tool retries within one Action step).
    pub react_max_retries: u32,
    /// Drives `max_steps = react_max_thought_cycles * 4`.
    pub react_max_thought_cycles: u32,
    pub code_execution_timeout: Duration,
    pub mongodb_enabled: bool,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    pub mongodb_collection: String,
    pub google_api_key: Option<String>,
    pub pplx_api_key: Option<String>,
    pub log_level: String,
    pub log_file: Option<String>,
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_var(key).unwrap_or_else(|| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_var(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let supported_models = env_var("SUPPORTED_MODELS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|| vec!["gemini-2.5-flash".to_string(), "gemini-2.5-pro".to_string()]);

        Self {
            agent_model: env_or("AGENT_MODEL", "gemini-2.5-flash"),
            supported_models,
            react_max_retries: env_parsed("REACT_MAX_RETRIES", 3),
            react_max_thought_cycles: env_parsed("REACT_MAX_THOUGHT_CYCLES", 10),
            code_execution_timeout: Duration::from_secs(env_parsed("CODE_EXECUTION_TIMEOUT", 30)),
            mongodb_enabled: env_parsed("MONGODB_ENABLED", false),
            mongodb_uri: env_var("MONGODB_URI"),
            mongodb_database: env_or("MONGODB_DATABASE", "reagent"),
            mongodb_collection: env_or("MONGODB_COLLECTION", "sessions"),
            google_api_key: env_var("GOOGLE_API_KEY"),
            pplx_api_key: env_var("PPLX_API_KEY"),
            log_level: env_or("LOG_LEVEL", "info"),
            log_file: env_var("LOG_FILE"),
        }
    }

    /// `max_steps = max_thought_cycles * 4`, per the ReAct State invariant.
    pub fn max_steps(&self) -> u32 {
        self.react_max_thought_cycles * 4
    }

    pub fn model_supported(&self, model: &str) -> bool {
        self.supported_models.iter().any(|m| m == model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_steps_is_four_times_thought_cycles() {
        let mut cfg = EngineConfig::default();
        cfg.react_max_thought_cycles = 10;
        assert_eq!(cfg.max_steps(), 40);
    }
}
