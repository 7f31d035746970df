//! ReAct Engine — drives the Thought/Action/Observation/FinalAnswer loop,
//! enforces step ordering, detects infinite loops, and emits a stream of
//! events.

use crate::config::EngineConfig;
use crate::parser::parse_action;
use crate::prompts;
use crate::state::{ReActState, Step};
use async_stream::stream;
use futures::Stream;
use reagent_core::{Event, EventType};
use reagent_llm::{ChatSession, LlmProvider, LlmTool, RateLimiter};
use reagent_tools::{ObservationOverride, ToolRegistry, ToolValue};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Per-run overrides for system-prompt resolution and optional stages.
#[derive(Clone, Debug, Default)]
pub struct SolveContext {
    /// Use this system prompt verbatim instead of building one from the
    /// tool catalog.
    pub system_prompt_override: Option<String>,
    /// When set and no override is given, use `system_context` (or a
    /// minimal fallback) instead of the default template.
    pub skip_default_prompt: bool,
    pub system_context: Option<String>,
    /// Skip the optional planning pass entirely.
    pub skip_planning: bool,
}

const MINIMAL_FALLBACK_PROMPT: &str = "You are a problem-solving agent. Use the available tools as needed.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StepKind {
    Thought,
    Action,
    Observation,
    FinalAnswer,
}

fn next_step_kind(state: &ReActState, max_thought_cycles: u32) -> StepKind {
    match state.last_step() {
        None => StepKind::Thought,
        Some(Step::Thought { .. }) => StepKind::Action,
        Some(Step::Action { .. }) => StepKind::Observation,
        Some(Step::Observation { .. }) => {
            if should_provide_final_answer(state, max_thought_cycles) {
                StepKind::FinalAnswer
            } else {
                StepKind::Thought
            }
        }
        Some(Step::FinalAnswer { .. }) => StepKind::FinalAnswer,
    }
}

fn should_provide_final_answer(state: &ReActState, max_thought_cycles: u32) -> bool {
    if state.thought_count() as u32 >= max_thought_cycles {
        return true;
    }
    let has_full_cycle = state.thought_count() > 0 && state.action_count() > 0 && state.observation_count() > 0;
    let latest = state.last_step().map(Step::content).unwrap_or("");
    if latest.contains("<next_task_required/>") {
        return false;
    }
    has_full_cycle && latest.contains("<final_answer_ready/>")
}

/// After at least 8 steps: ≥6 Actions with ≤2 distinct (lowercased) action
/// contents, or ≥4 Thoughts with ≥3 containing a completion phrase.
fn detect_infinite_loop(state: &ReActState, completion_phrases: &[&str]) -> bool {
    if state.steps.len() < 8 {
        return false;
    }
    let window = &state.steps[state.steps.len() - 8..];

    let actions: Vec<&str> = window
        .iter()
        .filter_map(|s| match s {
            Step::Action { content, .. } => Some(content.as_str()),
            _ => None,
        })
        .collect();
    if actions.len() >= 6 {
        let mut distinct: Vec<String> = actions.iter().map(|a| a.to_lowercase()).collect();
        distinct.sort();
        distinct.dedup();
        if distinct.len() <= 2 {
            return true;
        }
    }

    let thoughts: Vec<&str> = window
        .iter()
        .filter_map(|s| match s {
            Step::Thought { content, .. } => Some(content.as_str()),
            _ => None,
        })
        .collect();
    if thoughts.len() >= 4 {
        let matching = thoughts
            .iter()
            .filter(|t| {
                let lower = t.to_lowercase();
                completion_phrases.iter().any(|p| lower.contains(p))
            })
            .count();
        if matching >= 3 {
            return true;
        }
    }

    false
}

fn force_completion(state: &mut ReActState) {
    let summary = format!(
        "Unable to reach a final answer within the step budget. Best-effort summary of progress:\n{}",
        state.format_history()
    );
    state.set_final_answer(summary);
}

pub struct ReActEngine {
    provider: Arc<dyn LlmProvider>,
    limiter: Arc<RateLimiter>,
    tools: Arc<ToolRegistry>,
    model: String,
    config: EngineConfig,
    completion_phrases: Vec<&'static str>,
}

impl ReActEngine {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        limiter: Arc<RateLimiter>,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            limiter,
            tools,
            model: model.into(),
            config,
            completion_phrases: prompts::default_completion_phrases().into_keys().collect(),
        }
    }

    fn tool_catalog_defs(&self) -> Vec<LlmTool> {
        self.tools.get_definitions()
    }

    fn tool_catalog(&self) -> Vec<(&str, &str)> {
        self.tools.catalog()
    }

    fn resolve_system_prompt(&self, context: &SolveContext) -> String {
        if let Some(sp) = &context.system_prompt_override {
            return sp.clone();
        }
        if context.skip_default_prompt {
            return context
                .system_context
                .clone()
                .unwrap_or_else(|| MINIMAL_FALLBACK_PROMPT.to_string());
        }
        prompts::system_prompt(&self.tool_catalog())
    }

    /// Drive one full ReAct run, yielding events as they're produced.
    pub fn solve_stream(
        self: Arc<Self>,
        query: String,
        context: SolveContext,
    ) -> impl Stream<Item = Event> {
        stream! {
            let chat = Arc::new(
                ChatSession::new(self.provider.clone(), self.limiter.clone(), self.model.clone())
                    .with_tools(self.tool_catalog_defs()),
            );
            let system_prompt = self.resolve_system_prompt(&context);
            chat.start(system_prompt, Vec::new()).await;

            let mut state = ReActState::new(query.clone(), self.config.max_steps());

            yield Event::start(query.clone());

            if !context.skip_planning {
                let plan_prompt = prompts::planning_prompt(&query, &self.tool_catalog());
                match chat.send(plan_prompt).await {
                    Ok(reply) => {
                        let cleaned = prompts::strip_trailing_tool_call(&reply.content);
                        state.set_plan(cleaned.clone());
                        yield Event::new(EventType::Thought)
                            .with_content(cleaned)
                            .with_metadata("stage".to_string(), serde_json::json!("plan"));
                        chat.pop_last_turn_pair().await;
                    }
                    Err(e) => {
                        warn!(error = %e, "planning pass failed, continuing without a plan");
                    }
                }
            }

            let mut thought_cycle = 0u32;

            'main: while state.should_continue() {
                if detect_infinite_loop(&state, &self.completion_phrases) {
                    force_completion(&mut state);
                    break 'main;
                }

                let kind = next_step_kind(&state, self.config.react_max_thought_cycles);
                match kind {
                    StepKind::Thought => {
                        thought_cycle += 1;
                        let prompt = prompts::thought_prompt(&query, thought_cycle, self.config.react_max_thought_cycles);
                        match chat.send(prompt).await {
                            Ok(reply) => {
                                let parsed = prompts::parse_response(&reply.content);
                                state.add_thought(parsed.thought.clone());
                                yield Event::new(EventType::Thought).with_content(parsed.thought);
                            }
                            Err(e) => {
                                state.set_error(e.to_string());
                                yield Event::error(e.to_string());
                                break 'main;
                            }
                        }
                    }
                    StepKind::Action => {
                        let prompt = prompts::action_prompt();
                        match chat.send(prompt).await {
                            Ok(reply) => {
                                let parsed = prompts::parse_response(&reply.content);
                                let known: Vec<&str> = self.tools.list();
                                let (tool_name, tool_input) = parse_action(&parsed.action, &known);
                                state.add_action(parsed.action.clone(), tool_name.clone(), tool_input.clone());
                                let mut event = Event::new(EventType::Action).with_content(parsed.action);
                                if let Some(name) = tool_name {
                                    event.tool = Some(name);
                                }
                                if let Some(input) = tool_input {
                                    event.tool_input = Some(input);
                                }
                                yield event;
                            }
                            Err(e) => {
                                state.set_error(e.to_string());
                                yield Event::error(e.to_string());
                                break 'main;
                            }
                        }
                    }
                    StepKind::Observation => {
                        let (content, tool_output, error, tool_result, metadata) =
                            self.run_observation(&chat, &state).await;
                        state.add_observation(content.clone(), tool_output.clone(), error.clone(), metadata);
                        let mut event = Event::new(EventType::Observation).with_content(content);
                        event.tool_output = tool_output;
                        event.error = error;
                        event.tool_result = tool_result;
                        yield event;
                    }
                    StepKind::FinalAnswer => {
                        let prompt = prompts::final_answer_prompt(&query);
                        match chat.send(prompt).await {
                            Ok(reply) => {
                                let parsed = prompts::parse_response(&reply.content);
                                state.set_final_answer(parsed.final_answer);
                            }
                            Err(e) => {
                                state.set_error(e.to_string());
                                yield Event::error(e.to_string());
                                break 'main;
                            }
                        }
                    }
                }

                if state.current_step_count >= state.max_steps && !state.completed {
                    force_completion(&mut state);
                    break 'main;
                }
            }

            if state.error.is_none() && !state.completed {
                // should_continue() went false without a FinalAnswer step
                // (max_steps reached exactly on a non-final step).
                force_completion(&mut state);
            }

            if let Some(err) = &state.error {
                yield Event::error(err.clone());
            } else {
                let content = state.final_answer.clone().unwrap_or_default();
                yield Event::new(EventType::FinalAnswer)
                    .with_content(content)
                    .with_metadata("success".to_string(), serde_json::json!(true));
            }
            yield Event::end();
        }
    }

    /// Execute the Observation step for the action that was just recorded.
    /// Returns (content, tool_output, error, tool_result, metadata).
    async fn run_observation(
        &self,
        chat: &ChatSession,
        state: &ReActState,
    ) -> (String, Option<serde_json::Value>, Option<String>, Option<serde_json::Value>, HashMap<String, serde_json::Value>) {
        let Some(Step::Action { content, tool_name, tool_input, .. }) = state.last_step() else {
            return ("Non-tool action".to_string(), None, None, None, HashMap::new());
        };

        if tool_name.is_none() {
            let looks_malformed = content.contains("tool") && content.contains('{');
            if looks_malformed {
                let error_msg = "Could not parse a tool call from the action".to_string();
                let prompt = prompts::observation_prompt(false, "", Some(&error_msg));
                let summary = match chat.send(prompt).await {
                    Ok(reply) => reply.content,
                    Err(_) => error_msg.clone(),
                };
                return (summary, None, Some(error_msg), None, HashMap::new());
            }
            return ("Non-tool action".to_string(), None, None, None, HashMap::new());
        }

        let name = tool_name.clone().unwrap();
        let args = tool_input.clone().unwrap_or_else(|| serde_json::json!({}));
        let result = self.tools.execute_tool(&name, args).await;

        if let Some(obs) = result.value.as_observation() {
            let content = if obs.skip_llm {
                obs.observation_text.clone()
            } else {
                let output = serde_json::to_string(&obs.data).unwrap_or_default();
                let prompt = prompts::observation_prompt(result.success, &output, obs.error.as_deref());
                match chat.send(prompt).await {
                    Ok(reply) => reply.content,
                    Err(_) => obs.observation_text.clone(),
                }
            };
            let tool_output = if obs.store_output { Some(obs.data.clone()) } else { None };
            let tool_result = if obs.store_result {
                Some(observation_override_to_json(obs))
            } else {
                None
            };
            return (content, tool_output, obs.error.clone(), tool_result, result.metadata);
        }

        let output_text = result.output_text();
        let prompt = prompts::observation_prompt(result.success, &output_text, result.error.as_deref());
        let content = match chat.send(prompt).await {
            Ok(reply) => reply.content,
            Err(_) => output_text.clone(),
        };

        let tool_output = match &result.value {
            ToolValue::Json(v) => Some(v.clone()),
            ToolValue::Observation(_) => None,
        };
        let tool_result = Some(serde_json::json!({
            "success": result.success,
            "error": result.error,
        }));

        (content, tool_output, result.error.clone(), tool_result, result.metadata)
    }
}

fn observation_override_to_json(obs: &ObservationOverride) -> serde_json::Value {
    serde_json::json!({
        "data": obs.data,
        "observation_text": obs.observation_text,
        "error": obs.error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_step_cycles_through_thought_action_observation() {
        let mut state = ReActState::new("q", 40);
        assert_eq!(next_step_kind(&state, 10), StepKind::Thought);
        state.add_thought("t");
        assert_eq!(next_step_kind(&state, 10), StepKind::Action);
        state.add_action("a", Some("code_executor".to_string()), None);
        assert_eq!(next_step_kind(&state, 10), StepKind::Observation);
    }

    #[test]
    fn final_answer_ready_marker_triggers_completion_gate() {
        let mut state = ReActState::new("q", 40);
        state.add_thought("t");
        state.add_action("a", Some("code_executor".to_string()), None);
        state.add_observation("done <final_answer_ready/>", None, None, HashMap::new());
        assert!(should_provide_final_answer(&state, 10));
    }

    #[test]
    fn next_task_required_marker_forces_continuation() {
        let mut state = ReActState::new("q", 40);
        state.add_thought("t");
        state.add_action("a", Some("code_executor".to_string()), None);
        state.add_observation("more to do <next_task_required/>", None, None, HashMap::new());
        assert!(!should_provide_final_answer(&state, 10));
    }

    #[test]
    fn thought_cycle_ceiling_forces_final_answer() {
        let state = ReActState::new("q", 40);
        assert!(should_provide_final_answer(
            &{
                let mut s = state.clone();
                for _ in 0..10 {
                    s.add_thought("t");
                }
                s
            },
            10
        ));
    }

    #[test]
    fn repeated_identical_actions_trigger_loop_detection() {
        let mut state = ReActState::new("q", 40);
        for _ in 0..6 {
            state.add_action("same action", Some("code_executor".to_string()), None);
        }
        state.add_thought("t");
        state.add_thought("t");
        assert!(detect_infinite_loop(&state, &["solved"]));
    }

    #[test]
    fn diverse_recent_steps_do_not_trigger_loop_detection() {
        let mut state = ReActState::new("q", 40);
        for i in 0..8 {
            state.add_thought(format!("thought {i}"));
        }
        assert!(!detect_infinite_loop(&state, &["solved", "finished"]));
    }
}
