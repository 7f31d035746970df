//! ReAct State — the in-memory record of one problem-solving run, as a
//! tagged variant per step kind so only Actions carry `tool_name`/
//! `tool_input` at the type level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One step in a ReAct run. Only `Action` carries tool fields; this is the
/// sum-type replacement for a step-type enum plus optional fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Step {
    Thought {
        content: String,
        timestamp: DateTime<Utc>,
    },
    Action {
        content: String,
        timestamp: DateTime<Utc>,
        tool_name: Option<String>,
        tool_input: Option<Value>,
    },
    Observation {
        content: String,
        timestamp: DateTime<Utc>,
        tool_output: Option<Value>,
        error: Option<String>,
        metadata: HashMap<String, Value>,
    },
    FinalAnswer {
        content: String,
        timestamp: DateTime<Utc>,
    },
}

impl Step {
    pub fn content(&self) -> &str {
        match self {
            Step::Thought { content, .. }
            | Step::Action { content, .. }
            | Step::Observation { content, .. }
            | Step::FinalAnswer { content, .. } => content,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Step::Thought { .. } => "Thought",
            Step::Action { .. } => "Action",
            Step::Observation { .. } => "Observation",
            Step::FinalAnswer { .. } => "Final Answer",
        }
    }
}

/// The full run record: query, ordered steps, plan, counters.
///
/// Invariants (enforced by the methods below, never by external mutation):
/// (a) steps alternate Thought→Action→Observation→(Thought|FinalAnswer), with
///     Thought first;
/// (b) every Action is immediately followed by exactly one Observation;
/// (c) `completed == (last step is FinalAnswer) == final_answer.is_some()`;
/// (d) `current_step_count <= max_steps`;
/// (e) once `completed` or `error.is_some()`, no further steps are appended.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReActState {
    pub query: String,
    pub steps: Vec<Step>,
    pub current_step_count: u32,
    pub max_steps: u32,
    pub completed: bool,
    pub final_answer: Option<String>,
    pub error: Option<String>,
    pub context: HashMap<String, Value>,
    pub plan: Option<String>,
}

impl ReActState {
    pub fn new(query: impl Into<String>, max_steps: u32) -> Self {
        Self {
            query: query.into(),
            steps: Vec::new(),
            current_step_count: 0,
            max_steps,
            completed: false,
            final_answer: None,
            error: None,
            context: HashMap::new(),
            plan: None,
        }
    }

    fn append(&mut self, step: Step) {
        if self.completed || self.error.is_some() {
            return;
        }
        self.current_step_count += 1;
        self.steps.push(step);
    }

    pub fn add_thought(&mut self, content: impl Into<String>) {
        self.append(Step::Thought {
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn add_action(
        &mut self,
        content: impl Into<String>,
        tool_name: Option<String>,
        tool_input: Option<Value>,
    ) {
        self.append(Step::Action {
            content: content.into(),
            timestamp: Utc::now(),
            tool_name,
            tool_input,
        });
    }

    pub fn add_observation(
        &mut self,
        content: impl Into<String>,
        tool_output: Option<Value>,
        error: Option<String>,
        metadata: HashMap<String, Value>,
    ) {
        self.append(Step::Observation {
            content: content.into(),
            timestamp: Utc::now(),
            tool_output,
            error,
            metadata,
        });
    }

    /// Generic append used by tests and the engine's non-tool-observation
    /// path; same ordering invariant as `add_observation`.
    pub fn add_step(&mut self, step: Step) {
        self.append(step);
    }

    pub fn set_final_answer(&mut self, content: impl Into<String>) {
        let content = content.into();
        self.final_answer = Some(content.clone());
        self.append(Step::FinalAnswer {
            content,
            timestamp: Utc::now(),
        });
        self.completed = true;
    }

    pub fn set_plan(&mut self, plan: impl Into<String>) {
        self.plan = Some(plan.into());
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub fn should_continue(&self) -> bool {
        !self.completed && self.error.is_none() && self.current_step_count < self.max_steps
    }

    pub fn last_step(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// Count of Thought steps so far — drives the completion gate and the
    /// planning-pass bookkeeping.
    pub fn thought_count(&self) -> usize {
        self.steps.iter().filter(|s| matches!(s, Step::Thought { .. })).count()
    }

    pub fn action_count(&self) -> usize {
        self.steps.iter().filter(|s| matches!(s, Step::Action { .. })).count()
    }

    pub fn observation_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, Step::Observation { .. }))
            .count()
    }

    /// Human-readable dump used as prompt context:
    /// "Thought k: …", "Action k: … (Tool: X)", "Observation k: …", "Final Answer: …".
    pub fn format_history(&self) -> String {
        let mut thought_n = 0;
        let mut action_n = 0;
        let mut observation_n = 0;
        let mut lines = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            let line = match step {
                Step::Thought { content, .. } => {
                    thought_n += 1;
                    format!("Thought {thought_n}: {content}")
                }
                Step::Action {
                    content, tool_name, ..
                } => {
                    action_n += 1;
                    match tool_name {
                        Some(name) => format!("Action {action_n}: {content} (Tool: {name})"),
                        None => format!("Action {action_n}: {content}"),
                    }
                }
                Step::Observation { content, .. } => {
                    observation_n += 1;
                    format!("Observation {observation_n}: {content}")
                }
                Step::FinalAnswer { content, .. } => format!("Final Answer: {content}"),
            };
            lines.push(line);
        }

        lines.join("\n")
    }

    pub fn serialize(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn deserialize(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}
