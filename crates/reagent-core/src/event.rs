//! Event and session-record wire types shared by the engine, session manager,
//! persistence gateway and HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Kind of a streamed event — the `type` discriminant the ReAct engine
/// emits for every step.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Start,
    Thought,
    Action,
    Observation,
    FinalAnswer,
    Error,
    End,
}

/// A single event in a session's append-only stream.
///
/// `type` is always present; the rest are present iff applicable, matching
/// the wire shape described for the event stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl Event {
    pub fn new(kind: EventType) -> Self {
        Self {
            kind,
            content: None,
            timestamp: Utc::now(),
            tool: None,
            tool_input: None,
            tool_output: None,
            tool_result: None,
            error: None,
            metadata: HashMap::new(),
        }
    }

    pub fn start(query: impl Into<String>) -> Self {
        Self {
            content: Some(query.into()),
            ..Self::new(EventType::Start)
        }
    }

    pub fn end() -> Self {
        Self::new(EventType::End)
    }

    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            content: Some(message.clone()),
            error: Some(message),
            ..Self::new(EventType::Error)
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Lifecycle status of a session, per the Session data model.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Created,
    Running,
    Completed,
    Failed,
}

/// The stable external record persisted through the Persistence Gateway.
///
/// Field set matches the saved record schema: `{session_id, timestamp, query,
/// events, final_answer, success, duration_seconds, model, status,
/// created_at, completed_at, event_count, error}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    pub success: bool,
    pub duration_seconds: f64,
    pub model: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub event_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionRecord {
    /// Substring search over the fields the file and document-store backends
    /// both search: `query`, `final_answer`, and every event's `content`.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        if self.query.to_lowercase().contains(&needle) {
            return true;
        }
        if let Some(fa) = &self.final_answer {
            if fa.to_lowercase().contains(&needle) {
                return true;
            }
        }
        self.events.iter().any(|e| {
            e.content
                .as_ref()
                .is_some_and(|c| c.to_lowercase().contains(&needle))
        })
    }
}
