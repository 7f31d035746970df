//! Tests for reagent-core: SessionKey, Event/EventType, SessionRecord, Error

use chrono::{TimeZone, Utc};
use reagent_core::*;

// ===========================================================================
// SessionKey
// ===========================================================================

#[test]
fn session_key_new_and_display() {
    let key = SessionKey::new("abc-123");
    assert_eq!(key.as_str(), "abc-123");
    assert_eq!(format!("{}", key), "abc-123");
}

#[test]
fn session_key_clone_is_cheap() {
    let key = SessionKey::new("test");
    let cloned = key.clone();
    assert_eq!(key, cloned);
    assert_eq!(key.as_str(), cloned.as_str());
}

#[test]
fn session_key_from_string() {
    let key: SessionKey = "hello".into();
    assert_eq!(key.as_str(), "hello");
    let key2: SessionKey = String::from("world").into();
    assert_eq!(key2.as_str(), "world");
}

#[test]
fn session_key_equality_and_hash() {
    use std::collections::HashSet;
    let a = SessionKey::new("same");
    let b = SessionKey::new("same");
    let c = SessionKey::new("different");
    assert_eq!(a, b);
    assert_ne!(a, c);
    let mut set = HashSet::new();
    set.insert(a.clone());
    assert!(set.contains(&b));
    assert!(!set.contains(&c));
}

#[test]
fn session_key_generate_disambiguates_collisions() {
    let t = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    let a = SessionKey::generate(t);
    let b = SessionKey::generate(t);
    assert_ne!(a, b);
    assert!(a.as_str().starts_with("chat_20260102_030405"));
    assert!(b.as_str().starts_with("chat_20260102_030405"));
}

// ===========================================================================
// EventType / Event
// ===========================================================================

#[test]
fn event_type_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&EventType::FinalAnswer).unwrap(), r#""final_answer""#);
    assert_eq!(serde_json::to_string(&EventType::Start).unwrap(), r#""start""#);
}

#[test]
fn event_start_carries_query_as_content() {
    let e = Event::start("what is 2+2?");
    assert_eq!(e.kind, EventType::Start);
    assert_eq!(e.content.as_deref(), Some("what is 2+2?"));
}

#[test]
fn event_error_sets_both_content_and_error() {
    let e = Event::error("boom");
    assert_eq!(e.kind, EventType::Error);
    assert_eq!(e.content.as_deref(), Some("boom"));
    assert_eq!(e.error.as_deref(), Some("boom"));
}

#[test]
fn event_with_metadata_and_content() {
    let e = Event::new(EventType::Thought)
        .with_content("thinking")
        .with_metadata("stage", serde_json::json!("plan"));
    assert_eq!(e.content.as_deref(), Some("thinking"));
    assert_eq!(e.metadata.get("stage"), Some(&serde_json::json!("plan")));
}

#[test]
fn event_serde_roundtrip_omits_absent_optionals() {
    let e = Event::end();
    let json = serde_json::to_string(&e).unwrap();
    assert!(!json.contains("\"tool\""));
    assert!(!json.contains("\"metadata\""));
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back.kind, EventType::End);
}

#[test]
fn event_serde_roundtrip_keeps_content_and_error() {
    let e = Event::error("disk full");
    let json = serde_json::to_string(&e).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back.content.as_deref(), Some("disk full"));
    assert_eq!(back.error.as_deref(), Some("disk full"));
}

// ===========================================================================
// SessionRecord
// ===========================================================================

fn sample_record() -> SessionRecord {
    SessionRecord {
        session_id: "chat_20260101_000000".to_string(),
        timestamp: Utc::now(),
        query: "what is the balance sheet of Acme Corp?".to_string(),
        events: vec![Event::new(EventType::Thought).with_content("checking filings")],
        final_answer: Some("Acme's total assets are $1B".to_string()),
        success: true,
        duration_seconds: 3.5,
        model: "claude-opus-4-6".to_string(),
        status: SessionStatus::Completed,
        created_at: Utc::now(),
        completed_at: Some(Utc::now()),
        event_count: 1,
        error: None,
    }
}

#[test]
fn session_record_matches_query_case_insensitively() {
    let record = sample_record();
    assert!(record.matches("ACME CORP"));
    assert!(record.matches("balance sheet"));
}

#[test]
fn session_record_matches_final_answer_and_event_content() {
    let record = sample_record();
    assert!(record.matches("total assets"));
    assert!(record.matches("checking filings"));
    assert!(!record.matches("nonexistent needle"));
}

#[test]
fn session_record_serde_roundtrip() {
    let record = sample_record();
    let json = serde_json::to_string(&record).unwrap();
    let back: SessionRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back.session_id, record.session_id);
    assert_eq!(back.events.len(), 1);
    assert_eq!(back.status, SessionStatus::Completed);
}

#[test]
fn session_record_omits_absent_final_answer_and_error() {
    let mut record = sample_record();
    record.final_answer = None;
    record.error = None;
    let json = serde_json::to_string(&record).unwrap();
    assert!(!json.contains("final_answer"));
    assert!(!json.contains("\"error\""));
}

// ===========================================================================
// Error
// ===========================================================================

#[test]
fn error_llm_error_constructor() {
    let e = Error::llm_error("anthropic", "rate limited");
    assert!(e.to_string().contains("anthropic"));
    assert!(e.to_string().contains("rate limited"));
}

#[test]
fn error_tool_error_constructor() {
    let e = Error::tool_error("web_search", "not configured");
    assert!(e.to_string().contains("web_search"));
    assert!(e.to_string().contains("not configured"));
}

#[test]
fn error_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let e: Error = io_err.into();
    assert!(matches!(e, Error::IoError(_)));
}

#[test]
fn error_from_json() {
    let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
    let e: Error = json_err.into();
    assert!(matches!(e, Error::JsonError(_)));
}

#[test]
fn error_display_all_variants() {
    let errors: Vec<Error> = vec![
        Error::SessionNotFound("x".into()),
        Error::DuplicateTool("x".into()),
        Error::LlmError { provider: "p".into(), message: "m".into() },
        Error::ToolError { name: "n".into(), message: "m".into() },
        Error::ConfigError("x".into()),
        Error::PersistenceError("x".into()),
        Error::Internal("x".into()),
    ];
    for e in errors {
        assert!(!format!("{e}").is_empty());
    }
}
