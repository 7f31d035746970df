//! Tests for reagent-llm: wire types, provider trait, rate limiter, and ChatSession

use reagent_llm::*;
use std::sync::Arc;

// ===========================================================================
// LlmRequest
// ===========================================================================

#[test]
fn llm_request_default() {
    let req = LlmRequest::default();
    assert!(req.model.contains("gemini"));
    assert!(req.messages.is_empty());
    assert!(req.tools.is_none());
    assert_eq!(req.max_tokens, Some(8192));
    assert!(req.temperature.is_none());
    assert!(req.system.is_none());
}

// ===========================================================================
// LlmContent
// ===========================================================================

#[test]
fn llm_content_from_string() {
    let c: LlmContent = "hello".into();
    match c {
        LlmContent::Text(s) => assert_eq!(s, "hello"),
        _ => panic!("Expected Text"),
    }
}

#[test]
fn llm_content_from_owned_string() {
    let c: LlmContent = String::from("world").into();
    match c {
        LlmContent::Text(s) => assert_eq!(s, "world"),
        _ => panic!("Expected Text"),
    }
}

#[test]
fn llm_content_text_serde() {
    let c = LlmContent::Text("hello".into());
    let json = serde_json::to_string(&c).unwrap();
    assert_eq!(json, r#""hello""#);
    let back: LlmContent = serde_json::from_str(&json).unwrap();
    match back {
        LlmContent::Text(s) => assert_eq!(s, "hello"),
        _ => panic!("Expected Text"),
    }
}

#[test]
fn llm_content_blocks_serde() {
    let c = LlmContent::Blocks(vec![ContentBlock::Text { text: "hi".into() }]);
    let json = serde_json::to_string(&c).unwrap();
    assert!(json.contains(r#""type":"text""#));
    let back: LlmContent = serde_json::from_str(&json).unwrap();
    match back {
        LlmContent::Blocks(blocks) => {
            assert_eq!(blocks.len(), 1);
            match &blocks[0] {
                ContentBlock::Text { text } => assert_eq!(text, "hi"),
                _ => panic!("Expected Text block"),
            }
        }
        _ => panic!("Expected Blocks"),
    }
}

// ===========================================================================
// ContentBlock
// ===========================================================================

#[test]
fn content_block_tool_use_serde() {
    let b = ContentBlock::ToolUse {
        id: "tc-1".into(),
        name: "read".into(),
        input: serde_json::json!({"path": "/tmp/foo"}),
    };
    let json = serde_json::to_string(&b).unwrap();
    assert!(json.contains(r#""type":"tool_use""#));
    let back: ContentBlock = serde_json::from_str(&json).unwrap();
    match back {
        ContentBlock::ToolUse { id, name, input } => {
            assert_eq!(id, "tc-1");
            assert_eq!(name, "read");
            assert_eq!(input["path"], "/tmp/foo");
        }
        _ => panic!("Expected ToolUse"),
    }
}

#[test]
fn content_block_tool_result_no_error_skipped() {
    let b = ContentBlock::ToolResult {
        tool_use_id: "tc-1".into(),
        content: "ok".into(),
        is_error: None,
    };
    let json = serde_json::to_string(&b).unwrap();
    assert!(!json.contains("is_error"));
}

// ===========================================================================
// LlmMessage
// ===========================================================================

#[test]
fn llm_message_user_and_assistant_constructors() {
    let u = LlmMessage::user("hi");
    assert_eq!(u.role, "user");
    assert_eq!(u.as_text(), "hi");

    let a = LlmMessage::assistant("hello back");
    assert_eq!(a.role, "assistant");
    assert_eq!(a.as_text(), "hello back");
}

#[test]
fn llm_message_as_text_joins_blocks() {
    let msg = LlmMessage {
        role: "assistant".into(),
        content: LlmContent::Blocks(vec![
            ContentBlock::Text { text: "part one ".into() },
            ContentBlock::ToolUse { id: "t1".into(), name: "noop".into(), input: serde_json::json!({}) },
            ContentBlock::Text { text: "part two".into() },
        ]),
    };
    assert_eq!(msg.as_text(), "part one part two");
}

// ===========================================================================
// AccumulatedToolCall
// ===========================================================================

#[test]
fn accumulated_tool_call_parse_valid() {
    let tc = AccumulatedToolCall {
        id: "tc-1".into(),
        name: "read".into(),
        arguments: r#"{"path":"/tmp/foo"}"#.into(),
    };
    let parsed = tc.parse_arguments().unwrap();
    assert_eq!(parsed["path"], "/tmp/foo");
}

#[test]
fn accumulated_tool_call_parse_invalid() {
    let tc = AccumulatedToolCall {
        id: "tc-1".into(),
        name: "read".into(),
        arguments: "not json".into(),
    };
    assert!(tc.parse_arguments().is_err());
}

// ===========================================================================
// Usage
// ===========================================================================

#[test]
fn usage_prefers_explicit_total() {
    let v = serde_json::json!({ "total_token_count": 42, "prompt_token_count": 10 });
    assert_eq!(Usage::from_value(&v).unwrap().total(), 42);
}

#[test]
fn usage_falls_back_to_sum() {
    let v = serde_json::json!({ "input_tokens": 3, "output_tokens": 4 });
    assert_eq!(Usage::from_value(&v).unwrap().total(), 7);
}

// ===========================================================================
// model_key / RateLimiter
// ===========================================================================

#[test]
fn model_key_normalizes_pro_variants() {
    assert_eq!(model_key("gemini-2.5-pro"), "gemini-2.5-pro");
    assert_eq!(model_key("models/gemini-2.5pro-latest"), "gemini-2.5-pro");
}

#[tokio::test]
async fn rate_limiter_wait_returns_immediately_with_no_history() {
    let limiter = RateLimiter::new();
    let start = std::time::Instant::now();
    limiter.wait_if_needed("gemini-2.5-flash").await;
    assert!(start.elapsed() < std::time::Duration::from_millis(50));
}

// ===========================================================================
// AnthropicProvider
// ===========================================================================

#[test]
fn anthropic_provider_name_and_models() {
    let provider = AnthropicProvider::new("fake-key");
    assert_eq!(provider.name(), "anthropic");
    assert!(!provider.models().is_empty());
}

#[test]
fn anthropic_provider_supports_model() {
    let provider = AnthropicProvider::new("fake-key");
    assert!(provider.supports_model("claude-haiku-4-5-20251001"));
    assert!(provider.supports_model("claude-opus-4-6-20250929-extra-suffix"));
    assert!(!provider.supports_model("gpt-4"));
}

// ===========================================================================
// ChatSession — driven by an in-process fake provider, no network
// ===========================================================================

struct EchoProvider;

#[async_trait::async_trait]
impl LlmProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    fn models(&self) -> &[&str] {
        &["echo-model"]
    }

    async fn complete_stream(&self, request: LlmRequest) -> LlmResult<LlmStream> {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.as_text())
            .unwrap_or_default();
        let deltas = vec![
            Ok(StreamDelta::Text(format!("echo: {last_user}"))),
            Ok(StreamDelta::Done {
                stop_reason: Some("end_turn".into()),
                usage: Some(Usage { input_tokens: 5, output_tokens: 5, total_tokens: None }),
            }),
        ];
        Ok(Box::pin(futures::stream::iter(deltas)))
    }
}

#[tokio::test]
async fn chat_session_send_appends_history_and_returns_reply() {
    let provider: Arc<dyn LlmProvider> = Arc::new(EchoProvider);
    let limiter = Arc::new(RateLimiter::new());
    let session = ChatSession::new(provider, limiter, "echo-model");
    session.start("be terse", Vec::new()).await;

    let reply = session.send("ping").await.unwrap();
    assert_eq!(reply.content, "echo: ping");
    assert_eq!(reply.usage.as_ref().unwrap().total(), 10);

    let history = session.history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, "user");
    assert_eq!(history[1].role, "assistant");
}

#[tokio::test]
async fn chat_session_pop_last_turn_pair_removes_two_messages() {
    let provider: Arc<dyn LlmProvider> = Arc::new(EchoProvider);
    let limiter = Arc::new(RateLimiter::new());
    let session = ChatSession::new(provider, limiter, "echo-model");
    session.start("be terse", Vec::new()).await;
    session.send("first").await.unwrap();
    session.send("second").await.unwrap();
    assert_eq!(session.history().await.len(), 4);

    session.pop_last_turn_pair().await;
    assert_eq!(session.history().await.len(), 2);
}
