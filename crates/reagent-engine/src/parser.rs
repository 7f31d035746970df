//! Action Parser — tolerant conversion of raw model text into
//! `(tool_name, args)` through a staged fallback chain. Never panics on
//! any input.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Result of parsing one Action step's raw text.
pub type ParsedAction = (Option<String>, Option<Value>);

static PYTHON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```python\s*\n?(.*?)```\s*$").unwrap());
static JSON_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*\n?(.*?)```").unwrap());
static TOOL_JSON_SLICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)\{[^{}]*"tool"[^{}]*"parameters".*?\}\}?"#).unwrap());
static TOOL_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:Tool:\s*|Use\s+|Execute\s+|Run\s+)([A-Za-z_][A-Za-z0-9_]*)"#).unwrap()
});
static INPUT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)(?:Input|Parameters):\s*(\{.*\})"#).unwrap());
static KEY_VALUE_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(\w+)\s*=\s*([^\s,]+)"#).unwrap());

/// Parse Action text through the staged fallback chain, first success wins.
pub fn parse_action(text: &str, known_tools: &[&str]) -> ParsedAction {
    if let Some((name, args)) = try_python_fence(text) {
        return (Some(name), Some(args));
    }
    match try_strict_json(text) {
        ParsedJson::Tool(name, args) => return (Some(name), Some(args)),
        ParsedJson::NonToolAction => return (None, None),
        ParsedJson::NotJson => {}
    }
    if let Some((name, args)) = try_progressive_repair(text) {
        return (Some(name), Some(args));
    }
    if let Some((name, args)) = try_yaml(text) {
        return (Some(name), Some(args));
    }
    if let Some((name, args)) = try_line_scraping(text) {
        return (Some(name), Some(args));
    }
    if let Some((name, args)) = try_keyword_pattern(text) {
        return (Some(name), Some(args));
    }
    if let Some(name) = try_emergency_scan(text, known_tools) {
        return (Some(name), Some(serde_json::json!({})));
    }
    (None, None)
}

fn try_python_fence(text: &str) -> Option<(String, Value)> {
    let caps = PYTHON_FENCE.captures(text.trim())?;
    let body = caps.get(1)?.as_str().to_string();
    Some(("code_executor".to_string(), serde_json::json!({ "code": body })))
}

enum ParsedJson {
    Tool(String, Value),
    NonToolAction,
    NotJson,
}

fn strip_json_fence(text: &str) -> String {
    if let Some(caps) = JSON_FENCE.captures(text) {
        if let Some(m) = caps.get(1) {
            return m.as_str().trim().to_string();
        }
    }
    text.trim().to_string()
}

fn interpret_json_value(value: &Value) -> ParsedJson {
    if let Some(obj) = value.as_object() {
        if let Some(name) = obj.get("tool").and_then(Value::as_str) {
            let args = obj.get("parameters").cloned().unwrap_or_else(|| serde_json::json!({}));
            return ParsedJson::Tool(name.to_string(), args);
        }
        if obj.contains_key("action") {
            return ParsedJson::NonToolAction;
        }
    }
    ParsedJson::NotJson
}

fn try_strict_json(text: &str) -> ParsedJson {
    let stripped = strip_json_fence(text);
    match serde_json::from_str::<Value>(&stripped) {
        Ok(value) => interpret_json_value(&value),
        Err(_) => ParsedJson::NotJson,
    }
}

fn try_progressive_repair(text: &str) -> Option<(String, Value)> {
    let stripped = strip_json_fence(text);

    for suffix in ["}", "}}"] {
        let candidate = format!("{stripped}{suffix}");
        if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
            if let ParsedJson::Tool(name, args) = interpret_json_value(&value) {
                return Some((name, args));
            }
        }
    }

    if let Some(m) = TOOL_JSON_SLICE.find(&stripped) {
        let mut slice = m.as_str().to_string();
        if !slice.ends_with("}}") && slice.matches('{').count() > slice.matches('}').count() {
            slice.push('}');
        }
        if let Ok(value) = serde_json::from_str::<Value>(&slice) {
            if let ParsedJson::Tool(name, args) = interpret_json_value(&value) {
                return Some((name, args));
            }
        }
    }

    if let Some(prefix) = first_balanced_brace_prefix(&stripped) {
        if let Ok(value) = serde_json::from_str::<Value>(&prefix) {
            if let ParsedJson::Tool(name, args) = interpret_json_value(&value) {
                return Some((name, args));
            }
        }
    }

    None
}

/// Scan for the first `{`, then return the substring up to the point its
/// braces balance back to zero, if any.
fn first_balanced_brace_prefix(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0i32;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(text[start..end].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn try_yaml(text: &str) -> Option<(String, Value)> {
    let stripped = strip_json_fence(text);
    let yaml_value: serde_yaml::Value = serde_yaml::from_str(&stripped).ok()?;
    let tool = yaml_value.get("tool")?.as_str()?.to_string();
    let parameters = yaml_value
        .get("parameters")
        .cloned()
        .unwrap_or(serde_yaml::Value::Mapping(Default::default()));
    let args = serde_json::to_value(parameters).unwrap_or_else(|_| serde_json::json!({}));
    Some((tool, args))
}

fn try_line_scraping(text: &str) -> Option<(String, Value)> {
    let mut tool_name = None;
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("tool:") {
            tool_name = Some(rest.trim().trim_matches('"').to_string());
        }
    }
    let tool_name = tool_name?;

    if let Some(caps) = INPUT_BLOCK.captures(text) {
        if let Ok(value) = serde_json::from_str::<Value>(caps.get(1)?.as_str()) {
            return Some((tool_name, value));
        }
    }

    let mut args = serde_json::Map::new();
    for line in text.lines() {
        let line = line.trim();
        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            if k == "tool" || k == "parameters" {
                continue;
            }
            if !k.is_empty() && k.chars().all(|c| c.is_alphanumeric() || c == '_') {
                args.insert(k.to_string(), Value::String(v.trim().to_string()));
            }
        }
    }
    Some((tool_name, Value::Object(args)))
}

fn try_keyword_pattern(text: &str) -> Option<(String, Value)> {
    let caps = TOOL_KEYWORD.captures(text)?;
    let name = caps.get(1)?.as_str().to_string();

    if let Some(block) = INPUT_BLOCK.captures(text) {
        if let Ok(value) = serde_json::from_str::<Value>(block.get(1)?.as_str()) {
            return Some((name, value));
        }
    }

    let mut args = serde_json::Map::new();
    for kv in KEY_VALUE_TAIL.captures_iter(text) {
        let key = kv.get(1)?.as_str().to_string();
        let value = kv.get(2)?.as_str().trim_matches('"').to_string();
        args.insert(key, Value::String(value));
    }
    Some((name, Value::Object(args)))
}

fn try_emergency_scan(text: &str, known_tools: &[&str]) -> Option<String> {
    let lower = text.to_lowercase();
    known_tools
        .iter()
        .find(|name| lower.contains(&name.to_lowercase()))
        .map(|name| name.to_string())
}
