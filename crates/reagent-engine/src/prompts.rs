//! Prompt templates — string builders for every step the engine takes, plus
//! a tolerant response cleaner.

use chrono::Utc;
use std::collections::HashMap;

/// `(name, description)` pairs rendered into the tool catalog section of the
/// system prompt.
pub fn format_tool_catalog(tools: &[(&str, &str)]) -> String {
    tools
        .iter()
        .map(|(name, desc)| format!("- {name}: {desc}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// System prompt: current date, tool catalog, strict output rules.
pub fn system_prompt(tools: &[(&str, &str)]) -> String {
    let date = Utc::now().format("%Y-%m-%d");
    format!(
        "You are a problem-solving agent. Today's date is {date}.\n\n\
         Available tools:\n{}\n\n\
         Output rules: when you want to call a tool, respond with EITHER a fenced \
         ```python code block (routed to the code_executor tool) OR a single valid \
         JSON object of the shape {{\"tool\": \"<name>\", \"parameters\": {{...}}}}. \
         For a Thought, Observation, or Final Answer step, respond with plain text only.",
        format_tool_catalog(tools)
    )
}

/// Planning prompt (optional pre-loop pass): asks for a short plan, prose
/// only — any trailing tool-call block is stripped by `strip_trailing_tool_call`.
pub fn planning_prompt(query: &str, tools: &[(&str, &str)]) -> String {
    format!(
        "Given the query: \"{query}\"\n\nAnd the available tools:\n{}\n\n\
         Produce a short plan (a few sentences of prose, no tool calls) describing \
         how you will approach this problem.",
        format_tool_catalog(tools)
    )
}

/// Strip a trailing fenced code block or JSON tool-call object from plan
/// prose, since the plan is meant to be prose only.
pub fn strip_trailing_tool_call(text: &str) -> String {
    let trimmed = text.trim_end();
    if let Some(idx) = trimmed.rfind("```") {
        if let Some(start) = trimmed[..idx].rfind("```") {
            return trimmed[..start].trim_end().to_string();
        }
    }
    if let (Some(obj_start), true) = (trimmed.rfind('{'), trimmed.trim_end().ends_with('}')) {
        let candidate = &trimmed[obj_start..];
        if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
            return trimmed[..obj_start].trim_end().to_string();
        }
    }
    trimmed.to_string()
}

/// Thought prompt: original query plus the current thought-cycle count.
pub fn thought_prompt(query: &str, cycle: u32, max_cycles: u32) -> String {
    format!(
        "Original query: \"{query}\"\n\nThought cycle {cycle}/{max_cycles}. \
         What is your next reasoning step toward answering this query?"
    )
}

/// Action prompt: restates the output rules and the current time.
pub fn action_prompt() -> String {
    let now = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    format!(
        "Current time: {now}.\n\nChoose an action. Respond with EITHER a fenced \
         ```python code block OR a single JSON object {{\"tool\": \"<name>\", \
         \"parameters\": {{...}}}}."
    )
}

/// Observation prompt: echoes the tool's success/output/error.
pub fn observation_prompt(success: bool, output: &str, error: Option<&str>) -> String {
    let mut prompt = format!("Tool result — success: {success}\nOutput: {output}\n");
    if let Some(err) = error {
        prompt.push_str(&format!("Error: {err}\n"));
    }
    prompt.push_str(
        "Summarize this observation for the reasoning trace. End your response with \
         either <next_task_required/> if more work remains, or <final_answer_ready/> \
         if you can now answer the original query.",
    );
    prompt
}

/// Final-answer prompt: echoes the original query, asks for the final response.
pub fn final_answer_prompt(original_query: &str) -> String {
    format!(
        "Original query: \"{original_query}\"\n\n\
         Based on everything gathered so far, provide the final answer to the query."
    )
}

/// Parsed response fields — all initially hold the same cleaned text so the
/// engine can pick whichever field matches the step type it's executing.
#[derive(Clone, Debug)]
pub struct ParsedResponse {
    pub thought: String,
    pub action: String,
    pub observation: String,
    pub final_answer: String,
}

const ROLE_LABELS: &[&str] = &["Thought:", "Action:", "Observation:", "Final Answer:", "Answer:"];

/// Strip a leading role label ("Thought:", "Action:", …) and surrounding
/// whitespace. Never panics on any input, including empty strings.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let mut cleaned = raw.trim();
    for label in ROLE_LABELS {
        if let Some(rest) = cleaned.strip_prefix(label) {
            cleaned = rest.trim_start();
            break;
        }
    }
    let cleaned = cleaned.to_string();
    ParsedResponse {
        thought: cleaned.clone(),
        action: cleaned.clone(),
        observation: cleaned.clone(),
        final_answer: cleaned,
    }
}

/// Completion-phrase list used by the infinite-loop heuristic, treated as
/// configuration per the source's note that these are English-specific.
pub fn default_completion_phrases() -> HashMap<&'static str, ()> {
    [
        "problem has been",
        "task is complete",
        "already provided",
        "no further steps",
        "solved",
        "finished",
    ]
    .into_iter()
    .map(|p| (p, ()))
    .collect()
}
