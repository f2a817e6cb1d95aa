//! Mode Manager switch procedure (spec §4.3).
//!
//! Resolved against `original_source/agent/dak_agent/mode_manager.py`: the
//! meta-prompt is a fixed template asking for `{instruction, selected_tools,
//! selected_skills}` JSON, and any meta-LLM failure or malformed JSON keeps
//! the previous Mode rather than aborting the turn.

use std::collections::HashSet;

use aar_foundation::{McpClient, SkillRegistry};
use aar_kernel::llm::{LlmProvider, LlmRequest};
use aar_kernel::mode::Mode;
use aar_kernel::tool::{ToolDescriptor, ToolSet, ToolSource};
use aar_kernel::turn::Turn;
use serde::Deserialize;
use serde_json::json;

const ESCAPE_HATCH_CLAUSE: &str = "If your tool set ever feels insufficient, call `switch_mode` with a reason and the runtime will reconfigure your instruction and tools around a new focus.";

#[derive(Debug, Deserialize)]
struct MetaLlmContract {
    instruction: String,
    #[serde(default)]
    selected_tools: Vec<String>,
    #[serde(default)]
    selected_skills: Vec<String>,
}

/// Builds the short conversation summary the meta-prompt embeds: the last
/// 5 turns, each truncated to ~100 characters (spec §4.3 step 1).
pub fn summarize_recent_turns(turns: &[Turn]) -> String {
    turns
        .iter()
        .rev()
        .take(5)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(|turn| {
            let rendered = match turn {
                Turn::UserMessage { text } => format!("user: {text}"),
                Turn::ModelMessage { parts } => format!("model: {} part(s)", parts.len()),
                Turn::ToolCall { name, .. } => format!("tool_call: {name}"),
                Turn::ToolResult { name, .. } => format!("tool_result: {name}"),
            };
            truncate(&rendered, 100)
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

fn build_meta_prompt(summary: &str, candidate_tools: &ToolSet, skills: &SkillRegistry) -> String {
    let tool_names: Vec<String> = candidate_tools.names().into_iter().collect();
    let skill_names = skills.names();
    format!(
        "You are the Mode Manager for a long-running agent session.\n\
         Conversation summary: {summary}\n\
         Candidate tools: {tools}\n\
         Candidate skills: {skills}\n\
         Respond with a single JSON object: {{\"instruction\": string, \"selected_tools\": string[], \"selected_skills\": string[]}}.\n\
         The instruction MUST include this escape-hatch clause verbatim: \"{ESCAPE_HATCH_CLAUSE}\"",
        tools = tool_names.join(", "),
        skills = skill_names.join(", "),
    )
}

/// Runs the meta-LLM switch procedure and returns the new Mode, or `None`
/// on failure/timeout/malformed JSON — the caller keeps the previous Mode
/// in that case (spec §4.3 step 4, §9 fallback requirement).
pub async fn switch(
    meta_llm: &dyn LlmProvider,
    meta_llm_timeout_secs: u64,
    summary: &str,
    builtin_tools: &ToolSet,
    mcp: Option<&McpClient>,
    skills: &SkillRegistry,
) -> Option<Mode> {
    let mcp_candidate_tools = match mcp {
        Some(client) => client.list_tools().await.unwrap_or_default(),
        None => Vec::new(),
    };
    let mut candidate_tools = builtin_tools.clone();
    candidate_tools.extend(mcp_candidate_tools.clone());

    let prompt = build_meta_prompt(summary, &candidate_tools, skills);
    let request = LlmRequest { instruction: prompt, turns: Vec::new(), tool_schemas: Vec::new(), json_mode: true };

    let response = match tokio::time::timeout(std::time::Duration::from_secs(meta_llm_timeout_secs), meta_llm.complete(request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "Meta-Agent failed: reverting to current configuration");
            return None;
        }
        Err(_) => {
            tracing::warn!("Meta-Agent call exceeded its {meta_llm_timeout_secs}s budget: reverting to current configuration");
            return None;
        }
    };

    let raw_json = response.parts.iter().find_map(|part| match part {
        aar_kernel::turn::MessagePart::Text { text } => Some(text.clone()),
        _ => None,
    })?;

    let contract: MetaLlmContract = match serde_json::from_str(&raw_json) {
        Ok(c) => c,
        Err(err) => {
            tracing::warn!(error = %err, "Meta-Agent returned malformed JSON: reverting to current configuration");
            return None;
        }
    };

    let selected_tool_names: HashSet<String> = contract.selected_tools.into_iter().collect();
    let mut active_tool_set = builtin_tools.clone();

    for descriptor in mcp_candidate_tools {
        if selected_tool_names.contains(&descriptor.name) {
            active_tool_set.insert(descriptor);
        }
    }

    let mut instruction_text = contract.instruction;
    for skill_name in &contract.selected_skills {
        if let Some(bundle) = skills.get(skill_name) {
            for tool_name in &bundle.tool_names {
                active_tool_set.insert(ToolDescriptor {
                    source: ToolSource::SkillLocal,
                    ..ToolDescriptor::builtin(tool_name.clone(), format!("provided by skill '{skill_name}'"), json!({}))
                });
            }
            instruction_text.push_str(&format!("\n\n{}", bundle.instructions_markdown));
        }
    }

    Some(Mode { instruction_text, active_tool_set, active_skills: contract.selected_skills })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aar_kernel::llm::FakeLlmProvider;
    use aar_kernel::turn::MessagePart;
    use crate::tools::builtin_tool_set;

    fn json_response(body: serde_json::Value) -> aar_kernel::llm::LlmResponse {
        aar_kernel::llm::LlmResponse { parts: vec![MessagePart::Text { text: body.to_string() }], token_count: 0 }
    }

    #[tokio::test]
    async fn successful_switch_builds_new_mode() {
        let provider = FakeLlmProvider::new(vec![json_response(json!({
            "instruction": format!("Focus on files. {ESCAPE_HATCH_CLAUSE}"),
            "selected_tools": ["read_file"],
            "selected_skills": [],
        }))]);

        let builtins = builtin_tool_set();
        let mode = switch(&provider, 5, "summary", &builtins, None, &SkillRegistry::empty()).await;
        assert!(mode.is_some());
        let mode = mode.unwrap();
        assert!(mode.instruction_text.contains("Focus on files"));
        assert!(mode.has_escape_hatch());
    }

    #[tokio::test]
    async fn failed_meta_llm_call_returns_none() {
        let provider = FakeLlmProvider::new(vec![]);
        let builtins = builtin_tool_set();
        let mode = switch(&provider, 5, "summary", &builtins, None, &SkillRegistry::empty()).await;
        assert!(mode.is_none());
    }

    #[tokio::test]
    async fn malformed_json_returns_none() {
        let provider = FakeLlmProvider::new(vec![aar_kernel::llm::LlmResponse { parts: vec![MessagePart::Text { text: "not json".into() }], token_count: 0 }]);
        let builtins = builtin_tool_set();
        let mode = switch(&provider, 5, "summary", &builtins, None, &SkillRegistry::empty()).await;
        assert!(mode.is_none());
    }

    #[test]
    fn summary_truncates_and_takes_last_five() {
        let turns: Vec<Turn> = (0..8).map(|i| Turn::UserMessage { text: format!("message number {i}") }).collect();
        let summary = summarize_recent_turns(&turns);
        assert_eq!(summary.matches('|').count(), 4);
        assert!(summary.contains("message number 7"));
        assert!(!summary.contains("message number 0"));
    }
}
