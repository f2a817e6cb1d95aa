//! Post-LLM output discipline (spec §4.4).
//!
//! Resolved against `original_source/agent/dak_agent/enforcer_validator.py`:
//! a block is represented as a synthetic `ToolCall` to `system_retry`
//! carrying `error_message`, so the Enforcer's "block" and the model's own
//! retry vehicle share one code path instead of a parallel error channel.

use aar_kernel::mode::PlanPact;
use aar_kernel::turn::{MessagePart, Turn};
use serde_json::json;

pub const BLOCK_MARKER: &str = "[ENFORCER_BLOCKED]";

/// Outcome of running the Enforcer over one `ModelMessage` turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnforcerVerdict {
    /// The response passed both disciplines unchanged.
    Pass,
    /// The response is replaced with a synthetic `system_retry` call
    /// carrying this message.
    Block(String),
}

/// Runs both Enforcer disciplines over a `ModelMessage`'s parts. Disabled
/// entirely by `enable_enforcer = false`.
pub fn enforce(parts: &[MessagePart], plan_pact: &PlanPact, enabled: bool) -> EnforcerVerdict {
    if !enabled {
        return EnforcerVerdict::Pass;
    }

    let has_tool_call = parts.iter().any(|p| matches!(p, MessagePart::ToolCall { .. }));
    if !has_tool_call {
        return EnforcerVerdict::Block(format!(
            "{BLOCK_MARKER} your previous response contained only text. Every turn must include exactly one tool call. Call a tool now."
        ));
    }

    for part in parts {
        if let MessagePart::ToolCall { name, .. } = part {
            if !plan_pact.permits(name) {
                let allowed: Vec<&str> = plan_pact.allowed_tool_names.iter().map(String::as_str).collect();
                return EnforcerVerdict::Block(format!(
                    "{BLOCK_MARKER} tool '{name}' is outside the active plan. Allowed tools: {}. Call `planner` to revise the plan or choose an allowed tool.",
                    allowed.join(", ")
                ));
            }
        }
    }

    EnforcerVerdict::Pass
}

/// Builds the synthetic `system_retry` turn a block is represented as.
pub fn block_turn(call_id: &str, message: &str) -> Turn {
    Turn::ModelMessage {
        parts: vec![MessagePart::ToolCall {
            id: call_id.to_string(),
            name: "system_retry".to_string(),
            args: json!({ "error_message": message }),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passive_pact() -> PlanPact {
        PlanPact::default()
    }

    #[test]
    fn bare_text_is_blocked() {
        let parts = vec![MessagePart::Text { text: "ok".into() }];
        let verdict = enforce(&parts, &passive_pact(), true);
        assert!(matches!(verdict, EnforcerVerdict::Block(msg) if msg.starts_with(BLOCK_MARKER)));
    }

    #[test]
    fn tool_call_passes_with_no_active_plan() {
        let parts = vec![MessagePart::ToolCall { id: "1".into(), name: "read_file".into(), args: json!({}) }];
        assert_eq!(enforce(&parts, &passive_pact(), true), EnforcerVerdict::Pass);
    }

    #[test]
    fn disabled_enforcer_always_passes() {
        let parts = vec![MessagePart::Text { text: "ok".into() }];
        assert_eq!(enforce(&parts, &passive_pact(), false), EnforcerVerdict::Pass);
    }

    #[test]
    fn plan_violation_is_blocked() {
        let mut pact = PlanPact::default();
        pact.set_plan(vec!["read_file".to_string()]);
        let parts = vec![MessagePart::ToolCall { id: "1".into(), name: "write_file".into(), args: json!({}) }];
        let verdict = enforce(&parts, &pact, true);
        assert!(matches!(verdict, EnforcerVerdict::Block(msg) if msg.contains("write_file") && msg.contains("read_file")));
    }

    #[test]
    fn default_allow_set_tools_always_pass_under_active_plan() {
        let mut pact = PlanPact::default();
        pact.set_plan(vec!["read_file".to_string()]);
        let parts = vec![MessagePart::ToolCall { id: "1".into(), name: "switch_mode".into(), args: json!({}) }];
        assert_eq!(enforce(&parts, &pact, true), EnforcerVerdict::Pass);
    }
}
