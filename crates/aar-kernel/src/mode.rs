//! Mode and PlanPact (spec §3, glossary).

use crate::tool::ToolSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The tuple of instruction text + allowed tool set + active skills that
/// shapes one stretch of conversation. The Core owns exactly one current
/// Mode per session; replacing it is atomic (spec §3).
#[derive(Debug, Clone)]
pub struct Mode {
    pub instruction_text: String,
    pub active_tool_set: ToolSet,
    pub active_skills: Vec<String>,
}

impl Mode {
    /// The minimal initial Mode: built-in tools only, MCP tools hidden
    /// (spec §4.3 "initial request" trigger).
    pub fn initial(builtin_tools: ToolSet, instruction_text: impl Into<String>) -> Self {
        Self { instruction_text: instruction_text.into(), active_tool_set: builtin_tools, active_skills: Vec::new() }
    }

    /// `switch_mode` must always be callable from the active set (spec §3
    /// invariant: every Mode has `switch_mode ∈ active_tool_set`).
    pub fn has_escape_hatch(&self) -> bool {
        self.active_tool_set.contains("switch_mode")
    }
}

/// Self-imposed plan contract recorded via `planner`, enforced by the
/// Enforcer until re-planned (spec §3, glossary "Ulysses Pact").
#[derive(Debug, Clone, Default)]
pub struct PlanPact {
    pub active: bool,
    pub allowed_tool_names: BTreeSet<String>,
}

impl PlanPact {
    /// Tools that are never removed from an enforced set, unioned in on
    /// every `planner` call (spec §3, §4.3 tie-breaks).
    pub fn default_allow() -> BTreeSet<String> {
        ["planner", "ask_question", "attempt_answer", "switch_mode", "system_retry"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// `planner(allowed_tools=[...])` replaces the set (spec §4.4).
    pub fn set_plan(&mut self, tools: impl IntoIterator<Item = String>) {
        self.active = true;
        let mut set: BTreeSet<String> = tools.into_iter().collect();
        set.extend(Self::default_allow());
        self.allowed_tool_names = set;
    }

    pub fn clear(&mut self) {
        self.active = false;
        self.allowed_tool_names.clear();
    }

    /// Whether `tool_name` is permitted under the current pact. Always
    /// `true` when no pact is active.
    pub fn permits(&self, tool_name: &str) -> bool {
        if !self.active {
            return true;
        }
        self.allowed_tool_names.contains(tool_name)
    }
}

/// Parameters governing when the Mode Manager decides to switch Mode
/// (spec §4.3).
#[derive(Debug, Clone)]
pub struct ModeManagerState {
    pub is_first_turn: bool,
    pub switch_requested: bool,
    pub requested_focus: Option<String>,
    pub max_context_tokens: u64,
    pub threshold: f64,
}

impl ModeManagerState {
    pub fn new(max_context_tokens: u64, threshold: f64) -> Self {
        Self { is_first_turn: true, switch_requested: false, requested_focus: None, max_context_tokens, threshold }
    }

    /// `should_switch` trigger predicate (spec §4.3). Mutates
    /// `is_first_turn`/`switch_requested` the same way the reference
    /// implementation does, so callers need only call this once per turn.
    pub fn should_switch(&mut self, token_count: u64) -> bool {
        if self.is_first_turn {
            self.is_first_turn = false;
            return false;
        }
        if self.max_context_tokens > 0 {
            let ratio = token_count as f64 / self.max_context_tokens as f64;
            if ratio >= self.threshold {
                return true;
            }
        }
        if self.switch_requested {
            self.switch_requested = false;
            return true;
        }
        false
    }

    /// Invoked when the model calls `switch_mode`.
    pub fn request_switch(&mut self, focus: Option<String>) {
        self.switch_requested = true;
        self.requested_focus = focus;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_turn_never_switches() {
        let mut state = ModeManagerState::new(1000, 0.5);
        assert!(!state.should_switch(0));
        assert!(!state.is_first_turn);
    }

    #[test]
    fn threshold_triggers_switch() {
        let mut state = ModeManagerState::new(100, 0.5);
        state.is_first_turn = false;
        assert!(!state.should_switch(40));
        assert!(state.should_switch(60));
    }

    #[test]
    fn requested_switch_consumes_flag() {
        let mut state = ModeManagerState::new(1000, 0.5);
        state.is_first_turn = false;
        state.request_switch(Some("focus".into()));
        assert!(state.should_switch(0));
        assert!(!state.switch_requested);
    }

    #[test]
    fn plan_pact_always_allows_defaults() {
        let mut pact = PlanPact::default();
        pact.set_plan(["read_file".to_string()]);
        assert!(pact.permits("read_file"));
        assert!(pact.permits("planner"));
        assert!(pact.permits("attempt_answer"));
        assert!(!pact.permits("write_file"));
    }

    #[test]
    fn inactive_pact_permits_everything() {
        let pact = PlanPact::default();
        assert!(pact.permits("anything"));
    }
}
