//! Per-session turn lifecycle.
//!
//! A state machine (`Created → Initializing → Ready → Executing → …`)
//! tracking the states a single `/run` turn passes through.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentState {
    Idle,
    Running,
    Completed,
    Failed,
    Busy,
}

impl AgentState {
    /// Whether a turn may start while the session carries this state.
    pub fn accepts_new_turn(self) -> bool {
        matches!(self, AgentState::Idle | AgentState::Completed | AgentState::Failed)
    }
}

impl Default for AgentState {
    fn default() -> Self {
        AgentState::Idle
    }
}
