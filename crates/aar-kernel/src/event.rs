//! Events emitted by the Adaptive Agent Core's `run` stream (spec §4.1).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ModelText { text: String },
    ToolCall { id: String, name: String, args: serde_json::Value },
    ToolResult { id: String, name: String, result: serde_json::Value },
    EnforcerBlock { message: String },
    ModeSwitched { instruction_preview: String },
    Final { answer: String, timed_out: bool },
}

impl Event {
    pub fn is_final(&self) -> bool {
        matches!(self, Event::Final { .. })
    }
}
