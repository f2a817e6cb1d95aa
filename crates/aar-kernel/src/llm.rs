//! Conversational LLM + meta-LLM provider abstraction.
//!
//! Both the turn-by-turn model (§4.1) and the Mode Manager's meta-LLM
//! (§4.3) are invoked through this one trait — same shape, different
//! prompts and JSON-mode expectations (glossary: "Meta-LLM").

use crate::error::AarResult;
use crate::turn::{MessagePart, Turn};
use async_trait::async_trait;

/// What the Core sends to the model: instruction, turn history, and the
/// tool descriptors currently in scope (§4.1 step a).
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub instruction: String,
    pub turns: Vec<Turn>,
    pub tool_schemas: Vec<serde_json::Value>,
    /// When set, the provider is asked to return a single JSON object
    /// instead of free text (used by the Mode Manager's meta-LLM call).
    pub json_mode: bool,
}

/// A response turn from the model (§3 `ModelMessage`).
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub parts: Vec<MessagePart>,
    /// Best-effort running token count for the session, used by the Mode
    /// Manager's `should_switch` predicate (§4.3).
    pub token_count: u64,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: LlmRequest) -> AarResult<LlmResponse>;
}

/// A scripted, deterministic provider used by tests (spec §8: the suite
/// exercises the runtime offline, without a live model).
pub struct FakeLlmProvider {
    responses: tokio::sync::Mutex<std::collections::VecDeque<LlmResponse>>,
}

impl FakeLlmProvider {
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self { responses: tokio::sync::Mutex::new(responses.into_iter().collect()) }
    }

    pub fn text(text: impl Into<String>, token_count: u64) -> LlmResponse {
        LlmResponse { parts: vec![MessagePart::Text { text: text.into() }], token_count }
    }

    pub fn tool_call(id: impl Into<String>, name: impl Into<String>, args: serde_json::Value, token_count: u64) -> LlmResponse {
        LlmResponse { parts: vec![MessagePart::ToolCall { id: id.into(), name: name.into(), args }], token_count }
    }
}

#[async_trait]
impl LlmProvider for FakeLlmProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, _request: LlmRequest) -> AarResult<LlmResponse> {
        let mut queue = self.responses.lock().await;
        queue
            .pop_front()
            .ok_or_else(|| crate::error::AarError::LlmUnavailable("fake provider exhausted its scripted responses".into()))
    }
}
