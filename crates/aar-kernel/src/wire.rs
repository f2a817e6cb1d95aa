//! HTTP Surface wire types (spec §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub parts: Vec<NewMessagePart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NewMessagePart {
    Text { text: String },
    FunctionResponse { #[serde(rename = "functionResponse")] function_response: FunctionResponseWire },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionResponseWire {
    pub id: String,
    pub name: String,
    pub response: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunRequest {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    pub new_message: NewMessage,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunEventPart {
    Text { text: String },
    FunctionCall { #[serde(rename = "functionCall")] function_call: FunctionCallWire },
    FunctionResponse { #[serde(rename = "functionResponse")] function_response: FunctionResponseWire },
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionCallWire {
    pub id: String,
    pub name: String,
    pub args: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunEventContent {
    pub role: Role,
    pub parts: Vec<RunEventPart>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunEvent {
    pub content: RunEventContent,
}

/// Confirmation-protocol wrapper for a `require_confirmation` tool (spec §6).
#[derive(Debug, Clone, Serialize)]
pub struct OriginalFunctionCall {
    pub name: String,
    pub args: serde_json::Value,
}

impl RunEvent {
    pub fn model_text(text: impl Into<String>) -> Self {
        Self { content: RunEventContent { role: Role::Model, parts: vec![RunEventPart::Text { text: text.into() }] } }
    }

    pub fn model_function_call(id: impl Into<String>, name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            content: RunEventContent {
                role: Role::Model,
                parts: vec![RunEventPart::FunctionCall { function_call: FunctionCallWire { id: id.into(), name: name.into(), args } }],
            },
        }
    }

    pub fn confirmation_request(confirmation_id: impl Into<String>, original: OriginalFunctionCall) -> Self {
        Self::model_function_call(confirmation_id, "adk_request_confirmation", serde_json::json!({ "originalFunctionCall": original }))
    }

    pub fn function_response(id: impl Into<String>, name: impl Into<String>, response: serde_json::Value) -> Self {
        Self {
            content: RunEventContent {
                role: Role::Model,
                parts: vec![RunEventPart::FunctionResponse { function_response: FunctionResponseWire { id: id.into(), name: name.into(), response } }],
            },
        }
    }
}
