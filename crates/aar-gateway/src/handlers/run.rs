//! `/run`: the single entry point driving a turn forward, including
//! resuming a suspended turn via the confirmation protocol (spec §6).

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::Json;
use dashmap::DashMap;

use aar_kernel::error::AarError;
use aar_kernel::event::Event;
use aar_kernel::turn::SessionKey;
use aar_kernel::wire::{NewMessagePart, OriginalFunctionCall, RunEvent, RunRequest};

use crate::error::{GatewayError, GatewayResult};
use crate::state::{AppState, PendingConfirmation};

/// Upper bound on a single `/run` call: the sum of the transport timeouts a
/// turn can legitimately spend waiting on MCP (60s) and A2A (120s) calls
/// (spec §5). Enforced with `tokio::time::timeout` at the request boundary
/// so a runaway turn never pins a Tokio task forever; per-tool-call
/// cancellation lives in the transport clients' own timeouts rather than a
/// token threaded through `tools::dispatch`, since this boundary only needs
/// to bound the whole request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

pub async fn run(State(state): State<Arc<AppState>>, Json(request): Json<RunRequest>) -> GatewayResult<Json<Vec<RunEvent>>> {
    let key = SessionKey::new(request.app_name.clone(), request.user_id.clone(), request.session_id.clone());

    let part = request
        .new_message
        .parts
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::InvalidRequest("new_message must carry at least one part".into()))?;

    let core = state.core.clone();
    let pending = state.pending_confirmations.clone();

    let work = async move {
        match part {
            NewMessagePart::Text { text } => core.run(&key, &text).await,
            NewMessagePart::FunctionResponse { function_response } => {
                // The client only ever echoes back the confirmation
                // wrapper's own id/name (`adk_request_confirmation`), never
                // the original tool call's — look the real target up
                // rather than trusting those fields as the dispatch target.
                let (_, original) = pending
                    .remove(&function_response.id)
                    .ok_or_else(|| AarError::ToolNotFound(format!("no pending confirmation for id '{}'", function_response.id)))?;
                let confirmed = function_response.response.get("confirmed").and_then(|v| v.as_bool()).unwrap_or(false);
                core.resume_confirmation(&key, &original.call_id, &original.tool_name, original.args, confirmed).await
            }
        }
    };

    let events = tokio::time::timeout(REQUEST_TIMEOUT, work)
        .await
        .map_err(|_| GatewayError::Runtime(AarError::Timeout { duration_ms: REQUEST_TIMEOUT.as_millis() as u64 }))??;

    Ok(Json(events.into_iter().map(|event| to_wire_event(event, &state.pending_confirmations)).collect()))
}

fn to_wire_event(event: Event, pending: &DashMap<String, PendingConfirmation>) -> RunEvent {
    match event {
        Event::ModelText { text } => RunEvent::model_text(text),
        Event::ToolCall { id, name, args } => RunEvent::model_function_call(id, name, args),
        Event::ToolResult { id, name, result } => {
            if result.get("awaiting_confirmation").and_then(|v| v.as_bool()).unwrap_or(false) {
                let args = result.get("args").cloned().unwrap_or(serde_json::Value::Null);
                let confirmation_id = uuid::Uuid::new_v4().to_string();
                pending.insert(confirmation_id.clone(), PendingConfirmation { call_id: id, tool_name: name.clone(), args: args.clone() });
                RunEvent::confirmation_request(confirmation_id, OriginalFunctionCall { name, args })
            } else {
                RunEvent::function_response(id, name, result)
            }
        }
        Event::EnforcerBlock { message } => RunEvent::model_text(message),
        Event::ModeSwitched { instruction_preview } => RunEvent::model_text(instruction_preview),
        Event::Final { answer, .. } => RunEvent::model_text(answer),
    }
}
