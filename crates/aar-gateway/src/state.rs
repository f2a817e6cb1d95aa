use std::sync::Arc;
use std::time::Duration;

use aar_runtime::AdaptiveAgentCore;
use dashmap::DashMap;

use crate::middleware::RateLimiter;

/// The real tool call a confirmation-wrapper id stands in for. The ADK wire
/// contract only ever hands the client the wrapper's own id/name
/// (`adk_request_confirmation`); the original call's id, tool name, and
/// arguments are tracked here so the reply can be routed back to the tool
/// that actually needs to resume, instead of trusting the client to echo
/// back anything beyond the wrapper id.
pub struct PendingConfirmation {
    pub call_id: String,
    pub tool_name: String,
    pub args: serde_json::Value,
}

/// Shared state threaded into every handler via `State<Arc<AppState>>`.
pub struct AppState {
    pub core: Arc<AdaptiveAgentCore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub pending_confirmations: Arc<DashMap<String, PendingConfirmation>>,
}

impl AppState {
    pub fn new(core: Arc<AdaptiveAgentCore>) -> Self {
        Self { core, rate_limiter: Arc::new(RateLimiter::new(60, Duration::from_secs(60))), pending_confirmations: Arc::new(DashMap::new()) }
    }
}
