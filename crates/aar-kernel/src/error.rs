//! Error taxonomy for the Adaptive Agent Runtime.
//!
//! Every variant carries the stable textual tag named in spec §7 so logs
//! and wire responses can be grepped by kind without parsing messages.

use thiserror::Error;

/// Runtime-wide result alias.
pub type AarResult<T> = Result<T, AarError>;

#[derive(Debug, Error)]
pub enum AarError {
    /// Unresolvable skill/peer/wallet config; surfaced at startup, fatal.
    #[error("config error: {0}")]
    ConfigError(String),

    /// Transient LLM failure; retried before being surfaced.
    #[error("llm unavailable: {0}")]
    LlmUnavailable(String),

    /// A model called a tool name outside the active set.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// The underlying tool implementation raised.
    #[error("tool execution failed: {tool_name}: {message}")]
    ToolExecutionError { tool_name: String, message: String },

    /// A paid tool refused execution until payment is demonstrated.
    #[error("payment required: {price} {currency} to {recipient} ({reason})")]
    PaymentRequired {
        price: f64,
        currency: String,
        recipient: String,
        reason: String,
    },

    /// Fed back as a synthetic model response; host may auto-retry.
    #[error("enforcer blocked the response: {0}")]
    EnforcerBlocked(String),

    /// Returned from `/run` when another turn holds the session lease.
    #[error("session busy: {0}")]
    SessionBusy(String),

    /// Dispatcher-local timeout.
    #[error("operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Transport-level failure talking to MCP / A2A / wallet endpoints.
    #[error("transport error: {0}")]
    Transport(String),

    /// Session referenced by id does not exist.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Unhandled exceptions in callbacks are caught, logged, and treated
    /// as `LlmUnavailable` per spec §7 — this variant is the pre-conversion
    /// representation kept for logging before the downgrade happens.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AarError {
    /// Downgrade any error into the `LlmUnavailable` kind, matching the
    /// propagation rule that unhandled callback exceptions are treated as
    /// transient LLM failures rather than aborting the turn.
    pub fn as_llm_unavailable(self) -> AarError {
        match self {
            AarError::LlmUnavailable(_) => self,
            other => AarError::LlmUnavailable(other.to_string()),
        }
    }

    /// Stable tag used in logs and wire payloads (spec §7).
    pub fn tag(&self) -> &'static str {
        match self {
            AarError::ConfigError(_) => "ConfigError",
            AarError::LlmUnavailable(_) => "LlmUnavailable",
            AarError::ToolNotFound(_) => "ToolNotFound",
            AarError::ToolExecutionError { .. } => "ToolExecutionError",
            AarError::PaymentRequired { .. } => "PaymentRequired",
            AarError::EnforcerBlocked(_) => "EnforcerBlocked",
            AarError::SessionBusy(_) => "SessionBusy",
            AarError::Timeout { .. } => "Timeout",
            AarError::Transport(_) => "Transport",
            AarError::SessionNotFound(_) => "SessionNotFound",
            AarError::Internal(_) => "Internal",
        }
    }
}
