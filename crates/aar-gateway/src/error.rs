//! Gateway error types and the `AarError` → HTTP status mapping (spec §7).

use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use serde_json::json;
use thiserror::Error;

use aar_kernel::error::AarError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Runtime(#[from] AarError),

    #[error("rate limit exceeded for client {0}")]
    RateLimitExceeded(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            GatewayError::RateLimitExceeded(client) => (StatusCode::TOO_MANY_REQUESTS, "RateLimitExceeded", format!("rate limit exceeded for client '{client}'")),
            GatewayError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "InvalidRequest", msg.clone()),
            GatewayError::Runtime(err) => (status_for(err), err.tag(), err.to_string()),
        };

        let body = Json(json!({ "error": { "code": code, "message": message } }));
        (status, body).into_response()
    }
}

/// Maps the runtime's stable error tags onto HTTP status codes. `ConfigError`
/// is fatal at startup and never reaches a handler in practice, so it maps
/// to 500 here defensively rather than being special-cased away.
fn status_for(err: &AarError) -> StatusCode {
    match err {
        AarError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AarError::LlmUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AarError::ToolNotFound(_) => StatusCode::NOT_FOUND,
        AarError::ToolExecutionError { .. } => StatusCode::BAD_GATEWAY,
        AarError::PaymentRequired { .. } => StatusCode::PAYMENT_REQUIRED,
        AarError::EnforcerBlocked(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AarError::SessionBusy(_) => StatusCode::CONFLICT,
        AarError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        AarError::Transport(_) => StatusCode::BAD_GATEWAY,
        AarError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        AarError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn session_not_found_maps_to_404() {
        let resp = GatewayError::Runtime(AarError::SessionNotFound("s1".into())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn session_busy_maps_to_409() {
        let resp = GatewayError::Runtime(AarError::SessionBusy("s1".into())).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn transport_error_maps_to_502() {
        let resp = GatewayError::Runtime(AarError::Transport("mcp down".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"]["code"], "Transport");
    }
}
