//! Router assembly: a `build_app`/`start` split so tests can exercise the
//! router without binding a socket.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, run, sessions};
use crate::state::AppState;

pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health::health))
        .route("/run", post(run::run))
        .route("/apps/{app_name}/users/{user_id}/sessions", get(sessions::list_sessions))
        .route(
            "/apps/{app_name}/users/{user_id}/sessions/{session_id}",
            post(sessions::create_session).get(sessions::get_session).delete(sessions::delete_session),
        )
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_layer))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn rate_limit_layer(State(state): State<Arc<AppState>>, request: Request<axum::body::Body>, next: Next) -> Result<Response, StatusCode> {
    let client_key = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .unwrap_or("unknown")
        .trim()
        .to_string();

    if !state.rate_limiter.check(&client_key) {
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }
    Ok(next.run(request).await)
}

pub struct GatewayServerConfig {
    pub bind_addr: SocketAddr,
}

pub struct GatewayServer {
    config: GatewayServerConfig,
    state: Arc<AppState>,
}

impl GatewayServer {
    pub fn new(config: GatewayServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    pub async fn start(self) -> std::io::Result<()> {
        let app = build_app(self.state);
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "aar-gateway listening");
        axum::serve(listener, app).await
    }
}
