//! Axum HTTP Surface for the Adaptive Agent Runtime: session CRUD, `/run`,
//! the confirmation protocol, rate limiting, and request validation.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod state;

pub use error::{GatewayError, GatewayResult};
pub use server::{build_app, GatewayServer, GatewayServerConfig};
pub use state::AppState;
