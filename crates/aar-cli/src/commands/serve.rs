use std::net::SocketAddr;
use std::sync::Arc;

use aar_gateway::{AppState, GatewayServer, GatewayServerConfig};
use aar_runtime::AdaptiveAgentCore;

use crate::error::CliError;

pub async fn serve(core: AdaptiveAgentCore, port: u16) -> Result<(), CliError> {
    let state = Arc::new(AppState::new(Arc::new(core)));
    let bind_addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let server = GatewayServer::new(GatewayServerConfig { bind_addr }, state);
    server.start().await.map_err(|e| CliError::Runtime(aar_kernel::error::AarError::Transport(e.to_string())))
}
