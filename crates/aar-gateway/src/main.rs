//! Adaptive Agent Runtime Gateway — entry point.
//!
//! Reads configuration from environment variables and starts the
//! axum-based HTTP Surface.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_PORT` | `3000` | TCP port to listen on. |
//! | `AAR_CONFIG_FILE` | *(none)* | Path to a `RuntimeConfig` file (env vars still win). |
//! | `AAR_SKILLS_DIR` | *(none)* | Directory scanned for skill bundles at startup. |
//! | `AAR_SESSION_STORE_DIR` | *(none)* | When set, sessions persist to this directory instead of memory. |

use std::net::SocketAddr;
use std::sync::Arc;

use aar_foundation::{FileStore, InMemoryStore, MockWallet, SessionStore, SkillRegistry};
use aar_gateway::{AppState, GatewayServer, GatewayServerConfig};
use aar_kernel::config::RuntimeConfig;
use aar_kernel::llm::FakeLlmProvider;
use aar_runtime::tools::{RuntimeServices, SkillLocalRegistry};
use aar_runtime::AdaptiveAgentCore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env().add_directive("aar_gateway=info".parse().unwrap())).init();

    let port: u16 = std::env::var("GATEWAY_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(3000);

    let config_file = std::env::var("AAR_CONFIG_FILE").ok();
    let config = match RuntimeConfig::load(config_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(2);
        }
    };

    let skills = match std::env::var("AAR_SKILLS_DIR") {
        Ok(dir) => match SkillRegistry::load(&dir) {
            Ok(registry) => Arc::new(registry),
            Err(e) => {
                eprintln!("failed to load skill registry from {dir}: {e}");
                std::process::exit(2);
            }
        },
        Err(_) => Arc::new(SkillRegistry::empty()),
    };

    let store: Arc<dyn SessionStore> = match std::env::var("AAR_SESSION_STORE_DIR") {
        Ok(dir) => match FileStore::new(&dir) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                eprintln!("failed to open session store at {dir}: {e}");
                std::process::exit(2);
            }
        },
        Err(_) => Arc::new(InMemoryStore::new()),
    };

    // No production LLM backend ships with this workspace (the provider is
    // left unspecified): wire a FakeLlmProvider with an empty script so the
    // server starts and the HTTP Surface is reachable, and log loudly that
    // a real `LlmProvider` needs to be injected before this is useful.
    tracing::warn!("no LlmProvider configured — every turn will exhaust its scripted responses and time out. Build against aar_kernel::llm::LlmProvider to plug in a real model.");
    let llm = Arc::new(FakeLlmProvider::new(vec![]));
    let meta_llm = Arc::new(FakeLlmProvider::new(vec![]));

    let wallet = Arc::new(MockWallet::new("agent-wallet", 0.0));
    let services = Arc::new(RuntimeServices { wallet, mcp: None, a2a: None, skill_locals: SkillLocalRegistry::new() });

    let core = Arc::new(AdaptiveAgentCore::new(config, store, skills, services, llm, meta_llm));
    let state = Arc::new(AppState::new(core));

    let bind_addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!(port = port, "aar-gateway configuration loaded");

    let server = GatewayServer::new(GatewayServerConfig { bind_addr }, state);
    if let Err(e) = server.start().await {
        eprintln!("gateway error: {e}");
        std::process::exit(1);
    }
}
