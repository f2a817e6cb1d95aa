//! Shared in-process wiring for every subcommand: one `AdaptiveAgentCore`
//! built from the same environment variables `aar-gateway`'s `main.rs`
//! reads, so the CLI and the gateway never drift apart on configuration.

use std::sync::Arc;

use aar_foundation::{FileStore, InMemoryStore, MockWallet, SessionStore, SkillRegistry};
use aar_kernel::config::RuntimeConfig;
use aar_kernel::llm::FakeLlmProvider;
use aar_runtime::tools::{RuntimeServices, SkillLocalRegistry};
use aar_runtime::AdaptiveAgentCore;

use crate::error::CliError;

pub fn build_core(config_path: Option<&str>) -> Result<AdaptiveAgentCore, CliError> {
    let config = RuntimeConfig::load(config_path).map_err(|e| CliError::Config(e.to_string()))?;

    let skills = match std::env::var("AAR_SKILLS_DIR") {
        Ok(dir) => Arc::new(SkillRegistry::load(&dir).map_err(|e| CliError::Config(format!("failed to load skill registry from {dir}: {e}")))?),
        Err(_) => Arc::new(SkillRegistry::empty()),
    };

    let store: Arc<dyn SessionStore> = match std::env::var("AAR_SESSION_STORE_DIR") {
        Ok(dir) => Arc::new(FileStore::new(&dir).map_err(|e| CliError::Config(format!("failed to open session store at {dir}: {e}")))?),
        Err(_) => Arc::new(InMemoryStore::new()),
    };

    let llm = Arc::new(FakeLlmProvider::new(vec![]));
    let meta_llm = Arc::new(FakeLlmProvider::new(vec![]));
    let wallet = Arc::new(MockWallet::new("agent-wallet", 0.0));
    let services = Arc::new(RuntimeServices { wallet, mcp: None, a2a: None, skill_locals: SkillLocalRegistry::new() });

    Ok(AdaptiveAgentCore::new(config, store, skills, services, llm, meta_llm))
}
