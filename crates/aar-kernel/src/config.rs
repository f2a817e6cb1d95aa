//! Runtime configuration: environment flags (spec §6) layered over a
//! config file, env vars taking precedence over file values taking
//! precedence over defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub enable_enforcer: bool,
    pub enable_consumer_mode: bool,
    pub enable_payment_protocol: bool,
    pub wallet_mock_mode: bool,
    pub meta_model_id: String,
    pub context_threshold: f64,
    /// Per-model context window sizes, keyed by model id, falling back to
    /// `default` when the active model isn't listed (spec §4.3).
    pub model_max_tokens: std::collections::BTreeMap<String, u64>,
    /// Inner-loop iteration cap (spec §4.1 step 2, N=32).
    pub max_inner_iterations: usize,
    /// MCP dispatch timeout in seconds (spec §5, default 60s).
    pub mcp_timeout_secs: u64,
    /// A2A dispatch timeout in seconds (spec §5, default 120s).
    pub a2a_timeout_secs: u64,
    /// Meta-LLM wall-clock budget in seconds (spec §9, ≤ 5s).
    pub meta_llm_timeout_secs: u64,
    /// Whether a busy session queues (`true`, the default) or is rejected
    /// with `SessionBusy` immediately (spec §5).
    pub queue_busy_sessions: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let mut model_max_tokens = std::collections::BTreeMap::new();
        model_max_tokens.insert("default".to_string(), 128_000);
        Self {
            enable_enforcer: true,
            enable_consumer_mode: false,
            enable_payment_protocol: true,
            wallet_mock_mode: true,
            meta_model_id: "meta-default".to_string(),
            context_threshold: 0.5,
            model_max_tokens,
            max_inner_iterations: 32,
            mcp_timeout_secs: 60,
            a2a_timeout_secs: 120,
            meta_llm_timeout_secs: 5,
            queue_busy_sessions: true,
        }
    }
}

impl RuntimeConfig {
    pub fn max_context_tokens_for(&self, model_id: &str) -> u64 {
        self.model_max_tokens
            .get(model_id)
            .copied()
            .unwrap_or_else(|| self.model_max_tokens.get("default").copied().unwrap_or(128_000))
    }

    /// Load from an optional config file plus `AAR_*` environment
    /// overrides, in that precedence order (env wins).
    pub fn load(file_path: Option<&str>) -> crate::error::AarResult<Self> {
        let mut builder = config::Config::builder().add_source(config::Config::try_from(&RuntimeConfig::default()).map_err(|e| crate::error::AarError::ConfigError(e.to_string()))?);

        if let Some(path) = file_path {
            if std::path::Path::new(path).exists() {
                builder = builder.add_source(config::File::with_name(path));
            }
        }

        builder = builder.add_source(config::Environment::with_prefix("AAR").separator("__"));

        let cfg = builder.build().map_err(|e| crate::error::AarError::ConfigError(e.to_string()))?;
        cfg.try_deserialize().map_err(|e| crate::error::AarError::ConfigError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let cfg = RuntimeConfig::default();
        assert!(cfg.enable_enforcer);
        assert_eq!(cfg.max_inner_iterations, 32);
        assert_eq!(cfg.max_context_tokens_for("unknown-model"), 128_000);
    }

    #[test]
    fn load_with_no_file_falls_back_to_defaults() {
        let cfg = RuntimeConfig::load(None).unwrap();
        assert_eq!(cfg.meta_model_id, "meta-default");
    }
}
