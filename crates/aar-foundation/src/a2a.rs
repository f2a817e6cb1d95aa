//! Agent-to-Agent peer client (spec §4.7).

use aar_kernel::error::{AarError, AarResult};
use serde::{Deserialize, Serialize};

/// One entry of the peer configuration file (spec §6 "Peer configuration file").
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PeerConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Top-level shape of the YAML peer configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct A2aPeersFile {
    #[serde(default)]
    pub a2a_peers: Vec<PeerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentCard {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub credentials: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
struct ForwardRequest {
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ForwardResponse {
    answer: String,
}

/// A single peer reachable over A2A. The single operation exposed to the
/// model is "forward a text request and return the peer's final answer"
/// (spec §4.7).
pub struct A2aPeer {
    config: PeerConfig,
    http: reqwest::Client,
}

impl A2aPeer {
    pub fn new(config: PeerConfig) -> Self {
        Self { config, http: reqwest::Client::new() }
    }

    fn agent_card_url(&self) -> String {
        format!("{}/a2a/{}/.well-known/agent-card.json", self.config.url.trim_end_matches('/'), self.config.name)
    }

    pub async fn fetch_agent_card(&self) -> AarResult<AgentCard> {
        let resp = self
            .http
            .get(self.agent_card_url())
            .send()
            .await
            .map_err(|e| AarError::Transport(format!("failed to fetch agent card for peer '{}': {e}", self.config.name)))?;
        resp.json()
            .await
            .map_err(|e| AarError::Transport(format!("peer '{}' returned an invalid agent card: {e}", self.config.name)))
    }

    /// Forward `text` to the peer's `/run` endpoint and return its final
    /// answer.
    pub async fn forward(&self, text: &str) -> AarResult<String> {
        let card = self.fetch_agent_card().await?;
        let mut request = self.http.post(format!("{}/run", self.config.url.trim_end_matches('/'))).json(&ForwardRequest { text: text.to_string() });

        if let Some(creds) = &card.credentials {
            if let Some(token) = creds.get("bearer_token").and_then(|v| v.as_str()) {
                request = request.bearer_auth(token);
            }
        }

        let resp = request.send().await.map_err(|e| AarError::Transport(format!("peer '{}' forward failed: {e}", self.config.name)))?;
        let parsed: ForwardResponse = resp.json().await.map_err(|e| AarError::Transport(format!("peer '{}' returned an invalid response: {e}", self.config.name)))?;
        Ok(parsed.answer)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }
}

/// Registry of configured peers. `consumer_mode` gates whether this agent
/// is allowed to address peers at all — peers themselves must run with
/// consumer mode disabled to avoid request cycles (spec §4.7, §9).
pub struct A2aClient {
    peers: std::collections::BTreeMap<String, A2aPeer>,
    consumer_mode_enabled: bool,
}

impl A2aClient {
    pub fn new(peer_configs: Vec<PeerConfig>, consumer_mode_enabled: bool) -> Self {
        let peers = peer_configs.into_iter().map(|c| (c.name.clone(), A2aPeer::new(c))).collect();
        Self { peers, consumer_mode_enabled }
    }

    pub fn peer_names(&self) -> Vec<String> {
        self.peers.keys().cloned().collect()
    }

    pub async fn forward(&self, peer_name: &str, text: &str) -> AarResult<String> {
        if !self.consumer_mode_enabled {
            return Err(AarError::ConfigError("A2A consumer mode is disabled for this deployment".into()));
        }
        let peer = self.peers.get(peer_name).ok_or_else(|| AarError::ToolNotFound(format!("unknown A2A peer '{peer_name}'")))?;
        peer.forward(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_card_url_is_well_formed() {
        let peer = A2aPeer::new(PeerConfig { name: "research".into(), url: "https://peers.example.com/".into(), capabilities: vec![] });
        assert_eq!(peer.agent_card_url(), "https://peers.example.com/a2a/research/.well-known/agent-card.json");
    }

    #[tokio::test]
    async fn consumer_mode_disabled_blocks_forwarding() {
        let client = A2aClient::new(vec![PeerConfig { name: "p".into(), url: "http://localhost:0".into(), capabilities: vec![] }], false);
        let result = client.forward("p", "hello").await;
        assert!(matches!(result, Err(AarError::ConfigError(_))));
    }

    #[tokio::test]
    async fn unknown_peer_is_tool_not_found() {
        let client = A2aClient::new(vec![], true);
        let result = client.forward("missing", "hello").await;
        assert!(matches!(result, Err(AarError::ToolNotFound(_))));
    }
}
