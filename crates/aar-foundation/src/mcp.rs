//! Streamable-HTTP MCP client (spec §4.6).
//!
//! Talks JSON-RPC 2.0 over `reqwest` against a streamable-HTTP endpoint
//! rather than managing a registry of stdio child-process connections.

use aar_kernel::error::{AarError, AarResult};
use aar_kernel::tool::{ToolDescriptor, ToolSource};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    message: String,
}

/// One MCP server connection. The `tool_filter` is wrapped in an
/// `Arc<RwLock<..>>` so a mode switch can re-narrow which tools are
/// exposed without tearing down the HTTP connection (spec §4.6, §9).
pub struct McpClient {
    endpoint: String,
    http: reqwest::Client,
    next_id: AtomicU64,
    tool_filter: Arc<RwLock<Option<HashSet<String>>>>,
}

impl McpClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), http: reqwest::Client::new(), next_id: AtomicU64::new(1), tool_filter: Arc::new(RwLock::new(None)) }
    }

    /// A cheaply-cloneable handle to the live filter, so callers (e.g. the
    /// Mode Manager) can mutate it in place on a mode switch.
    pub fn filter_handle(&self) -> Arc<RwLock<Option<HashSet<String>>>> {
        self.tool_filter.clone()
    }

    pub async fn set_filter(&self, names: Option<HashSet<String>>) {
        *self.tool_filter.write().await = names;
    }

    async fn call(&self, method: &str, params: serde_json::Value) -> AarResult<serde_json::Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = JsonRpcRequest { jsonrpc: "2.0", id, method, params };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AarError::Transport(format!("MCP request to '{method}' failed: {e}")))?;

        let parsed: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| AarError::Transport(format!("MCP response from '{method}' was not valid JSON-RPC: {e}")))?;

        if let Some(err) = parsed.error {
            return Err(AarError::Transport(format!("MCP server error on '{method}': {}", err.message)));
        }
        parsed.result.ok_or_else(|| AarError::Transport(format!("MCP response to '{method}' carried neither result nor error")))
    }

    /// `tools/list`, filtered client-side by the current `tool_filter`.
    pub async fn list_tools(&self) -> AarResult<Vec<ToolDescriptor>> {
        let result = self.call("tools/list", json!({})).await?;
        let raw_tools = result.get("tools").and_then(|v| v.as_array()).cloned().unwrap_or_default();

        let filter = self.tool_filter.read().await.clone();
        let mut tools = Vec::new();
        for raw in raw_tools {
            let name = raw.get("name").and_then(|v| v.as_str()).unwrap_or_default().to_string();
            if let Some(allowed) = &filter {
                if !allowed.contains(&name) {
                    continue;
                }
            }
            tools.push(ToolDescriptor {
                name,
                description: raw.get("description").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                input_schema: raw.get("inputSchema").cloned().unwrap_or(json!({})),
                source: ToolSource::Mcp,
                require_confirmation: false,
                paid: None,
            });
        }
        Ok(tools)
    }

    /// `tools/call`.
    pub async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> AarResult<serde_json::Value> {
        {
            let filter = self.tool_filter.read().await;
            if let Some(allowed) = filter.as_ref() {
                if !allowed.contains(name) {
                    return Err(AarError::ToolNotFound(format!("MCP tool '{name}' is not in the active filter")));
                }
            }
        }
        let result = self.call("tools/call", json!({ "name": name, "arguments": arguments })).await?;
        if result.get("isError").and_then(|v| v.as_bool()).unwrap_or(false) {
            let message = result
                .get("content")
                .and_then(|c| c.as_array())
                .and_then(|arr| arr.first())
                .and_then(|v| v.get("text"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown MCP tool error")
                .to_string();
            return Err(AarError::ToolExecutionError { tool_name: name.to_string(), message });
        }
        Ok(result.get("content").cloned().unwrap_or(json!([])))
    }
}
