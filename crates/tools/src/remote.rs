//! Remote tools served by an MCP-style HTTP tool server.
//!
//! The server exposes two endpoints:
//! - `POST {base}/tools/list` with `{}` returns `{"tools": [{name, description, inputSchema}]}`
//! - `POST {base}/tools/call` with `{"name", "arguments"}` returns the tool's JSON result
//!
//! Discovery failures degrade to an empty tool list; call failures degrade
//! to an error result. Neither ever aborts an agent run.

use std::sync::Arc;
use std::time::Duration;

use abacus_config::ToolsConfig;
use abacus_core::error::ToolError;
use abacus_core::tool::{Tool, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

/// A tool advertised by the remote server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default = "empty_schema")]
    pub input_schema: serde_json::Value,
}

fn empty_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

#[derive(Debug, Deserialize)]
struct ToolsListResponse {
    #[serde(default)]
    tools: Vec<RemoteToolSpec>,
}

/// HTTP client for the remote tool server.
pub struct RemoteToolClient {
    base_url: String,
    client: reqwest::Client,
    discovery_timeout: Duration,
    call_timeout: Duration,
}

impl RemoteToolClient {
    pub fn new(base_url: impl Into<String>, discovery_timeout: Duration, call_timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            discovery_timeout,
            call_timeout,
        }
    }

    /// Build a client from the `[tools]` section, if a server is configured.
    pub fn from_config(config: &ToolsConfig) -> Option<Self> {
        config.remote_url.as_deref().map(|url| {
            Self::new(
                url,
                Duration::from_secs(config.discovery_timeout_secs),
                Duration::from_secs(config.call_timeout_secs),
            )
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the advertised tools. Any failure yields an empty list.
    pub async fn list_tools(&self) -> Vec<RemoteToolSpec> {
        match self.try_list_tools().await {
            Ok(tools) => {
                debug!(url = %self.base_url, count = tools.len(), "Discovered remote tools");
                tools
            }
            Err(e) => {
                warn!(url = %self.base_url, error = %e, "Could not fetch tools from tool server");
                Vec::new()
            }
        }
    }

    async fn try_list_tools(&self) -> Result<Vec<RemoteToolSpec>, reqwest::Error> {
        let response = self
            .client
            .post(format!("{}/tools/list", self.base_url))
            .timeout(self.discovery_timeout)
            .json(&serde_json::json!({}))
            .send()
            .await?
            .error_for_status()?;

        let list: ToolsListResponse = response.json().await?;
        Ok(list.tools)
    }

    /// Invoke a remote tool.
    ///
    /// A non-200 reply is still an answer and comes back as `Error: <status> - <body>`.
    /// Only transport failures become [`ToolError::Unavailable`].
    pub async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<String, ToolError> {
        let unavailable = |e: reqwest::Error| ToolError::Unavailable {
            tool_name: name.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/tools/call", self.base_url))
            .timeout(self.call_timeout)
            .json(&serde_json::json!({ "name": name, "arguments": arguments }))
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Ok(format!("Error: {} - {}", status.as_u16(), body));
        }

        let result: serde_json::Value = response.json().await.map_err(unavailable)?;
        Ok(result.to_string())
    }
}

/// A registry entry that forwards execution to the remote server.
pub struct RemoteTool {
    spec: RemoteToolSpec,
    client: Arc<RemoteToolClient>,
}

impl RemoteTool {
    pub fn new(spec: RemoteToolSpec, client: Arc<RemoteToolClient>) -> Self {
        Self { spec, client }
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn description(&self) -> &str {
        &self.spec.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.spec.input_schema.clone()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let output = self.client.call_tool(&self.spec.name, arguments).await?;
        Ok(ToolResult::ok(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/mcp")
    }

    fn client(base: &str) -> RemoteToolClient {
        RemoteToolClient::new(base, Duration::from_secs(5), Duration::from_secs(10))
    }

    fn tool_server() -> Router {
        Router::new()
            .route(
                "/mcp/tools/list",
                post(|| async {
                    Json(serde_json::json!({
                        "tools": [{
                            "name": "power",
                            "description": "Raise a to the power b",
                            "inputSchema": {
                                "type": "object",
                                "properties": { "a": {"type": "number"}, "b": {"type": "number"} }
                            }
                        }]
                    }))
                }),
            )
            .route(
                "/mcp/tools/call",
                post(|Json(body): Json<serde_json::Value>| async move {
                    if body["name"] == "power" {
                        let a = body["arguments"]["a"].as_f64().unwrap_or(0.0);
                        let b = body["arguments"]["b"].as_f64().unwrap_or(0.0);
                        (StatusCode::OK, Json(serde_json::json!({ "result": a.powf(b) })))
                    } else {
                        (
                            StatusCode::NOT_FOUND,
                            Json(serde_json::json!({ "detail": "unknown tool" })),
                        )
                    }
                }),
            )
    }

    #[tokio::test]
    async fn discovers_tools() {
        let base = serve(tool_server()).await;
        let tools = client(&base).list_tools().await;
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "power");
        assert_eq!(tools[0].input_schema["type"], "object");
    }

    #[tokio::test]
    async fn discovery_failure_yields_empty_list() {
        let tools = client("http://127.0.0.1:9/mcp").list_tools().await;
        assert!(tools.is_empty());
    }

    #[tokio::test]
    async fn call_returns_json_text() {
        let base = serve(tool_server()).await;
        let out = client(&base)
            .call_tool("power", serde_json::json!({"a": 2, "b": 3}))
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["result"], 8.0);
    }

    #[tokio::test]
    async fn non_200_becomes_error_text() {
        let base = serve(tool_server()).await;
        let out = client(&base)
            .call_tool("nope", serde_json::json!({}))
            .await
            .unwrap();
        assert!(out.starts_with("Error: 404 - "));
        assert!(out.contains("unknown tool"));
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        let err = client("http://127.0.0.1:9/mcp")
            .call_tool("power", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Unavailable { ref tool_name, .. } if tool_name == "power"));
    }

    #[tokio::test]
    async fn remote_tool_forwards_execution() {
        let base = serve(tool_server()).await;
        let client = Arc::new(client(&base));
        let spec = client.list_tools().await.remove(0);
        let tool = RemoteTool::new(spec, client);

        assert_eq!(tool.to_definition().name, "power");
        let result = tool.execute(serde_json::json!({"a": 3, "b": 2})).await.unwrap();
        assert!(result.success);
        assert!(result.output.contains("9"));
    }

    #[test]
    fn from_config_requires_url() {
        let mut config = ToolsConfig::default();
        assert!(RemoteToolClient::from_config(&config).is_none());

        config.remote_url = Some("http://localhost:8080/mcp/".into());
        let client = RemoteToolClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/mcp");
    }
}
