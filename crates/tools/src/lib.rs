//! Tool implementations for Abacus.
//!
//! Built-in arithmetic (`add`, `subtract`, `multiply`, `divide`), the
//! `calculate` expression evaluator, and tools discovered from a remote
//! MCP-style tool server.

pub mod calculator;
pub mod math;
pub mod remote;

use std::sync::Arc;

use abacus_config::ToolsConfig;
use abacus_core::error::ToolError;
use abacus_core::tool::ToolRegistry;
use tracing::{info, warn};

pub use calculator::CalculateTool;
pub use math::{BinaryOp, BinaryOpTool};
pub use remote::{RemoteTool, RemoteToolClient, RemoteToolSpec};

/// Create a registry holding every built-in tool.
pub fn default_registry() -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    for op in BinaryOp::ALL {
        registry.register(Box::new(BinaryOpTool::new(op)))?;
    }
    registry.register(Box::new(CalculateTool))?;
    Ok(registry)
}

/// Register tools advertised by `client` into `registry`.
///
/// Built-ins win: a remote tool whose name is already taken is skipped.
/// Returns how many remote tools were added.
pub async fn register_remote_tools(registry: &mut ToolRegistry, client: RemoteToolClient) -> usize {
    let client = Arc::new(client);
    let mut added = 0;

    for spec in client.list_tools().await {
        let name = spec.name.clone();
        match registry.register(Box::new(RemoteTool::new(spec, Arc::clone(&client)))) {
            Ok(()) => added += 1,
            Err(e) => warn!(tool = %name, error = %e, "Skipping remote tool"),
        }
    }

    if added > 0 {
        info!(url = %client.base_url(), added, "Registered remote tools");
    }
    added
}

/// Build the full registry: built-ins plus any configured remote tools.
pub async fn build_registry(config: &ToolsConfig) -> Result<ToolRegistry, ToolError> {
    let mut registry = default_registry()?;
    if let Some(client) = RemoteToolClient::from_config(config) {
        register_remote_tools(&mut registry, client).await;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::time::Duration;

    #[test]
    fn default_registry_has_builtins() {
        let registry = default_registry().unwrap();
        assert_eq!(
            registry.names(),
            ["add", "calculate", "divide", "multiply", "subtract"]
        );
    }

    #[tokio::test]
    async fn remote_tools_do_not_shadow_builtins() {
        let app = Router::new().route(
            "/tools/list",
            post(|| async {
                Json(serde_json::json!({
                    "tools": [
                        { "name": "add", "description": "shadow" },
                        { "name": "sqrt", "description": "Square root" }
                    ]
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut registry = default_registry().unwrap();
        let client = RemoteToolClient::new(
            format!("http://{addr}"),
            Duration::from_secs(5),
            Duration::from_secs(10),
        );
        let added = register_remote_tools(&mut registry, client).await;

        assert_eq!(added, 1);
        assert_eq!(registry.len(), 6);
        assert_eq!(
            registry.lookup("add").unwrap().description(),
            "Add two numbers and return the sum."
        );
        assert!(registry.lookup("sqrt").is_some());
    }

    #[tokio::test]
    async fn build_registry_without_remote() {
        let registry = build_registry(&ToolsConfig::default()).await.unwrap();
        assert_eq!(registry.len(), 5);
    }
}
