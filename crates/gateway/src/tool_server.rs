//! Serves a tool registry over the MCP-style HTTP transport that
//! `abacus_tools::RemoteToolClient` consumes:
//! - `POST /tools/list` returns `{"tools": [{name, description, inputSchema}]}`
//! - `POST /tools/call` with `{"name", "arguments"}` returns `{"output": ...}`
//!
//! Unknown tools answer 404 and failed executions 422, both with `{"error"}`.

use std::sync::Arc;

use abacus_core::error::ToolError;
use abacus_core::tool::ToolRegistry;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Serialize)]
struct ListedTool {
    name: String,
    description: String,
    #[serde(rename = "inputSchema")]
    input_schema: serde_json::Value,
}

#[derive(Serialize)]
struct ToolsList {
    tools: Vec<ListedTool>,
}

#[derive(Deserialize)]
struct CallRequest {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Serialize)]
struct CallResponse {
    output: String,
}

#[derive(Serialize)]
struct CallError {
    error: String,
}

/// Build the tool-server router over `tools`.
pub fn build_tool_router(tools: Arc<ToolRegistry>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/tools/list", post(list_handler))
        .route("/tools/call", post(call_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(tools)
}

/// Serve the built-in tools on `host:port` until the process stops.
pub async fn serve_tools(host: &str, port: u16, max_body_bytes: usize) -> Result<(), Box<dyn std::error::Error>> {
    let tools = Arc::new(abacus_tools::default_registry()?);
    let addr = format!("{host}:{port}");
    info!(addr = %addr, tools = ?tools.names(), "Tool server starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, build_tool_router(tools, max_body_bytes)).await?;
    Ok(())
}

async fn list_handler(State(tools): State<Arc<ToolRegistry>>) -> Json<ToolsList> {
    let tools = tools
        .definitions()
        .into_iter()
        .map(|d| ListedTool {
            name: d.name,
            description: d.description,
            input_schema: d.parameters,
        })
        .collect();
    Json(ToolsList { tools })
}

async fn call_handler(
    State(tools): State<Arc<ToolRegistry>>,
    Json(request): Json<CallRequest>,
) -> Result<Json<CallResponse>, (StatusCode, Json<CallError>)> {
    let Some(tool) = tools.lookup(&request.name) else {
        let err = ToolError::NotFound {
            name: request.name,
            available: tools.names().into_iter().map(String::from).collect(),
        };
        return Err((StatusCode::NOT_FOUND, Json(CallError { error: err.to_string() })));
    };

    let arguments = if request.arguments.is_null() {
        serde_json::json!({})
    } else {
        request.arguments
    };

    debug!(tool = %request.name, "Remote tool call");
    match tool.execute(arguments).await {
        Ok(result) => Ok(Json(CallResponse { output: result.output })),
        Err(e) => {
            warn!(tool = %request.name, error = %e, "Remote tool call failed");
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(CallError { error: e.to_string() }),
            ))
        }
    }
}
