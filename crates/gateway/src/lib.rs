//! HTTP API gateway for Abacus.
//!
//! Exposes the agent over HTTP:
//! - `POST /run_agent`: streams the run as Server-Sent Events
//! - `POST /run`: runs to completion and returns `{"response": ...}`
//! - `GET /health`: liveness
//!
//! [`tool_server`] can also expose the built-in tools to other agents.
//!
//! Built on Axum.

pub mod bridge;
pub mod tool_server;

pub use tool_server::{build_tool_router, serve_tools};

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use abacus_agent::{AgentLoop, EventEmitter};
use abacus_config::AppConfig;
use abacus_core::error::Error;

/// Shared application state for the gateway.
pub struct AppState {
    pub agent: Arc<AgentLoop>,
    /// Idle time before the event stream writes a keep-alive comment
    pub keep_alive: Duration,
}

pub type SharedState = Arc<AppState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/run", post(run_handler))
        .route("/run_agent", post(run_agent_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Builds the provider and tool registry once and shares them across
/// requests through the agent loop.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = abacus_providers::build_from_config(&config.provider)?;
    let tools = Arc::new(abacus_tools::build_registry(&config.tools).await?);
    info!(provider = provider.name(), tools = ?tools.names(), "Agent ready");

    let agent = Arc::new(AgentLoop::from_config(provider, tools, &config));
    let state = Arc::new(AppState {
        agent,
        keep_alive: Duration::from_secs(config.gateway.keep_alive_secs),
    });

    let app = build_router(state, config.gateway.max_body_bytes);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct RunRequest {
    message: String,
}

#[derive(Serialize)]
struct RunResponse {
    response: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Map a run failure to an HTTP status.
fn error_status(e: &Error) -> StatusCode {
    match e {
        Error::ModelUnavailable(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `POST /run`: run the loop to completion.
async fn run_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RunRequest>,
) -> Result<Json<RunResponse>, (StatusCode, Json<ErrorResponse>)> {
    info!(message_len = payload.message.len(), "Run request received");

    match state.agent.run(&payload.message, &EventEmitter::disabled()).await {
        Ok(outcome) => Ok(Json(RunResponse {
            response: outcome.answer,
        })),
        Err(e) => {
            error!(error = %e, "Agent run failed");
            Err((
                error_status(&e),
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// `POST /run_agent`: stream the run as SSE.
///
/// Returns immediately; the run continues on a background task.
async fn run_agent_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RunRequest>,
) -> Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>> {
    info!(message_len = payload.message.len(), "Streaming run request received");

    let rx = bridge::spawn_run(Arc::clone(&state.agent), payload.message);
    Sse::new(bridge::event_stream(rx)).keep_alive(
        KeepAlive::new()
            .interval(state.keep_alive)
            .text("keep-alive"),
    )
}
