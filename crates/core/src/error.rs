//! Error types for the Abacus domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for an agent run.
///
/// Only run-fatal conditions live here. Tool failures are recovered inside the
/// dispatcher and never reach the caller of the agent loop.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model boundary ---
    #[error("Model unavailable: {0}")]
    ModelUnavailable(#[from] ProviderError),

    // --- Loop controller ---
    #[error("Loop bound exceeded: no final answer after {max_iterations} decision steps")]
    LoopBoundExceeded { max_iterations: u32 },

    // --- Tool registry (startup only) ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Transcript invariants ---
    #[error("Transcript invariant violated: {0}")]
    Transcript(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool '{name}' not found. Available tools: {}", format_names(.available))]
    NotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("Tool already registered: {0}")]
    Duplicate(String),

    #[error("{reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool unavailable: {tool_name}: {reason}")]
    Unavailable { tool_name: String, reason: String },
}

fn format_names(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{n}'")).collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::ModelUnavailable(ProviderError::ApiError {
            status_code: 503,
            message: "Service unavailable".into(),
        });
        assert!(err.to_string().starts_with("Model unavailable"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn not_found_lists_known_names() {
        let err = ToolError::NotFound {
            name: "sqrt".into(),
            available: vec!["add".into(), "divide".into()],
        };
        assert_eq!(
            err.to_string(),
            "Tool 'sqrt' not found. Available tools: ['add', 'divide']"
        );
    }

    #[test]
    fn execution_failure_is_the_bare_reason() {
        let err = ToolError::ExecutionFailed {
            tool_name: "divide".into(),
            reason: "Division by zero is not allowed.".into(),
        };
        assert_eq!(err.to_string(), "Division by zero is not allowed.");
    }

    #[test]
    fn loop_bound_mentions_limit() {
        let err = Error::LoopBoundExceeded { max_iterations: 3 };
        assert!(err.to_string().contains('3'));
    }
}
