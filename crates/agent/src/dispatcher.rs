//! The tool dispatcher: executes requested calls against the registry.
//!
//! Every call yields exactly one tool-result message with the call's id, in
//! request order. Unknown tools, bad arguments, tool errors, and even tool
//! panics all become result text the model can read.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use abacus_core::error::ToolError;
use abacus_core::message::{Message, MessageToolCall};
use abacus_core::tool::ToolRegistry;
use futures::FutureExt;
use tracing::{debug, warn};

pub struct ToolDispatcher {
    tools: Arc<ToolRegistry>,
}

impl ToolDispatcher {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }

    /// Execute `calls` sequentially and return one result message per call.
    pub async fn dispatch(&self, calls: &[MessageToolCall]) -> Vec<Message> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            let output = self.execute_one(call).await;
            results.push(Message::tool_result(&call.id, output));
        }
        results
    }

    async fn execute_one(&self, call: &MessageToolCall) -> String {
        let Some(tool) = self.tools.lookup(&call.name) else {
            warn!(tool = %call.name, "Model requested an unknown tool");
            return ToolError::NotFound {
                name: call.name.clone(),
                available: self.tools.names().into_iter().map(String::from).collect(),
            }
            .to_string();
        };

        let arguments = match parse_arguments(&call.arguments) {
            Ok(args) => args,
            Err(e) => return format!("Error executing tool: {e}"),
        };

        debug!(tool = %call.name, call_id = %call.id, "Executing tool");

        match AssertUnwindSafe(tool.execute(arguments)).catch_unwind().await {
            Ok(Ok(result)) => result.output,
            Ok(Err(e)) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                format!("Error executing tool: {e}")
            }
            Err(_) => {
                warn!(tool = %call.name, "Tool panicked");
                format!("Error executing tool: tool '{}' panicked", call.name)
            }
        }
    }
}

/// Parse the model's argument string. An empty string means no arguments.
fn parse_arguments(raw: &str) -> Result<serde_json::Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{make_tool_call, make_tool_call_with_id};
    use abacus_core::error::ToolError;
    use abacus_core::message::Role;
    use abacus_core::tool::{Tool, ToolResult};
    use async_trait::async_trait;

    struct PanickingTool;

    #[async_trait]
    impl Tool for PanickingTool {
        fn name(&self) -> &str {
            "explode"
        }
        fn description(&self) -> &str {
            "Always panics"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            panic!("kaboom");
        }
    }

    fn dispatcher() -> ToolDispatcher {
        let mut registry = abacus_tools::default_registry().unwrap();
        registry.register(Box::new(PanickingTool)).unwrap();
        ToolDispatcher::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn empty_batch_yields_no_results() {
        assert!(dispatcher().dispatch(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn results_match_calls_pairwise() {
        let calls = vec![
            make_tool_call_with_id("c1", "add", serde_json::json!({"a": 2, "b": 2})),
            make_tool_call_with_id("c2", "nope", serde_json::json!({})),
            make_tool_call_with_id("c3", "divide", serde_json::json!({"a": 10, "b": 0})),
            make_tool_call_with_id("c4", "multiply", serde_json::json!({"a": 3, "b": 3})),
        ];
        let results = dispatcher().dispatch(&calls).await;

        assert_eq!(results.len(), calls.len());
        for (call, result) in calls.iter().zip(&results) {
            assert_eq!(result.role, Role::Tool);
            assert_eq!(result.tool_call_id.as_deref(), Some(call.id.as_str()));
        }
        assert_eq!(results[0].content, "4");
        assert_eq!(results[3].content, "9");
    }

    #[tokio::test]
    async fn divide_by_zero_becomes_error_text() {
        let results = dispatcher()
            .dispatch(&[make_tool_call("divide", serde_json::json!({"a": 10, "b": 0}))])
            .await;
        assert_eq!(
            results[0].content,
            "Error executing tool: Division by zero is not allowed."
        );
    }

    #[tokio::test]
    async fn unknown_tool_lists_known_names() {
        let results = dispatcher()
            .dispatch(&[make_tool_call("sqrt", serde_json::json!({"x": 9}))])
            .await;
        assert_eq!(
            results[0].content,
            "Tool 'sqrt' not found. Available tools: \
             ['add', 'calculate', 'divide', 'explode', 'multiply', 'subtract']"
        );
    }

    #[tokio::test]
    async fn malformed_arguments_are_reported() {
        let call = MessageToolCall {
            id: "c1".into(),
            name: "add".into(),
            arguments: "{not json".into(),
        };
        let results = dispatcher().dispatch(&[call]).await;
        assert!(results[0].content.starts_with("Error executing tool: Invalid tool arguments"));
    }

    #[tokio::test]
    async fn empty_arguments_mean_no_arguments() {
        let call = MessageToolCall {
            id: "c1".into(),
            name: "add".into(),
            arguments: String::new(),
        };
        let results = dispatcher().dispatch(&[call]).await;
        assert!(results[0].content.contains("Missing or non-numeric 'a'"));
    }

    #[tokio::test]
    async fn panicking_tool_does_not_abort_siblings() {
        let calls = vec![
            make_tool_call_with_id("c1", "explode", serde_json::json!({})),
            make_tool_call_with_id("c2", "add", serde_json::json!({"a": 1, "b": 2})),
        ];
        let results = dispatcher().dispatch(&calls).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].content.contains("panicked"));
        assert_eq!(results[1].content, "3");
    }
}
