//! Two-operand arithmetic tools: `add`, `subtract`, `multiply`, `divide`.

use async_trait::async_trait;
use abacus_core::error::ToolError;
use abacus_core::tool::{Tool, ToolResult};

/// Which operation a [`BinaryOpTool`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 4] = [
        BinaryOp::Add,
        BinaryOp::Subtract,
        BinaryOp::Multiply,
        BinaryOp::Divide,
    ];

    fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "subtract",
            BinaryOp::Multiply => "multiply",
            BinaryOp::Divide => "divide",
        }
    }

    fn description(self) -> &'static str {
        match self {
            BinaryOp::Add => "Add two numbers and return the sum.",
            BinaryOp::Subtract => "Subtract b from a and return the difference.",
            BinaryOp::Multiply => "Multiply two numbers and return the product.",
            BinaryOp::Divide => {
                "Divide a by b and return the quotient. Fails on division by zero."
            }
        }
    }

    fn apply(self, a: f64, b: f64) -> Result<f64, String> {
        match self {
            BinaryOp::Add => Ok(a + b),
            BinaryOp::Subtract => Ok(a - b),
            BinaryOp::Multiply => Ok(a * b),
            BinaryOp::Divide if b == 0.0 => Err("Division by zero is not allowed.".into()),
            BinaryOp::Divide => Ok(a / b),
        }
    }
}

/// A tool taking numeric arguments `a` and `b`.
pub struct BinaryOpTool {
    op: BinaryOp,
}

impl BinaryOpTool {
    pub fn new(op: BinaryOp) -> Self {
        Self { op }
    }
}

#[async_trait]
impl Tool for BinaryOpTool {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn description(&self) -> &str {
        self.op.description()
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "a": { "type": "number", "description": "First operand" },
                "b": { "type": "number", "description": "Second operand" }
            },
            "required": ["a", "b"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let a = number_arg(&arguments, "a")?;
        let b = number_arg(&arguments, "b")?;

        let value = self.op.apply(a, b).map_err(|reason| ToolError::ExecutionFailed {
            tool_name: self.op.name().into(),
            reason,
        })?;

        Ok(ToolResult::ok(format_number(value)).with_data(serde_json::json!({ "result": value })))
    }
}

/// Read a numeric argument, accepting numeric strings as models sometimes send them.
fn number_arg(arguments: &serde_json::Value, key: &str) -> Result<f64, ToolError> {
    let value = &arguments[key];
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing or non-numeric '{key}' argument")))
}

/// Format a number, dropping the trailing `.0` for integral values.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
