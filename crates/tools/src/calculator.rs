//! Calculate tool: evaluates restricted arithmetic expressions.
//!
//! Supports `+`, `-`, `*`, `/`, `//` (floor division), `%`, `**`,
//! parentheses, integer and decimal literals, and unary `+`/`-`.
//! Integers stay integers until an operation needs a fraction, so
//! `7 // 2` is `3` while `7 / 2` is `3.5`. Results outside the float
//! range and expressions nested past a fixed depth are reported as errors.
//!
//! The tool never fails on a bad expression. It answers with a JSON
//! envelope `{"expression", "result", "error"}` and lets the model read
//! the error text.

use async_trait::async_trait;
use abacus_core::error::ToolError;
use abacus_core::tool::{Tool, ToolResult};
use serde::Serialize;

pub struct CalculateTool;

#[async_trait]
impl Tool for CalculateTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Safely evaluate a math expression. Supported: +, -, *, /, //, %, **, parentheses, \
         ints/floats, unary +/-. Returns a JSON string with expression, result, and error (if any)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The expression to evaluate, e.g. '(2 + 3) * 4'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let expr = arguments["expression"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'expression' argument".into()))?;

        let envelope = Evaluation::of(expr);
        let data = serde_json::to_value(&envelope)
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "calculate".into(),
                reason: e.to_string(),
            })?;

        Ok(ToolResult {
            success: envelope.error.is_none(),
            output: data.to_string(),
            data: Some(data),
        })
    }
}

/// The JSON envelope returned by `calculate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub expression: String,
    pub result: Option<Number>,
    pub error: Option<String>,
}

impl Evaluation {
    pub fn of(expr: &str) -> Self {
        match evaluate(expr) {
            Ok(value) => Self {
                expression: expr.to_string(),
                result: Some(value),
                error: None,
            },
            Err(e) => Self {
                expression: expr.to_string(),
                result: None,
                error: Some(e),
            },
        }
    }
}

/// A value in an expression: an exact integer or a float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}

// ── Recursive-descent expression evaluator ────────────────────────────────

/// Evaluate an expression string.
pub fn evaluate(expr: &str) -> Result<Number, String> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser::new(&tokens);
    let result = parser.parse_expr()?;
    if let Some(tok) = parser.peek() {
        return Err(format!(
            "Unexpected token at position {}: {:?}",
            parser.pos, tok
        ));
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Number),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let next = chars.get(i + 1).copied();
        match chars[i] {
            c if c.is_whitespace() => i += 1,
            '+' => { tokens.push(Token::Plus); i += 1; }
            '-' => { tokens.push(Token::Minus); i += 1; }
            '*' if next == Some('*') => { tokens.push(Token::DoubleStar); i += 2; }
            '*' => { tokens.push(Token::Star); i += 1; }
            '/' if next == Some('/') => { tokens.push(Token::DoubleSlash); i += 2; }
            '/' => { tokens.push(Token::Slash); i += 1; }
            '%' => { tokens.push(Token::Percent); i += 1; }
            '(' => { tokens.push(Token::LParen); i += 1; }
            ')' => { tokens.push(Token::RParen); i += 1; }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let num_str: String = chars[start..i].iter().collect();
                tokens.push(Token::Number(parse_literal(&num_str)?));
            }
            _ => return Err("Unsupported expression syntax.".into()),
        }
    }

    Ok(tokens)
}

fn parse_literal(s: &str) -> Result<Number, String> {
    if !s.contains('.') {
        if let Ok(i) = s.parse::<i64>() {
            return Ok(Number::Int(i));
        }
    }
    let value = s.parse::<f64>().map_err(|_| format!("Invalid number: {s}"))?;
    finite(Number::Float(value))
}

/// Nesting allowed for parentheses and unary signs combined.
const MAX_DEPTH: usize = 200;

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Run `parse` one nesting level deeper, refusing past [`MAX_DEPTH`].
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, String>) -> Result<T, String> {
        if self.depth >= MAX_DEPTH {
            return Err("Expression is too deeply nested.".into());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // expr = term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<Number, String> {
        let mut left = self.parse_term()?;
        loop {
            let op: fn(Number, Number) -> Number = match self.peek() {
                Some(Token::Plus) => add,
                Some(Token::Minus) => sub,
                _ => break,
            };
            self.consume();
            let right = self.parse_term()?;
            left = finite(op(left, right))?;
        }
        Ok(left)
    }

    // term = unary (('*' | '/' | '//' | '%') unary)*
    fn parse_term(&mut self) -> Result<Number, String> {
        let mut left = self.parse_unary()?;
        loop {
            let op: fn(Number, Number) -> Result<Number, String> = match self.peek() {
                Some(Token::Star) => |a, b| Ok(mul(a, b)),
                Some(Token::Slash) => true_div,
                Some(Token::DoubleSlash) => floor_div,
                Some(Token::Percent) => modulo,
                _ => break,
            };
            self.consume();
            let right = self.parse_unary()?;
            left = finite(op(left, right)?)?;
        }
        Ok(left)
    }

    // unary = ('+' | '-') unary | power
    fn parse_unary(&mut self) -> Result<Number, String> {
        self.nested(Self::parse_unary_inner)
    }

    fn parse_unary_inner(&mut self) -> Result<Number, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.consume();
                Ok(neg(self.parse_unary()?))
            }
            Some(Token::Plus) => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    // power = primary ('**' unary)?
    //
    // Right-associative and binds tighter than a unary sign on its left,
    // so `-2 ** 2` is `-4` and `2 ** -1` is `0.5`.
    fn parse_power(&mut self) -> Result<Number, String> {
        let base = self.parse_primary()?;
        if let Some(Token::DoubleStar) = self.peek() {
            self.consume();
            let exponent = self.parse_unary()?;
            return finite(pow(base, exponent)?);
        }
        Ok(base)
    }

    // primary = NUMBER | '(' expr ')'
    fn parse_primary(&mut self) -> Result<Number, String> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(*n),
            Some(Token::LParen) => {
                let val = self.nested(Self::parse_expr)?;
                match self.consume() {
                    Some(Token::RParen) => Ok(val),
                    _ => Err("Expected closing parenthesis".into()),
                }
            }
            Some(tok) => Err(format!("Unexpected token: {:?}", tok)),
            None => Err("Unexpected end of expression".into()),
        }
    }
}

// ── Numeric operations ────────────────────────────────────────────────────

/// Reject results that left the float range.
fn finite(n: Number) -> Result<Number, String> {
    match n {
        Number::Float(x) if !x.is_finite() => Err("Numerical result out of range".into()),
        n => Ok(n),
    }
}

fn add(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x
            .checked_add(y)
            .map_or(Number::Float(x as f64 + y as f64), Number::Int),
        _ => Number::Float(a.as_f64() + b.as_f64()),
    }
}

fn sub(a: Number, b: Number) -> Number {
    add(a, neg(b))
}

fn mul(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x
            .checked_mul(y)
            .map_or(Number::Float(x as f64 * y as f64), Number::Int),
        _ => Number::Float(a.as_f64() * b.as_f64()),
    }
}

fn neg(a: Number) -> Number {
    match a {
        Number::Int(x) => x.checked_neg().map_or(Number::Float(-(x as f64)), Number::Int),
        Number::Float(x) => Number::Float(-x),
    }
}

fn true_div(a: Number, b: Number) -> Result<Number, String> {
    if b.is_zero() {
        return Err("division by zero".into());
    }
    Ok(Number::Float(a.as_f64() / b.as_f64()))
}

fn floor_div(a: Number, b: Number) -> Result<Number, String> {
    if b.is_zero() {
        return Err("integer division or modulo by zero".into());
    }
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => {
            let Some(q) = x.checked_div(y) else {
                return Ok(Number::Float((x as f64 / y as f64).floor()));
            };
            // Round toward negative infinity when the signs differ.
            if x % y != 0 && ((x < 0) != (y < 0)) {
                Ok(Number::Int(q - 1))
            } else {
                Ok(Number::Int(q))
            }
        }
        _ => Ok(Number::Float((a.as_f64() / b.as_f64()).floor())),
    }
}

fn modulo(a: Number, b: Number) -> Result<Number, String> {
    if b.is_zero() {
        return Err("integer division or modulo by zero".into());
    }
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => {
            let r = x.checked_rem(y).unwrap_or(0);
            // The remainder takes the sign of the divisor.
            if r != 0 && ((r < 0) != (y < 0)) {
                Ok(Number::Int(r + y))
            } else {
                Ok(Number::Int(r))
            }
        }
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            Ok(Number::Float(x - y * (x / y).floor()))
        }
    }
}

fn pow(base: Number, exponent: Number) -> Result<Number, String> {
    match (base, exponent) {
        (Number::Int(b), Number::Int(e)) if e >= 0 => {
            let exact = u32::try_from(e).ok().and_then(|e| b.checked_pow(e));
            Ok(exact.map_or(Number::Float((b as f64).powf(e as f64)), Number::Int))
        }
        _ => {
            if base.is_zero() && exponent.as_f64() < 0.0 {
                return Err("0.0 cannot be raised to a negative power".into());
            }
            let value = base.as_f64().powf(exponent.as_f64());
            if value.is_nan() {
                return Err("math domain error".into());
            }
            Ok(Number::Float(value))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
