use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators the keypad can leave pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
}

impl OperatorKind {
    /// Wire token, also used verbatim in history entries.
    pub fn token(self) -> &'static str {
        match self {
            OperatorKind::Add => "+",
            OperatorKind::Subtract => "-",
            OperatorKind::Multiply => "*",
            OperatorKind::Divide => "/",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "+" => Some(OperatorKind::Add),
            "-" => Some(OperatorKind::Subtract),
            "*" => Some(OperatorKind::Multiply),
            "/" => Some(OperatorKind::Divide),
            _ => None,
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Body of `POST /api/calculate`. `b` is omitted for unary functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRequest {
    pub operation: String,
    pub a: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub b: Option<f64>,
}

impl EvalRequest {
    pub fn binary(op: OperatorKind, a: f64, b: f64) -> Self {
        Self {
            operation: op.token().to_string(),
            a,
            b: Some(b),
        }
    }

    pub fn unary(name: impl Into<String>, a: f64) -> Self {
        Self {
            operation: name.into(),
            a,
            b: None,
        }
    }
}

/// Either half may be present; a non-empty `error` wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalResponse {
    #[serde(default)]
    pub result: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Function names the calculation service understands.
pub const KNOWN_FUNCTIONS: [&str; 6] = ["sqrt", "sin", "cos", "tan", "log", "ln"];
