use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// JSON kind of a response body, used in shape mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Array,
    Object,
    String,
    Number,
    Boolean,
    Null,
}

impl Shape {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Array(_) => Shape::Array,
            Value::Object(_) => Shape::Object,
            Value::String(_) => Shape::String,
            Value::Number(_) => Shape::Number,
            Value::Bool(_) => Shape::Boolean,
            Value::Null => Shape::Null,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Array => "array",
            Shape::Object => "object",
            Shape::String => "string",
            Shape::Number => "number",
            Shape::Boolean => "boolean",
            Shape::Null => "null",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("expected status {}, got {actual}", codes(.expected))]
    Status {
        expected: &'static [u16],
        actual: u16,
    },

    #[error("expected a JSON {expected}, got {actual}")]
    Shape { expected: Shape, actual: Shape },

    #[error("field `{field}` mismatch: expected {expected}, got {actual}")]
    Field {
        field: &'static str,
        expected: Value,
        actual: Value,
    },

    #[error("expected a JSON content type, got `{}`", .actual.as_deref().unwrap_or("none"))]
    ContentType { actual: Option<String> },

    #[error("hero {id} is still readable after delete")]
    StillPresent { id: i64 },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API_PORT must be a port number, got `{value}`")]
    InvalidPort { value: String },

    #[error("TIMEOUT must be milliseconds, got `{value}`")]
    InvalidTimeout { value: String },

    #[error("{key} must be a boolean (1/0, true/false, yes/no, on/off), got `{value}`")]
    InvalidFlag { key: &'static str, value: String },
}

fn codes(expected: &[u16]) -> String {
    expected
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}
