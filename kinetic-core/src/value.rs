//! Graph Values
//!
//! Every node in the dataflow graph produces a `Value` when evaluated.
//! Most animated outputs are plain numbers, but composite nodes (props,
//! style, transform) produce maps and lists, events carry structured
//! payloads, and concat produces text.
//!
//! # Coercion Rules
//!
//! The evaluator never fails on a type mismatch. Instead, values coerce:
//!
//! - Numeric context: `Null` is 0, booleans are 0/1, anything that cannot
//!   be read as a number is NaN. Arithmetic on NaN follows IEEE 754, so a
//!   bad operand degrades the result instead of aborting the frame.
//! - Boolean context: non-zero, non-NaN numbers are true, `Null` is false,
//!   text is true when non-empty.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A value flowing through the dataflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value. Reads of never-delivered event fields produce this.
    Null,
    /// A scalar number. The common case for animated properties.
    Number(f64),
    /// A boolean, produced by comparison operators when read as JSON.
    Bool(bool),
    /// A string, produced by concat nodes.
    Text(String),
    /// An ordered list, produced by transform nodes.
    List(Vec<Value>),
    /// A named map, produced by props and style nodes and event payloads.
    Map(IndexMap<String, Value>),
}

impl Value {
    /// The zero value, used wherever a missing node resolves to no-op
    /// semantics.
    pub fn zero() -> Value {
        Value::Number(0.0)
    }

    /// Read this value in a numeric context.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Number(n) => *n,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
            Value::List(_) | Value::Map(_) => f64::NAN,
        }
    }

    /// Read this value in a boolean context.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Bool(b) => *b,
            Value::Text(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
        }
    }

    /// Whether this value counts as defined for the `defined` operator:
    /// anything except `Null` and NaN.
    pub fn is_defined(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Number(n) => !n.is_nan(),
            _ => true,
        }
    }

    /// Render this value the way concat nodes join their children.
    ///
    /// Whole numbers print without a fractional part so that
    /// `concat(height, "px")` produces `"100px"` rather than `"100.0px"`.
    pub fn stringify(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Number(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
            Value::Text(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::stringify)
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) => "[object]".to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}
