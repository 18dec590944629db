//! Operator Vocabulary
//!
//! Operator nodes apply one of a fixed set of functions over their
//! children's numeric values. Division and modulo by zero produce IEEE
//! sentinel values (infinity/NaN) rather than aborting the frame, and
//! `and`/`or` short-circuit left to right so untaken operands keep their
//! effects unfired for the generation.

use serde::{Deserialize, Serialize};

use crate::graph::eval::EvalScope;
use crate::graph::node::NodeId;
use crate::value::Value;

/// Operation codes matching the wire-level `op` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    // Folds
    Add,
    Sub,
    Multiply,
    Divide,
    Pow,
    Modulo,
    Max,
    Min,

    // Unary
    Sqrt,
    Log,
    Sin,
    Cos,
    Tan,
    Acos,
    Asin,
    Atan,
    Exp,
    Round,
    Abs,
    Ceil,
    Floor,
    Not,
    Defined,

    // Logical (short-circuiting)
    And,
    Or,

    // Comparison
    LessThan,
    Eq,
    GreaterThan,
    LessOrEq,
    GreaterOrEq,
    Neq,
}

/// Positive-remainder modulo, matching the scripting layer's `modulo`.
fn modulo(a: f64, b: f64) -> f64 {
    ((a % b) + b) % b
}

fn bool_value(b: bool) -> Value {
    Value::Number(if b { 1.0 } else { 0.0 })
}

/// Apply `op` over the operand nodes, evaluating them through `scope`.
pub(crate) fn apply(scope: &mut EvalScope<'_>, op: Operator, operands: &[NodeId]) -> Value {
    use Operator::*;

    match op {
        Add => fold(scope, operands, |a, b| a + b),
        Sub => fold(scope, operands, |a, b| a - b),
        Multiply => fold(scope, operands, |a, b| a * b),
        Divide => fold(scope, operands, |a, b| a / b),
        Pow => fold(scope, operands, f64::powf),
        Modulo => fold(scope, operands, modulo),
        Max => fold(scope, operands, f64::max),
        Min => fold(scope, operands, f64::min),

        Sqrt => unary(scope, operands, f64::sqrt),
        Log => unary(scope, operands, f64::ln),
        Sin => unary(scope, operands, f64::sin),
        Cos => unary(scope, operands, f64::cos),
        Tan => unary(scope, operands, f64::tan),
        Acos => unary(scope, operands, f64::acos),
        Asin => unary(scope, operands, f64::asin),
        Atan => unary(scope, operands, f64::atan),
        Exp => unary(scope, operands, f64::exp),
        Round => unary(scope, operands, f64::round),
        Abs => unary(scope, operands, f64::abs),
        Ceil => unary(scope, operands, f64::ceil),
        Floor => unary(scope, operands, f64::floor),

        Not => {
            let truthy = first_value(scope, operands).is_truthy();
            bool_value(!truthy)
        }
        Defined => {
            let defined = first_value(scope, operands).is_defined();
            bool_value(defined)
        }

        And => {
            for &operand in operands {
                if !crate::graph::eval::evaluate(scope, operand).is_truthy() {
                    return bool_value(false);
                }
            }
            bool_value(!operands.is_empty())
        }
        Or => {
            for &operand in operands {
                if crate::graph::eval::evaluate(scope, operand).is_truthy() {
                    return bool_value(true);
                }
            }
            bool_value(false)
        }

        LessThan => compare(scope, operands, |a, b| a < b),
        Eq => compare(scope, operands, |a, b| a == b),
        GreaterThan => compare(scope, operands, |a, b| a > b),
        LessOrEq => compare(scope, operands, |a, b| a <= b),
        GreaterOrEq => compare(scope, operands, |a, b| a >= b),
        Neq => compare(scope, operands, |a, b| a != b),
    }
}

/// Left fold over all operands. A single operand folds to itself; an empty
/// operand list folds to 0.
fn fold(scope: &mut EvalScope<'_>, operands: &[NodeId], f: impl Fn(f64, f64) -> f64) -> Value {
    let mut iter = operands.iter();
    let Some(&first) = iter.next() else {
        return Value::zero();
    };
    let mut acc = crate::graph::eval::evaluate(scope, first).as_number();
    for &operand in iter {
        let rhs = crate::graph::eval::evaluate(scope, operand).as_number();
        acc = f(acc, rhs);
    }
    Value::Number(acc)
}

fn unary(scope: &mut EvalScope<'_>, operands: &[NodeId], f: impl Fn(f64) -> f64) -> Value {
    Value::Number(f(first_value(scope, operands).as_number()))
}

fn compare(scope: &mut EvalScope<'_>, operands: &[NodeId], f: impl Fn(f64, f64) -> bool) -> Value {
    let a = first_value(scope, operands).as_number();
    let b = operands
        .get(1)
        .map(|&id| crate::graph::eval::evaluate(scope, id).as_number())
        .unwrap_or(0.0);
    bool_value(f(a, b))
}

fn first_value(scope: &mut EvalScope<'_>, operands: &[NodeId]) -> Value {
    operands
        .first()
        .map(|&id| crate::graph::eval::evaluate(scope, id))
        .unwrap_or(Value::Null)
}
