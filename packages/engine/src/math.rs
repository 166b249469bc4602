//! Math operator tokens and arithmetic on stored numbers.

use serde_json::{Number, Value};

use nestdb_core::Error;

/// A recognized arithmetic operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl MathOp {
    /// Parse an operator token. Accepted aliases:
    ///
    /// * `add`, `+`
    /// * `subtract`, `sub`, `substr`, `-`
    /// * `multiply`, `mul`, `*`
    /// * `divide`, `div`, `/`
    /// * `mod`, `%`
    pub fn parse(token: &str) -> Result<Self, Error> {
        match token {
            "add" | "+" => Ok(MathOp::Add),
            "subtract" | "sub" | "substr" | "-" => Ok(MathOp::Subtract),
            "multiply" | "mul" | "*" => Ok(MathOp::Multiply),
            "divide" | "div" | "/" => Ok(MathOp::Divide),
            "mod" | "%" => Ok(MathOp::Modulo),
            _ => Err(Error::InvalidOperator {
                token: token.to_string(),
            }),
        }
    }

    /// Apply the operator. A non-finite result (division by zero and
    /// friends) is rejected so it can never be persisted.
    pub fn apply(self, current: f64, operand: f64) -> Result<f64, Error> {
        let result = match self {
            MathOp::Add => current + operand,
            MathOp::Subtract => current - operand,
            MathOp::Multiply => current * operand,
            MathOp::Divide => current / operand,
            MathOp::Modulo => current % operand,
        };
        if !result.is_finite() {
            return Err(Error::InvalidValue {
                message: format!("math produced a non-finite result ({})", result),
            });
        }
        Ok(result)
    }
}

/// Turn an arithmetic result back into a JSON number, preferring the
/// integer representation when the value is whole.
pub fn to_number(result: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
    if result.fract() == 0.0 && result.abs() <= MAX_EXACT {
        return Value::from(result as i64);
    }
    match Number::from_f64(result) {
        Some(n) => Value::Number(n),
        None => Value::Null,
    }
}

/// Read the numeric content of a stored value. Absent coerces to 0.
pub fn coerce_numeric(current: Option<&Value>, key: &str) -> Result<f64, Error> {
    match current {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| Error::InvalidValue {
            message: format!("value at '{}' is not representable as f64", key),
        }),
        Some(other) => Err(Error::target_type(format!(
            "expected number at '{}', found {}",
            key,
            nestdb_core::value_path::type_tag(other)
        ))),
    }
}
