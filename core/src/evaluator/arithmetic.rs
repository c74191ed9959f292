//! Operator semantics.
//!
//! The interpreter never computes operator results itself; it hands the
//! operands to the configured [`Arithmetic`] strategy. Two engines with
//! different strategies can therefore evaluate the same tree differently.

use alloc::sync::Arc;
use core::cmp::Ordering;
use core::fmt;

use crate::evaluator::EvalError;
use crate::parser::BinaryOp;
use crate::values::Value;
use crate::{String, ToString};

/// Numeric, comparison and truthiness rules used during evaluation.
pub trait Arithmetic: Send + Sync + fmt::Debug {
    fn add(&self, left: &Value, right: &Value) -> Result<Value, EvalError>;
    fn sub(&self, left: &Value, right: &Value) -> Result<Value, EvalError>;
    fn mul(&self, left: &Value, right: &Value) -> Result<Value, EvalError>;
    fn div(&self, left: &Value, right: &Value) -> Result<Value, EvalError>;
    fn modulo(&self, left: &Value, right: &Value) -> Result<Value, EvalError>;
    fn negate(&self, operand: &Value) -> Result<Value, EvalError>;

    /// Ordering used by `<`, `<=`, `>` and `>=`.
    fn compare(&self, left: &Value, right: &Value) -> Result<Ordering, EvalError>;

    /// Equality used by `==` and `!=`.
    fn equals(&self, left: &Value, right: &Value) -> Result<bool, EvalError>;

    /// Boolean interpretation of a condition or logical operand.
    fn truthy(&self, value: &Value) -> Result<bool, EvalError>;

    /// Dispatches a binary operator to the matching method.
    fn binary(&self, op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
        match op {
            BinaryOp::Add => self.add(left, right),
            BinaryOp::Sub => self.sub(left, right),
            BinaryOp::Mul => self.mul(left, right),
            BinaryOp::Div => self.div(left, right),
            BinaryOp::Mod => self.modulo(left, right),
        }
    }
}

/// The bundled arithmetic.
///
/// - Integer operations wrap on overflow; integer division or modulo by zero
///   is an error. Float operations follow IEEE 754.
/// - Mixing an integer and a float produces a float.
/// - `+` concatenates as soon as one operand is a string.
/// - In lenient mode `null` behaves as `0` (or `""` when concatenating),
///   numeric strings are coerced to numbers and any value has a truthiness.
///   In strict mode all of these are errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardArithmetic {
    strict: bool,
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl StandardArithmetic {
    pub const fn lenient() -> Self {
        Self { strict: false }
    }

    pub const fn strict() -> Self {
        Self { strict: true }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    fn number(&self, op: BinaryOp, value: &Value, other: &Value) -> Result<Number, EvalError> {
        match value {
            Value::Int(i) => Ok(Number::Int(*i)),
            Value::Float(f) => Ok(Number::Float(*f)),
            Value::Null if self.strict => Err(EvalError::NullOperand { op: op.symbol() }),
            Value::Null => Ok(Number::Int(0)),
            Value::Str(s) if !self.strict => parse_number(s).ok_or(EvalError::TypeMismatch {
                op: op.symbol(),
                left: value.type_name(),
                right: other.type_name(),
            }),
            _ => Err(EvalError::TypeMismatch {
                op: op.symbol(),
                left: value.type_name(),
                right: other.type_name(),
            }),
        }
    }

    fn numeric(&self, op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
        let l = self.number(op, left, right)?;
        let r = self.number(op, right, left)?;
        match (l, r) {
            (Number::Int(a), Number::Int(b)) => eval_binary_int(op, a, b).map(Value::Int),
            (a, b) => Ok(Value::Float(eval_binary_float(op, a.as_f64(), b.as_f64()))),
        }
    }

    fn text(&self, value: &Value) -> String {
        match value {
            Value::Str(s) => s.to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

fn parse_number(s: &str) -> Option<Number> {
    let s = s.trim();
    s.parse::<i64>()
        .map(Number::Int)
        .or_else(|_| s.parse::<f64>().map(Number::Float))
        .ok()
}

/// Evaluate a binary operation on two integers.
///
/// Uses wrapping arithmetic to prevent panics on overflow.
/// Division by zero returns an error.
pub(crate) fn eval_binary_int(op: BinaryOp, left: i64, right: i64) -> Result<i64, EvalError> {
    match op {
        BinaryOp::Add => Ok(left.wrapping_add(right)),
        BinaryOp::Sub => Ok(left.wrapping_sub(right)),
        BinaryOp::Mul => Ok(left.wrapping_mul(right)),
        BinaryOp::Div | BinaryOp::Mod if right == 0 => Err(EvalError::DivisionByZero),
        // Wrapping variants handle i64::MIN / -1.
        BinaryOp::Div => Ok(left.wrapping_div(right)),
        BinaryOp::Mod => Ok(left.wrapping_rem(right)),
    }
}

/// Evaluate a binary operation on two floats.
///
/// Follows IEEE 754 semantics (produces inf/nan rather than panicking).
pub(crate) fn eval_binary_float(op: BinaryOp, left: f64, right: f64) -> f64 {
    match op {
        BinaryOp::Add => left + right,
        BinaryOp::Sub => left - right,
        BinaryOp::Mul => left * right,
        BinaryOp::Div => left / right,
        BinaryOp::Mod => left % right,
    }
}

impl Arithmetic for StandardArithmetic {
    fn add(&self, left: &Value, right: &Value) -> Result<Value, EvalError> {
        if self.strict && (left.is_null() || right.is_null()) {
            return Err(EvalError::NullOperand { op: "+" });
        }
        if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
            let mut out = self.text(left);
            out.push_str(&self.text(right));
            return Ok(Value::Str(Arc::from(out)));
        }
        self.numeric(BinaryOp::Add, left, right)
    }

    fn sub(&self, left: &Value, right: &Value) -> Result<Value, EvalError> {
        self.numeric(BinaryOp::Sub, left, right)
    }

    fn mul(&self, left: &Value, right: &Value) -> Result<Value, EvalError> {
        self.numeric(BinaryOp::Mul, left, right)
    }

    fn div(&self, left: &Value, right: &Value) -> Result<Value, EvalError> {
        self.numeric(BinaryOp::Div, left, right)
    }

    fn modulo(&self, left: &Value, right: &Value) -> Result<Value, EvalError> {
        self.numeric(BinaryOp::Mod, left, right)
    }

    fn negate(&self, operand: &Value) -> Result<Value, EvalError> {
        match operand {
            Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Null if self.strict => Err(EvalError::NullOperand { op: "-" }),
            Value::Null => Ok(Value::Int(0)),
            Value::Str(s) if !self.strict => match parse_number(s) {
                Some(Number::Int(i)) => Ok(Value::Int(i.wrapping_neg())),
                Some(Number::Float(f)) => Ok(Value::Float(-f)),
                None => Err(EvalError::InvalidOperand {
                    op: "-",
                    operand: operand.type_name(),
                }),
            },
            other => Err(EvalError::InvalidOperand {
                op: "-",
                operand: other.type_name(),
            }),
        }
    }

    fn compare(&self, left: &Value, right: &Value) -> Result<Ordering, EvalError> {
        let mismatch = || EvalError::TypeMismatch {
            op: "<",
            left: left.type_name(),
            right: right.type_name(),
        };
        match (left, right) {
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::Null, _) | (_, Value::Null) if self.strict => {
                Err(EvalError::NullOperand { op: "<" })
            }
            (Value::Null, Value::Str(b)) => Ok("".cmp(b)),
            (Value::Str(a), Value::Null) => Ok((**a).cmp("")),
            _ => {
                let l = self.number(BinaryOp::Sub, left, right).map_err(|_| mismatch())?;
                let r = self.number(BinaryOp::Sub, right, left).map_err(|_| mismatch())?;
                match (l, r) {
                    (Number::Int(a), Number::Int(b)) => Ok(a.cmp(&b)),
                    (a, b) => a.as_f64().partial_cmp(&b.as_f64()).ok_or_else(mismatch),
                }
            }
        }
    }

    fn equals(&self, left: &Value, right: &Value) -> Result<bool, EvalError> {
        Ok(match (left, right) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Str(s), Value::Int(_) | Value::Float(_))
            | (Value::Int(_) | Value::Float(_), Value::Str(s)) => {
                let number = if matches!(left, Value::Str(_)) { right } else { left };
                match (self.strict, parse_number(s)) {
                    (false, Some(parsed)) => {
                        let parsed = match parsed {
                            Number::Int(i) => Value::Int(i),
                            Number::Float(f) => Value::Float(f),
                        };
                        self.equals(&parsed, number)?
                    }
                    _ => false,
                }
            }
            (a, b) => a == b,
        })
    }

    fn truthy(&self, value: &Value) -> Result<bool, EvalError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Null if self.strict => Err(EvalError::NullOperand { op: "condition" }),
            _ if self.strict => Err(EvalError::InvalidOperand {
                op: "condition",
                operand: value.type_name(),
            }),
            Value::Null => Ok(false),
            Value::Int(i) => Ok(*i != 0),
            Value::Float(f) => Ok(*f != 0.0),
            Value::Str(s) => Ok(!s.is_empty()),
            Value::Array(items) => Ok(!items.is_empty()),
            Value::Map(entries) => Ok(!entries.is_empty()),
            Value::Object(_) => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LENIENT: StandardArithmetic = StandardArithmetic::lenient();
    const STRICT: StandardArithmetic = StandardArithmetic::strict();

    #[test]
    fn test_int_ops() {
        assert_eq!(eval_binary_int(BinaryOp::Add, 2, 3).unwrap(), 5);
        assert_eq!(eval_binary_int(BinaryOp::Sub, 3, 10).unwrap(), -7);
        assert_eq!(eval_binary_int(BinaryOp::Mul, -2, 5).unwrap(), -10);
        assert_eq!(eval_binary_int(BinaryOp::Div, 7, 3).unwrap(), 2);
        assert_eq!(eval_binary_int(BinaryOp::Mod, 7, 3).unwrap(), 1);
    }

    #[test]
    fn test_int_div_by_zero() {
        let result = eval_binary_int(BinaryOp::Div, 10, 0);
        assert!(matches!(result, Err(EvalError::DivisionByZero)));
        let result = eval_binary_int(BinaryOp::Mod, 10, 0);
        assert!(matches!(result, Err(EvalError::DivisionByZero)));
    }

    #[test]
    fn test_int_wrapping_overflow() {
        // Test that we wrap on overflow rather than panic
        let result = eval_binary_int(BinaryOp::Add, i64::MAX, 1).unwrap();
        assert_eq!(result, i64::MIN);

        let result = eval_binary_int(BinaryOp::Mul, i64::MAX, 2).unwrap();
        assert_eq!(result, -2);

        let result = eval_binary_int(BinaryOp::Div, i64::MIN, -1).unwrap();
        assert_eq!(result, i64::MIN);
    }

    #[test]
    fn test_float_div_by_zero() {
        let result = eval_binary_float(BinaryOp::Div, 1.0, 0.0);
        assert!(result.is_infinite() && result.is_sign_positive());
    }

    #[test]
    fn test_mixed_promotes_to_float() {
        assert_eq!(
            LENIENT.add(&Value::Int(1), &Value::Float(0.5)).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(
            LENIENT.div(&Value::Int(7), &Value::Int(2)).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn test_concatenation() {
        assert_eq!(
            LENIENT.add(&Value::from("n="), &Value::Int(3)).unwrap(),
            Value::from("n=3")
        );
        assert_eq!(
            LENIENT.add(&Value::Null, &Value::from("x")).unwrap(),
            Value::from("x")
        );
        assert!(matches!(
            STRICT.add(&Value::Null, &Value::from("x")),
            Err(EvalError::NullOperand { op: "+" })
        ));
    }

    #[test]
    fn test_null_operands() {
        assert_eq!(LENIENT.add(&Value::Null, &Value::Int(1)).unwrap(), Value::Int(1));
        assert_eq!(LENIENT.negate(&Value::Null).unwrap(), Value::Int(0));
        assert!(matches!(
            STRICT.mul(&Value::Null, &Value::Int(1)),
            Err(EvalError::NullOperand { op: "*" })
        ));
    }

    #[test]
    fn test_numeric_strings() {
        assert_eq!(
            LENIENT.mul(&Value::from("3"), &Value::Int(2)).unwrap(),
            Value::Int(6)
        );
        assert!(matches!(
            STRICT.mul(&Value::from("3"), &Value::Int(2)),
            Err(EvalError::TypeMismatch { op: "*", left: "string", right: "int" })
        ));
        assert!(LENIENT.sub(&Value::from("abc"), &Value::Int(1)).is_err());
    }

    #[test]
    fn test_compare() {
        assert_eq!(
            LENIENT.compare(&Value::Int(1), &Value::Float(1.5)).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            LENIENT.compare(&Value::from("b"), &Value::from("a")).unwrap(),
            Ordering::Greater
        );
        assert!(LENIENT.compare(&Value::Bool(true), &Value::Int(1)).is_err());
        assert!(STRICT.compare(&Value::Null, &Value::Int(1)).is_err());
    }

    #[test]
    fn test_equals() {
        assert!(LENIENT.equals(&Value::Int(2), &Value::Float(2.0)).unwrap());
        assert!(LENIENT.equals(&Value::from("2"), &Value::Int(2)).unwrap());
        assert!(!STRICT.equals(&Value::from("2"), &Value::Int(2)).unwrap());
        assert!(!LENIENT.equals(&Value::Null, &Value::Int(0)).unwrap());
        assert!(STRICT.equals(&Value::Null, &Value::Null).unwrap());
    }

    #[test]
    fn test_truthy() {
        assert!(!LENIENT.truthy(&Value::Null).unwrap());
        assert!(LENIENT.truthy(&Value::from("x")).unwrap());
        assert!(!LENIENT.truthy(&Value::Int(0)).unwrap());
        assert!(STRICT.truthy(&Value::Bool(true)).unwrap());
        assert!(STRICT.truthy(&Value::Int(1)).is_err());
    }

    #[test]
    fn test_binary_dispatch() {
        assert_eq!(
            LENIENT
                .binary(BinaryOp::Mod, &Value::Int(9), &Value::Int(4))
                .unwrap(),
            Value::Int(1)
        );
    }
}
