//! Member resolution on runtime values.
//!
//! Property access, assignment, method calls, indexing and the `size()`
//! built-in all go through a [`ValueResolver`]. The bundled
//! [`Introspector`] understands strings, arrays, maps and host objects.

use alloc::sync::Arc;
use core::fmt;

use crate::evaluator::EvalError;
use crate::values::Value;
use crate::{String, ToString, Vec, format};

/// Strategy for resolving members on values.
pub trait ValueResolver: Send + Sync + fmt::Debug {
    fn get_property(&self, target: &Value, name: &str) -> Result<Value, EvalError>;

    fn set_property(&self, target: &Value, name: &str, value: Value) -> Result<(), EvalError>;

    fn invoke_method(&self, target: &Value, name: &str, args: &[Value])
        -> Result<Value, EvalError>;

    fn index(&self, target: &Value, index: &Value) -> Result<Value, EvalError>;

    /// Length used by `size()` and `empty()`.
    fn size_of(&self, target: &Value) -> Result<usize, EvalError>;
}

/// The bundled [`ValueResolver`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Introspector;

impl Introspector {
    pub fn new() -> Self {
        Self
    }
}

fn expect_args(name: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::WrongArgumentCount {
            name: name.to_string(),
            expected,
            got: args.len(),
        })
    }
}

fn str_arg<'a>(method: &str, args: &'a [Value], position: usize) -> Result<&'a str, EvalError> {
    match &args[position] {
        Value::Str(s) => Ok(&**s),
        other => Err(EvalError::InvalidArgument {
            method: method.to_string(),
            position,
            expected: "a string",
            found: other.type_name(),
        }),
    }
}

fn int_arg(method: &str, args: &[Value], position: usize) -> Result<i64, EvalError> {
    match &args[position] {
        Value::Int(i) => Ok(*i),
        other => Err(EvalError::InvalidArgument {
            method: method.to_string(),
            position,
            expected: "an integer",
            found: other.type_name(),
        }),
    }
}

/// Converts an index into a position, rejecting negative or too-large values.
fn position(index: i64, len: usize) -> Result<usize, EvalError> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or(EvalError::IndexOutOfBounds { index, len })
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let value = match name {
        "length" | "size" => {
            expect_args(name, args, 0)?;
            Value::Int(s.chars().count() as i64)
        }
        "isEmpty" => {
            expect_args(name, args, 0)?;
            Value::Bool(s.is_empty())
        }
        "toUpperCase" => {
            expect_args(name, args, 0)?;
            Value::from(s.to_uppercase())
        }
        "toLowerCase" => {
            expect_args(name, args, 0)?;
            Value::from(s.to_lowercase())
        }
        "trim" => {
            expect_args(name, args, 0)?;
            Value::from(s.trim())
        }
        "startsWith" => {
            expect_args(name, args, 1)?;
            Value::Bool(s.starts_with(str_arg(name, args, 0)?))
        }
        "endsWith" => {
            expect_args(name, args, 1)?;
            Value::Bool(s.ends_with(str_arg(name, args, 0)?))
        }
        "contains" => {
            expect_args(name, args, 1)?;
            Value::Bool(s.contains(str_arg(name, args, 0)?))
        }
        "substring" => {
            if args.is_empty() || args.len() > 2 {
                return Err(EvalError::WrongArgumentCount {
                    name: name.to_string(),
                    expected: 2,
                    got: args.len(),
                });
            }
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len();
            let start = int_arg(name, args, 0)?;
            let end = match args.get(1) {
                Some(_) => int_arg(name, args, 1)?,
                None => len as i64,
            };
            // Both bounds may equal the length.
            let start_pos = position(start, len + 1)?;
            let end_pos = position(end, len + 1)?;
            if start_pos > end_pos {
                return Err(EvalError::IndexOutOfBounds { index: start, len });
            }
            Value::from(chars[start_pos..end_pos].iter().collect::<String>())
        }
        _ => {
            return Err(EvalError::UnknownMethod {
                name: name.to_string(),
                on: "string",
            });
        }
    };
    Ok(value)
}

fn array_method(items: &[Value], name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let value = match name {
        "size" | "length" => {
            expect_args(name, args, 0)?;
            Value::Int(items.len() as i64)
        }
        "isEmpty" => {
            expect_args(name, args, 0)?;
            Value::Bool(items.is_empty())
        }
        "get" => {
            expect_args(name, args, 1)?;
            let index = int_arg(name, args, 0)?;
            items[position(index, items.len())?].clone()
        }
        "contains" => {
            expect_args(name, args, 1)?;
            Value::Bool(items.contains(&args[0]))
        }
        _ => {
            return Err(EvalError::UnknownMethod {
                name: name.to_string(),
                on: "array",
            });
        }
    };
    Ok(value)
}

fn map_method(
    entries: &hashbrown::HashMap<String, Value>,
    name: &str,
    args: &[Value],
) -> Result<Value, EvalError> {
    let value = match name {
        "size" => {
            expect_args(name, args, 0)?;
            Value::Int(entries.len() as i64)
        }
        "isEmpty" => {
            expect_args(name, args, 0)?;
            Value::Bool(entries.is_empty())
        }
        "get" => {
            expect_args(name, args, 1)?;
            let key = str_arg(name, args, 0)?;
            entries.get(key).cloned().unwrap_or(Value::Null)
        }
        "containsKey" => {
            expect_args(name, args, 1)?;
            Value::Bool(entries.contains_key(str_arg(name, args, 0)?))
        }
        _ => {
            return Err(EvalError::UnknownMethod {
                name: name.to_string(),
                on: "map",
            });
        }
    };
    Ok(value)
}

impl ValueResolver for Introspector {
    fn get_property(&self, target: &Value, name: &str) -> Result<Value, EvalError> {
        match target {
            Value::Null => Err(EvalError::NullDereference {
                name: name.to_string(),
            }),
            // Missing keys read as null.
            Value::Map(entries) => Ok(entries.get(name).cloned().unwrap_or(Value::Null)),
            Value::Object(obj) => obj.get(name).ok_or_else(|| EvalError::UnknownProperty {
                name: name.to_string(),
                on: obj.type_name(),
            }),
            Value::Str(s) if name == "length" => Ok(Value::Int(s.chars().count() as i64)),
            Value::Array(items) if name == "length" => Ok(Value::Int(items.len() as i64)),
            other => Err(EvalError::UnknownProperty {
                name: name.to_string(),
                on: other.type_name(),
            }),
        }
    }

    fn set_property(&self, target: &Value, name: &str, value: Value) -> Result<(), EvalError> {
        match target {
            Value::Null => Err(EvalError::NullDereference {
                name: name.to_string(),
            }),
            Value::Object(obj) => match obj.set(name, value) {
                Some(result) => result.map_err(EvalError::Host),
                None => Err(EvalError::UnknownProperty {
                    name: name.to_string(),
                    on: obj.type_name(),
                }),
            },
            other => Err(EvalError::NotAssignable {
                target: format!("'{}' on {}", name, other.type_name()),
            }),
        }
    }

    fn invoke_method(
        &self,
        target: &Value,
        name: &str,
        args: &[Value],
    ) -> Result<Value, EvalError> {
        match target {
            Value::Null => Err(EvalError::NullDereference {
                name: name.to_string(),
            }),
            Value::Str(s) => string_method(s, name, args),
            Value::Array(items) => array_method(items, name, args),
            Value::Map(entries) => map_method(entries, name, args),
            Value::Object(obj) => match obj.call(name, args) {
                Some(result) => result.map_err(EvalError::Host),
                None => Err(EvalError::UnknownMethod {
                    name: name.to_string(),
                    on: obj.type_name(),
                }),
            },
            other => Err(EvalError::UnknownMethod {
                name: name.to_string(),
                on: other.type_name(),
            }),
        }
    }

    fn index(&self, target: &Value, index: &Value) -> Result<Value, EvalError> {
        match (target, index) {
            (Value::Null, _) => Err(EvalError::NullDereference {
                name: index.to_string(),
            }),
            (Value::Array(items), Value::Int(i)) => Ok(items[position(*i, items.len())?].clone()),
            (Value::Str(s), Value::Int(i)) => {
                let len = s.chars().count();
                let pos = position(*i, len)?;
                Ok(s.chars()
                    .nth(pos)
                    .map(|c| Value::Str(Arc::from(c.to_string())))
                    .unwrap_or(Value::Null))
            }
            (Value::Map(entries), Value::Str(key)) => {
                Ok(entries.get(&**key).cloned().unwrap_or(Value::Null))
            }
            (Value::Object(_), Value::Str(key)) => self.get_property(target, key),
            _ => Err(EvalError::InvalidIndex {
                target: target.type_name(),
                index: index.type_name(),
            }),
        }
    }

    fn size_of(&self, target: &Value) -> Result<usize, EvalError> {
        match target {
            Value::Null => Ok(0),
            Value::Str(s) => Ok(s.chars().count()),
            Value::Array(items) => Ok(items.len()),
            Value::Map(entries) => Ok(entries.len()),
            Value::Object(obj) => obj.size().ok_or(EvalError::InvalidOperand {
                op: "size",
                operand: obj.type_name(),
            }),
            other => Err(EvalError::InvalidOperand {
                op: "size",
                operand: other.type_name(),
            }),
        }
    }
}
