//! Operator semantics.
//!
//! Null propagates through every operator except `IS [NOT] NULL` and the
//! three-valued `AND`/`OR`, which live in the evaluator so they can short-circuit.

use crate::ast::{BinaryOp, UnaryOp};
use crate::error::EvalError;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use rivulet_core::{Value, ValueType};

/// Applies a non-logical binary operator.
pub(crate) fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }

    match op {
        BinaryOp::Eq => Ok(Value::Bool(equals(left, right))),
        BinaryOp::Ne => Ok(Value::Bool(!equals(left, right))),
        BinaryOp::Lt => compare(op, left, right).map(|ord| Value::Bool(ord == Ordering::Less)),
        BinaryOp::Le => {
            compare(op, left, right).map(|ord| Value::Bool(ord != Ordering::Greater))
        }
        BinaryOp::Gt => {
            compare(op, left, right).map(|ord| Value::Bool(ord == Ordering::Greater))
        }
        BinaryOp::Ge => compare(op, left, right).map(|ord| Value::Bool(ord != Ordering::Less)),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic(op, left, right)
        }
        BinaryOp::Concat => concat(left, right),
        BinaryOp::And | BinaryOp::Or => {
            let l = truth(left)?;
            let r = truth(right)?;
            Ok(match op {
                BinaryOp::And => combine_and(l, r),
                _ => combine_or(l, r),
            })
        }
    }
}

/// Numbers compare across Int and Float; everything else compares structurally.
fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
            left.compare(right) == Some(Ordering::Equal)
        }
        _ => left == right,
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    left.compare(right).ok_or_else(|| {
        EvalError::unsupported_binary(op.symbol(), left.value_type(), right.value_type())
    })
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_arithmetic(op, *a, *b).map(Value::Int),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let a = left.to_float()?;
            let b = right.to_float()?;
            Ok(Value::Float(float_arithmetic(op, a, b)))
        }
        // Timestamps shift by a number of microseconds; their difference is a duration.
        (Value::Timestamp(t), Value::Int(d)) if matches!(op, BinaryOp::Add | BinaryOp::Sub) => {
            int_arithmetic(op, *t, *d).map(Value::Timestamp)
        }
        (Value::Int(d), Value::Timestamp(t)) if op == BinaryOp::Add => {
            int_arithmetic(op, *d, *t).map(Value::Timestamp)
        }
        (Value::Timestamp(a), Value::Timestamp(b)) if op == BinaryOp::Sub => {
            int_arithmetic(op, *a, *b).map(Value::Int)
        }
        _ => Err(EvalError::unsupported_binary(
            op.symbol(),
            left.value_type(),
            right.value_type(),
        )),
    }
}

fn int_arithmetic(op: BinaryOp, a: i64, b: i64) -> Result<i64, EvalError> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div | BinaryOp::Mod if b == 0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Mod => a.checked_rem(b),
        _ => {
            return Err(EvalError::unsupported_binary(
                op.symbol(),
                ValueType::Int,
                ValueType::Int,
            ))
        }
    };
    result.ok_or(EvalError::Overflow { op: op.symbol() })
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => libm::fmod(a, b),
    }
}

fn concat(left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => {
            let mut out = String::with_capacity(a.len() + b.len());
            out.push_str(a);
            out.push_str(b);
            Ok(Value::String(out))
        }
        (Value::Array(a), Value::Array(b)) => {
            let mut out = Vec::with_capacity(a.len() + b.len());
            out.extend_from_slice(a);
            out.extend_from_slice(b);
            Ok(Value::Array(out))
        }
        (Value::Blob(a), Value::Blob(b)) => {
            let mut out = Vec::with_capacity(a.len() + b.len());
            out.extend_from_slice(a);
            out.extend_from_slice(b);
            Ok(Value::Blob(out))
        }
        _ => Err(EvalError::unsupported_binary(
            "||",
            left.value_type(),
            right.value_type(),
        )),
    }
}

/// Three-valued truth of an operand: None is unknown.
pub(crate) fn truth(value: &Value) -> Result<Option<bool>, EvalError> {
    match value {
        Value::Null => Ok(None),
        other => Ok(Some(other.to_bool()?)),
    }
}

pub(crate) fn combine_and(left: Option<bool>, right: Option<bool>) -> Value {
    match (left, right) {
        (Some(false), _) | (_, Some(false)) => Value::Bool(false),
        (Some(true), Some(true)) => Value::Bool(true),
        _ => Value::Null,
    }
}

pub(crate) fn combine_or(left: Option<bool>, right: Option<bool>) -> Value {
    match (left, right) {
        (Some(true), _) | (_, Some(true)) => Value::Bool(true),
        (Some(false), Some(false)) => Value::Bool(false),
        _ => Value::Null,
    }
}

pub(crate) fn unary(op: UnaryOp, value: &Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::IsNull => Ok(Value::Bool(value.is_null())),
        UnaryOp::IsNotNull => Ok(Value::Bool(!value.is_null())),
        UnaryOp::Not => Ok(match truth(value)? {
            Some(b) => Value::Bool(!b),
            None => Value::Null,
        }),
        UnaryOp::Neg => match value {
            Value::Null => Ok(Value::Null),
            Value::Int(i) => i
                .checked_neg()
                .map(Value::Int)
                .ok_or(EvalError::Overflow { op: "-" }),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(EvalError::unsupported_unary("-", other.value_type())),
        },
    }
}

/// Converts a value to a scalar type. Null casts to null.
pub(crate) fn cast(value: &Value, target: ValueType) -> Result<Value, EvalError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let result = match target {
        ValueType::Bool => Value::Bool(value.to_bool()?),
        ValueType::Int => Value::Int(value.to_int()?),
        ValueType::Float => Value::Float(value.to_float()?),
        ValueType::String => Value::String(value.to_string_value()?),
        ValueType::Timestamp => Value::Timestamp(value.to_timestamp()?),
        ValueType::Blob => Value::Blob(value.to_blob()?),
        ValueType::Null | ValueType::Array | ValueType::Map => {
            return Err(rivulet_core::Error::type_mismatch(target, value.value_type()).into())
        }
    };
    Ok(result)
}
