//! Compiled expression evaluators.

use super::ops;
use crate::ast::{BinaryOp, UnaryOp};
use crate::compiler::AGGREGATE_KEY_PREFIX;
use crate::error::EvalError;
use crate::function::ScalarFunction;
use crate::plan::is_meta_key;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use rivulet_core::{Map, Path, Value, ValueType};

/// An executable expression.
///
/// Evaluators are immutable once compiled and never modify the record they
/// read, so a single evaluator can serve any number of threads.
#[derive(Clone, Debug)]
pub enum Evaluator {
    /// Constant value.
    Literal(Value),
    /// Reads `path` from the record, or from the record nested under `alias`.
    Field { alias: Option<String>, path: Path },
    /// The whole record without internal keys, or the record under `alias`.
    Wildcard { alias: Option<String> },
    Binary {
        op: BinaryOp,
        left: Box<Evaluator>,
        right: Box<Evaluator>,
    },
    Unary { op: UnaryOp, operand: Box<Evaluator> },
    Cast {
        operand: Box<Evaluator>,
        target: ValueType,
    },
    Call {
        func: Arc<dyn ScalarFunction>,
        args: Vec<Evaluator>,
    },
    Array(Vec<Evaluator>),
    Map(Vec<(String, Evaluator)>),
}

impl Evaluator {
    /// Creates an evaluator reading one top-level key.
    pub fn key(key: impl Into<String>) -> Self {
        Evaluator::Field {
            alias: None,
            path: Path::key(key),
        }
    }

    /// Evaluates against one record.
    pub fn eval(&self, record: &Map) -> Result<Value, EvalError> {
        match self {
            Evaluator::Literal(value) => Ok(value.clone()),

            Evaluator::Field { alias: None, path } => {
                Ok(record.get_path(path)?.cloned().unwrap_or(Value::Null))
            }

            Evaluator::Field {
                alias: Some(alias),
                path,
            } => match record.get(alias) {
                None | Some(Value::Null) => Ok(Value::Null),
                Some(Value::Map(inner)) => {
                    Ok(inner.get_path(path)?.cloned().unwrap_or(Value::Null))
                }
                Some(other) => {
                    Err(rivulet_core::Error::invalid_access(alias.clone(), other.value_type())
                        .into())
                }
            },

            Evaluator::Wildcard { alias: None } => {
                Ok(Value::Map(record.filtered(|key| !is_internal_key(key))))
            }

            Evaluator::Wildcard { alias: Some(alias) } => {
                Ok(record.get(alias).cloned().unwrap_or(Value::Null))
            }

            Evaluator::Binary { op, left, right } => match op {
                BinaryOp::And => {
                    let l = ops::truth(&left.eval(record)?)?;
                    if l == Some(false) {
                        return Ok(Value::Bool(false));
                    }
                    let r = ops::truth(&right.eval(record)?)?;
                    Ok(ops::combine_and(l, r))
                }
                BinaryOp::Or => {
                    let l = ops::truth(&left.eval(record)?)?;
                    if l == Some(true) {
                        return Ok(Value::Bool(true));
                    }
                    let r = ops::truth(&right.eval(record)?)?;
                    Ok(ops::combine_or(l, r))
                }
                _ => {
                    let l = left.eval(record)?;
                    let r = right.eval(record)?;
                    ops::binary(*op, &l, &r)
                }
            },

            Evaluator::Unary { op, operand } => ops::unary(*op, &operand.eval(record)?),

            Evaluator::Cast { operand, target } => ops::cast(&operand.eval(record)?, *target),

            Evaluator::Call { func, args } => {
                let values = args
                    .iter()
                    .map(|arg| arg.eval(record))
                    .collect::<Result<Vec<_>, _>>()?;
                func.call(&values)
            }

            Evaluator::Array(items) => items
                .iter()
                .map(|item| item.eval(record))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),

            Evaluator::Map(entries) => {
                let mut out = Map::with_capacity(entries.len());
                for (key, evaluator) in entries {
                    out.insert(key.clone(), evaluator.eval(record)?);
                }
                Ok(Value::Map(out))
            }
        }
    }

    /// Evaluates and coerces the result to a boolean. Null is false.
    pub fn eval_bool(&self, record: &Map) -> Result<bool, EvalError> {
        Ok(self.eval(record)?.to_bool()?)
    }
}

/// Keys the plan adds to working records that user-visible wildcards hide.
pub(crate) fn is_internal_key(key: &str) -> bool {
    key.starts_with(AGGREGATE_KEY_PREFIX) || is_meta_key(key)
}
