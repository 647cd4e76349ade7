//! Error types for compiling and running execution plans.

use crate::function::FunctionKind;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use rivulet_core::{Value, ValueType};

/// Clause of a query in which an expression appears.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Clause {
    Select,
    Where,
    GroupBy,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Select => write!(f, "SELECT"),
            Clause::Where => write!(f, "WHERE"),
            Clause::GroupBy => write!(f, "GROUP BY"),
        }
    }
}

/// Errors raised while building an execution plan.
#[derive(Clone, Debug, PartialEq)]
pub enum CompileError {
    /// No function with this name is registered.
    UnknownFunction { name: String },
    /// The function exists but does not accept this many arguments.
    ArityMismatch { name: String, arity: usize },
    /// The call was tagged as one kind but the function is the other.
    KindMismatch { name: String, expected: FunctionKind },
    /// A metadata reference names metadata that does not exist.
    MalformedMetadata { alias: String, name: String },
    /// A field path could not be parsed.
    InvalidPath { path: String, message: String },
    /// An output alias is neither `*` nor a valid path.
    InvalidAlias { alias: String, message: String },
    /// An aggregate call appears inside another aggregate's argument.
    NestedAggregate { outer: String, inner: String },
    /// An aggregate call appears in a clause that cannot hold one.
    AggregateNotAllowed { name: String, clause: Clause },
    /// An operator combination the evaluator cannot express.
    Unsupported { message: String },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnknownFunction { name } => write!(f, "Unknown function: {}", name),
            CompileError::ArityMismatch { name, arity } => {
                write!(f, "Function {} does not take {} argument(s)", name, arity)
            }
            CompileError::KindMismatch { name, expected } => {
                write!(f, "Function {} is not a {} function", name, expected)
            }
            CompileError::MalformedMetadata { alias, name } => {
                write!(f, "Unknown metadata {:?} for stream {:?}", name, alias)
            }
            CompileError::InvalidPath { path, message } => {
                write!(f, "Invalid path {:?}: {}", path, message)
            }
            CompileError::InvalidAlias { alias, message } => {
                write!(f, "Invalid output alias {:?}: {}", alias, message)
            }
            CompileError::NestedAggregate { outer, inner } => write!(
                f,
                "Aggregate {} cannot be used inside aggregate {}",
                inner, outer
            ),
            CompileError::AggregateNotAllowed { name, clause } => {
                write!(f, "Aggregate {} is not allowed in {}", name, clause)
            }
            CompileError::Unsupported { message } => write!(f, "Unsupported expression: {}", message),
        }
    }
}

impl core::error::Error for CompileError {}

impl CompileError {
    pub fn unknown_function(name: impl Into<String>) -> Self {
        CompileError::UnknownFunction { name: name.into() }
    }

    pub fn arity_mismatch(name: impl Into<String>, arity: usize) -> Self {
        CompileError::ArityMismatch {
            name: name.into(),
            arity,
        }
    }

    pub fn kind_mismatch(name: impl Into<String>, expected: FunctionKind) -> Self {
        CompileError::KindMismatch {
            name: name.into(),
            expected,
        }
    }

    pub fn malformed_metadata(alias: impl Into<String>, name: impl Into<String>) -> Self {
        CompileError::MalformedMetadata {
            alias: alias.into(),
            name: name.into(),
        }
    }

    pub fn invalid_alias(alias: impl Into<String>, message: impl Into<String>) -> Self {
        CompileError::InvalidAlias {
            alias: alias.into(),
            message: message.into(),
        }
    }

    pub fn nested_aggregate(outer: impl Into<String>, inner: impl Into<String>) -> Self {
        CompileError::NestedAggregate {
            outer: outer.into(),
            inner: inner.into(),
        }
    }

    pub fn aggregate_not_allowed(name: impl Into<String>, clause: Clause) -> Self {
        CompileError::AggregateNotAllowed {
            name: name.into(),
            clause,
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        CompileError::Unsupported {
            message: message.into(),
        }
    }
}

impl From<RegistryError> for CompileError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { name } => CompileError::UnknownFunction { name },
            RegistryError::ArityMismatch { name, arity } => {
                CompileError::ArityMismatch { name, arity }
            }
            RegistryError::AlreadyExists { name } => CompileError::Unsupported {
                message: alloc::format!("function {} registered twice", name),
            },
        }
    }
}

/// Errors raised while evaluating an expression against one record.
#[derive(Clone, Debug, PartialEq)]
pub enum EvalError {
    /// Value model failure: type mismatch, coercion or invalid access.
    Value(rivulet_core::Error),
    /// An operator was applied to operand types it does not support.
    UnsupportedOperand {
        op: &'static str,
        left: ValueType,
        right: Option<ValueType>,
    },
    /// Integer division or modulo by zero.
    DivisionByZero,
    /// Integer arithmetic overflowed.
    Overflow { op: &'static str },
    /// A function rejected one of its arguments.
    InvalidArgument { function: String, message: String },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Value(err) => write!(f, "{}", err),
            EvalError::UnsupportedOperand {
                op,
                left,
                right: Some(right),
            } => write!(f, "Operator {} is not defined for {} and {}", op, left, right),
            EvalError::UnsupportedOperand {
                op,
                left,
                right: None,
            } => write!(f, "Operator {} is not defined for {}", op, left),
            EvalError::DivisionByZero => write!(f, "Division by zero"),
            EvalError::Overflow { op } => write!(f, "Integer overflow in {}", op),
            EvalError::InvalidArgument { function, message } => {
                write!(f, "Invalid argument to {}: {}", function, message)
            }
        }
    }
}

impl core::error::Error for EvalError {}

impl From<rivulet_core::Error> for EvalError {
    fn from(err: rivulet_core::Error) -> Self {
        EvalError::Value(err)
    }
}

impl EvalError {
    pub fn unsupported_binary(op: &'static str, left: ValueType, right: ValueType) -> Self {
        EvalError::UnsupportedOperand {
            op,
            left,
            right: Some(right),
        }
    }

    pub fn unsupported_unary(op: &'static str, operand: ValueType) -> Self {
        EvalError::UnsupportedOperand {
            op,
            left: operand,
            right: None,
        }
    }

    pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::InvalidArgument {
            function: function.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while assembling an output record.
#[derive(Clone, Debug, PartialEq)]
pub enum AssignError {
    /// A wildcard projection produced something other than a record.
    NotARecord { found: ValueType },
    /// An output path crosses a value that is not a record.
    IncompatiblePath { path: String, found: ValueType },
}

impl fmt::Display for AssignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignError::NotARecord { found } => {
                write!(f, "Wildcard projection must produce a map, got {}", found)
            }
            AssignError::IncompatiblePath { path, found } => {
                write!(f, "Cannot assign {:?} through a {} value", path, found)
            }
        }
    }
}

impl core::error::Error for AssignError {}

/// Step of the plan that failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Evaluating the GROUP BY expression at this index.
    GroupKey(usize),
    /// Feeding or finalizing an aggregate.
    Aggregate { function: String, key: String },
    /// Evaluating or assigning the projection with this alias.
    Projection { alias: String },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::GroupKey(idx) => write!(f, "group key #{}", idx),
            Stage::Aggregate { function, .. } => write!(f, "aggregate {}", function),
            Stage::Projection { alias } => write!(f, "projection {:?}", alias),
        }
    }
}

/// What went wrong in a failed batch.
#[derive(Clone, Debug, PartialEq)]
pub enum ExecErrorKind {
    Eval(EvalError),
    Assign(AssignError),
}

/// Failure of one batch evaluation, with enough context to log or drop it.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecError {
    pub kind: ExecErrorKind,
    pub stage: Stage,
    /// Key of the group being processed, when grouping was in effect.
    pub group_key: Option<Vec<Value>>,
}

impl ExecError {
    pub fn eval(err: EvalError, stage: Stage) -> Self {
        Self {
            kind: ExecErrorKind::Eval(err),
            stage,
            group_key: None,
        }
    }

    pub fn assign(err: AssignError, stage: Stage) -> Self {
        Self {
            kind: ExecErrorKind::Assign(err),
            stage,
            group_key: None,
        }
    }

    /// Attaches the group key, if there is one.
    pub fn in_group(mut self, key: Option<&[Value]>) -> Self {
        self.group_key = key.map(<[Value]>::to_vec);
        self
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed at {}: ", self.stage)?;
        match &self.kind {
            ExecErrorKind::Eval(err) => write!(f, "{}", err)?,
            ExecErrorKind::Assign(err) => write!(f, "{}", err)?,
        }
        if let Some(key) = &self.group_key {
            write!(f, " (group key {:?})", key)?;
        }
        Ok(())
    }
}

impl core::error::Error for ExecError {}

/// Errors raised by a function registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    NotFound { name: String },
    ArityMismatch { name: String, arity: usize },
    AlreadyExists { name: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NotFound { name } => write!(f, "Function not found: {}", name),
            RegistryError::ArityMismatch { name, arity } => {
                write!(f, "Function {} does not take {} argument(s)", name, arity)
            }
            RegistryError::AlreadyExists { name } => {
                write!(f, "Function already registered: {}", name)
            }
        }
    }
}

impl core::error::Error for RegistryError {}
