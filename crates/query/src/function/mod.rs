//! Scalar and aggregate functions callable from queries.
//!
//! Functions are resolved by name and arity through a [`FunctionRegistry`] once,
//! when a plan is built. Scalar functions are pure and shared by every
//! evaluation of the plan. Aggregate functions hand out a fresh [`Accumulator`]
//! per group and batch, so nothing mutable is ever shared between threads.

mod aggregate;
mod registry;
mod scalar;

pub use registry::{DefaultFunctionRegistry, FunctionRegistry};
pub use scalar::NativeScalar;

use crate::error::EvalError;
use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;
use rivulet_core::Value;

/// Number of arguments a function accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    #[inline]
    pub fn accepts(&self, arity: usize) -> bool {
        match *self {
            Arity::Exact(n) => arity == n,
            Arity::AtLeast(n) => arity >= n,
        }
    }
}

/// A pure function of its arguments.
pub trait ScalarFunction: Send + Sync {
    /// Lowercase name the function is registered under.
    fn name(&self) -> &str;

    /// Returns true if the function can be called with `arity` arguments.
    fn accepts(&self, arity: usize) -> bool;

    fn call(&self, args: &[Value]) -> Result<Value, EvalError>;
}

/// Running state of one aggregate over one group.
pub trait Accumulator {
    /// Clears all accumulated state.
    fn reset(&mut self);

    /// Feeds one input value.
    fn accumulate(&mut self, value: &Value) -> Result<(), EvalError>;

    /// Produces the aggregate result for the values fed so far.
    fn finalize(&mut self) -> Result<Value, EvalError>;
}

/// A function computed over all tuples of a group.
pub trait AggregateFunction: Send + Sync {
    /// Lowercase name the function is registered under.
    fn name(&self) -> &str;

    /// Aggregates take exactly one argument unless they say otherwise.
    fn accepts(&self, arity: usize) -> bool {
        arity == 1
    }

    /// Creates a fresh accumulator.
    fn accumulator(&self) -> Box<dyn Accumulator>;

    /// Returns true if the result depends on the order values are fed in.
    fn order_sensitive(&self) -> bool {
        false
    }
}

impl fmt::Debug for dyn ScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScalarFunction({})", self.name())
    }
}

impl fmt::Debug for dyn AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AggregateFunction({})", self.name())
    }
}

/// Whether a function is scalar or aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FunctionKind {
    Scalar,
    Aggregate,
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionKind::Scalar => write!(f, "scalar"),
            FunctionKind::Aggregate => write!(f, "aggregate"),
        }
    }
}

/// A registered function.
#[derive(Clone, Debug)]
pub enum Function {
    Scalar(Arc<dyn ScalarFunction>),
    Aggregate(Arc<dyn AggregateFunction>),
}

impl Function {
    pub fn kind(&self) -> FunctionKind {
        match self {
            Function::Scalar(_) => FunctionKind::Scalar,
            Function::Aggregate(_) => FunctionKind::Aggregate,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Function::Scalar(func) => func.name(),
            Function::Aggregate(func) => func.name(),
        }
    }

    pub fn accepts(&self, arity: usize) -> bool {
        match self {
            Function::Scalar(func) => func.accepts(arity),
            Function::Aggregate(func) => func.accepts(arity),
        }
    }
}
