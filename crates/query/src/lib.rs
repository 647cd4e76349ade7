//! Rivulet Query - continuous-query compiler and execution plans.
//!
//! This crate turns parsed queries into reusable execution plans and applies
//! them to batches of streaming records:
//!
//! - `ast`: Expression and query AST definitions
//! - `function`: Scalar and aggregate functions and the function registry
//! - `eval`: Compiled expression evaluators and operator semantics
//! - `compiler`: Expression compiler that lifts aggregate calls out of expressions
//! - `plan`: Execution plan builder, batch evaluation and output assembly
//!
//! # Example
//!
//! ```
//! use rivulet_core::{Map, Value};
//! use rivulet_query::ast::{Expr, SelectQuery};
//! use rivulet_query::function::DefaultFunctionRegistry;
//! use rivulet_query::plan::ExecutionPlan;
//!
//! let registry = DefaultFunctionRegistry::with_builtins();
//! let query = SelectQuery::new()
//!     .project("g", Expr::field("g"))
//!     .project("total", Expr::aggregate("sum", Expr::field("x")))
//!     .group_by(Expr::field("g"));
//! let plan = ExecutionPlan::build(&query, &registry).unwrap();
//!
//! let batch = [
//!     Map::from([("g", Value::from("a")), ("x", Value::Int(1))]),
//!     Map::from([("g", Value::from("a")), ("x", Value::Int(2))]),
//! ];
//! let output = plan.evaluate_all(&batch).unwrap();
//! assert_eq!(output[0].get("total"), Some(&Value::Int(3)));
//! ```

#![no_std]

extern crate alloc;

pub mod ast;
pub mod compiler;
pub mod error;
pub mod eval;
pub mod function;
pub mod plan;

pub use compiler::{compile, AggregationEvaluator, CompiledExpr, Compiler};
pub use error::{AssignError, Clause, CompileError, EvalError, ExecError, RegistryError};
pub use eval::Evaluator;
pub use plan::{ExecutionPlan, Output};
