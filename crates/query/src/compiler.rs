//! Compiles expression trees into evaluators.
//!
//! Aggregate calls are lifted out of the tree: each one is replaced by a read of
//! a reserved key, and the call itself becomes an [`AggregationEvaluator`] that
//! the plan runs once per group. Before projecting a group, the plan writes every
//! aggregate result into the working record under its key, so the outer tree
//! stays an ordinary scalar evaluator.
//!
//! A [`Compiler`] is shared by every clause of one query. Aggregate calls with
//! the same function and structurally equal argument share one key and one
//! accumulator across the whole plan.

use crate::ast::{CallKind, Expr, FieldRef};
use crate::error::{Clause, CompileError};
use crate::eval::Evaluator;
use crate::function::{AggregateFunction, Function, FunctionKind, FunctionRegistry};
use crate::plan::meta_key;
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use rivulet_core::{Path, Value};

/// Prefix of the working-record keys that hold aggregate results.
///
/// Plain field names cannot contain a NUL byte.
pub const AGGREGATE_KEY_PREFIX: &str = "\u{0}agg:";

/// One aggregate call lifted out of an expression.
#[derive(Debug)]
pub struct AggregationEvaluator {
    key: String,
    function: Arc<dyn AggregateFunction>,
    input: Evaluator,
}

impl AggregationEvaluator {
    /// Working-record key the result is stored under.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn function(&self) -> &Arc<dyn AggregateFunction> {
        &self.function
    }

    /// Evaluator computing the value fed to the accumulator for each tuple.
    #[inline]
    pub fn input(&self) -> &Evaluator {
        &self.input
    }
}

/// Result of compiling one expression.
#[derive(Debug)]
pub struct CompiledExpr {
    pub evaluator: Evaluator,
    /// Aggregates the evaluator reads, in order of first appearance.
    pub aggregates: Vec<Arc<AggregationEvaluator>>,
}

impl CompiledExpr {
    #[inline]
    pub fn has_aggregate(&self) -> bool {
        !self.aggregates.is_empty()
    }
}

/// Where an expression being compiled sits.
#[derive(Clone, Copy)]
enum Scope<'e> {
    /// SELECT list, outside any aggregate.
    Projection,
    /// Argument of the named aggregate.
    Aggregate(&'e str),
    /// A clause that cannot hold aggregates.
    Scalar(Clause),
}

/// Expression compiler for one query.
pub struct Compiler<'r> {
    registry: &'r dyn FunctionRegistry,
    /// (lowercase function name, argument list, lifted aggregate)
    lifted: Vec<(String, Vec<Expr>, Arc<AggregationEvaluator>)>,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r dyn FunctionRegistry) -> Self {
        Self {
            registry,
            lifted: Vec::new(),
        }
    }

    /// Compiles a projection expression, lifting out aggregate calls.
    pub fn compile(&mut self, expr: &Expr) -> Result<CompiledExpr, CompileError> {
        let mut aggregates = Vec::new();
        let evaluator = self.build(expr, Scope::Projection, &mut aggregates)?;
        Ok(CompiledExpr {
            evaluator,
            aggregates,
        })
    }

    /// Compiles an expression of a clause that cannot contain aggregates.
    pub fn compile_scalar(&mut self, expr: &Expr, clause: Clause) -> Result<Evaluator, CompileError> {
        let mut aggregates = Vec::new();
        self.build(expr, Scope::Scalar(clause), &mut aggregates)
    }

    /// Returns every distinct aggregate lifted so far, in order of first appearance.
    pub fn aggregates(&self) -> impl Iterator<Item = &Arc<AggregationEvaluator>> {
        self.lifted.iter().map(|(_, _, agg)| agg)
    }

    fn build(
        &mut self,
        expr: &Expr,
        scope: Scope<'_>,
        refs: &mut Vec<Arc<AggregationEvaluator>>,
    ) -> Result<Evaluator, CompileError> {
        match expr {
            Expr::Literal(value) => Ok(Evaluator::Literal(value.clone())),

            Expr::Field(field) => field_evaluator(field),

            Expr::Meta { alias, name } => {
                if alias.is_empty() || !name.eq_ignore_ascii_case("ts") {
                    return Err(CompileError::malformed_metadata(alias.clone(), name.clone()));
                }
                Ok(Evaluator::key(meta_key(alias, "TS")))
            }

            Expr::Wildcard { alias } => Ok(Evaluator::Wildcard {
                alias: alias.clone(),
            }),

            Expr::BinaryOp { left, op, right } => {
                reject_wildcard(left, op.symbol())?;
                reject_wildcard(right, op.symbol())?;
                Ok(Evaluator::Binary {
                    op: *op,
                    left: Box::new(self.build(left, scope, refs)?),
                    right: Box::new(self.build(right, scope, refs)?),
                })
            }

            Expr::UnaryOp { op, expr } => {
                reject_wildcard(expr, "unary operator")?;
                Ok(Evaluator::Unary {
                    op: *op,
                    operand: Box::new(self.build(expr, scope, refs)?),
                })
            }

            Expr::Cast { expr, target } => {
                reject_wildcard(expr, "CAST")?;
                if !target.is_scalar() {
                    return Err(CompileError::unsupported(alloc::format!(
                        "cannot cast to {}",
                        target
                    )));
                }
                Ok(Evaluator::Cast {
                    operand: Box::new(self.build(expr, scope, refs)?),
                    target: *target,
                })
            }

            Expr::Array(items) => Ok(Evaluator::Array(
                items
                    .iter()
                    .map(|item| self.build(item, scope, refs))
                    .collect::<Result<Vec<_>, CompileError>>()?,
            )),

            Expr::Map(entries) => Ok(Evaluator::Map(
                entries
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), self.build(value, scope, refs)?)))
                    .collect::<Result<Vec<_>, CompileError>>()?,
            )),

            Expr::Function {
                name,
                args,
                kind: CallKind::Scalar,
            } => match self.registry.lookup(name, args.len())? {
                Function::Scalar(func) => Ok(Evaluator::Call {
                    func,
                    args: args
                        .iter()
                        .map(|arg| self.build(arg, scope, refs))
                        .collect::<Result<Vec<_>, CompileError>>()?,
                }),
                Function::Aggregate(_) => Err(CompileError::kind_mismatch(
                    name.clone(),
                    FunctionKind::Scalar,
                )),
            },

            Expr::Function {
                name,
                args,
                kind: CallKind::Aggregate,
            } => {
                match scope {
                    Scope::Aggregate(outer) => {
                        return Err(CompileError::nested_aggregate(outer, name.clone()))
                    }
                    Scope::Scalar(clause) => {
                        return Err(CompileError::aggregate_not_allowed(name.clone(), clause))
                    }
                    Scope::Projection => {}
                }
                let function = match self.registry.lookup(name, args.len())? {
                    Function::Aggregate(func) => func,
                    Function::Scalar(_) => {
                        return Err(CompileError::kind_mismatch(
                            name.clone(),
                            FunctionKind::Aggregate,
                        ))
                    }
                };
                let aggregate = self.lift(name, args, function)?;
                let key = aggregate.key().to_string();
                if !refs.iter().any(|r| Arc::ptr_eq(r, &aggregate)) {
                    refs.push(aggregate);
                }
                Ok(Evaluator::key(key))
            }
        }
    }

    /// Returns the aggregate for this call, reusing an identical earlier one.
    fn lift(
        &mut self,
        name: &str,
        args: &[Expr],
        function: Arc<dyn AggregateFunction>,
    ) -> Result<Arc<AggregationEvaluator>, CompileError> {
        let lower = name.to_lowercase();
        if let Some((_, _, existing)) = self
            .lifted
            .iter()
            .find(|(n, a, _)| *n == lower && a.as_slice() == args)
        {
            return Ok(existing.clone());
        }

        // Aggregate arguments are compiled in their own scope so nesting is caught.
        let mut nested = Vec::new();
        let mut inputs = args
            .iter()
            .map(|arg| self.build(arg, Scope::Aggregate(name), &mut nested))
            .collect::<Result<Vec<_>, _>>()?;
        let input = match inputs.len() {
            0 => Evaluator::Literal(Value::Bool(true)),
            1 => inputs.remove(0),
            _ => Evaluator::Array(inputs),
        };

        let key = alloc::format!("{}{}", AGGREGATE_KEY_PREFIX, self.lifted.len());
        log::trace!("lifted aggregate {} as {:?}", lower, key);
        let aggregate = Arc::new(AggregationEvaluator {
            key,
            function,
            input,
        });
        self.lifted
            .push((lower, args.to_vec(), aggregate.clone()));
        Ok(aggregate)
    }
}

/// Compiles a single projection expression with a fresh compiler.
pub fn compile(
    expr: &Expr,
    registry: &dyn FunctionRegistry,
) -> Result<CompiledExpr, CompileError> {
    Compiler::new(registry).compile(expr)
}

fn field_evaluator(field: &FieldRef) -> Result<Evaluator, CompileError> {
    let path = Path::parse(&field.path).map_err(|err| match err {
        rivulet_core::Error::InvalidPath { path, message } => {
            CompileError::InvalidPath { path, message }
        }
        other => CompileError::InvalidPath {
            path: field.path.clone(),
            message: other.to_string(),
        },
    })?;
    Ok(Evaluator::Field {
        alias: field.alias.clone(),
        path,
    })
}

fn reject_wildcard(expr: &Expr, context: &str) -> Result<(), CompileError> {
    if let Expr::Wildcard { .. } = expr {
        return Err(CompileError::unsupported(alloc::format!(
            "wildcard cannot be an operand of {}",
            context
        )));
    }
    Ok(())
}
