//! Building execution plans from parsed queries.

use super::{AliasedEvaluator, ExecutionPlan, OutputTarget};
use crate::ast::{AliasedExpr, Expr, SelectQuery};
use crate::compiler::Compiler;
use crate::error::{Clause, CompileError};
use crate::eval::Evaluator;
use crate::function::FunctionRegistry;
use alloc::vec::Vec;

impl ExecutionPlan {
    /// Compiles a query. Any failing clause fails the whole build.
    pub fn build(
        query: &SelectQuery,
        registry: &dyn FunctionRegistry,
    ) -> Result<Self, CompileError> {
        let mut compiler = Compiler::new(registry);
        let projections = build_projections(&mut compiler, &query.projections)?;
        let filter = build_filter(&mut compiler, query.filter.as_ref())?;
        let group_by = build_group_keys(&mut compiler, &query.group_by)?;
        let aggregates: Vec<_> = compiler.aggregates().cloned().collect();

        log::debug!(
            "built plan: {} projection(s), {} aggregate(s), {} group key(s), filter: {}",
            projections.len(),
            aggregates.len(),
            group_by.len(),
            filter.is_some()
        );

        Ok(Self {
            projections,
            aggregates,
            group_by,
            filter,
        })
    }
}

/// Compiles the SELECT list.
pub fn build_projections(
    compiler: &mut Compiler<'_>,
    projections: &[AliasedExpr],
) -> Result<Vec<AliasedEvaluator>, CompileError> {
    projections
        .iter()
        .map(|projection| {
            let target = OutputTarget::parse(&projection.alias)?;
            let compiled = compiler.compile(&projection.expr)?;
            Ok(AliasedEvaluator {
                alias: projection.alias.clone(),
                target,
                evaluator: compiled.evaluator,
                aggregates: compiled.aggregates,
            })
        })
        .collect()
}

/// Compiles the WHERE clause, if any.
pub fn build_filter(
    compiler: &mut Compiler<'_>,
    filter: Option<&Expr>,
) -> Result<Option<Evaluator>, CompileError> {
    filter
        .map(|expr| compiler.compile_scalar(expr, Clause::Where))
        .transpose()
}

/// Compiles the GROUP BY expressions.
pub fn build_group_keys(
    compiler: &mut Compiler<'_>,
    group_by: &[Expr],
) -> Result<Vec<Evaluator>, CompileError> {
    group_by
        .iter()
        .map(|expr| compiler.compile_scalar(expr, Clause::GroupBy))
        .collect()
}
