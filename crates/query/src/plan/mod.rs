//! Execution plans.
//!
//! An [`ExecutionPlan`] is built once per query and then evaluated against
//! every batch the pipeline hands it. Evaluation runs in four steps:
//!
//! 1. filter the batch (a tuple whose filter fails to evaluate is dropped)
//! 2. bucket surviving tuples by group key, in first-seen order
//! 3. run every aggregate once per group
//! 4. project each group's representative record, overlaid with the
//!    aggregate results, into an output record
//!
//! The plan holds no mutable state. Accumulators, buckets and working records
//! belong to a single call of [`ExecutionPlan::evaluate`].

mod builder;
mod metadata;
mod output;
mod runner;

pub use builder::{build_filter, build_group_keys, build_projections};
pub use metadata::{is_meta_key, merge_inputs, meta_key, set_metadata, TIMESTAMP_META};
pub use output::{assign_output_value, OutputTarget, MAX_OUTPUT_INDEX};
pub use runner::Output;

use crate::compiler::AggregationEvaluator;
use crate::eval::Evaluator;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

/// One compiled projection.
#[derive(Debug)]
pub struct AliasedEvaluator {
    alias: String,
    target: OutputTarget,
    evaluator: Evaluator,
    aggregates: Vec<Arc<AggregationEvaluator>>,
}

impl AliasedEvaluator {
    /// Output alias as written in the query.
    #[inline]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    #[inline]
    pub fn target(&self) -> &OutputTarget {
        &self.target
    }

    #[inline]
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Aggregates referenced by this projection.
    #[inline]
    pub fn aggregates(&self) -> &[Arc<AggregationEvaluator>] {
        &self.aggregates
    }

    #[inline]
    pub fn has_aggregate(&self) -> bool {
        !self.aggregates.is_empty()
    }
}

/// Compiled form of one query.
#[derive(Debug)]
pub struct ExecutionPlan {
    projections: Vec<AliasedEvaluator>,
    /// Distinct aggregates across all projections.
    aggregates: Vec<Arc<AggregationEvaluator>>,
    group_by: Vec<Evaluator>,
    filter: Option<Evaluator>,
}

impl ExecutionPlan {
    #[inline]
    pub fn projections(&self) -> &[AliasedEvaluator] {
        &self.projections
    }

    #[inline]
    pub fn aggregates(&self) -> &[Arc<AggregationEvaluator>] {
        &self.aggregates
    }

    #[inline]
    pub fn group_by(&self) -> &[Evaluator] {
        &self.group_by
    }

    #[inline]
    pub fn filter(&self) -> Option<&Evaluator> {
        self.filter.as_ref()
    }

    /// Returns true if any projection contains an aggregate call.
    #[inline]
    pub fn has_aggregate(&self) -> bool {
        !self.aggregates.is_empty()
    }
}
