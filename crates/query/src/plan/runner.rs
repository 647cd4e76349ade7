//! Batch evaluation.

use super::{assign_output_value, ExecutionPlan};
use crate::error::{ExecError, Stage};
use alloc::borrow::Cow;
use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;
use core::iter::FusedIterator;
use hashbrown::HashMap;
use rivulet_core::{Map, Value};

/// Tuples of one batch that share a group key.
#[derive(Debug)]
struct Group {
    /// None when the plan has no GROUP BY clause.
    key: Option<Vec<Value>>,
    /// Indexes into the batch, in arrival order. Never empty.
    members: Vec<usize>,
}

impl ExecutionPlan {
    /// Evaluates the plan against one batch of merged input records.
    ///
    /// Filtering and grouping happen before this returns; a failing group key
    /// aborts the batch here. Aggregation and projection run on the first call
    /// to [`Output::next`] and cover every group before any record is yielded,
    /// so a failing group yields its error and no records.
    pub fn evaluate<'a>(&'a self, batch: &'a [Map]) -> Result<Output<'a>, ExecError> {
        let survivors = self.apply_filter(batch);
        let groups = self.group(batch, survivors)?;
        log::trace!(
            "batch of {} tuple(s) produced {} group(s)",
            batch.len(),
            groups.len()
        );
        Ok(Output {
            plan: self,
            batch,
            state: State::Pending(groups),
        })
    }

    /// Evaluates the plan and collects every output record.
    pub fn evaluate_all(&self, batch: &[Map]) -> Result<Vec<Map>, ExecError> {
        self.evaluate(batch)?.collect()
    }

    fn apply_filter(&self, batch: &[Map]) -> Vec<usize> {
        let Some(filter) = &self.filter else {
            return (0..batch.len()).collect();
        };
        batch
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| match filter.eval_bool(record) {
                Ok(true) => Some(idx),
                Ok(false) => None,
                Err(err) => {
                    log::debug!("dropping tuple {} of batch: filter failed: {}", idx, err);
                    None
                }
            })
            .collect()
    }

    fn group(&self, batch: &[Map], survivors: Vec<usize>) -> Result<Vec<Group>, ExecError> {
        if self.group_by.is_empty() {
            if !self.has_aggregate() {
                return Ok(survivors
                    .into_iter()
                    .map(|idx| Group {
                        key: None,
                        members: vec![idx],
                    })
                    .collect());
            }
            if survivors.is_empty() {
                return Ok(Vec::new());
            }
            return Ok(vec![Group {
                key: None,
                members: survivors,
            }]);
        }

        let mut groups: Vec<Group> = Vec::new();
        let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
        for idx in survivors {
            let key = self
                .group_by
                .iter()
                .enumerate()
                .map(|(pos, evaluator)| {
                    evaluator
                        .eval(&batch[idx])
                        .map_err(|err| ExecError::eval(err, Stage::GroupKey(pos)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            match index.get(&key) {
                Some(&slot) => groups[slot].members.push(idx),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(Group {
                        key: Some(key),
                        members: vec![idx],
                    });
                }
            }
        }
        Ok(groups)
    }

    /// Aggregates and projects one group into an output record.
    fn project_group(&self, batch: &[Map], group: &Group) -> Result<Map, ExecError> {
        let key = group.key.as_deref();
        let representative = &batch[group.members[0]];

        let working = if self.has_aggregate() {
            let mut record = representative.clone();
            for aggregate in &self.aggregates {
                let stage = || Stage::Aggregate {
                    function: aggregate.function().name().to_string(),
                    key: aggregate.key().to_string(),
                };
                let fail = |err| ExecError::eval(err, stage()).in_group(key);

                let mut acc = aggregate.function().accumulator();
                acc.reset();
                for &idx in &group.members {
                    let input = aggregate.input().eval(&batch[idx]).map_err(fail)?;
                    acc.accumulate(&input).map_err(fail)?;
                }
                record.insert(aggregate.key(), acc.finalize().map_err(fail)?);
            }
            Cow::Owned(record)
        } else {
            Cow::Borrowed(representative)
        };

        let mut output = Map::with_capacity(self.projections.len());
        for projection in &self.projections {
            let stage = || Stage::Projection {
                alias: projection.alias().to_string(),
            };
            let value = projection
                .evaluator()
                .eval(&working)
                .map_err(|err| ExecError::eval(err, stage()).in_group(key))?;
            assign_output_value(&mut output, projection.target(), value)
                .map_err(|err| ExecError::assign(err, stage()).in_group(key))?;
        }
        Ok(output)
    }
}

/// Output records of one batch.
///
/// Yields one record per group in first-seen order, or a single error if any
/// group fails. After an error the iterator is exhausted.
#[derive(Debug)]
pub struct Output<'a> {
    plan: &'a ExecutionPlan,
    batch: &'a [Map],
    state: State,
}

#[derive(Debug)]
enum State {
    /// Groups not yet aggregated or projected.
    Pending(Vec<Group>),
    Ready(vec::IntoIter<Map>),
    Done,
}

impl Output<'_> {
    fn project_all(&self, groups: &[Group]) -> Result<Vec<Map>, ExecError> {
        groups
            .iter()
            .map(|group| self.plan.project_group(self.batch, group))
            .collect()
    }
}

impl Iterator for Output<'_> {
    type Item = Result<Map, ExecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let State::Pending(groups) = &self.state {
            match self.project_all(groups) {
                Ok(rows) => self.state = State::Ready(rows.into_iter()),
                Err(err) => {
                    self.state = State::Done;
                    return Some(Err(err));
                }
            }
        }
        match &mut self.state {
            State::Ready(rows) => rows.next().map(Ok),
            _ => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.state {
            State::Pending(groups) => (groups.len().min(1), Some(groups.len())),
            State::Ready(rows) => rows.size_hint(),
            State::Done => (0, Some(0)),
        }
    }
}

impl FusedIterator for Output<'_> {}

#[cfg(all(test, feature = "builtins"))]
mod tests {
    use super::*;
    use crate::ast::{Expr, SelectQuery};
    use crate::error::{EvalError, ExecErrorKind};
    use crate::function::DefaultFunctionRegistry;

    fn plan(query: SelectQuery) -> ExecutionPlan {
        ExecutionPlan::build(&query, &DefaultFunctionRegistry::with_builtins()).unwrap()
    }

    fn records(xs: &[i64]) -> Vec<Map> {
        xs.iter()
            .map(|&x| Map::from([("x", Value::Int(x))]))
            .collect()
    }

    #[test]
    fn test_per_tuple_projection() {
        let plan = plan(SelectQuery::new().project("y", Expr::mul(Expr::field("x"), Expr::literal(10i64))));
        let output = plan.evaluate_all(&records(&[1, 2, 3])).unwrap();
        let ys: Vec<_> = output.iter().map(|m| m.get("y").cloned()).collect();
        assert_eq!(
            ys,
            vec![Some(Value::Int(10)), Some(Value::Int(20)), Some(Value::Int(30))]
        );
    }

    #[test]
    fn test_filter_error_drops_tuple() {
        let plan = plan(
            SelectQuery::new()
                .project("x", Expr::field("x"))
                .filter(Expr::gt(
                    Expr::div(Expr::literal(10i64), Expr::field("x")),
                    Expr::literal(1i64),
                )),
        );
        // 10 / 0 fails and is dropped, 10 / 20 is not greater than 1.
        let output = plan.evaluate_all(&records(&[0, 2, 20, 5])).unwrap();
        assert_eq!(output, records(&[2, 5]));
    }

    #[test]
    fn test_implicit_single_group() {
        let plan = plan(
            SelectQuery::new()
                .project("total", Expr::aggregate("sum", Expr::field("x")))
                .project("n", Expr::count_star()),
        );
        let output = plan.evaluate_all(&records(&[1, 2, 3])).unwrap();
        assert_eq!(
            output,
            vec![Map::from([("n", Value::Int(3)), ("total", Value::Int(6))])]
        );
        assert!(plan.evaluate_all(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_group_without_aggregate_uses_first_tuple() {
        let plan = plan(
            SelectQuery::new()
                .project("g", Expr::field("g"))
                .project("x", Expr::field("x"))
                .group_by(Expr::field("g")),
        );
        let batch = vec![
            Map::from([("g", Value::from("a")), ("x", Value::Int(1))]),
            Map::from([("g", Value::from("b")), ("x", Value::Int(2))]),
            Map::from([("g", Value::from("a")), ("x", Value::Int(3))]),
        ];
        let output = plan.evaluate_all(&batch).unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(output[0].get("x"), Some(&Value::Int(1)));
        assert_eq!(output[1].get("g"), Some(&Value::from("b")));
    }

    #[test]
    fn test_group_key_error_aborts_batch() {
        let plan = plan(
            SelectQuery::new()
                .project("n", Expr::count_star())
                .group_by(Expr::div(Expr::literal(1i64), Expr::field("x"))),
        );
        let err = plan.evaluate(&records(&[1, 0])).unwrap_err();
        assert_eq!(err.stage, Stage::GroupKey(0));
        assert_eq!(err.kind, ExecErrorKind::Eval(EvalError::DivisionByZero));
    }

    #[test]
    fn test_aggregate_error_carries_context() {
        let plan = plan(
            SelectQuery::new()
                .project("total", Expr::aggregate("sum", Expr::field("x")))
                .group_by(Expr::field("g")),
        );
        let batch = vec![
            Map::from([("g", Value::Int(1)), ("x", Value::Int(1))]),
            Map::from([("g", Value::Int(2)), ("x", Value::from("oops"))]),
        ];
        let mut output = plan.evaluate(&batch).unwrap();

        // The valid first group is not emitted ahead of the failure.
        let err = output.next().unwrap().unwrap_err();
        assert!(matches!(err.stage, Stage::Aggregate { ref function, .. } if function == "sum"));
        assert_eq!(err.group_key, Some(vec![Value::Int(2)]));
        assert!(output.next().is_none());
        assert!(plan.evaluate_all(&batch).is_err());
    }

    #[test]
    fn test_projection_error_fuses_output() {
        let plan = plan(SelectQuery::new().project("y", Expr::div(Expr::literal(1i64), Expr::field("x"))));
        let input = records(&[1, 0, 1]);
        let mut output = plan.evaluate(&input).unwrap();
        assert_eq!(output.size_hint(), (1, Some(3)));
        let err = output.next().unwrap().unwrap_err();
        assert_eq!(err.stage, Stage::Projection { alias: "y".into() });
        assert_eq!(err.group_key, None);
        assert!(output.next().is_none());
        assert_eq!(output.size_hint(), (0, Some(0)));
    }

    #[test]
    fn test_output_size_hint_after_projection() {
        let plan = plan(SelectQuery::new().project("x", Expr::field("x")));
        let input = records(&[1, 2, 3]);
        let mut output = plan.evaluate(&input).unwrap();
        assert_eq!(output.next().unwrap().unwrap(), Map::from([("x", Value::Int(1))]));
        assert_eq!(output.size_hint(), (2, Some(2)));
        assert_eq!(output.count(), 2);
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let plan = plan(
            SelectQuery::new()
                .project("c", Expr::aggregate("count", Expr::field("x")))
                .group_by(Expr::field("x")),
        );
        let batch = records(&[1, 1, 2]);
        let first = plan.evaluate_all(&batch).unwrap();
        let second = plan.evaluate_all(&batch).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                Map::from([("c", Value::Int(2))]),
                Map::from([("c", Value::Int(1))])
            ]
        );
    }
}
