//! Builtin aggregate functions.

#[cfg(feature = "builtins")]
pub(crate) use builtin::builtins;

#[cfg(feature = "builtins")]
mod builtin {
    use crate::error::EvalError;
    use crate::function::{Accumulator, AggregateFunction};
    use alloc::boxed::Box;
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use core::cmp::Ordering;
    use rivulet_core::Value;

    /// An aggregate described by a name and an accumulator constructor.
    struct Builtin {
        name: &'static str,
        order_sensitive: bool,
        create: fn() -> Box<dyn Accumulator>,
    }

    impl AggregateFunction for Builtin {
        fn name(&self) -> &str {
            self.name
        }

        fn accumulator(&self) -> Box<dyn Accumulator> {
            (self.create)()
        }

        fn order_sensitive(&self) -> bool {
            self.order_sensitive
        }
    }

    pub(crate) fn builtins() -> Vec<Arc<dyn AggregateFunction>> {
        fn boxed<A: Accumulator + Default + 'static>() -> Box<dyn Accumulator> {
            Box::new(A::default())
        }

        let table: [(&'static str, bool, fn() -> Box<dyn Accumulator>); 11] = [
            ("count", false, boxed::<Count>),
            ("sum", false, boxed::<Sum>),
            ("avg", false, boxed::<Avg>),
            ("min", false, boxed::<Extremum<true>>),
            ("max", false, boxed::<Extremum<false>>),
            ("first", true, boxed::<First>),
            ("last", true, boxed::<Last>),
            ("array_agg", true, boxed::<ArrayAgg>),
            ("bool_and", false, boxed::<BoolFold<true>>),
            ("bool_or", false, boxed::<BoolFold<false>>),
            ("stddev", false, boxed::<StdDev>),
        ];
        table
            .into_iter()
            .map(|(name, order_sensitive, create)| {
                Arc::new(Builtin {
                    name,
                    order_sensitive,
                    create,
                }) as Arc<dyn AggregateFunction>
            })
            .collect()
    }

    fn numeric_input(function: &str, value: &Value) -> Result<f64, EvalError> {
        match value {
            Value::Int(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            other => Err(EvalError::invalid_argument(
                function,
                alloc::format!("expected a number, got {}", other.value_type()),
            )),
        }
    }

    /// Counts non-null values.
    #[derive(Default)]
    struct Count(i64);

    impl Accumulator for Count {
        fn reset(&mut self) {
            self.0 = 0;
        }

        fn accumulate(&mut self, value: &Value) -> Result<(), EvalError> {
            if !value.is_null() {
                self.0 += 1;
            }
            Ok(())
        }

        fn finalize(&mut self) -> Result<Value, EvalError> {
            Ok(Value::Int(self.0))
        }
    }

    /// Sums integers exactly and switches to float once a float is seen.
    ///
    /// Integers accumulate in 128 bits so the result does not depend on tuple
    /// order; only the final total must fit in an `i64`.
    #[derive(Default)]
    enum Sum {
        #[default]
        Empty,
        Int(i128),
        Float(f64),
    }

    impl Accumulator for Sum {
        fn reset(&mut self) {
            *self = Sum::Empty;
        }

        fn accumulate(&mut self, value: &Value) -> Result<(), EvalError> {
            *self = match (&*self, value) {
                (_, Value::Null) => return Ok(()),
                (Sum::Empty, Value::Int(i)) => Sum::Int(i128::from(*i)),
                (Sum::Int(acc), Value::Int(i)) => Sum::Int(
                    acc.checked_add(i128::from(*i))
                        .ok_or(EvalError::Overflow { op: "sum" })?,
                ),
                (Sum::Float(acc), Value::Int(i)) => Sum::Float(acc + *i as f64),
                (Sum::Empty, other) => Sum::Float(numeric_input("sum", other)?),
                (Sum::Int(acc), other) => Sum::Float(*acc as f64 + numeric_input("sum", other)?),
                (Sum::Float(acc), other) => Sum::Float(acc + numeric_input("sum", other)?),
            };
            Ok(())
        }

        fn finalize(&mut self) -> Result<Value, EvalError> {
            Ok(match self {
                Sum::Empty => Value::Null,
                Sum::Int(i) => Value::Int(
                    i64::try_from(*i).map_err(|_| EvalError::Overflow { op: "sum" })?,
                ),
                Sum::Float(f) => Value::Float(*f),
            })
        }
    }

    #[derive(Default)]
    struct Avg {
        sum: f64,
        count: u64,
    }

    impl Accumulator for Avg {
        fn reset(&mut self) {
            *self = Avg::default();
        }

        fn accumulate(&mut self, value: &Value) -> Result<(), EvalError> {
            if !value.is_null() {
                self.sum += numeric_input("avg", value)?;
                self.count += 1;
            }
            Ok(())
        }

        fn finalize(&mut self) -> Result<Value, EvalError> {
            if self.count == 0 {
                Ok(Value::Null)
            } else {
                Ok(Value::Float(self.sum / self.count as f64))
            }
        }
    }

    /// Minimum when `MIN` is true, maximum otherwise.
    #[derive(Default)]
    struct Extremum<const MIN: bool>(Option<Value>);

    impl<const MIN: bool> Accumulator for Extremum<MIN> {
        fn reset(&mut self) {
            self.0 = None;
        }

        fn accumulate(&mut self, value: &Value) -> Result<(), EvalError> {
            if value.is_null() {
                return Ok(());
            }
            let replace = match &self.0 {
                None => true,
                Some(current) => {
                    let ord = value.compare(current).ok_or_else(|| {
                        EvalError::invalid_argument(
                            if MIN { "min" } else { "max" },
                            alloc::format!(
                                "cannot compare {} with {}",
                                value.value_type(),
                                current.value_type()
                            ),
                        )
                    })?;
                    if MIN {
                        ord == Ordering::Less
                    } else {
                        ord == Ordering::Greater
                    }
                }
            };
            if replace {
                self.0 = Some(value.clone());
            }
            Ok(())
        }

        fn finalize(&mut self) -> Result<Value, EvalError> {
            Ok(self.0.clone().unwrap_or(Value::Null))
        }
    }

    #[derive(Default)]
    struct First(Option<Value>);

    impl Accumulator for First {
        fn reset(&mut self) {
            self.0 = None;
        }

        fn accumulate(&mut self, value: &Value) -> Result<(), EvalError> {
            if self.0.is_none() {
                self.0 = Some(value.clone());
            }
            Ok(())
        }

        fn finalize(&mut self) -> Result<Value, EvalError> {
            Ok(self.0.clone().unwrap_or(Value::Null))
        }
    }

    #[derive(Default)]
    struct Last(Option<Value>);

    impl Accumulator for Last {
        fn reset(&mut self) {
            self.0 = None;
        }

        fn accumulate(&mut self, value: &Value) -> Result<(), EvalError> {
            self.0 = Some(value.clone());
            Ok(())
        }

        fn finalize(&mut self) -> Result<Value, EvalError> {
            Ok(self.0.clone().unwrap_or(Value::Null))
        }
    }

    /// Collects every value, nulls included, in arrival order.
    #[derive(Default)]
    struct ArrayAgg(Vec<Value>);

    impl Accumulator for ArrayAgg {
        fn reset(&mut self) {
            self.0.clear();
        }

        fn accumulate(&mut self, value: &Value) -> Result<(), EvalError> {
            self.0.push(value.clone());
            Ok(())
        }

        fn finalize(&mut self) -> Result<Value, EvalError> {
            Ok(Value::Array(self.0.clone()))
        }
    }

    /// Logical AND when `ALL` is true, logical OR otherwise. Nulls are skipped.
    #[derive(Default)]
    struct BoolFold<const ALL: bool>(Option<bool>);

    impl<const ALL: bool> Accumulator for BoolFold<ALL> {
        fn reset(&mut self) {
            self.0 = None;
        }

        fn accumulate(&mut self, value: &Value) -> Result<(), EvalError> {
            if value.is_null() {
                return Ok(());
            }
            let b = value.to_bool()?;
            self.0 = Some(match self.0 {
                None => b,
                Some(acc) if ALL => acc && b,
                Some(acc) => acc || b,
            });
            Ok(())
        }

        fn finalize(&mut self) -> Result<Value, EvalError> {
            Ok(self.0.map(Value::Bool).unwrap_or(Value::Null))
        }
    }

    /// Population standard deviation using Welford's online algorithm.
    #[derive(Default)]
    struct StdDev {
        count: u64,
        mean: f64,
        m2: f64,
    }

    impl Accumulator for StdDev {
        fn reset(&mut self) {
            *self = StdDev::default();
        }

        fn accumulate(&mut self, value: &Value) -> Result<(), EvalError> {
            if value.is_null() {
                return Ok(());
            }
            let x = numeric_input("stddev", value)?;
            self.count += 1;
            let delta = x - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (x - self.mean);
            Ok(())
        }

        fn finalize(&mut self) -> Result<Value, EvalError> {
            if self.count == 0 {
                Ok(Value::Null)
            } else {
                Ok(Value::Float(libm::sqrt(self.m2 / self.count as f64)))
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use alloc::vec;

        fn run(name: &str, values: &[Value]) -> Result<Value, EvalError> {
            let func = builtins()
                .into_iter()
                .find(|f| f.name() == name)
                .unwrap();
            let mut acc = func.accumulator();
            acc.reset();
            for value in values {
                acc.accumulate(value)?;
            }
            acc.finalize()
        }

        #[test]
        fn test_count() {
            let values = [Value::Int(1), Value::Null, Value::from("x")];
            assert_eq!(run("count", &values).unwrap(), Value::Int(2));
            assert_eq!(run("count", &[]).unwrap(), Value::Int(0));
        }

        #[test]
        fn test_sum() {
            assert_eq!(
                run("sum", &[Value::Int(1), Value::Int(2), Value::Null]).unwrap(),
                Value::Int(3)
            );
            assert_eq!(
                run("sum", &[Value::Int(1), Value::Float(0.5)]).unwrap(),
                Value::Float(1.5)
            );
            assert_eq!(run("sum", &[Value::Null]).unwrap(), Value::Null);
            assert_eq!(
                run("sum", &[Value::Int(i64::MAX), Value::Int(1)]).unwrap_err(),
                EvalError::Overflow { op: "sum" }
            );
            assert!(run("sum", &[Value::from("a")]).is_err());
        }

        #[test]
        fn test_sum_intermediate_overflow() {
            let forward = [Value::Int(i64::MAX), Value::Int(1), Value::Int(-1)];
            let backward = [Value::Int(i64::MAX), Value::Int(-1), Value::Int(1)];
            assert_eq!(run("sum", &forward).unwrap(), Value::Int(i64::MAX));
            assert_eq!(run("sum", &backward).unwrap(), Value::Int(i64::MAX));
            assert_eq!(
                run("sum", &[Value::Int(i64::MIN), Value::Int(-1), Value::Int(1)]).unwrap(),
                Value::Int(i64::MIN)
            );
            assert_eq!(
                run("sum", &[Value::Int(i64::MIN), Value::Int(-1)]).unwrap_err(),
                EvalError::Overflow { op: "sum" }
            );
        }

        #[test]
        fn test_avg_and_stddev() {
            let values: Vec<Value> = [2, 4, 4, 4, 5, 5, 7, 9]
                .into_iter()
                .map(|i: i64| Value::Int(i))
                .collect();
            assert_eq!(run("avg", &values).unwrap(), Value::Float(5.0));
            match run("stddev", &values).unwrap() {
                Value::Float(f) => assert!(libm::fabs(f - 2.0) < 1e-9),
                other => panic!("unexpected {:?}", other),
            }
            assert_eq!(run("avg", &[]).unwrap(), Value::Null);
        }

        #[test]
        fn test_min_max() {
            let values = [Value::Int(3), Value::Float(1.5), Value::Null, Value::Int(7)];
            assert_eq!(run("min", &values).unwrap(), Value::Float(1.5));
            assert_eq!(run("max", &values).unwrap(), Value::Int(7));
            assert!(run("max", &[Value::Int(1), Value::from("a")]).is_err());
        }

        #[test]
        fn test_order_sensitive() {
            let values = [Value::Int(1), Value::Int(2), Value::Int(3)];
            assert_eq!(run("first", &values).unwrap(), Value::Int(1));
            assert_eq!(run("last", &values).unwrap(), Value::Int(3));
            assert_eq!(
                run("array_agg", &values).unwrap(),
                Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
            );

            let sensitive: Vec<_> = builtins()
                .into_iter()
                .filter(|f| f.order_sensitive())
                .map(|f| alloc::string::String::from(f.name()))
                .collect();
            assert_eq!(sensitive, vec!["first", "last", "array_agg"]);
        }

        #[test]
        fn test_bool_folds() {
            let values = [Value::Bool(true), Value::Null, Value::Bool(false)];
            assert_eq!(run("bool_and", &values).unwrap(), Value::Bool(false));
            assert_eq!(run("bool_or", &values).unwrap(), Value::Bool(true));
            assert_eq!(run("bool_or", &[Value::Null]).unwrap(), Value::Null);
        }

        #[test]
        fn test_reset() {
            let func = builtins()
                .into_iter()
                .find(|f| f.name() == "count")
                .unwrap();
            let mut acc = func.accumulator();
            acc.accumulate(&Value::Int(1)).unwrap();
            acc.reset();
            assert_eq!(acc.finalize().unwrap(), Value::Int(0));
        }
    }
}
