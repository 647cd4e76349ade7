//! Scalar function implementations.

use super::{Arity, ScalarFunction};
use crate::error::EvalError;
use rivulet_core::Value;

/// Signature of a native scalar function body.
pub type ScalarFn = fn(&[Value]) -> Result<Value, EvalError>;

/// A scalar function backed by a plain Rust function.
#[derive(Clone, Debug)]
pub struct NativeScalar {
    name: alloc::string::String,
    arity: Arity,
    func: ScalarFn,
}

impl NativeScalar {
    pub fn new(name: &str, arity: Arity, func: ScalarFn) -> Self {
        Self {
            name: name.to_lowercase(),
            arity,
            func,
        }
    }
}

impl ScalarFunction for NativeScalar {
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts(&self, arity: usize) -> bool {
        self.arity.accepts(arity)
    }

    fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        (self.func)(args)
    }
}

#[cfg(feature = "builtins")]
pub(crate) use builtin::builtins;

#[cfg(feature = "builtins")]
mod builtin {
    use super::{NativeScalar, ScalarFn};
    use crate::error::EvalError;
    use crate::function::{Arity, ScalarFunction};
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use rivulet_core::Value;

    const BUILTINS: &[(&str, Arity, ScalarFn)] = &[
        ("abs", Arity::Exact(1), abs),
        ("ceil", Arity::Exact(1), ceil),
        ("floor", Arity::Exact(1), floor),
        ("round", Arity::Exact(1), round),
        ("sqrt", Arity::Exact(1), sqrt),
        ("upper", Arity::Exact(1), upper),
        ("lower", Arity::Exact(1), lower),
        ("length", Arity::Exact(1), length),
        ("concat", Arity::AtLeast(1), concat),
        ("coalesce", Arity::AtLeast(1), coalesce),
        ("nullif", Arity::Exact(2), nullif),
        ("str", Arity::Exact(1), stringify),
    ];

    pub(crate) fn builtins() -> Vec<Arc<dyn ScalarFunction>> {
        BUILTINS
            .iter()
            .map(|&(name, arity, func)| {
                Arc::new(NativeScalar::new(name, arity, func)) as Arc<dyn ScalarFunction>
            })
            .collect()
    }

    fn not_numeric(name: &str, value: &Value) -> EvalError {
        EvalError::invalid_argument(
            name,
            alloc::format!("expected a number, got {}", value.value_type()),
        )
    }

    fn abs(args: &[Value]) -> Result<Value, EvalError> {
        match &args[0] {
            Value::Null => Ok(Value::Null),
            Value::Int(i) => i
                .checked_abs()
                .map(Value::Int)
                .ok_or(EvalError::Overflow { op: "abs" }),
            Value::Float(f) => Ok(Value::Float(libm::fabs(*f))),
            other => Err(not_numeric("abs", other)),
        }
    }

    fn round_with(name: &str, args: &[Value], op: fn(f64) -> f64) -> Result<Value, EvalError> {
        match &args[0] {
            Value::Null => Ok(Value::Null),
            Value::Int(i) => Ok(Value::Int(*i)),
            Value::Float(f) => Ok(Value::Float(op(*f))),
            other => Err(not_numeric(name, other)),
        }
    }

    fn ceil(args: &[Value]) -> Result<Value, EvalError> {
        round_with("ceil", args, libm::ceil)
    }

    fn floor(args: &[Value]) -> Result<Value, EvalError> {
        round_with("floor", args, libm::floor)
    }

    fn round(args: &[Value]) -> Result<Value, EvalError> {
        round_with("round", args, libm::round)
    }

    fn sqrt(args: &[Value]) -> Result<Value, EvalError> {
        match &args[0] {
            Value::Null => Ok(Value::Null),
            Value::Int(i) => Ok(Value::Float(libm::sqrt(*i as f64))),
            Value::Float(f) => Ok(Value::Float(libm::sqrt(*f))),
            other => Err(not_numeric("sqrt", other)),
        }
    }

    fn string_arg<'a>(name: &str, value: &'a Value) -> Result<Option<&'a str>, EvalError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(EvalError::invalid_argument(
                name,
                alloc::format!("expected a string, got {}", other.value_type()),
            )),
        }
    }

    fn upper(args: &[Value]) -> Result<Value, EvalError> {
        Ok(string_arg("upper", &args[0])?
            .map(|s| Value::String(s.to_uppercase()))
            .unwrap_or(Value::Null))
    }

    fn lower(args: &[Value]) -> Result<Value, EvalError> {
        Ok(string_arg("lower", &args[0])?
            .map(|s| Value::String(s.to_lowercase()))
            .unwrap_or(Value::Null))
    }

    fn length(args: &[Value]) -> Result<Value, EvalError> {
        let len = match &args[0] {
            Value::Null => return Ok(Value::Null),
            Value::String(s) => s.chars().count(),
            Value::Blob(b) => b.len(),
            Value::Array(a) => a.len(),
            Value::Map(m) => m.len(),
            other => {
                return Err(EvalError::invalid_argument(
                    "length",
                    alloc::format!("{} has no length", other.value_type()),
                ))
            }
        };
        Ok(Value::Int(len as i64))
    }

    /// Concatenates the string forms of all non-null arguments.
    fn concat(args: &[Value]) -> Result<Value, EvalError> {
        let mut out = String::new();
        for arg in args.iter().filter(|arg| !arg.is_null()) {
            out.push_str(&arg.to_string_value()?);
        }
        Ok(Value::String(out))
    }

    fn coalesce(args: &[Value]) -> Result<Value, EvalError> {
        Ok(args
            .iter()
            .find(|arg| !arg.is_null())
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn nullif(args: &[Value]) -> Result<Value, EvalError> {
        if args[0] == args[1] {
            Ok(Value::Null)
        } else {
            Ok(args[0].clone())
        }
    }

    fn stringify(args: &[Value]) -> Result<Value, EvalError> {
        match &args[0] {
            Value::Null => Ok(Value::Null),
            value => Ok(Value::String(value.to_string_value()?)),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use alloc::vec;

        fn call(name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
            let func = builtins()
                .into_iter()
                .find(|f| f.name() == name)
                .unwrap();
            assert!(func.accepts(args.len()));
            func.call(&args)
        }

        #[test]
        fn test_math() {
            assert_eq!(call("abs", vec![Value::Int(-3)]).unwrap(), Value::Int(3));
            assert_eq!(call("abs", vec![Value::Float(-1.5)]).unwrap(), Value::Float(1.5));
            assert_eq!(
                call("abs", vec![Value::Int(i64::MIN)]).unwrap_err(),
                EvalError::Overflow { op: "abs" }
            );
            assert_eq!(call("ceil", vec![Value::Float(1.2)]).unwrap(), Value::Float(2.0));
            assert_eq!(call("floor", vec![Value::Float(1.8)]).unwrap(), Value::Float(1.0));
            assert_eq!(call("round", vec![Value::Float(2.5)]).unwrap(), Value::Float(3.0));
            assert_eq!(call("round", vec![Value::Int(7)]).unwrap(), Value::Int(7));
            assert_eq!(call("sqrt", vec![Value::Int(9)]).unwrap(), Value::Float(3.0));
            assert_eq!(call("abs", vec![Value::Null]).unwrap(), Value::Null);
            assert!(call("abs", vec![Value::from("x")]).is_err());
        }

        #[test]
        fn test_strings() {
            assert_eq!(call("upper", vec![Value::from("abc")]).unwrap(), Value::from("ABC"));
            assert_eq!(call("lower", vec![Value::from("ABC")]).unwrap(), Value::from("abc"));
            assert_eq!(call("length", vec![Value::from("héllo")]).unwrap(), Value::Int(5));
            assert_eq!(
                call("concat", vec![Value::from("a"), Value::Null, Value::Int(1)]).unwrap(),
                Value::from("a1")
            );
            assert_eq!(call("str", vec![Value::Float(1.5)]).unwrap(), Value::from("1.5"));
            assert_eq!(call("str", vec![Value::Null]).unwrap(), Value::Null);
            assert!(call("upper", vec![Value::Int(1)]).is_err());
        }

        #[test]
        fn test_null_handling() {
            assert_eq!(
                call("coalesce", vec![Value::Null, Value::Int(2), Value::Int(3)]).unwrap(),
                Value::Int(2)
            );
            assert_eq!(call("coalesce", vec![Value::Null]).unwrap(), Value::Null);
            assert_eq!(
                call("nullif", vec![Value::Int(1), Value::Int(1)]).unwrap(),
                Value::Null
            );
            assert_eq!(
                call("nullif", vec![Value::Int(1), Value::Int(2)]).unwrap(),
                Value::Int(1)
            );
        }

        #[test]
        fn test_length_types() {
            assert_eq!(
                call("length", vec![Value::Array(vec![Value::Null, Value::Null])]).unwrap(),
                Value::Int(2)
            );
            assert!(call("length", vec![Value::Int(3)]).is_err());
        }
    }
}
