//! Function lookup by name and arity.

use super::{AggregateFunction, Function, FunctionKind, ScalarFunction};
use crate::error::RegistryError;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use hashbrown::HashMap;

/// Resolves function names to implementations when a plan is built.
pub trait FunctionRegistry: Send + Sync {
    /// Looks up a function that accepts `arity` arguments.
    fn lookup(&self, name: &str, arity: usize) -> Result<Function, RegistryError>;
}

/// Registry backed by a hash map. Names are case-insensitive.
#[derive(Debug, Default)]
pub struct DefaultFunctionRegistry {
    functions: HashMap<String, Function>,
}

impl DefaultFunctionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every builtin scalar and aggregate function.
    #[cfg(feature = "builtins")]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for func in super::scalar::builtins() {
            registry.insert(Function::Scalar(func));
        }
        for func in super::aggregate::builtins() {
            registry.insert(Function::Aggregate(func));
        }
        registry
    }

    /// Registers a scalar function.
    pub fn register_scalar(&mut self, func: Arc<dyn ScalarFunction>) -> Result<(), RegistryError> {
        self.try_insert(Function::Scalar(func))
    }

    /// Registers an aggregate function.
    pub fn register_aggregate(
        &mut self,
        func: Arc<dyn AggregateFunction>,
    ) -> Result<(), RegistryError> {
        self.try_insert(Function::Aggregate(func))
    }

    /// Removes a function and returns it.
    pub fn unregister(&mut self, name: &str) -> Result<Function, RegistryError> {
        self.functions
            .remove(&name.to_lowercase())
            .ok_or_else(|| RegistryError::NotFound { name: name.into() })
    }

    /// Returns the names and kinds of all registered functions, sorted by name.
    pub fn list(&self) -> Vec<(String, FunctionKind)> {
        let mut names: Vec<_> = self
            .functions
            .iter()
            .map(|(name, func)| (name.clone(), func.kind()))
            .collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn try_insert(&mut self, func: Function) -> Result<(), RegistryError> {
        let name = func.name().to_lowercase();
        if self.functions.contains_key(&name) {
            return Err(RegistryError::AlreadyExists { name });
        }
        self.functions.insert(name, func);
        Ok(())
    }

    #[cfg(feature = "builtins")]
    fn insert(&mut self, func: Function) {
        self.functions.insert(func.name().to_lowercase(), func);
    }
}

impl FunctionRegistry for DefaultFunctionRegistry {
    fn lookup(&self, name: &str, arity: usize) -> Result<Function, RegistryError> {
        let func = self
            .functions
            .get(&name.to_lowercase())
            .ok_or_else(|| RegistryError::NotFound { name: name.into() })?;
        if !func.accepts(arity) {
            return Err(RegistryError::ArityMismatch {
                name: name.into(),
                arity,
            });
        }
        Ok(func.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::function::{Arity, NativeScalar};
    use rivulet_core::Value;

    fn double(args: &[Value]) -> Result<Value, EvalError> {
        Ok(Value::Int(args[0].to_int()? * 2))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = DefaultFunctionRegistry::new();
        assert!(registry.is_empty());

        registry
            .register_scalar(Arc::new(NativeScalar::new("Double", Arity::Exact(1), double)))
            .unwrap();
        assert!(registry.contains("double"));

        let func = registry.lookup("DOUBLE", 1).unwrap();
        assert_eq!(func.kind(), FunctionKind::Scalar);
        assert_eq!(func.name(), "double");

        assert_eq!(
            registry.lookup("double", 2).unwrap_err(),
            RegistryError::ArityMismatch {
                name: "double".into(),
                arity: 2
            }
        );
        assert_eq!(
            registry.lookup("triple", 1).unwrap_err(),
            RegistryError::NotFound {
                name: "triple".into()
            }
        );
    }

    #[test]
    fn test_register_duplicate() {
        let mut registry = DefaultFunctionRegistry::new();
        let func = Arc::new(NativeScalar::new("double", Arity::Exact(1), double));
        registry.register_scalar(func.clone()).unwrap();
        assert_eq!(
            registry.register_scalar(func).unwrap_err(),
            RegistryError::AlreadyExists {
                name: "double".into()
            }
        );
    }

    #[test]
    fn test_unregister() {
        let mut registry = DefaultFunctionRegistry::new();
        registry
            .register_scalar(Arc::new(NativeScalar::new("double", Arity::Exact(1), double)))
            .unwrap();

        assert!(registry.unregister("double").is_ok());
        assert!(!registry.contains("double"));
        assert!(matches!(
            registry.unregister("double"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[cfg(feature = "builtins")]
    #[test]
    fn test_builtins() {
        let registry = DefaultFunctionRegistry::with_builtins();
        assert_eq!(registry.lookup("count", 1).unwrap().kind(), FunctionKind::Aggregate);
        assert_eq!(registry.lookup("abs", 1).unwrap().kind(), FunctionKind::Scalar);
        assert!(registry.lookup("concat", 4).is_ok());
        assert!(registry.lookup("sum", 2).is_err());

        let list = registry.list();
        let names: Vec<&str> = list.iter().map(|(name, _)| name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"stddev"));
    }
}
