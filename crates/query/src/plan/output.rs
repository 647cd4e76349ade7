//! Output record assembly.

use crate::ast::WILDCARD_ALIAS;
use crate::error::{AssignError, CompileError};
use alloc::string::ToString;
use rivulet_core::{Map, Path, Segment, Value, ValueType};

/// Largest array index an output alias may write to.
pub const MAX_OUTPUT_INDEX: usize = 4_096;

/// Where a projection's value goes in the output record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputTarget {
    /// Merge the fields of a map value into the output.
    Wildcard,
    /// Store the value at this path.
    Path(Path),
}

impl OutputTarget {
    /// Parses an output alias.
    pub fn parse(alias: &str) -> Result<Self, CompileError> {
        if alias == WILDCARD_ALIAS {
            return Ok(OutputTarget::Wildcard);
        }
        let path = Path::parse(alias).map_err(|err| match err {
            rivulet_core::Error::InvalidPath { message, .. } => {
                CompileError::invalid_alias(alias, message)
            }
            other => CompileError::invalid_alias(alias, other.to_string()),
        })?;
        let oversized = path
            .segments()
            .iter()
            .any(|segment| matches!(segment, Segment::Index(idx) if *idx > MAX_OUTPUT_INDEX));
        if oversized {
            return Err(CompileError::invalid_alias(
                alias,
                alloc::format!("array index exceeds {}", MAX_OUTPUT_INDEX),
            ));
        }
        Ok(OutputTarget::Path(path))
    }
}

/// Writes one projection result into `output`.
///
/// Later writes replace earlier ones with the same key.
pub fn assign_output_value(
    output: &mut Map,
    target: &OutputTarget,
    value: Value,
) -> Result<(), AssignError> {
    match target {
        OutputTarget::Wildcard => match value {
            Value::Map(fields) => {
                output.extend(fields);
                Ok(())
            }
            other => Err(AssignError::NotARecord {
                found: other.value_type(),
            }),
        },
        OutputTarget::Path(path) => output.set_path(path, value).map_err(|err| match err {
            rivulet_core::Error::IncompatiblePath { path, found } => {
                AssignError::IncompatiblePath { path, found }
            }
            _ => AssignError::IncompatiblePath {
                path: path.to_string(),
                found: ValueType::Null,
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(alias: &str) -> OutputTarget {
        OutputTarget::parse(alias).unwrap()
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(target("*"), OutputTarget::Wildcard);
        assert_eq!(target("a.b"), OutputTarget::Path(Path::parse("a.b").unwrap()));
        assert!(matches!(
            OutputTarget::parse("a..b"),
            Err(CompileError::InvalidAlias { .. })
        ));
    }

    #[test]
    fn test_parse_target_caps_index() {
        assert!(matches!(target("a[4096]"), OutputTarget::Path(_)));
        assert!(matches!(
            OutputTarget::parse("a[1000000000]"),
            Err(CompileError::InvalidAlias { .. })
        ));
        assert!(matches!(
            OutputTarget::parse("a[4097].b"),
            Err(CompileError::InvalidAlias { .. })
        ));
    }

    #[test]
    fn test_wildcard_then_column() {
        let mut output = Map::new();
        let fields = Map::from([("a", Value::Int(1)), ("b", Value::Int(2))]);
        assign_output_value(&mut output, &target("*"), Value::Map(fields)).unwrap();
        assign_output_value(&mut output, &target("a"), Value::Int(3)).unwrap();

        assert_eq!(output, Map::from([("a", Value::Int(3)), ("b", Value::Int(2))]));
    }

    #[test]
    fn test_column_then_wildcard() {
        let mut output = Map::new();
        assign_output_value(&mut output, &target("a"), Value::Int(3)).unwrap();
        let fields = Map::from([("a", Value::Int(1))]);
        assign_output_value(&mut output, &target("*"), Value::Map(fields)).unwrap();

        assert_eq!(output.get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_wildcard_requires_map() {
        let mut output = Map::new();
        assert_eq!(
            assign_output_value(&mut output, &target("*"), Value::Int(1)).unwrap_err(),
            AssignError::NotARecord {
                found: ValueType::Int
            }
        );
    }

    #[test]
    fn test_nested_paths() {
        let mut output = Map::new();
        assign_output_value(&mut output, &target("a.b"), Value::Int(1)).unwrap();
        assign_output_value(&mut output, &target("a.c"), Value::Int(2)).unwrap();
        assert_eq!(
            output.get("a").and_then(|v| v.as_map()).map(|m| m.len()),
            Some(2)
        );

        assign_output_value(&mut output, &target("x"), Value::Int(1)).unwrap();
        assert!(matches!(
            assign_output_value(&mut output, &target("x.y"), Value::Int(2)),
            Err(AssignError::IncompatiblePath {
                found: ValueType::Int,
                ..
            })
        ));
    }
}
