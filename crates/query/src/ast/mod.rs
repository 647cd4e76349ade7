//! AST module for continuous-query expressions.

mod expr;
mod query;

pub use expr::{BinaryOp, CallKind, Expr, FieldRef, UnaryOp};
pub use query::{AliasedExpr, SelectQuery, WILDCARD_ALIAS};
