//! Parsed clauses of one continuous query.

use crate::ast::Expr;
use alloc::string::String;
use alloc::vec::Vec;

/// Output alias that merges a record-valued projection into the output.
pub const WILDCARD_ALIAS: &str = "*";

/// One projection: an expression and the output column it is written to.
#[derive(Clone, Debug, PartialEq)]
pub struct AliasedExpr {
    /// Output path, or [`WILDCARD_ALIAS`].
    pub alias: String,
    pub expr: Expr,
}

impl AliasedExpr {
    pub fn new(alias: impl Into<String>, expr: Expr) -> Self {
        Self {
            alias: alias.into(),
            expr,
        }
    }
}

/// The SELECT list, WHERE and GROUP BY clauses of a query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectQuery {
    pub projections: Vec<AliasedExpr>,
    pub filter: Option<Expr>,
    pub group_by: Vec<Expr>,
}

impl SelectQuery {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a projection.
    pub fn project(mut self, alias: impl Into<String>, expr: Expr) -> Self {
        self.projections.push(AliasedExpr::new(alias, expr));
        self
    }

    /// Sets the WHERE clause.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(expr);
        self
    }

    /// Appends a GROUP BY expression.
    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_by.push(expr);
        self
    }
}
