//! Expression AST definitions.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use rivulet_core::{Value, ValueType};

/// Reference to a field of an input record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldRef {
    /// Stream alias, or None to read from the top level of the input record.
    pub alias: Option<String>,
    /// Field path below the alias (`a.b[0]`).
    pub path: String,
}

impl FieldRef {
    /// Creates a field reference without an alias.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            alias: None,
            path: path.into(),
        }
    }

    /// Creates a field reference namespaced by a stream alias.
    pub fn aliased(alias: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            path: path.into(),
        }
    }

    /// Returns the qualified name (alias:path or path).
    pub fn qualified_name(&self) -> String {
        match &self.alias {
            Some(alias) => alloc::format!("{}:{}", alias, self.path),
            None => self.path.clone(),
        }
    }
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // String
    Concat,
}

impl BinaryOp {
    /// Returns the operator as written in a query.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Concat => "||",
        }
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
}

/// Whether a function call was written as an ordinary or an aggregate call.
///
/// The parser decides this; the compiler trusts it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
    Scalar,
    Aggregate,
}

/// Expression AST node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Literal value.
    Literal(Value),
    /// Field reference.
    Field(FieldRef),
    /// Stream metadata reference, such as the event timestamp (`ts()`).
    Meta { alias: String, name: String },
    /// `*` or `alias:*`.
    Wildcard { alias: Option<String> },
    /// Binary operation.
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Unary operation.
    UnaryOp { op: UnaryOp, expr: Box<Expr> },
    /// CAST(expr AS type).
    Cast { expr: Box<Expr>, target: ValueType },
    /// Array constructor.
    Array(Vec<Expr>),
    /// Map constructor.
    Map(Vec<(String, Expr)>),
    /// Function call.
    Function {
        name: String,
        args: Vec<Expr>,
        kind: CallKind,
    },
}

impl Expr {
    /// Creates a literal expression.
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// Creates a field reference read from the top level of the input record.
    pub fn field(path: impl Into<String>) -> Self {
        Expr::Field(FieldRef::new(path))
    }

    /// Creates a field reference namespaced by a stream alias.
    pub fn aliased_field(alias: impl Into<String>, path: impl Into<String>) -> Self {
        Expr::Field(FieldRef::aliased(alias, path))
    }

    /// Creates a metadata reference.
    pub fn meta(alias: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Meta {
            alias: alias.into(),
            name: name.into(),
        }
    }

    /// Creates an event timestamp reference for the given alias.
    pub fn timestamp(alias: impl Into<String>) -> Self {
        Self::meta(alias, "ts")
    }

    /// Creates a `*` expression.
    pub fn wildcard() -> Self {
        Expr::Wildcard { alias: None }
    }

    /// Creates an `alias:*` expression.
    pub fn alias_wildcard(alias: impl Into<String>) -> Self {
        Expr::Wildcard {
            alias: Some(alias.into()),
        }
    }

    /// Creates a binary operation.
    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Creates an equality expression.
    pub fn eq(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Eq, right)
    }

    /// Creates a not-equal expression.
    pub fn ne(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Ne, right)
    }

    /// Creates a less-than expression.
    pub fn lt(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Lt, right)
    }

    /// Creates a less-than-or-equal expression.
    pub fn le(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Le, right)
    }

    /// Creates a greater-than expression.
    pub fn gt(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Gt, right)
    }

    /// Creates a greater-than-or-equal expression.
    pub fn ge(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Ge, right)
    }

    /// Creates an AND expression.
    pub fn and(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::And, right)
    }

    /// Creates an OR expression.
    pub fn or(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Or, right)
    }

    /// Creates an addition.
    pub fn add(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Add, right)
    }

    /// Creates a subtraction.
    pub fn sub(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Sub, right)
    }

    /// Creates a multiplication.
    pub fn mul(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Mul, right)
    }

    /// Creates a division.
    pub fn div(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Div, right)
    }

    /// Creates a string concatenation.
    pub fn concat(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Concat, right)
    }

    /// Creates a NOT expression.
    pub fn not(expr: Expr) -> Self {
        Expr::UnaryOp {
            op: UnaryOp::Not,
            expr: Box::new(expr),
        }
    }

    /// Creates a negation.
    pub fn neg(expr: Expr) -> Self {
        Expr::UnaryOp {
            op: UnaryOp::Neg,
            expr: Box::new(expr),
        }
    }

    /// Creates an IS NULL expression.
    pub fn is_null(expr: Expr) -> Self {
        Expr::UnaryOp {
            op: UnaryOp::IsNull,
            expr: Box::new(expr),
        }
    }

    /// Creates an IS NOT NULL expression.
    pub fn is_not_null(expr: Expr) -> Self {
        Expr::UnaryOp {
            op: UnaryOp::IsNotNull,
            expr: Box::new(expr),
        }
    }

    /// Creates a CAST expression.
    pub fn cast(expr: Expr, target: ValueType) -> Self {
        Expr::Cast {
            expr: Box::new(expr),
            target,
        }
    }

    /// Creates an ordinary function call.
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Function {
            name: name.into(),
            args,
            kind: CallKind::Scalar,
        }
    }

    /// Creates an aggregate function call.
    pub fn aggregate(name: impl Into<String>, arg: Expr) -> Self {
        Expr::Function {
            name: name.into(),
            args: alloc::vec![arg],
            kind: CallKind::Aggregate,
        }
    }

    /// Creates a COUNT(*) aggregate.
    pub fn count_star() -> Self {
        Self::aggregate("count", Expr::wildcard())
    }

    /// Returns true if this expression contains an aggregate call anywhere.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expr::Literal(_) | Expr::Field(_) | Expr::Meta { .. } | Expr::Wildcard { .. } => false,
            Expr::BinaryOp { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            Expr::UnaryOp { expr, .. } | Expr::Cast { expr, .. } => expr.contains_aggregate(),
            Expr::Array(items) => items.iter().any(Expr::contains_aggregate),
            Expr::Map(entries) => entries.iter().any(|(_, e)| e.contains_aggregate()),
            Expr::Function { args, kind, .. } => {
                *kind == CallKind::Aggregate || args.iter().any(Expr::contains_aggregate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_field_ref() {
        let plain = FieldRef::new("x");
        assert_eq!(plain.alias, None);
        assert_eq!(plain.qualified_name(), "x");

        let aliased = FieldRef::aliased("s", "a.b");
        assert_eq!(aliased.qualified_name(), "s:a.b");
    }

    #[test]
    fn test_expr_builders() {
        let lit = Expr::literal(42i64);
        assert!(matches!(lit, Expr::Literal(Value::Int(42))));

        let gt = Expr::gt(Expr::field("x"), Expr::literal(1i64));
        assert!(matches!(gt, Expr::BinaryOp { op: BinaryOp::Gt, .. }));

        let ts = Expr::timestamp("s");
        assert_eq!(ts, Expr::meta("s", "ts"));
    }

    #[test]
    fn test_contains_aggregate() {
        assert!(!Expr::add(Expr::field("x"), Expr::literal(1i64)).contains_aggregate());
        assert!(Expr::add(
            Expr::aggregate("avg", Expr::field("x")),
            Expr::literal(1i64)
        )
        .contains_aggregate());
        assert!(Expr::call("abs", vec![Expr::count_star()]).contains_aggregate());
        assert!(Expr::Map(vec![("c".into(), Expr::count_star())]).contains_aggregate());
    }

    #[test]
    fn test_structural_equality() {
        let a = Expr::aggregate("sum", Expr::field("x"));
        let b = Expr::aggregate("sum", Expr::field("x"));
        let c = Expr::aggregate("sum", Expr::field("y"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
