//! Abstract syntax tree for query expressions.

use std::fmt;

/// A comparator relating a field to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `~` (pattern match)
    Like,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gte,
    /// `<=`
    Lte,
    /// `IN`
    In,
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Comparator::Eq => "=",
            Comparator::NotEq => "!=",
            Comparator::Like => "~",
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Gte => ">=",
            Comparator::Lte => "<=",
            Comparator::In => "IN",
        };
        f.write_str(s)
    }
}

/// A literal value in a query expression.
///
/// There is no implicit coercion between variants: a size comparison against
/// a [`Value::Str`] is a validation error, not a parse of the string.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A string literal, or a bare word used in value position.
    Str(String),
    /// A numeric literal, unit suffixes already normalized to bytes.
    Number(f64),
    /// An `IN` list.
    List(Vec<Value>),
}

impl Value {
    /// Human-readable name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Number(_) => "number",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => {
                write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
            Value::Number(n) => write!(f, "{}", n),
            Value::List(values) => {
                write!(f, "(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A parsed query expression.
///
/// Field and function names are kept as written; resolving them against the
/// known field set is the validator's job. The tree is exclusively owned:
/// no node is shared or cyclic.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A field/comparator/value test. For [`Comparator::In`] the value is a
    /// [`Value::List`].
    Comparison {
        /// The field name as written.
        field: String,
        /// The comparator.
        op: Comparator,
        /// The right-hand value.
        value: Value,
    },

    /// A function call such as `contains(name, "draft")`.
    Call {
        /// The function name as written.
        name: String,
        /// The field argument as written.
        field: String,
        /// The value argument.
        value: Value,
    },

    /// Logical AND of two expressions.
    And(Box<Expr>, Box<Expr>),

    /// Logical OR of two expressions.
    Or(Box<Expr>, Box<Expr>),

    /// Logical NOT of an expression.
    Not(Box<Expr>),
}

impl Expr {
    /// Creates an AND expression from two expressions.
    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And(Box::new(left), Box::new(right))
    }

    /// Creates an OR expression from two expressions.
    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or(Box::new(left), Box::new(right))
    }

    /// Creates a NOT expression from another expression.
    pub fn negate(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    /// Number of nodes in the tree, used for the complexity limit.
    pub fn node_count(&self) -> usize {
        match self {
            Expr::Comparison { .. } | Expr::Call { .. } => 1,
            Expr::And(l, r) | Expr::Or(l, r) => 1 + l.node_count() + r.node_count(),
            Expr::Not(inner) => 1 + inner.node_count(),
        }
    }

    /// Binding strength for the canonical printer: OR < AND < NOT < primary.
    fn precedence(&self) -> u8 {
        match self {
            Expr::Or(..) => 1,
            Expr::And(..) => 2,
            Expr::Not(..) => 3,
            Expr::Comparison { .. } | Expr::Call { .. } => 4,
        }
    }

    /// Writes `child`, parenthesized if it binds looser than `min`.
    fn fmt_child(child: &Expr, min: u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if child.precedence() < min {
            write!(f, "({})", child)
        } else {
            write!(f, "{}", child)
        }
    }
}

/// Canonical text form.
///
/// Parentheses are emitted only where the structure requires them, so
/// re-parsing the output reconstructs a structurally identical tree.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Comparison { field, op, value } => {
                write!(f, "{} {} {}", field, op, value)
            }
            Expr::Call { name, field, value } => {
                write!(f, "{}({}, {})", name, field, value)
            }
            // Left-associative chains print flat; a same-precedence right
            // child needs parentheses to survive re-parsing.
            Expr::And(l, r) => {
                Expr::fmt_child(l, 2, f)?;
                write!(f, " AND ")?;
                Expr::fmt_child(r, 3, f)
            }
            Expr::Or(l, r) => {
                Expr::fmt_child(l, 1, f)?;
                write!(f, " OR ")?;
                Expr::fmt_child(r, 2, f)
            }
            Expr::Not(inner) => {
                write!(f, "NOT ")?;
                Expr::fmt_child(inner, 3, f)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(field: &str, op: Comparator, value: Value) -> Expr {
        Expr::Comparison {
            field: field.to_string(),
            op,
            value,
        }
    }

    #[test]
    fn test_display_comparison() {
        let e = cmp("tag", Comparator::Eq, Value::Str("vacation".to_string()));
        assert_eq!(e.to_string(), "tag = \"vacation\"");
    }

    #[test]
    fn test_display_number() {
        let e = cmp("size", Comparator::Gt, Value::Number(10485760.0));
        assert_eq!(e.to_string(), "size > 10485760");
    }

    #[test]
    fn test_display_in_list() {
        let e = cmp(
            "tag",
            Comparator::In,
            Value::List(vec![
                Value::Str("work".to_string()),
                Value::Str("project".to_string()),
            ]),
        );
        assert_eq!(e.to_string(), "tag IN (\"work\", \"project\")");
    }

    #[test]
    fn test_display_call() {
        let e = Expr::Call {
            name: "contains".to_string(),
            field: "name".to_string(),
            value: Value::Str("draft".to_string()),
        };
        assert_eq!(e.to_string(), "contains(name, \"draft\")");
    }

    #[test]
    fn test_display_escapes_string_value() {
        let e = cmp("name", Comparator::Eq, Value::Str("a\"b\\c".to_string()));
        assert_eq!(e.to_string(), "name = \"a\\\"b\\\\c\"");
    }

    #[test]
    fn test_display_left_associative_chain_prints_flat() {
        let a = cmp("tag", Comparator::Eq, Value::Str("a".to_string()));
        let b = cmp("tag", Comparator::Eq, Value::Str("b".to_string()));
        let c = cmp("tag", Comparator::Eq, Value::Str("c".to_string()));
        let e = Expr::and(Expr::and(a, b), c);
        assert_eq!(
            e.to_string(),
            "tag = \"a\" AND tag = \"b\" AND tag = \"c\""
        );
    }

    #[test]
    fn test_display_or_under_and_gets_parens() {
        let a = cmp("tag", Comparator::Eq, Value::Str("a".to_string()));
        let b = cmp("tag", Comparator::Eq, Value::Str("b".to_string()));
        let c = cmp("tag", Comparator::Eq, Value::Str("c".to_string()));
        let e = Expr::and(a, Expr::or(b, c));
        assert_eq!(
            e.to_string(),
            "tag = \"a\" AND (tag = \"b\" OR tag = \"c\")"
        );
    }

    #[test]
    fn test_display_right_nested_same_precedence_gets_parens() {
        let a = cmp("tag", Comparator::Eq, Value::Str("a".to_string()));
        let b = cmp("tag", Comparator::Eq, Value::Str("b".to_string()));
        let c = cmp("tag", Comparator::Eq, Value::Str("c".to_string()));
        let e = Expr::or(a, Expr::or(b, c));
        assert_eq!(
            e.to_string(),
            "tag = \"a\" OR (tag = \"b\" OR tag = \"c\")"
        );
    }

    #[test]
    fn test_display_not() {
        let a = cmp("tag", Comparator::Eq, Value::Str("a".to_string()));
        let b = cmp("tag", Comparator::Eq, Value::Str("b".to_string()));
        assert_eq!(
            Expr::negate(Expr::and(a.clone(), b)).to_string(),
            "NOT (tag = \"a\" AND tag = \"b\")"
        );
        assert_eq!(
            Expr::negate(Expr::negate(a)).to_string(),
            "NOT NOT tag = \"a\""
        );
    }

    #[test]
    fn test_node_count() {
        let a = cmp("tag", Comparator::Eq, Value::Str("a".to_string()));
        let b = cmp("tag", Comparator::Eq, Value::Str("b".to_string()));
        assert_eq!(a.node_count(), 1);
        assert_eq!(Expr::negate(a.clone()).node_count(), 2);
        assert_eq!(Expr::and(a, b).node_count(), 3);
    }
}
