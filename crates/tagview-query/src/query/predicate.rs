//! The validated predicate tree produced by the semantic validator.
//!
//! [`Predicate`] is what the two compiler backends consume: tag references
//! are already resolved to id sets, `!=` is normalized to `NOT (=)`, relative
//! dates are resolved to instants, and glob patterns are translated once into
//! [`LikePattern`] so both backends interpret the same pattern text.

use chrono::{DateTime, Utc};

/// An ordered comparison operator, after `!=` normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `=`
    Eq,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gte,
    /// `<=`
    Lte,
}

impl CmpOp {
    /// The SQL spelling of this operator.
    pub fn sql(&self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Gt => ">",
            CmpOp::Lt => "<",
            CmpOp::Gte => ">=",
            CmpOp::Lte => "<=",
        }
    }

    /// Applies the comparison to two ordered values.
    pub fn compare<T: PartialOrd>(&self, left: T, right: T) -> bool {
        match self {
            CmpOp::Eq => left == right,
            CmpOp::Gt => left > right,
            CmpOp::Lt => left < right,
            CmpOp::Gte => left >= right,
            CmpOp::Lte => left <= right,
        }
    }
}

/// A SQL-style `LIKE` pattern (`%` any run, `_` any one, `\` escapes).
///
/// Built once by the validator (from user glob syntax or from a function
/// expansion) and then read by both backends: the relational backend emits
/// the pattern text as a `LIKE ? ESCAPE '\'` parameter, the in-memory
/// backend interprets it with [`LikePattern::matches`]. Matching is ASCII
/// case-insensitive, as SQLite's default `LIKE` is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikePattern(String);

impl LikePattern {
    /// Translates user glob syntax: `*` → `%`, `?` → `_`, with literal
    /// `%`/`_`/`\` in the input escaped first.
    pub fn from_glob(glob: &str) -> Self {
        let mut pattern = String::with_capacity(glob.len());
        for c in glob.chars() {
            match c {
                '*' => pattern.push('%'),
                '?' => pattern.push('_'),
                '%' | '_' | '\\' => {
                    pattern.push('\\');
                    pattern.push(c);
                }
                other => pattern.push(other),
            }
        }
        Self(pattern)
    }

    /// Pattern matching `text` anywhere: `%text%`.
    pub fn contains(literal: &str) -> Self {
        Self(format!("%{}%", escape_literal(literal)))
    }

    /// Pattern matching a prefix: `text%`.
    pub fn starts_with(literal: &str) -> Self {
        Self(format!("{}%", escape_literal(literal)))
    }

    /// Pattern matching a suffix: `%text`.
    pub fn ends_with(literal: &str) -> Self {
        Self(format!("%{}", escape_literal(literal)))
    }

    /// The pattern text to bind as a SQL parameter.
    pub fn as_sql(&self) -> &str {
        &self.0
    }

    /// Interprets the pattern against `text`, ASCII case-insensitively.
    pub fn matches(&self, text: &str) -> bool {
        let pattern: Vec<char> = self.0.chars().collect();
        let text: Vec<char> = text.chars().collect();
        like_match(&pattern, &text)
    }
}

/// Escapes `%`, `_`, and `\` so a literal can be embedded in a pattern.
fn escape_literal(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if c == '%' || c == '_' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn chars_eq(a: char, b: char) -> bool {
    a.eq_ignore_ascii_case(&b)
}

fn like_match(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('%', rest)) => (0..=text.len()).any(|skip| like_match(rest, &text[skip..])),
        Some(('_', rest)) => !text.is_empty() && like_match(rest, &text[1..]),
        Some(('\\', rest)) => match rest.split_first() {
            Some((escaped, rest)) => {
                !text.is_empty() && chars_eq(*escaped, text[0]) && like_match(rest, &text[1..])
            }
            // A trailing backslash matches nothing.
            None => false,
        },
        Some((c, rest)) => !text.is_empty() && chars_eq(*c, text[0]) && like_match(rest, &text[1..]),
    }
}

/// A validated text test on the name or path column.
#[derive(Debug, Clone, PartialEq)]
pub enum TextMatch {
    /// Exact, case-sensitive equality.
    Exact(String),
    /// `LIKE`-style pattern match.
    Pattern(LikePattern),
    /// Membership in a fixed list, case-sensitive.
    AnyOf(Vec<String>),
}

/// A validated, compiler-ready filter tree.
///
/// Closed sum type: both backends match exhaustively, so a new predicate
/// kind fails the build until every consumer handles it.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// The item carries at least one of these tags. The empty set matches
    /// no items (and everything under `Not`).
    TagAny {
        /// Resolved tag ids, sorted and deduplicated.
        tag_ids: Vec<i64>,
    },

    /// Test on the item's file name.
    Name(TextMatch),

    /// Test on the item's full path.
    Path(TextMatch),

    /// Size comparison in bytes. Directories (size unknown) never match.
    Size {
        /// The comparison operator.
        op: CmpOp,
        /// Right-hand side in bytes.
        bytes: i64,
    },

    /// Modification time comparison.
    Modified {
        /// The comparison operator.
        op: CmpOp,
        /// Resolved right-hand instant.
        at: DateTime<Utc>,
    },

    /// Creation time comparison.
    Created {
        /// The comparison operator.
        op: CmpOp,
        /// Resolved right-hand instant.
        at: DateTime<Utc>,
    },

    /// Logical AND.
    And(Box<Predicate>, Box<Predicate>),

    /// Logical OR.
    Or(Box<Predicate>, Box<Predicate>),

    /// Logical NOT (plain two-valued complement).
    Not(Box<Predicate>),
}

impl Predicate {
    /// Creates an AND predicate from two predicates.
    pub fn and(left: Predicate, right: Predicate) -> Self {
        Predicate::And(Box::new(left), Box::new(right))
    }

    /// Creates an OR predicate from two predicates.
    pub fn or(left: Predicate, right: Predicate) -> Self {
        Predicate::Or(Box::new(left), Box::new(right))
    }

    /// Creates a NOT predicate from another predicate.
    pub fn negate(inner: Predicate) -> Self {
        Predicate::Not(Box::new(inner))
    }
}
