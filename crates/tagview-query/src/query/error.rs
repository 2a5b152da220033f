//! Error types for query parsing and validation.

use thiserror::Error;

use super::ast::Comparator;
use super::lexer::LexError;

/// A specialized Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors that can occur while parsing a query expression.
///
/// The parser is non-recovering: the first error aborts the parse. Offsets
/// are byte offsets into the original query string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The query is empty or contains only whitespace.
    #[error("query expression is empty")]
    EmptyExpression,

    /// The lexer rejected the input before parsing started.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// A token that does not fit the grammar at this point.
    #[error("expected {expected}, found {found} at offset {offset}")]
    UnexpectedToken {
        /// Description of the token set the grammar allows here.
        expected: String,
        /// The token actually present.
        found: String,
        /// Byte offset of the offending token.
        offset: usize,
    },

    /// The input ended where the grammar required more tokens.
    #[error("unexpected end of query at offset {offset}")]
    UnexpectedEnd {
        /// Byte offset of the end of input.
        offset: usize,
    },

    /// A closing parenthesis with no matching opening parenthesis.
    #[error("unmatched ')' at offset {offset}")]
    UnmatchedParen {
        /// Byte offset of the stray parenthesis.
        offset: usize,
    },
}

impl ParseError {
    /// Returns the byte offset the error points at, if it has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::EmptyExpression => None,
            ParseError::Lex(e) => e.position(),
            ParseError::UnexpectedToken { offset, .. }
            | ParseError::UnexpectedEnd { offset }
            | ParseError::UnmatchedParen { offset } => Some(*offset),
        }
    }
}

/// A specialized Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors that can occur while validating a parsed query.
///
/// Validation happens before compilation and execution; none of these leave
/// side effects anywhere.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// A field name that is not part of the query surface.
    #[error("unknown field '{name}'{}", suggestion_suffix(.suggestion))]
    UnknownField {
        /// The field name as written.
        name: String,
        /// A close known field name, if one is within edit distance.
        suggestion: Option<String>,
    },

    /// A function name outside the supported set.
    #[error("unknown function '{name}' (supported: contains, startsWith, endsWith)")]
    UnknownFunction {
        /// The function name as written.
        name: String,
    },

    /// A comparator the field does not support.
    #[error("comparator '{op}' is not valid for field '{field}'")]
    IncompatibleComparator {
        /// The resolved field name.
        field: &'static str,
        /// The rejected comparator.
        op: Comparator,
    },

    /// A value of the wrong type for the field.
    #[error("field '{field}' requires a {expected} value, got a {found}")]
    InvalidValueType {
        /// The resolved field name.
        field: &'static str,
        /// The value type the field requires.
        expected: &'static str,
        /// The value type actually present.
        found: &'static str,
    },

    /// A date value that is neither ISO-8601 nor a known shorthand.
    #[error("'{value}' is not a date (expected ISO-8601, 'today', or e.g. '-7d')")]
    MalformedDate {
        /// The rejected value text.
        value: String,
    },

    /// A tag reference that resolved to nothing, under strict resolution.
    #[error("no tag matches '{value}'")]
    UnknownTag {
        /// The tag text as written.
        value: String,
    },

    /// The query exceeds a configured complexity limit.
    #[error("query too complex: {reason}")]
    QueryTooComplex {
        /// Which limit was exceeded and by how much.
        reason: String,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(", did you mean '{}'?", s),
        None => String::new(),
    }
}
