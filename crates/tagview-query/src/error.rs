//! Service-level error types and UI diagnostics.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::query::{LexError, ParseError, ValidationError};
use crate::store::StoreError;

/// Errors raised while executing a compiled filter.
///
/// Queries are read-only and idempotent, so nothing here is ever retried by
/// the engine; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The storage engine failed, surfaced verbatim.
    #[error("storage engine failure: {0}")]
    Store(#[from] StoreError),

    /// The caller-supplied time limit elapsed before the query finished.
    #[error("query timed out after {limit:?}")]
    Timeout {
        /// The limit that elapsed.
        limit: Duration,
    },

    /// The worker task running the query was cancelled before completing.
    #[error("query worker task was cancelled")]
    Cancelled,
}

/// Any error a query evaluation can produce, by pipeline stage.
///
/// Lex, parse, and validation failures occur before any execution and leave
/// zero side effects; execution failures are tagged with their origin.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The input could not be tokenized.
    #[error(transparent)]
    Lex(LexError),

    /// The token stream does not fit the grammar.
    #[error(transparent)]
    Parse(ParseError),

    /// The AST fails semantic validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The compiled filter could not be executed.
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl From<ParseError> for QueryError {
    fn from(error: ParseError) -> Self {
        // Lex failures travel through the parser entry point; unwrap them
        // back into their own stage.
        match error {
            ParseError::Lex(lex) => QueryError::Lex(lex),
            other => QueryError::Parse(other),
        }
    }
}

impl From<LexError> for QueryError {
    fn from(error: LexError) -> Self {
        QueryError::Lex(error)
    }
}

impl QueryError {
    /// The pipeline stage that failed.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::Lex(_) => "lex",
            QueryError::Parse(_) => "parse",
            QueryError::Validation(_) => "validation",
            QueryError::Execution(_) => "execution",
        }
    }

    /// The byte offset the error points at, when it has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            QueryError::Lex(e) => e.position(),
            QueryError::Parse(e) => e.position(),
            QueryError::Validation(_) | QueryError::Execution(_) => None,
        }
    }

    /// Builds the UI-facing diagnostic for this error against the query it
    /// came from.
    pub fn diagnostic(&self, query: &str) -> Diagnostic {
        Diagnostic {
            kind: self.kind(),
            message: self.to_string(),
            offset: self.offset(),
            snippet: render_snippet(query, self.offset()),
        }
    }
}

/// A positioned, displayable description of a failed query.
///
/// Serializable so the host application can ship it to the search box UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The pipeline stage that failed.
    pub kind: &'static str,
    /// Human-readable description.
    pub message: String,
    /// Byte offset into the query, when known.
    pub offset: Option<usize>,
    /// The query with a caret line under the offending position.
    pub snippet: String,
}

/// Renders the query with a `^` caret under the given byte offset.
fn render_snippet(query: &str, offset: Option<usize>) -> String {
    let Some(offset) = offset else {
        return query.to_string();
    };

    // The caret column counts characters, not bytes.
    let column = query
        .get(..offset.min(query.len()))
        .map(|prefix| prefix.chars().count())
        .unwrap_or(0);
    format!("{}\n{}^", query, " ".repeat(column))
}
