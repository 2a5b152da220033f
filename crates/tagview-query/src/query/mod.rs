//! Query language engine for the tagview catalog.
//!
//! This module lexes, parses, validates, and compiles the textual filter
//! language the search box speaks, producing either a relational filter for
//! the storage collaborator or a pure in-memory predicate used as reference
//! semantics.
//!
//! # Supported Syntax
//!
//! ## Fields
//! - `tag` - tag membership (`=`, `!=`, `~`, `IN`)
//! - `name` (alias `filename`) - file name (`=`, `!=`, `~`, `IN`)
//! - `path` - full path (`=`, `!=`, `~`, `IN`)
//! - `size` - size in bytes, unit suffixes `B`/`KB`/`MB`/`GB` (`=`, `!=`,
//!   `>`, `<`, `>=`, `<=`)
//! - `modified`, `created` - timestamps; ISO-8601 values, `today`, or
//!   relative shorthands like `-7d` (same comparators as `size`)
//!
//! ## Values
//! - `"double quoted"` with `\"` and `\\` escapes
//! - bare words for tags and dates: `tag = events:2024`, `modified > -7d`
//! - `~` patterns use glob syntax: `name ~ "*.jpg"`
//!
//! ## Functions
//! - `contains(field, value)`, `startsWith(field, value)`,
//!   `endsWith(field, value)` - literal substring/prefix/suffix tests
//!
//! ## Boolean Operators
//! - `AND`, `OR`, `NOT` (case-sensitive), `()` for grouping
//!
//! # Pipeline
//!
//! ```text
//! &str -> Lexer -> QueryParser -> Expr -> Validator -> Predicate
//!                                                        |-> SqlFilter (relational backend)
//!                                                        '-> MemoryFilter (reference backend)
//! ```
//!
//! # Example
//!
//! ```
//! use tagview_model_rs::TagSnapshot;
//! use tagview_query_rs::query::{MemoryFilter, QueryParser, SqlFilter, Validator};
//!
//! let snapshot = TagSnapshot::default();
//! let expr = QueryParser::parse("size > 10MB AND name ~ \"*.jpg\"").unwrap();
//! let predicate = Validator::new(&snapshot).validate(&expr).unwrap();
//!
//! // Relational form for the storage collaborator:
//! let filter = SqlFilter::compile(&predicate);
//! assert!(filter.where_clause.contains("LIKE"));
//!
//! // Reference form for per-item evaluation:
//! let memory = MemoryFilter::new(&predicate);
//! # let _ = memory;
//! ```

mod ast;
mod error;
mod eval;
mod lexer;
mod parser;
mod predicate;
mod results;
mod sql;
mod validator;

pub use ast::{Comparator, Expr, Value};
pub use error::{ParseError, ParseResult, ValidationError, ValidationResult};
pub use eval::MemoryFilter;
pub use lexer::{LexError, Lexer, PositionedToken, QueryToken, MAX_QUERY_LEN};
pub use parser::QueryParser;
pub use predicate::{CmpOp, LikePattern, Predicate, TextMatch};
pub use results::MatchedItems;
pub use sql::{SqlFilter, SqlValue};
pub use validator::{Field, ResolvedTagRef, Validator, ValidatorOptions};
