//! Relational compiler backend.
//!
//! Walks a validated [`Predicate`] and emits a single boolean filter
//! expression over the `items` table (aliased `i`) plus an ordered parameter
//! list. Compilation never touches a connection; executing the filter is the
//! storage collaborator's job.
//!
//! Tag membership compiles to a correlated `EXISTS` subquery. `EXISTS` /
//! `NOT EXISTS` composes correctly under arbitrary nesting of AND/OR/NOT,
//! unlike a GROUP BY/HAVING count translation, which only works at the top
//! level of a conjunction.

use super::predicate::{Predicate, TextMatch};

/// A parameter bound into the compiled filter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// An integer parameter (tag ids, byte sizes, unix timestamps).
    Int(i64),
    /// A text parameter (names, paths, `LIKE` patterns).
    Text(String),
}

/// A compiled boolean filter: a WHERE-clause fragment plus its parameters
/// in left-to-right AST order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilter {
    /// The boolean expression, with `?` placeholders.
    pub where_clause: String,
    /// Parameters, ordered to match the placeholders.
    pub params: Vec<SqlValue>,
}

impl SqlFilter {
    /// Compiles a validated predicate into a filter expression.
    pub fn compile(predicate: &Predicate) -> SqlFilter {
        let mut where_clause = String::new();
        let mut params = Vec::new();
        emit(predicate, &mut where_clause, &mut params);
        SqlFilter {
            where_clause,
            params,
        }
    }
}

fn emit(predicate: &Predicate, sql: &mut String, params: &mut Vec<SqlValue>) {
    match predicate {
        Predicate::TagAny { tag_ids } => {
            if tag_ids.is_empty() {
                // An unresolved tag reference matches nothing; under NOT it
                // matches everything. A constant keeps that exact semantics.
                sql.push_str("FALSE");
                return;
            }
            sql.push_str(
                "EXISTS (SELECT 1 FROM item_tags t WHERE t.item_id = i.id AND t.tag_id IN (",
            );
            push_placeholders(sql, tag_ids.len());
            sql.push_str("))");
            params.extend(tag_ids.iter().map(|id| SqlValue::Int(*id)));
        }

        Predicate::Name(text_match) => emit_text("i.name", text_match, sql, params),
        Predicate::Path(text_match) => emit_text("i.path", text_match, sql, params),

        Predicate::Size { op, bytes } => {
            // `size` is NULL for directories. The explicit guard keeps SQL's
            // three-valued logic out: the comparison is plainly false for
            // directories, and NOT of it is plainly true, matching the
            // in-memory backend.
            sql.push_str("(i.size IS NOT NULL AND i.size ");
            sql.push_str(op.sql());
            sql.push_str(" ?)");
            params.push(SqlValue::Int(*bytes));
        }

        Predicate::Modified { op, at } => {
            sql.push_str("i.modified_at ");
            sql.push_str(op.sql());
            sql.push_str(" ?");
            params.push(SqlValue::Int(at.timestamp()));
        }

        Predicate::Created { op, at } => {
            sql.push_str("i.created_at ");
            sql.push_str(op.sql());
            sql.push_str(" ?");
            params.push(SqlValue::Int(at.timestamp()));
        }

        Predicate::And(left, right) => {
            sql.push('(');
            emit(left, sql, params);
            sql.push_str(") AND (");
            emit(right, sql, params);
            sql.push(')');
        }

        Predicate::Or(left, right) => {
            sql.push('(');
            emit(left, sql, params);
            sql.push_str(") OR (");
            emit(right, sql, params);
            sql.push(')');
        }

        Predicate::Not(inner) => {
            sql.push_str("NOT (");
            emit(inner, sql, params);
            sql.push(')');
        }
    }
}

fn emit_text(column: &str, text_match: &TextMatch, sql: &mut String, params: &mut Vec<SqlValue>) {
    match text_match {
        TextMatch::Exact(text) => {
            sql.push_str(column);
            sql.push_str(" = ?");
            params.push(SqlValue::Text(text.clone()));
        }
        TextMatch::Pattern(pattern) => {
            sql.push_str(column);
            sql.push_str(" LIKE ? ESCAPE '\\'");
            params.push(SqlValue::Text(pattern.as_sql().to_string()));
        }
        TextMatch::AnyOf(values) => {
            if values.is_empty() {
                sql.push_str("FALSE");
                return;
            }
            sql.push_str(column);
            sql.push_str(" IN (");
            push_placeholders(sql, values.len());
            sql.push(')');
            params.extend(values.iter().map(|v| SqlValue::Text(v.clone())));
        }
    }
}

fn push_placeholders(sql: &mut String, count: usize) {
    for i in 0..count {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push('?');
    }
}
