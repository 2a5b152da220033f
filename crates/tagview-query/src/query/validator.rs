//! Semantic validation: AST to compiler-ready predicate tree.
//!
//! The validator walks the parsed [`Expr`] once and produces a [`Predicate`]:
//! field names are resolved against the closed field set, the
//! field/comparator/value compatibility table is enforced, tag references are
//! resolved to id sets against the [`TagSnapshot`], function calls are
//! expanded into pattern tests, `!=` is normalized to `NOT (=)`, and relative
//! date values are pinned to the evaluation instant. Nothing past this point
//! can fail a type check.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use strsim::levenshtein;
use tagview_model_rs::TagSnapshot;

use super::ast::{Comparator, Expr, Value};
use super::error::{ValidationError, ValidationResult};
use super::predicate::{CmpOp, LikePattern, Predicate, TextMatch};

/// Maximum Levenshtein distance to consider a field name as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Every accepted field spelling, for "did you mean" suggestions.
const FIELD_NAMES: [&str; 7] = [
    "tag", "name", "filename", "size", "modified", "created", "path",
];

/// The closed set of queryable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Tag membership.
    Tag,
    /// File name (final path component). Alias: `filename`.
    Name,
    /// Size in bytes.
    Size,
    /// Modification time.
    Modified,
    /// Creation time.
    Created,
    /// Full path.
    Path,
}

impl Field {
    /// Resolves a field name, case-insensitively.
    pub fn resolve(name: &str) -> Option<Field> {
        match name.to_ascii_lowercase().as_str() {
            "tag" => Some(Field::Tag),
            "name" | "filename" => Some(Field::Name),
            "size" => Some(Field::Size),
            "modified" => Some(Field::Modified),
            "created" => Some(Field::Created),
            "path" => Some(Field::Path),
            _ => None,
        }
    }

    /// Canonical name, for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Tag => "tag",
            Field::Name => "name",
            Field::Size => "size",
            Field::Modified => "modified",
            Field::Created => "created",
            Field::Path => "path",
        }
    }
}

/// A tag reference resolved against the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTagRef {
    /// The matched tag's id.
    pub tag_id: i64,
    /// The group the matched tag belongs to.
    pub group_id: i64,
}

/// Tunable validation behavior.
#[derive(Debug, Clone)]
pub struct ValidatorOptions {
    /// Maximum AST node count before the query is rejected.
    pub max_nodes: usize,
    /// Maximum number of values in one `IN` list.
    pub max_in_list: usize,
    /// When set, a tag reference that resolves to nothing is an error
    /// instead of an empty match.
    pub strict_tags: bool,
    /// The instant relative date values resolve against.
    pub now: DateTime<Utc>,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            max_nodes: 500,
            max_in_list: 256,
            strict_tags: false,
            now: Utc::now(),
        }
    }
}

/// Validates parsed queries against a tag snapshot.
///
/// # Example
///
/// ```
/// use tagview_model_rs::TagSnapshot;
/// use tagview_query_rs::query::{QueryParser, Validator};
///
/// let snapshot = TagSnapshot::default();
/// let expr = QueryParser::parse("size > 10MB").unwrap();
/// let predicate = Validator::new(&snapshot).validate(&expr).unwrap();
/// # let _ = predicate;
/// ```
pub struct Validator<'a> {
    snapshot: &'a TagSnapshot,
    options: ValidatorOptions,
}

impl<'a> Validator<'a> {
    /// Creates a validator with default options.
    pub fn new(snapshot: &'a TagSnapshot) -> Self {
        Self::with_options(snapshot, ValidatorOptions::default())
    }

    /// Creates a validator with explicit options.
    pub fn with_options(snapshot: &'a TagSnapshot, options: ValidatorOptions) -> Self {
        Self { snapshot, options }
    }

    /// Validates an AST, producing the compiler-ready predicate tree.
    pub fn validate(&self, expr: &Expr) -> ValidationResult<Predicate> {
        let nodes = expr.node_count();
        if nodes > self.options.max_nodes {
            return Err(ValidationError::QueryTooComplex {
                reason: format!(
                    "{} nodes, the limit is {}",
                    nodes, self.options.max_nodes
                ),
            });
        }

        self.validate_expr(expr)
    }

    fn validate_expr(&self, expr: &Expr) -> ValidationResult<Predicate> {
        match expr {
            Expr::And(l, r) => Ok(Predicate::and(
                self.validate_expr(l)?,
                self.validate_expr(r)?,
            )),
            Expr::Or(l, r) => Ok(Predicate::or(
                self.validate_expr(l)?,
                self.validate_expr(r)?,
            )),
            Expr::Not(inner) => Ok(Predicate::negate(self.validate_expr(inner)?)),
            Expr::Comparison { field, op, value } => self.validate_comparison(field, *op, value),
            Expr::Call { name, field, value } => self.validate_call(name, field, value),
        }
    }

    fn resolve_field(&self, name: &str) -> ValidationResult<Field> {
        Field::resolve(name).ok_or_else(|| ValidationError::UnknownField {
            name: name.to_string(),
            suggestion: find_similar_field(name),
        })
    }

    fn validate_comparison(
        &self,
        field: &str,
        op: Comparator,
        value: &Value,
    ) -> ValidationResult<Predicate> {
        let field = self.resolve_field(field)?;
        match field {
            Field::Tag => self.validate_tag_comparison(op, value),
            Field::Name | Field::Path => self.validate_text_comparison(field, op, value),
            Field::Size => self.validate_size_comparison(op, value),
            Field::Modified | Field::Created => self.validate_date_comparison(field, op, value),
        }
    }

    // ==================== Tag ====================

    fn validate_tag_comparison(&self, op: Comparator, value: &Value) -> ValidationResult<Predicate> {
        match op {
            Comparator::Eq | Comparator::NotEq => {
                let text = expect_str(Field::Tag, value)?;
                let ids = self.resolve_tag_ids(text)?;
                let predicate = Predicate::TagAny { tag_ids: ids };
                if op == Comparator::NotEq {
                    Ok(Predicate::negate(predicate))
                } else {
                    Ok(predicate)
                }
            }
            Comparator::Like => {
                let text = expect_str(Field::Tag, value)?;
                let ids = self.resolve_tag_ids_by_pattern(text)?;
                Ok(Predicate::TagAny { tag_ids: ids })
            }
            Comparator::In => {
                let values = self.expect_in_list(Field::Tag, value)?;
                let mut refs = Vec::new();
                for element in values {
                    let text = expect_str(Field::Tag, element)?;
                    refs.extend(self.resolve_tag_refs(text)?);
                }
                Ok(Predicate::TagAny {
                    tag_ids: collect_ids(refs),
                })
            }
            _ => Err(ValidationError::IncompatibleComparator {
                field: "tag",
                op,
            }),
        }
    }

    /// Resolves tag text to the set of matching tag ids.
    ///
    /// The match is case-insensitive and exact. A `group:value` spelling
    /// restricts the lookup to that group when the group exists; otherwise
    /// the whole text is looked up as a tag value, so tags containing `:`
    /// stay reachable.
    fn resolve_tag_refs(&self, text: &str) -> ValidationResult<Vec<ResolvedTagRef>> {
        if let Some((group_name, tag_text)) = text.split_once(':') {
            if let Some(group) = self.snapshot.find_group_by_name(group_name) {
                let refs = to_refs(self.snapshot.tags_matching(tag_text, Some(group.id)));
                return self.check_resolution(text, refs);
            }
        }

        let refs = to_refs(self.snapshot.tags_matching(text, None));
        self.check_resolution(text, refs)
    }

    fn resolve_tag_ids(&self, text: &str) -> ValidationResult<Vec<i64>> {
        Ok(collect_ids(self.resolve_tag_refs(text)?))
    }

    /// Resolves a glob pattern against tag text.
    fn resolve_tag_ids_by_pattern(&self, glob: &str) -> ValidationResult<Vec<i64>> {
        let pattern = LikePattern::from_glob(glob);
        let refs = self.refs_matching_pattern(&pattern);
        Ok(collect_ids(self.check_resolution(glob, refs)?))
    }

    fn refs_matching_pattern(&self, pattern: &LikePattern) -> Vec<ResolvedTagRef> {
        to_refs(
            self.snapshot
                .tags
                .iter()
                .filter(|t| pattern.matches(&t.value))
                .collect(),
        )
    }

    /// Applies the unresolved-tag policy: empty match by default, hard error
    /// under `strict_tags`.
    fn check_resolution(
        &self,
        text: &str,
        refs: Vec<ResolvedTagRef>,
    ) -> ValidationResult<Vec<ResolvedTagRef>> {
        if refs.is_empty() && self.options.strict_tags {
            return Err(ValidationError::UnknownTag {
                value: text.to_string(),
            });
        }
        Ok(refs)
    }

    // ==================== Name / Path ====================

    fn validate_text_comparison(
        &self,
        field: Field,
        op: Comparator,
        value: &Value,
    ) -> ValidationResult<Predicate> {
        let text_match = match op {
            Comparator::Eq | Comparator::NotEq => {
                TextMatch::Exact(expect_str(field, value)?.to_string())
            }
            Comparator::Like => TextMatch::Pattern(LikePattern::from_glob(expect_str(field, value)?)),
            Comparator::In => {
                let values = self.expect_in_list(field, value)?;
                let mut list = Vec::with_capacity(values.len());
                for element in values {
                    list.push(expect_str(field, element)?.to_string());
                }
                TextMatch::AnyOf(list)
            }
            _ => {
                return Err(ValidationError::IncompatibleComparator {
                    field: field.name(),
                    op,
                })
            }
        };

        let predicate = text_predicate(field, text_match);
        if op == Comparator::NotEq {
            Ok(Predicate::negate(predicate))
        } else {
            Ok(predicate)
        }
    }

    // ==================== Size ====================

    fn validate_size_comparison(
        &self,
        op: Comparator,
        value: &Value,
    ) -> ValidationResult<Predicate> {
        let (op, negated) = ordered_op(Field::Size, op)?;
        let bytes = match value {
            Value::Number(n) => *n as i64,
            other => {
                return Err(ValidationError::InvalidValueType {
                    field: "size",
                    expected: "number",
                    found: other.type_name(),
                })
            }
        };

        Ok(maybe_negate(Predicate::Size { op, bytes }, negated))
    }

    // ==================== Modified / Created ====================

    fn validate_date_comparison(
        &self,
        field: Field,
        op: Comparator,
        value: &Value,
    ) -> ValidationResult<Predicate> {
        let (op, negated) = ordered_op(field, op)?;
        let text = match value {
            Value::Str(s) => s,
            other => {
                return Err(ValidationError::InvalidValueType {
                    field: field.name(),
                    expected: "date",
                    found: other.type_name(),
                })
            }
        };
        let at = parse_date_value(text, self.options.now)?;

        let predicate = match field {
            Field::Modified => Predicate::Modified { op, at },
            _ => Predicate::Created { op, at },
        };
        Ok(maybe_negate(predicate, negated))
    }

    // ==================== Function calls ====================

    /// Expands `contains`/`startsWith`/`endsWith` into the equivalent
    /// pattern test, so the compilers never see function calls.
    fn validate_call(&self, name: &str, field: &str, value: &Value) -> ValidationResult<Predicate> {
        let literal = match value {
            Value::Str(s) => s.as_str(),
            other => {
                return Err(ValidationError::InvalidValueType {
                    field: "function argument",
                    expected: "string",
                    found: other.type_name(),
                })
            }
        };

        let pattern = match name.to_ascii_lowercase().as_str() {
            "contains" => LikePattern::contains(literal),
            "startswith" => LikePattern::starts_with(literal),
            "endswith" => LikePattern::ends_with(literal),
            _ => {
                return Err(ValidationError::UnknownFunction {
                    name: name.to_string(),
                })
            }
        };

        let field = self.resolve_field(field)?;
        match field {
            Field::Name | Field::Path => Ok(text_predicate(field, TextMatch::Pattern(pattern))),
            Field::Tag => {
                let refs = self.refs_matching_pattern(&pattern);
                Ok(Predicate::TagAny {
                    tag_ids: collect_ids(self.check_resolution(literal, refs)?),
                })
            }
            _ => Err(ValidationError::IncompatibleComparator {
                field: field.name(),
                op: Comparator::Like,
            }),
        }
    }

    // ==================== Helpers ====================

    fn expect_in_list<'v>(
        &self,
        field: Field,
        value: &'v Value,
    ) -> ValidationResult<&'v [Value]> {
        match value {
            Value::List(values) => {
                if values.len() > self.options.max_in_list {
                    return Err(ValidationError::QueryTooComplex {
                        reason: format!(
                            "IN list has {} values, the limit is {}",
                            values.len(),
                            self.options.max_in_list
                        ),
                    });
                }
                Ok(values)
            }
            other => Err(ValidationError::InvalidValueType {
                field: field.name(),
                expected: "list",
                found: other.type_name(),
            }),
        }
    }
}

/// Maps a comparator onto the ordered set, rejecting `~` and `IN`.
///
/// `!=` normalizes to `=` plus a negation flag, so negation semantics live
/// in exactly one place.
fn ordered_op(field: Field, op: Comparator) -> ValidationResult<(CmpOp, bool)> {
    let mapped = match op {
        Comparator::Eq => (CmpOp::Eq, false),
        Comparator::NotEq => (CmpOp::Eq, true),
        Comparator::Gt => (CmpOp::Gt, false),
        Comparator::Lt => (CmpOp::Lt, false),
        Comparator::Gte => (CmpOp::Gte, false),
        Comparator::Lte => (CmpOp::Lte, false),
        Comparator::Like | Comparator::In => {
            return Err(ValidationError::IncompatibleComparator {
                field: field.name(),
                op,
            })
        }
    };
    Ok(mapped)
}

/// Wraps the predicate in `NOT` when the comparator was `!=`.
fn maybe_negate(predicate: Predicate, negated: bool) -> Predicate {
    if negated {
        Predicate::negate(predicate)
    } else {
        predicate
    }
}

fn text_predicate(field: Field, text_match: TextMatch) -> Predicate {
    match field {
        Field::Path => Predicate::Path(text_match),
        _ => Predicate::Name(text_match),
    }
}

fn expect_str(field: Field, value: &Value) -> ValidationResult<&str> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(ValidationError::InvalidValueType {
            field: field.name(),
            expected: "string",
            found: other.type_name(),
        }),
    }
}

fn to_refs(tags: Vec<&tagview_model_rs::Tag>) -> Vec<ResolvedTagRef> {
    tags.into_iter()
        .map(|t| ResolvedTagRef {
            tag_id: t.id,
            group_id: t.group_id,
        })
        .collect()
}

/// Sorted, deduplicated tag ids for stable compiled output.
fn collect_ids(refs: Vec<ResolvedTagRef>) -> Vec<i64> {
    let mut ids: Vec<i64> = refs.into_iter().map(|r| r.tag_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Finds the closest known field name within the suggestion threshold.
fn find_similar_field(name: &str) -> Option<String> {
    let name_lower = name.to_lowercase();
    let (best, distance) = FIELD_NAMES
        .iter()
        .map(|candidate| (candidate, levenshtein(&name_lower, candidate)))
        .min_by_key(|(_, d)| *d)?;

    if distance > 0 && distance <= MAX_SUGGESTION_DISTANCE {
        Some(best.to_string())
    } else {
        None
    }
}

/// Parses a date value: ISO-8601, `today`, or a relative shorthand.
///
/// Date-only values mean midnight UTC of that day. Relative shorthands
/// (`-7d`, `3w`) are offsets from `now` in days or weeks.
fn parse_date_value(text: &str, now: DateTime<Utc>) -> ValidationResult<DateTime<Utc>> {
    if text.eq_ignore_ascii_case("today") {
        let midnight = now.date_naive().and_time(NaiveTime::MIN);
        return Ok(Utc.from_utc_datetime(&midnight));
    }

    if let Some(at) = parse_relative(text, now) {
        return Ok(at);
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }

    Err(ValidationError::MalformedDate {
        value: text.to_string(),
    })
}

/// Parses `-7d` / `3w` style offsets.
fn parse_relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let (count_text, unit) = text.split_at(text.len().checked_sub(1)?);
    let count: i64 = count_text.parse().ok()?;
    match unit {
        "d" | "D" => Some(now + Duration::days(count)),
        "w" | "W" => Some(now + Duration::weeks(count)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagview_model_rs::{Tag, TagGroup};

    fn fixture_snapshot() -> TagSnapshot {
        TagSnapshot::new(
            vec![
                Tag {
                    id: 10,
                    group_id: 1,
                    value: "vacation".to_string(),
                },
                Tag {
                    id: 11,
                    group_id: 1,
                    value: "2024".to_string(),
                },
                Tag {
                    id: 12,
                    group_id: 2,
                    value: "2024".to_string(),
                },
                Tag {
                    id: 13,
                    group_id: 2,
                    value: "work".to_string(),
                },
            ],
            vec![
                TagGroup {
                    id: 1,
                    name: "events".to_string(),
                },
                TagGroup {
                    id: 2,
                    name: "archive".to_string(),
                },
            ],
        )
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn validate(query: &str) -> ValidationResult<Predicate> {
        let snapshot = fixture_snapshot();
        let expr = super::super::parser::QueryParser::parse(query).unwrap();
        let options = ValidatorOptions {
            now: fixed_now(),
            ..ValidatorOptions::default()
        };
        Validator::with_options(&snapshot, options).validate(&expr)
    }

    #[test]
    fn test_tag_eq_resolves_single_group() {
        let p = validate("tag = \"vacation\"").unwrap();
        assert_eq!(p, Predicate::TagAny { tag_ids: vec![10] });
    }

    #[test]
    fn test_tag_eq_duplicate_text_unions_groups() {
        let p = validate("tag = \"2024\"").unwrap();
        assert_eq!(p, Predicate::TagAny { tag_ids: vec![11, 12] });
    }

    #[test]
    fn test_tag_eq_is_case_insensitive() {
        let p = validate("tag = \"VACATION\"").unwrap();
        assert_eq!(p, Predicate::TagAny { tag_ids: vec![10] });
    }

    #[test]
    fn test_tag_group_qualifier_restricts_lookup() {
        let p = validate("tag = \"events:2024\"").unwrap();
        assert_eq!(p, Predicate::TagAny { tag_ids: vec![11] });
    }

    #[test]
    fn test_tag_unknown_group_falls_back_to_full_text() {
        // No group called `missing`; the whole text is looked up as a tag
        // value and resolves to nothing.
        let p = validate("tag = \"missing:2024\"").unwrap();
        assert_eq!(p, Predicate::TagAny { tag_ids: vec![] });
    }

    #[test]
    fn test_tag_unresolved_is_empty_set_by_default() {
        let p = validate("tag = \"nonexistent\"").unwrap();
        assert_eq!(p, Predicate::TagAny { tag_ids: vec![] });
    }

    #[test]
    fn test_tag_unresolved_errors_under_strict_mode() {
        let snapshot = fixture_snapshot();
        let expr = super::super::parser::QueryParser::parse("tag = \"nonexistent\"").unwrap();
        let options = ValidatorOptions {
            strict_tags: true,
            now: fixed_now(),
            ..ValidatorOptions::default()
        };
        let err = Validator::with_options(&snapshot, options)
            .validate(&expr)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownTag {
                value: "nonexistent".to_string()
            }
        );
    }

    #[test]
    fn test_tag_not_eq_wraps_in_not() {
        let p = validate("tag != \"vacation\"").unwrap();
        assert_eq!(
            p,
            Predicate::negate(Predicate::TagAny { tag_ids: vec![10] })
        );
    }

    #[test]
    fn test_tag_in_unions_all_elements() {
        let p = validate("tag IN (\"work\", \"vacation\")").unwrap();
        assert_eq!(p, Predicate::TagAny { tag_ids: vec![10, 13] });
    }

    #[test]
    fn test_tag_like_resolves_pattern() {
        let p = validate("tag ~ \"20*\"").unwrap();
        assert_eq!(p, Predicate::TagAny { tag_ids: vec![11, 12] });
    }

    #[test]
    fn test_tag_ordered_comparator_rejected() {
        let err = validate("tag > \"a\"").unwrap_err();
        assert_eq!(
            err,
            ValidationError::IncompatibleComparator {
                field: "tag",
                op: Comparator::Gt,
            }
        );
    }

    #[test]
    fn test_size_accepts_ordered_comparators() {
        let p = validate("size > 10MB").unwrap();
        assert_eq!(
            p,
            Predicate::Size {
                op: CmpOp::Gt,
                bytes: 10485760,
            }
        );
    }

    #[test]
    fn test_size_not_eq_normalizes_to_not() {
        let p = validate("size != 100").unwrap();
        assert_eq!(
            p,
            Predicate::negate(Predicate::Size {
                op: CmpOp::Eq,
                bytes: 100,
            })
        );
    }

    #[test]
    fn test_size_rejects_like_and_in() {
        assert_eq!(
            validate("size ~ \"10\"").unwrap_err(),
            ValidationError::IncompatibleComparator {
                field: "size",
                op: Comparator::Like,
            }
        );
        assert_eq!(
            validate("size IN (1, 2)").unwrap_err(),
            ValidationError::IncompatibleComparator {
                field: "size",
                op: Comparator::In,
            }
        );
    }

    #[test]
    fn test_size_rejects_string_value() {
        assert_eq!(
            validate("size > \"big\"").unwrap_err(),
            ValidationError::InvalidValueType {
                field: "size",
                expected: "number",
                found: "string",
            }
        );
    }

    #[test]
    fn test_date_iso_date_is_utc_midnight() {
        let p = validate("modified > \"2024-01-15\"").unwrap();
        assert_eq!(
            p,
            Predicate::Modified {
                op: CmpOp::Gt,
                at: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            }
        );
    }

    #[test]
    fn test_date_rfc3339_value() {
        let p = validate("created <= \"2024-01-15T10:30:00Z\"").unwrap();
        assert_eq!(
            p,
            Predicate::Created {
                op: CmpOp::Lte,
                at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            }
        );
    }

    #[test]
    fn test_date_today_is_start_of_day() {
        let p = validate("modified >= today").unwrap();
        assert_eq!(
            p,
            Predicate::Modified {
                op: CmpOp::Gte,
                at: Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap(),
            }
        );
    }

    #[test]
    fn test_date_relative_days() {
        let p = validate("modified > -7d").unwrap();
        assert_eq!(
            p,
            Predicate::Modified {
                op: CmpOp::Gt,
                at: fixed_now() - Duration::days(7),
            }
        );
    }

    #[test]
    fn test_date_relative_weeks() {
        let p = validate("created < \"-2w\"").unwrap();
        assert_eq!(
            p,
            Predicate::Created {
                op: CmpOp::Lt,
                at: fixed_now() - Duration::weeks(2),
            }
        );
    }

    #[test]
    fn test_date_malformed() {
        assert_eq!(
            validate("modified > \"last tuesday\"").unwrap_err(),
            ValidationError::MalformedDate {
                value: "last tuesday".to_string()
            }
        );
    }

    #[test]
    fn test_date_rejects_number_value() {
        assert_eq!(
            validate("modified > 5").unwrap_err(),
            ValidationError::InvalidValueType {
                field: "modified",
                expected: "date",
                found: "number",
            }
        );
    }

    #[test]
    fn test_name_glob_translates_to_pattern() {
        let p = validate("name ~ \"*.jpg\"").unwrap();
        assert_eq!(
            p,
            Predicate::Name(TextMatch::Pattern(LikePattern::from_glob("*.jpg")))
        );
    }

    #[test]
    fn test_filename_alias_resolves_to_name() {
        let p = validate("filename = \"notes.txt\"").unwrap();
        assert_eq!(
            p,
            Predicate::Name(TextMatch::Exact("notes.txt".to_string()))
        );
    }

    #[test]
    fn test_path_in_list() {
        let p = validate("path IN (\"/a\", \"/b\")").unwrap();
        assert_eq!(
            p,
            Predicate::Path(TextMatch::AnyOf(vec![
                "/a".to_string(),
                "/b".to_string()
            ]))
        );
    }

    #[test]
    fn test_name_rejects_ordered_comparator() {
        assert_eq!(
            validate("name > \"a\"").unwrap_err(),
            ValidationError::IncompatibleComparator {
                field: "name",
                op: Comparator::Gt,
            }
        );
    }

    #[test]
    fn test_unknown_field_suggests_similar() {
        assert_eq!(
            validate("sise > 10").unwrap_err(),
            ValidationError::UnknownField {
                name: "sise".to_string(),
                suggestion: Some("size".to_string()),
            }
        );
    }

    #[test]
    fn test_unknown_field_without_suggestion() {
        assert_eq!(
            validate("flavor = \"x\"").unwrap_err(),
            ValidationError::UnknownField {
                name: "flavor".to_string(),
                suggestion: None,
            }
        );
    }

    #[test]
    fn test_field_names_case_insensitive() {
        assert!(validate("SIZE > 10").is_ok());
        assert!(validate("Tag = \"vacation\"").is_ok());
    }

    #[test]
    fn test_contains_expands_to_pattern() {
        let p = validate("contains(name, \"draft\")").unwrap();
        assert_eq!(
            p,
            Predicate::Name(TextMatch::Pattern(LikePattern::contains("draft")))
        );
    }

    #[test]
    fn test_starts_with_and_ends_with_expand() {
        assert_eq!(
            validate("startsWith(name, \"IMG_\")").unwrap(),
            Predicate::Name(TextMatch::Pattern(LikePattern::starts_with("IMG_")))
        );
        assert_eq!(
            validate("endsWith(path, \".bak\")").unwrap(),
            Predicate::Path(TextMatch::Pattern(LikePattern::ends_with(".bak")))
        );
    }

    #[test]
    fn test_contains_on_tag_resolves_ids() {
        let p = validate("contains(tag, \"02\")").unwrap();
        assert_eq!(p, Predicate::TagAny { tag_ids: vec![11, 12] });
    }

    #[test]
    fn test_contains_literal_wildcards_are_not_special() {
        // `*` inside a function argument is a literal character.
        let p = validate("contains(name, \"*\")").unwrap();
        match p {
            Predicate::Name(TextMatch::Pattern(pattern)) => {
                assert!(pattern.matches("a*b"));
                assert!(!pattern.matches("ab"));
            }
            other => panic!("expected name pattern, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(
            validate("matches(name, \"x\")").unwrap_err(),
            ValidationError::UnknownFunction {
                name: "matches".to_string()
            }
        );
    }

    #[test]
    fn test_function_on_size_rejected() {
        assert_eq!(
            validate("contains(size, \"1\")").unwrap_err(),
            ValidationError::IncompatibleComparator {
                field: "size",
                op: Comparator::Like,
            }
        );
    }

    #[test]
    fn test_boolean_structure_preserved() {
        let p = validate("tag = \"vacation\" AND NOT size > 100").unwrap();
        assert_eq!(
            p,
            Predicate::and(
                Predicate::TagAny { tag_ids: vec![10] },
                Predicate::negate(Predicate::Size {
                    op: CmpOp::Gt,
                    bytes: 100,
                })
            )
        );
    }

    #[test]
    fn test_node_limit_enforced() {
        let snapshot = fixture_snapshot();
        let expr = super::super::parser::QueryParser::parse(
            "tag = \"a\" AND tag = \"b\" AND tag = \"c\"",
        )
        .unwrap();
        let options = ValidatorOptions {
            max_nodes: 3,
            now: fixed_now(),
            ..ValidatorOptions::default()
        };
        let err = Validator::with_options(&snapshot, options)
            .validate(&expr)
            .unwrap_err();
        assert!(matches!(err, ValidationError::QueryTooComplex { .. }));
    }

    #[test]
    fn test_in_list_limit_enforced() {
        let snapshot = fixture_snapshot();
        let expr =
            super::super::parser::QueryParser::parse("tag IN (\"a\", \"b\", \"c\")").unwrap();
        let options = ValidatorOptions {
            max_in_list: 2,
            now: fixed_now(),
            ..ValidatorOptions::default()
        };
        let err = Validator::with_options(&snapshot, options)
            .validate(&expr)
            .unwrap_err();
        assert!(matches!(err, ValidationError::QueryTooComplex { .. }));
    }
}
