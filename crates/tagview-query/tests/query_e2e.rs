//! End-to-end equivalence tests for the two compiler backends.
//!
//! The in-memory backend is the reference semantics: for every query in the
//! grid, the item set produced by executing the compiled relational filter
//! against a seeded SQLite catalog must equal the set of items the in-memory
//! predicate accepts. This is what proves the EXISTS/NOT-EXISTS translation
//! composes correctly under arbitrary AND/OR/NOT nesting.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, TimeZone, Utc};
use tagview_model_rs::Item;
use tagview_query_rs::query::{
    MatchedItems, MemoryFilter, Predicate, QueryParser, SqlFilter, Validator, ValidatorOptions,
};
use tagview_query_rs::service::SearchService;
use tagview_query_rs::store::SqliteStore;

/// The fixed evaluation instant every date query resolves against.
fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
}

struct Fixture {
    store: SqliteStore,
    items: Vec<Item>,
    tags_of: HashMap<i64, HashSet<i64>>,
}

impl Fixture {
    /// Seeds a catalog with duplicate tag text across groups, a directory
    /// with NULL size, and enough shape variety to exercise every predicate
    /// kind.
    fn seed() -> Fixture {
        let store = SqliteStore::open_in_memory().unwrap();

        let events = store.insert_group("events").unwrap();
        let status = store.insert_group("status").unwrap();
        let projects = store.insert_group("projects").unwrap();

        let t_vacation = store.insert_tag(events, "vacation").unwrap();
        let t_2024_events = store.insert_tag(events, "2024").unwrap();
        let t_archived = store.insert_tag(status, "archived").unwrap();
        let t_2024_status = store.insert_tag(status, "2024").unwrap();
        let t_work = store.insert_tag(projects, "work").unwrap();
        let t_project = store.insert_tag(projects, "project").unwrap();

        let mut tags_of: HashMap<i64, HashSet<i64>> = HashMap::new();
        let mut tag = |item: i64, tags: &[i64]| {
            for &t in tags {
                store.tag_item(item, t).unwrap();
            }
            tags_of.insert(item, tags.iter().copied().collect());
        };

        let beach = store
            .insert_item(
                "/photos/beach.jpg",
                false,
                Some(2_000_000),
                ts(2024, 6, 1),
                ts(2024, 1, 10),
            )
            .unwrap();
        tag(beach, &[t_vacation, t_2024_events]);

        let mountain = store
            .insert_item(
                "/photos/mountain.jpeg",
                false,
                Some(5_000_000),
                ts(2024, 5, 20),
                ts(2024, 1, 10),
            )
            .unwrap();
        tag(mountain, &[t_vacation]);

        let photo = store
            .insert_item(
                "/photos/photo.jpg",
                false,
                Some(5_000_000),
                ts(2024, 6, 10),
                ts(2024, 2, 1),
            )
            .unwrap();
        tag(photo, &[t_2024_status]);

        let report = store
            .insert_item(
                "/docs/report.pdf",
                false,
                Some(20_000_000),
                ts(2024, 3, 15),
                ts(2023, 11, 5),
            )
            .unwrap();
        tag(report, &[t_work, t_archived]);

        let notes = store
            .insert_item(
                "/docs/notes.txt",
                false,
                Some(1_000),
                ts(2024, 6, 10),
                ts(2024, 6, 9),
            )
            .unwrap();
        tag(notes, &[t_work, t_project]);

        let archive_dir = store
            .insert_item("/archive", true, None, ts(2023, 12, 31), ts(2023, 1, 1))
            .unwrap();
        tag(archive_dir, &[t_archived]);

        let song = store
            .insert_item(
                "/music/song.mp3",
                false,
                Some(8_000_000),
                ts(2024, 4, 2),
                ts(2024, 4, 2),
            )
            .unwrap();
        tags_of.insert(song, HashSet::new());

        let everything = SqlFilter {
            where_clause: "TRUE".to_string(),
            params: vec![],
        };
        let items = store.items_matching(&everything).unwrap();
        assert_eq!(items.len(), 7);

        Fixture {
            store,
            items,
            tags_of,
        }
    }

    fn validate(&self, query: &str) -> Predicate {
        let snapshot = self.store.tag_snapshot().unwrap();
        let expr = QueryParser::parse(query)
            .unwrap_or_else(|e| panic!("failed to parse {query:?}: {e}"));
        let options = ValidatorOptions {
            now: fixed_now(),
            ..ValidatorOptions::default()
        };
        Validator::with_options(&snapshot, options)
            .validate(&expr)
            .unwrap_or_else(|e| panic!("failed to validate {query:?}: {e}"))
    }

    /// Runs the query through both backends and asserts the ordered results
    /// agree. Returns the matched paths for scenario assertions.
    fn run_both(&self, query: &str) -> Vec<String> {
        let predicate = self.validate(query);

        let filter = SqlFilter::compile(&predicate);
        let sql_matched = MatchedItems::assemble(self.store.items_matching(&filter).unwrap());

        let memory = MemoryFilter::new(&predicate);
        let mem_items: Vec<Item> = self
            .items
            .iter()
            .filter(|item| {
                let tags = self.tags_of.get(&item.id).cloned().unwrap_or_default();
                memory.matches(item, &tags)
            })
            .cloned()
            .collect();
        let mem_matched = MatchedItems::assemble(mem_items);

        assert_eq!(
            sql_matched, mem_matched,
            "backends disagree on {query:?}\n  sql: {:?}\n  mem: {:?}",
            paths(&sql_matched),
            paths(&mem_matched),
        );

        paths(&sql_matched)
    }
}

fn paths(matched: &MatchedItems) -> Vec<String> {
    matched.items.iter().map(|i| i.path.clone()).collect()
}

// ============================================================================
// Metamorphic Grid: relational backend == in-memory backend
// ============================================================================

#[test]
fn test_e2e_backends_agree_on_query_grid() {
    let fixture = Fixture::seed();

    let grid = [
        // Tag comparisons, including the duplicate "2024" text
        "tag = \"vacation\"",
        "tag = \"2024\"",
        "tag = \"events:2024\"",
        "tag = \"status:2024\"",
        "tag = \"VACATION\"",
        "tag != \"archived\"",
        "tag = \"nonexistent\"",
        "NOT tag = \"nonexistent\"",
        "tag ~ \"vac*\"",
        "tag ~ \"20??\"",
        "tag IN (\"work\", \"project\")",
        "tag IN (\"work\", \"nonexistent\")",
        // Name and path
        "name = \"notes.txt\"",
        "name != \"notes.txt\"",
        "name ~ \"*.jpg\"",
        "name ~ \"*.jp?g\"",
        "filename ~ \"photo*\"",
        "path ~ \"/photos/*\"",
        "path IN (\"/archive\", \"/docs/notes.txt\")",
        "contains(name, \"ot\")",
        "startsWith(name, \"photo\")",
        "endsWith(path, \".pdf\")",
        "contains(tag, \"202\")",
        // Size, including the NULL-size directory
        "size > 10MB",
        "size < 10MB",
        "size >= 5000000",
        "size <= 5000000",
        "size = 1KB",
        "size != 1KB",
        "NOT size > 0",
        // Dates
        "modified > \"2024-06-01\"",
        "modified >= \"2024-06-01T10:00:00Z\"",
        "modified < \"2024-01-01\"",
        "created > \"2024-01-01\"",
        "modified > -7d",
        "modified < -7d",
        "modified >= \"-4w\"",
        "modified < today",
        // Boolean structure, especially NOT/OR around tag EXISTS
        "tag = \"vacation\" AND tag = \"2024\"",
        "tag = \"vacation\" OR tag = \"work\"",
        "tag IN (\"work\", \"project\") AND NOT tag = \"archived\"",
        "NOT (tag = \"vacation\" OR tag = \"work\")",
        "NOT (tag = \"vacation\" AND size > 1MB)",
        "(tag = \"vacation\" OR tag = \"work\") AND size < 10MB",
        "size > 1MB AND (tag = \"2024\" OR NOT tag = \"archived\")",
        "NOT NOT tag = \"vacation\"",
        "NOT (NOT (tag = \"work\" OR size > 6MB))",
        "name ~ \"*.jpg\" OR NOT size > 4MB",
        "NOT tag = \"archived\" AND NOT name ~ \"*.txt\"",
    ];

    for query in grid {
        fixture.run_both(query);
    }
}

// ============================================================================
// Algebraic Properties
// ============================================================================

#[test]
fn test_e2e_double_negation_is_identity() {
    let fixture = Fixture::seed();
    let subexpressions = [
        "tag = \"vacation\"",
        "tag = \"nonexistent\"",
        "size > 5MB",
        "name ~ \"*.jpg\"",
        "tag = \"work\" AND size > 10MB",
        "tag = \"2024\" OR modified > -7d",
    ];

    for x in subexpressions {
        let plain = fixture.run_both(x);
        let doubled = fixture.run_both(&format!("NOT (NOT ({x}))"));
        assert_eq!(plain, doubled, "NOT NOT differs from identity for {x:?}");
    }
}

#[test]
fn test_e2e_and_distributes_over_or() {
    let fixture = Fixture::seed();
    let triples = [
        ("tag = \"vacation\"", "tag = \"2024\"", "size > 4MB"),
        ("size < 10MB", "tag = \"work\"", "tag = \"archived\""),
        ("name ~ \"*.jpg\"", "tag = \"nonexistent\"", "modified > -7d"),
    ];

    for (a, b, c) in triples {
        let factored = fixture.run_both(&format!("{a} AND ({b} OR {c})"));
        let expanded = fixture.run_both(&format!("({a} AND {b}) OR ({a} AND {c})"));
        assert_eq!(
            factored, expanded,
            "distributive law fails for ({a}, {b}, {c})"
        );
    }
}

// ============================================================================
// Specified Scenarios
// ============================================================================

#[test]
fn test_e2e_scenario_multi_tag_conjunction() {
    // Items tagged [vacation, 2024] and [vacation]; both tags required.
    let fixture = Fixture::seed();
    let matched = fixture.run_both("tag = \"vacation\" AND tag = \"2024\"");
    assert_eq!(matched, vec!["/photos/beach.jpg"]);
}

#[test]
fn test_e2e_scenario_size_excludes_directory() {
    // The 20MB file matches; the 5MB files and the NULL-size directory do not.
    let fixture = Fixture::seed();
    let matched = fixture.run_both("size > 10MB");
    assert_eq!(matched, vec!["/docs/report.pdf"]);
}

#[test]
fn test_e2e_scenario_in_with_negated_tag() {
    // work or project, minus archived.
    let fixture = Fixture::seed();
    let matched = fixture.run_both("tag IN (\"work\", \"project\") AND NOT tag = \"archived\"");
    assert_eq!(matched, vec!["/docs/notes.txt"]);
}

#[test]
fn test_e2e_scenario_glob_is_exact_not_substring() {
    // photo.jpg and beach.jpg match; photo.jpeg and notes.txt do not.
    let fixture = Fixture::seed();
    let matched = fixture.run_both("name ~ \"*.jpg\"");
    assert_eq!(matched, vec!["/photos/beach.jpg", "/photos/photo.jpg"]);
}

#[test]
fn test_e2e_scenario_unresolved_tag_is_empty_not_error() {
    let fixture = Fixture::seed();
    let matched = fixture.run_both("tag = \"nonexistent\"");
    assert!(matched.is_empty());
}

// ============================================================================
// Service Entry Point
// ============================================================================

#[test]
fn test_e2e_service_matches_direct_pipeline() {
    let fixture = Fixture::seed();
    let expected = fixture.run_both("tag = \"vacation\" OR size > 10MB");

    let service = SearchService::new(fixture.store);
    let matched = service
        .evaluate_at("tag = \"vacation\" OR size > 10MB", fixed_now())
        .unwrap();
    assert_eq!(paths(&matched), expected);
    assert_eq!(matched.total, expected.len());
}

#[tokio::test]
async fn test_e2e_service_async_with_timeout() {
    let fixture = Fixture::seed();
    let service = SearchService::new(fixture.store);

    let matched = service
        .evaluate_with_timeout("name ~ \"*.jpg\"", std::time::Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(
        paths(&matched),
        vec!["/photos/beach.jpg", "/photos/photo.jpg"]
    );
}
