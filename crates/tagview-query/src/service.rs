//! The search service: the single entry point the UI layer calls.
//!
//! `SearchService` wires the pipeline together: snapshot, lex, parse,
//! validate, compile, execute, assemble. Nothing runs against the catalog
//! until the query has fully validated, and execution failures are surfaced
//! verbatim, never retried.
//!
//! The host application has a single-threaded UI event loop, so the async
//! entry point dispatches the whole evaluation to a blocking worker task and
//! bounds it with a caller-supplied timeout.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};

use tagview_model_rs::{Item, TagSnapshot};

use crate::error::{ExecutionError, QueryError};
use crate::query::{MatchedItems, QueryParser, SqlFilter, Validator, ValidatorOptions};
use crate::store::{SqliteStore, StoreResult};

/// The storage surface the engine consumes. Both operations are read-only.
pub trait Catalog {
    /// Captures the current tag dataset for validator resolution.
    fn tag_snapshot(&self) -> StoreResult<TagSnapshot>;

    /// Executes a compiled filter, returning the matching items unordered.
    fn items_matching(&self, filter: &SqlFilter) -> StoreResult<Vec<Item>>;
}

impl Catalog for SqliteStore {
    fn tag_snapshot(&self) -> StoreResult<TagSnapshot> {
        SqliteStore::tag_snapshot(self)
    }

    fn items_matching(&self, filter: &SqlFilter) -> StoreResult<Vec<Item>> {
        SqliteStore::items_matching(self, filter)
    }
}

/// Evaluates query strings against a catalog.
///
/// The catalog is held behind a mutex so the service can be cloned into a
/// blocking worker task; SQLite connections are not shareable across threads
/// without one (see the concurrency note on [`SqliteStore`]).
///
/// # Example
///
/// ```
/// use tagview_query_rs::service::SearchService;
/// use tagview_query_rs::store::SqliteStore;
///
/// let store = SqliteStore::open_in_memory().unwrap();
/// let service = SearchService::new(store);
/// let matched = service.evaluate("name ~ \"*.jpg\"").unwrap();
/// assert_eq!(matched.total, 0);
/// ```
pub struct SearchService<C> {
    catalog: Arc<Mutex<C>>,
    options: ValidatorOptions,
}

impl<C> Clone for SearchService<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            options: self.options.clone(),
        }
    }
}

impl<C: Catalog> SearchService<C> {
    /// Creates a service with default validator options.
    pub fn new(catalog: C) -> Self {
        Self::with_options(catalog, ValidatorOptions::default())
    }

    /// Creates a service with explicit validator options.
    ///
    /// `options.now` is ignored; every evaluation pins its own instant.
    pub fn with_options(catalog: C, options: ValidatorOptions) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(catalog)),
            options,
        }
    }

    /// Evaluates a query against the current catalog state.
    ///
    /// # Errors
    ///
    /// Lex, parse, and validation errors are returned before anything runs
    /// against the catalog. Storage failures surface as
    /// [`ExecutionError::Store`].
    pub fn evaluate(&self, query: &str) -> Result<MatchedItems, QueryError> {
        self.evaluate_at(query, Utc::now())
    }

    /// Evaluates a query with an explicit "now" for relative date values.
    pub fn evaluate_at(&self, query: &str, now: DateTime<Utc>) -> Result<MatchedItems, QueryError> {
        let expr = QueryParser::parse(query)?;

        let catalog = self.lock_catalog();
        let snapshot = catalog.tag_snapshot().map_err(ExecutionError::Store)?;

        let options = ValidatorOptions {
            now,
            ..self.options.clone()
        };
        let predicate = Validator::with_options(&snapshot, options).validate(&expr)?;
        let filter = SqlFilter::compile(&predicate);

        let items = catalog
            .items_matching(&filter)
            .map_err(ExecutionError::Store)?;
        Ok(MatchedItems::assemble(items))
    }

    fn lock_catalog(&self) -> MutexGuard<'_, C> {
        // A poisoned lock only means another evaluation panicked; the catalog
        // itself is read-only here.
        match self.catalog.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<C: Catalog + Send + 'static> SearchService<C> {
    /// Evaluates a query on a blocking worker task, bounded by `limit`.
    ///
    /// Intended for interactive callers: a pathological query cannot stall
    /// the UI event loop. When the limit elapses the result is abandoned and
    /// [`ExecutionError::Timeout`] is returned; the query is read-only, so
    /// nothing needs rolling back and nothing is retried.
    pub async fn evaluate_with_timeout(
        &self,
        query: &str,
        limit: Duration,
    ) -> Result<MatchedItems, QueryError> {
        let service = self.clone();
        let query = query.to_string();
        let now = Utc::now();

        let task = tokio::task::spawn_blocking(move || service.evaluate_at(&query, now));
        match tokio::time::timeout(limit, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => match join_error.try_into_panic() {
                Ok(payload) => std::panic::resume_unwind(payload),
                Err(_cancelled) => Err(QueryError::Execution(ExecutionError::Cancelled)),
            },
            Err(_elapsed) => Err(QueryError::Execution(ExecutionError::Timeout { limit })),
        }
    }
}
