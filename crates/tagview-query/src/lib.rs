//! Query engine and catalog store for tagview.
//!
//! This crate implements the search subsystem of the tagview file browser:
//! a JQL-style filter language that is lexed, parsed, validated against the
//! tag dataset, and compiled into an executable filter over the catalog.
//!
//! # Quick Start
//!
//! ```
//! use tagview_query_rs::service::SearchService;
//! use tagview_query_rs::store::SqliteStore;
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! let service = SearchService::new(store);
//!
//! match service.evaluate("tag = \"vacation\" AND size > 10MB") {
//!     Ok(matched) => println!("{} items", matched.total),
//!     Err(err) => eprintln!("{}", err.diagnostic("tag = \"vacation\" AND size > 10MB").snippet),
//! }
//! ```
//!
//! The pipeline stages are individually available under [`query`] for
//! callers that need more control than [`service::SearchService`] offers.

pub mod error;
pub mod query;
pub mod service;
pub mod store;

pub use error::{Diagnostic, ExecutionError, QueryError};
pub use query::MatchedItems;
pub use service::{Catalog, SearchService};
pub use store::{SqliteStore, StoreError};
