//! Library layer for Assembly Insight: the entity-linked reconciliation and
//! analytics pipeline.
//!
//! Fetched roster rows, news, videos and bills are classified and merged
//! idempotently into a SQLite store. The snapshot exporter reads them back,
//! derives keyword and legislative analytics per member and writes JSON for
//! the dashboard.

pub mod classify;
pub mod db;
pub mod error;
pub mod keywords;
pub mod pacing;
pub mod paging;
pub mod pipeline;
pub mod reconcile;
pub mod seed;
pub mod settings;
pub mod snapshot;
pub mod sources;
pub mod stats;
pub mod store;
pub mod summary;
pub mod timeline;
pub mod trend;

pub use assembly_api;
pub use assembly_api::types;

pub use db::{Db, DbError};
pub use error::{FetchError, MalformedRecord};
pub use keywords::{KeywordExtractor, SimpleTokenizer, Tokenizer};
pub use pipeline::RunReport;
pub use settings::Settings;
pub use snapshot::{ExportReport, Exporter};
pub use store::{Store, StoreError};
