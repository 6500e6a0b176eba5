//! # Store
//!
//! The seam between the query layer and the database. The service only sees
//! [`DataStore`]; [`PgStore`] runs statements on a PostgreSQL pool and
//! [`MemoryStore`] evaluates statement plans against in-memory tables.

mod errors;
mod memory;
mod postgres;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::catalog::ColumnInfo;
use crate::rest_api::builder::Statement;
use crate::rest_api::response::TableStats;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::{connect_options, PgStore};

/// One result row, keyed by column name in column order
pub type Row = Map<String, Value>;

/// Read access to a relational database
///
/// Each call holds a connection for the duration of one statement only.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Cheap round trip proving the database is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Table names of a schema, in any order
    async fn list_tables(&self, schema: &str) -> StoreResult<Vec<String>>;

    /// Columns of a table in physical order; empty for unknown tables
    async fn list_columns(&self, schema: &str, table: &str) -> StoreResult<Vec<ColumnInfo>>;

    /// Rows produced by a select or distinct statement
    async fn fetch_rows(&self, statement: &Statement) -> StoreResult<Vec<Row>>;

    /// Single integer produced by a count statement
    async fn fetch_count(&self, statement: &Statement) -> StoreResult<i64>;

    /// Aggregates produced by a stats statement
    async fn fetch_stats(&self, statement: &Statement) -> StoreResult<TableStats>;

    /// Release pooled resources; later calls fail
    async fn close(&self);
}
