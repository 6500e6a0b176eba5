//! # Data Handler
//!
//! Executes validated statements through a [`DataStore`] and shapes the
//! results into response bodies.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::catalog::{CatalogReader, ColumnInfo, TableInfo};
use crate::config::QueryConfig;
use crate::store::DataStore;

use super::builder::{distinct_statement, stats_statement, QuerySpec};
use super::errors::{RestError, RestResult};
use super::filter::FilterColumns;
use super::parser::DataParams;
use super::response::{ResultEnvelope, TableStats};

/// Request-level operations of the service.
///
/// Every operation runs under the configured request timeout. When it
/// expires the in-flight statement futures are dropped together, which
/// hands their connections back to the pool.
pub struct DataHandler<S: DataStore> {
    store: Arc<S>,
    catalog: CatalogReader<S>,
    columns: FilterColumns,
    max_limit: i64,
    timeout: Duration,
}

impl<S: DataStore> DataHandler<S> {
    pub fn new(store: Arc<S>, schema: impl Into<String>, config: &QueryConfig) -> Self {
        Self {
            catalog: CatalogReader::new(store.clone(), schema),
            store,
            columns: FilterColumns::from(config),
            max_limit: config.max_limit,
            timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }

    async fn with_timeout<T, F>(&self, operation: F) -> RestResult<T>
    where
        F: Future<Output = RestResult<T>>,
    {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(RestError::Timeout(self.timeout.as_millis() as u64)),
        }
    }

    /// `GET /api/tables`
    pub async fn list_tables(&self) -> RestResult<Vec<TableInfo>> {
        self.with_timeout(self.catalog.list_tables()).await
    }

    /// `GET /api/tables/:table_name/columns`
    pub async fn list_columns(&self, table: &str) -> RestResult<Vec<ColumnInfo>> {
        self.with_timeout(self.catalog.list_columns(table)).await
    }

    /// `GET /api/data/:table_name`
    ///
    /// The data and count statements run concurrently on separate pooled
    /// connections and are not wrapped in a transaction, so under concurrent
    /// writes `total` and `data` may describe slightly different snapshots.
    pub async fn fetch_page(
        &self,
        table: &str,
        query: &HashMap<String, String>,
    ) -> RestResult<ResultEnvelope> {
        let params = DataParams::parse(query, self.max_limit)?;

        self.with_timeout(async {
            let schema = self.catalog.resolve(table).await?;
            let spec = QuerySpec::from_params(&schema, &params, &self.columns)?;

            let data = spec.data_statement();
            let count = spec.count_statement();

            let (rows, total) = tokio::try_join!(
                self.store.fetch_rows(&data),
                self.store.fetch_count(&count),
            )?;

            Ok(ResultEnvelope::new(rows, total, spec.limit, spec.offset))
        })
        .await
    }

    /// `GET /api/data/:table_name/distinct/:column_name`
    pub async fn distinct_values(&self, table: &str, column: &str) -> RestResult<Vec<Value>> {
        self.with_timeout(async {
            let schema = self.catalog.resolve(table).await?;
            let column = schema
                .require_column(column)
                .map_err(|err| match err {
                    RestError::UnknownColumn { table, column } => {
                        RestError::ColumnNotFound { table, column }
                    }
                    other => other,
                })?;

            let statement = distinct_statement(schema.table(), &column);
            let rows = self.store.fetch_rows(&statement).await?;

            Ok(rows
                .into_iter()
                .filter_map(|mut row| row.remove(column.as_str()))
                .collect())
        })
        .await
    }

    /// `GET /api/stats/:table_name`
    pub async fn stats(&self, table: &str) -> RestResult<TableStats> {
        self.with_timeout(async {
            let schema = self.catalog.resolve(table).await?;
            let price = schema.require_column(&self.columns.price)?;

            let statement = stats_statement(schema.table(), &price);
            Ok(self.store.fetch_stats(&statement).await?)
        })
        .await
    }

    /// True when the store answers a ping within the request timeout
    pub async fn is_healthy(&self) -> bool {
        self.with_timeout(async { Ok(self.store.ping().await?) })
            .await
            .is_ok()
    }
}
