//! In-memory store
//!
//! Evaluates the plan behind each statement instead of parsing SQL. Used by
//! the test suite and for running the HTTP surface without a database.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::catalog::{ColumnInfo, TableName};
use crate::rest_api::builder::{SortSpec, Statement, StatementPlan};
use crate::rest_api::filter::{compare_json_values, FilterSpec};
use crate::rest_api::parser::SortOrder;
use crate::rest_api::response::TableStats;

use super::{DataStore, Row, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct MemoryTable {
    columns: Vec<ColumnInfo>,
    rows: Vec<Row>,
}

/// A [`DataStore`] holding tables of JSON rows
pub struct MemoryStore {
    schema: String,
    tables: RwLock<BTreeMap<String, MemoryTable>>,
    /// SQL of every statement handed to a fetch method, in call order
    executed: Mutex<Vec<String>>,
    latency: Option<Duration>,
    failure: Option<StoreError>,
    closed: AtomicBool,
}

impl MemoryStore {
    /// Empty store exposing a single schema
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            tables: RwLock::new(BTreeMap::new()),
            executed: Mutex::new(Vec::new()),
            latency: None,
            failure: None,
            closed: AtomicBool::new(false),
        }
    }

    /// Delay every fetch by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every fetch with `err`
    pub fn failing(mut self, err: StoreError) -> Self {
        self.failure = Some(err);
        self
    }

    /// Add or replace a table. Rows that are not JSON objects are skipped.
    pub fn add_table(&self, name: &str, columns: &[(&str, &str)], rows: Vec<Value>) {
        let table = MemoryTable {
            columns: columns
                .iter()
                .map(|(name, data_type)| ColumnInfo::new(*name, *data_type))
                .collect(),
            rows: rows
                .into_iter()
                .filter_map(|row| match row {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
        };

        self.tables
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), table);
    }

    /// SQL of the statements executed so far
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn table(&self, name: &TableName) -> StoreResult<MemoryTable> {
        let tables = self
            .tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match tables.get(name.name()) {
            Some(table) if name.schema() == self.schema => Ok(table.clone()),
            _ => Err(StoreError::Database(format!(
                "relation \"{}\" does not exist",
                name
            ))),
        }
    }

    fn check_open(&self) -> StoreResult<()> {
        if self.closed.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Connection("pool is closed".to_string()));
        }
        Ok(())
    }

    /// Record the statement, then apply configured latency and failure
    async fn begin(&self, statement: &Statement) -> StoreResult<()> {
        self.check_open()?;
        self.executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(statement.sql.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn filtered(&self, table: &TableName, filters: &FilterSpec) -> StoreResult<Vec<Row>> {
        Ok(self
            .table(table)?
            .rows
            .into_iter()
            .filter(|row| filters.matches(row))
            .collect())
    }
}

/// SQL ordering: NULLs sort after every value ascending, before descending
fn compare_nullable(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare_json_values(a, b).unwrap_or(Ordering::Equal),
    }
}

fn sort_rows(rows: &mut [Row], sort: &SortSpec) {
    let column = sort.column.as_str();
    rows.sort_by(|a, b| {
        let ordering = compare_nullable(a.get(column), b.get(column));
        match sort.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn to_index(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}

fn unexpected_plan(method: &str) -> StoreError {
    StoreError::Decode(format!("{} called with an incompatible statement", method))
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.check_open()
    }

    async fn list_tables(&self, schema: &str) -> StoreResult<Vec<String>> {
        self.check_open()?;
        if schema != self.schema {
            return Ok(Vec::new());
        }
        let tables = self
            .tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(tables.keys().cloned().collect())
    }

    async fn list_columns(&self, schema: &str, table: &str) -> StoreResult<Vec<ColumnInfo>> {
        self.check_open()?;
        if schema != self.schema {
            return Ok(Vec::new());
        }
        let tables = self
            .tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(tables
            .get(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn fetch_rows(&self, statement: &Statement) -> StoreResult<Vec<Row>> {
        self.begin(statement).await?;

        match &statement.plan {
            StatementPlan::Select(spec) => {
                let mut rows = self.filtered(&spec.table, &spec.filters)?;
                if let Some(sort) = &spec.sort {
                    sort_rows(&mut rows, sort);
                }
                Ok(rows
                    .into_iter()
                    .skip(to_index(spec.offset))
                    .take(to_index(spec.limit))
                    .collect())
            }
            StatementPlan::Distinct { table, column, cap } => {
                let mut values: Vec<Value> = self
                    .table(table)?
                    .rows
                    .into_iter()
                    .filter_map(|mut row| row.remove(column.as_str()))
                    .filter(|value| !value.is_null())
                    .collect();
                values.sort_by(|a, b| compare_nullable(Some(a), Some(b)));
                values.dedup();
                values.truncate(to_index(*cap));

                Ok(values
                    .into_iter()
                    .map(|value| {
                        let mut row = Row::new();
                        row.insert(column.as_str().to_string(), value);
                        row
                    })
                    .collect())
            }
            _ => Err(unexpected_plan("fetch_rows")),
        }
    }

    async fn fetch_count(&self, statement: &Statement) -> StoreResult<i64> {
        self.begin(statement).await?;

        match &statement.plan {
            StatementPlan::Count { table, filters } => {
                Ok(self.filtered(table, filters)?.len() as i64)
            }
            _ => Err(unexpected_plan("fetch_count")),
        }
    }

    async fn fetch_stats(&self, statement: &Statement) -> StoreResult<TableStats> {
        self.begin(statement).await?;

        let (table, price) = match &statement.plan {
            StatementPlan::Stats { table, price } => (table, price),
            _ => return Err(unexpected_plan("fetch_stats")),
        };

        let prices: Vec<f64> = self
            .table(table)?
            .rows
            .iter()
            .filter_map(|row| row.get(price.as_str()).and_then(Value::as_f64))
            .collect();

        if prices.is_empty() {
            return Ok(TableStats::empty());
        }

        let sum: f64 = prices.iter().sum();
        Ok(TableStats {
            total_records: prices.len() as i64,
            avg_price: Some(sum / prices.len() as f64),
            min_price: prices.iter().copied().reduce(f64::min),
            max_price: prices.iter().copied().reduce(f64::max),
        })
    }

    async fn close(&self) {
        self.closed.store(true, AtomicOrdering::SeqCst);
    }
}
