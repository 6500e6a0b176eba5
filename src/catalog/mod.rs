//! # Catalog Reader
//!
//! Lists tables and columns of the application schema. The resolved
//! [`TableSchema`] is the allow-list every identifier in a statement is
//! checked against.

pub mod identifier;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::rest_api::errors::{RestError, RestResult};
use crate::store::DataStore;

pub use identifier::{check_identifier, ColumnName, TableName};

/// One entry of `GET /api/tables`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub table_name: String,
}

/// One entry of `GET /api/tables/:table_name/columns`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
}

impl ColumnInfo {
    pub fn new(column_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A table and its columns as reported by the catalog
#[derive(Debug, Clone)]
pub struct TableSchema {
    table: TableName,
    columns: Vec<ColumnInfo>,
}

impl TableSchema {
    pub(crate) fn new(table: TableName, columns: Vec<ColumnInfo>) -> Self {
        Self { table, columns }
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Columns in physical order
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Look up a column by exact name
    pub fn column(&self, name: &str) -> Option<ColumnName> {
        self.columns
            .iter()
            .find(|c| c.column_name == name)
            .map(|c| ColumnName::trusted(c.column_name.clone()))
    }

    /// Look up a column named by a query parameter (400 when missing)
    pub fn require_column(&self, name: &str) -> RestResult<ColumnName> {
        check_identifier(name)?;
        self.column(name).ok_or_else(|| RestError::UnknownColumn {
            table: self.table.name().to_string(),
            column: name.to_string(),
        })
    }
}

/// Reads the catalog of one schema through a [`DataStore`]
pub struct CatalogReader<S: DataStore> {
    store: Arc<S>,
    schema: String,
}

impl<S: DataStore> CatalogReader<S> {
    pub fn new(store: Arc<S>, schema: impl Into<String>) -> Self {
        Self {
            store,
            schema: schema.into(),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Tables of the schema, alphabetical
    pub async fn list_tables(&self) -> RestResult<Vec<TableInfo>> {
        let mut names = self.store.list_tables(&self.schema).await?;
        names.sort();
        Ok(names
            .into_iter()
            .map(|table_name| TableInfo { table_name })
            .collect())
    }

    /// Columns of a table in physical order
    pub async fn list_columns(&self, table: &str) -> RestResult<Vec<ColumnInfo>> {
        Ok(self.resolve(table).await?.columns)
    }

    /// Validate a raw table name and load its columns.
    ///
    /// Malformed names fail with `InvalidIdentifier` before the store is
    /// touched; well-formed names missing from the schema fail with
    /// `TableNotFound`.
    pub async fn resolve(&self, raw: &str) -> RestResult<TableSchema> {
        let name = check_identifier(raw)?;

        let (tables, columns) = tokio::try_join!(
            self.store.list_tables(&self.schema),
            self.store.list_columns(&self.schema, name),
        )?;

        if !tables.iter().any(|t| t == name) {
            return Err(RestError::TableNotFound(name.to_string()));
        }

        Ok(TableSchema::new(TableName::trusted(&self.schema, name), columns))
    }
}
