//! # Query Builder
//!
//! Renders statements from validated identifiers and compiled filters. Every
//! statement keeps the plan it was rendered from next to its SQL text.

use crate::catalog::{ColumnName, TableName, TableSchema};

use super::errors::RestResult;
use super::filter::{compile_filters, BindValue, FilterColumns, FilterSpec};
use super::parser::{DataParams, SortOrder};

/// Maximum number of values returned by a distinct lookup
pub const DISTINCT_VALUES_CAP: i64 = 100;

/// `ORDER BY <column> <order>`
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub column: ColumnName,
    pub order: SortOrder,
}

/// A fully validated data request
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub table: TableName,
    pub filters: FilterSpec,
    pub sort: Option<SortSpec>,
    pub limit: i64,
    pub offset: i64,
}

/// The structured form a statement was rendered from
#[derive(Debug, Clone, PartialEq)]
pub enum StatementPlan {
    /// One page of rows
    Select(QuerySpec),

    /// Row count under the same filters
    Count {
        table: TableName,
        filters: FilterSpec,
    },

    /// Ascending non-null distinct values of one column
    Distinct {
        table: TableName,
        column: ColumnName,
        cap: i64,
    },

    /// count/avg/min/max over the price column
    Stats { table: TableName, price: ColumnName },
}

/// SQL text with its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<BindValue>,
    pub plan: StatementPlan,
}

impl QuerySpec {
    /// Validate parsed parameters against the resolved table
    pub fn from_params(
        table: &TableSchema,
        params: &DataParams,
        columns: &FilterColumns,
    ) -> RestResult<Self> {
        let filters = compile_filters(&params.filters, table, columns)?;

        let sort = match &params.sort_by {
            Some(column) => Some(SortSpec {
                column: table.require_column(column)?,
                order: params.sort_order,
            }),
            None => None,
        };

        Ok(Self {
            table: table.table().clone(),
            filters,
            sort,
            limit: params.limit,
            offset: params.offset,
        })
    }

    /// `FROM <table> [WHERE ...]`, shared by the data and count statements
    fn from_where(&self) -> String {
        from_where(&self.table, &self.filters)
    }

    /// `SELECT * ... LIMIT $k OFFSET $k+1`
    pub fn data_statement(&self) -> Statement {
        let mut sql = format!("SELECT * {}", self.from_where());

        if let Some(sort) = &self.sort {
            sql.push_str(&format!(
                " ORDER BY {} {}",
                sort.column.quoted(),
                sort.order.as_sql()
            ));
        }

        let limit_index = self.filters.len() + 1;
        sql.push_str(&format!(
            " LIMIT ${} OFFSET ${}",
            limit_index,
            limit_index + 1
        ));

        let mut params = self.filters.params();
        params.push(BindValue::Integer(self.limit));
        params.push(BindValue::Integer(self.offset));

        Statement {
            sql,
            params,
            plan: StatementPlan::Select(self.clone()),
        }
    }

    /// `SELECT COUNT(*) ...` with the filter parameters only
    pub fn count_statement(&self) -> Statement {
        Statement {
            sql: format!("SELECT COUNT(*) {}", self.from_where()),
            params: self.filters.params(),
            plan: StatementPlan::Count {
                table: self.table.clone(),
                filters: self.filters.clone(),
            },
        }
    }
}

fn from_where(table: &TableName, filters: &FilterSpec) -> String {
    match filters.where_clause() {
        Some(clause) => format!("FROM {} {}", table.quoted(), clause),
        None => format!("FROM {}", table.quoted()),
    }
}

/// Distinct non-null values of one column, ascending, capped
pub fn distinct_statement(table: &TableName, column: &ColumnName) -> Statement {
    let col = column.quoted();
    Statement {
        sql: format!(
            "SELECT DISTINCT {col} FROM {} WHERE {col} IS NOT NULL ORDER BY {col} LIMIT {}",
            table.quoted(),
            DISTINCT_VALUES_CAP
        ),
        params: Vec::new(),
        plan: StatementPlan::Distinct {
            table: table.clone(),
            column: column.clone(),
            cap: DISTINCT_VALUES_CAP,
        },
    }
}

/// Aggregate statistics over rows with a non-null price
pub fn stats_statement(table: &TableName, price: &ColumnName) -> Statement {
    let col = price.quoted();
    Statement {
        sql: format!(
            "SELECT COUNT(*) AS total_records, \
             CAST(AVG({col}) AS DOUBLE PRECISION) AS avg_price, \
             CAST(MIN({col}) AS DOUBLE PRECISION) AS min_price, \
             CAST(MAX({col}) AS DOUBLE PRECISION) AS max_price \
             FROM {} WHERE {col} IS NOT NULL",
            table.quoted()
        ),
        params: Vec::new(),
        plan: StatementPlan::Stats {
            table: table.clone(),
            price: price.clone(),
        },
    }
}
