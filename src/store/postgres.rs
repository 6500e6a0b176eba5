//! PostgreSQL store backed by a `sqlx` connection pool

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions, Postgres};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::Row as _;

use crate::catalog::ColumnInfo;
use crate::config::DatabaseConfig;
use crate::rest_api::builder::{Statement, StatementPlan};
use crate::rest_api::filter::BindValue;
use crate::rest_api::response::TableStats;

use super::{DataStore, Row, StoreError, StoreResult};

const LIST_TABLES_SQL: &str = "SELECT table_name::text AS table_name \
     FROM information_schema.tables \
     WHERE table_schema = $1 AND table_type IN ('BASE TABLE', 'VIEW') \
     ORDER BY table_name";

const LIST_COLUMNS_SQL: &str = "SELECT column_name::text AS column_name, data_type::text AS data_type \
     FROM information_schema.columns \
     WHERE table_schema = $1 AND table_name = $2 \
     ORDER BY ordinal_position";

/// Build connect options from config without ever formatting the password
pub fn connect_options(config: &DatabaseConfig) -> StoreResult<PgConnectOptions> {
    if let Some(url) = &config.url {
        return url.parse::<PgConnectOptions>().map_err(|_| {
            StoreError::Connection("DATABASE_URL is not a valid postgres URL".to_string())
        });
    }

    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .database(&config.name);
    if let Some(password) = &config.password {
        options = options.password(password);
    }
    Ok(options)
}

/// A [`DataStore`] over a PostgreSQL pool.
///
/// The pool is created once at startup and shared by every request; each
/// statement acquires a connection and returns it when the statement
/// finishes or its future is dropped.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open the pool and establish the first connection
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect_with(connect_options(config)?)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [BindValue],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            BindValue::Text(value) => query.bind(value.as_str()),
            BindValue::Float(value) => query.bind(*value),
            BindValue::Integer(value) => query.bind(*value),
        };
    }
    query
}

/// Wrap a row-producing statement so each row arrives as one JSON object.
///
/// `row_to_json` keeps column order and converts every Postgres type on the
/// server. The subquery's order is not inherited, so the ordering is
/// repeated on the outer select.
fn json_rows_sql(statement: &Statement) -> String {
    let order_by = match &statement.plan {
        StatementPlan::Select(spec) => spec.sort.as_ref().map(|sort| {
            format!(" ORDER BY page.{} {}", sort.column.quoted(), sort.order.as_sql())
        }),
        StatementPlan::Distinct { column, .. } => {
            Some(format!(" ORDER BY page.{}", column.quoted()))
        }
        _ => None,
    };

    format!(
        "SELECT row_to_json(page.*) AS row FROM ({}) AS page{}",
        statement.sql,
        order_by.unwrap_or_default()
    )
}

#[async_trait]
impl DataStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_tables(&self, schema: &str) -> StoreResult<Vec<String>> {
        let rows = sqlx::query(LIST_TABLES_SQL)
            .bind(schema)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("table_name").map_err(StoreError::from))
            .collect()
    }

    async fn list_columns(&self, schema: &str, table: &str) -> StoreResult<Vec<ColumnInfo>> {
        let rows = sqlx::query(LIST_COLUMNS_SQL)
            .bind(schema)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(ColumnInfo {
                    column_name: row.try_get("column_name")?,
                    data_type: row.try_get("data_type")?,
                })
            })
            .collect()
    }

    async fn fetch_rows(&self, statement: &Statement) -> StoreResult<Vec<Row>> {
        let sql = json_rows_sql(statement);
        let rows = bind_all(sqlx::query(&sql), &statement.params)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let Json(object) = row.try_get::<Json<Row>, _>("row")?;
                Ok(object)
            })
            .collect()
    }

    async fn fetch_count(&self, statement: &Statement) -> StoreResult<i64> {
        let row = bind_all(sqlx::query(&statement.sql), &statement.params)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    async fn fetch_stats(&self, statement: &Statement) -> StoreResult<TableStats> {
        let row = bind_all(sqlx::query(&statement.sql), &statement.params)
            .fetch_one(&self.pool)
            .await?;

        Ok(TableStats {
            total_records: row.try_get("total_records")?,
            avg_price: row.try_get("avg_price")?,
            min_price: row.try_get("min_price")?,
            max_price: row.try_get("max_price")?,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
