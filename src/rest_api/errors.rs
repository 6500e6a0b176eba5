//! # REST API Errors
//!
//! Request-level error taxonomy for the query layer.

use axum::http::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

/// REST API errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RestError {
    // ==================
    // Validation (400)
    // ==================
    /// Malformed query parameter value
    #[error("Invalid query parameter: {0}")]
    InvalidQueryParam(String),

    /// Identifier that can never name a table or column
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Limit above the configured maximum
    #[error("Limit {0} exceeds maximum {1}")]
    LimitExceeded(i64, i64),

    /// Query parameter referring to a column the table does not have
    #[error("Column {column:?} does not exist in table {table:?}")]
    UnknownColumn { table: String, column: String },

    // ==================
    // Not Found (404)
    // ==================
    /// Table is not in the catalog
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Path column is not in the table
    #[error("Column {column:?} not found in table {table:?}")]
    ColumnNotFound { table: String, column: String },

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Statement failed in the database
    #[error("{0}")]
    Execution(String),

    /// Request exceeded its time budget
    #[error("Query timed out after {0} ms")]
    Timeout(u64),
}

impl RestError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::InvalidQueryParam(_) => StatusCode::BAD_REQUEST,
            RestError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            RestError::LimitExceeded(_, _) => StatusCode::BAD_REQUEST,
            RestError::UnknownColumn { .. } => StatusCode::BAD_REQUEST,

            RestError::TableNotFound(_) => StatusCode::NOT_FOUND,
            RestError::ColumnNotFound { .. } => StatusCode::NOT_FOUND,

            RestError::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RestError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// True for errors caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<StoreError> for RestError {
    fn from(err: StoreError) -> Self {
        RestError::Execution(err.to_string())
    }
}
