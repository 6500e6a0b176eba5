//! Store error types

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures while talking to the database.
///
/// Messages carry the server's own error text only, never connection
/// strings or credentials, so they are safe to return as `details`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The statement reached the server and failed there
    #[error("database error: {0}")]
    Database(String),

    /// No usable connection (unreachable, pool exhausted or closed)
    #[error("connection error: {0}")]
    Connection(String),

    /// The result did not have the expected shape
    #[error("unexpected result: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => StoreError::Database(db.message().to_string()),
            sqlx::Error::PoolTimedOut => {
                StoreError::Connection("timed out waiting for a pooled connection".to_string())
            }
            sqlx::Error::PoolClosed => StoreError::Connection("pool is closed".to_string()),
            sqlx::Error::Io(io) => StoreError::Connection(io.kind().to_string()),
            sqlx::Error::Tls(_) => StoreError::Connection("TLS handshake failed".to_string()),
            sqlx::Error::Configuration(_) => {
                StoreError::Connection("invalid connection configuration".to_string())
            }
            sqlx::Error::RowNotFound => StoreError::Decode("no rows returned".to_string()),
            sqlx::Error::ColumnNotFound(column) => {
                StoreError::Decode(format!("missing column {}", column))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::Decode(format!("column {}: {}", index, source))
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_connection_errors() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Connection(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolClosed),
            StoreError::Connection(_)
        ));
    }

    #[test]
    fn test_row_not_found_is_decode() {
        assert_eq!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Decode("no rows returned".to_string())
        );
    }

    #[test]
    fn test_display() {
        let err = StoreError::Database("syntax error at or near \"FROM\"".to_string());
        assert_eq!(err.to_string(), "database error: syntax error at or near \"FROM\"");
    }
}
