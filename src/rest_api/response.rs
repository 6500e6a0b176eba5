//! # Response Formatting
//!
//! Response bodies of the data and stats endpoints.

use serde::{Deserialize, Serialize};

use crate::store::Row;

/// A page of rows with pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub data: Vec<Row>,
    /// Rows matching the filters, independent of limit/offset
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl ResultEnvelope {
    pub fn new(data: Vec<Row>, total: i64, limit: i64, offset: i64) -> Self {
        Self {
            data,
            total,
            limit,
            offset,
        }
    }
}

/// Aggregates over the price column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStats {
    pub total_records: i64,
    pub avg_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl TableStats {
    /// Aggregates of an empty set: zero count, null prices
    pub fn empty() -> Self {
        Self {
            total_records: 0,
            avg_price: None,
            min_price: None,
            max_price: None,
        }
    }
}
