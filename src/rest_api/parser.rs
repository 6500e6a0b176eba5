//! # Query Parameter Parser
//!
//! Parses the query string of `GET /api/data/:table_name`.

use std::collections::HashMap;

use super::errors::{RestError, RestResult};
use super::filter::RawFilters;

/// Default page size when `limit` is absent
pub const DEFAULT_LIMIT: i64 = 100;

/// Default offset when `offset` is absent
pub const DEFAULT_OFFSET: i64 = 0;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    fn parse(value: &str) -> RestResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(RestError::InvalidQueryParam(format!(
                "Invalid sort_order: {:?}",
                value
            ))),
        }
    }
}

/// Parsed data request parameters
#[derive(Debug, Clone, PartialEq)]
pub struct DataParams {
    /// Number of rows to return
    pub limit: i64,

    /// Number of rows to skip
    pub offset: i64,

    /// Recognized filter keys
    pub filters: RawFilters,

    /// Column to sort by, still unvalidated
    pub sort_by: Option<String>,

    pub sort_order: SortOrder,
}

impl Default for DataParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
            filters: RawFilters::default(),
            sort_by: None,
            sort_order: SortOrder::Asc,
        }
    }
}

impl DataParams {
    /// Parse query parameters from a HashMap.
    ///
    /// Unrecognized keys are ignored and empty values count as absent.
    pub fn parse(params: &HashMap<String, String>, max_limit: i64) -> RestResult<Self> {
        let mut result = DataParams::default();

        for (key, value) in params {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match key.as_str() {
                "limit" => result.limit = parse_count("limit", value)?,
                "offset" => result.offset = parse_count("offset", value)?,
                "sort_by" => result.sort_by = Some(value.to_string()),
                "sort_order" => result.sort_order = SortOrder::parse(value)?,
                "booking_status" => result.filters.booking_status = Some(value.to_string()),
                "market_segment" => result.filters.market_segment = Some(value.to_string()),
                "min_price" => result.filters.min_price = Some(value.to_string()),
                "max_price" => result.filters.max_price = Some(value.to_string()),
                _ => {}
            }
        }

        if result.limit > max_limit {
            return Err(RestError::LimitExceeded(result.limit, max_limit));
        }

        Ok(result)
    }
}

/// Parse a non-negative integer parameter
fn parse_count(key: &str, value: &str) -> RestResult<i64> {
    match value.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(RestError::InvalidQueryParam(format!(
            "Invalid {}: {:?}",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let parsed = DataParams::parse(&HashMap::new(), 1000).unwrap();
        assert_eq!(parsed.limit, 100);
        assert_eq!(parsed.offset, 0);
        assert_eq!(parsed.sort_by, None);
        assert_eq!(parsed.sort_order, SortOrder::Asc);
        assert_eq!(parsed.filters, RawFilters::default());
    }

    #[test]
    fn test_full_query_params() {
        let parsed = DataParams::parse(
            &params(&[
                ("limit", "20"),
                ("offset", "40"),
                ("sort_by", "avg_price_per_room"),
                ("sort_order", "DESC"),
                ("booking_status", "Canceled"),
                ("market_segment", "Online"),
                ("min_price", "50"),
                ("max_price", "150"),
                ("market_segment_text", "ignored"),
            ]),
            1000,
        )
        .unwrap();

        assert_eq!(parsed.limit, 20);
        assert_eq!(parsed.offset, 40);
        assert_eq!(parsed.sort_by.as_deref(), Some("avg_price_per_room"));
        assert_eq!(parsed.sort_order, SortOrder::Desc);
        assert_eq!(parsed.filters.booking_status.as_deref(), Some("Canceled"));
        assert_eq!(parsed.filters.market_segment.as_deref(), Some("Online"));
        assert_eq!(parsed.filters.min_price.as_deref(), Some("50"));
        assert_eq!(parsed.filters.max_price.as_deref(), Some("150"));
    }

    #[test]
    fn test_empty_values_are_absent() {
        let parsed = DataParams::parse(
            &params(&[("limit", ""), ("booking_status", ""), ("sort_by", "  ")]),
            1000,
        )
        .unwrap();

        assert_eq!(parsed, DataParams::default());
    }

    #[test]
    fn test_invalid_limit_and_offset() {
        for (key, value) in [("limit", "abc"), ("limit", "-1"), ("offset", "1.5"), ("offset", "-3")] {
            let result = DataParams::parse(&params(&[(key, value)]), 1000);
            assert!(
                matches!(result, Err(RestError::InvalidQueryParam(_))),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_limit_exceeded() {
        let result = DataParams::parse(&params(&[("limit", "5000")]), 1000);
        assert_eq!(result, Err(RestError::LimitExceeded(5000, 1000)));
    }

    #[test]
    fn test_zero_limit_allowed() {
        let parsed = DataParams::parse(&params(&[("limit", "0")]), 1000).unwrap();
        assert_eq!(parsed.limit, 0);
    }

    #[test]
    fn test_sort_order_parsing() {
        let parsed = DataParams::parse(&params(&[("sort_order", "desc")]), 1000).unwrap();
        assert_eq!(parsed.sort_order, SortOrder::Desc);

        let result = DataParams::parse(&params(&[("sort_order", "DESC; DROP TABLE x")]), 1000);
        assert!(matches!(result, Err(RestError::InvalidQueryParam(_))));
    }
}
