//! # Filter Compiler
//!
//! Turns the recognized filter keys of a data request into an ordered list
//! of predicates with bound values.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::Value;

use crate::catalog::{ColumnName, TableSchema};
use crate::config::QueryConfig;
use crate::store::Row;

use super::errors::{RestError, RestResult};

/// Comparison operators the compiler can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equals
    Eq,
    /// Greater than or equal
    Gte,
    /// Less than or equal
    Lte,
}

impl FilterOperator {
    /// SQL spelling of the operator
    pub fn as_sql(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::Gte => ">=",
            FilterOperator::Lte => "<=",
        }
    }
}

/// A value sent alongside a statement, never spliced into its text
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BindValue {
    Text(String),
    Float(f64),
    Integer(i64),
}

impl BindValue {
    pub fn to_json(&self) -> Value {
        match self {
            BindValue::Text(s) => Value::String(s.clone()),
            BindValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            BindValue::Integer(i) => Value::from(*i),
        }
    }
}

/// `<column> <operator> $n`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: ColumnName,
    pub operator: FilterOperator,
    pub value: BindValue,
}

impl Predicate {
    /// Render with the given 1-based placeholder index.
    ///
    /// Text values are bound as `TEXT`, so the column side is cast to its
    /// text form; enum, integer and varchar columns all compare that way.
    pub fn render(&self, placeholder: usize) -> String {
        let column = match self.value {
            BindValue::Text(_) => format!("{}::text", self.column.quoted()),
            _ => self.column.quoted(),
        };
        format!("{} {} ${}", column, self.operator.as_sql(), placeholder)
    }

    /// Evaluate against a row with SQL comparison semantics (NULL never matches)
    pub fn matches(&self, row: &Row) -> bool {
        let field = match row.get(self.column.as_str()) {
            Some(v) if !v.is_null() => v,
            _ => return false,
        };
        let ordering = match &self.value {
            BindValue::Text(expected) => text_form(field).as_str().cmp(expected.as_str()),
            other => match compare_json_values(field, &other.to_json()) {
                Some(ordering) => ordering,
                None => return false,
            },
        };

        match self.operator {
            FilterOperator::Eq => ordering == Ordering::Equal,
            FilterOperator::Gte => ordering != Ordering::Less,
            FilterOperator::Lte => ordering != Ordering::Greater,
        }
    }
}

/// `value::text` for a non-null JSON value
fn text_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Compare two JSON scalars of the same kind
pub fn compare_json_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Predicates combined with AND, in the order they were pushed.
///
/// Placeholder indexes are derived from position when rendering, so the Nth
/// predicate always binds `$N` and the parameter list has no gaps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    predicates: Vec<Predicate>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: ColumnName, operator: FilterOperator, value: BindValue) {
        self.predicates.push(Predicate {
            column,
            operator,
            value,
        });
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Bound values in placeholder order
    pub fn params(&self) -> Vec<BindValue> {
        self.predicates.iter().map(|p| p.value.clone()).collect()
    }

    /// `WHERE p1 AND p2 ...`, or `None` with no predicates
    pub fn where_clause(&self) -> Option<String> {
        if self.predicates.is_empty() {
            return None;
        }

        let rendered: Vec<String> = self
            .predicates
            .iter()
            .enumerate()
            .map(|(i, p)| p.render(i + 1))
            .collect();

        Some(format!("WHERE {}", rendered.join(" AND ")))
    }

    /// Check if a row matches all predicates
    pub fn matches(&self, row: &Row) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }
}

/// Raw values of the recognized filter keys, empty values already dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFilters {
    pub booking_status: Option<String>,
    pub market_segment: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

/// Which table column each filter key targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterColumns {
    pub status: String,
    pub segment: String,
    pub price: String,
}

impl From<&QueryConfig> for FilterColumns {
    fn from(config: &QueryConfig) -> Self {
        Self {
            status: config.status_column.clone(),
            segment: config.segment_column.clone(),
            price: config.price_column.clone(),
        }
    }
}

/// Compile the recognized filters against a resolved table.
///
/// Predicates are appended in a fixed order: status, segment, min price,
/// max price.
pub fn compile_filters(
    raw: &RawFilters,
    table: &TableSchema,
    columns: &FilterColumns,
) -> RestResult<FilterSpec> {
    let mut spec = FilterSpec::new();

    if let Some(status) = &raw.booking_status {
        spec.push(
            table.require_column(&columns.status)?,
            FilterOperator::Eq,
            BindValue::Text(status.clone()),
        );
    }

    if let Some(segment) = &raw.market_segment {
        spec.push(
            table.require_column(&columns.segment)?,
            FilterOperator::Eq,
            BindValue::Text(segment.clone()),
        );
    }

    if let Some(min) = &raw.min_price {
        spec.push(
            table.require_column(&columns.price)?,
            FilterOperator::Gte,
            BindValue::Float(parse_price("min_price", min)?),
        );
    }

    if let Some(max) = &raw.max_price {
        spec.push(
            table.require_column(&columns.price)?,
            FilterOperator::Lte,
            BindValue::Float(parse_price("max_price", max)?),
        );
    }

    Ok(spec)
}

/// Parse a price bound, rejecting anything that is not a finite number
fn parse_price(key: &str, value: &str) -> RestResult<f64> {
    match value.trim().parse::<f64>() {
        Ok(price) if price.is_finite() => Ok(price),
        _ => Err(RestError::InvalidQueryParam(format!(
            "{} must be a finite number, got {:?}",
            key, value
        ))),
    }
}
