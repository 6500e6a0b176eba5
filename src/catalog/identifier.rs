//! SQL identifiers that have been checked against the live catalog.
//!
//! Statement text only ever contains identifiers of these types. They can be
//! built only inside the crate, from names the catalog returned.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::rest_api::errors::{RestError, RestResult};

/// PostgreSQL truncates identifiers longer than 63 bytes
const MAX_IDENTIFIER_LEN: usize = 63;

static IDENTIFIER_SHAPE: OnceLock<Regex> = OnceLock::new();

fn identifier_shape() -> &'static Regex {
    IDENTIFIER_SHAPE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("identifier pattern is a valid regex")
    })
}

/// Reject raw input that cannot be a plain identifier.
///
/// Runs before any catalog lookup, so input carrying quotes, semicolons,
/// whitespace or comment markers never reaches a statement.
pub fn check_identifier(raw: &str) -> RestResult<&str> {
    if raw.is_empty() || raw.len() > MAX_IDENTIFIER_LEN || !identifier_shape().is_match(raw) {
        return Err(RestError::InvalidIdentifier(raw.to_string()));
    }
    Ok(raw)
}

/// Render an identifier as a quoted SQL identifier
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// A schema-qualified table known to the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    schema: String,
    name: String,
}

impl TableName {
    pub(crate) fn trusted(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `"schema"."table"`
    pub fn quoted(&self) -> String {
        format!("{}.{}", quote(&self.schema), quote(&self.name))
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A column known to belong to a catalog table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnName(String);

impl ColumnName {
    pub(crate) fn trusted(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn quoted(&self) -> String {
        quote(&self.0)
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
