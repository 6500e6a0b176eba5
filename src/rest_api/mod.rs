//! # rowgate Query Layer
//!
//! Turns HTTP query parameters into parameterized statements and shapes
//! their results.

pub mod builder;
pub mod errors;
pub mod filter;
pub mod handler;
pub mod parser;
pub mod response;

pub use builder::{QuerySpec, Statement, StatementPlan};
pub use errors::{RestError, RestResult};
pub use filter::{BindValue, FilterOperator, FilterSpec};
pub use handler::DataHandler;
pub use parser::{DataParams, SortOrder};
pub use response::{ResultEnvelope, TableStats};
