//! rowgate - a read-only REST facade over PostgreSQL tables
//!
//! Catalog listing, filtered and paginated rows, distinct values and price
//! aggregates, with every identifier checked against the live catalog and
//! every value sent as a bound parameter.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod http_server;
pub mod observability;
pub mod rest_api;
pub mod store;
