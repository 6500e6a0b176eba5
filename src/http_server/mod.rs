//! # rowgate HTTP Server Module
//!
//! Axum routers for the REST surface.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/tables` - Catalog listing
//! - `/api/data/*` - Filtered, paginated rows and distinct values
//! - `/api/stats/*` - Price aggregates

pub mod config;
pub mod database_routes;
pub mod errors;
pub mod health_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ErrorBody};
pub use server::HttpServer;
