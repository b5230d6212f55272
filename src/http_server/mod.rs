//! # HTTP Server Module
//!
//! Axum surface over the page registry and the data service.
//!
//! # Endpoints
//!
//! - `/health`, `/api/health` - Health check
//! - `/api/pages[/:id]` - Page definitions
//! - `/api/data/:table[/:id]` - Records, with `?page=&limit=&search=`
//! - `/api/stats/:table` - Aggregates over stats fields

pub mod config;
pub mod data_routes;
pub mod errors;
pub mod health_routes;
pub mod page_routes;
pub mod response;
pub mod server;

pub use config::{HttpServerConfig, DEFAULT_PORT};
pub use errors::{ApiError, ApiResult};
pub use server::{build_router, AppState, HttpServer};
