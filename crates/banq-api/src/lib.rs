//! Read-only HTTP query API for the XPower Banq rate and quote archives.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Report endpoints** (`/{db_name}/daily_average.json`,
//!   `/{db_name}/daily_ohlc.json`) aggregating one archive per request
//! - **Service endpoints** (`/`, `/health`, `/robots.txt`)
//!
//! # Architecture
//!
//! Report endpoints are declared once in the [`routes`] registry. Each
//! [`EndpointDescriptor`] names the required database prefix, the SQL
//! template, the ordered date parameters and the row scanner. The router
//! mounts one route per descriptor, all served by the generic
//! [`dispatch`] handler:
//!
//! ```text
//! request -> prefix + date checks (params)
//!         -> ConnectionRegistry::resolve (banq-db)
//!         -> prepare + bind + fetch (sqlx)
//!         -> scan rows (records) -> JSON
//! ```
//!
//! User input only ever reaches SQL as bound parameters.
//!
//! [`EndpointDescriptor`]: routes::EndpointDescriptor

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod params;
pub mod records;
pub mod router;
pub mod routes;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use config::{ApiConfig, Cli};
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use state::AppState;
