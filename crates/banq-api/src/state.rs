//! Shared application state for the query API.
//!
//! [`AppState`] owns the [`ConnectionRegistry`] and the row cap. It is
//! built once at startup, wrapped in [`Arc`](std::sync::Arc) and injected
//! via Axum's `State` extractor; there are no process-wide globals.

use banq_db::{ConnectionRegistry, SqliteConfig};

/// Shared state for the Axum application.
#[derive(Debug)]
pub struct AppState {
    /// Per-database read-only handles, opened on first use.
    pub registry: ConnectionRegistry,
    /// Row cap bound as the final parameter of every report query.
    pub max_rows: u32,
}

impl AppState {
    /// Create state around an existing registry.
    pub const fn new(registry: ConnectionRegistry, max_rows: u32) -> Self {
        Self { registry, max_rows }
    }

    /// Create state with a fresh registry over `storage_dir` using the
    /// default pool settings.
    pub fn for_storage(storage_dir: impl Into<std::path::PathBuf>, max_rows: u32) -> Self {
        Self::new(
            ConnectionRegistry::new(storage_dir, SqliteConfig::default()),
            max_rows,
        )
    }
}
