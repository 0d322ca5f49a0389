//! Error types for the data layer.
//!
//! [`DbError`] covers per-request handle resolution and carries the full
//! driver detail for server-side logging. Callers facing clients must
//! map it to a generic message. [`StartupError`] covers the one-shot
//! storage validation that gates process start.

use std::path::PathBuf;

/// Errors that can occur while resolving a database handle.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// No backing file exists for the requested database name.
    #[error("database not found: {db_name}")]
    NotFound {
        /// The requested database name.
        db_name: String,
    },

    /// The backing file exists but could not be opened.
    #[error("failed to open database {db_name}: {source}")]
    Open {
        /// The requested database name.
        db_name: String,
        /// The underlying driver error.
        source: sqlx::Error,
    },

    /// The database opened but did not answer the liveness probe.
    #[error("database {db_name} failed liveness probe: {source}")]
    Probe {
        /// The requested database name.
        db_name: String,
        /// The underlying driver error.
        source: sqlx::Error,
    },
}

/// Errors that abort process startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The configured storage directory does not exist.
    #[error("database path does not exist: {}", .0.display())]
    PathMissing(PathBuf),

    /// The storage directory could not be listed.
    #[error("failed to list database files: {0}")]
    Listing(#[from] std::io::Error),

    /// The storage directory holds no `*.db` files.
    #[error("no database files (*.db) found in {}", .0.display())]
    NoDatabasesFound(PathBuf),

    /// At least one database failed to open or probe.
    #[error("database validation failed: {failed} of {checked} databases invalid")]
    OneOrMoreInvalid {
        /// Number of databases that failed.
        failed: usize,
        /// Number of databases checked.
        checked: usize,
    },
}
