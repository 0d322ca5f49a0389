//! Data layer for the XPower Banq API (read-only `SQLite` archives).
//!
//! Every rate or quote series lives in its own `<name>.db` file inside a
//! single storage directory. The API never writes to these files: every
//! connection is opened with `SQLITE_OPEN_READONLY`.
//!
//! # Architecture
//!
//! ```text
//! Process start
//!     |
//!     +-- validate_all(dir) ----> open + probe every *.db (fatal on failure)
//!
//! Request
//!     |
//!     +-- ConnectionRegistry::resolve(name)
//!         |-- cached handle   (shared read lock, no I/O)
//!         +-- first reference (exclusive lock, open + probe once)
//! ```
//!
//! # Modules
//!
//! - [`sqlite`] -- read-only open options, pool sizing and the liveness probe
//! - [`registry`] -- lazily populated per-database handle registry
//! - [`validate`] -- startup scan of the storage directory
//! - [`error`] -- shared error types

pub mod error;
pub mod registry;
pub mod sqlite;
pub mod validate;

// Re-export primary types for convenience.
pub use error::{DbError, StartupError};
pub use registry::{ConnectionRegistry, DatabaseHandle};
pub use sqlite::SqliteConfig;
pub use validate::{validate_all, ValidationReport};
