//! Read-only `SQLite` open options, pool sizing and the liveness probe.
//!
//! Uses [`sqlx`] with runtime query construction (not compile-time
//! checked) so no database is needed at build time. Every connection is
//! opened read-only and never creates a missing file.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Connection, Executor, Sqlite, SqliteConnection, SqlitePool};

/// Default maximum number of concurrently open connections per database.
const DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Default lifetime after which a connection is recycled.
const DEFAULT_MAX_LIFETIME_SECS: u64 = 3600;

/// Default idle timeout before a spare connection is closed.
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default timeout for acquiring a connection from the pool.
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Minimal round-trip that forces `SQLite` to read the file header.
///
/// Opening a connection alone does not touch the file contents, so a
/// non-database file would pass a bare open.
const PROBE_SQL: &str = "SELECT count(*) FROM sqlite_master";

/// Pool settings applied to every per-database handle.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Maximum number of concurrently open connections.
    pub max_connections: u32,
    /// Connections older than this are closed and replaced.
    pub max_lifetime: Duration,
    /// Idle connections are closed after this long.
    pub idle_timeout: Duration,
    /// How long a request waits for a free connection.
    pub acquire_timeout: Duration,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_lifetime: Duration::from_secs(DEFAULT_MAX_LIFETIME_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

impl SqliteConfig {
    /// Set the maximum number of connections.
    #[must_use]
    pub const fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the connection recycle lifetime.
    #[must_use]
    pub const fn with_max_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the pool acquire timeout.
    #[must_use]
    pub const fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

/// Build connect options that open `path` read-only.
pub fn read_only_options(path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(path)
        .read_only(true)
        .create_if_missing(false)
}

/// Open a bounded read-only pool for the file at `path`.
///
/// At least one connection is established before returning.
///
/// # Errors
///
/// Returns the driver error if the file cannot be opened.
pub async fn open_pool(path: &Path, config: &SqliteConfig) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(0)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(read_only_options(path))
        .await
}

/// Run the liveness probe against any `SQLite` executor.
///
/// # Errors
///
/// Returns the driver error if the database does not answer.
pub async fn probe<'e, E>(executor: E) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>(PROBE_SQL)
        .fetch_one(executor)
        .await
        .map(|_| ())
}

/// Open a single read-only connection to `path`, probe it and close it.
///
/// Used by the startup validator, which must not leave handles behind.
///
/// # Errors
///
/// Returns the driver error from the open or the probe.
pub async fn check_file(path: &Path) -> Result<(), sqlx::Error> {
    let mut conn = SqliteConnection::connect_with(&read_only_options(path)).await?;
    let probed = probe(&mut conn).await;
    // Close errors after a failed probe would only mask the probe error.
    let closed = conn.close().await;
    probed?;
    closed
}
