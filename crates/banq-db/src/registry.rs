//! Lazily populated registry of read-only database handles.
//!
//! [`ConnectionRegistry`] maps a database name (taken from the request
//! path) to a pooled, read-only [`DatabaseHandle`]. Handles are created
//! on first reference and then shared by every later request for the
//! same name until [`ConnectionRegistry::close_all`] runs at shutdown.
//!
//! Lookups take a shared lock. Creation takes the exclusive lock and
//! re-checks the map before opening, so at most one open + probe
//! sequence ever runs per name, even when many requests race on a cold
//! name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::DbError;
use crate::sqlite::{self, SqliteConfig};

/// File extension of every database in the storage directory.
pub const DB_EXTENSION: &str = "db";

/// A pooled, read-only connection to one database file.
#[derive(Debug)]
pub struct DatabaseHandle {
    name: String,
    file_name: String,
    pool: SqlitePool,
}

impl DatabaseHandle {
    /// The database name this handle was resolved for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display file name (`<name>.db`), suitable for response headers.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The underlying connection pool.
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Registry of per-database handles rooted at one storage directory.
#[derive(Debug)]
pub struct ConnectionRegistry {
    storage_dir: PathBuf,
    config: SqliteConfig,
    handles: RwLock<HashMap<String, Arc<DatabaseHandle>>>,
    opens: AtomicUsize,
}

impl ConnectionRegistry {
    /// Create an empty registry for databases under `storage_dir`.
    pub fn new(storage_dir: impl Into<PathBuf>, config: SqliteConfig) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            config,
            handles: RwLock::new(HashMap::new()),
            opens: AtomicUsize::new(0),
        }
    }

    /// The directory database files are resolved against.
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Resolve `db_name` to a shared handle, opening it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the name is not a plain file name
    /// or no `<db_name>.db` exists, and [`DbError::Open`] or
    /// [`DbError::Probe`] if the file cannot be opened or does not answer.
    pub async fn resolve(&self, db_name: &str) -> Result<Arc<DatabaseHandle>, DbError> {
        {
            let handles = self.handles.read().await;
            if let Some(handle) = handles.get(db_name) {
                return Ok(Arc::clone(handle));
            }
        }

        let mut handles = self.handles.write().await;

        // Another task may have opened it while we waited for the lock.
        if let Some(handle) = handles.get(db_name) {
            return Ok(Arc::clone(handle));
        }

        let not_found = || DbError::NotFound {
            db_name: db_name.to_owned(),
        };

        let path = self.database_path(db_name).ok_or_else(not_found)?;
        if matches!(tokio::fs::try_exists(&path).await, Ok(false)) {
            return Err(not_found());
        }

        self.opens.fetch_add(1, Ordering::Relaxed);
        debug!(db_name, path = %path.display(), "Opening database");

        let pool = sqlite::open_pool(&path, &self.config)
            .await
            .map_err(|source| DbError::Open {
                db_name: db_name.to_owned(),
                source,
            })?;

        if let Err(source) = sqlite::probe(&pool).await {
            pool.close().await;
            return Err(DbError::Probe {
                db_name: db_name.to_owned(),
                source,
            });
        }

        let handle = Arc::new(DatabaseHandle {
            name: db_name.to_owned(),
            file_name: format!("{db_name}.{DB_EXTENSION}"),
            pool,
        });
        handles.insert(db_name.to_owned(), Arc::clone(&handle));

        info!(
            db_name,
            max_connections = self.config.max_connections,
            "Created connection pool for database"
        );

        Ok(handle)
    }

    /// Number of open + probe sequences performed so far.
    pub fn opens_performed(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }

    /// Number of cached handles.
    pub async fn len(&self) -> usize {
        self.handles.read().await.len()
    }

    /// Whether no handle has been created yet.
    pub async fn is_empty(&self) -> bool {
        self.handles.read().await.is_empty()
    }

    /// Close every cached pool and empty the registry.
    ///
    /// Handles still held by in-flight requests stay usable until they
    /// are dropped; their pools refuse new acquisitions.
    pub async fn close_all(&self) {
        let drained: Vec<Arc<DatabaseHandle>> = {
            let mut handles = self.handles.write().await;
            handles.drain().map(|(_, handle)| handle).collect()
        };

        for handle in &drained {
            handle.pool.close().await;
        }

        info!(closed = drained.len(), "Database pools closed");
    }

    /// Map a database name onto its file, rejecting anything that is not
    /// a plain file name.
    fn database_path(&self, db_name: &str) -> Option<PathBuf> {
        is_plain_name(db_name)
            .then(|| self.storage_dir.join(format!("{db_name}.{DB_EXTENSION}")))
    }
}

/// Whether `name` only uses the file-name alphabet `[A-Za-z0-9_.-]`.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_accepted() {
        assert!(is_plain_name("ri_apow_supply_0"));
        assert!(is_plain_name("rt_apow-xpow.v2"));
    }

    #[test]
    fn path_like_names_rejected() {
        for name in ["", "ri_/../etc/passwd", "ri_..\\..\\win", "ri_\0x", "ri_<b>", "ri_%2F"] {
            assert!(!is_plain_name(name), "{name:?} should be rejected");
        }
    }

    #[test]
    fn database_path_joins_extension() {
        let registry = ConnectionRegistry::new("/srv/db", SqliteConfig::default());
        assert_eq!(
            registry.database_path("ri_x"),
            Some(PathBuf::from("/srv/db/ri_x.db"))
        );
        assert_eq!(registry.database_path("ri_/x"), None);
    }
}
