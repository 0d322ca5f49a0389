//! Startup validation of the storage directory.
//!
//! Before the server accepts traffic every `*.db` file in the storage
//! directory is opened read-only and probed. A failure is logged with the
//! file and the reason but does not stop the scan; once every candidate
//! has been tried, any failure makes startup fail.

use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::error::StartupError;
use crate::registry::DB_EXTENSION;
use crate::sqlite;

/// Outcome of scanning the storage directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Every candidate that was checked, after symlink resolution.
    pub checked: Vec<PathBuf>,
    /// Candidates that failed, with the driver's reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl ValidationReport {
    /// Whether every checked database passed.
    pub fn is_valid(&self) -> bool {
        self.failed.is_empty()
    }

    /// Turn the report into the startup verdict.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::OneOrMoreInvalid`] if any candidate failed.
    pub fn into_result(self) -> Result<Self, StartupError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(StartupError::OneOrMoreInvalid {
                failed: self.failed.len(),
                checked: self.checked.len(),
            })
        }
    }
}

/// Validate every database under `storage_dir`.
///
/// # Errors
///
/// Returns [`StartupError::PathMissing`] if the directory does not exist,
/// [`StartupError::NoDatabasesFound`] if it holds no `*.db` file and
/// [`StartupError::OneOrMoreInvalid`] if any database fails to open or
/// probe.
pub async fn validate_all(storage_dir: &Path) -> Result<ValidationReport, StartupError> {
    scan(storage_dir).await?.into_result()
}

/// Check every database under `storage_dir` and report per-file results.
///
/// Unlike [`validate_all`], invalid databases are reported rather than
/// turned into an error.
///
/// # Errors
///
/// Returns [`StartupError::PathMissing`], [`StartupError::Listing`] or
/// [`StartupError::NoDatabasesFound`] when there is nothing to check.
pub async fn scan(storage_dir: &Path) -> Result<ValidationReport, StartupError> {
    if matches!(tokio::fs::try_exists(storage_dir).await, Ok(false)) {
        return Err(StartupError::PathMissing(storage_dir.to_path_buf()));
    }

    let candidates = list_databases(storage_dir).await?;
    if candidates.is_empty() {
        return Err(StartupError::NoDatabasesFound(storage_dir.to_path_buf()));
    }

    let mut report = ValidationReport::default();

    for candidate in candidates {
        let real_path = resolve_symlink(candidate).await;

        match sqlite::check_file(&real_path).await {
            Ok(()) => {
                info!(path = %real_path.display(), "[ok] database");
            }
            Err(e) => {
                error!(path = %real_path.display(), error = %e, "[!!] database");
                report.failed.push((real_path.clone(), e.to_string()));
            }
        }

        report.checked.push(real_path);
    }

    Ok(report)
}

/// List `*.db` entries in `dir`, sorted for deterministic logs.
async fn list_databases(dir: &Path) -> Result<Vec<PathBuf>, StartupError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut found = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == DB_EXTENSION) {
            found.push(path);
        }
    }

    found.sort();
    Ok(found)
}

/// Follow a symlink to its target, falling back to the link itself.
async fn resolve_symlink(path: PathBuf) -> PathBuf {
    let is_link = tokio::fs::symlink_metadata(&path)
        .await
        .is_ok_and(|meta| meta.file_type().is_symlink());

    if !is_link {
        return path;
    }

    tokio::fs::canonicalize(&path).await.unwrap_or(path)
}
