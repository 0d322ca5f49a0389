//! Generic report handler.
//!
//! One function serves every [`EndpointDescriptor`]:
//!
//! 1. check the database-name prefix
//! 2. extract the date parameters in declared order
//! 3. bind the row cap last
//! 4. resolve the pooled read-only handle
//! 5. prepare and execute the SQL with bound parameters only
//! 6. scan the rows with the descriptor's scanner
//! 7. respond with JSON and cache headers
//!
//! Validation failures answer `400` with their message. Anything past
//! validation is logged here with full detail and answered with a fixed
//! generic message.

use std::sync::Arc;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::{self, HeaderName};
use axum::response::{IntoResponse, Response};
use axum::Json;
use sqlx::Executor;
use tracing::{error, warn};

use crate::error::ApiError;
use crate::params;
use crate::records::scan_rows;
use crate::routes::EndpointDescriptor;
use crate::state::AppState;

/// Header carrying the display name of the database that answered.
pub const X_DATABASE: HeaderName = HeaderName::from_static("x-database");

/// Cache directive for report responses. Daily aggregates only grow.
pub const CACHE_PUBLIC_HOUR: &str = "public, max-age=3600";

/// Upper bound on the result pre-allocation, whatever the row cap.
const MAX_CAPACITY_HINT: usize = 1024;

/// Axum entry point for a report route.
///
/// Extractor rejections are turned into the JSON error shape rather than
/// Axum's plain-text defaults.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    endpoint: &'static EndpointDescriptor,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let (Ok(Path(db_name)), Ok(Query(query))) = (path, query) else {
        return ApiError::InvalidRequest.into_response();
    };

    match dispatch(&state, endpoint, &db_name, &query).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

/// Run `endpoint` against `db_name` with the decoded query pairs.
///
/// # Errors
///
/// Returns [`ApiError::BadRequest`] for bad input,
/// [`ApiError::DatabaseUnavailable`] if the database cannot be resolved,
/// [`ApiError::QueryFailed`] if the SQL cannot run and
/// [`ApiError::ProcessingFailed`] if the rows cannot be read.
pub async fn dispatch(
    state: &AppState,
    endpoint: &EndpointDescriptor,
    db_name: &str,
    query: &[(String, String)],
) -> Result<Response, ApiError> {
    params::check_prefix(db_name, endpoint.required_prefix)?;

    let mut bound = Vec::with_capacity(endpoint.params.len());
    for name in endpoint.params {
        bound.push(params::extract_date(query, name)?);
    }

    let handle = state.registry.resolve(db_name).await.map_err(|e| {
        warn!(db_name, error = %e, "Database error");
        ApiError::DatabaseUnavailable
    })?;

    let mut conn = handle.pool().acquire().await.map_err(|e| {
        error!(db_name, error = %e, "Connection acquire error");
        ApiError::QueryFailed
    })?;

    // Preparing first separates SQL errors from row-level failures; the
    // prepared statement is cached on the connection and reused below.
    (&mut *conn).prepare(endpoint.query).await.map_err(|e| {
        error!(db_name, suffix = endpoint.suffix, error = %e, "Query error");
        ApiError::QueryFailed
    })?;

    let mut sql = sqlx::query(endpoint.query);
    for value in bound {
        sql = sql.bind(value);
    }
    sql = sql.bind(i64::from(state.max_rows));

    let capacity = usize::try_from(state.max_rows)
        .unwrap_or(MAX_CAPACITY_HINT)
        .min(MAX_CAPACITY_HINT);

    let records = scan_rows(sql.fetch(&mut *conn), endpoint.scan, capacity)
        .await
        .map_err(|e| {
            error!(db_name, suffix = endpoint.suffix, error = %e, "Result scanning error");
            ApiError::ProcessingFailed
        })?;

    let headers = [
        (header::CACHE_CONTROL, CACHE_PUBLIC_HOUR.to_owned()),
        (X_DATABASE, handle.file_name().to_owned()),
    ];

    Ok((headers, Json(records)).into_response())
}
