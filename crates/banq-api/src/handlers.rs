//! Service endpoint handlers.
//!
//! Report endpoints are served by [`crate::dispatch`]; this module holds
//! the fixed documents around them.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Service description + endpoint catalog |
//! | `GET` | `/health` | Liveness check, never cached |
//! | `GET` | `/robots.txt` | Disallow all crawlers |

use std::collections::BTreeMap;

use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::dispatch::CACHE_PUBLIC_HOUR;
use crate::error::ApiError;
use crate::routes::ENDPOINTS;

/// Service name reported by `/health`.
pub const SERVICE_NAME: &str = "XPower Banq API";

/// Cache directive for `/health`.
const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// Body of `/robots.txt`.
const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /\n";

/// Catalog entry for one report endpoint.
#[derive(Debug, Serialize)]
pub struct EndpointDoc {
    /// Route pattern, e.g. `/{dbName}/daily_average.json`.
    pub path: String,
    /// Human-readable description.
    pub description: &'static str,
    /// Example request path.
    pub example: &'static str,
    /// Query string template.
    pub params: String,
}

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct ServiceDoc {
    /// Service title.
    pub title: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// License identifier.
    pub license: &'static str,
    /// License text location.
    pub license_url: &'static str,
    /// Upstream project producing the archives.
    pub source: &'static str,
    /// Upstream repository.
    pub source_url: &'static str,
    /// Report endpoints keyed by name.
    pub endpoints: BTreeMap<&'static str, EndpointDoc>,
}

/// Build the service description from the endpoint registry.
pub fn service_doc() -> ServiceDoc {
    let endpoints = ENDPOINTS
        .iter()
        .map(|endpoint| {
            let doc = EndpointDoc {
                path: format!("/{{dbName}}{}", endpoint.suffix),
                description: endpoint.description,
                example: endpoint.example,
                params: endpoint.params_template(),
            };
            (endpoint.name(), doc)
        })
        .collect();

    ServiceDoc {
        title: "XPower Banq Database API",
        description: "Read-only API for XPower Banq utilization rates and price quotes",
        license: "GPL-3.0",
        license_url: "https://www.gnu.org/licenses/gpl-3.0.en.html",
        source: "xpower-banq-cli",
        source_url: "https://github.com/blackhan-software/xpower-banq-cli.git",
        endpoints,
    }
}

/// `GET /` -- service description and endpoint catalog.
pub async fn index() -> impl IntoResponse {
    ([(header::CACHE_CONTROL, CACHE_PUBLIC_HOUR)], Json(service_doc()))
}

/// `GET /health` -- liveness only; does not touch any database.
pub async fn health() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, NO_CACHE)],
        Json(serde_json::json!({
            "status": "ok",
            "service": SERVICE_NAME,
        })),
    )
}

/// `GET /robots.txt` -- disallow all crawlers.
pub async fn robots() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], ROBOTS_TXT)
}

/// Fallback for unmatched routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Fallback for matched routes with the wrong method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_endpoint() {
        let doc = service_doc();
        assert_eq!(doc.endpoints.len(), ENDPOINTS.len());
        let average = &doc.endpoints["daily_average"];
        assert_eq!(average.path, "/{dbName}/daily_average.json");
        assert_eq!(average.params, "?lhs=YYYY-MM-DD&rhs=YYYY-MM-DD");
        assert!(doc.endpoints.contains_key("daily_ohlc"));
    }
}
