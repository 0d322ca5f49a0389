//! Axum router construction for the query API.
//!
//! Report routes are mounted from the [`ENDPOINTS`] registry, one `GET`
//! route per descriptor, all served by [`dispatch::handle`]. CORS only
//! admits the configured origins and never allows credentials.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::dispatch::{self, X_DATABASE};
use crate::handlers;
use crate::routes::ENDPOINTS;
use crate::state::AppState;

/// How long browsers may cache a CORS preflight answer.
const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- service description and endpoint catalog
/// - `GET /health` -- liveness check
/// - `GET /robots.txt` -- crawler policy
/// - `GET /{db_name}/daily_average.json` and every other registered report
///
/// Unmatched paths answer `404` and wrong methods `405`, both with the
/// JSON error body.
pub fn build_router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/robots.txt", get(handlers::robots));

    for endpoint in ENDPOINTS {
        router = router.route(
            &endpoint.route_path(),
            get(
                move |state: State<Arc<AppState>>,
                      path: Result<Path<String>, PathRejection>,
                      query: Result<Query<Vec<(String, String)>>, QueryRejection>| {
                    dispatch::handle(state, endpoint, path, query)
                },
            ),
        );
    }

    router
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy: exact-match origin allow-list, `GET`/`OPTIONS` only.
///
/// Origins that are not valid header values are skipped with a warning.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .expose_headers([CONTENT_TYPE, X_DATABASE])
        .allow_credentials(false)
        .max_age(CORS_MAX_AGE)
}
