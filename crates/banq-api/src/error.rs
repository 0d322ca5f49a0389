//! Error types for the query API.
//!
//! [`ApiError`] is the only error that reaches clients. Its display text
//! is the complete client-visible message, so variants above the
//! validation layer carry no detail at all: driver errors, paths and SQL
//! are logged where they happen and never travel in the response.
//! [`AppError`] aggregates the fatal failures of the binary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::params::ParamError;

/// Errors that can occur while serving a request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad database name or date parameter.
    #[error("{0}")]
    BadRequest(#[from] ParamError),

    /// The request could not be decoded (path or query string).
    #[error("Invalid request")]
    InvalidRequest,

    /// The database is missing or failed to open.
    #[error("Database not available")]
    DatabaseUnavailable,

    /// The query could not be prepared or executed.
    #[error("Query failed")]
    QueryFailed,

    /// The result rows could not be read.
    #[error("Data processing error")]
    ProcessingFailed,

    /// No route matched.
    #[error("Not found")]
    NotFound,

    /// The route exists but not for this method.
    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::DatabaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::QueryFailed | Self::ProcessingFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Generic, client-safe message.
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), axum::Json(body)).into_response()
    }
}

/// Fatal errors of the `banq-api` binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The command line or environment configuration is invalid.
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Storage validation failed; the server must not start.
    #[error("database validation failed: {0}")]
    Startup(#[from] banq_db::StartupError),

    /// The HTTP server failed to bind or serve.
    #[error("server error: {0}")]
    Server(#[from] crate::server::ServerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let bad = ApiError::from(ParamError::MissingParam(String::from("lhs")));
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::DatabaseUnavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::QueryFailed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::ProcessingFailed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn messages_are_generic() {
        assert_eq!(ApiError::DatabaseUnavailable.to_string(), "Database not available");
        assert_eq!(ApiError::QueryFailed.to_string(), "Query failed");
        assert_eq!(ApiError::ProcessingFailed.to_string(), "Data processing error");
        assert_eq!(
            ApiError::from(ParamError::MissingParam(String::from("rhs"))).to_string(),
            "Missing required parameter: rhs"
        );
    }
}
