//! Command-line and environment configuration.
//!
//! Every flag falls back to an environment variable and then to a
//! built-in default:
//!
//! | Flag | Env | Default |
//! |------|-----|---------|
//! | `-R, --max-rows` | `BANQ_MAX_ROWS` | `90` |
//! | `-P, --db-path` | `BANQ_DB_PATH` | `/srv/db` |
//! | `-p, --port` | `BANQ_PORT` | `8001` |
//! | `--host` | `BANQ_HOST` | `0.0.0.0` |
//! | `-O, --cors-origins` | `BANQ_CORS_ORIGINS` | the production origins |

use std::path::PathBuf;

use clap::Parser;

use crate::server::ServerConfig;

/// Default row cap per query.
pub const DEFAULT_MAX_ROWS: u32 = 90;

/// Default storage directory.
pub const DEFAULT_DB_PATH: &str = "/srv/db";

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8001;

/// Origins allowed when `--cors-origins` is not given.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "https://www.xpowermine.com",
    "https://www.xpowerbanq.com",
    "http://localhost:5173",
];

/// Errors that can occur when building the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `--cors-origins` is not a JSON array of strings.
    #[error("invalid JSON array for CORS origins: {0}")]
    CorsOrigins(#[from] serde_json::Error),
}

/// XPower Banq API server.
#[derive(Debug, Parser)]
#[command(name = "banq-api", about = "XPower Banq API Server")]
pub struct Cli {
    /// Maximum number of rows to return per query.
    #[arg(
        short = 'R',
        long,
        env = "BANQ_MAX_ROWS",
        default_value_t = DEFAULT_MAX_ROWS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_rows: u32,

    /// Path to the database directory.
    #[arg(short = 'P', long, env = "BANQ_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// HTTP server listen port.
    #[arg(short = 'p', long, env = "BANQ_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// HTTP server bind address.
    #[arg(long, env = "BANQ_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// CORS allowed origins as JSON array (e.g. `["https://example.com"]`).
    #[arg(short = 'O', long, env = "BANQ_CORS_ORIGINS")]
    pub cors_origins: Option<String>,
}

/// Effective service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Row cap bound into every report query.
    pub max_rows: u32,
    /// Storage directory holding the `*.db` archives.
    pub db_path: PathBuf,
    /// Bind address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            cors_origins: default_cors_origins(),
        }
    }
}

impl ApiConfig {
    /// Server settings derived from this configuration.
    pub fn server(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origins: self.cors_origins.clone(),
        }
    }
}

impl TryFrom<Cli> for ApiConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let cors_origins = match cli.cors_origins.as_deref() {
            Some(json) => parse_cors_origins(json)?,
            None => default_cors_origins(),
        };

        Ok(Self {
            max_rows: cli.max_rows,
            db_path: cli.db_path,
            host: cli.host,
            port: cli.port,
            cors_origins,
        })
    }
}

/// Parse a JSON array of origin strings, dropping duplicates.
///
/// # Errors
///
/// Returns [`ConfigError::CorsOrigins`] if `json` is not an array of
/// strings.
pub fn parse_cors_origins(json: &str) -> Result<Vec<String>, ConfigError> {
    let mut origins: Vec<String> = serde_json::from_str(json)?;
    origins.sort();
    origins.dedup();
    Ok(origins)
}

fn default_cors_origins() -> Vec<String> {
    DEFAULT_CORS_ORIGINS.iter().map(|&o| o.to_owned()).collect()
}
