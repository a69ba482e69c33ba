//! services/api/src/error.rs
//!
//! Startup errors for the `journal-api` binary. Request-time failures are
//! mapped to status codes in `web::rest` instead.

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Connecting to Postgres or applying migrations failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The weather HTTP client could not be built (e.g. TLS backend setup).
    #[error("Weather client error: {0}")]
    WeatherClient(#[from] reqwest::Error),

    /// Binding or serving the listener failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_errors_name_their_source() {
        let err = ApiError::from(ConfigError::InvalidValue("BIND_ADDR".into(), "nope".into()));
        assert!(err.to_string().starts_with("Configuration error:"));

        let err = ApiError::from(std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken"));
        assert_eq!(err.to_string(), "IO error: taken");
    }
}
