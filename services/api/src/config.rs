//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where entries and patterns are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { database_url: String, max_connections: u32 },
    Memory,
}

/// Where to ask for the current weather.
#[derive(Clone, Debug, PartialEq)]
pub enum WeatherLocation {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

#[derive(Clone, Debug)]
pub struct WeatherConfig {
    /// Without a key the weather source is disabled and entries are saved bare.
    pub api_key: Option<String>,
    pub base_url: String,
    pub location: WeatherLocation,
    pub timeout: Duration,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub storage: StorageBackend,
    pub weather: WeatherConfig,
    pub cors_origin: String,
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any name -> value lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Empty values count as unset.
        let var = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        // --- Server Settings ---
        let bind_address = parse_var::<SocketAddr>(
            "BIND_ADDRESS",
            &var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        )?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Storage Settings ---
        let backend = var("STORAGE_BACKEND").unwrap_or_else(|| "postgres".to_string());
        let storage = match backend.to_lowercase().as_str() {
            "postgres" => StorageBackend::Postgres {
                database_url: var("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
                max_connections: match var("DATABASE_MAX_CONNECTIONS") {
                    Some(raw) => parse_var("DATABASE_MAX_CONNECTIONS", &raw)?,
                    None => 5,
                },
            },
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORAGE_BACKEND".to_string(),
                    format!("'{}' is not one of postgres, memory", other),
                ))
            }
        };

        // --- Weather Settings ---
        let location = match (var("WEATHER_LAT"), var("WEATHER_LON")) {
            (Some(lat), Some(lon)) => WeatherLocation::Coordinates {
                lat: parse_var("WEATHER_LAT", &lat)?,
                lon: parse_var("WEATHER_LON", &lon)?,
            },
            _ => WeatherLocation::City(var("WEATHER_CITY").unwrap_or_else(|| "London".to_string())),
        };
        let timeout_secs: u64 = match var("WEATHER_TIMEOUT_SECS") {
            Some(raw) => parse_var("WEATHER_TIMEOUT_SECS", &raw)?,
            None => 10,
        };
        let weather = WeatherConfig {
            api_key: var("WEATHER_API_KEY"),
            base_url: var("WEATHER_BASE_URL").unwrap_or_else(|| DEFAULT_WEATHER_URL.to_string()),
            location,
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            bind_address,
            log_level,
            storage,
            weather,
            cors_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn postgres_requires_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref v) if v == "DATABASE_URL"));
    }

    #[test]
    fn defaults_with_memory_backend() {
        let config = load(&[("STORAGE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.weather.api_key, None);
        assert_eq!(config.weather.location, WeatherLocation::City("London".into()));
        assert_eq!(config.weather.timeout, Duration::from_secs(10));
        assert_eq!(config.weather.base_url, DEFAULT_WEATHER_URL);
    }

    #[test]
    fn coordinates_take_precedence_over_city() {
        let config = load(&[
            ("STORAGE_BACKEND", "memory"),
            ("WEATHER_CITY", "Oslo"),
            ("WEATHER_LAT", "59.91"),
            ("WEATHER_LON", "10.75"),
        ])
        .unwrap();
        assert_eq!(
            config.weather.location,
            WeatherLocation::Coordinates {
                lat: 59.91,
                lon: 10.75
            }
        );
    }

    #[test]
    fn postgres_settings_are_read() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/journal"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("WEATHER_API_KEY", "secret"),
        ])
        .unwrap();
        assert_eq!(
            config.storage,
            StorageBackend::Postgres {
                database_url: "postgres://localhost/journal".into(),
                max_connections: 12
            }
        );
        assert_eq!(config.weather.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = load(&[("STORAGE_BACKEND", "csv")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "STORAGE_BACKEND"));

        let err = load(&[("STORAGE_BACKEND", "memory"), ("WEATHER_TIMEOUT_SECS", "soon")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "WEATHER_TIMEOUT_SECS"));

        let err = load(&[("STORAGE_BACKEND", "memory"), ("BIND_ADDRESS", "nowhere")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "BIND_ADDRESS"));
    }
}
