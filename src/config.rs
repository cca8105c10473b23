//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Environment (development, production)
    pub environment: String,

    /// Deadline applied to every unit of work; `None` disables it
    pub unit_of_work_timeout: Option<Duration>,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let timeout_ms: u64 = lookup("UNIT_OF_WORK_TIMEOUT_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("UNIT_OF_WORK_TIMEOUT_MS"))?;
        let unit_of_work_timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(_) => return Err(ConfigError::InvalidValue("LOG_FORMAT")),
        };

        Ok(Self {
            database_url,
            database_max_connections,
            environment,
            unit_of_work_timeout,
            log_format,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/wallet")]).unwrap();

        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.environment, "development");
        assert_eq!(config.unit_of_work_timeout, Some(Duration::from_millis(5000)));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.is_production());
    }

    #[test]
    fn test_missing_database_url() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingEnv("DATABASE_URL"))));
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/wallet"),
            ("UNIT_OF_WORK_TIMEOUT_MS", "0"),
            ("LOG_FORMAT", "json"),
            ("ENVIRONMENT", "production"),
        ])
        .unwrap();

        assert_eq!(config.unit_of_work_timeout, None);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.is_production());
    }

    #[test]
    fn test_invalid_values() {
        let result = load(&[
            ("DATABASE_URL", "postgres://localhost/wallet"),
            ("DATABASE_MAX_CONNECTIONS", "many"),
        ]);
        assert!(matches!(result, Err(ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))));

        let result = load(&[
            ("DATABASE_URL", "postgres://localhost/wallet"),
            ("LOG_FORMAT", "xml"),
        ]);
        assert!(matches!(result, Err(ConfigError::InvalidValue("LOG_FORMAT"))));
    }
}
