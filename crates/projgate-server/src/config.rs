//! Configuration management for the projgate access service.
//!
//! Configuration is loaded from multiple sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables (override)
//!
//! Environment variables take precedence over config file values, which take
//! precedence over defaults.
//!
//! # Example
//!
//! ```ignore
//! use projgate_server::config::ServerConfig;
//!
//! // Load from file with env overrides
//! let config = ServerConfig::load("projgate.yaml")?;
//!
//! // Or load from environment only
//! let config = ServerConfig::from_env()?;
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::Level;

use projgate_domain::cache::AccessCacheConfig;
use projgate_domain::resolver::ResolverConfig;

use crate::logging::{LogFormat, LoggingConfig};

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    /// Resolver settings
    #[serde(default)]
    pub resolver: ResolverSettings,

    /// Access cache settings
    #[serde(default)]
    pub cache: CacheSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Resolver settings.
///
/// Environment variables:
/// - `PROJGATE_RESOLVER__QUERY_TIMEOUT_MS=2000`
/// - `PROJGATE_RESOLVER__CONCURRENT_QUERIES=false`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ResolverSettings {
    /// Timeout for each data-access query in milliseconds
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Issue independent source queries concurrently
    #[serde(default = "default_true")]
    pub concurrent_queries: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            query_timeout_ms: default_query_timeout_ms(),
            concurrent_queries: true,
        }
    }
}

impl ResolverSettings {
    pub fn to_resolver_config(&self) -> ResolverConfig {
        ResolverConfig::default()
            .with_query_timeout(Duration::from_millis(self.query_timeout_ms))
            .with_concurrent_queries(self.concurrent_queries)
    }
}

fn default_query_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

/// Access cache settings.
///
/// Caching is off unless explicitly enabled; see `projgate_domain::cache`
/// for the staleness rules.
///
/// ```yaml
/// cache:
///   enabled: true
///   max_capacity: 50000
///   ttl_secs: 15
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CacheSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Maximum number of cached users
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,

    /// Entry time-to-live in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl CacheSettings {
    pub fn to_cache_config(&self) -> AccessCacheConfig {
        AccessCacheConfig::default()
            .with_enabled(self.enabled)
            .with_max_capacity(self.max_capacity)
            .with_ttl(Duration::from_secs(self.ttl_secs))
    }
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_cache_ttl() -> u64 {
    30
}

/// Logging settings.
///
/// ```yaml
/// logging:
///   level: debug
///   format: json
///   span_events: true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Level for the projgate crates: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "pretty" for development, "json" for production
    #[serde(default)]
    pub format: LogFormat,

    /// Log span open/close events with timings
    #[serde(default)]
    pub span_events: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            span_events: false,
        }
    }
}

impl LoggingSettings {
    /// Converts to a logging configuration. Unknown levels fall back to INFO.
    pub fn to_logging_config(&self) -> LoggingConfig {
        let level = self.level.parse::<Level>().unwrap_or(Level::INFO);
        LoggingConfig::default()
            .with_format(self.format)
            .with_level(level)
            .with_span_events(self.span_events)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `PROJGATE_` and use `__` as separator:
    /// - `PROJGATE_CACHE__ENABLED=true` overrides `cache.enabled`
    /// - `PROJGATE_LOGGING__LEVEL=debug` overrides `logging.level`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(
                Environment::with_prefix("PROJGATE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(
                Environment::with_prefix("PROJGATE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.resolver.query_timeout_ms == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "resolver.query_timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.cache.enabled && self.cache.max_capacity == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "cache.max_capacity must be greater than 0 when caching is enabled"
                    .to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_can_load_config_from_yaml_file() {
        let file = yaml_file(
            r#"
resolver:
  query_timeout_ms: 1500
  concurrent_queries: false

cache:
  enabled: true
  max_capacity: 500
  ttl_secs: 5

logging:
  level: debug
  format: json
  span_events: true
"#,
        );

        let config = ServerConfig::load(file.path()).unwrap();

        assert_eq!(config.resolver.query_timeout_ms, 1500);
        assert!(!config.resolver.concurrent_queries);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_capacity, 500);
        assert_eq!(config.cache.ttl_secs, 5);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.logging.span_events);
    }

    #[test]
    #[serial]
    fn test_partial_yaml_keeps_defaults() {
        let file = yaml_file(
            r#"
logging:
  level: warn
"#,
        );

        let config = ServerConfig::load(file.path()).unwrap();

        assert_eq!(config.resolver, ResolverSettings::default());
        assert_eq!(config.cache, CacheSettings::default());
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    #[serial]
    fn test_can_override_config_with_env_vars() {
        let file = yaml_file(
            r#"
resolver:
  query_timeout_ms: 1500
cache:
  enabled: false
"#,
        );

        std::env::set_var("PROJGATE_RESOLVER__QUERY_TIMEOUT_MS", "250");
        std::env::set_var("PROJGATE_CACHE__ENABLED", "true");

        let result = ServerConfig::load(file.path());

        std::env::remove_var("PROJGATE_RESOLVER__QUERY_TIMEOUT_MS");
        std::env::remove_var("PROJGATE_CACHE__ENABLED");

        let config = result.unwrap();
        assert_eq!(config.resolver.query_timeout_ms, 250);
        assert!(config.cache.enabled);
    }

    #[test]
    #[serial]
    fn test_from_env_uses_defaults() {
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    #[serial]
    fn test_missing_file_is_reported() {
        let result = ServerConfig::load("/nonexistent/projgate.yaml");
        assert!(matches!(result, Err(ConfigLoadError::FileNotFound { .. })));
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut config = ServerConfig::default();
        config.resolver.query_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigLoadError::Invalid { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_zero_capacity_only_when_enabled() {
        let mut config = ServerConfig::default();
        config.cache.max_capacity = 0;
        assert!(config.validate().is_ok());

        config.cache.enabled = true;
        assert!(matches!(
            config.validate(),
            Err(ConfigLoadError::Invalid { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_unknown_log_level() {
        let mut config = ServerConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigLoadError::Invalid { .. })
        ));
    }

    #[test]
    fn test_settings_convert_to_component_configs() {
        let config = ServerConfig::default();

        let resolver = config.resolver.to_resolver_config();
        assert_eq!(resolver.query_timeout, Duration::from_millis(5000));
        assert!(resolver.concurrent_queries);

        let cache = config.cache.to_cache_config();
        assert!(!cache.enabled);
        assert_eq!(cache.max_capacity, 10_000);
        assert_eq!(cache.ttl, Duration::from_secs(30));

        let logging = LoggingSettings {
            level: "debug".to_string(),
            format: LogFormat::Json,
            span_events: true,
        }
        .to_logging_config();
        assert_eq!(logging.format, LogFormat::Json);
        assert_eq!(logging.level, Level::DEBUG);
        assert!(logging.span_events);

        let logging = LoggingSettings::default().to_logging_config();
        assert_eq!(logging, LoggingConfig::default());
    }
}
