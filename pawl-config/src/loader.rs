//! Configuration loading and environment variable handling

use crate::domains::PawlConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "PAWL".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<PawlConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: PawlConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<PawlConfig> {
        let mut config = PawlConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<PawlConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut PawlConfig) -> ConfigResult<()> {
        self.apply_database_overrides(&mut config.database)?;
        self.apply_migrations_overrides(&mut config.migrations);
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_database_overrides(
        &self,
        config: &mut crate::domains::database::DatabaseConfig,
    ) -> ConfigResult<()> {
        if let Ok(url) = self.get_env_var("DATABASE_URL") {
            config.url = url;
        }

        if let Ok(vendor) = self.get_env_var("DATABASE_VENDOR") {
            config.vendor = pawl_sql::Vendor::from_str(&vendor)
                .map_err(|e| ConfigError::EnvError(format!("Invalid DATABASE_VENDOR: {}", e)))?;
        }

        if let Ok(schema) = self.get_env_var("DATABASE_SCHEMA") {
            config.schema = if schema.is_empty() { None } else { Some(schema) };
        }

        if let Ok(timeout) = self.get_env_var("DATABASE_BUSY_TIMEOUT_MS") {
            config.busy_timeout_ms = timeout.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid DATABASE_BUSY_TIMEOUT_MS: {}", e))
            })?;
        }

        Ok(())
    }

    fn apply_migrations_overrides(&self, config: &mut crate::domains::migrations::MigrationsConfig) {
        if let Ok(table) = self.get_env_var("MIGRATIONS_TABLE") {
            config.table_name = table;
        }

        if let Ok(scope) = self.get_env_var("MIGRATIONS_SCOPE") {
            config.scope = scope;
        }
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        if let Ok(threshold) = self.get_env_var("SLOW_STATEMENT_MS") {
            config.slow_statement_ms = threshold.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid SLOW_STATEMENT_MS: {}", e))
            })?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::logging::LogLevel;
    use pawl_sql::Vendor;
    use std::io::Write;

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars_unset(
            ["PAWL_DATABASE_URL", "PAWL_DATABASE_VENDOR", "PAWL_LOG_LEVEL"],
            || {
                let config = ConfigLoader::new().from_env().unwrap();
                assert_eq!(config.database.url, "sqlite::memory:");
                assert_eq!(config.migrations.table_name, "schema_migrations");
            },
        );
    }

    #[test]
    fn test_env_overrides() {
        temp_env::with_vars(
            [
                ("PAWL_DATABASE_URL", Some("postgres://localhost/app")),
                ("PAWL_DATABASE_VENDOR", Some("postgresql")),
                ("PAWL_DATABASE_SCHEMA", Some("app")),
                ("PAWL_MIGRATIONS_TABLE", Some("app_versions")),
                ("PAWL_MIGRATIONS_SCOPE", Some("app::migrations")),
                ("PAWL_LOG_LEVEL", Some("debug")),
                ("PAWL_SLOW_STATEMENT_MS", Some("250")),
            ],
            || {
                let config = ConfigLoader::new().from_env().unwrap();
                assert_eq!(config.database.vendor, Vendor::Postgresql);
                assert_eq!(config.database.schema.as_deref(), Some("app"));
                assert_eq!(config.migrations.table_name, "app_versions");
                assert_eq!(config.migrations.scope, "app::migrations");
                assert_eq!(config.logging.level, LogLevel::Debug);
                assert_eq!(config.logging.slow_statement_ms, 250);
            },
        );
    }

    #[test]
    fn test_invalid_env_value() {
        temp_env::with_var("PAWL_DATABASE_VENDOR", Some("sybase"), || {
            let result = ConfigLoader::new().from_env();
            assert!(matches!(result, Err(ConfigError::EnvError(_))));
        });
    }

    #[test]
    fn test_mismatched_vendor_fails_validation() {
        temp_env::with_vars(
            [
                ("PAWL_DATABASE_URL", Some("sqlite://app.db")),
                ("PAWL_DATABASE_VENDOR", Some("mysql")),
            ],
            || {
                let result = ConfigLoader::new().from_env();
                assert!(matches!(result, Err(ConfigError::DomainError { .. })));
            },
        );
    }

    #[test]
    fn test_from_file_with_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database:\n  url: \"sqlite://app.db\"\n  vendor: sqlite\nmigrations:\n  table_name: versions\nlogging:\n  level: warn"
        )
        .unwrap();

        temp_env::with_var("PAWL_MIGRATIONS_TABLE", Some("versions_override"), || {
            let config = ConfigLoader::new().from_file(file.path()).unwrap();
            assert_eq!(config.database.url, "sqlite://app.db");
            assert_eq!(config.migrations.table_name, "versions_override");
            assert_eq!(config.logging.level, LogLevel::Warn);
        });
    }

    #[test]
    fn test_custom_prefix() {
        temp_env::with_var("MYAPP_MIGRATIONS_TABLE", Some("custom"), || {
            let config = ConfigLoader::with_prefix("MYAPP").from_env().unwrap();
            assert_eq!(config.migrations.table_name, "custom");
        });
    }
}
