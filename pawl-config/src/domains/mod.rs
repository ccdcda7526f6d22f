//! Domain-specific configuration modules

pub mod database;
pub mod logging;
pub mod migrations;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Pawl configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PawlConfig {
    /// Target database
    #[serde(default)]
    pub database: database::DatabaseConfig,

    /// Version table and migration scope
    #[serde(default)]
    pub migrations: migrations::MigrationsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl PawlConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.database.validate()?;
        self.migrations.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> ConfigResult<String> {
        Ok(serde_yaml::to_string(&Self::default())?)
    }
}
