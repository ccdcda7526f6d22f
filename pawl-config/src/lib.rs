//! Configuration for the Pawl migration engine
//!
//! Configuration is split by domain (database, migrations, logging). Each
//! domain validates itself through [`Validatable`]. [`ConfigLoader`] reads
//! YAML and applies `PAWL_`-prefixed environment overrides.

pub mod domains;
pub mod error;
pub mod loader;
pub mod validation;

pub use domains::{
    database::DatabaseConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    migrations::MigrationsConfig,
    PawlConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;
