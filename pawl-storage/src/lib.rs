//! Database sessions, version bookkeeping and the migration executor
//!
//! The [`Migrator`] locks the version table, reads the installed versions,
//! asks a [`MigrationProvider`] for the available ones, plans the requested
//! [`MigratorOperation`](pawl_core::MigratorOperation) and runs each
//! [`Migration`] through a [`MigrationContext`].

pub mod connection;
pub mod error;
pub mod logging;
pub mod migration;
pub mod migrator;
pub mod provider;
pub mod sqlite;
pub mod unit_of_work;
pub mod version_store;

// Re-export core types for convenience
pub use connection::{Connection, ConnectionManager, Row};
pub use error::{MigrationError, MigrationResult, StorageError, StorageResult};
pub use logging::LoggingConnection;
pub use migration::{Migration, MigrationContext};
pub use migrator::{MigrationReport, Migrator};
pub use provider::{AvailableMigration, MigrationFactory, MigrationProvider, MigrationRegistry};
pub use sqlite::SqliteConnectionManager;
pub use unit_of_work::with_commit_behavior;
pub use version_store::{CreateSchemaMigrationsTable, VersionStore, DEFAULT_VERSION_TABLE};

use pawl_config::DatabaseConfig;
use pawl_sql::Vendor;
use std::sync::Arc;

/// Open a connection manager for the configured database
pub fn create_connection_manager(config: &DatabaseConfig) -> StorageResult<Arc<dyn ConnectionManager>> {
    match config.vendor {
        Vendor::Sqlite => Ok(Arc::new(SqliteConnectionManager::new(
            &config.url,
            config.busy_timeout(),
        )?)),
        vendor => Err(StorageError::ConfigError(format!(
            "No {} driver is available; only SQLite databases can be migrated directly",
            vendor
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connection_manager_from_config() {
        let manager = create_connection_manager(&DatabaseConfig::default()).unwrap();
        assert!(manager.health_check().await.unwrap());
        manager.close().await.unwrap();
    }

    #[test]
    fn test_other_vendors_need_a_driver() {
        let config = DatabaseConfig {
            url: "postgres://localhost/app".to_string(),
            vendor: Vendor::Postgresql,
            ..Default::default()
        };
        let error = create_connection_manager(&config).err().unwrap();
        assert_eq!(error.error_code(), "CONFIG_ERROR");
    }
}
