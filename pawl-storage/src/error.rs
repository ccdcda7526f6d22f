//! Storage and migration error types

use pawl_core::{PlanError, Version};
use pawl_sql::SqlError;
use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result type for migrator operations
pub type MigrationResult<T> = std::result::Result<T, MigrationError>;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Connection-related errors
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution errors
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction errors
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Another session holds a lock this one needs
    #[error("Concurrency conflict: {0}")]
    ConcurrencyError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic storage errors
    #[error("Storage error: {0}")]
    Other(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Configuration(_) => StorageError::ConfigError(error.to_string()),
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StorageError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::Database(_) | sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StorageError::QueryFailed(error.to_string())
            }
            _ => StorageError::Other(error.to_string()),
        }
    }
}

impl StorageError {
    /// Get error code for reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::ConfigError(_) => "CONFIG_ERROR",
            StorageError::ConnectionFailed(_) => "CONNECTION_ERROR",
            StorageError::QueryFailed(_) => "QUERY_ERROR",
            StorageError::TransactionFailed(_) => "TRANSACTION_ERROR",
            StorageError::ConcurrencyError(_) => "CONCURRENCY_ERROR",
            _ => "STORAGE_ERROR",
        }
    }
}

/// Errors that abort a migrator run
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The requested operation cannot be planned
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// A migration described a schema change the adapter cannot render
    #[error(transparent)]
    Sql(#[from] SqlError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Two discovered migrations share a version number
    #[error("Migrations '{first}' and '{second}' both have version {version}")]
    DuplicateVersion {
        version: Version,
        first: String,
        second: String,
    },

    /// Two discovered migrations share a description
    #[error("Migrations {first} and {second} both have the description '{description}'")]
    DuplicateDescription {
        description: String,
        first: Version,
        second: Version,
    },

    /// An installed migration must be removed but its implementation is gone
    #[error("Cannot remove migration {0}: no implementation is available")]
    MissingMigrationImplementation(Version),

    /// A migration cannot undo its effect
    #[error("Irreversible migration: {0}")]
    Irreversible(String),

    /// The version table holds a value that is not a version number
    #[error("Corrupt version table entry: {0}")]
    CorruptVersion(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MigrationError {
    /// Get error code for reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            MigrationError::Plan(error) => error.error_code(),
            MigrationError::Sql(error) => error.error_code(),
            MigrationError::Storage(error) => error.error_code(),
            MigrationError::DuplicateVersion { .. } => "DUPLICATE_MIGRATION_VERSION",
            MigrationError::DuplicateDescription { .. } => "DUPLICATE_MIGRATION_DESCRIPTION",
            MigrationError::MissingMigrationImplementation(_) => "MISSING_MIGRATION_IMPLEMENTATION",
            MigrationError::Irreversible(_) => "IRREVERSIBLE_MIGRATION",
            MigrationError::CorruptVersion(_) => "CORRUPT_VERSION",
            MigrationError::Other(_) => "MIGRATION_ERROR",
        }
    }
}
