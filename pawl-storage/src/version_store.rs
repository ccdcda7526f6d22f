//! Persisted record of installed migration versions

use async_trait::async_trait;
use pawl_core::Version;
use pawl_sql::naming::unique_index_name;
use pawl_sql::{ColumnOption, DatabaseAdapter, IndexOption};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::connection::Connection;
use crate::migration::{Migration, MigrationContext};
use crate::{MigrationError, MigrationResult, StorageError, StorageResult};

/// Default name of the version table
pub const DEFAULT_VERSION_TABLE: &str = "schema_migrations";

/// Name of the single column of the version table
pub const VERSION_COLUMN: &str = "version";

/// Reads and writes the version table
#[derive(Debug, Clone)]
pub struct VersionStore {
    table: String,
    adapter: Arc<dyn DatabaseAdapter>,
}

impl VersionStore {
    pub fn new(table: impl Into<String>, adapter: Arc<dyn DatabaseAdapter>) -> Self {
        Self {
            table: table.into(),
            adapter,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Whether the version table exists. Names are compared ignoring case
    /// since vendors fold unquoted names differently.
    pub async fn table_exists(&self, connection: &dyn Connection) -> StorageResult<bool> {
        Ok(connection
            .table_names()
            .await?
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&self.table)))
    }

    /// Take the exclusive lock on the version table for the current
    /// transaction. Returns `false` when another session still holds it
    /// after the driver's own wait has run out.
    pub async fn try_lock(&self, connection: &dyn Connection) -> StorageResult<bool> {
        match connection
            .execute(&self.adapter.lock_table_sql(&self.table), &[])
            .await
        {
            Ok(_) => Ok(true),
            Err(StorageError::ConcurrencyError(message)) => {
                debug!("Version table {} is locked: {}", self.table, message);
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }

    pub async fn installed_versions(
        &self,
        connection: &dyn Connection,
    ) -> MigrationResult<BTreeSet<Version>> {
        let sql = format!(
            "SELECT {} FROM {}",
            self.adapter.quote_identifier(VERSION_COLUMN),
            self.adapter.quote_table_name(&self.table)
        );

        connection
            .fetch_all(&sql, &[])
            .await?
            .into_iter()
            .map(|row| parse_version(row.into_iter().next().map(|(_, value)| value)))
            .collect()
    }

    pub async fn record_install(
        &self,
        connection: &dyn Connection,
        version: Version,
    ) -> StorageResult<()> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.adapter.quote_table_name(&self.table),
            self.adapter.quote_identifier(VERSION_COLUMN),
            self.adapter.parameter_placeholder(1)
        );
        connection
            .execute(&sql, &[Value::String(version.to_string())])
            .await?;
        Ok(())
    }

    pub async fn record_remove(
        &self,
        connection: &dyn Connection,
        version: Version,
    ) -> StorageResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            self.adapter.quote_table_name(&self.table),
            self.adapter.quote_identifier(VERSION_COLUMN),
            self.adapter.parameter_placeholder(1)
        );
        connection
            .execute(&sql, &[Value::String(version.to_string())])
            .await?;
        Ok(())
    }
}

fn parse_version(value: Option<Value>) -> MigrationResult<Version> {
    match value {
        Some(Value::String(text)) => text
            .trim()
            .parse()
            .map_err(|_| MigrationError::CorruptVersion(text)),
        Some(Value::Number(number)) => number
            .as_i64()
            .ok_or_else(|| MigrationError::CorruptVersion(number.to_string())),
        Some(other) => Err(MigrationError::CorruptVersion(other.to_string())),
        None => Err(MigrationError::CorruptVersion("missing version column".to_string())),
    }
}

/// Creates the version table. It cannot be removed again.
#[derive(Debug, Clone)]
pub struct CreateSchemaMigrationsTable {
    table: String,
}

impl CreateSchemaMigrationsTable {
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into() }
    }
}

#[async_trait]
impl Migration for CreateSchemaMigrationsTable {
    async fn up(&self, context: &MigrationContext) -> MigrationResult<()> {
        context
            .create_table(&self.table, |table| {
                table.varchar(VERSION_COLUMN, [ColumnOption::limit(32)?, ColumnOption::NotNull])?;
                Ok(())
            })
            .await?;
        context
            .add_index(
                &self.table,
                &[VERSION_COLUMN],
                &[IndexOption::Unique, IndexOption::Name(unique_index_name(&self.table))],
            )
            .await
    }

    async fn down(&self, _context: &MigrationContext) -> MigrationResult<()> {
        Err(MigrationError::Irreversible(format!(
            "the version table '{}' cannot be removed by a migration",
            self.table
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionManager;
    use crate::sqlite::SqliteConnectionManager;
    use pawl_sql::{create_adapter, TracingSink, Vendor};
    use serde_json::json;
    use std::time::Duration;

    async fn setup() -> (VersionStore, MigrationContext) {
        let connection = SqliteConnectionManager::new("sqlite::memory:", Duration::from_secs(1))
            .unwrap()
            .get_connection()
            .await
            .unwrap();
        let adapter = create_adapter(Vendor::Sqlite, None, Arc::new(TracingSink));
        let store = VersionStore::new(DEFAULT_VERSION_TABLE, adapter.clone());
        (store, MigrationContext::new(connection.clone(), connection, adapter))
    }

    #[tokio::test]
    async fn test_bootstrap_and_record_versions() {
        let (store, context) = setup().await;
        assert!(!store.table_exists(context.connection()).await.unwrap());

        CreateSchemaMigrationsTable::new(DEFAULT_VERSION_TABLE).up(&context).await.unwrap();
        assert!(store.table_exists(context.connection()).await.unwrap());

        store.record_install(context.connection(), 2).await.unwrap();
        store.record_install(context.connection(), 10).await.unwrap();
        store.record_install(context.connection(), 1).await.unwrap();
        let installed = store.installed_versions(context.connection()).await.unwrap();
        assert_eq!(installed.into_iter().collect::<Vec<_>>(), vec![1, 2, 10]);

        store.record_remove(context.connection(), 10).await.unwrap();
        let installed = store.installed_versions(context.connection()).await.unwrap();
        assert_eq!(installed.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_versions_are_unique() {
        let (store, context) = setup().await;
        CreateSchemaMigrationsTable::new(DEFAULT_VERSION_TABLE).up(&context).await.unwrap();

        store.record_install(context.connection(), 1).await.unwrap();
        assert!(store.record_install(context.connection(), 1).await.is_err());
    }

    #[tokio::test]
    async fn test_table_exists_ignores_case() {
        let (_, context) = setup().await;
        context.execute("CREATE TABLE SCHEMA_MIGRATIONS (version VARCHAR(32))").await.unwrap();

        let store = VersionStore::new("schema_migrations", create_adapter(Vendor::Sqlite, None, Arc::new(TracingSink)));
        assert!(store.table_exists(context.connection()).await.unwrap());
    }

    #[tokio::test]
    async fn test_lock_inside_transaction() {
        let (store, context) = setup().await;
        CreateSchemaMigrationsTable::new(DEFAULT_VERSION_TABLE).up(&context).await.unwrap();

        context.connection().begin().await.unwrap();
        assert!(store.try_lock(context.connection()).await.unwrap());
        context.connection().commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_lock_held_by_another_session() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("pawl.db").display());
        let manager = SqliteConnectionManager::new(&url, Duration::from_millis(50)).unwrap();
        let adapter = create_adapter(Vendor::Sqlite, None, Arc::new(TracingSink));
        let store = VersionStore::new(DEFAULT_VERSION_TABLE, adapter.clone());

        let holder = manager.get_connection().await.unwrap();
        let context = MigrationContext::new(holder.clone(), holder.clone(), adapter);
        CreateSchemaMigrationsTable::new(DEFAULT_VERSION_TABLE).up(&context).await.unwrap();
        holder.begin().await.unwrap();
        assert!(store.try_lock(holder.as_ref()).await.unwrap());

        let waiter = manager.get_connection().await.unwrap();
        waiter.begin().await.unwrap();
        assert!(!store.try_lock(waiter.as_ref()).await.unwrap());
        waiter.commit().await.unwrap();

        holder.commit().await.unwrap();
        waiter.begin().await.unwrap();
        assert!(store.try_lock(waiter.as_ref()).await.unwrap());
        waiter.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_bootstrap_is_irreversible() {
        let (_, context) = setup().await;
        let error = CreateSchemaMigrationsTable::new(DEFAULT_VERSION_TABLE)
            .down(&context)
            .await
            .unwrap_err();
        assert_eq!(error.error_code(), "IRREVERSIBLE_MIGRATION");
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version(Some(json!("42"))).unwrap(), 42);
        assert_eq!(parse_version(Some(json!(7))).unwrap(), 7);
        assert!(matches!(
            parse_version(Some(json!("seven"))),
            Err(MigrationError::CorruptVersion(_))
        ));
        assert!(parse_version(None).is_err());
    }
}
