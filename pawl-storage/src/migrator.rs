//! The migration executor

use pawl_config::PawlConfig;
use pawl_core::{plan, CommitBehavior, MigrationPlan, MigrationStatuses, MigratorOperation, Version};
use pawl_sql::DatabaseAdapter;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::connection::{Connection, ConnectionManager};
use crate::logging::LoggingConnection;
use crate::migration::{Migration, MigrationContext};
use crate::provider::{AvailableMigration, MigrationProvider};
use crate::unit_of_work::with_commit_behavior;
use crate::version_store::{CreateSchemaMigrationsTable, VersionStore, DEFAULT_VERSION_TABLE};
use crate::{create_connection_manager, MigrationError, MigrationResult, StorageError};

const LOCK_RETRY_BASE_DELAY: Duration = Duration::from_millis(50);
const LOCK_RETRY_MAX_DELAY: Duration = Duration::from_secs(2);

/// What a migrator run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Whether this run created the version table
    pub version_table_created: bool,

    /// Versions removed, in the order they were removed
    pub removed: Vec<Version>,

    /// Versions installed, in the order they were installed
    pub installed: Vec<Version>,
}

impl MigrationReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.installed.is_empty()
    }
}

/// Plans and runs migrations against one database.
///
/// A run holds an exclusive lock on the version table from the moment the
/// installed versions are read until the last migration is recorded, so
/// concurrent runs against the same database are serialised. A run that
/// finds the lock taken waits until the holder's transaction ends. Each
/// migration's version row is written as soon as the migration succeeds,
/// and the locked transaction is committed even when a later migration
/// fails, so a failed run can simply be repeated once the cause is fixed.
pub struct Migrator {
    connection_manager: Arc<dyn ConnectionManager>,
    adapter: Arc<dyn DatabaseAdapter>,
    version_store: VersionStore,
    slow_statement_threshold: Option<Duration>,
}

impl Migrator {
    pub fn new(connection_manager: Arc<dyn ConnectionManager>, adapter: Arc<dyn DatabaseAdapter>) -> Self {
        Self {
            connection_manager,
            version_store: VersionStore::new(DEFAULT_VERSION_TABLE, adapter.clone()),
            adapter,
            slow_statement_threshold: None,
        }
    }

    /// Use a version table other than `schema_migrations`
    pub fn with_table_name(mut self, table: impl Into<String>) -> Self {
        self.version_store = VersionStore::new(table, self.adapter.clone());
        self
    }

    /// Warn about statements slower than the threshold
    pub fn with_slow_statement_threshold(mut self, threshold: Option<Duration>) -> Self {
        self.slow_statement_threshold = threshold;
        self
    }

    /// Build a migrator from validated configuration
    pub fn from_config(config: &PawlConfig) -> MigrationResult<Self> {
        config
            .validate_all()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let connection_manager = create_connection_manager(&config.database)?;
        Ok(Self::new(connection_manager, config.database.adapter())
            .with_table_name(config.migrations.table_name.clone())
            .with_slow_statement_threshold(config.logging.slow_statement_threshold()))
    }

    pub fn adapter(&self) -> &Arc<dyn DatabaseAdapter> {
        &self.adapter
    }

    pub fn version_store(&self) -> &VersionStore {
        &self.version_store
    }

    fn context(&self, connection: Arc<dyn Connection>) -> MigrationContext {
        let logging: Arc<dyn Connection> = Arc::new(LoggingConnection::new(
            connection.clone(),
            self.slow_statement_threshold,
        ));
        MigrationContext::new(logging, connection, self.adapter.clone())
    }

    /// Perform `operation` with the migrations `provider` finds under `scope`
    pub async fn migrate(
        &self,
        operation: MigratorOperation,
        provider: &dyn MigrationProvider,
        scope: &str,
    ) -> MigrationResult<MigrationReport> {
        let version_table_created = self.ensure_version_table().await?;

        let connection = self.connection_manager.get_connection().await?;
        let context = self.context(connection);
        let mut report = MigrationReport {
            version_table_created,
            ..Default::default()
        };

        info!("Starting to {}", operation);
        let mut delay = LOCK_RETRY_BASE_DELAY;
        loop {
            let locked =
                with_commit_behavior(context.connection(), CommitBehavior::CommitRegardless, || {
                    self.run_locked(&context, operation, provider, scope, &mut report)
                })
                .await?;
            if locked {
                break;
            }
            info!("Waiting for another migrator run to finish, retrying in {:?}", delay);
            sleep(delay).await;
            delay = (delay * 2).min(LOCK_RETRY_MAX_DELAY);
        }

        info!(
            "Finished: {} migration(s) removed, {} installed",
            report.removed.len(),
            report.installed.len()
        );
        Ok(report)
    }

    async fn run_locked(
        &self,
        context: &MigrationContext,
        operation: MigratorOperation,
        provider: &dyn MigrationProvider,
        scope: &str,
        report: &mut MigrationReport,
    ) -> MigrationResult<bool> {
        if !self.version_store.try_lock(context.connection()).await? {
            return Ok(false);
        }

        let installed = self.version_store.installed_versions(context.connection()).await?;
        let available = provider.find_migrations(scope)?;
        let statuses = statuses(&installed, &available);
        let plan = plan(&installed, &available.keys().copied().collect(), operation)?;
        if plan.is_empty() {
            debug!(
                "Nothing to do: {} installed, {} not installed",
                statuses.installed().len(),
                statuses.not_installed.len()
            );
        } else {
            debug!("Plan: remove {:?}, install {:?}", plan.remove, plan.install);
        }

        for version in &plan.remove {
            let migration = available
                .get(version)
                .ok_or(MigrationError::MissingMigrationImplementation(*version))?;
            info!("Removing migration {} ({})", version, migration.description);
            migration.instantiate().down(context).await?;
            self.version_store.record_remove(context.connection(), *version).await?;
            report.removed.push(*version);
        }

        for version in &plan.install {
            let migration = available
                .get(version)
                .ok_or(MigrationError::MissingMigrationImplementation(*version))?;
            info!("Installing migration {} ({})", version, migration.description);
            migration.instantiate().up(context).await?;
            self.version_store.record_install(context.connection(), *version).await?;
            report.installed.push(*version);
        }

        Ok(true)
    }

    /// Create the version table unless it exists. Returns whether it was created.
    async fn ensure_version_table(&self) -> MigrationResult<bool> {
        let connection = self.connection_manager.get_connection().await?;
        if self.version_store.table_exists(connection.as_ref()).await? {
            return Ok(false);
        }

        info!("Creating version table {}", self.version_store.table_name());
        let context = self.context(connection.clone());
        let bootstrap = CreateSchemaMigrationsTable::new(self.version_store.table_name());
        let result = with_commit_behavior(context.connection(), CommitBehavior::AutoCommit, || {
            bootstrap.up(&context)
        })
        .await;

        match result {
            Ok(()) => Ok(true),
            Err(error) => {
                if self.version_store.table_exists(connection.as_ref()).await? {
                    warn!("Version table was created concurrently: {}", error);
                    Ok(false)
                } else {
                    Err(error)
                }
            }
        }
    }

    async fn installed_versions(&self) -> MigrationResult<BTreeSet<Version>> {
        let connection = self.connection_manager.get_connection().await?;
        if !self.version_store.table_exists(connection.as_ref()).await? {
            return Ok(BTreeSet::new());
        }
        self.version_store.installed_versions(connection.as_ref()).await
    }

    /// Which available migrations are installed, and which installed
    /// migrations no longer have an implementation
    pub async fn migration_statuses(
        &self,
        provider: &dyn MigrationProvider,
        scope: &str,
    ) -> MigrationResult<MigrationStatuses> {
        let installed = self.installed_versions().await?;
        let available = provider.find_migrations(scope)?;
        Ok(statuses(&installed, &available))
    }

    /// Explain what `operation` would still change, or `None` when the
    /// database is already in the state it would produce. Nothing is executed.
    pub async fn why_not_migrated(
        &self,
        provider: &dyn MigrationProvider,
        scope: &str,
        operation: MigratorOperation,
    ) -> MigrationResult<Option<String>> {
        let installed = self.installed_versions().await?;
        let available = provider.find_migrations(scope)?;
        let plan = plan(&installed, &available.keys().copied().collect(), operation)?;
        Ok(explain(&plan, operation))
    }

    /// Tables visible to the migrator's connection
    pub async fn table_names(&self) -> MigrationResult<Vec<String>> {
        let connection = self.connection_manager.get_connection().await?;
        Ok(connection.table_names().await?)
    }
}

fn statuses(
    installed: &BTreeSet<Version>,
    available: &BTreeMap<Version, AvailableMigration>,
) -> MigrationStatuses {
    let statuses = MigrationStatuses::new(installed, &available.keys().copied().collect());
    for version in &statuses.installed_without_available_implementation {
        warn!(
            "Migration {} is installed but has no implementation; it cannot be removed",
            version
        );
    }
    statuses
}

fn explain(plan: &MigrationPlan, operation: MigratorOperation) -> Option<String> {
    if plan.is_empty() {
        return None;
    }

    let mut reasons = Vec::new();
    if !plan.remove.is_empty() {
        reasons.push(format!("remove {}", version_list(&plan.remove)));
    }
    if !plan.install.is_empty() {
        reasons.push(format!("install {}", version_list(&plan.install)));
    }
    Some(format!("To {} the migrator would {}", operation, reasons.join(" and then ")))
}

fn version_list(versions: &[Version]) -> String {
    versions
        .iter()
        .map(Version::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
