//! Migrations and database setup shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pawl_sql::{create_adapter, ColumnOption, IndexOption, TracingSink, Vendor};
use pawl_storage::{
    Migration, MigrationContext, MigrationError, MigrationRegistry, MigrationResult, Migrator,
    SqliteConnectionManager,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const SCOPE: &str = "app::migrations";

/// An on-disk SQLite database removed when dropped
pub struct TestDatabase {
    _dir: TempDir,
    pub url: String,
}

impl TestDatabase {
    pub fn new() -> anyhow::Result<Self> {
        let dir = TempDir::new()?;
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("pawl.db").display());
        Ok(Self { _dir: dir, url })
    }

    pub fn migrator(&self) -> anyhow::Result<Migrator> {
        self.migrator_with_busy_timeout(Duration::from_secs(5))
    }

    pub fn migrator_with_busy_timeout(&self, busy_timeout: Duration) -> anyhow::Result<Migrator> {
        let manager = SqliteConnectionManager::new(&self.url, busy_timeout)?;
        Ok(Migrator::new(
            Arc::new(manager),
            create_adapter(Vendor::Sqlite, None, Arc::new(TracingSink)),
        ))
    }
}

/// Counts how often migration bodies run
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn record(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct CreateLocation {
    pub calls: Calls,
}

#[async_trait]
impl Migration for CreateLocation {
    async fn up(&self, context: &MigrationContext) -> MigrationResult<()> {
        self.calls.record();
        context
            .create_table("location", |table| {
                table
                    .integer("id", [ColumnOption::PrimaryKey])?
                    .varchar("name", [ColumnOption::limit(100)?, ColumnOption::NotNull])?;
                Ok(())
            })
            .await
    }

    async fn down(&self, context: &MigrationContext) -> MigrationResult<()> {
        self.calls.record();
        context.drop_table("location").await
    }
}

pub struct CreatePeople {
    pub calls: Calls,
}

#[async_trait]
impl Migration for CreatePeople {
    async fn up(&self, context: &MigrationContext) -> MigrationResult<()> {
        self.calls.record();
        context
            .create_table("people", |table| {
                table
                    .integer("id", [ColumnOption::PrimaryKey])?
                    .varchar("name", [ColumnOption::limit(100)?, ColumnOption::NotNull])?
                    .integer("location_id", [ColumnOption::Nullable])?
                    .smallint("age", [ColumnOption::check("age >= 0")])?;
                Ok(())
            })
            .await?;
        context
            .add_index("people", &["location_id"], &[IndexOption::Name("people_location".to_string())])
            .await
    }

    async fn down(&self, context: &MigrationContext) -> MigrationResult<()> {
        self.calls.record();
        context
            .remove_index("people", &["location_id"], &[IndexOption::Name("people_location".to_string())])
            .await?;
        context.drop_table("people").await
    }
}

/// Creates a table, then keeps the run going for `pause`
pub struct SlowCreateLocation {
    pub calls: Calls,
    pub pause: Duration,
}

#[async_trait]
impl Migration for SlowCreateLocation {
    async fn up(&self, context: &MigrationContext) -> MigrationResult<()> {
        self.calls.record();
        context.execute("CREATE TABLE location (id INTEGER PRIMARY KEY)").await?;
        tokio::time::sleep(self.pause).await;
        Ok(())
    }

    async fn down(&self, context: &MigrationContext) -> MigrationResult<()> {
        self.calls.record();
        context.drop_table("location").await
    }
}

/// Fails part way through `up`, after creating a table
pub struct Broken;

#[async_trait]
impl Migration for Broken {
    async fn up(&self, context: &MigrationContext) -> MigrationResult<()> {
        context.execute("CREATE TABLE half_done (id INTEGER)").await?;
        context.execute("INSERT INTO no_such_table VALUES (1)").await?;
        Ok(())
    }

    async fn down(&self, _context: &MigrationContext) -> MigrationResult<()> {
        Err(MigrationError::Irreversible("Broken".to_string()))
    }
}

/// Registry with CreateLocation (1) and CreatePeople (2)
pub fn registry(calls: &Calls) -> anyhow::Result<MigrationRegistry> {
    let mut registry = MigrationRegistry::new();
    let location_calls = calls.clone();
    let people_calls = calls.clone();
    registry
        .register(SCOPE, "Migrate_1_CreateLocation", move || {
            Box::new(CreateLocation {
                calls: location_calls.clone(),
            })
        })?
        .register(SCOPE, "Migrate_2_CreatePeople", move || {
            Box::new(CreatePeople {
                calls: people_calls.clone(),
            })
        })?;
    Ok(registry)
}
