//! Two migrators racing on the same database

mod common;

use anyhow::Result;
use common::{registry, Calls, SlowCreateLocation, TestDatabase, SCOPE};
use futures::future::try_join;
use pawl_core::MigratorOperation;
use pawl_storage::MigrationRegistry;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_runs_install_each_migration_once() -> Result<()> {
    let database = TestDatabase::new()?;
    let calls = Calls::default();
    let registry = registry(&calls)?;
    let first = database.migrator()?;
    let second = database.migrator()?;

    let (a, b) = try_join(
        first.migrate(MigratorOperation::InstallAll, &registry, SCOPE),
        second.migrate(MigratorOperation::InstallAll, &registry, SCOPE),
    )
    .await?;

    let mut installed = a.installed.clone();
    installed.extend(b.installed.iter().copied());
    installed.sort_unstable();
    assert_eq!(installed, vec![1, 2]);
    assert_eq!(calls.count(), 2);

    let statuses = first.migration_statuses(&registry, SCOPE).await?;
    assert!(statuses.is_fully_installed());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_waiting_run_outlasts_busy_timeout() -> Result<()> {
    let database = TestDatabase::new()?;
    let calls = Calls::default();
    let slow_calls = calls.clone();
    let mut registry = MigrationRegistry::new();
    registry.register_version(SCOPE, 1, "SlowCreateLocation", move || {
        Box::new(SlowCreateLocation {
            calls: slow_calls.clone(),
            pause: Duration::from_millis(400),
        })
    });

    let first = database.migrator_with_busy_timeout(Duration::from_millis(100))?;
    let second = database.migrator_with_busy_timeout(Duration::from_millis(100))?;
    first
        .migrate(MigratorOperation::InstallAll, &MigrationRegistry::new(), SCOPE)
        .await?;

    let delayed_second = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        second.migrate(MigratorOperation::InstallAll, &registry, SCOPE).await
    };
    let (a, b) = try_join(
        first.migrate(MigratorOperation::InstallAll, &registry, SCOPE),
        delayed_second,
    )
    .await?;

    let mut installed = a.installed.clone();
    installed.extend(b.installed.iter().copied());
    assert_eq!(installed, vec![1]);
    assert_eq!(calls.count(), 1);
    assert!(second.migration_statuses(&registry, SCOPE).await?.is_fully_installed());
    Ok(())
}
