//! Building a migrator from a YAML configuration file

mod common;

use anyhow::Result;
use common::{registry, Calls, TestDatabase, SCOPE};
use pawl_config::{ConfigLoader, PawlConfig};
use pawl_core::MigratorOperation;
use pawl_storage::Migrator;
use std::io::Write;

fn write_config(database: &TestDatabase) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"
database:
  url: "{}"
  vendor: sqlite
  busy_timeout_ms: 2000
migrations:
  table_name: applied_versions
  scope: "{}"
logging:
  level: debug
  slow_statement_ms: 500
"#,
        database.url, SCOPE
    )?;
    Ok(file)
}

#[tokio::test]
async fn test_migrator_from_config_file() -> Result<()> {
    let database = TestDatabase::new()?;
    let file = write_config(&database)?;
    let config = ConfigLoader::new().from_file(file.path())?;
    pawl_logging::init_logging_from_config(&config.logging)?;

    let calls = Calls::default();
    let registry = registry(&calls)?;
    let migrator = Migrator::from_config(&config)?;
    let report = migrator
        .migrate(MigratorOperation::InstallAll, &registry, &config.migrations.scope)
        .await?;

    assert_eq!(report.installed, vec![1, 2]);
    assert_eq!(migrator.version_store().table_name(), "applied_versions");
    assert!(migrator.table_names().await?.contains(&"applied_versions".to_string()));
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = PawlConfig::default();
    config.migrations.table_name = "not a table".to_string();

    let error = Migrator::from_config(&config).err().map(|e| e.error_code());
    assert_eq!(error, Some("CONFIG_ERROR"));
}
