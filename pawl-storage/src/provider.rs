//! Migration discovery

use anyhow::anyhow;
use once_cell::sync::Lazy;
use pawl_core::Version;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::migration::Migration;
use crate::{MigrationError, MigrationResult};

/// Builds a fresh migration instance
pub type MigrationFactory = Arc<dyn Fn() -> Box<dyn Migration> + Send + Sync>;

/// A discovered migration implementation
#[derive(Clone)]
pub struct AvailableMigration {
    pub version: Version,
    pub description: String,
    factory: MigrationFactory,
}

impl AvailableMigration {
    pub fn new(version: Version, description: impl Into<String>, factory: MigrationFactory) -> Self {
        Self {
            version,
            description: description.into(),
            factory,
        }
    }

    /// A new instance of the migration
    pub fn instantiate(&self) -> Box<dyn Migration> {
        (self.factory)()
    }
}

impl fmt::Debug for AvailableMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvailableMigration")
            .field("version", &self.version)
            .field("description", &self.description)
            .finish()
    }
}

/// Supplies the migrations available under a scope
#[cfg_attr(test, mockall::automock)]
pub trait MigrationProvider: Send + Sync {
    /// Migrations keyed by version. Fails on duplicate versions or descriptions.
    fn find_migrations(&self, scope: &str) -> MigrationResult<BTreeMap<Version, AvailableMigration>>;
}

static MIGRATION_NAME: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^Migrate_(\d+)_(\w+)$"));

/// Parse a `Migrate_<version>_<Description>` name
pub fn parse_migration_name(name: &str) -> MigrationResult<Option<(Version, String)>> {
    let pattern = MIGRATION_NAME
        .as_ref()
        .map_err(|e| MigrationError::Other(anyhow!("Invalid migration name pattern: {}", e)))?;

    let Some(captures) = pattern.captures(name) else {
        return Ok(None);
    };
    let version = captures[1]
        .parse()
        .map_err(|e| MigrationError::Other(anyhow!("Invalid version in '{}': {}", name, e)))?;
    Ok(Some((version, captures[2].to_string())))
}

struct RegisteredMigration {
    scope: String,
    migration: AvailableMigration,
}

/// An explicit list of migrations, grouped by module-path-like scopes
/// such as `app::migrations`.
///
/// ```ignore
/// let mut registry = MigrationRegistry::new();
/// registry
///     .register("app::migrations", "Migrate_1_CreateLocation", || Box::new(CreateLocation))?
///     .register("app::migrations", "Migrate_2_CreatePeople", || Box::new(CreatePeople))?;
/// ```
#[derive(Default)]
pub struct MigrationRegistry {
    entries: Vec<RegisteredMigration>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration by its `Migrate_<version>_<Description>` name.
    /// Names that do not follow the pattern are skipped.
    pub fn register<F>(&mut self, scope: &str, name: &str, factory: F) -> MigrationResult<&mut Self>
    where
        F: Fn() -> Box<dyn Migration> + Send + Sync + 'static,
    {
        match parse_migration_name(name)? {
            Some((version, description)) => Ok(self.register_version(scope, version, description, factory)),
            None => {
                debug!("Skipping '{}' in scope '{}': not a migration name", name, scope);
                Ok(self)
            }
        }
    }

    /// Register a migration with an explicit version and description
    pub fn register_version<F>(
        &mut self,
        scope: &str,
        version: Version,
        description: impl Into<String>,
        factory: F,
    ) -> &mut Self
    where
        F: Fn() -> Box<dyn Migration> + Send + Sync + 'static,
    {
        self.entries.push(RegisteredMigration {
            scope: scope.to_string(),
            migration: AvailableMigration::new(version, description, Arc::new(factory)),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn in_scope(entry_scope: &str, scope: &str) -> bool {
    scope.is_empty()
        || entry_scope == scope
        || entry_scope
            .strip_prefix(scope)
            .is_some_and(|rest| rest.starts_with("::"))
}

impl MigrationProvider for MigrationRegistry {
    fn find_migrations(&self, scope: &str) -> MigrationResult<BTreeMap<Version, AvailableMigration>> {
        let mut migrations: BTreeMap<Version, AvailableMigration> = BTreeMap::new();
        let mut descriptions: HashMap<&str, Version> = HashMap::new();

        for entry in self.entries.iter().filter(|entry| in_scope(&entry.scope, scope)) {
            let migration = &entry.migration;

            if let Some(existing) = migrations.get(&migration.version) {
                return Err(MigrationError::DuplicateVersion {
                    version: migration.version,
                    first: existing.description.clone(),
                    second: migration.description.clone(),
                });
            }
            if let Some(existing) = descriptions.insert(&migration.description, migration.version) {
                return Err(MigrationError::DuplicateDescription {
                    description: migration.description.clone(),
                    first: existing,
                    second: migration.version,
                });
            }

            migrations.insert(migration.version, migration.clone());
        }

        debug!("Found {} migration(s) in scope '{}'", migrations.len(), scope);
        Ok(migrations)
    }
}
