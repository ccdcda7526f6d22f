//! Version table and migration discovery configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use crate::validation::{validate_identifier, Validatable};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    /// Table that records installed versions
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Registry scope searched for migrations; empty means every scope
    #[serde(default)]
    pub scope: String,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            table_name: default_table_name(),
            scope: String::new(),
        }
    }
}

impl Validatable for MigrationsConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_identifier(&self.table_name, "table_name", self.domain_name())?;
        if self.scope.ends_with("::") {
            return Err(self.validation_error(format!(
                "scope '{}' must not end with '::'",
                self.scope
            )));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "migrations"
    }
}

fn default_table_name() -> String {
    "schema_migrations".to_string()
}
