//! Per-vendor SQL dialect adapters
//!
//! [`DatabaseAdapter`] exposes a handful of required hooks (type mapping,
//! case folding, lock statement) and assembles every DDL and DCL statement
//! from them through provided methods. Vendors override the provided
//! methods only where their syntax diverges.

mod derby;
mod h2;
mod mysql;
mod oracle;
mod postgresql;
mod sqlite;

pub use derby::DerbyAdapter;
pub use h2::H2Adapter;
pub use mysql::MysqlAdapter;
pub use oracle::OracleAdapter;
pub use postgresql::PostgresqlAdapter;
pub use sqlite::SqliteAdapter;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::column::{
    CharacterSet, ColumnAttributes, ColumnCapabilities, ColumnDefinition, ColumnType,
};
use crate::constraint::{
    resolve_check_name, resolve_foreign_key_options, resolve_index_options, CheckOption,
    ForeignKeyAction, ForeignKeyOption, IndexOption, TableColumns,
};
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::error::{SqlError, SqlResult};
use crate::grant::{GrantPrivilege, SchemaPrivilege};
use crate::naming::UnquotedNameConverter;

/// Supported database vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Derby,
    H2,
    Mysql,
    Oracle,
    Postgresql,
    Sqlite,
}

impl Vendor {
    pub fn all() -> [Vendor; 6] {
        [
            Vendor::Derby,
            Vendor::H2,
            Vendor::Mysql,
            Vendor::Oracle,
            Vendor::Postgresql,
            Vendor::Sqlite,
        ]
    }

    /// Guess the vendor from a connection URL's scheme
    pub fn from_url(url: &str) -> Option<Vendor> {
        let url = url.strip_prefix("jdbc:").unwrap_or(url);
        let scheme = url.split(':').next()?;
        scheme.parse().ok()
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Vendor::Derby => "Derby",
            Vendor::H2 => "H2",
            Vendor::Mysql => "MySQL",
            Vendor::Oracle => "Oracle",
            Vendor::Postgresql => "PostgreSQL",
            Vendor::Sqlite => "SQLite",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Vendor {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "derby" => Ok(Vendor::Derby),
            "h2" => Ok(Vendor::H2),
            "mysql" | "mariadb" => Ok(Vendor::Mysql),
            "oracle" => Ok(Vendor::Oracle),
            "postgresql" | "postgres" => Ok(Vendor::Postgresql),
            "sqlite" => Ok(Vendor::Sqlite),
            other => Err(SqlError::IllegalArgument(format!(
                "Unknown database vendor '{}'",
                other
            ))),
        }
    }
}

/// Schema and diagnostics shared by every adapter
#[derive(Debug, Clone)]
pub struct AdapterContext {
    schema: Option<String>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl AdapterContext {
    pub fn new(schema: Option<String>) -> Self {
        Self {
            schema,
            diagnostics: Arc::new(TracingSink),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

/// Build the adapter for a vendor
pub fn create_adapter(
    vendor: Vendor,
    schema: Option<String>,
    diagnostics: Arc<dyn DiagnosticSink>,
) -> Arc<dyn DatabaseAdapter> {
    let context = AdapterContext::new(schema).with_diagnostics(diagnostics);
    match vendor {
        Vendor::Derby => Arc::new(DerbyAdapter::from_context(context)),
        Vendor::H2 => Arc::new(H2Adapter::from_context(context)),
        Vendor::Mysql => Arc::new(MysqlAdapter::from_context(context)),
        Vendor::Oracle => Arc::new(OracleAdapter::from_context(context)),
        Vendor::Postgresql => Arc::new(PostgresqlAdapter::from_context(context)),
        Vendor::Sqlite => Arc::new(SqliteAdapter::from_context(context)),
    }
}

/// Turns schema descriptions into vendor SQL
pub trait DatabaseAdapter: Send + Sync + fmt::Debug {
    fn vendor(&self) -> Vendor;

    fn context(&self) -> &AdapterContext;

    fn unquoted_name_converter(&self) -> UnquotedNameConverter;

    /// Whether ADD FOREIGN KEY implicitly creates an index on the referencing columns
    fn adding_foreign_key_constraint_creates_index(&self) -> bool;

    /// Vendor type SQL for a column, including any auto-increment phrase
    fn column_type_sql(
        &self,
        column: &str,
        column_type: ColumnType,
        attributes: &ColumnAttributes,
    ) -> SqlResult<String>;

    /// Statement that takes an exclusive lock on a table until the
    /// surrounding transaction ends
    fn lock_table_sql(&self, table: &str) -> String;

    fn schema_name(&self) -> Option<&str> {
        self.context().schema.as_deref()
    }

    fn diagnostics(&self) -> &dyn DiagnosticSink {
        self.context().diagnostics.as_ref()
    }

    fn quote_character(&self) -> char {
        '"'
    }

    fn supports_check_constraints(&self) -> bool {
        true
    }

    /// Positional bind parameter, `index` starting at 1
    fn parameter_placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn column_capabilities(&self, column_type: ColumnType) -> SqlResult<ColumnCapabilities> {
        Ok(column_type.base_capabilities())
    }

    /// Clause appended after the type for a requested character set.
    /// Vendors that cannot honor it report and return `None`.
    fn character_set_sql(&self, column: &str, character_set: &CharacterSet) -> Option<String> {
        self.diagnostics().report(Diagnostic::CharacterSetIgnored {
            column: column.to_string(),
            vendor: self.vendor(),
            character_set: character_set.to_string(),
        });
        None
    }

    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.quote_character();
        format!(
            "{}{}{}",
            quote,
            self.unquoted_name_converter().apply(name),
            quote
        )
    }

    /// Quoted name of a schema object, qualified with the schema if one is set
    fn quote_table_name(&self, table: &str) -> String {
        match self.schema_name() {
            Some(schema) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(table)
            ),
            None => self.quote_identifier(table),
        }
    }

    fn quote_column_list(&self, columns: &[&str]) -> String {
        columns
            .iter()
            .map(|column| self.quote_identifier(column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn create_table_sql(&self, table: &str, columns: &[ColumnDefinition]) -> SqlResult<String> {
        if columns.is_empty() {
            return Err(SqlError::IllegalArgument(format!(
                "Table '{}' needs at least one column",
                table
            )));
        }
        let columns = columns
            .iter()
            .map(ColumnDefinition::to_column_sql)
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!(
            "CREATE TABLE {} ({})",
            self.quote_table_name(table),
            columns
        ))
    }

    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE {}", self.quote_table_name(table))
    }

    fn add_column_sql(&self, table: &str, column: &ColumnDefinition) -> String {
        format!(
            "ALTER TABLE {} ADD {}",
            self.quote_table_name(table),
            column.to_column_sql()
        )
    }

    fn alter_column_sql(&self, table: &str, column: &ColumnDefinition) -> SqlResult<String> {
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {}",
            self.quote_table_name(table),
            column.to_column_sql()
        ))
    }

    /// `DROP COLUMN` or the vendor's shorter `DROP`
    fn drop_column_keyword(&self) -> &'static str {
        "DROP COLUMN"
    }

    fn remove_column_sql(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} {} {}",
            self.quote_table_name(table),
            self.drop_column_keyword(),
            self.quote_identifier(column)
        )
    }

    fn add_index_sql(
        &self,
        table: &str,
        columns: &[&str],
        options: &[IndexOption],
    ) -> SqlResult<String> {
        if columns.is_empty() {
            return Err(SqlError::IllegalArgument(format!(
                "An index on table '{}' needs at least one column",
                table
            )));
        }
        let spec = resolve_index_options(table, columns, options, self.diagnostics());
        Ok(format!(
            "CREATE {}INDEX {} ON {} ({})",
            if spec.unique { "UNIQUE " } else { "" },
            self.quote_identifier(&spec.name),
            self.quote_table_name(table),
            self.quote_column_list(columns)
        ))
    }

    fn remove_index_sql(
        &self,
        table: &str,
        columns: &[&str],
        options: &[IndexOption],
    ) -> SqlResult<String> {
        if columns.is_empty() {
            return Err(SqlError::IllegalArgument(format!(
                "An index on table '{}' needs at least one column",
                table
            )));
        }
        let spec = resolve_index_options(table, columns, options, self.diagnostics());
        Ok(self.drop_index_sql(table, &spec.name))
    }

    fn drop_index_sql(&self, _table: &str, index: &str) -> String {
        format!("DROP INDEX {}", self.quote_table_name(index))
    }

    /// ON DELETE phrase, `None` when the vendor expresses the action by omission
    fn on_delete_sql(&self, action: ForeignKeyAction) -> SqlResult<Option<String>> {
        Ok(Some(format!("ON DELETE {}", action.sql())))
    }

    /// ON UPDATE phrase, `None` when the vendor expresses the action by omission
    fn on_update_sql(&self, action: ForeignKeyAction) -> SqlResult<Option<String>> {
        Ok(Some(format!("ON UPDATE {}", action.sql())))
    }

    fn add_foreign_key_sql(
        &self,
        on: &TableColumns,
        references: &TableColumns,
        options: &[ForeignKeyOption],
    ) -> SqlResult<String> {
        on.require_columns("A foreign key")?;
        references.require_columns("A foreign key")?;
        if on.columns.len() != references.columns.len() {
            return Err(SqlError::IllegalArgument(format!(
                "Foreign key from '{}' has {} column(s) but references {} column(s) on '{}'",
                on.table,
                on.columns.len(),
                references.columns.len(),
                references.table
            )));
        }

        let spec = resolve_foreign_key_options(on, references, options, self.diagnostics());
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_table_name(&on.table),
            self.quote_identifier(&spec.name),
            self.quote_column_list(&on.column_names()),
            self.quote_table_name(&references.table),
            self.quote_column_list(&references.column_names())
        );
        if let Some(action) = spec.on_delete {
            if let Some(phrase) = self.on_delete_sql(action)? {
                sql.push(' ');
                sql.push_str(&phrase);
            }
        }
        if let Some(action) = spec.on_update {
            if let Some(phrase) = self.on_update_sql(action)? {
                sql.push(' ');
                sql.push_str(&phrase);
            }
        }
        Ok(sql)
    }

    fn drop_foreign_key_keyword(&self) -> &'static str {
        "CONSTRAINT"
    }

    fn remove_foreign_key_sql(
        &self,
        on: &TableColumns,
        references: &TableColumns,
        options: &[ForeignKeyOption],
    ) -> SqlResult<String> {
        on.require_columns("A foreign key")?;
        references.require_columns("A foreign key")?;
        let spec = resolve_foreign_key_options(on, references, options, self.diagnostics());
        Ok(format!(
            "ALTER TABLE {} DROP {} {}",
            self.quote_table_name(&on.table),
            self.drop_foreign_key_keyword(),
            self.quote_identifier(&spec.name)
        ))
    }

    /// ADD CHECK statement, `None` when the vendor does not enforce checks
    fn add_check_sql(
        &self,
        on: &TableColumns,
        expression: &str,
        options: &[CheckOption],
    ) -> SqlResult<Option<String>> {
        on.require_columns("A check constraint")?;
        let name = resolve_check_name(on, options, self.diagnostics());
        if !self.supports_check_constraints() {
            self.diagnostics().report(Diagnostic::CheckConstraintIgnored {
                name,
                vendor: self.vendor(),
            });
            return Ok(None);
        }
        Ok(Some(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} CHECK ({})",
            self.quote_table_name(&on.table),
            self.quote_identifier(&name),
            expression
        )))
    }

    fn drop_check_keyword(&self) -> &'static str {
        "CONSTRAINT"
    }

    fn remove_check_sql(
        &self,
        on: &TableColumns,
        options: &[CheckOption],
    ) -> SqlResult<Option<String>> {
        on.require_columns("A check constraint")?;
        let name = resolve_check_name(on, options, self.diagnostics());
        if !self.supports_check_constraints() {
            self.diagnostics().report(Diagnostic::CheckConstraintIgnored {
                name,
                vendor: self.vendor(),
            });
            return Ok(None);
        }
        Ok(Some(format!(
            "ALTER TABLE {} DROP {} {}",
            self.quote_table_name(&on.table),
            self.drop_check_keyword(),
            self.quote_identifier(&name)
        )))
    }

    /// Reject privileges the vendor cannot express
    fn check_privilege(&self, _privilege: &GrantPrivilege) -> SqlResult<()> {
        Ok(())
    }

    fn privilege_sql(&self, privilege: &GrantPrivilege) -> SqlResult<String> {
        self.check_privilege(privilege)?;
        let columns: Vec<&str> = privilege.columns().iter().map(String::as_str).collect();
        if columns.is_empty() {
            Ok(privilege.keyword().to_string())
        } else {
            Ok(format!(
                "{} ({})",
                privilege.keyword(),
                self.quote_column_list(&columns)
            ))
        }
    }

    fn grant_sql(
        &self,
        table: &str,
        grantees: &[&str],
        privileges: &[GrantPrivilege],
    ) -> SqlResult<String> {
        let privileges = table_privileges_sql(self, grantees, privileges)?;
        Ok(format!(
            "GRANT {} ON {} TO {}",
            privileges,
            self.quote_table_name(table),
            self.quote_column_list(grantees)
        ))
    }

    fn revoke_sql(
        &self,
        table: &str,
        grantees: &[&str],
        privileges: &[GrantPrivilege],
    ) -> SqlResult<String> {
        let privileges = table_privileges_sql(self, grantees, privileges)?;
        Ok(format!(
            "REVOKE {} ON {} FROM {}",
            privileges,
            self.quote_table_name(table),
            self.quote_column_list(grantees)
        ))
    }

    /// Object clause for schema privileges, e.g. `SCHEMA "app"`
    fn schema_privilege_target(&self, _schema: &str) -> SqlResult<String> {
        Err(SqlError::unsupported(self.vendor(), "schema privileges"))
    }

    fn grant_schema_privileges_sql(
        &self,
        grantees: &[&str],
        privileges: &[SchemaPrivilege],
    ) -> SqlResult<String> {
        let (target, privileges) = schema_privileges_sql(self, grantees, privileges)?;
        Ok(format!(
            "GRANT {} ON {} TO {}",
            privileges,
            target,
            self.quote_column_list(grantees)
        ))
    }

    fn revoke_schema_privileges_sql(
        &self,
        grantees: &[&str],
        privileges: &[SchemaPrivilege],
    ) -> SqlResult<String> {
        let (target, privileges) = schema_privileges_sql(self, grantees, privileges)?;
        Ok(format!(
            "REVOKE {} ON {} FROM {}",
            privileges,
            target,
            self.quote_column_list(grantees)
        ))
    }
}

fn require_grantees(grantees: &[&str]) -> SqlResult<()> {
    if grantees.is_empty() {
        return Err(SqlError::IllegalArgument(
            "At least one grantee is required".to_string(),
        ));
    }
    Ok(())
}

fn table_privileges_sql<A: DatabaseAdapter + ?Sized>(
    adapter: &A,
    grantees: &[&str],
    privileges: &[GrantPrivilege],
) -> SqlResult<String> {
    require_grantees(grantees)?;
    if privileges.is_empty() {
        return Err(SqlError::IllegalArgument(
            "At least one privilege is required".to_string(),
        ));
    }
    let privileges = privileges
        .iter()
        .map(|privilege| adapter.privilege_sql(privilege))
        .collect::<SqlResult<Vec<_>>>()?;
    Ok(privileges.join(", "))
}

fn schema_privileges_sql<A: DatabaseAdapter + ?Sized>(
    adapter: &A,
    grantees: &[&str],
    privileges: &[SchemaPrivilege],
) -> SqlResult<(String, String)> {
    require_grantees(grantees)?;
    if privileges.is_empty() {
        return Err(SqlError::IllegalArgument(
            "At least one privilege is required".to_string(),
        ));
    }
    let schema = adapter.schema_name().ok_or_else(|| {
        SqlError::IllegalArgument("Schema privileges require a schema name".to_string())
    })?;
    let target = adapter.schema_privilege_target(schema)?;
    let privileges = privileges
        .iter()
        .map(SchemaPrivilege::keyword)
        .collect::<Vec<_>>()
        .join(", ");
    Ok((target, privileges))
}

/// The limit a type cannot be rendered without
pub(crate) fn required_limit(
    vendor: Vendor,
    column: &str,
    type_name: &str,
    attributes: &ColumnAttributes,
) -> SqlResult<u32> {
    attributes.limit.ok_or_else(|| {
        SqlError::Construction(format!(
            "{} column '{}' on {} requires a Limit",
            type_name, column, vendor
        ))
    })
}

/// Shared tail of the lock statements that rely on row locks
pub(crate) fn select_for_update_sql(quoted_table: &str) -> String {
    format!("SELECT * FROM {} FOR UPDATE", quoted_table)
}

/// Shared tail of the lock statements that use table locks
pub(crate) fn lock_exclusive_sql(quoted_table: &str) -> String {
    format!("LOCK TABLE {} IN EXCLUSIVE MODE", quoted_table)
}
