//! SQLite dialect
//!
//! SQLite has no GRANT and cannot add or drop constraints on an existing
//! table, so those statements fail with `UnsupportedFeature`. Check
//! constraints declared on a column inside CREATE TABLE are supported.

use super::{AdapterContext, DatabaseAdapter, Vendor};
use crate::column::{numeric, sized, ColumnAttributes, ColumnCapabilities, ColumnDefinition, ColumnType};
use crate::constraint::{CheckOption, ForeignKeyOption, TableColumns};
use crate::error::{SqlError, SqlResult};
use crate::grant::GrantPrivilege;
use crate::naming::UnquotedNameConverter;

#[derive(Debug, Clone)]
pub struct SqliteAdapter {
    context: AdapterContext,
}

impl SqliteAdapter {
    pub fn new(schema: Option<String>) -> Self {
        Self::from_context(AdapterContext::new(schema))
    }

    pub fn from_context(context: AdapterContext) -> Self {
        Self { context }
    }

    fn unsupported<T>(&self, feature: &str) -> SqlResult<T> {
        Err(SqlError::unsupported(self.vendor(), feature))
    }
}

impl DatabaseAdapter for SqliteAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Sqlite
    }

    fn context(&self) -> &AdapterContext {
        &self.context
    }

    fn unquoted_name_converter(&self) -> UnquotedNameConverter {
        UnquotedNameConverter::Preserve
    }

    fn adding_foreign_key_constraint_creates_index(&self) -> bool {
        false
    }

    /// A write that matches no rows still takes the database's reserved
    /// lock, which is held until the transaction ends.
    fn lock_table_sql(&self, table: &str) -> String {
        format!("DELETE FROM {} WHERE 1 = 0", self.quote_table_name(table))
    }

    fn column_capabilities(&self, column_type: ColumnType) -> SqlResult<ColumnCapabilities> {
        match column_type {
            ColumnType::Varbinary => Ok(ColumnCapabilities::default().with_default()),
            _ => Ok(column_type.base_capabilities()),
        }
    }

    fn column_type_sql(
        &self,
        _column: &str,
        column_type: ColumnType,
        attributes: &ColumnAttributes,
    ) -> SqlResult<String> {
        let sql = match column_type {
            ColumnType::Bigint => "BIGINT".to_string(),
            ColumnType::Blob | ColumnType::Varbinary => "BLOB".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Char => sized("CHAR", attributes.limit),
            ColumnType::Decimal => numeric("DECIMAL", attributes.precision, attributes.scale),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::Smallint => "SMALLINT".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Varchar => sized("VARCHAR", attributes.limit),
        };
        Ok(sql)
    }

    fn alter_column_sql(&self, _table: &str, _column: &ColumnDefinition) -> SqlResult<String> {
        self.unsupported("ALTER COLUMN")
    }

    fn add_foreign_key_sql(
        &self,
        _on: &TableColumns,
        _references: &TableColumns,
        _options: &[ForeignKeyOption],
    ) -> SqlResult<String> {
        self.unsupported("adding a foreign key to an existing table")
    }

    fn remove_foreign_key_sql(
        &self,
        _on: &TableColumns,
        _references: &TableColumns,
        _options: &[ForeignKeyOption],
    ) -> SqlResult<String> {
        self.unsupported("dropping a foreign key")
    }

    fn add_check_sql(
        &self,
        _on: &TableColumns,
        _expression: &str,
        _options: &[CheckOption],
    ) -> SqlResult<Option<String>> {
        self.unsupported("adding a check constraint to an existing table")
    }

    fn remove_check_sql(
        &self,
        _on: &TableColumns,
        _options: &[CheckOption],
    ) -> SqlResult<Option<String>> {
        self.unsupported("dropping a check constraint")
    }

    fn grant_sql(
        &self,
        _table: &str,
        _grantees: &[&str],
        _privileges: &[GrantPrivilege],
    ) -> SqlResult<String> {
        self.unsupported("GRANT")
    }

    fn revoke_sql(
        &self,
        _table: &str,
        _grantees: &[&str],
        _privileges: &[GrantPrivilege],
    ) -> SqlResult<String> {
        self.unsupported("REVOKE")
    }
}
