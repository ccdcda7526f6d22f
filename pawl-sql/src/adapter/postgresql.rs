//! PostgreSQL dialect

use super::{lock_exclusive_sql, AdapterContext, DatabaseAdapter, Vendor};
use crate::column::{numeric, sized, ColumnAttributes, ColumnCapabilities, ColumnDefinition, ColumnType};
use crate::error::{SqlError, SqlResult};
use crate::grant::GrantPrivilege;
use crate::naming::UnquotedNameConverter;

#[derive(Debug, Clone)]
pub struct PostgresqlAdapter {
    context: AdapterContext,
}

impl PostgresqlAdapter {
    pub fn new(schema: Option<String>) -> Self {
        Self::from_context(AdapterContext::new(schema))
    }

    pub fn from_context(context: AdapterContext) -> Self {
        Self { context }
    }
}

impl DatabaseAdapter for PostgresqlAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Postgresql
    }

    fn context(&self) -> &AdapterContext {
        &self.context
    }

    fn unquoted_name_converter(&self) -> UnquotedNameConverter {
        UnquotedNameConverter::Lowercase
    }

    fn adding_foreign_key_constraint_creates_index(&self) -> bool {
        false
    }

    fn parameter_placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn lock_table_sql(&self, table: &str) -> String {
        lock_exclusive_sql(&self.quote_table_name(table))
    }

    fn column_capabilities(&self, column_type: ColumnType) -> SqlResult<ColumnCapabilities> {
        let base = column_type.base_capabilities();
        match column_type {
            ColumnType::Bigint | ColumnType::Integer | ColumnType::Smallint => {
                Ok(base.with_auto_increment())
            }
            ColumnType::Timestamp => Ok(base.with_precision()),
            // BYTEA has no length
            ColumnType::Varbinary => Ok(ColumnCapabilities::default().with_default()),
            _ => Ok(base),
        }
    }

    fn column_type_sql(
        &self,
        _column: &str,
        column_type: ColumnType,
        attributes: &ColumnAttributes,
    ) -> SqlResult<String> {
        let serial = attributes.auto_increment;
        let sql = match column_type {
            ColumnType::Bigint if serial => "BIGSERIAL".to_string(),
            ColumnType::Bigint => "BIGINT".to_string(),
            ColumnType::Blob | ColumnType::Varbinary => "BYTEA".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Char => sized("CHAR", attributes.limit),
            ColumnType::Decimal => numeric("DECIMAL", attributes.precision, attributes.scale),
            ColumnType::Integer if serial => "SERIAL".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::Smallint if serial => "SMALLSERIAL".to_string(),
            ColumnType::Smallint => "SMALLINT".to_string(),
            ColumnType::Timestamp => sized("TIMESTAMP", attributes.precision),
            ColumnType::Varchar => sized("VARCHAR", attributes.limit),
        };
        Ok(sql)
    }

    fn alter_column_sql(&self, table: &str, column: &ColumnDefinition) -> SqlResult<String> {
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
            self.quote_table_name(table),
            column.quoted_name(),
            column.type_sql()
        ))
    }

    fn drop_column_keyword(&self) -> &'static str {
        "DROP"
    }

    fn check_privilege(&self, privilege: &GrantPrivilege) -> SqlResult<()> {
        match privilege {
            GrantPrivilege::Alter | GrantPrivilege::Index => Err(SqlError::unsupported(
                self.vendor(),
                format!("the {} privilege", privilege.keyword()),
            )),
            _ => Ok(()),
        }
    }

    fn schema_privilege_target(&self, schema: &str) -> SqlResult<String> {
        Ok(format!("SCHEMA {}", self.quote_identifier(schema)))
    }
}
