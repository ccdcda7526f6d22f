//! Apache Derby dialect

use super::{lock_exclusive_sql, required_limit, AdapterContext, DatabaseAdapter, Vendor};
use crate::column::{numeric, sized, ColumnAttributes, ColumnCapabilities, ColumnDefinition, ColumnType};
use crate::constraint::ForeignKeyAction;
use crate::error::{SqlError, SqlResult};
use crate::grant::GrantPrivilege;
use crate::naming::UnquotedNameConverter;

#[derive(Debug, Clone)]
pub struct DerbyAdapter {
    context: AdapterContext,
}

impl DerbyAdapter {
    pub fn new(schema: Option<String>) -> Self {
        Self::from_context(AdapterContext::new(schema))
    }

    pub fn from_context(context: AdapterContext) -> Self {
        Self { context }
    }
}

impl DatabaseAdapter for DerbyAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Derby
    }

    fn context(&self) -> &AdapterContext {
        &self.context
    }

    fn unquoted_name_converter(&self) -> UnquotedNameConverter {
        UnquotedNameConverter::Uppercase
    }

    fn adding_foreign_key_constraint_creates_index(&self) -> bool {
        true
    }

    fn lock_table_sql(&self, table: &str) -> String {
        lock_exclusive_sql(&self.quote_table_name(table))
    }

    fn column_capabilities(&self, column_type: ColumnType) -> SqlResult<ColumnCapabilities> {
        let base = column_type.base_capabilities();
        match column_type {
            ColumnType::Boolean => Err(SqlError::UnsupportedColumnType {
                vendor: self.vendor(),
                column_type,
            }),
            ColumnType::Blob => Ok(base.with_limit()),
            ColumnType::Bigint | ColumnType::Integer | ColumnType::Smallint => {
                Ok(base.with_auto_increment())
            }
            _ => Ok(base),
        }
    }

    fn column_type_sql(
        &self,
        column: &str,
        column_type: ColumnType,
        attributes: &ColumnAttributes,
    ) -> SqlResult<String> {
        let mut sql = match column_type {
            ColumnType::Bigint => "BIGINT".to_string(),
            ColumnType::Blob => sized("BLOB", attributes.limit),
            ColumnType::Boolean => {
                return Err(SqlError::UnsupportedColumnType {
                    vendor: self.vendor(),
                    column_type,
                })
            }
            ColumnType::Char => sized("CHAR", attributes.limit),
            ColumnType::Decimal => numeric("DECIMAL", attributes.precision, attributes.scale),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::Smallint => "SMALLINT".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Varbinary => {
                let limit = required_limit(self.vendor(), column, "VARCHAR FOR BIT DATA", attributes)?;
                format!("VARCHAR({}) FOR BIT DATA", limit)
            }
            ColumnType::Varchar => {
                let limit = required_limit(self.vendor(), column, "VARCHAR", attributes)?;
                format!("VARCHAR({})", limit)
            }
        };
        if attributes.auto_increment {
            sql.push_str(" GENERATED BY DEFAULT AS IDENTITY");
        }
        Ok(sql)
    }

    fn alter_column_sql(&self, table: &str, column: &ColumnDefinition) -> SqlResult<String> {
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} SET DATA TYPE {}",
            self.quote_table_name(table),
            column.quoted_name(),
            column.type_sql()
        ))
    }

    fn on_update_sql(&self, action: ForeignKeyAction) -> SqlResult<Option<String>> {
        match action {
            ForeignKeyAction::NoAction | ForeignKeyAction::Restrict => {
                Ok(Some(format!("ON UPDATE {}", action.sql())))
            }
            _ => Err(SqlError::unsupported(
                self.vendor(),
                format!("ON UPDATE {}", action.sql()),
            )),
        }
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
}
