//! H2 dialect

use super::{select_for_update_sql, AdapterContext, DatabaseAdapter, Vendor};
use crate::column::{numeric, sized, ColumnAttributes, ColumnCapabilities, ColumnType};
use crate::error::{SqlError, SqlResult};
use crate::grant::GrantPrivilege;
use crate::naming::UnquotedNameConverter;

#[derive(Debug, Clone)]
pub struct H2Adapter {
    context: AdapterContext,
}

impl H2Adapter {
    pub fn new(schema: Option<String>) -> Self {
        Self::from_context(AdapterContext::new(schema))
    }

    pub fn from_context(context: AdapterContext) -> Self {
        Self { context }
    }
}

impl DatabaseAdapter for H2Adapter {
    fn vendor(&self) -> Vendor {
        Vendor::H2
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
        select_for_update_sql(&self.quote_table_name(table))
    }

    fn column_capabilities(&self, column_type: ColumnType) -> SqlResult<ColumnCapabilities> {
        let base = column_type.base_capabilities();
        if column_type.is_integral() {
            Ok(base.with_auto_increment())
        } else {
            Ok(base)
        }
    }

    fn column_type_sql(
        &self,
        _column: &str,
        column_type: ColumnType,
        attributes: &ColumnAttributes,
    ) -> SqlResult<String> {
        let mut sql = match column_type {
            ColumnType::Bigint => "BIGINT".to_string(),
            ColumnType::Blob => "BLOB".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Char => sized("CHAR", attributes.limit),
            ColumnType::Decimal => numeric("DECIMAL", attributes.precision, attributes.scale),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::Smallint => "SMALLINT".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Varbinary => sized("VARBINARY", attributes.limit),
            ColumnType::Varchar => sized("VARCHAR", attributes.limit),
        };
        if attributes.auto_increment {
            sql.push_str(" AUTO_INCREMENT");
        }
        Ok(sql)
    }

    fn check_privilege(&self, privilege: &GrantPrivilege) -> SqlResult<()> {
        if !privilege.columns().is_empty() {
            return Err(SqlError::unsupported(
                self.vendor(),
                format!("column-level {} privileges", privilege.keyword()),
            ));
        }
        Ok(())
    }
}
