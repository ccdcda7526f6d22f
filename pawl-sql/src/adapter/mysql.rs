//! MySQL dialect

use super::{required_limit, select_for_update_sql, AdapterContext, DatabaseAdapter, Vendor};
use crate::column::{
    numeric, sized, CharacterSet, CharacterSetName, ColumnAttributes, ColumnCapabilities,
    ColumnDefinition, ColumnType,
};
use crate::constraint::ForeignKeyAction;
use crate::error::{SqlError, SqlResult};
use crate::naming::UnquotedNameConverter;

#[derive(Debug, Clone)]
pub struct MysqlAdapter {
    context: AdapterContext,
}

impl MysqlAdapter {
    pub fn new(schema: Option<String>) -> Self {
        Self::from_context(AdapterContext::new(schema))
    }

    pub fn from_context(context: AdapterContext) -> Self {
        Self { context }
    }

    fn reject_set_default(&self, clause: &str, action: ForeignKeyAction) -> SqlResult<Option<String>> {
        if action == ForeignKeyAction::SetDefault {
            return Err(SqlError::unsupported(
                self.vendor(),
                format!("{} SET DEFAULT", clause),
            ));
        }
        Ok(Some(format!("{} {}", clause, action.sql())))
    }
}

impl DatabaseAdapter for MysqlAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Mysql
    }

    fn context(&self) -> &AdapterContext {
        &self.context
    }

    fn quote_character(&self) -> char {
        '`'
    }

    fn unquoted_name_converter(&self) -> UnquotedNameConverter {
        UnquotedNameConverter::Preserve
    }

    fn adding_foreign_key_constraint_creates_index(&self) -> bool {
        true
    }

    fn supports_check_constraints(&self) -> bool {
        false
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
        column: &str,
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
            ColumnType::Varbinary => {
                let limit = required_limit(self.vendor(), column, "VARBINARY", attributes)?;
                format!("VARBINARY({})", limit)
            }
            ColumnType::Varchar => {
                let limit = required_limit(self.vendor(), column, "VARCHAR", attributes)?;
                format!("VARCHAR({})", limit)
            }
        };
        if attributes.auto_increment {
            sql.push_str(" AUTO_INCREMENT");
        }
        Ok(sql)
    }

    fn character_set_sql(&self, _column: &str, character_set: &CharacterSet) -> Option<String> {
        let name = match &character_set.name {
            CharacterSetName::Unicode => "utf8mb4",
            CharacterSetName::Named(name) => name.as_str(),
        };
        let mut sql = format!("CHARACTER SET {}", name);
        if let Some(collation) = &character_set.collation {
            sql.push_str(" COLLATE ");
            sql.push_str(collation);
        }
        Some(sql)
    }

    fn alter_column_sql(&self, table: &str, column: &ColumnDefinition) -> SqlResult<String> {
        Ok(format!(
            "ALTER TABLE {} MODIFY COLUMN {}",
            self.quote_table_name(table),
            column.to_column_sql()
        ))
    }

    fn drop_column_keyword(&self) -> &'static str {
        "DROP"
    }

    fn drop_index_sql(&self, table: &str, index: &str) -> String {
        format!(
            "DROP INDEX {} ON {}",
            self.quote_identifier(index),
            self.quote_table_name(table)
        )
    }

    fn on_delete_sql(&self, action: ForeignKeyAction) -> SqlResult<Option<String>> {
        self.reject_set_default("ON DELETE", action)
    }

    fn on_update_sql(&self, action: ForeignKeyAction) -> SqlResult<Option<String>> {
        self.reject_set_default("ON UPDATE", action)
    }

    fn drop_foreign_key_keyword(&self) -> &'static str {
        "FOREIGN KEY"
    }

    fn schema_privilege_target(&self, schema: &str) -> SqlResult<String> {
        Ok(format!("{}.*", self.quote_identifier(schema)))
    }
}
