//! Oracle dialect

use super::{lock_exclusive_sql, required_limit, AdapterContext, DatabaseAdapter, Vendor};
use crate::column::{
    numeric, sized, CharacterSet, ColumnAttributes, ColumnCapabilities, ColumnDefinition,
    ColumnType,
};
use crate::constraint::ForeignKeyAction;
use crate::diagnostics::Diagnostic;
use crate::error::{SqlError, SqlResult};
use crate::naming::UnquotedNameConverter;

#[derive(Debug, Clone)]
pub struct OracleAdapter {
    context: AdapterContext,
}

impl OracleAdapter {
    pub fn new(schema: Option<String>) -> Self {
        Self::from_context(AdapterContext::new(schema))
    }

    pub fn from_context(context: AdapterContext) -> Self {
        Self { context }
    }
}

fn is_unicode(attributes: &ColumnAttributes) -> bool {
    attributes
        .character_set
        .as_ref()
        .map(CharacterSet::is_unicode)
        .unwrap_or(false)
}

impl DatabaseAdapter for OracleAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Oracle
    }

    fn context(&self) -> &AdapterContext {
        &self.context
    }

    fn unquoted_name_converter(&self) -> UnquotedNameConverter {
        UnquotedNameConverter::Uppercase
    }

    fn adding_foreign_key_constraint_creates_index(&self) -> bool {
        false
    }

    fn lock_table_sql(&self, table: &str) -> String {
        lock_exclusive_sql(&self.quote_table_name(table))
    }

    fn column_capabilities(&self, column_type: ColumnType) -> SqlResult<ColumnCapabilities> {
        match column_type {
            ColumnType::Boolean => Err(SqlError::UnsupportedColumnType {
                vendor: self.vendor(),
                column_type,
            }),
            ColumnType::Timestamp => Ok(column_type.base_capabilities().with_precision()),
            _ => Ok(column_type.base_capabilities()),
        }
    }

    fn column_type_sql(
        &self,
        column: &str,
        column_type: ColumnType,
        attributes: &ColumnAttributes,
    ) -> SqlResult<String> {
        let sql = match column_type {
            ColumnType::Bigint => "NUMBER(19, 0)".to_string(),
            ColumnType::Blob => "BLOB".to_string(),
            ColumnType::Boolean => {
                return Err(SqlError::UnsupportedColumnType {
                    vendor: self.vendor(),
                    column_type,
                })
            }
            ColumnType::Char if is_unicode(attributes) => sized("NCHAR", attributes.limit),
            ColumnType::Char => sized("CHAR", attributes.limit),
            ColumnType::Decimal => numeric("NUMBER", attributes.precision, attributes.scale),
            ColumnType::Integer => "NUMBER(10, 0)".to_string(),
            ColumnType::Smallint => "NUMBER(5, 0)".to_string(),
            ColumnType::Timestamp => sized("TIMESTAMP", attributes.precision),
            ColumnType::Varbinary => {
                let limit = required_limit(self.vendor(), column, "RAW", attributes)?;
                format!("RAW({})", limit)
            }
            ColumnType::Varchar => {
                let base = if is_unicode(attributes) { "NVARCHAR2" } else { "VARCHAR2" };
                let limit = required_limit(self.vendor(), column, base, attributes)?;
                format!("{}({})", base, limit)
            }
        };
        Ok(sql)
    }

    fn character_set_sql(&self, column: &str, character_set: &CharacterSet) -> Option<String> {
        // Unicode is expressed through the N-types
        if !character_set.is_unicode() || character_set.collation.is_some() {
            self.diagnostics().report(Diagnostic::CharacterSetIgnored {
                column: column.to_string(),
                vendor: self.vendor(),
                character_set: character_set.to_string(),
            });
        }
        None
    }

    fn alter_column_sql(&self, table: &str, column: &ColumnDefinition) -> SqlResult<String> {
        Ok(format!(
            "ALTER TABLE {} MODIFY ({})",
            self.quote_table_name(table),
            column.to_column_sql()
        ))
    }

    fn on_delete_sql(&self, action: ForeignKeyAction) -> SqlResult<Option<String>> {
        match action {
            ForeignKeyAction::NoAction => Ok(None),
            ForeignKeyAction::Cascade | ForeignKeyAction::SetNull => {
                Ok(Some(format!("ON DELETE {}", action.sql())))
            }
            ForeignKeyAction::Restrict | ForeignKeyAction::SetDefault => Err(
                SqlError::unsupported(self.vendor(), format!("ON DELETE {}", action.sql())),
            ),
        }
    }

    fn on_update_sql(&self, action: ForeignKeyAction) -> SqlResult<Option<String>> {
        match action {
            ForeignKeyAction::NoAction => Ok(None),
            _ => Err(SqlError::unsupported(
                self.vendor(),
                format!("ON UPDATE {}", action.sql()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnOption;
    use crate::constraint::{on, references, ForeignKeyOption};
    use crate::diagnostics::CollectingSink;

    #[test]
    fn test_unicode_varchar() {
        let sink = CollectingSink::new();
        let adapter = OracleAdapter::from_context(AdapterContext::new(None).with_diagnostics(sink.clone()));
        let column = ColumnDefinition::new(
            &adapter,
            "people",
            "name",
            ColumnType::Varchar,
            vec![ColumnOption::Limit(20), ColumnOption::character_set(CharacterSet::unicode())],
        )
        .unwrap();
        assert_eq!(column.type_sql(), "NVARCHAR2(20)");
        assert!(sink.take().is_empty());

        let latin = ColumnDefinition::new(
            &adapter,
            "people",
            "code",
            ColumnType::Varchar,
            vec![ColumnOption::Limit(20), ColumnOption::character_set(CharacterSet::named("latin1"))],
        )
        .unwrap();
        assert_eq!(latin.type_sql(), "VARCHAR2(20)");
        assert_eq!(sink.take().len(), 1);
    }

    #[test]
    fn test_raw_requires_limit() {
        let adapter = OracleAdapter::new(None);
        let result = ColumnDefinition::new(&adapter, "t", "bytes", ColumnType::Varbinary, vec![]);
        assert!(matches!(result, Err(SqlError::Construction(_))));
    }

    #[test]
    fn test_numeric_types() {
        let adapter = OracleAdapter::new(None);
        let amount = ColumnDefinition::new(
            &adapter,
            "t",
            "amount",
            ColumnType::Decimal,
            vec![ColumnOption::Precision(10), ColumnOption::Scale(2)],
        )
        .unwrap();
        assert_eq!(amount.type_sql(), "NUMBER(10, 2)");

        let result = ColumnDefinition::new(
            &adapter,
            "t",
            "id",
            ColumnType::Integer,
            vec![ColumnOption::AutoIncrement],
        );
        assert!(matches!(result, Err(SqlError::Construction(_))));
    }

    #[test]
    fn test_foreign_key_actions() {
        let adapter = OracleAdapter::new(None);
        let sql = adapter
            .add_foreign_key_sql(
                &on("people", ["location_id"]),
                &references("locations", ["id"]),
                &[
                    ForeignKeyOption::OnDelete(ForeignKeyAction::NoAction),
                    ForeignKeyOption::OnUpdate(ForeignKeyAction::NoAction),
                ],
            )
            .unwrap();
        assert!(sql.ends_with("REFERENCES \"LOCATIONS\" (\"ID\")"));

        let result = adapter.add_foreign_key_sql(
            &on("people", ["location_id"]),
            &references("locations", ["id"]),
            &[ForeignKeyOption::OnDelete(ForeignKeyAction::Restrict)],
        );
        assert!(matches!(result, Err(SqlError::UnsupportedFeature { .. })));
    }

    #[test]
    fn test_alter_column() {
        let adapter = OracleAdapter::new(None);
        let column = ColumnDefinition::new(
            &adapter,
            "people",
            "name",
            ColumnType::Varchar,
            vec![ColumnOption::Limit(80), ColumnOption::NotNull],
        )
        .unwrap();
        assert_eq!(
            adapter.alter_column_sql("people", &column).unwrap(),
            "ALTER TABLE \"PEOPLE\" MODIFY (\"NAME\" VARCHAR2(80) NOT NULL)"
        );
    }
}
