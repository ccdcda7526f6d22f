//! Resolved column definitions

use super::{resolve_column_options, ColumnAttributes, ColumnOption, ColumnType};
use crate::adapter::DatabaseAdapter;
use crate::diagnostics::Diagnostic;
use crate::error::SqlResult;
use crate::naming::check_name;

/// A column whose options have been resolved and whose DDL has been
/// rendered for one adapter. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    name: String,
    quoted_name: String,
    column_type: ColumnType,
    attributes: ColumnAttributes,
    type_sql: String,
    sql: String,
}

impl ColumnDefinition {
    /// Resolve `options` for a column of `table` and render it.
    ///
    /// Fails when the vendor cannot represent the type or an option is
    /// invalid. Options the type ignores are reported to the adapter's
    /// diagnostics and dropped.
    pub fn new(
        adapter: &dyn DatabaseAdapter,
        table: &str,
        name: &str,
        column_type: ColumnType,
        options: Vec<ColumnOption>,
    ) -> SqlResult<Self> {
        let sink = adapter.diagnostics();
        let capabilities = adapter.column_capabilities(column_type)?;
        let (attributes, residual) = resolve_column_options(name, options, capabilities, sink)?;

        for option in residual {
            match option {
                ColumnOption::CharacterSet(_) => {
                    sink.report(Diagnostic::CharacterSetOnNonCharacterType {
                        column: name.to_string(),
                        column_type,
                    })
                }
                other => sink.report(Diagnostic::UnusedColumnOption {
                    column: name.to_string(),
                    option: other.to_string(),
                }),
            }
        }

        let mut type_sql = adapter.column_type_sql(name, column_type, &attributes)?;
        if let Some(character_set) = &attributes.character_set {
            if let Some(clause) = adapter.character_set_sql(name, character_set) {
                type_sql.push(' ');
                type_sql.push_str(&clause);
            }
        }

        let mut sql = type_sql.clone();
        if let Some(default) = &attributes.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        if attributes.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if attributes.unique {
            sql.push_str(" UNIQUE");
        }
        match attributes.not_null {
            Some(true) => sql.push_str(" NOT NULL"),
            // A primary key cannot be declared NULL; the resolver already warned
            Some(false) if !attributes.primary_key => sql.push_str(" NULL"),
            _ => {}
        }

        let derived = check_name(table, &[name]);
        for (position, check) in attributes.checks.iter().enumerate() {
            let constraint_name = match &check.name {
                Some(explicit) => explicit.clone(),
                None if position == 0 => derived.clone(),
                None => format!("{}_{}", derived, position + 1),
            };
            if adapter.supports_check_constraints() {
                sql.push_str(&format!(
                    " CONSTRAINT {} CHECK ({})",
                    adapter.quote_identifier(&constraint_name),
                    check.expression
                ));
            } else {
                sink.report(Diagnostic::CheckConstraintIgnored {
                    name: constraint_name,
                    vendor: adapter.vendor(),
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            quoted_name: adapter.quote_identifier(name),
            column_type,
            attributes,
            type_sql,
            sql,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quoted_name(&self) -> &str {
        &self.quoted_name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn attributes(&self) -> &ColumnAttributes {
        &self.attributes
    }

    /// Vendor type alone, e.g. `VARCHAR(255)`
    pub fn type_sql(&self) -> &str {
        &self.type_sql
    }

    /// Type followed by default, key, nullability and check clauses
    pub fn to_sql(&self) -> &str {
        &self.sql
    }

    /// Quoted column name followed by [`ColumnDefinition::to_sql`]
    pub fn to_column_sql(&self) -> String {
        format!("{} {}", self.quoted_name, self.sql)
    }
}
