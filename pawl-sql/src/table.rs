//! CREATE TABLE builder

use crate::adapter::DatabaseAdapter;
use crate::column::{ColumnDefinition, ColumnOption, ColumnType};
use crate::error::SqlResult;

/// Collects column definitions for a new table
///
/// ```ignore
/// let mut table = TableDefinition::new(adapter, "people");
/// table
///     .integer("id", [ColumnOption::PrimaryKey])?
///     .varchar("name", [ColumnOption::limit(255)?, ColumnOption::NotNull])?;
/// let sql = table.to_sql()?;
/// ```
#[derive(Debug)]
pub struct TableDefinition<'a> {
    adapter: &'a dyn DatabaseAdapter,
    table: String,
    columns: Vec<ColumnDefinition>,
}

impl<'a> TableDefinition<'a> {
    pub fn new(adapter: &'a dyn DatabaseAdapter, table: impl Into<String>) -> Self {
        Self {
            adapter,
            table: table.into(),
            columns: Vec::new(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Add a column; fails as soon as the column cannot be defined
    pub fn column(
        &mut self,
        name: &str,
        column_type: ColumnType,
        options: impl IntoIterator<Item = ColumnOption>,
    ) -> SqlResult<&mut Self> {
        let definition = ColumnDefinition::new(
            self.adapter,
            &self.table,
            name,
            column_type,
            options.into_iter().collect(),
        )?;
        self.columns.push(definition);
        Ok(self)
    }

    pub fn bigint(&mut self, name: &str, options: impl IntoIterator<Item = ColumnOption>) -> SqlResult<&mut Self> {
        self.column(name, ColumnType::Bigint, options)
    }

    pub fn blob(&mut self, name: &str, options: impl IntoIterator<Item = ColumnOption>) -> SqlResult<&mut Self> {
        self.column(name, ColumnType::Blob, options)
    }

    pub fn boolean(&mut self, name: &str, options: impl IntoIterator<Item = ColumnOption>) -> SqlResult<&mut Self> {
        self.column(name, ColumnType::Boolean, options)
    }

    pub fn char(&mut self, name: &str, options: impl IntoIterator<Item = ColumnOption>) -> SqlResult<&mut Self> {
        self.column(name, ColumnType::Char, options)
    }

    pub fn decimal(&mut self, name: &str, options: impl IntoIterator<Item = ColumnOption>) -> SqlResult<&mut Self> {
        self.column(name, ColumnType::Decimal, options)
    }

    pub fn integer(&mut self, name: &str, options: impl IntoIterator<Item = ColumnOption>) -> SqlResult<&mut Self> {
        self.column(name, ColumnType::Integer, options)
    }

    pub fn smallint(&mut self, name: &str, options: impl IntoIterator<Item = ColumnOption>) -> SqlResult<&mut Self> {
        self.column(name, ColumnType::Smallint, options)
    }

    pub fn timestamp(&mut self, name: &str, options: impl IntoIterator<Item = ColumnOption>) -> SqlResult<&mut Self> {
        self.column(name, ColumnType::Timestamp, options)
    }

    pub fn varbinary(&mut self, name: &str, options: impl IntoIterator<Item = ColumnOption>) -> SqlResult<&mut Self> {
        self.column(name, ColumnType::Varbinary, options)
    }

    pub fn varchar(&mut self, name: &str, options: impl IntoIterator<Item = ColumnOption>) -> SqlResult<&mut Self> {
        self.column(name, ColumnType::Varchar, options)
    }

    /// CREATE TABLE statement for the collected columns
    pub fn to_sql(&self) -> SqlResult<String> {
        self.adapter.create_table_sql(&self.table, &self.columns)
    }
}
