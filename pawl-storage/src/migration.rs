//! The migration trait and the context migrations run in

use async_trait::async_trait;
use pawl_core::CommitBehavior;
use pawl_sql::{
    CheckOption, ColumnDefinition, ColumnOption, ColumnType, DatabaseAdapter, ForeignKeyOption,
    GrantPrivilege, IndexOption, SchemaPrivilege, TableColumns, TableDefinition,
};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use crate::connection::Connection;
use crate::unit_of_work::with_commit_behavior;
use crate::MigrationResult;

/// One reversible schema change.
///
/// Implementations are instantiated fresh for every run and receive the
/// connection and adapter through the [`MigrationContext`].
#[async_trait]
pub trait Migration: Send + Sync {
    /// Apply the change
    async fn up(&self, context: &MigrationContext) -> MigrationResult<()>;

    /// Undo the change
    async fn down(&self, context: &MigrationContext) -> MigrationResult<()>;
}

/// Connection, adapter and schema builder operations available to a migration
#[derive(Clone)]
pub struct MigrationContext {
    connection: Arc<dyn Connection>,
    raw_connection: Arc<dyn Connection>,
    adapter: Arc<dyn DatabaseAdapter>,
}

impl MigrationContext {
    pub fn new(
        connection: Arc<dyn Connection>,
        raw_connection: Arc<dyn Connection>,
        adapter: Arc<dyn DatabaseAdapter>,
    ) -> Self {
        Self {
            connection,
            raw_connection,
            adapter,
        }
    }

    /// The logging connection
    pub fn connection(&self) -> &dyn Connection {
        self.connection.as_ref()
    }

    /// The connection without statement logging
    pub fn raw_connection(&self) -> &dyn Connection {
        self.raw_connection.as_ref()
    }

    pub fn adapter(&self) -> &dyn DatabaseAdapter {
        self.adapter.as_ref()
    }

    /// Execute one statement
    pub async fn execute(&self, sql: &str) -> MigrationResult<u64> {
        Ok(self.connection.execute(sql, &[]).await?)
    }

    /// Run `work` in a transaction that commits on success and rolls back on error
    pub async fn with_transaction<T, F, Fut>(&self, work: F) -> MigrationResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MigrationResult<T>>,
    {
        with_commit_behavior(
            self.connection.as_ref(),
            CommitBehavior::CommitOnSuccessRollbackOnException,
            work,
        )
        .await
    }

    /// Run one parameterised statement for every row of parameters, in a
    /// single transaction. Returns the total affected row count.
    pub async fn execute_batch(&self, sql: &str, rows: Vec<Vec<Value>>) -> MigrationResult<u64> {
        self.with_transaction(|| async move {
            let mut affected = 0;
            for params in &rows {
                affected += self.connection.execute(sql, params).await?;
            }
            Ok(affected)
        })
        .await
    }

    /// Create a table with the columns added by `define`
    ///
    /// ```ignore
    /// context
    ///     .create_table("people", |table| {
    ///         table
    ///             .integer("id", [ColumnOption::PrimaryKey])?
    ///             .varchar("name", [ColumnOption::limit(255)?])?;
    ///         Ok(())
    ///     })
    ///     .await?;
    /// ```
    pub async fn create_table<F>(&self, table: &str, define: F) -> MigrationResult<()>
    where
        F: FnOnce(&mut TableDefinition<'_>) -> pawl_sql::SqlResult<()>,
    {
        let sql = {
            let mut definition = TableDefinition::new(self.adapter.as_ref(), table);
            define(&mut definition)?;
            definition.to_sql()?
        };
        self.execute(&sql).await?;
        Ok(())
    }

    pub async fn drop_table(&self, table: &str) -> MigrationResult<()> {
        self.execute(&self.adapter.drop_table_sql(table)).await?;
        Ok(())
    }

    fn column_definition(
        &self,
        table: &str,
        column: &str,
        column_type: ColumnType,
        options: impl IntoIterator<Item = ColumnOption>,
    ) -> MigrationResult<ColumnDefinition> {
        Ok(ColumnDefinition::new(
            self.adapter.as_ref(),
            table,
            column,
            column_type,
            options.into_iter().collect(),
        )?)
    }

    pub async fn add_column(
        &self,
        table: &str,
        column: &str,
        column_type: ColumnType,
        options: impl IntoIterator<Item = ColumnOption>,
    ) -> MigrationResult<()> {
        let definition = self.column_definition(table, column, column_type, options)?;
        self.execute(&self.adapter.add_column_sql(table, &definition)).await?;
        Ok(())
    }

    /// Change an existing column to the given definition
    pub async fn alter_column(
        &self,
        table: &str,
        column: &str,
        column_type: ColumnType,
        options: impl IntoIterator<Item = ColumnOption>,
    ) -> MigrationResult<()> {
        let definition = self.column_definition(table, column, column_type, options)?;
        let sql = self.adapter.alter_column_sql(table, &definition)?;
        self.execute(&sql).await?;
        Ok(())
    }

    pub async fn remove_column(&self, table: &str, column: &str) -> MigrationResult<()> {
        self.execute(&self.adapter.remove_column_sql(table, column)).await?;
        Ok(())
    }

    pub async fn add_index(
        &self,
        table: &str,
        columns: &[&str],
        options: &[IndexOption],
    ) -> MigrationResult<()> {
        let sql = self.adapter.add_index_sql(table, columns, options)?;
        self.execute(&sql).await?;
        Ok(())
    }

    pub async fn remove_index(
        &self,
        table: &str,
        columns: &[&str],
        options: &[IndexOption],
    ) -> MigrationResult<()> {
        let sql = self.adapter.remove_index_sql(table, columns, options)?;
        self.execute(&sql).await?;
        Ok(())
    }

    pub async fn add_foreign_key(
        &self,
        on: &TableColumns,
        references: &TableColumns,
        options: &[ForeignKeyOption],
    ) -> MigrationResult<()> {
        let sql = self.adapter.add_foreign_key_sql(on, references, options)?;
        self.execute(&sql).await?;
        Ok(())
    }

    pub async fn remove_foreign_key(
        &self,
        on: &TableColumns,
        references: &TableColumns,
        options: &[ForeignKeyOption],
    ) -> MigrationResult<()> {
        let sql = self.adapter.remove_foreign_key_sql(on, references, options)?;
        self.execute(&sql).await?;
        Ok(())
    }

    /// Add a foreign key and, where the vendor does not do so itself, an
    /// index on the referencing columns
    pub async fn add_indexed_foreign_key(
        &self,
        on: &TableColumns,
        references: &TableColumns,
        options: &[ForeignKeyOption],
    ) -> MigrationResult<()> {
        self.add_foreign_key(on, references, options).await?;
        if !self.adapter.adding_foreign_key_constraint_creates_index() {
            self.add_index(&on.table, &on.column_names(), &[]).await?;
        }
        Ok(())
    }

    /// Reverse of [`add_indexed_foreign_key`](Self::add_indexed_foreign_key)
    pub async fn remove_indexed_foreign_key(
        &self,
        on: &TableColumns,
        references: &TableColumns,
        options: &[ForeignKeyOption],
    ) -> MigrationResult<()> {
        self.remove_foreign_key(on, references, options).await?;
        if !self.adapter.adding_foreign_key_constraint_creates_index() {
            self.remove_index(&on.table, &on.column_names(), &[]).await?;
        }
        Ok(())
    }

    /// Add a check constraint; skipped with a warning on vendors that ignore checks
    pub async fn add_check(
        &self,
        on: &TableColumns,
        expression: &str,
        options: &[CheckOption],
    ) -> MigrationResult<()> {
        if let Some(sql) = self.adapter.add_check_sql(on, expression, options)? {
            self.execute(&sql).await?;
        }
        Ok(())
    }

    pub async fn remove_check(&self, on: &TableColumns, options: &[CheckOption]) -> MigrationResult<()> {
        if let Some(sql) = self.adapter.remove_check_sql(on, options)? {
            self.execute(&sql).await?;
        }
        Ok(())
    }

    pub async fn grant(
        &self,
        table: &str,
        grantees: &[&str],
        privileges: &[GrantPrivilege],
    ) -> MigrationResult<()> {
        let sql = self.adapter.grant_sql(table, grantees, privileges)?;
        self.execute(&sql).await?;
        Ok(())
    }

    pub async fn revoke(
        &self,
        table: &str,
        grantees: &[&str],
        privileges: &[GrantPrivilege],
    ) -> MigrationResult<()> {
        let sql = self.adapter.revoke_sql(table, grantees, privileges)?;
        self.execute(&sql).await?;
        Ok(())
    }

    pub async fn grant_schema_privileges(
        &self,
        grantees: &[&str],
        privileges: &[SchemaPrivilege],
    ) -> MigrationResult<()> {
        let sql = self.adapter.grant_schema_privileges_sql(grantees, privileges)?;
        self.execute(&sql).await?;
        Ok(())
    }

    pub async fn revoke_schema_privileges(
        &self,
        grantees: &[&str],
        privileges: &[SchemaPrivilege],
    ) -> MigrationResult<()> {
        let sql = self.adapter.revoke_schema_privileges_sql(grantees, privileges)?;
        self.execute(&sql).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionManager;
    use crate::sqlite::SqliteConnectionManager;
    use crate::MigrationError;
    use pawl_sql::{create_adapter, on, references, CollectingSink, Diagnostic, Vendor};
    use serde_json::json;
    use std::time::Duration;

    async fn context() -> MigrationContext {
        let connection = SqliteConnectionManager::new("sqlite::memory:", Duration::from_secs(1))
            .unwrap()
            .get_connection()
            .await
            .unwrap();
        let adapter = create_adapter(Vendor::Sqlite, None, CollectingSink::new());
        MigrationContext::new(connection.clone(), connection, adapter)
    }

    async fn create_people(context: &MigrationContext) {
        context
            .create_table("people", |table| {
                table
                    .integer("id", [ColumnOption::PrimaryKey])?
                    .varchar("name", [ColumnOption::limit(40)?, ColumnOption::NotNull])?;
                Ok(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_alter_and_drop_table() {
        let context = context().await;
        create_people(&context).await;
        context
            .add_column("people", "age", ColumnType::Smallint, [ColumnOption::Nullable])
            .await
            .unwrap();
        context.add_index("people", &["name"], &[]).await.unwrap();

        context
            .execute_batch(
                "INSERT INTO people (id, name, age) VALUES (?, ?, ?)",
                vec![
                    vec![json!(1), json!("Ada"), json!(36)],
                    vec![json!(2), json!("Grace"), Value::Null],
                ],
            )
            .await
            .unwrap();
        let rows = context.connection().fetch_all("SELECT id FROM people", &[]).await.unwrap();
        assert_eq!(rows.len(), 2);

        context.remove_index("people", &["name"], &[]).await.unwrap();
        context.drop_table("people").await.unwrap();
        assert!(context.connection().table_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_null_primary_key_rejects_null() {
        let context = context().await;
        context
            .create_table("codes", |table| {
                table.varchar(
                    "code",
                    [ColumnOption::limit(10)?, ColumnOption::PrimaryKey, ColumnOption::NotNull],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let result = context.execute("INSERT INTO codes (code) VALUES (NULL)").await;
        assert!(result.is_err());
        let rows = context.connection().fetch_all("SELECT code FROM codes", &[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_column_fails_before_execution() {
        let context = context().await;
        let error = context
            .create_table("prices", |table| {
                table.decimal("amount", [ColumnOption::Scale(2)])?;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(error, MigrationError::Sql(_)));
        assert!(context.connection().table_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_rolls_back_as_a_unit() {
        let context = context().await;
        create_people(&context).await;

        let result = context
            .execute_batch(
                "INSERT INTO people (id, name) VALUES (?, ?)",
                vec![vec![json!(1), json!("Ada")], vec![json!(1), json!("Duplicate")]],
            )
            .await;

        assert!(result.is_err());
        let rows = context.connection().fetch_all("SELECT id FROM people", &[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_with_transaction_returns_value() {
        let context = context().await;
        create_people(&context).await;

        let inserted = context
            .with_transaction(|| async {
                context.execute("INSERT INTO people (id, name) VALUES (1, 'Ada')").await
            })
            .await
            .unwrap();
        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    async fn test_unsupported_statements_are_errors() {
        let context = context().await;
        create_people(&context).await;

        let error = context
            .add_foreign_key(&on("people", ["id"]), &references("places", ["id"]), &[])
            .await
            .unwrap_err();
        assert_eq!(error.error_code(), "UNSUPPORTED_FEATURE");

        let error = context
            .grant("people", &["reporting"], &[GrantPrivilege::Select(vec![])])
            .await
            .unwrap_err();
        assert_eq!(error.error_code(), "UNSUPPORTED_FEATURE");
    }

    #[tokio::test]
    async fn test_column_check_constraints_are_enforced() {
        let sink = CollectingSink::new();
        let connection = SqliteConnectionManager::new("sqlite::memory:", Duration::from_secs(1))
            .unwrap()
            .get_connection()
            .await
            .unwrap();
        let context = MigrationContext::new(
            connection.clone(),
            connection,
            create_adapter(Vendor::Sqlite, None, sink.clone()),
        );

        context
            .create_table("scores", |table| {
                table.integer("points", [ColumnOption::check("points >= 0")])?;
                Ok(())
            })
            .await
            .unwrap();

        assert!(context.execute("INSERT INTO scores (points) VALUES (-1)").await.is_err());
        assert!(!sink
            .diagnostics()
            .iter()
            .any(|diagnostic| matches!(diagnostic, Diagnostic::CheckConstraintIgnored { .. })));
    }
}
