//! Connection management abstractions

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::StorageResult;

/// A result row keyed by column name
pub type Row = serde_json::Map<String, Value>;

/// A database session.
///
/// Transactions nest: a `begin` inside an open transaction opens a
/// savepoint, and the matching `commit`/`rollback` releases or rolls back
/// to it.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a statement that returns no rows, returning the affected row count
    async fn execute(&self, query: &str, params: &[Value]) -> StorageResult<u64>;

    /// Execute a query and return every row
    async fn fetch_all(&self, query: &str, params: &[Value]) -> StorageResult<Vec<Row>>;

    /// Begin a transaction, or a savepoint when one is already open
    async fn begin(&self) -> StorageResult<()>;

    /// Commit the innermost open transaction
    async fn commit(&self) -> StorageResult<()>;

    /// Roll back the innermost open transaction
    async fn rollback(&self) -> StorageResult<()>;

    /// Names of the tables visible to this session
    async fn table_names(&self) -> StorageResult<Vec<String>>;

    /// Check if the connection is healthy
    async fn ping(&self) -> StorageResult<bool>;
}

/// Connection manager trait
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    /// Open (or share) a connection
    async fn get_connection(&self) -> StorageResult<Arc<dyn Connection>>;

    /// Health check for the underlying database
    async fn health_check(&self) -> StorageResult<bool>;

    /// Close all connections
    async fn close(&self) -> StorageResult<()>;
}
