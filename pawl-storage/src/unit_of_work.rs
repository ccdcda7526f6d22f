//! Transaction finalisation around a unit of work

use pawl_core::CommitBehavior;
use std::future::Future;
use tracing::warn;

use crate::connection::Connection;
use crate::StorageError;

/// Run `work` on `connection`, opening and finalising a transaction as
/// `behavior` requires.
///
/// Errors from finalising after a failed unit of work are logged and the
/// original error is returned.
pub async fn with_commit_behavior<T, E, F, Fut>(
    connection: &dyn Connection,
    behavior: CommitBehavior,
    work: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<StorageError> + std::fmt::Display,
{
    if !behavior.opens_transaction() {
        return work().await;
    }

    connection.begin().await?;
    let result = work().await;

    match (behavior, result) {
        (CommitBehavior::CommitOnSuccessRollbackOnException, Err(error)) => {
            if let Err(rollback_error) = connection.rollback().await {
                warn!("Rollback after '{}' failed: {}", error, rollback_error);
            }
            Err(error)
        }
        (_, Ok(value)) => {
            connection.commit().await?;
            Ok(value)
        }
        (_, Err(error)) => {
            if let Err(commit_error) = connection.commit().await {
                warn!("Commit after '{}' failed: {}", error, commit_error);
            }
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionManager;
    use crate::sqlite::SqliteConnectionManager;
    use crate::StorageResult;
    use std::sync::Arc;
    use std::time::Duration;

    async fn connection() -> Arc<dyn Connection> {
        let connection = SqliteConnectionManager::new("sqlite::memory:", Duration::from_secs(1))
            .unwrap()
            .get_connection()
            .await
            .unwrap();
        connection.execute("CREATE TABLE t (x INTEGER)", &[]).await.unwrap();
        connection
    }

    async fn count(connection: &dyn Connection) -> usize {
        connection.fetch_all("SELECT x FROM t", &[]).await.unwrap().len()
    }

    async fn insert_then_fail(connection: &dyn Connection) -> StorageResult<()> {
        connection.execute("INSERT INTO t VALUES (1)", &[]).await?;
        Err(StorageError::Other("unit of work failed".to_string()))
    }

    #[tokio::test]
    async fn test_commit_regardless_keeps_work_on_failure() {
        let connection = connection().await;
        let result = with_commit_behavior(connection.as_ref(), CommitBehavior::CommitRegardless, || {
            insert_then_fail(connection.as_ref())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(count(connection.as_ref()).await, 1);
    }

    #[tokio::test]
    async fn test_rollback_on_exception_discards_work() {
        let connection = connection().await;
        let result = with_commit_behavior(
            connection.as_ref(),
            CommitBehavior::CommitOnSuccessRollbackOnException,
            || insert_then_fail(connection.as_ref()),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(count(connection.as_ref()).await, 0);
    }

    #[tokio::test]
    async fn test_commit_on_success() {
        let connection = connection().await;
        let inserted = with_commit_behavior(
            connection.as_ref(),
            CommitBehavior::CommitOnSuccessRollbackOnException,
            || async { connection.execute("INSERT INTO t VALUES (2)", &[]).await },
        )
        .await
        .unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(count(connection.as_ref()).await, 1);
    }

    #[tokio::test]
    async fn test_auto_commit_opens_no_transaction() {
        let connection = connection().await;
        let _ = with_commit_behavior(connection.as_ref(), CommitBehavior::AutoCommit, || {
            insert_then_fail(connection.as_ref())
        })
        .await;

        assert_eq!(count(connection.as_ref()).await, 1);
        // No transaction is left open
        assert!(connection.commit().await.is_err());
    }
}
