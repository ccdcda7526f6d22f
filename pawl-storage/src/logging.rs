//! Statement logging decorator

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::connection::{Connection, Row};
use crate::StorageResult;

/// Wraps a connection and logs every statement with its duration.
///
/// Statements slower than the threshold are logged at warn level.
pub struct LoggingConnection {
    inner: Arc<dyn Connection>,
    slow_statement_threshold: Option<Duration>,
}

impl LoggingConnection {
    pub fn new(inner: Arc<dyn Connection>, slow_statement_threshold: Option<Duration>) -> Self {
        Self {
            inner,
            slow_statement_threshold,
        }
    }

    /// The wrapped, non-instrumented connection
    pub fn inner(&self) -> &Arc<dyn Connection> {
        &self.inner
    }

    fn record(&self, query: &str, params: &[Value], elapsed: Duration, failed: bool) {
        match self.slow_statement_threshold {
            Some(threshold) if elapsed >= threshold => warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                "Slow statement: {}",
                query
            ),
            _ => debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                params = params.len(),
                failed,
                "{}",
                query
            ),
        }
    }
}

#[async_trait]
impl Connection for LoggingConnection {
    async fn execute(&self, query: &str, params: &[Value]) -> StorageResult<u64> {
        let started = Instant::now();
        let result = self.inner.execute(query, params).await;
        self.record(query, params, started.elapsed(), result.is_err());
        result
    }

    async fn fetch_all(&self, query: &str, params: &[Value]) -> StorageResult<Vec<Row>> {
        let started = Instant::now();
        let result = self.inner.fetch_all(query, params).await;
        self.record(query, params, started.elapsed(), result.is_err());
        result
    }

    async fn begin(&self) -> StorageResult<()> {
        debug!("BEGIN");
        self.inner.begin().await
    }

    async fn commit(&self) -> StorageResult<()> {
        debug!("COMMIT");
        self.inner.commit().await
    }

    async fn rollback(&self) -> StorageResult<()> {
        debug!("ROLLBACK");
        self.inner.rollback().await
    }

    async fn table_names(&self) -> StorageResult<Vec<String>> {
        self.inner.table_names().await
    }

    async fn ping(&self) -> StorageResult<bool> {
        self.inner.ping().await
    }
}
