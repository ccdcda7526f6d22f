//! SQLite driver over sqlx

use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column as _, ConnectOptions as _, Connection as _, Row as _};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::connection::{Connection, ConnectionManager, Row};
use crate::{StorageError, StorageResult};

/// Opens SQLite sessions for one database URL.
///
/// File databases get a fresh session per `get_connection`, so the version
/// table lock is contended the same way it is between processes. An
/// in-memory database only exists inside the session that created it, so
/// every caller shares that one session.
pub struct SqliteConnectionManager {
    options: SqliteConnectOptions,
    in_memory: bool,
    shared: Mutex<Option<Arc<SqliteSession>>>,
}

impl SqliteConnectionManager {
    pub fn new(url: &str, busy_timeout: Duration) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StorageError::ConfigError(format!("Invalid SQLite URL '{}': {}", url, e)))?
            .create_if_missing(true)
            .busy_timeout(busy_timeout);

        Ok(Self {
            options,
            in_memory: url.contains(":memory:") || url.contains("mode=memory"),
            shared: Mutex::new(None),
        })
    }

    async fn open(&self) -> StorageResult<Arc<SqliteSession>> {
        let connection = self
            .options
            .connect()
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;
        debug!("Opened SQLite session (in memory: {})", self.in_memory);
        Ok(Arc::new(SqliteSession::new(connection)))
    }
}

#[async_trait]
impl ConnectionManager for SqliteConnectionManager {
    async fn get_connection(&self) -> StorageResult<Arc<dyn Connection>> {
        if !self.in_memory {
            let session: Arc<dyn Connection> = self.open().await?;
            return Ok(session);
        }

        let mut shared = self.shared.lock().await;
        let session = match shared.as_ref() {
            Some(session) => session.clone(),
            None => {
                let session = self.open().await?;
                *shared = Some(session.clone());
                session
            }
        };
        Ok(session)
    }

    async fn health_check(&self) -> StorageResult<bool> {
        self.get_connection().await?.ping().await
    }

    async fn close(&self) -> StorageResult<()> {
        // Sessions close when their last handle is dropped
        self.shared.lock().await.take();
        Ok(())
    }
}

struct SessionState {
    connection: SqliteConnection,
    depth: usize,
}

/// One SQLite connection with nested transaction tracking
pub struct SqliteSession {
    state: Mutex<SessionState>,
}

impl SqliteSession {
    fn new(connection: SqliteConnection) -> Self {
        Self {
            state: Mutex::new(SessionState { connection, depth: 0 }),
        }
    }

    async fn run(state: &mut SessionState, sql: &str) -> StorageResult<()> {
        sqlx::query(sql)
            .execute(&mut state.connection)
            .await
            .map_err(|e| StorageError::TransactionFailed(format!("{}: {}", sql, e)))?;
        Ok(())
    }
}

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Busy and locked results become `ConcurrencyError`, everything else `QueryFailed`
fn query_error(query: &str, error: sqlx::Error) -> StorageError {
    let primary_code = match &error {
        sqlx::Error::Database(database) => database
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| code & 0xff),
        _ => None,
    };
    match primary_code {
        Some(SQLITE_BUSY | SQLITE_LOCKED) => {
            StorageError::ConcurrencyError(format!("{}: {}", query, error))
        }
        _ => StorageError::QueryFailed(format!("{}: {}", query, error)),
    }
}

fn savepoint(depth: usize) -> String {
    format!("pawl_sp_{}", depth)
}

fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(value) => query.bind(*value),
            Value::Number(number) => match (number.as_i64(), number.as_f64()) {
                (Some(value), _) => query.bind(value),
                (None, Some(value)) => query.bind(value),
                (None, None) => query.bind(number.to_string()),
            },
            Value::String(value) => query.bind(value.clone()),
            other => query.bind(other.to_string()),
        };
    }
    query
}

fn decode_value(row: &SqliteRow, index: usize) -> Value {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(Some(value)) = row.try_get::<Option<f64>, _>(index) {
        return Value::from(value);
    }
    if let Ok(Some(value)) = row.try_get::<Option<String>, _>(index) {
        return Value::String(value);
    }
    if let Ok(Some(bytes)) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return Value::Array(bytes.into_iter().map(Value::from).collect());
    }
    Value::Null
}

fn decode_row(row: &SqliteRow) -> Row {
    row.columns()
        .iter()
        .map(|column| (column.name().to_string(), decode_value(row, column.ordinal())))
        .collect()
}

#[async_trait]
impl Connection for SqliteSession {
    async fn execute(&self, query: &str, params: &[Value]) -> StorageResult<u64> {
        let mut state = self.state.lock().await;
        let result = bind_params(sqlx::query(query), params)
            .execute(&mut state.connection)
            .await
            .map_err(|e| query_error(query, e))?;
        Ok(result.rows_affected())
    }

    async fn fetch_all(&self, query: &str, params: &[Value]) -> StorageResult<Vec<Row>> {
        let mut state = self.state.lock().await;
        let rows = bind_params(sqlx::query(query), params)
            .fetch_all(&mut state.connection)
            .await
            .map_err(|e| query_error(query, e))?;
        Ok(rows.iter().map(decode_row).collect())
    }

    async fn begin(&self) -> StorageResult<()> {
        let mut state = self.state.lock().await;
        let sql = match state.depth {
            0 => "BEGIN".to_string(),
            depth => format!("SAVEPOINT {}", savepoint(depth)),
        };
        Self::run(&mut state, &sql).await?;
        state.depth += 1;
        Ok(())
    }

    async fn commit(&self) -> StorageResult<()> {
        let mut state = self.state.lock().await;
        let sql = match state.depth {
            0 => return Err(StorageError::TransactionFailed("No transaction to commit".to_string())),
            1 => "COMMIT".to_string(),
            depth => format!("RELEASE SAVEPOINT {}", savepoint(depth - 1)),
        };
        // A failed COMMIT leaves the transaction open
        Self::run(&mut state, &sql).await?;
        state.depth -= 1;
        Ok(())
    }

    async fn rollback(&self) -> StorageResult<()> {
        let mut state = self.state.lock().await;
        match state.depth {
            0 => Err(StorageError::TransactionFailed("No transaction to roll back".to_string())),
            1 => {
                Self::run(&mut state, "ROLLBACK").await?;
                state.depth = 0;
                Ok(())
            }
            depth => {
                let name = savepoint(depth - 1);
                Self::run(&mut state, &format!("ROLLBACK TO SAVEPOINT {}", name)).await?;
                Self::run(&mut state, &format!("RELEASE SAVEPOINT {}", name)).await?;
                state.depth -= 1;
                Ok(())
            }
        }
    }

    async fn table_names(&self) -> StorageResult<Vec<String>> {
        let rows = self
            .fetch_all(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                &[],
            )
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.get("name").and_then(Value::as_str).map(str::to_string))
            .collect())
    }

    async fn ping(&self) -> StorageResult<bool> {
        let mut state = self.state.lock().await;
        match state.connection.ping().await {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("SQLite ping failed: {}", e);
                Ok(false)
            }
        }
    }
}
