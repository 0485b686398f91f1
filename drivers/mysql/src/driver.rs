use crate::results;
use async_trait::async_trait;
use sqlgate_driver::Error::{ConnectionError, ExecutionError, IoError};
use sqlgate_driver::{
    MySqlConfig, QueryRows, ReadResult, Result, Value, WriteResult, WriteSummary,
};
use sqlparser::dialect::{Dialect, MySqlDialect};
use sqlx::mysql::{
    MySqlArguments, MySqlConnectOptions, MySqlPoolOptions, MySqlSslMode,
};
use sqlx::pool::PoolConnection;
use sqlx::{Executor, MySql, MySqlPool};
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Driver;

impl Driver {
    /// Opens a pooled connection for the given settings.
    ///
    /// # Errors
    /// if the server cannot be reached or refuses the credentials.
    pub async fn connect(
        &self,
        config: &MySqlConfig,
    ) -> Result<Box<dyn sqlgate_driver::Connection>> {
        let connection = Connection::new(config).await?;
        Ok(Box::new(connection))
    }
}

#[derive(Debug)]
pub struct Connection {
    pool: MySqlPool,
    read_only_transactions: bool,
}

impl Connection {
    pub(crate) async fn new(config: &MySqlConfig) -> Result<Connection> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(config.connect_timeout)
            .connect_with(connect_options(config))
            .await
            .map_err(|error| ConnectionError(error.to_string()))?;
        let connection = Connection {
            pool,
            read_only_transactions: config.read_only_transactions,
        };

        Ok(connection)
    }

    async fn acquire(&self) -> Result<PoolConnection<MySql>> {
        self.pool
            .acquire()
            .await
            .map_err(|error| ConnectionError(error.to_string()))
    }
}

#[async_trait]
impl sqlgate_driver::Connection for Connection {
    fn dialect(&self) -> Box<dyn Dialect> {
        Box::new(MySqlDialect {})
    }

    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<QueryRows> {
        let mut query = sqlx::query(sql);
        for value in params {
            query = bind_mysql_value(query, value);
        }
        let query_rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|error| IoError(error.to_string()))?;
        results::to_query_rows(&query_rows)
    }

    async fn query_read_only(&mut self, sql: &str) -> Result<ReadResult> {
        let mut connection = self.acquire().await?;
        if self.read_only_transactions {
            execute_raw(&mut connection, "SET SESSION TRANSACTION READ ONLY").await?;
        }
        execute_raw(&mut connection, "BEGIN").await?;

        let start = Instant::now();
        let fetched = (&mut *connection).fetch_all(sql).await;
        let elapsed = start.elapsed();

        match fetched {
            Ok(query_rows) => {
                // Discarded even on success so a statement that slipped past
                // classification cannot persist changes.
                execute_raw(&mut connection, "ROLLBACK").await?;
                if self.read_only_transactions {
                    execute_raw(&mut connection, "SET SESSION TRANSACTION READ WRITE").await?;
                }
                let rows = results::to_query_rows(&query_rows)?;
                debug!("read-only query returned {} row(s)", rows.rows.len());
                Ok(ReadResult { rows, elapsed })
            }
            Err(error) => {
                restore_session(&mut connection, self.read_only_transactions).await;
                Err(ExecutionError(format!("Error: {error}")))
            }
        }
    }

    async fn execute_write(&mut self, sql: &str) -> Result<WriteResult> {
        let mut connection = self.acquire().await?;
        execute_raw(&mut connection, "BEGIN").await?;

        let start = Instant::now();
        let executed = (&mut *connection).execute(sql).await;
        let elapsed = start.elapsed();

        match executed {
            Ok(result) => {
                execute_raw(&mut connection, "COMMIT").await?;
                // Without CLIENT_FOUND_ROWS the server reports the changed row
                // count as the affected count.
                let summary = WriteSummary {
                    rows_affected: result.rows_affected(),
                    rows_changed: Some(result.rows_affected()),
                    last_insert_id: Some(result.last_insert_id()),
                };
                Ok(WriteResult { summary, elapsed })
            }
            Err(error) => {
                if let Err(rollback_error) = (&mut *connection).execute("ROLLBACK").await {
                    warn!("rollback failed after write error: {rollback_error}");
                }
                Err(ExecutionError(format!(
                    "Error executing write operation: {error}"
                )))
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

async fn execute_raw(connection: &mut PoolConnection<MySql>, sql: &str) -> Result<()> {
    (&mut **connection)
        .execute(sql)
        .await
        .map(|_| ())
        .map_err(|error| ExecutionError(error.to_string()))
}

/// Best effort cleanup after a failed read-only statement; the original error
/// is the one worth reporting.
async fn restore_session(connection: &mut PoolConnection<MySql>, restore_read_write: bool) {
    if let Err(error) = (&mut **connection).execute("ROLLBACK").await {
        warn!("rollback failed after query error: {error}");
    }
    if restore_read_write {
        if let Err(error) = (&mut **connection)
            .execute("SET SESSION TRANSACTION READ WRITE")
            .await
        {
            warn!("failed to restore read-write session: {error}");
        }
    }
}

fn connect_options(config: &MySqlConfig) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .ssl_mode(ssl_mode(config));
    if let Some(socket) = &config.socket {
        options = options.socket(socket);
    }
    if let Some(database) = &config.database {
        options = options.database(database);
    }
    options
}

fn ssl_mode(config: &MySqlConfig) -> MySqlSslMode {
    if config.ssl {
        if config.ssl_verify {
            MySqlSslMode::VerifyCa
        } else {
            MySqlSslMode::Required
        }
    } else {
        MySqlSslMode::Preferred
    }
}

fn bind_mysql_value<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    value: &'q Value,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::I16(v) => query.bind(*v),
        Value::I32(v) => query.bind(*v),
        Value::I64(v) => query.bind(*v),
        Value::U32(v) => query.bind(i64::from(*v)),
        Value::U64(v) => query.bind(*v),
        Value::F32(v) => query.bind(*v),
        Value::F64(v) => query.bind(*v),
        Value::String(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
        _ => query.bind(value.to_string()),
    }
}
