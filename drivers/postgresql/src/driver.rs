use crate::results;
use async_trait::async_trait;
use sqlgate_driver::Error::{ConnectionError, ExecutionError, IoError};
use sqlgate_driver::{
    PostgresConfig, QueryRows, ReadResult, Result, Value, WriteResult, WriteSummary,
    convert_to_numbered_placeholders,
};
use sqlparser::dialect::{Dialect, PostgreSqlDialect};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions};
use sqlx::{Executor, PgPool, Postgres};
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
        config: &PostgresConfig,
    ) -> Result<Box<dyn sqlgate_driver::Connection>> {
        let connection = Connection::new(config).await?;
        Ok(Box::new(connection))
    }
}

#[derive(Debug)]
pub struct Connection {
    pool: PgPool,
}

impl Connection {
    pub(crate) async fn new(config: &PostgresConfig) -> Result<Connection> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .connect_with(connect_options(config))
            .await
            .map_err(|error| ConnectionError(error.to_string()))?;

        Ok(Connection { pool })
    }

    async fn acquire(&self) -> Result<PoolConnection<Postgres>> {
        self.pool
            .acquire()
            .await
            .map_err(|error| ConnectionError(error.to_string()))
    }
}

#[async_trait]
impl sqlgate_driver::Connection for Connection {
    fn dialect(&self) -> Box<dyn Dialect> {
        Box::new(PostgreSqlDialect {})
    }

    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<QueryRows> {
        let sql = convert_to_numbered_placeholders(sql);
        let mut query = sqlx::query(&sql);
        for value in params {
            query = bind_pg_value(query, value);
        }
        let query_rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|error| IoError(error.to_string()))?;
        results::to_query_rows(&query_rows)
    }

    async fn query_read_only(&mut self, sql: &str) -> Result<ReadResult> {
        let mut connection = self.acquire().await?;
        execute_raw(&mut connection, "BEGIN READ ONLY").await?;

        let start = Instant::now();
        let fetched = (&mut *connection).fetch_all(sql).await;
        let elapsed = start.elapsed();

        match fetched {
            Ok(query_rows) => {
                // Discarded even on success so a statement that slipped past
                // classification cannot persist changes.
                execute_raw(&mut connection, "ROLLBACK").await?;
                let rows = results::to_query_rows(&query_rows)?;
                debug!("read-only query returned {} row(s)", rows.rows.len());
                Ok(ReadResult { rows, elapsed })
            }
            Err(error) => {
                if let Err(rollback_error) = (&mut *connection).execute("ROLLBACK").await {
                    warn!("rollback failed after query error: {rollback_error}");
                }
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
                let summary = WriteSummary {
                    rows_affected: result.rows_affected(),
                    rows_changed: Some(result.rows_affected()),
                    last_insert_id: None,
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

async fn execute_raw(connection: &mut PoolConnection<Postgres>, sql: &str) -> Result<()> {
    (&mut **connection)
        .execute(sql)
        .await
        .map(|_| ())
        .map_err(|error| ExecutionError(error.to_string()))
}

fn connect_options(config: &PostgresConfig) -> PgConnectOptions {
    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password);
    if let Some(database) = &config.database {
        options = options.database(database);
    }
    options
}

fn bind_pg_value<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    value: &'q Value,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::I16(v) => query.bind(*v),
        Value::I32(v) => query.bind(*v),
        Value::I64(v) => query.bind(*v),
        Value::U32(v) => query.bind(i64::from(*v)),
        Value::U64(v) => query.bind(*v as i64),
        Value::F32(v) => query.bind(*v),
        Value::F64(v) => query.bind(*v),
        Value::String(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
        Value::Decimal(v) => query.bind(*v),
        _ => query.bind(value.to_string()),
    }
}
