use crate::configuration::{Configuration, VERSION};
use crate::executor::{self, QueryExecutor};
use crate::factory;
use crate::response::{Response, rows_to_json};
use indoc::indoc;
use sqlgate_driver::{Connection, EngineKind, Result, Value, classify};
use tracing::warn;

/// One CLI invocation bound to a resolved configuration. Classification and
/// gating happen here, before any connection is opened; execution is routed
/// through the engine adapter the configuration selects.
#[derive(Debug)]
pub struct Session {
    configuration: Configuration,
}

impl Session {
    pub fn new(configuration: Configuration) -> Self {
        Self { configuration }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Classifies, gates, and routes one SQL string. Parse failures and
    /// permission denials return before any connection exists, so a denied
    /// batch has zero side effects.
    ///
    /// # Errors
    /// Returns a parse error for unclassifiable SQL, a permission error for a
    /// denied write gate, and connection or execution errors from the engine.
    pub async fn run_query(&self, sql: &str) -> Result<Response> {
        let dialect = self.configuration.engine.dialect();
        let statements = classify(dialect.as_ref(), sql, self.configuration.database())?;
        executor::gate(&statements, &self.configuration.permissions)?;

        let mut connection = factory::connect(&self.configuration).await?;
        let result = QueryExecutor::new(connection.as_mut())
            .execute(&statements, sql)
            .await;
        close_quietly(connection.as_mut()).await;
        Ok(Response::from_executed(&result?))
    }

    /// Lists tables on the read-only path. MySQL scopes the listing to the
    /// configured database, or to all user databases in multi-database mode;
    /// PostgreSQL lists every schema outside the catalogs.
    ///
    /// # Errors
    /// Returns connection or execution errors from the engine.
    pub async fn list_tables(&self) -> Result<Response> {
        let sql = list_tables_sql(self.configuration.engine, self.configuration.database());
        let mut connection = factory::connect(&self.configuration).await?;
        let result = connection.query_read_only(&sql).await;
        close_quietly(connection.as_mut()).await;
        Ok(Response::read(&result?))
    }

    /// Describes the columns of a table with a parameterized catalog query.
    /// PostgreSQL accepts `schema.table`; the schema defaults to `public`.
    ///
    /// # Errors
    /// Returns connection or execution errors from the engine.
    pub async fn describe_table(&self, table: &str) -> Result<Response> {
        let (sql, params) =
            describe_sql(self.configuration.engine, self.configuration.database(), table);
        let mut connection = factory::connect(&self.configuration).await?;
        let result = connection.query(&sql, &params).await;
        close_quietly(connection.as_mut()).await;

        let rows = result?;
        if rows.is_empty() {
            let error = table_not_found(table, self.configuration.database());
            return Ok(Response::failure(error));
        }
        Ok(Response::data(rows_to_json(&rows)))
    }

    /// Verifies connectivity with a probe query. The report carries the
    /// resolved connection facts; every failure maps to a `Connection failed`
    /// response.
    pub async fn test_connection(&self) -> Response {
        match self.probe_connection().await {
            Ok(()) => Response::data(self.connection_report()),
            Err(error) => Response::failure(format!("Connection failed: {error}")),
        }
    }

    async fn probe_connection(&self) -> Result<()> {
        let mut connection = factory::connect(&self.configuration).await?;
        let result = connection.query("SELECT 1 as connected", &[]).await;
        close_quietly(connection.as_mut()).await;
        result?;
        Ok(())
    }

    fn connection_report(&self) -> serde_json::Value {
        let configuration = &self.configuration;
        let (host, port, database, user) = match configuration.engine {
            EngineKind::MySql => {
                let mysql = &configuration.mysql;
                let (host, port) = match &mysql.socket {
                    Some(socket) => (socket.clone(), None),
                    None => (mysql.host.clone(), Some(mysql.port)),
                };
                (host, port, mysql.database.clone(), mysql.user.clone())
            }
            EngineKind::Postgres => {
                let postgres = &configuration.postgres;
                (
                    postgres.host.clone(),
                    Some(postgres.port),
                    postgres.database.clone(),
                    postgres.user.clone(),
                )
            }
        };

        let mut report = serde_json::Map::new();
        report.insert("connected".to_string(), true.into());
        report.insert("version".to_string(), VERSION.into());
        report.insert("dbType".to_string(), configuration.engine.to_string().into());
        report.insert("host".to_string(), host.into());
        if let Some(port) = port {
            report.insert("port".to_string(), port.into());
        }
        report.insert(
            "database".to_string(),
            database.unwrap_or_else(|| "Not specified".to_string()).into(),
        );
        report.insert("user".to_string(), user.into());
        serde_json::Value::Object(report)
    }
}

/// Pool shutdown failures do not change the command outcome.
async fn close_quietly(connection: &mut dyn Connection) {
    if let Err(error) = connection.close().await {
        warn!("failed to close the connection pool: {error}");
    }
}

fn list_tables_sql(engine: EngineKind, database: Option<&str>) -> String {
    match engine {
        EngineKind::Postgres => indoc! {"
            SELECT table_schema AS schema, table_name AS name, table_type AS type
              FROM information_schema.tables
             WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
             ORDER BY table_schema, table_name
        "}
        .to_string(),
        EngineKind::MySql => {
            let sql = indoc! {"
                SELECT table_schema AS 'database', table_name AS name, table_rows AS rowCount,
                       ROUND(data_length / 1024 / 1024, 2) AS dataSizeMB, table_comment AS description
                  FROM information_schema.tables
            "}
            .to_string();
            match database {
                // The database name comes from configuration, not from user
                // input; the read-only path takes no bind parameters.
                Some(database) => {
                    format!("{sql} WHERE table_schema = '{database}' ORDER BY table_name")
                }
                None => format!(
                    "{sql} WHERE table_schema NOT IN ('information_schema', 'mysql', 'performance_schema', 'sys') ORDER BY table_schema, table_name"
                ),
            }
        }
    }
}

fn describe_sql(engine: EngineKind, database: Option<&str>, table: &str) -> (String, Vec<Value>) {
    match engine {
        EngineKind::Postgres => {
            let (schema, table) = match table.split_once('.') {
                Some((schema, table)) => (schema, table),
                None => ("public", table),
            };
            let sql = indoc! {"
                SELECT column_name AS name, data_type AS type, udt_name AS udt_type,
                       is_nullable AS nullable, column_default AS default_value
                  FROM information_schema.columns
                 WHERE table_name = ? AND table_schema = ?
                 ORDER BY ordinal_position
            "};
            let params = vec![
                Value::String(table.to_string()),
                Value::String(schema.to_string()),
            ];
            (sql.to_string(), params)
        }
        EngineKind::MySql => match database {
            Some(database) => {
                let sql = indoc! {"
                    SELECT column_name AS name, data_type AS type, column_type AS fullType,
                           is_nullable AS nullable, column_key AS 'key', column_default AS 'default',
                           extra, column_comment AS comment
                      FROM information_schema.columns
                     WHERE table_name = ? AND table_schema = ?
                     ORDER BY ordinal_position
                "};
                let params = vec![
                    Value::String(table.to_string()),
                    Value::String(database.to_string()),
                ];
                (sql.to_string(), params)
            }
            None => {
                let sql = indoc! {"
                    SELECT table_schema AS 'database', column_name AS name, data_type AS type,
                           column_type AS fullType, is_nullable AS nullable, column_key AS 'key',
                           column_default AS 'default', extra, column_comment AS comment
                      FROM information_schema.columns
                     WHERE table_name = ?
                       AND table_schema NOT IN ('information_schema', 'mysql', 'performance_schema', 'sys')
                     ORDER BY table_schema, ordinal_position
                "};
                (sql.to_string(), vec![Value::String(table.to_string())])
            }
        },
    }
}

fn table_not_found(table: &str, database: Option<&str>) -> String {
    match database {
        Some(database) => format!("Table '{table}' not found in database '{database}'"),
        None => format!("Table '{table}' not found"),
    }
}
