use crate::permissions::PermissionTable;
use sqlgate_driver::{
    Connection, Error, ParsedStatements, ReadResult, Result, WriteGate, WriteSummary,
};
use std::time::Duration;
use tracing::debug;

/// Outcome of a routed execution: rows from the read-only path, or a status
/// message from the write path.
#[derive(Clone, Debug, PartialEq)]
pub enum Executed {
    Read(ReadResult),
    Write { status: String, elapsed: Duration },
}

/// Checks every write gate the statements require against the permission
/// table. Gates are checked in the order insert, update, delete, ddl; the
/// first denial fails the whole batch, before any connection is opened.
///
/// # Errors
/// Returns [`Error::PermissionDenied`] naming the denied operation and the
/// inferred schema.
pub fn gate(statements: &ParsedStatements, permissions: &PermissionTable) -> Result<()> {
    for operation in WriteGate::ALL {
        if statements.requires(operation)
            && !permissions.is_allowed(operation, statements.schema.as_deref())
        {
            return Err(Error::PermissionDenied {
                operation,
                schema: statements.schema.clone(),
            });
        }
    }
    Ok(())
}

/// Routes gated statements to the read-only or write execution path of a
/// connection. Statements must have passed [`gate`] before reaching this
/// point.
#[derive(Debug)]
pub struct QueryExecutor<'a> {
    connection: &'a mut dyn Connection,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(connection: &'a mut dyn Connection) -> Self {
        Self { connection }
    }

    /// Executes the raw SQL on the path the classification selects: the write
    /// path when any gated kind is present, the read-only path otherwise. The
    /// whole input string is sent as one statement either way.
    ///
    /// # Errors
    /// Returns a connection error when no connection can be acquired, or an
    /// execution error when the statement fails.
    pub async fn execute(&mut self, statements: &ParsedStatements, sql: &str) -> Result<Executed> {
        if statements.has_writes() {
            debug!("routing to the write path: {:?}", statements.kinds);
            let result = self.connection.execute_write(sql).await?;
            let status = write_status(statements, result.summary);
            Ok(Executed::Write {
                status,
                elapsed: result.elapsed,
            })
        } else {
            debug!("routing to the read-only path: {:?}", statements.kinds);
            let result = self.connection.query_read_only(sql).await?;
            Ok(Executed::Read(result))
        }
    }
}

/// Human-readable status for a committed write. When a batch mixes kinds, the
/// reported kind follows the priority insert > update > delete > ddl.
fn write_status(statements: &ParsedStatements, summary: WriteSummary) -> String {
    let schema = statements.schema.as_deref().unwrap_or("default");
    if statements.requires(WriteGate::Insert) {
        format!(
            "Insert successful on schema '{schema}'. Affected rows: {affected}, Last insert ID: {id}",
            affected = summary.rows_affected,
            id = summary.last_insert_id.unwrap_or(0)
        )
    } else if statements.requires(WriteGate::Update) {
        format!(
            "Update successful on schema '{schema}'. Affected rows: {affected}, Changed rows: {changed}",
            affected = summary.rows_affected,
            changed = summary.rows_changed.unwrap_or(0)
        )
    } else if statements.requires(WriteGate::Delete) {
        format!(
            "Delete successful on schema '{schema}'. Affected rows: {affected}",
            affected = summary.rows_affected
        )
    } else {
        format!("DDL operation successful on schema '{schema}'.")
    }
}
