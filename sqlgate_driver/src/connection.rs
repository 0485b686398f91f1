use crate::error::Result;
use crate::value::Value;
use async_trait::async_trait;
use mockall::automock;
use sqlparser::dialect::Dialect;
use std::fmt::Debug;
use std::time::Duration;

/// A single row of a query result
pub type Row = Vec<Value>;

/// Convert `?` placeholders to numbered `$1, $2, ...` placeholders.
/// Used by the PostgreSQL driver; `?` inside string literals and quoted
/// identifiers is left untouched.
#[must_use]
pub fn convert_to_numbered_placeholders(sql: &str) -> String {
    let mut result = String::with_capacity(sql.len());
    let mut param_index = 0u32;
    let mut chars = sql.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                result.push(ch);
                for ch in chars.by_ref() {
                    result.push(ch);
                    if ch == '\'' {
                        break;
                    }
                }
            }
            '"' => {
                result.push(ch);
                for ch in chars.by_ref() {
                    result.push(ch);
                    if ch == '"' {
                        break;
                    }
                }
            }
            '?' => {
                param_index += 1;
                result.push('$');
                result.push_str(&param_index.to_string());
            }
            _ => result.push(ch),
        }
    }
    result
}

/// Eagerly materialized query rows with their column names, in result order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryRows {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Rows returned by the read-only path, with elapsed execution time.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadResult {
    pub rows: QueryRows,
    pub elapsed: Duration,
}

/// Engine report for a committed write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub rows_affected: u64,
    /// Rows whose contents changed, when the driver reports it.
    pub rows_changed: Option<u64>,
    /// Last generated key, on engines that track one per session.
    pub last_insert_id: Option<u64>,
}

/// Write summary with elapsed execution time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteResult {
    pub summary: WriteSummary,
    pub elapsed: Duration,
}

/// Connection to a database
#[automock]
#[async_trait]
pub trait Connection: Debug + Send {
    /// The SQL dialect statements are classified with.
    fn dialect(&self) -> Box<dyn Dialect>;

    /// Runs a parameterized query on a pooled connection. Callers write `?`
    /// placeholders; drivers convert to their native syntax.
    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<QueryRows>;

    /// Runs the statement inside a read-only transaction that is always
    /// rolled back, success included.
    async fn query_read_only(&mut self, sql: &str) -> Result<ReadResult>;

    /// Runs the statement inside a transaction committed on success and
    /// rolled back on failure.
    async fn execute_write(&mut self, sql: &str) -> Result<WriteResult>;

    /// Closes the connection pool. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}
