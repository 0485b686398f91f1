use crate::executor::Executed;
use indexmap::IndexMap;
use serde::Serialize;
use sqlgate_driver::{QueryRows, ReadResult, Result, Value};
use std::time::Duration;

/// The JSON document printed to stdout for every operation, success and
/// failure alike.
#[derive(Debug, Serialize)]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "executionTimeMs", skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<String>,
}

impl Response {
    pub fn from_executed(executed: &Executed) -> Self {
        match executed {
            Executed::Read(result) => Self::read(result),
            Executed::Write { status, elapsed } => Self::write(status.clone(), *elapsed),
        }
    }

    /// Successful read: rows as data, elapsed time attached.
    pub fn read(result: &ReadResult) -> Self {
        Self {
            success: true,
            data: Some(rows_to_json(&result.rows)),
            error: None,
            execution_time_ms: Some(format_elapsed(result.elapsed)),
        }
    }

    /// Successful write: the status summary as data, elapsed time attached.
    pub fn write(status: String, elapsed: Duration) -> Self {
        Self {
            success: true,
            data: Some(serde_json::Value::String(status)),
            error: None,
            execution_time_ms: Some(format_elapsed(elapsed)),
        }
    }

    /// Success with prepared data and no timing.
    pub fn data(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            execution_time_ms: None,
        }
    }

    pub fn failure<S: Into<String>>(error: S) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            execution_time_ms: None,
        }
    }

    /// # Errors
    /// Returns an error when the document cannot be serialized.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Rows as an array of objects keyed by column name, column order preserved.
pub fn rows_to_json(rows: &QueryRows) -> serde_json::Value {
    let records = rows
        .rows
        .iter()
        .map(|row| {
            let record: IndexMap<&String, &Value> = rows.columns.iter().zip(row.iter()).collect();
            serde_json::to_value(&record).unwrap_or(serde_json::Value::Null)
        })
        .collect();
    serde_json::Value::Array(records)
}

/// Elapsed milliseconds with two decimals, as a string.
fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2}", elapsed.as_secs_f64() * 1000.0)
}
