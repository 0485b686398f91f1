use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlgate_driver::Error::UnsupportedColumnType;
use sqlgate_driver::{QueryRows, Result, Value};
use sqlx::mysql::{MySqlColumn, MySqlRow};
use sqlx::{Column, Row};

/// Materializes fetched MySQL rows into engine neutral values.
pub(crate) fn to_query_rows(query_rows: &[MySqlRow]) -> Result<QueryRows> {
    let columns: Vec<String> = query_rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|column| column.name().to_string())
                .collect()
        })
        .unwrap_or_default();

    let mut rows = Vec::with_capacity(query_rows.len());
    for row in query_rows {
        let mut values = Vec::with_capacity(row.columns().len());
        for column in row.columns() {
            values.push(convert_to_value(row, column)?);
        }
        rows.push(values);
    }
    Ok(QueryRows::new(columns, rows))
}

fn convert_to_value(row: &MySqlRow, column: &MySqlColumn) -> Result<Value> {
    let column_name = column.name();

    if let Ok(value) = row.try_get::<Option<String>, &str>(column_name) {
        match value {
            Some(v) => Ok(Value::String(v)),
            None => Ok(Value::Null),
        }
    } else if let Ok(value) = row.try_get::<Option<Vec<u8>>, &str>(column_name) {
        match value {
            Some(v) => Ok(Value::Bytes(v)),
            None => Ok(Value::Null),
        }
    } else if let Ok(value) = row.try_get::<Option<i16>, &str>(column_name) {
        match value {
            Some(v) => Ok(Value::I16(v)),
            None => Ok(Value::Null),
        }
    } else if let Ok(value) = row.try_get::<Option<i32>, &str>(column_name) {
        match value {
            Some(v) => Ok(Value::I32(v)),
            None => Ok(Value::Null),
        }
    } else if let Ok(value) = row.try_get::<Option<i64>, &str>(column_name) {
        match value {
            Some(v) => Ok(Value::I64(v)),
            None => Ok(Value::Null),
        }
    } else if let Ok(value) = row.try_get::<Option<u64>, &str>(column_name) {
        match value {
            Some(v) => Ok(Value::U64(v)),
            None => Ok(Value::Null),
        }
    } else if let Ok(value) = row.try_get::<Option<f32>, &str>(column_name) {
        match value {
            Some(v) => Ok(Value::F32(v)),
            None => Ok(Value::Null),
        }
    } else if let Ok(value) = row.try_get::<Option<f64>, &str>(column_name) {
        match value {
            Some(v) => Ok(Value::F64(v)),
            None => Ok(Value::Null),
        }
    } else if let Ok(value) = row.try_get::<Option<rust_decimal::Decimal>, &str>(column_name) {
        match value {
            Some(v) => Ok(Value::Decimal(v)),
            None => Ok(Value::Null),
        }
    } else if let Ok(value) = row.try_get::<Option<bool>, &str>(column_name) {
        match value {
            Some(v) => Ok(Value::Bool(v)),
            None => Ok(Value::Null),
        }
    } else if let Ok(value) = row.try_get::<Option<NaiveDate>, &str>(column_name) {
        match value {
            Some(v) => Ok(Value::Date(v)),
            None => Ok(Value::Null),
        }
    } else if let Ok(value) = row.try_get::<Option<NaiveTime>, &str>(column_name) {
        match value {
            Some(v) => Ok(Value::Time(v)),
            None => Ok(Value::Null),
        }
    } else if let Ok(value) = row.try_get::<Option<NaiveDateTime>, &str>(column_name) {
        match value {
            Some(v) => Ok(Value::DateTime(v)),
            None => Ok(Value::Null),
        }
    } else if let Ok(value) = row.try_get::<Option<DateTime<Utc>>, &str>(column_name) {
        match value {
            Some(v) => Ok(Value::DateTime(v.naive_utc())),
            None => Ok(Value::Null),
        }
    } else if let Ok(value) = row.try_get::<Option<serde_json::Value>, &str>(column_name) {
        match value {
            Some(v) => Ok(Value::from(v)),
            None => Ok(Value::Null),
        }
    } else {
        let column_type = column.type_info();
        let type_name = format!("{column_type:?}");
        Err(UnsupportedColumnType {
            column_name: column_name.to_string(),
            column_type: type_name,
        })
    }
}
