use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlgate_driver::Error::{IoError, UnsupportedColumnType};
use sqlgate_driver::{QueryRows, Result, Value};
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgColumn, PgRow};
use sqlx::{Column, ColumnIndex, Decode, Row, Type};
use uuid::Uuid;

/// Materializes fetched PostgreSQL rows into engine neutral values.
pub(crate) fn to_query_rows(query_rows: &[PgRow]) -> Result<QueryRows> {
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

fn convert_to_value(row: &PgRow, column: &PgColumn) -> Result<Value> {
    let column_type = column.type_info();
    let postgresql_type = &**column_type;
    let column_type = format!("{postgresql_type:?}");
    let column_type_parts: Vec<&str> = column_type.split('(').collect();
    let column_name = column.name();

    let Some(column_type_first_part) = column_type_parts.first() else {
        return Err(UnsupportedColumnType {
            column_name: column.name().to_string(),
            column_type: column_type.to_string(),
        });
    };

    let value = match *column_type_first_part {
        "Bool" => get_value(row, column_name, |v: bool| Value::Bool(v))?,
        "BoolArray" => get_value(row, column_name, |v: Vec<bool>| {
            Value::Array(v.into_iter().map(Value::Bool).collect())
        })?,
        "Bpchar" | "Char" | "Name" | "Text" | "Varchar" => {
            get_value(row, column_name, |v: String| Value::String(v))?
        }
        "BpcharArray" | "CharArray" | "NameArray" | "TextArray" | "VarcharArray" => {
            get_value(row, column_name, |v: Vec<String>| {
                Value::Array(v.into_iter().map(Value::String).collect())
            })?
        }
        "Bytea" => get_value(row, column_name, |v: Vec<u8>| Value::Bytes(v))?,
        "ByteaArray" => get_value(row, column_name, |v: Vec<Vec<u8>>| {
            Value::Array(v.into_iter().map(Value::Bytes).collect())
        })?,
        "Int2" => get_value(row, column_name, |v: i16| Value::I16(v))?,
        "Int2Array" => get_value(row, column_name, |v: Vec<i16>| {
            Value::Array(v.into_iter().map(Value::I16).collect())
        })?,
        "Int4" => get_value(row, column_name, |v: i32| Value::I32(v))?,
        "Int4Array" => get_value(row, column_name, |v: Vec<i32>| {
            Value::Array(v.into_iter().map(Value::I32).collect())
        })?,
        "Int8" => get_value(row, column_name, |v: i64| Value::I64(v))?,
        "Int8Array" => get_value(row, column_name, |v: Vec<i64>| {
            Value::Array(v.into_iter().map(Value::I64).collect())
        })?,
        "Oid" => get_value(row, column_name, |v: Oid| Value::U32(v.0))?,
        "OidArray" => get_value(row, column_name, |v: Vec<Oid>| {
            Value::Array(v.into_iter().map(|v| Value::U32(v.0)).collect())
        })?,
        "Json" | "Jsonb" => get_value(row, column_name, |v: serde_json::Value| Value::from(v))?,
        "JsonArray" | "JsonbArray" => get_value(row, column_name, |v: Vec<serde_json::Value>| {
            Value::Array(v.into_iter().map(Value::from).collect())
        })?,
        "Float4" => get_value(row, column_name, |v: f32| Value::F32(v))?,
        "Float4Array" => get_value(row, column_name, |v: Vec<f32>| {
            Value::Array(v.into_iter().map(Value::F32).collect())
        })?,
        "Float8" => get_value(row, column_name, |v: f64| Value::F64(v))?,
        "Float8Array" => get_value(row, column_name, |v: Vec<f64>| {
            Value::Array(v.into_iter().map(Value::F64).collect())
        })?,
        "Date" => get_value(row, column_name, |v: NaiveDate| Value::Date(v))?,
        "DateArray" => get_value(row, column_name, |v: Vec<NaiveDate>| {
            Value::Array(v.into_iter().map(Value::Date).collect())
        })?,
        "Time" | "Timetz" => get_value(row, column_name, |v: NaiveTime| Value::Time(v))?,
        "TimeArray" | "TimetzArray" => get_value(row, column_name, |v: Vec<NaiveTime>| {
            Value::Array(v.into_iter().map(Value::Time).collect())
        })?,
        "Timestamp" => get_value(row, column_name, |v: NaiveDateTime| Value::DateTime(v))?,
        "TimestampArray" => get_value(row, column_name, |v: Vec<NaiveDateTime>| {
            Value::Array(v.into_iter().map(Value::DateTime).collect())
        })?,
        "Timestamptz" => get_value(row, column_name, |v: chrono::DateTime<Utc>| {
            Value::DateTime(v.naive_utc())
        })?,
        "TimestamptzArray" => get_value(row, column_name, |v: Vec<chrono::DateTime<Utc>>| {
            Value::Array(
                v.into_iter()
                    .map(|v| Value::DateTime(v.naive_utc()))
                    .collect(),
            )
        })?,
        "Numeric" => get_value(row, column_name, |v: rust_decimal::Decimal| {
            Value::Decimal(v)
        })?,
        "NumericArray" => get_value(row, column_name, |v: Vec<rust_decimal::Decimal>| {
            Value::Array(v.into_iter().map(Value::Decimal).collect())
        })?,
        "Uuid" => get_value(row, column_name, |v: Uuid| Value::Uuid(v))?,
        "UuidArray" => get_value(row, column_name, |v: Vec<Uuid>| {
            Value::Array(v.into_iter().map(Value::Uuid).collect())
        })?,
        "Void" => Value::Null, // pg_sleep() returns void
        _ => {
            return Err(UnsupportedColumnType {
                column_name: column.name().to_string(),
                column_type: column_type.to_string(),
            });
        }
    };

    Ok(value)
}

fn get_value<'r, T, I>(row: &'r PgRow, index: I, to_value: impl Fn(T) -> Value) -> Result<Value>
where
    T: Decode<'r, <PgRow as Row>::Database> + Type<<PgRow as Row>::Database>,
    I: ColumnIndex<PgRow>,
{
    match row
        .try_get::<Option<T>, I>(index)
        .map_err(|error| IoError(error.to_string()))?
        .map(to_value)
    {
        Some(value) => Ok(value),
        None => Ok(Value::Null),
    }
}
