use indoc::indoc;
use serde_json::json;
use sqlgate_driver::{Connection, MySqlConfig, Value};
use std::str::FromStr;
use testcontainers::runners::AsyncRunner;

#[tokio::test]
#[ignore = "requires a docker runtime"]
async fn test_mysql_driver() -> anyhow::Result<()> {
    let image =
        testcontainers::ContainerRequest::from(testcontainers_modules::mysql::Mysql::default());
    let container = image.start().await?;
    let port = container.get_host_port_ipv4(3306).await?;

    let config = MySqlConfig {
        port,
        database: Some("mysql".to_string()),
        ..MySqlConfig::default()
    };
    let mut connection = sqlgate_driver_mysql::Driver.connect(&config).await?;

    test_write_path(&mut *connection).await?;
    test_read_only_path(&mut *connection).await?;
    test_data_types(&mut *connection).await?;

    connection.close().await?;
    container.stop().await?;
    container.rm().await?;
    Ok(())
}

async fn test_write_path(connection: &mut dyn Connection) -> anyhow::Result<()> {
    let result = connection
        .execute_write("CREATE TABLE person (id INT AUTO_INCREMENT PRIMARY KEY, name VARCHAR(20))")
        .await?;
    assert_eq!(result.summary.rows_affected, 0);

    let result = connection
        .execute_write("INSERT INTO person (name) VALUES ('foo')")
        .await?;
    assert_eq!(result.summary.rows_affected, 1);
    assert_eq!(result.summary.last_insert_id, Some(1));

    let sql = "INSERT INTO person (name) VALUES ('bar'); UPDATE person SET name = 'baz' WHERE id = 1";
    let result = connection.execute_write(sql).await?;
    assert_eq!(result.summary.rows_affected, 2);

    Ok(())
}

async fn test_read_only_path(connection: &mut dyn Connection) -> anyhow::Result<()> {
    let result = connection
        .query_read_only("SELECT name FROM person ORDER BY id")
        .await?;
    assert_eq!(result.rows.columns, vec!["name"]);
    assert_eq!(
        result.rows.rows,
        vec![
            vec![Value::String("baz".to_string())],
            vec![Value::String("bar".to_string())],
        ]
    );

    // The read-only session rejects writes outright.
    let error = connection
        .query_read_only("INSERT INTO person (name) VALUES ('nope')")
        .await;
    assert!(error.is_err());

    let rows = connection
        .query("SELECT name FROM person WHERE id = ?", &[Value::I32(1)])
        .await?;
    assert_eq!(rows.rows, vec![vec![Value::String("baz".to_string())]]);

    Ok(())
}

async fn test_data_types(connection: &mut dyn Connection) -> anyhow::Result<()> {
    let sql = indoc! {r"
            CREATE TABLE data_types (
                char_type CHAR,
                varchar_type VARCHAR(50),
                binary_type BINARY(3),
                blob_type BLOB,
                tinyint_type TINYINT,
                smallint_type SMALLINT,
                int_type INT,
                bigint_type BIGINT,
                bigint_unsigned_type BIGINT UNSIGNED,
                decimal_type DECIMAL(5,2),
                float_type FLOAT,
                double_type DOUBLE,
                date_type DATE,
                time_type TIME,
                datetime_type DATETIME,
                json_type JSON
            )
        "};
    let _ = connection.execute_write(sql).await?;

    let sql = indoc! {r#"
            INSERT INTO data_types (
                char_type, varchar_type, binary_type, blob_type, tinyint_type, smallint_type,
                int_type, bigint_type, bigint_unsigned_type, decimal_type, float_type,
                double_type, date_type, time_type, datetime_type, json_type
            ) VALUES (
                 'a', 'foo', 'foo', 'foo', 127, 32767,
                 2147483647, 9223372036854775807, 18446744073709551615, 123.45, 123.0,
                 123.0, '2022-01-01', '14:30:00', '2022-01-01 14:30:00', '{"key": "value"}'
             )
        "#};
    let _ = connection.execute_write(sql).await?;

    let sql = indoc! {r"
            SELECT char_type, varchar_type, binary_type, blob_type, tinyint_type, smallint_type,
                   int_type, bigint_type, bigint_unsigned_type, decimal_type, float_type,
                   double_type, date_type, time_type, datetime_type, json_type
              FROM data_types
        "};
    let result = connection.query_read_only(sql).await?;
    assert_eq!(
        result.rows.rows,
        vec![vec![
            Value::String("a".to_string()),
            Value::String("foo".to_string()),
            Value::Bytes("foo".as_bytes().to_vec()),
            Value::Bytes("foo".as_bytes().to_vec()),
            Value::I16(127),
            Value::I16(32_767),
            Value::I32(2_147_483_647),
            Value::I64(9_223_372_036_854_775_807),
            Value::U64(18_446_744_073_709_551_615),
            Value::Decimal(rust_decimal::Decimal::from_str("123.45").expect("invalid decimal")),
            Value::F32(123.0),
            Value::F32(123.0),
            Value::Date(chrono::NaiveDate::from_ymd_opt(2022, 1, 1).expect("invalid date")),
            Value::Time(chrono::NaiveTime::from_hms_opt(14, 30, 0).expect("invalid time")),
            Value::DateTime(
                chrono::NaiveDate::from_ymd_opt(2022, 1, 1)
                    .expect("invalid date")
                    .and_hms_opt(14, 30, 0)
                    .expect("invalid time"),
            ),
            Value::from(json!({"key": "value"}))
        ]]
    );

    Ok(())
}

#[tokio::test]
#[ignore = "requires a docker runtime"]
async fn test_mysql_read_rollback_discards_writes() -> anyhow::Result<()> {
    let image =
        testcontainers::ContainerRequest::from(testcontainers_modules::mysql::Mysql::default());
    let container = image.start().await?;
    let port = container.get_host_port_ipv4(3306).await?;

    let config = MySqlConfig {
        port,
        database: Some("mysql".to_string()),
        read_only_transactions: false,
        ..MySqlConfig::default()
    };
    let mut connection = sqlgate_driver_mysql::Driver.connect(&config).await?;

    let _ = connection
        .execute_write("CREATE TABLE audit (id INT)")
        .await?;

    // Without the read-only session guard the insert executes, but the
    // surrounding transaction is still rolled back.
    let result = connection
        .query_read_only("INSERT INTO audit (id) VALUES (1)")
        .await?;
    assert!(result.rows.rows.is_empty());

    let rows = connection.query("SELECT COUNT(*) FROM audit", &[]).await?;
    assert_eq!(rows.rows, vec![vec![Value::I64(0)]]);

    connection.close().await?;
    container.stop().await?;
    container.rm().await?;
    Ok(())
}
