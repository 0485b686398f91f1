use sqlgate_driver::{Connection, PostgresConfig, Value};
use std::str::FromStr;
use testcontainers::runners::AsyncRunner;

#[tokio::test]
#[ignore = "requires a docker runtime"]
async fn test_postgresql_driver() -> anyhow::Result<()> {
    let image = testcontainers::ContainerRequest::from(
        testcontainers_modules::postgres::Postgres::default(),
    );
    let container = image.start().await?;
    let port = container.get_host_port_ipv4(5432).await?;

    let config = PostgresConfig {
        port,
        password: "postgres".to_string(),
        database: Some("postgres".to_string()),
        ..PostgresConfig::default()
    };
    let mut connection = sqlgate_driver_postgresql::Driver.connect(&config).await?;

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
        .execute_write("CREATE TABLE person (id SERIAL PRIMARY KEY, name VARCHAR(20))")
        .await?;
    assert_eq!(result.summary.rows_affected, 0);
    assert_eq!(result.summary.last_insert_id, None);

    let result = connection
        .execute_write("INSERT INTO person (name) VALUES ('foo'), ('bar')")
        .await?;
    assert_eq!(result.summary.rows_affected, 2);

    let rows = connection
        .query("SELECT name FROM person WHERE id = ?", &[Value::I32(2)])
        .await?;
    assert_eq!(rows.rows, vec![vec![Value::String("bar".to_string())]]);

    Ok(())
}

async fn test_read_only_path(connection: &mut dyn Connection) -> anyhow::Result<()> {
    let result = connection
        .query_read_only("SELECT id, name FROM person ORDER BY id")
        .await?;
    assert_eq!(result.rows.columns, vec!["id", "name"]);
    assert_eq!(
        result.rows.rows,
        vec![
            vec![Value::I32(1), Value::String("foo".to_string())],
            vec![Value::I32(2), Value::String("bar".to_string())],
        ]
    );

    // The read-only transaction rejects writes outright.
    let error = connection
        .query_read_only("INSERT INTO person (name) VALUES ('nope')")
        .await;
    assert!(error.is_err());

    let rows = connection.query("SELECT COUNT(*) FROM person", &[]).await?;
    assert_eq!(rows.rows, vec![vec![Value::I64(2)]]);

    Ok(())
}

async fn test_data_types(connection: &mut dyn Connection) -> anyhow::Result<()> {
    let result = connection
        .query_read_only(
            "SELECT ARRAY['foo','bar']::TEXT[], 1.23::NUMERIC(10,2), \
             CAST('2022-01-01 14:30:00' as timestamp), pg_sleep(0)",
        )
        .await?;
    assert_eq!(
        result.rows.rows,
        vec![vec![
            Value::Array(vec![
                Value::String("foo".to_string()),
                Value::String("bar".to_string()),
            ]),
            Value::Decimal(rust_decimal::Decimal::from_str("1.23")?),
            Value::DateTime(
                chrono::NaiveDate::from_ymd_opt(2022, 1, 1)
                    .expect("invalid date")
                    .and_hms_opt(14, 30, 0)
                    .expect("invalid time"),
            ),
            Value::Null,
        ]]
    );

    Ok(())
}
