#![forbid(unsafe_code)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use sqlgate_core::configuration::{self, Configuration, VERSION};
use sqlgate_core::response::Response;
use sqlgate_core::session::Session;
use sqlgate_driver::EngineKind;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "sqlgate",
    about = "Run SQL against MySQL or PostgreSQL behind a permission gate",
    version
)]
pub(crate) struct Args {
    /// Database type to use (mysql, postgres)
    #[arg(long, global = true, value_name = "TYPE")]
    db: Option<String>,

    /// Shortcut for --db postgres
    #[arg(long, visible_alias = "pg", global = true)]
    postgres: bool,

    /// Shortcut for --db mysql (the default engine)
    #[arg(long, global = true)]
    mysql: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Execute a SQL query
    Query {
        /// SQL text; multiple arguments are joined with spaces
        sql: Vec<String>,
    },
    /// List all tables in the database
    ListTables,
    /// Show table structure
    Describe {
        /// Table name, or schema.table for PostgreSQL
        table: Option<String>,
    },
    /// Test database connection
    TestConnection,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let success = execute(None, &mut io::stdout()).await?;
    if success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Runs one command and writes the JSON response to `output`. The returned
/// flag mirrors the response's `success` field and drives the exit code.
pub(crate) async fn execute(args: Option<Args>, output: &mut dyn io::Write) -> Result<bool> {
    let args = match args {
        Some(args) => args,
        None => {
            let _ = dotenvy::dotenv();
            match Args::try_parse() {
                Ok(args) => args,
                Err(error) => error.exit(),
            }
        }
    };

    configuration::init_tracing();

    let engine = match engine_override(&args) {
        Ok(engine) => engine,
        Err(error) => {
            emit(output, &Response::failure(error.to_string()))?;
            return Ok(false);
        }
    };
    let configuration = match Configuration::load(engine) {
        Ok(configuration) => configuration,
        Err(error) => {
            emit(output, &Response::failure(error.to_string()))?;
            return Ok(false);
        }
    };
    info!("sqlgate {VERSION} initialized");

    let session = Session::new(configuration);
    let Some(command) = args.command else {
        emit_value(output, &help_doc(session.configuration()))?;
        return Ok(true);
    };

    let response = match command {
        Command::Query { sql } => {
            let sql = sql.join(" ");
            if sql.trim().is_empty() {
                Response::failure("SQL query is required")
            } else {
                session
                    .run_query(&sql)
                    .await
                    .unwrap_or_else(|error| Response::failure(error.to_string()))
            }
        }
        Command::ListTables => session
            .list_tables()
            .await
            .unwrap_or_else(|error| Response::failure(error.to_string())),
        Command::Describe { table } => match table {
            Some(table) => session
                .describe_table(&table)
                .await
                .unwrap_or_else(|error| Response::failure(error.to_string())),
            None => Response::failure("Table name is required"),
        },
        Command::TestConnection => session.test_connection().await,
    };

    emit(output, &response)?;
    Ok(response.success)
}

/// An engine flag on the command line wins over the `DB_TYPE` variable;
/// `--db` wins over the shortcut flags.
fn engine_override(args: &Args) -> sqlgate_driver::Result<Option<EngineKind>> {
    if let Some(value) = &args.db {
        return Ok(Some(value.parse()?));
    }
    if args.postgres {
        return Ok(Some(EngineKind::Postgres));
    }
    if args.mysql {
        return Ok(Some(EngineKind::MySql));
    }
    Ok(None)
}

fn emit(output: &mut dyn io::Write, response: &Response) -> Result<()> {
    writeln!(output, "{}", response.to_pretty_json()?)?;
    Ok(())
}

fn emit_value(output: &mut dyn io::Write, value: &serde_json::Value) -> Result<()> {
    writeln!(output, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn help_doc(configuration: &Configuration) -> serde_json::Value {
    serde_json::json!({
        "name": "sqlgate",
        "version": VERSION,
        "currentDb": configuration.engine.to_string(),
        "commands": {
            "query <sql>": "Execute a SQL query",
            "list-tables": "List all tables in the database",
            "describe <table>": "Show table structure",
            "test-connection": "Test database connection"
        },
        "flags": {
            "--db <type>": "Set database type (mysql, postgres)",
            "--postgres": "Shortcut for --db postgres",
            "--mysql": "Shortcut for --db mysql (default)"
        },
        "examples": [
            "sqlgate query \"SELECT * FROM users LIMIT 5\"",
            "sqlgate --postgres query \"SELECT * FROM users\"",
            "sqlgate --db postgres list-tables",
            "sqlgate list-tables",
            "sqlgate describe users",
            "sqlgate test-connection"
        ],
        "envVars": {
            "DATABASE_URL": "PostgreSQL connection string (optional)",
            "MYSQL_HOST": "MySQL host (optional, default: 127.0.0.1)"
        }
    })
}
