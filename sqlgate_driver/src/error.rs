use crate::classifier::WriteGate;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error in the resolved configuration
    #[error("{0}")]
    ConfigurationError(String),
    /// Error establishing or acquiring a database connection
    #[error("Database connection error: {0}")]
    ConnectionError(String),
    /// Error executing a statement inside an open transaction
    #[error("{0}")]
    ExecutionError(String),
    /// IO error
    #[error("{0}")]
    IoError(String),
    /// Error classifying a SQL statement
    #[error("Parsing failed: {0}")]
    ParseError(String),
    /// Write operation rejected by the permission table
    #[error(
        "{kind} operations are not allowed for schema '{schema}'. \
         Ask the administrator to update SCHEMA_{kind}_PERMISSIONS.",
        kind = .operation.keyword(),
        schema = .schema.as_deref().unwrap_or("default")
    )]
    PermissionDenied {
        operation: WriteGate,
        schema: Option<String>,
    },
    /// Error when a column type is not supported
    #[error("column type [{column_type}] is not supported for column [{column_name}]")]
    UnsupportedColumnType {
        column_name: String,
        column_type: String,
    },
}

/// Converts a [`sqlparser::parser::ParserError`] into a [`ParseError`](Error::ParseError)
impl From<sqlparser::parser::ParserError> for Error {
    fn from(error: sqlparser::parser::ParserError) -> Self {
        Error::ParseError(error.to_string())
    }
}

/// Converts a [`regex::Error`] into an [`IoError`](Error::IoError)
impl From<regex::Error> for Error {
    fn from(error: regex::Error) -> Self {
        Error::IoError(error.to_string())
    }
}

/// Converts a [`std::io::Error`] into an [`IoError`](Error::IoError)
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IoError(error.to_string())
    }
}

/// Converts a [`serde_json::Error`] into an [`IoError`](Error::IoError)
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::IoError(error.to_string())
    }
}
