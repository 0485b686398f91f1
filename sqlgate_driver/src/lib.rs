//! # SQLGate Driver
//!
//! The SQLGate driver library defines the contract shared by the database
//! adapters: statement classification, the permission gate vocabulary, the
//! connection trait with its read-only and write execution paths, and the
//! normalized value model query results are decoded into.

#![forbid(unsafe_code)]
#![forbid(clippy::allow_attributes)]
#![deny(clippy::pedantic)]

mod classifier;
mod config;
mod connection;
mod error;
mod value;

pub use classifier::{OperationKind, ParsedStatements, WriteGate, classify};
pub use config::{EngineKind, MySqlConfig, PostgresConfig};
pub use connection::{
    Connection, MockConnection, QueryRows, ReadResult, Row, WriteResult, WriteSummary,
    convert_to_numbered_placeholders,
};
pub use error::{Error, Result};
pub use value::Value;
