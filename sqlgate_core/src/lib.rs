//! # SQLGate Core
//!
//! The SQLGate core library resolves configuration from the environment,
//! gates write operations against the permission table, and routes SQL and
//! catalog commands through the MySQL and PostgreSQL adapters.

#![forbid(unsafe_code)]

pub mod configuration;
pub mod executor;
pub mod factory;
pub mod permissions;
pub mod response;
pub mod session;
