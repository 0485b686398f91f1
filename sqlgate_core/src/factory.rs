use crate::configuration::Configuration;
use sqlgate_driver::{Connection, EngineKind, Result};
use tracing::debug;

/// Builds the adapter for the configured engine. Both adapters are compiled
/// in; selection is a single branch on the engine kind, bound once per
/// invocation.
///
/// # Errors
/// Returns a connection error when the pool cannot be created.
pub async fn connect(configuration: &Configuration) -> Result<Box<dyn Connection>> {
    debug!("creating {} connection pool", configuration.engine);
    match configuration.engine {
        EngineKind::MySql => {
            sqlgate_driver_mysql::Driver
                .connect(&configuration.mysql)
                .await
        }
        EngineKind::Postgres => {
            sqlgate_driver_postgresql::Driver
                .connect(&configuration.postgres)
                .await
        }
    }
}
