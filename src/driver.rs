use adbc_core::{Driver, Optionable, error::Result, options::OptionValue};

use super::client::new_client;
use super::config::ConnectionConfig;
use super::connection::InfluxConnection;
use super::database::InfluxDatabase;
use super::error::InfluxError;

#[derive(Default)]
pub struct InfluxDriver {}

impl Driver for InfluxDriver {
    type DatabaseType = InfluxDatabase;

    fn new_database(&mut self) -> Result<Self::DatabaseType> {
        Ok(Self::DatabaseType::default())
    }

    fn new_database_with_opts(
        &mut self,
        opts: impl IntoIterator<Item = (<Self::DatabaseType as Optionable>::Option, OptionValue)>,
    ) -> Result<Self::DatabaseType> {
        let mut database = Self::DatabaseType::default();
        for (key, value) in opts {
            database.set_option(key, value)?;
        }
        Ok(database)
    }
}

/// Opens a connection from a connection string.
///
/// The scheme picks the transport: `http`/`https` or `udp`.
pub fn open(uri: &str) -> std::result::Result<InfluxConnection, InfluxError> {
    open_with_config(ConnectionConfig::parse(uri)?)
}

/// Opens a connection from an already built configuration.
pub fn open_with_config(config: ConnectionConfig) -> std::result::Result<InfluxConnection, InfluxError> {
    let client = new_client(&config.transport)?;
    Ok(InfluxConnection::new(client, config.database, config.precision))
}
