//! Database implementation for the ADBC-Influx driver.
//!
//! The `InfluxDatabase` holds the connection string and credentials and
//! creates connections from them.

use adbc_core::{Database, Optionable, options::{OptionConnection, OptionDatabase, OptionValue}};
use log::debug;

use super::client::new_client;
use super::config::{ConnectionConfig, TransportConfig};
use super::connection::InfluxConnection;
use super::error::InfluxError;

/// Connection string used when none is set.
pub const DEFAULT_URI: &str = "http://127.0.0.1:8086";

/// Database configuration holder.
///
/// Credentials set through `Username` / `Password` take precedence over the
/// user info embedded in the connection string. They only apply to HTTP
/// connections.
pub struct InfluxDatabase {
    /// Connection string, see [`ConnectionConfig::parse`].
    pub uri: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Default for InfluxDatabase {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            user: None,
            password: None,
        }
    }
}

impl InfluxDatabase {
    /// Parses the connection string and applies explicit credentials.
    pub fn connection_config(&self) -> Result<ConnectionConfig, InfluxError> {
        let mut config = ConnectionConfig::parse(&self.uri)?;
        if let TransportConfig::Http(http) = &mut config.transport {
            if let Some(user) = &self.user {
                http.username = Some(user.clone());
            }
            if let Some(password) = &self.password {
                http.password = Some(password.clone());
            }
        }
        Ok(config)
    }
}

fn unsupported_option() -> adbc_core::error::Error {
    adbc_core::error::Error::with_message_and_status(
        "Unsupported database option",
        adbc_core::error::Status::NotImplemented,
    )
}

impl Optionable for InfluxDatabase {
    type Option = OptionDatabase;

    fn set_option(&mut self, key: Self::Option, value: OptionValue) -> adbc_core::error::Result<()> {
        let value = match value {
            OptionValue::String(value) => value,
            _ => {
                return Err(adbc_core::error::Error::with_message_and_status(
                    "Expected string value for database option",
                    adbc_core::error::Status::InvalidArguments,
                ));
            }
        };
        match key {
            OptionDatabase::Uri => self.uri = value,
            OptionDatabase::Username => self.user = Some(value),
            OptionDatabase::Password => self.password = Some(value),
            _ => return Err(unsupported_option()),
        }
        Ok(())
    }

    fn get_option_string(&self, key: Self::Option) -> adbc_core::error::Result<String> {
        match key {
            OptionDatabase::Uri => Ok(self.uri.clone()),
            OptionDatabase::Username => Ok(self.user.clone().unwrap_or_default()),
            OptionDatabase::Password => Ok(self.password.clone().unwrap_or_default()),
            _ => Err(unsupported_option()),
        }
    }

    fn get_option_bytes(&self, _key: Self::Option) -> adbc_core::error::Result<Vec<u8>> {
        Err(unsupported_option())
    }

    fn get_option_double(&self, _key: Self::Option) -> adbc_core::error::Result<f64> {
        Err(unsupported_option())
    }

    fn get_option_int(&self, _key: Self::Option) -> adbc_core::error::Result<i64> {
        Err(unsupported_option())
    }
}

impl Database for InfluxDatabase {
    type ConnectionType = InfluxConnection;

    fn new_connection(&self) -> adbc_core::error::Result<Self::ConnectionType> {
        self.new_connection_with_opts(std::iter::empty())
    }

    fn new_connection_with_opts(
        &self,
        opts: impl IntoIterator<Item = (OptionConnection, OptionValue)>,
    ) -> adbc_core::error::Result<Self::ConnectionType> {
        let config = self.connection_config()?;
        let client = new_client(&config.transport)?;
        debug!("connection created for {:?}", config.transport);

        let mut conn = InfluxConnection::new(client, config.database, config.precision);
        for (key, value) in opts {
            conn.set_option(key, value)?;
        }
        Ok(conn)
    }
}
