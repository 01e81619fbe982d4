//! Transport clients.
//!
//! [`Client`] is the capability set the driver relies on. Two
//! implementations exist: [`HttpClient`] talks request/response over HTTP,
//! [`UdpClient`] sends fire-and-forget datagrams and can only write.
//! [`new_client`] picks one from a [`TransportConfig`].

pub mod http;
pub mod udp;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::config::TransportConfig;
use crate::error::{InfluxError, Result};
use crate::line_protocol::{Precision, WriteOptions};

pub use http::HttpClient;
pub use udp::UdpClient;

/// Operations every transport offers.
///
/// Implementations hold only read-only configuration plus a network handle,
/// so one client can be shared between a connection and its statements.
pub trait Client: Send + Sync {
    /// Checks that the server is up.
    ///
    /// A non-zero `timeout` asks the server to wait that long for a cluster
    /// leader before answering.
    fn ping(&self, timeout: Duration) -> Result<Pong>;

    /// Sends a line-protocol payload.
    fn write(&self, payload: &[u8], options: &WriteOptions) -> Result<()>;

    /// Runs a statement on the query endpoint.
    fn query(&self, query: &Query) -> Result<Response>;

    /// Releases network resources.
    fn close(&self) -> Result<()>;
}

/// Builds the client matching the configured transport.
pub fn new_client(config: &TransportConfig) -> Result<Arc<dyn Client>> {
    match config {
        TransportConfig::Http(http) => Ok(Arc::new(HttpClient::new(http.clone())?)),
        TransportConfig::Udp(udp) => Ok(Arc::new(UdpClient::new(udp.clone())?)),
    }
}

/// Answer to a ping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pong {
    /// Round-trip time of the request.
    pub rtt: Duration,
    /// Server version reported by the server, empty when unknown.
    pub version: String,
}

/// A statement sent to the query endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub command: String,
    /// Database the statement runs against; may be empty.
    pub database: String,
    /// Requested timestamp precision of the results (`epoch`).
    pub precision: Option<Precision>,
}

impl Query {
    pub fn new(command: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            database: database.into(),
            precision: None,
        }
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = Some(precision);
        self
    }
}

/// Decoded body of a query response.
///
/// Numbers keep their exact textual form, so nanosecond timestamps and
/// large integers survive decoding unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub results: Vec<StatementResult>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Response {
    /// Returns the top-level error, else the first statement error.
    pub fn error(&self) -> Option<InfluxError> {
        if let Some(err) = self.error.as_deref().filter(|e| !e.is_empty()) {
            return Some(InfluxError::protocol(err));
        }
        self.results
            .iter()
            .filter_map(|r| r.error.as_deref())
            .find(|e| !e.is_empty())
            .map(InfluxError::protocol)
    }
}

/// Result of one statement inside a response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatementResult {
    #[serde(default)]
    pub statement_id: Option<u64>,
    #[serde(default)]
    pub series: Vec<Series>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One series of rows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    pub partial: bool,
}

impl Series {
    /// Returns the string values of column `name`, skipping non-strings.
    pub fn string_column(&self, name: &str) -> Vec<String> {
        let Some(idx) = self.columns.iter().position(|c| c == name) else {
            return Vec::new();
        };
        self.values
            .iter()
            .filter_map(|row| row.get(idx).and_then(|v| v.as_str()).map(str::to_string))
            .collect()
    }
}

/// Informational message attached to a statement result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub level: String,
    pub text: String,
}
