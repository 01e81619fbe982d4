//! Connection configuration.
//!
//! A connection string has the form
//!
//! ```text
//! scheme://[user[:password]@]host[:port][/database][?timeout=10s&precision=ms&ua=agent]
//! ```
//!
//! `http` and `https` select the HTTP transport, `udp` the datagram
//! transport. The `payload_size` parameter applies to `udp` only.

use std::time::Duration;

use reqwest::Url;

use crate::chunker::DEFAULT_PAYLOAD_SIZE;
use crate::error::{InfluxError, Result};
use crate::line_protocol::Precision;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "InfluxDBClient";

/// Settings for the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Base address, e.g. `http://localhost:8086`.
    pub addr: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub user_agent: String,
    /// Per-request timeout. Zero means no timeout.
    pub timeout: Duration,
    /// Skip TLS certificate verification for `https` addresses.
    pub insecure_skip_verify: bool,
}

impl HttpConfig {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            username: None,
            password: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::ZERO,
            insecure_skip_verify: false,
        }
    }
}

/// Settings for the UDP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpConfig {
    /// `host:port` or `[ipv6-host]:port`.
    pub addr: String,
    /// Maximum datagram payload in bytes.
    pub payload_size: usize,
}

impl UdpConfig {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            payload_size: DEFAULT_PAYLOAD_SIZE,
        }
    }
}

/// Transport selected by the connection string scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    Http(HttpConfig),
    Udp(UdpConfig),
}

/// Parsed connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub transport: TransportConfig,
    /// Default database for generic statements and transaction commits.
    pub database: String,
    /// Default precision for query results.
    pub precision: Precision,
}

impl ConnectionConfig {
    /// Parses a connection string.
    ///
    /// # Errors
    /// Returns a configuration error for malformed addresses, unsupported
    /// schemes, or unparsable `timeout` / `precision` / `payload_size` values.
    pub fn parse(uri: &str) -> Result<Self> {
        let url = Url::parse(uri)
            .map_err(|e| InfluxError::config(format!("invalid connection string {:?}: {}", uri, e)))?;

        let host = url
            .host_str()
            .ok_or_else(|| InfluxError::config(format!("connection string {:?} has no host", uri)))?;
        let host_port = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let mut timeout = Duration::ZERO;
        let mut precision = Precision::default();
        let mut user_agent = None;
        let mut payload_size = DEFAULT_PAYLOAD_SIZE;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "timeout" => timeout = parse_duration(&value)?,
                "precision" if !value.is_empty() => precision = value.parse()?,
                "ua" if !value.is_empty() => user_agent = Some(value.into_owned()),
                "payload_size" => {
                    payload_size = value.parse().map_err(|_| {
                        InfluxError::config(format!("invalid payload_size {:?}", value))
                    })?
                }
                _ => {}
            }
        }

        let transport = match url.scheme() {
            "http" | "https" => {
                let mut http = HttpConfig::new(format!("{}://{}", url.scheme(), host_port));
                if !url.username().is_empty() {
                    http.username = Some(decode(url.username())?);
                    http.password = url.password().map(decode).transpose()?;
                }
                if let Some(ua) = user_agent {
                    http.user_agent = ua;
                }
                http.timeout = timeout;
                TransportConfig::Http(http)
            }
            "udp" => {
                if url.port().is_none() {
                    return Err(InfluxError::config(format!(
                        "udp connection string {:?} needs a port",
                        uri
                    )));
                }
                TransportConfig::Udp(UdpConfig {
                    addr: host_port,
                    payload_size,
                })
            }
            other => {
                return Err(InfluxError::config(format!("unsupported scheme {}", other)));
            }
        };

        let database = url.path().trim_start_matches('/').to_string();

        Ok(Self {
            transport,
            database: decode(&database)?,
            precision,
        })
    }
}

fn decode(s: &str) -> Result<String> {
    urlencoding::decode(s)
        .map(|c| c.into_owned())
        .map_err(|e| InfluxError::config(format!("invalid percent-encoding in {:?}: {}", s, e)))
}

/// Parses a duration such as `300ms`, `1.5s`, `1m30s` or `2h`.
///
/// A bare `0` or an empty string means no timeout.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let invalid = || InfluxError::config(format!("invalid duration {:?}", s));

    if s.is_empty() || s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if num_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..num_len].parse().map_err(|_| invalid())?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];
        total += value * nanos_per_unit;
    }

    Ok(Duration::from_nanos(total.round() as u64))
}
