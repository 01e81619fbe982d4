//! Error types for the ADBC-Influx driver.
//!
//! Every failure the driver can produce is an [`InfluxError`]. At the ADBC
//! boundary it is converted into `adbc_core::error::Error` with a matching
//! status code.

use std::backtrace::Backtrace;
use std::fmt::{Display, Formatter};

/// Result alias used by the client layer.
pub type Result<T> = std::result::Result<T, InfluxError>;

/// Error type for ADBC-Influx operations.
///
/// Carries the error category and a backtrace captured at creation time.
#[derive(Debug)]
pub struct InfluxError {
    kind: ErrorKind,
    backtrace: Backtrace,
}

impl InfluxError {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    /// Creates a configuration error (malformed address, scheme or option).
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config(msg.into()))
    }

    /// Creates a transport error (network failure, bad status, undecodable body).
    pub(crate) fn transport(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport(msg.into()))
    }

    /// Creates a protocol error from a server-reported error message.
    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol(msg.into()))
    }

    /// Creates an error for an operation the driver or transport does not offer.
    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported(msg.into()))
    }

    /// Creates an error for transaction misuse.
    pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState(msg.into()))
    }

    /// Builds the error for a non-success HTTP status.
    ///
    /// The raw body is kept as the message; an empty body falls back to the
    /// status code alone.
    pub(crate) fn http_status(status: u16, body: &[u8]) -> Self {
        let body = String::from_utf8_lossy(body);
        let body = body.trim();
        if body.is_empty() {
            Self::transport(format!("received status code {} from server", status))
        } else {
            Self::transport(format!("received status code {} from server: {}", status, body))
        }
    }

    /// Returns the backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Returns the bare message without the category prefix.
    pub fn message(&self) -> &str {
        match &self.kind {
            ErrorKind::Config(msg)
            | ErrorKind::Transport(msg)
            | ErrorKind::Protocol(msg)
            | ErrorKind::Unsupported(msg)
            | ErrorKind::InvalidState(msg) => msg,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self.kind, ErrorKind::Config(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self.kind, ErrorKind::Protocol(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.kind, ErrorKind::Unsupported(_))
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidState(_))
    }

    /// Returns the corresponding ADBC status code.
    pub fn adbc_status(&self) -> adbc_core::error::Status {
        use adbc_core::error::Status;

        match &self.kind {
            ErrorKind::Config(_) => Status::InvalidArguments,
            ErrorKind::Transport(_) => Status::IO,
            ErrorKind::Protocol(_) => Status::Internal,
            ErrorKind::Unsupported(_) => Status::NotImplemented,
            ErrorKind::InvalidState(_) => Status::InvalidState,
        }
    }
}

impl Display for InfluxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ErrorKind::Config(msg) => write!(f, "Configuration error: {}", msg),
            ErrorKind::Transport(msg) => write!(f, "Transport error: {}", msg),
            ErrorKind::Protocol(msg) => write!(f, "Server error: {}", msg),
            ErrorKind::Unsupported(msg) => write!(f, "Unsupported operation: {}", msg),
            ErrorKind::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl std::error::Error for InfluxError {}

#[derive(Debug)]
enum ErrorKind {
    Config(String),
    Transport(String),
    Protocol(String),
    Unsupported(String),
    InvalidState(String),
}

/// Converts `InfluxError` to ADBC `Error`.
impl From<InfluxError> for adbc_core::error::Error {
    fn from(err: InfluxError) -> Self {
        adbc_core::error::Error::with_message_and_status(err.to_string(), err.adbc_status())
    }
}

impl From<reqwest::Error> for InfluxError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

impl From<std::io::Error> for InfluxError {
    fn from(err: std::io::Error) -> Self {
        Self::transport(err.to_string())
    }
}

impl From<serde_json::Error> for InfluxError {
    fn from(err: serde_json::Error) -> Self {
        Self::transport(format!("unable to decode json: {}", err))
    }
}

/// ADBC error for entry points this driver leaves unimplemented.
pub(crate) fn not_implemented(what: &str) -> adbc_core::error::Error {
    adbc_core::error::Error::with_message_and_status(
        format!("{} not implemented", what),
        adbc_core::error::Status::NotImplemented,
    )
}

/// ADBC error for failures while assembling an Arrow batch.
pub(crate) fn internal(context: &str, err: impl Display) -> adbc_core::error::Error {
    adbc_core::error::Error::with_message_and_status(
        format!("{}: {}", context, err),
        adbc_core::error::Status::Internal,
    )
}
