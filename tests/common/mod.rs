//! Common utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use adbc_core::{Database, Driver, Optionable};
use adbc_influx::{InfluxConnection, InfluxDriver};
use reqwest::Url;

/// Test configuration loaded from environment.
pub struct TestConfig {
    pub host: String,
    pub port: u16,
    pub udp_port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: String,
}

impl TestConfig {
    /// Loads test configuration from environment variables.
    ///
    /// Falls back to defaults if variables are not set.
    pub fn from_env() -> Self {
        // Try to load .env file first
        let _ = dotenvy::dotenv();

        Self {
            host: std::env::var("INFLUX_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("INFLUX_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8086),
            udp_port: std::env::var("INFLUX_UDP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8089),
            user: std::env::var("INFLUX_USER").ok(),
            password: std::env::var("INFLUX_PASSWORD").ok(),
            database: std::env::var("INFLUX_DATABASE").unwrap_or_else(|_| "adbc_test".to_string()),
        }
    }

    /// Builds the HTTP connection string.
    pub fn uri(&self) -> String {
        let creds = match (&self.user, &self.password) {
            (Some(user), Some(pass)) => format!(
                "{}:{}@",
                urlencoding::encode(user),
                urlencoding::encode(pass)
            ),
            (Some(user), None) => format!("{}@", urlencoding::encode(user)),
            _ => String::new(),
        };
        format!("http://{}{}:{}/{}", creds, self.host, self.port, self.database)
    }

    /// Builds the UDP connection string.
    pub fn udp_uri(&self) -> String {
        format!("udp://{}:{}/{}", self.host, self.udp_port, self.database)
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Creates a connection to the live server and a unique database name.
pub fn create_test_connection() -> (InfluxConnection, String) {
    let config = TestConfig::default();
    let mut driver = InfluxDriver::default();

    let mut db = driver.new_database().expect("Failed to create database");
    db.set_option(
        adbc_core::options::OptionDatabase::Uri,
        adbc_core::options::OptionValue::String(config.uri()),
    )
    .expect("Failed to set URI");

    let conn = db.new_connection().expect("Failed to create connection");

    let db_name = format!(
        "test_db_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    );

    (conn, db_name)
}

/// A request seen by [`StubServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Canned answer of [`StubServer`].
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StubResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn no_content() -> Self {
        Self::new(204, "")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

type Handler = dyn Fn(&RecordedRequest) -> StubResponse + Send + Sync;

/// Minimal HTTP/1.1 server answering every request from a handler.
///
/// Runs on its own Tokio runtime thread, so it works from plain tests and
/// from `#[tokio::test]` alike. Each connection serves one request and is
/// closed afterwards.
pub struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub fn start(handler: impl Fn(&RecordedRequest) -> StubResponse + Send + Sync + 'static) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        listener.set_nonblocking(true).expect("non-blocking listener");
        let addr = listener.local_addr().expect("stub server address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .expect("stub server runtime");
            rt.block_on(async move {
                let listener = TcpListener::from_std(listener).expect("stub listener");
                loop {
                    let Ok((stream, _)) = listener.accept().await else { continue };
                    let recorded = Arc::clone(&recorded);
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        let _ = serve(stream, recorded, handler).await;
                    });
                }
            });
        });

        Self { addr, requests }
    }

    /// Server answering every request with `response`.
    pub fn always(response: StubResponse) -> Self {
        Self::start(move |_| response.clone())
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve(
    stream: TcpStream,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    handler: Arc<Handler>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await? == 0 {
        return Ok(());
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or("/").to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;

    let url = Url::parse(&format!("http://stub{}", target)).expect("request target");
    let request = RecordedRequest {
        method,
        path: url.path().to_string(),
        query: url.query_pairs().into_owned().collect(),
        headers,
        body,
    };

    // Handlers may block (e.g. to simulate a slow server).
    let seen = request.clone();
    let response = tokio::task::spawn_blocking(move || handler(&seen))
        .await
        .expect("stub handler");
    recorded.lock().unwrap().push(request);

    let mut out = format!("HTTP/1.1 {} Stub\r\nConnection: close\r\n", response.status);
    if response.status != 204 {
        out.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
    }
    for (name, value) in &response.headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    out.push_str("\r\n");
    if response.status != 204 {
        out.push_str(&response.body);
    }

    write_half.write_all(out.as_bytes()).await?;
    write_half.shutdown().await
}
