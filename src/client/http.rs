//! HTTP transport.
//!
//! Talks to the `/ping`, `/write` and `/query` endpoints. The async
//! `reqwest` client is driven through [`Runtime`] so every call blocks.

use std::time::{Duration, Instant};

use log::{debug, trace};
use reqwest::{RequestBuilder, StatusCode, Url};

use super::{Client, Pong, Query, Response};
use crate::config::HttpConfig;
use crate::error::{InfluxError, Result};
use crate::line_protocol::WriteOptions;
use crate::utils::Runtime;

/// Header carrying the server version in ping responses.
const VERSION_HEADER: &str = "X-Influxdb-Version";

/// Client for the HTTP API.
///
/// All fields are read-only after construction, and each call builds its
/// own request, so the client is safe to share between threads.
#[derive(Debug)]
pub struct HttpClient {
    rt: Runtime,
    http: reqwest::Client,
    url: Url,
    username: Option<String>,
    password: Option<String>,
    user_agent: String,
}

impl HttpClient {
    /// Creates a client from `config`.
    ///
    /// # Errors
    /// Returns a configuration error when the address does not parse or its
    /// scheme is neither `http` nor `https`.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let url = Url::parse(&config.addr)
            .map_err(|e| InfluxError::config(format!("invalid address {:?}: {}", config.addr, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(InfluxError::config(format!(
                "unsupported protocol scheme: {}, your address must start with http:// or https://",
                url.scheme()
            )));
        }

        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure_skip_verify);
        if !config.timeout.is_zero() {
            builder = builder.timeout(config.timeout);
        }
        let http = builder
            .build()
            .map_err(|e| InfluxError::config(format!("failed to build http client: {}", e)))?;

        let rt = Runtime::new()
            .map_err(|e| InfluxError::transport(format!("failed to create runtime: {}", e)))?;

        Ok(Self {
            rt,
            http,
            url,
            username: config.username,
            password: config.password,
            user_agent: config.user_agent,
        })
    }

    /// Returns the base address requests are sent to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.url.clone();
        url.set_path(path);
        url
    }

    fn decorate(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req.header(reqwest::header::USER_AGENT, self.user_agent.as_str());
        match &self.username {
            Some(user) => req.basic_auth(user, self.password.as_ref()),
            None => req,
        }
    }
}

impl Client for HttpClient {
    fn ping(&self, timeout: Duration) -> Result<Pong> {
        let start = Instant::now();
        let mut req = self.decorate(self.http.get(self.endpoint("ping")));
        if !timeout.is_zero() {
            req = req.query(&[("wait_for_leader", format!("{:.0}s", timeout.as_secs_f64()))]);
        }

        let (status, version, body) = self.rt.block_on(async {
            let resp = req.send().await?;
            let status = resp.status();
            let version = resp
                .headers()
                .get(VERSION_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let body = resp.bytes().await?;
            Ok::<_, reqwest::Error>((status, version, body))
        })?;

        if status != StatusCode::NO_CONTENT {
            return Err(InfluxError::http_status(status.as_u16(), &body));
        }
        let rtt = start.elapsed();
        debug!("ping {} answered in {:?}, version {:?}", self.url, rtt, version);
        Ok(Pong { rtt, version })
    }

    fn write(&self, payload: &[u8], options: &WriteOptions) -> Result<()> {
        let mut params = vec![("db", options.database.clone())];
        if let Some(rp) = options.retention_policy.as_ref().filter(|rp| !rp.is_empty()) {
            params.push(("rp", rp.clone()));
        }
        if let Some(precision) = options.precision {
            params.push(("precision", precision.as_str().to_string()));
        }
        if let Some(consistency) = options.consistency.as_ref().filter(|c| !c.is_empty()) {
            params.push(("consistency", consistency.clone()));
        }

        let req = self
            .decorate(self.http.post(self.endpoint("write")))
            .header(reqwest::header::CONTENT_TYPE, "")
            .query(&params)
            .body(payload.to_vec());

        trace!("writing {} bytes to database {:?}", payload.len(), options.database);
        let (status, body) = self.rt.block_on(async {
            let resp = req.send().await?;
            let status = resp.status();
            let body = resp.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        })?;

        if status != StatusCode::OK && status != StatusCode::NO_CONTENT {
            debug!("write to {:?} rejected with {}", options.database, status);
            return Err(InfluxError::http_status(status.as_u16(), &body));
        }
        Ok(())
    }

    fn query(&self, query: &Query) -> Result<Response> {
        let mut params = vec![
            ("q", query.command.clone()),
            ("db", query.database.clone()),
        ];
        if let Some(precision) = query.precision {
            params.push(("epoch", precision.as_str().to_string()));
        }

        let req = self
            .decorate(self.http.post(self.endpoint("query")))
            .header(reqwest::header::CONTENT_TYPE, "")
            .query(&params);

        trace!("query {:?} on database {:?}", query.command, query.database);
        let (status, body) = self.rt.block_on(async {
            let resp = req.send().await?;
            let status = resp.status();
            let body = resp.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        })?;

        decode_query_response(status, &body)
    }

    fn close(&self) -> Result<()> {
        // reqwest releases idle connections when the client drops; nothing to
        // tear down early.
        Ok(())
    }
}

/// Turns a query response into a [`Response`] or an error.
///
/// On a non-200 status a body that fails to decode is ignored in favor of
/// the status; a body that decodes and carries an error string is returned
/// as is so the caller sees the server's message.
fn decode_query_response(status: StatusCode, body: &[u8]) -> Result<Response> {
    let decoded = serde_json::from_slice::<Response>(body);
    if status == StatusCode::OK {
        return Ok(decoded?);
    }
    match decoded {
        Ok(resp) if resp.error().is_some() => Ok(resp),
        _ => Err(InfluxError::http_status(status.as_u16(), body)),
    }
}
