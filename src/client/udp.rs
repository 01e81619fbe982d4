//! UDP transport.
//!
//! Writes are split into datagrams on line boundaries and sent without
//! acknowledgement. A failed send aborts the remaining chunks; datagrams
//! already sent stay ingested. Queries need a response channel and are
//! refused.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Mutex;
use std::time::Duration;

use log::{debug, trace};

use super::{Client, Pong, Query, Response};
use crate::chunker::chunks;
use crate::config::UdpConfig;
use crate::error::{InfluxError, Result};
use crate::line_protocol::WriteOptions;

/// Client for the UDP ingestion service.
#[derive(Debug)]
pub struct UdpClient {
    socket: Mutex<Option<UdpSocket>>,
    peer: SocketAddr,
    payload_size: usize,
}

impl UdpClient {
    /// Resolves `config.addr` and connects a local socket to it.
    ///
    /// A zero `payload_size` falls back to the default of 512 bytes.
    pub fn new(config: UdpConfig) -> Result<Self> {
        let peer = config
            .addr
            .to_socket_addrs()
            .map_err(|e| InfluxError::config(format!("cannot resolve {:?}: {}", config.addr, e)))?
            .next()
            .ok_or_else(|| InfluxError::config(format!("{:?} resolved to no address", config.addr)))?;

        let local = if peer.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local)?;
        socket.connect(peer)?;

        let payload_size = if config.payload_size == 0 {
            crate::chunker::DEFAULT_PAYLOAD_SIZE
        } else {
            config.payload_size
        };
        debug!("udp client connected to {} (payload size {})", peer, payload_size);

        Ok(Self {
            socket: Mutex::new(Some(socket)),
            peer,
            payload_size,
        })
    }

    /// Address datagrams are sent to.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn payload_size(&self) -> usize {
        self.payload_size
    }
}

impl Client for UdpClient {
    fn ping(&self, _timeout: Duration) -> Result<Pong> {
        Ok(Pong::default())
    }

    /// Precision, retention policy and consistency are configured on the
    /// server's UDP listener, so `options` is not transmitted.
    fn write(&self, payload: &[u8], _options: &WriteOptions) -> Result<()> {
        let guard = self
            .socket
            .lock()
            .map_err(|_| InfluxError::transport("udp socket lock poisoned"))?;
        let socket = guard
            .as_ref()
            .ok_or_else(|| InfluxError::transport("socket already closed"))?;

        let mut sent = 0;
        for chunk in chunks(payload, self.payload_size) {
            socket.send(chunk)?;
            sent += 1;
        }
        trace!("sent {} bytes in {} datagrams to {}", payload.len(), sent, self.peer);
        Ok(())
    }

    fn query(&self, _query: &Query) -> Result<Response> {
        Err(InfluxError::unsupported(
            "querying not supported over this transport",
        ))
    }

    fn close(&self) -> Result<()> {
        let mut guard = self
            .socket
            .lock()
            .map_err(|_| InfluxError::transport("udp socket lock poisoned"))?;
        match guard.take() {
            Some(socket) => {
                drop(socket);
                Ok(())
            }
            None => Err(InfluxError::transport("socket already closed")),
        }
    }
}
