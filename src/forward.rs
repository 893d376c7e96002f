//! Forwarding of queries to upstream resolvers.
//!
//! Upstreams are tried strictly in configured order over TCP. The first one
//! that returns a decodable response wins; failures only advance to the next
//! server and are never surfaced individually.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::dns::Message;
use crate::error::ResolveError;
use crate::transport::{read_message, write_message};

/// Default time allowed for a single upstream exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends queries to an ordered list of upstream servers with failover.
pub struct Forwarder {
    servers: Vec<SocketAddr>,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(servers: Vec<SocketAddr>) -> Self {
        Self::with_timeout(servers, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(servers: Vec<SocketAddr>, timeout: Duration) -> Self {
        Self { servers, timeout }
    }

    pub fn servers(&self) -> &[SocketAddr] {
        &self.servers
    }

    /// Resolve `request` upstream.
    ///
    /// Only the request's id, opcode, recursion-desired flag and questions are
    /// forwarded; any records the client sent are dropped.
    pub async fn resolve(&self, request: &Message) -> Result<Message, ResolveError> {
        let mut query = Message::response_to(request);
        query.header.response = false;
        query.header.recursion_available = false;
        let query = query.encode()?;

        for &server in &self.servers {
            match self.query_server(server, &query).await {
                Ok(response) => return Ok(response),
                Err(err) => warn!(error = %err, "upstream attempt failed"),
            }
        }

        Err(ResolveError::Exhausted(self.servers.len()))
    }

    /// One attempt against one server. The connection is dropped on every
    /// exit path.
    async fn query_server(&self, server: SocketAddr, query: &[u8]) -> Result<Message, ResolveError> {
        let failed = |reason: String| ResolveError::Attempt { server, reason };

        let mut stream = tokio::time::timeout(self.timeout, TcpStream::connect(server))
            .await
            .map_err(|_| failed("timed out connecting".to_string()))?
            .map_err(|e| failed(format!("connect: {}", e)))?;

        write_message(&mut stream, query)
            .await
            .map_err(|e| failed(format!("send: {}", e)))?;

        debug!(server = %server, query_len = query.len(), "TCP query sent");

        let response = tokio::time::timeout(self.timeout, read_message(&mut stream))
            .await
            .map_err(|_| failed(format!("no response within {:?}", self.timeout)))?
            .map_err(|e| failed(format!("receive: {}", e)))?;

        debug!(server = %server, response_len = response.len(), "TCP response received");

        Message::decode(&response).map_err(|e| failed(format!("bad response: {}", e)))
    }
}
