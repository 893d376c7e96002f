//! TCP transport for DNS queries.
//!
//! Each client connection carries a single query: we read it, let the
//! resolver answer it, write the reply and close the connection.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::{read_message, write_message};
use crate::resolver::Resolver;

/// TCP transport for DNS proxy.
///
/// Binds to a local address and accepts connections from clients.
/// Each connection is handled in a separate task.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Bind a TCP listener for the transport.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;

        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Start the TCP transport.
    ///
    /// Spawns an accept loop that handles each connection in a separate task.
    pub fn start(self, resolver: Arc<Resolver>) -> JoinHandle<()> {
        tokio::spawn(run_accept_loop(self.listener, resolver))
    }
}

/// Accept loop - spawns a handler task for each incoming connection.
async fn run_accept_loop(listener: TcpListener, resolver: Arc<Resolver>) {
    loop {
        match listener.accept().await {
            Ok((client, peer)) => {
                tokio::spawn(handle_connection(client, peer, resolver.clone()));
            }
            Err(e) => {
                error!(error = %e, "TCP accept error");
            }
        }
    }
}

/// Handle a single TCP connection: read query, resolve, return response.
async fn handle_connection(mut client: TcpStream, peer: SocketAddr, resolver: Arc<Resolver>) {
    let query = match read_message(&mut client).await {
        Ok(q) => q,
        Err(e) => {
            debug!(peer = %peer, error = %e, "failed to read query");
            return;
        }
    };

    let Some(response) = resolver.handle_query(&query, &peer.ip().to_string()).await else {
        debug!(peer = %peer, "dropping undecodable query");
        return;
    };

    if let Err(e) = write_message(&mut client, &response).await {
        debug!(peer = %peer, error = %e, "failed to write response");
    }
}
