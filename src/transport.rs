//! Query/response exchange with a single name server.
//!
//! The resolution engine never touches sockets. It hands an encoded query to a
//! [`Transport`] and gets back the bytes of one response datagram. [`UdpTransport`]
//! is the real implementation; tests substitute scripted servers.

use std::io;
use std::net::{SocketAddrV4, UdpSocket};
use std::time::Duration;

use tracing::trace;

use crate::config::DEFAULT_TIMEOUT;

/// Sends one query to a server and reads one response.
pub trait Transport {
    /// Sends `query` to `server` and reads a single datagram into `response`,
    /// returning the number of bytes received.
    ///
    /// Any error is terminal for the resolution call in progress.
    fn exchange(
        &self,
        server: SocketAddrV4,
        query: &[u8],
        response: &mut [u8],
    ) -> io::Result<usize>;
}

/// Blocking UDP transport that opens a fresh socket for every exchange.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    timeout: Duration,
}

impl UdpTransport {
    pub fn new(timeout: Duration) -> Self {
        UdpTransport { timeout }
    }

    /// How long a send or receive may block before the exchange fails.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        UdpTransport::new(DEFAULT_TIMEOUT)
    }
}

impl Transport for UdpTransport {
    fn exchange(
        &self,
        server: SocketAddrV4,
        query: &[u8],
        response: &mut [u8],
    ) -> io::Result<usize> {
        // Let the OS pick the interface and an ephemeral port.
        let socket = UdpSocket::bind("0.0.0.0:0")?;

        // Connecting filters out datagrams from any other peer.
        socket.connect(server)?;
        socket.set_read_timeout(Some(self.timeout))?;
        socket.set_write_timeout(Some(self.timeout))?;

        let sent = socket.send(query)?;
        trace!(%server, bytes = sent, "query sent");

        let received = socket.recv(response)?;
        trace!(%server, bytes = received, "response received");
        Ok(received)
    }
}
