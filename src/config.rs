//! Compiled-in resolver settings.
//!
//! The resolver reads no files and no environment variables. Everything it needs is
//! either a constant here or a field of [`ResolverConfig`], whose [`Default`] is built
//! from these constants.

use std::net::Ipv4Addr;
use std::time::Duration;

/// DNS servers listen on UDP port 53 (RFC 1035 §4.2.1).
pub const DNS_PORT: u16 = 53;

/// e.root-servers.net, the walk's default starting point.
pub const DEFAULT_ROOT_SERVER: Ipv4Addr = Ipv4Addr::new(192, 203, 230, 10);

/// Receive buffer capacity. UDP messages are limited to 512 bytes without EDNS0.
pub const UDP_BUFFER_SIZE: usize = 512;

/// How long the UDP transport waits for a datagram before giving up.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Transaction id used for every query of a resolution call.
pub const DEFAULT_QUERY_ID: u16 = 22;

/// How many glue-less referrals may nest before resolution is abandoned.
pub const MAX_RECURSION_DEPTH: usize = 8;

/// Settings for one [`Resolver`](crate::resolver::Resolver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Seed servers, pushed onto the frontier in this order (the last is tried first).
    pub root_servers: Vec<Ipv4Addr>,
    /// Destination port for every query.
    pub port: u16,
    /// Capacity of the buffer a response datagram is read into.
    pub buffer_size: usize,
    /// Transaction id stamped on queries and expected back in responses.
    pub query_id: u16,
    /// Maximum nesting of glue-less name server resolutions.
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            root_servers: vec![DEFAULT_ROOT_SERVER],
            port: DNS_PORT,
            buffer_size: UDP_BUFFER_SIZE,
            query_id: DEFAULT_QUERY_ID,
            max_depth: MAX_RECURSION_DEPTH,
        }
    }
}

impl ResolverConfig {
    /// Replaces the seed servers.
    pub fn with_root_servers(mut self, servers: impl IntoIterator<Item = Ipv4Addr>) -> Self {
        self.root_servers = servers.into_iter().collect();
        self
    }
}
