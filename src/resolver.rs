//! Iterative resolution engine.
//!
//! This module walks the DNS hierarchy for an IPv4 address the way a recursive server
//! does on a client's behalf: ask a root server, follow the referral it returns to
//! the servers of a more specific zone, and keep going until some server answers.
//!
//! # Algorithm
//!
//! A resolution call keeps two pieces of state, both owned by the call:
//!
//! - the *frontier*, a stack of candidate server addresses still to be tried
//!   (most recently discovered first)
//! - the *visited* set, every address ever pushed onto the frontier, so no server is
//!   asked twice within one call
//!
//! Each response is validated against the query (transaction id, echoed question)
//! and then either answers the question or refers onwards. A referral's glue records
//! (`A` records in the additional section) become new candidates. When a referral
//! carries no usable glue, the first name server in its authority section is itself
//! resolved by a nested call with fresh state; nesting depth is capped by
//! [`ResolverConfig::max_depth`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use iterative_resolver::config::ResolverConfig;
//! use iterative_resolver::resolver::Resolver;
//!
//! let resolver = Resolver::new(ResolverConfig::default());
//! let addr = resolver.resolve("example.com")?;
//! println!("{}", addr);
//! # Ok::<(), iterative_resolver::error::DnsError>(())
//! ```
//!
//! # Limitations
//!
//! Only the first answer record is inspected and CNAMEs are not followed. Truncated
//! responses are used as received; there is no TCP fallback.

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddrV4};

use tracing::{debug, trace, warn};

use crate::config::ResolverConfig;
use crate::dns::{
    CLASS_IN, DnsHeader, DnsQuestion, HEADER_SIZE, QueryType, ResourceRecord, decode_records,
    encode_query,
};
use crate::error::{DnsError, Result};
use crate::transport::{Transport, UdpTransport};

/// What a single validated response told us.
#[derive(Debug)]
enum Outcome {
    /// The first answer record carried an address.
    Answer(Ipv4Addr),
    /// No address; the server pointed elsewhere (or nowhere).
    Referral {
        authorities: Vec<ResourceRecord>,
        additionals: Vec<ResourceRecord>,
    },
}

/// Resolves domain names to IPv4 addresses by walking referrals from the root.
#[derive(Debug, Clone)]
pub struct Resolver<T = UdpTransport> {
    transport: T,
    config: ResolverConfig,
}

impl Resolver<UdpTransport> {
    /// A resolver talking UDP with the default receive timeout.
    pub fn new(config: ResolverConfig) -> Self {
        Resolver::with_transport(UdpTransport::default(), config)
    }
}

impl<T: Transport> Resolver<T> {
    pub fn with_transport(transport: T, config: ResolverConfig) -> Self {
        Resolver { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolves `domain_name` to an IPv4 address.
    ///
    /// Servers are queried strictly one at a time. The first error of any kind ends
    /// the call; there are no retries and no fallback to other candidates.
    ///
    /// # Errors
    ///
    /// - [`DnsError::LabelTooLong`] and friends if `domain_name` cannot be encoded
    /// - [`DnsError::Transport`] if sending or receiving fails (including timeouts)
    /// - [`DnsError::MalformedMessage`] / [`DnsError::PointerLoop`] for undecodable responses
    /// - [`DnsError::ProtocolMismatch`] if a response's id or question doesn't match
    /// - [`DnsError::EmptyResponse`] if a server returns no records at all
    /// - [`DnsError::ResolutionExhausted`] if every candidate was tried without an answer
    /// - [`DnsError::RecursionLimitExceeded`] if glue-less referrals nest too deeply
    pub fn resolve(&self, domain_name: &str) -> Result<Ipv4Addr> {
        self.resolve_at_depth(domain_name, 0)
    }

    fn resolve_at_depth(&self, domain_name: &str, depth: usize) -> Result<Ipv4Addr> {
        let target = domain_name.strip_suffix('.').unwrap_or(domain_name);
        let query = encode_query(
            self.config.query_id,
            0,
            target,
            QueryType::A as u16,
            CLASS_IN,
        )?;

        let mut frontier: Vec<Ipv4Addr> = Vec::with_capacity(self.config.root_servers.len());
        let mut visited: HashSet<Ipv4Addr> = HashSet::new();
        for &seed in &self.config.root_servers {
            if visited.insert(seed) {
                frontier.push(seed);
            }
        }

        let mut response = vec![0u8; self.config.buffer_size];

        while let Some(ip) = frontier.pop() {
            let server = SocketAddrV4::new(ip, self.config.port);
            debug!(%server, name = target, depth, "querying");

            let len = self
                .transport
                .exchange(server, &query, &mut response)
                .map_err(|source| DnsError::Transport { server, source })?;

            let (authorities, additionals) =
                match self.read_response(server, target, &response[..len])? {
                    Outcome::Answer(addr) => {
                        debug!(%server, name = target, %addr, "answered");
                        return Ok(addr);
                    }
                    Outcome::Referral {
                        authorities,
                        additionals,
                    } => (authorities, additionals),
                };

            let before = frontier.len();
            for glue in additionals.iter().filter_map(ResourceRecord::ipv4) {
                if visited.insert(glue) {
                    frontier.push(glue);
                }
            }

            if frontier.len() > before || authorities.is_empty() {
                continue;
            }

            // No fresh glue: look up a name server's address ourselves.
            let Some(nameserver) = authorities.iter().find_map(ResourceRecord::nameserver) else {
                warn!(%server, name = target, "referral names no name server");
                continue;
            };

            if depth >= self.config.max_depth {
                return Err(DnsError::RecursionLimitExceeded {
                    name: nameserver.to_string(),
                    limit: self.config.max_depth,
                });
            }

            debug!(%server, nameserver, "referral without glue, resolving name server");
            let addr = self.resolve_at_depth(nameserver, depth + 1)?;
            if visited.insert(addr) {
                frontier.push(addr);
            } else {
                debug!(nameserver, %addr, "name server already queried");
            }
        }

        Err(DnsError::ResolutionExhausted {
            name: target.to_string(),
        })
    }

    /// Validates a response against the query for `target` and pulls out either the
    /// answer or the referral sections.
    fn read_response(&self, server: SocketAddrV4, target: &str, buffer: &[u8]) -> Result<Outcome> {
        let header = DnsHeader::from_bytes(buffer)?;
        if header.id != self.config.query_id {
            return Err(DnsError::ProtocolMismatch {
                server,
                reason: format!(
                    "expected response with id {} but got {}",
                    self.config.query_id, header.id
                ),
            });
        }
        if header.record_count() == 0 {
            return Err(DnsError::EmptyResponse { server });
        }
        if header.is_truncated() {
            warn!(%server, "response truncated, using partial records");
        }
        trace!(%server, ?header, rcode = ?header.response_code(), "decoded header");

        let (question, mut offset) = DnsQuestion::from_bytes(buffer, HEADER_SIZE)?;
        if !question.name.eq_ignore_ascii_case(target) {
            return Err(DnsError::ProtocolMismatch {
                server,
                reason: format!("asked about '{}' but response is for '{}'", target, question.name),
            });
        }

        if header.answer_count > 0 {
            let (first, next) = ResourceRecord::from_bytes(buffer, offset)?;
            if let Some(addr) = first.ipv4() {
                return Ok(Outcome::Answer(addr));
            }
            debug!(%server, record = %first, "first answer carries no address");

            let (_, next) = decode_records(buffer, next, header.answer_count - 1)?;
            offset = next;
        }

        let (authorities, offset) = decode_records(buffer, offset, header.authority_count)?;
        let (additionals, _) = decode_records(buffer, offset, header.additional_count)?;
        for record in authorities.iter().chain(&additionals) {
            trace!(%server, %record, "referral record");
        }

        Ok(Outcome::Referral {
            authorities,
            additionals,
        })
    }
}
