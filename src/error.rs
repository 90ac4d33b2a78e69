//! Error types shared by the wire codec, the transport and the resolution engine.
//!
//! Every error is fatal to the resolution call that produced it. Nothing in this
//! crate retries; the caller receives exactly one [`DnsError`] and no partial result.

use std::net::SocketAddrV4;

use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, DnsError>;

/// Errors that can occur while encoding, decoding or resolving.
#[derive(Debug, Error)]
pub enum DnsError {
    /// A label of the name being encoded is longer than 63 bytes.
    #[error("label '{label}' is {length} bytes, exceeds maximum of 63")]
    LabelTooLong {
        /// The offending label.
        label: String,
        /// Its length in bytes.
        length: usize,
    },

    /// The name being encoded contains an empty label (e.g. `a..b`).
    #[error("empty label in domain name '{name}'")]
    EmptyLabel { name: String },

    /// The encoded name would exceed 255 bytes.
    #[error("domain name '{name}' is {length} bytes on the wire, exceeds maximum of 255")]
    NameTooLong { name: String, length: usize },

    /// A decode ran out of bounds or found inconsistent lengths.
    #[error("malformed message at offset {offset}: {reason}")]
    MalformedMessage {
        /// Byte offset where decoding failed.
        offset: usize,
        /// What was wrong.
        reason: String,
    },

    /// Following compression pointers revisited an offset within a single name.
    #[error("compression pointer loop at offset {offset}")]
    PointerLoop { offset: usize },

    /// The response does not belong to the query that was sent.
    #[error("response from {server} does not match query: {reason}")]
    ProtocolMismatch { server: SocketAddrV4, reason: String },

    /// The server answered with no records in any section.
    #[error("no records received from {server}")]
    EmptyResponse { server: SocketAddrV4 },

    /// Dialing, sending to or receiving from a server failed.
    #[error("transport error talking to {server}: {source}")]
    Transport {
        server: SocketAddrV4,
        #[source]
        source: std::io::Error,
    },

    /// Every candidate server was tried without reaching an answer.
    #[error("failed to resolve '{name}': no servers left to query")]
    ResolutionExhausted { name: String },

    /// Resolving glue-less name servers nested deeper than allowed.
    #[error("nested name server resolution for '{name}' exceeded depth limit of {limit}")]
    RecursionLimitExceeded { name: String, limit: usize },
}

impl DnsError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        DnsError::MalformedMessage {
            offset,
            reason: reason.into(),
        }
    }

    /// Returns `true` if the error came from a receive timeout in the transport.
    pub fn is_timeout(&self) -> bool {
        match self {
            DnsError::Transport { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}
