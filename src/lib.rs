//! An iterative DNS resolver.
//!
//! Resolves a domain name to an IPv4 address by starting at a root server and
//! following referrals down the hierarchy until a server answers. The DNS wire format
//! is implemented here directly; no DNS library is involved.
//!
//! - [`dns`] encodes queries and decodes responses
//! - [`resolver`] drives the referral walk
//! - [`transport`] exchanges datagrams with a server
//! - [`config`] holds the compiled-in settings
//! - [`error`] defines [`DnsError`](error::DnsError)

pub mod config;
pub mod dns;
pub mod error;
pub mod resolver;
pub mod transport;

pub use config::ResolverConfig;
pub use error::{DnsError, Result};
pub use resolver::Resolver;
