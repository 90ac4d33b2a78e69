//! Command-line front end for the iterative resolver.
//!
//! # Usage
//!
//! ```bash
//! iterative-resolver example.com
//! ```
//!
//! On success the resolved IPv4 address is the only thing written to stdout and the
//! process exits 0. On failure an error description goes to stderr and the exit
//! status is non-zero. Diagnostics are logged to stderr; set `RUST_LOG=debug` to see
//! every server the walk contacts.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use iterative_resolver::{Resolver, ResolverConfig};

/// Resolve a domain name to an IPv4 address, starting from a root server
#[derive(Parser, Debug)]
#[command(name = "iterative-resolver")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Domain name to resolve, e.g. example.com
    domain: String,
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let resolver = Resolver::new(ResolverConfig::default());
    let started = Instant::now();

    let addr = match resolver.resolve(&cli.domain) {
        Ok(addr) => addr,
        Err(err) if err.is_timeout() => {
            let timeout = resolver.transport().timeout();
            return Err(err).with_context(|| {
                format!(
                    "Error resolving {}: no response within {:?}",
                    cli.domain, timeout
                )
            });
        }
        Err(err) => return Err(err).with_context(|| format!("Error resolving {}", cli.domain)),
    };

    info!(domain = %cli.domain, elapsed_us = started.elapsed().as_micros() as u64, "resolved");
    println!("{}", addr);
    Ok(())
}
