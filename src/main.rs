//! farsound - a lossless music library served from a remote network share.
//!
//! Mounts an SMB/CIFS share, indexes its two-level album tree into SQLite,
//! and resolves stored track paths through a bounded local cache so an
//! external player can stream files that live on a slow or intermittently
//! available remote source.

pub mod cache;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod library;
pub mod maintenance;
pub mod metadata;
pub mod model;
pub mod net;
pub mod scanner;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("farsound=info".parse().unwrap()))
        .init();

    cli::run_command(&args)
}
