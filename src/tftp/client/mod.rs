//! TFTP client implementation
//!
//! - `client`: Socket setup and the initial request
//! - `session`: The DATA/ACK state machine driving one transfer
//! - `config`: Client configuration

mod client;
mod config;
mod session;

use std::path::PathBuf;

use anyhow::Result;

// Public client types
pub use client::Client;
pub use config::{ClientConfig, DEFAULT_PORT};
pub use session::{Direction, Session, State, Summary, Transfer};

/// Run one transfer
///
/// `filename` names the file on the server; `local` defaults to the same path.
pub fn run(
    config: ClientConfig,
    direction: Direction,
    filename: &str,
    local: Option<PathBuf>,
) -> Result<Summary> {
    let local = local.unwrap_or_else(|| PathBuf::from(filename));
    log::debug!(
        "Server {}:{}, mode {}, timeout {:?}",
        config.host,
        config.port,
        config.mode,
        config.timeout
    );

    let client = Client::new(config)?;
    match direction {
        Direction::Download => client.get(filename, &local),
        Direction::Upload => client.put(&local, filename),
    }
}
