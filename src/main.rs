use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tftpc::tftp::client::{self, ClientConfig, Direction};
use tftpc::tftp::core::TransferMode;

/// Minimal TFTP client
#[derive(Parser, Debug)]
#[command(name = "tftpc", version, about = "TFTP client program", long_about = None)]
struct Cli {
    /// Server host name or IP address
    host: String,

    /// get or put a file
    action: Action,

    /// Name of file to transfer
    filename: String,

    /// Server port number [default: 69]
    #[arg(short, long)]
    port: Option<u16>,

    /// Transfer mode (netascii or octet) [default: netascii]
    #[arg(short, long)]
    mode: Option<TransferMode>,

    /// Local file path, defaults to FILENAME
    #[arg(short, long)]
    local: Option<PathBuf>,

    /// Receive timeout, e.g. "5s" (default: wait forever)
    #[arg(short, long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Action {
    Get,
    Put,
}

impl From<Action> for Direction {
    fn from(action: Action) -> Self {
        match action {
            Action::Get => Direction::Download,
            Action::Put => Direction::Upload,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::with_defaults(),
    }
    .merge_cli(Some(cli.host), cli.port, cli.mode, cli.timeout);

    client::run(config, cli.action.into(), &cli.filename, cli.local)?;
    Ok(())
}
