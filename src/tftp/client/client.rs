use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::net::{SocketAddr, UdpSocket};
use std::path::Path;

use anyhow::Context;

use super::config::ClientConfig;
use super::session::{Session, Summary, Transfer};
use crate::tftp::core::{Packet, Socket};

/// TFTP client
///
/// Supports file upload (PUT) and download (GET) operations
///
/// # Example
///
/// ```rust,no_run
/// use tftpc::tftp::client::{Client, ClientConfig};
/// use std::path::Path;
///
/// let config = ClientConfig::new("192.168.1.100", 69);
/// let client = Client::new(config).unwrap();
///
/// // Download file
/// client.get("remote.txt", Path::new("local.txt")).unwrap();
///
/// // Upload file
/// client.put(Path::new("local.txt"), "remote.txt").unwrap();
/// ```
pub struct Client {
    config: ClientConfig,
    server_addr: SocketAddr,
}

impl Client {
    /// Create a new TFTP client, resolving the server address
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let server_addr = config.server_addr()?;
        Ok(Self {
            config,
            server_addr,
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Download a file from the server (RRQ - Read Request)
    ///
    /// # Arguments
    ///
    /// * `remote_file` - File name on the server
    /// * `local_file` - Local save path, created or truncated
    pub fn get(&self, remote_file: &str, local_file: &Path) -> anyhow::Result<Summary> {
        log::info!(
            "Downloading {} from {} to {}",
            remote_file,
            self.server_addr,
            local_file.display()
        );

        let socket = self.bind()?;
        let file = File::create(local_file)
            .with_context(|| format!("Failed to create {}", local_file.display()))?;

        let rrq = Packet::Rrq {
            filename: remote_file.to_string(),
            mode: self.config.mode,
        };
        let sink = Transfer::<io::Empty, _>::Download(BufWriter::new(file));
        let summary = self.transfer(&socket, &rrq, sink)?;

        log::info!(
            "Download complete: {} ({} bytes)",
            local_file.display(),
            summary.bytes
        );
        Ok(summary)
    }

    /// Upload a file to the server (WRQ - Write Request)
    ///
    /// # Arguments
    ///
    /// * `local_file` - Local file path
    /// * `remote_file` - File name on the server
    pub fn put(&self, local_file: &Path, remote_file: &str) -> anyhow::Result<Summary> {
        log::info!(
            "Uploading {} to {} as {}",
            local_file.display(),
            self.server_addr,
            remote_file
        );

        let socket = self.bind()?;
        let file = File::open(local_file)
            .with_context(|| format!("Failed to open {}", local_file.display()))?;

        let wrq = Packet::Wrq {
            filename: remote_file.to_string(),
            mode: self.config.mode,
        };
        let source = Transfer::<_, io::Sink>::Upload(file);
        let summary = self.transfer(&socket, &wrq, source)?;

        log::info!("Upload complete: {} ({} bytes)", remote_file, summary.bytes);
        Ok(summary)
    }

    /// Send the request, then hand the socket and file to a session
    fn transfer<S, R, W>(
        &self,
        socket: S,
        request: &Packet,
        transfer: Transfer<R, W>,
    ) -> anyhow::Result<Summary>
    where
        S: Socket,
        R: Read,
        W: Write,
    {
        socket.send_to(&request.serialize()?, self.server_addr)?;
        log::debug!("Sent {} to {}", request.name(), self.server_addr);

        Ok(Session::new(socket, self.server_addr, transfer).run()?)
    }

    /// Bind an ephemeral socket in the server's address family
    fn bind(&self) -> anyhow::Result<UdpSocket> {
        let local = match self.server_addr {
            SocketAddr::V4(_) => "0.0.0.0:0",
            SocketAddr::V6(_) => "[::]:0",
        };
        let socket = UdpSocket::bind(local).with_context(|| format!("Failed to bind {}", local))?;
        socket.set_read_timeout(self.config.timeout)?;

        log::debug!("Bound to {}", socket.local_addr()?);
        Ok(socket)
    }
}
