use std::fs;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::tftp::core::TransferMode;

/// Well-known TFTP port
pub const DEFAULT_PORT: u16 = 69;

/// TFTP client configuration
///
/// Can be loaded from a TOML file and overridden from the command line:
///
/// ```toml
/// host = "192.168.1.100"
/// port = 69
/// mode = "octet"
/// timeout = "5s"
/// ```
///
/// # Example
///
/// ```rust
/// use tftpc::tftp::client::ClientConfig;
///
/// let config = ClientConfig::new("192.168.1.100", 69);
/// assert_eq!(config.port, 69);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Server host name or IP address
    pub host: String,
    /// Server port number
    pub port: u16,
    /// Transfer mode named in the request
    pub mode: TransferMode,
    /// Receive timeout; `None` blocks forever
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a new client configuration
    ///
    /// # Arguments
    ///
    /// * `host` - Server host name or IP address
    /// * `port` - Server port number (usually 69)
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            mode: TransferMode::default(),
            timeout: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override file values with whatever was given on the command line
    pub fn merge_cli(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        mode: Option<TransferMode>,
        timeout: Option<Duration>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(mode) = mode {
            self.mode = mode;
        }
        if timeout.is_some() {
            self.timeout = timeout;
        }
        self
    }

    /// Set transfer mode
    pub fn with_mode(mut self, mode: TransferMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set receive timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve host and port to the address the request is sent to
    pub fn server_addr(&self) -> Result<SocketAddr> {
        if self.host.is_empty() {
            anyhow::bail!("Server host not specified");
        }
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .with_context(|| format!("Failed to resolve {}:{}", self.host, self.port))?
            .next()
            .ok_or_else(|| anyhow::anyhow!("No address found for {}", self.host))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("", DEFAULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::with_defaults();
        assert_eq!(config.port, 69);
        assert_eq!(config.mode, TransferMode::Netascii);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn parse_full_toml() {
        let config = ClientConfig::from_toml(
            r#"
            host = "10.0.0.1"
            port = 6969
            mode = "octet"
            timeout = "2s 500ms"
            "#,
        )
        .unwrap();
        assert_eq!(config.host, "10.0.0.1");
        assert_eq!(config.port, 6969);
        assert_eq!(config.mode, TransferMode::Octet);
        assert_eq!(config.timeout, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn parse_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml(r#"host = "tftp.local""#).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.mode, TransferMode::Netascii);
    }

    #[test]
    fn rejects_unknown_keys_and_modes() {
        assert!(ClientConfig::from_toml("blksize = 1024").is_err());
        assert!(ClientConfig::from_toml(r#"mode = "mail""#).is_err());
    }

    #[test]
    fn cli_overrides_file() {
        let config = ClientConfig::new("file-host", 1069)
            .with_timeout(Duration::from_secs(3))
            .merge_cli(Some("cli-host".to_string()), None, Some(TransferMode::Octet), None);
        assert_eq!(config.host, "cli-host");
        assert_eq!(config.port, 1069);
        assert_eq!(config.mode, TransferMode::Octet);
        assert_eq!(config.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn resolves_server_addr() {
        let config = ClientConfig::new("127.0.0.1", 6969);
        assert_eq!(
            config.server_addr().unwrap(),
            "127.0.0.1:6969".parse::<SocketAddr>().unwrap()
        );
        assert!(ClientConfig::with_defaults().server_addr().is_err());
    }
}
