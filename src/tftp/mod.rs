//! TFTP (Trivial File Transfer Protocol) client
//!
//! Implements the lockstep get/put exchange of
//! [RFC 1350](https://www.rfc-editor.org/rfc/rfc1350) TFTP Protocol version 2.
//! Lost packets are not retransmitted and no options are negotiated.
//!
//! ## Module Structure
//!
//! ```text
//! tftp/
//! ├── core/           # Core protocol implementation
//! │   ├── packet      # Packet serialization/deserialization
//! │   ├── socket      # Socket abstraction layer
//! │   └── error       # Transfer errors
//! │
//! └── client/         # TFTP client
//!     ├── client      # Request setup
//!     ├── session     # Transfer state machine
//!     └── config      # Client configuration
//! ```
//!
//! ## Usage Examples
//!
//! ### Download a file
//!
//! ```rust,no_run
//! use tftpc::tftp::client::{Client, ClientConfig};
//! use tftpc::tftp::core::TransferMode;
//! use std::path::Path;
//!
//! let config = ClientConfig::new("192.168.1.100", 69).with_mode(TransferMode::Octet);
//! let client = Client::new(config).unwrap();
//! client.get("pxelinux.0", Path::new("pxelinux.0")).unwrap();
//! ```

// Submodules
pub mod client;
pub mod core;

// Re-export commonly used types for convenience
pub use self::client::{Client, ClientConfig, Direction};
pub use self::core::{Packet, TransferError};
