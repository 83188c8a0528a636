//! TFTP core protocol implementation
//!
//! This module contains the core components of the TFTP protocol:
//! - `packet`: Packet serialization and deserialization
//! - `socket`: Datagram transport abstraction
//! - `error`: Errors that terminate a transfer

mod error;
mod packet;
mod socket;

// Public core types
pub use error::{Result, TransferError};
pub use packet::{BLOCK_SIZE, ErrorCode, HEADER_SIZE, MAX_PACKET_SIZE, Packet, TransferMode};
pub use socket::Socket;
