use std::io;

use thiserror::Error;

use super::packet::ErrorCode;

/// Errors that end a transfer
///
/// Every variant is terminal: nothing is retried.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Datagram too short, payload too long, or opcode not one the client accepts
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// The peer sent an ERROR packet
    #[error("{}", .code.description())]
    Protocol { code: ErrorCode, message: String },

    /// A well formed packet that makes no sense for the current direction
    #[error("unexpected {opcode} packet during {direction}")]
    UnexpectedPacket {
        opcode: &'static str,
        direction: &'static str,
    },

    /// A packet that cannot be put on the wire
    #[error("invalid packet: {0}")]
    InvalidPacket(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransferError {
    /// Error code carried by a peer ERROR packet, if this is one
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Protocol { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransferError>;
