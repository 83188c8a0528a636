use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use super::error::{Result, TransferError};

/// Size of a full DATA payload; anything shorter ends the transfer
pub const BLOCK_SIZE: usize = 512;

/// Opcode + block number
pub const HEADER_SIZE: usize = 4;

/// Largest datagram the client ever has to receive
pub const MAX_PACKET_SIZE: usize = HEADER_SIZE + BLOCK_SIZE;

const OPCODE_RRQ: u16 = 1;
const OPCODE_WRQ: u16 = 2;
const OPCODE_DATA: u16 = 3;
const OPCODE_ACK: u16 = 4;
const OPCODE_ERROR: u16 = 5;

/// TFTP packet
///
/// Wire layout (all integers big-endian):
///
/// ```text
/// RRQ/WRQ | 01/02 | filename | 0 | mode | 0 |
/// DATA    | 03    | block#   | payload (0..=512) |
/// ACK     | 04    | block#   |
/// ERROR   | 05    | code     | message | 0 |
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Rrq { filename: String, mode: TransferMode },
    Wrq { filename: String, mode: TransferMode },
    Data { block_num: u16, data: Vec<u8> },
    Ack(u16),
    Error { code: ErrorCode, msg: String },
}

impl Packet {
    /// Serialize the packet into a datagram
    pub fn serialize(&self) -> Result<Vec<u8>> {
        match self {
            Packet::Rrq { filename, mode } => serialize_request(OPCODE_RRQ, filename, *mode),
            Packet::Wrq { filename, mode } => serialize_request(OPCODE_WRQ, filename, *mode),
            Packet::Data { block_num, data } => {
                if data.len() > BLOCK_SIZE {
                    return Err(TransferError::InvalidPacket(format!(
                        "DATA payload of {} bytes exceeds {}",
                        data.len(),
                        BLOCK_SIZE
                    )));
                }
                let mut buf = Vec::with_capacity(HEADER_SIZE + data.len());
                buf.extend_from_slice(&OPCODE_DATA.to_be_bytes());
                buf.extend_from_slice(&block_num.to_be_bytes());
                buf.extend_from_slice(data);
                Ok(buf)
            }
            Packet::Ack(block_num) => {
                let mut buf = Vec::with_capacity(HEADER_SIZE);
                buf.extend_from_slice(&OPCODE_ACK.to_be_bytes());
                buf.extend_from_slice(&block_num.to_be_bytes());
                Ok(buf)
            }
            Packet::Error { code, msg } => {
                check_no_nul("error message", msg)?;
                let mut buf = Vec::with_capacity(HEADER_SIZE + msg.len() + 1);
                buf.extend_from_slice(&OPCODE_ERROR.to_be_bytes());
                buf.extend_from_slice(&code.as_u16().to_be_bytes());
                buf.extend_from_slice(msg.as_bytes());
                buf.push(0);
                Ok(buf)
            }
        }
    }

    /// Parse a datagram received from the server
    ///
    /// Only DATA, ACK and ERROR are accepted; the client never receives
    /// requests, so any other opcode is malformed.
    pub fn deserialize(buf: &[u8]) -> Result<Packet> {
        if buf.len() > MAX_PACKET_SIZE {
            return Err(TransferError::MalformedPacket(format!(
                "datagram of {} bytes exceeds {}",
                buf.len(),
                MAX_PACKET_SIZE
            )));
        }
        let opcode = read_u16(buf, 0)?;

        match opcode {
            OPCODE_DATA => Ok(Packet::Data {
                block_num: read_u16(buf, 2)?,
                data: buf[HEADER_SIZE..].to_vec(),
            }),
            OPCODE_ACK => Ok(Packet::Ack(read_u16(buf, 2)?)),
            OPCODE_ERROR => {
                let code = ErrorCode::from(read_u16(buf, 2)?);
                let rest = &buf[HEADER_SIZE..];
                let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
                Ok(Packet::Error {
                    code,
                    msg: String::from_utf8_lossy(&rest[..end]).into_owned(),
                })
            }
            other => Err(TransferError::MalformedPacket(format!(
                "unrecognized opcode {other}"
            ))),
        }
    }

    /// Short name of the packet type, as used in RFC 1350
    pub fn name(&self) -> &'static str {
        match self {
            Packet::Rrq { .. } => "RRQ",
            Packet::Wrq { .. } => "WRQ",
            Packet::Data { .. } => "DATA",
            Packet::Ack(_) => "ACK",
            Packet::Error { .. } => "ERROR",
        }
    }
}

fn serialize_request(opcode: u16, filename: &str, mode: TransferMode) -> Result<Vec<u8>> {
    check_no_nul("filename", filename)?;
    let mode = mode.as_str();
    let mut buf = Vec::with_capacity(2 + filename.len() + mode.len() + 2);
    buf.extend_from_slice(&opcode.to_be_bytes());
    buf.extend_from_slice(filename.as_bytes());
    buf.push(0);
    buf.extend_from_slice(mode.as_bytes());
    buf.push(0);
    Ok(buf)
}

fn check_no_nul(what: &str, value: &str) -> Result<()> {
    if value.as_bytes().contains(&0) {
        return Err(TransferError::InvalidPacket(format!(
            "{what} contains a NUL byte"
        )));
    }
    Ok(())
}

fn read_u16(buf: &[u8], offset: usize) -> Result<u16> {
    buf.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| {
            TransferError::MalformedPacket(format!("datagram too short ({} bytes)", buf.len()))
        })
}

/// Transfer mode named in the request
///
/// Both modes are passed through untouched; no netascii translation is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    #[default]
    Netascii,
    Octet,
}

impl TransferMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TransferMode::Netascii => "netascii",
            TransferMode::Octet => "octet",
        }
    }
}

impl FromStr for TransferMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "netascii" => Ok(TransferMode::Netascii),
            "octet" => Ok(TransferMode::Octet),
            _ => Err(anyhow::anyhow!("Invalid transfer mode: {}", s)),
        }
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RFC 1350 error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotDefined,
    FileNotFound,
    AccessViolation,
    DiskFull,
    IllegalOperation,
    UnknownTransferId,
    FileExists,
    NoSuchUser,
    /// Anything outside 0..=7
    Unknown(u16),
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        match self {
            ErrorCode::NotDefined => 0,
            ErrorCode::FileNotFound => 1,
            ErrorCode::AccessViolation => 2,
            ErrorCode::DiskFull => 3,
            ErrorCode::IllegalOperation => 4,
            ErrorCode::UnknownTransferId => 5,
            ErrorCode::FileExists => 6,
            ErrorCode::NoSuchUser => 7,
            ErrorCode::Unknown(code) => code,
        }
    }

    /// Human readable message shown to the user
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::NotDefined => "Not defined, see error message (if any).",
            ErrorCode::FileNotFound => "File not found.",
            ErrorCode::AccessViolation => "Access violation.",
            ErrorCode::DiskFull => "Disk full or allocation exceeded.",
            ErrorCode::IllegalOperation => "Illegal TFTP operation.",
            ErrorCode::UnknownTransferId => "Unknown transfer ID.",
            ErrorCode::FileExists => "File already exists.",
            ErrorCode::NoSuchUser => "No such user.",
            ErrorCode::Unknown(_) => "Unknown error.",
        }
    }
}

impl From<u16> for ErrorCode {
    fn from(code: u16) -> Self {
        match code {
            0 => ErrorCode::NotDefined,
            1 => ErrorCode::FileNotFound,
            2 => ErrorCode::AccessViolation,
            3 => ErrorCode::DiskFull,
            4 => ErrorCode::IllegalOperation,
            5 => ErrorCode::UnknownTransferId,
            6 => ErrorCode::FileExists,
            7 => ErrorCode::NoSuchUser,
            other => ErrorCode::Unknown(other),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_rrq() {
        let packet = Packet::Rrq {
            filename: "boot.img".to_string(),
            mode: TransferMode::Netascii,
        };
        assert_eq!(packet.serialize().unwrap(), b"\x00\x01boot.img\x00netascii\x00");
    }

    #[test]
    fn serialize_wrq_octet() {
        let packet = Packet::Wrq {
            filename: "a".to_string(),
            mode: TransferMode::Octet,
        };
        assert_eq!(packet.serialize().unwrap(), b"\x00\x02a\x00octet\x00");
    }

    #[test]
    fn serialize_ack_is_big_endian() {
        assert_eq!(Packet::Ack(0x0102).serialize().unwrap(), vec![0, 4, 1, 2]);
    }

    #[test]
    fn serialize_data_is_not_padded() {
        let packet = Packet::Data {
            block_num: 7,
            data: b"hi".to_vec(),
        };
        assert_eq!(packet.serialize().unwrap(), vec![0, 3, 0, 7, b'h', b'i']);

        let empty = Packet::Data {
            block_num: 2,
            data: Vec::new(),
        };
        assert_eq!(empty.serialize().unwrap(), vec![0, 3, 0, 2]);
    }

    #[test]
    fn serialize_rejects_oversized_data() {
        let packet = Packet::Data {
            block_num: 1,
            data: vec![0; BLOCK_SIZE + 1],
        };
        assert!(matches!(
            packet.serialize(),
            Err(TransferError::InvalidPacket(_))
        ));
    }

    #[test]
    fn serialize_rejects_nul_in_filename() {
        let packet = Packet::Rrq {
            filename: "a\0b".to_string(),
            mode: TransferMode::Octet,
        };
        assert!(packet.serialize().is_err());
    }

    #[test]
    fn deserialize_data() {
        let mut buf = vec![0, 3, 0, 1];
        buf.extend_from_slice(&[0xAA; BLOCK_SIZE]);
        match Packet::deserialize(&buf).unwrap() {
            Packet::Data { block_num, data } => {
                assert_eq!(block_num, 1);
                assert_eq!(data.len(), BLOCK_SIZE);
            }
            other => panic!("expected DATA, got {:?}", other),
        }
    }

    #[test]
    fn deserialize_empty_data() {
        assert_eq!(
            Packet::deserialize(&[0, 3, 0, 9]).unwrap(),
            Packet::Data {
                block_num: 9,
                data: Vec::new()
            }
        );
    }

    #[test]
    fn deserialize_ack() {
        assert_eq!(Packet::deserialize(&[0, 4, 0xFF, 0xFE]).unwrap(), Packet::Ack(65534));
    }

    #[test]
    fn deserialize_error_with_message() {
        let packet = Packet::deserialize(b"\x00\x05\x00\x01no such file\x00").unwrap();
        assert_eq!(
            packet,
            Packet::Error {
                code: ErrorCode::FileNotFound,
                msg: "no such file".to_string()
            }
        );
    }

    #[test]
    fn deserialize_error_without_terminator() {
        let packet = Packet::deserialize(b"\x00\x05\x00\x02denied").unwrap();
        assert_eq!(
            packet,
            Packet::Error {
                code: ErrorCode::AccessViolation,
                msg: "denied".to_string()
            }
        );
    }

    #[test]
    fn deserialize_rejects_short_datagrams() {
        for buf in [&[][..], &[0][..], &[0, 3, 0][..], &[0, 4][..], &[0, 5, 1][..]] {
            assert!(matches!(
                Packet::deserialize(buf),
                Err(TransferError::MalformedPacket(_))
            ));
        }
    }

    #[test]
    fn deserialize_rejects_unknown_and_request_opcodes() {
        for opcode in [0u8, 1, 2, 6, 99] {
            let buf = [0, opcode, 0, 0];
            assert!(matches!(
                Packet::deserialize(&buf),
                Err(TransferError::MalformedPacket(_))
            ));
        }
    }

    #[test]
    fn deserialize_rejects_oversized_datagram() {
        let buf = vec![0u8; MAX_PACKET_SIZE + 1];
        assert!(Packet::deserialize(&buf).is_err());
    }

    #[test]
    fn error_catalog() {
        assert_eq!(ErrorCode::from(0).description(), "Not defined, see error message (if any).");
        assert_eq!(ErrorCode::from(1).description(), "File not found.");
        assert_eq!(ErrorCode::from(3).description(), "Disk full or allocation exceeded.");
        assert_eq!(ErrorCode::from(7).description(), "No such user.");
        assert_eq!(ErrorCode::from(42), ErrorCode::Unknown(42));
        assert_eq!(ErrorCode::from(42).description(), "Unknown error.");
        assert_eq!(ErrorCode::from(42).as_u16(), 42);
    }

    #[test]
    fn transfer_mode_parsing() {
        assert_eq!("octet".parse::<TransferMode>().unwrap(), TransferMode::Octet);
        assert_eq!("NETASCII".parse::<TransferMode>().unwrap(), TransferMode::Netascii);
        assert!("mail".parse::<TransferMode>().is_err());
        assert_eq!(TransferMode::default(), TransferMode::Netascii);
    }
}
