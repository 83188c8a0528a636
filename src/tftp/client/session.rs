use std::fmt;
use std::io::{Read, Write};
use std::net::SocketAddr;

use crate::tftp::core::{BLOCK_SIZE, MAX_PACKET_SIZE, Packet, Result, Socket, TransferError};

/// Direction of a transfer, carrying the file it reads from or writes to
pub enum Transfer<R, W> {
    /// RRQ sent; DATA is written to the sink
    Download(W),
    /// WRQ sent; the source is sent as DATA
    Upload(R),
}

impl<R, W> Transfer<R, W> {
    pub fn direction(&self) -> Direction {
        match self {
            Transfer::Download(_) => Direction::Download,
            Transfer::Upload(_) => Direction::Upload,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Download,
    Upload,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Download => "download",
            Direction::Upload => "upload",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    AwaitingFirstResponse,
    Transferring,
    Done,
    Failed,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Done | State::Failed)
    }
}

/// Outcome of a finished transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub direction: Direction,
    /// DATA packets written (download) or sent (upload)
    pub blocks: u64,
    pub bytes: u64,
}

/// One lockstep DATA/ACK exchange, started right after the request was sent
///
/// The session owns the file for its whole lifetime; it is dropped (and
/// closed) whichever way the loop ends.
pub struct Session<S, R, W> {
    socket: S,
    peer: SocketAddr,
    transfer: Transfer<R, W>,
    state: State,
    /// Download: next expected DATA block. Upload: last DATA block sent.
    block: u16,
    blocks: u64,
    bytes: u64,
    buf: Box<[u8; MAX_PACKET_SIZE]>,
}

impl<S, R, W> Session<S, R, W>
where
    S: Socket,
    R: Read,
    W: Write,
{
    /// Create a session for a request already sent to `server`
    pub fn new(socket: S, server: SocketAddr, transfer: Transfer<R, W>) -> Self {
        let block = match transfer {
            Transfer::Download(_) => 1,
            Transfer::Upload(_) => 0,
        };

        Self {
            socket,
            peer: server,
            transfer,
            state: State::AwaitingFirstResponse,
            block,
            blocks: 0,
            bytes: 0,
            buf: Box::new([0u8; MAX_PACKET_SIZE]),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Address the next packet will be sent to
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn direction(&self) -> Direction {
        self.transfer.direction()
    }

    /// Drive the transfer until it is done or fails
    pub fn run(mut self) -> Result<Summary> {
        while !self.state.is_terminal() {
            self.step()?;
        }

        if let Transfer::Download(sink) = &mut self.transfer {
            sink.flush()?;
        }

        log::debug!(
            "Transfer complete. Blocks: {}, total bytes: {}",
            self.blocks,
            self.bytes
        );

        Ok(Summary {
            direction: self.direction(),
            blocks: self.blocks,
            bytes: self.bytes,
        })
    }

    /// Receive one datagram and act on it
    ///
    /// Any error leaves the session in `Failed`.
    pub fn step(&mut self) -> Result<State> {
        match self.try_step() {
            Ok(state) => {
                self.state = state;
                Ok(state)
            }
            Err(e) => {
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    fn try_step(&mut self) -> Result<State> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        let (amt, from) = self.socket.recv_from(&mut self.buf[..])?;
        if from != self.peer {
            log::debug!("Peer moved from {} to {}", self.peer, from);
            self.peer = from;
        }

        let packet = Packet::deserialize(&self.buf[..amt])?;
        log::debug!("Received {} from {}", packet.name(), from);

        match (&mut self.transfer, packet) {
            (Transfer::Download(sink), Packet::Data { block_num, data }) => {
                if block_num != self.block {
                    log::warn!(
                        "Received unexpected block {}, expected {}",
                        block_num,
                        self.block
                    );
                }

                send(&self.socket, &Packet::Ack(block_num), self.peer)?;
                sink.write_all(&data)?;

                self.blocks += 1;
                self.bytes += data.len() as u64;
                self.block = block_num.wrapping_add(1);

                if data.len() < BLOCK_SIZE {
                    Ok(State::Done)
                } else {
                    Ok(State::Transferring)
                }
            }
            (Transfer::Upload(source), Packet::Ack(ack_block)) => {
                if ack_block != self.block {
                    log::warn!(
                        "Received ACK for block {}, last sent {}",
                        ack_block,
                        self.block
                    );
                }

                // An empty chunk still goes out: it terminates files whose
                // size is a multiple of the block size, and empty files.
                let data = read_block(source)?;
                let last = data.len() < BLOCK_SIZE;
                let block_num = ack_block.wrapping_add(1);

                self.bytes += data.len() as u64;
                send(&self.socket, &Packet::Data { block_num, data }, self.peer)?;

                self.blocks += 1;
                self.block = block_num;

                if last {
                    Ok(State::Done)
                } else {
                    Ok(State::Transferring)
                }
            }
            (_, Packet::Error { code, msg }) => {
                if !msg.is_empty() {
                    log::debug!("Server error {}: {}", code.as_u16(), msg);
                }
                Err(TransferError::Protocol { code, message: msg })
            }
            (transfer, packet) => {
                let direction = transfer.direction();
                log::warn!("Received unexpected {} packet during {}", packet.name(), direction);
                Err(TransferError::UnexpectedPacket {
                    opcode: packet.name(),
                    direction: direction.as_str(),
                })
            }
        }
    }
}

fn send<S: Socket>(socket: &S, packet: &Packet, to: SocketAddr) -> Result<()> {
    socket.send_to(&packet.serialize()?, to)?;
    log::debug!("Sent {} to {}", packet.name(), to);
    Ok(())
}

/// Read up to one block, stopping early only at end of file
fn read_block<R: Read>(source: &mut R) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(BLOCK_SIZE);
    source.take(BLOCK_SIZE as u64).read_to_end(&mut data)?;
    Ok(data)
}
