use std::io;
use std::net::{SocketAddr, UdpSocket};

/// Datagram transport used by a transfer session
///
/// Every send names its destination, so the session can re-address the peer
/// after the server answers from its per-transfer port.
pub trait Socket {
    /// Send one datagram to `addr`
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;

    /// Block until one datagram arrives, returning its length and sender
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl Socket for UdpSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::local_addr(self)
    }
}

impl<S: Socket + ?Sized> Socket for &S {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        (**self).send_to(buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        (**self).recv_from(buf)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        (**self).local_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn udp_socket_loopback() {
        let a = UdpSocket::bind("127.0.0.1:0").unwrap();
        let b = UdpSocket::bind("127.0.0.1:0").unwrap();
        let b_addr = Socket::local_addr(&b).unwrap();

        Socket::send_to(&a, b"ping", b_addr).unwrap();

        let mut buf = [0u8; 16];
        let (len, from) = Socket::recv_from(&&b, &mut buf).unwrap();
        assert_eq!(&buf[..len], b"ping");
        assert_eq!(from, Socket::local_addr(&a).unwrap());
    }
}
