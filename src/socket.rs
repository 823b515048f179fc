//! The sockets tasks read from and the owners controlling them.
//!
//! A task never opens or closes a socket. It borrows the socket of its
//! [`TaskOwner`] for the duration of a single poll and only ever performs
//! non-blocking reads on it through [`RecvSocket`].

use std::io;
use std::io::Read;
use std::sync::Arc;

//------------ RecvSocket -----------------------------------------------------

/// A socket that can be read without blocking.
pub trait RecvSocket {
    /// Attempts to receive data into `buf`.
    ///
    /// Returns the number of octets received. If no data is available, an
    /// error of kind [`io::ErrorKind::WouldBlock`] is returned. For stream
    /// sockets, zero octets means the peer has closed the connection.
    ///
    /// This must never block.
    fn try_recv(&self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: RecvSocket + ?Sized> RecvSocket for &T {
    fn try_recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).try_recv(buf)
    }
}

impl<T: RecvSocket + ?Sized> RecvSocket for Box<T> {
    fn try_recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).try_recv(buf)
    }
}

impl<T: RecvSocket + ?Sized> RecvSocket for Arc<T> {
    fn try_recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).try_recv(buf)
    }
}

/// The socket must have been put into non-blocking mode by its owner.
impl RecvSocket for std::net::UdpSocket {
    fn try_recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.recv(buf)
    }
}

/// The socket must have been put into non-blocking mode by its owner.
impl RecvSocket for std::net::TcpStream {
    fn try_recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut stream = self;
        stream.read(buf)
    }
}

#[cfg(feature = "net")]
impl RecvSocket for tokio::net::UdpSocket {
    fn try_recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        tokio::net::UdpSocket::try_recv(self, buf)
    }
}

#[cfg(feature = "net")]
impl RecvSocket for tokio::net::TcpStream {
    fn try_recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.try_read(buf)
    }
}

//------------ TaskOwner ------------------------------------------------------

/// The object creating tasks and controlling the lifetime of their socket.
///
/// Tasks only keep a weak reference to their owner. Once the owner is
/// gone, its tasks fail on their next poll.
pub trait TaskOwner {
    /// The type of socket handed to tasks.
    type Socket: RecvSocket + ?Sized;

    /// Returns the socket tasks of this owner read from.
    fn socket(&self) -> &Self::Socket;
}

impl<T: TaskOwner + ?Sized> TaskOwner for Box<T> {
    type Socket = T::Socket;

    fn socket(&self) -> &Self::Socket {
        (**self).socket()
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::net::UdpSocket;

    #[test]
    fn std_udp_does_not_block() {
        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        sock.set_nonblocking(true).unwrap();
        let mut buf = [0u8; 16];
        let err = RecvSocket::try_recv(&sock, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn std_udp_receives() {
        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        sock.set_nonblocking(true).unwrap();
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        sock.connect(peer.local_addr().unwrap()).unwrap();
        peer.send_to(b"hello", sock.local_addr().unwrap()).unwrap();

        let mut buf = [0u8; 16];
        let mut len = None;
        for _ in 0..1000 {
            match RecvSocket::try_recv(&sock, &mut buf) {
                Ok(n) => {
                    len = Some(n);
                    break;
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::sleep(std::time::Duration::from_millis(1))
                }
                Err(err) => panic!("{}", err),
            }
        }
        assert_eq!(len, Some(5));
        assert_eq!(&buf[..5], b"hello");
    }
}
