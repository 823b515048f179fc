//! Receiving responses without blocking.

use super::message::Message;
use crate::config::Config;
use crate::socket::RecvSocket;
use crate::task::Status;
use bytes::{Buf, Bytes, BytesMut};
use std::io;
use tracing::trace;

/// The log target for receive attempts.
const LOG_TARGET: &str = "polltask::dns";

/// How many octets to read at a time from a stream socket.
const STREAM_CHUNK: usize = 1024;

//------------ Framing -------------------------------------------------------

/// How messages are delimited on a socket.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Framing {
    /// Every datagram is one message.
    Datagram,

    /// Messages are prefixed with a two octet length in network byte order.
    Stream,
}

//------------ Received ------------------------------------------------------

/// The outcome of a single receive attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Received<R> {
    /// No complete response yet.
    Pending,

    /// A complete response and its status.
    Response(R, Status),

    /// No response will ever be received.
    Failed(Status),
}

//------------ ResponseParser ------------------------------------------------

/// Receives responses from a socket.
pub trait ResponseParser {
    /// The type of response produced.
    type Response;

    /// Makes one non-blocking attempt at receiving a complete response.
    ///
    /// Partially received data is kept by the parser for the next attempt.
    fn attempt_receive<S: RecvSocket + ?Sized>(
        &mut self,
        socket: &S,
    ) -> Received<Self::Response>;
}

//------------ WireParser ----------------------------------------------------

/// A parser for DNS messages in wire format.
///
/// A datagram that does not contain a valid response and a stream frame
/// that does not contain one are reported as [`Status::MALFORMED`]. A stream
/// closed by the peer is reported as [`Status::CLOSED`], other read errors
/// as [`Status::IO_ERROR`].
///
/// The parser owns the buffer of a partially received stream frame.
/// Octets following a complete frame stay in the buffer and are discarded
/// together with the parser.
#[derive(Clone, Debug)]
pub struct WireParser {
    framing: Framing,
    recv_size: usize,
    max_reads: usize,
    buf: BytesMut,
}

impl WireParser {
    /// Creates a parser using the receive limits from `config`.
    pub fn new(framing: Framing, config: &Config) -> Self {
        WireParser {
            framing,
            recv_size: config.recv_size(),
            max_reads: config.max_reads_per_poll(),
            buf: BytesMut::new(),
        }
    }

    /// Returns the framing.
    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Returns the number of octets of an incomplete frame received so far.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    fn receive_datagram<S: RecvSocket + ?Sized>(
        &mut self,
        socket: &S,
    ) -> Received<Message> {
        self.buf.clear();
        self.buf.resize(self.recv_size, 0);
        for _ in 0..self.max_reads {
            match socket.try_recv(&mut self.buf) {
                Ok(len) => {
                    let data = Bytes::copy_from_slice(&self.buf[..len]);
                    self.buf.clear();
                    return match Message::from_octets(data) {
                        Ok(msg) => {
                            Received::Response(msg, Status::received(len))
                        }
                        Err(err) => {
                            trace!(
                                target: LOG_TARGET,
                                "malformed datagram: {}",
                                err
                            );
                            Received::Failed(Status::MALFORMED)
                        }
                    };
                }
                Err(err) => match classify(err) {
                    Some(res) => {
                        self.buf.clear();
                        return res;
                    }
                    None => continue,
                },
            }
        }
        self.buf.clear();
        Received::Pending
    }

    fn receive_stream<S: RecvSocket + ?Sized>(
        &mut self,
        socket: &S,
    ) -> Received<Message> {
        let mut reads = 0;
        loop {
            if let Some(res) = self.take_frame() {
                return res;
            }
            if reads == self.max_reads {
                return Received::Pending;
            }
            reads += 1;

            let start = self.buf.len();
            self.buf.resize(start + STREAM_CHUNK, 0);
            let res = socket.try_recv(&mut self.buf[start..]);
            match res {
                Ok(0) => {
                    self.buf.truncate(start);
                    return Received::Failed(Status::CLOSED);
                }
                Ok(len) => self.buf.truncate(start + len),
                Err(err) => {
                    self.buf.truncate(start);
                    if let Some(res) = classify(err) {
                        if res == Received::Pending {
                            trace!(
                                target: LOG_TARGET,
                                "partial frame, {} octets buffered",
                                start
                            );
                        }
                        return res;
                    }
                }
            }
        }
    }

    /// Takes a complete frame off the buffer if there is one.
    fn take_frame(&mut self) -> Option<Received<Message>> {
        if self.buf.len() < 2 {
            return None;
        }
        let len = usize::from(u16::from_be_bytes([self.buf[0], self.buf[1]]));
        if self.buf.len() < len + 2 {
            return None;
        }
        let data = Bytes::copy_from_slice(&self.buf[2..len + 2]);
        self.buf.advance(len + 2);
        Some(match Message::from_octets(data) {
            Ok(msg) => Received::Response(msg, Status::received(len)),
            Err(err) => {
                trace!(target: LOG_TARGET, "malformed frame: {}", err);
                Received::Failed(Status::MALFORMED)
            }
        })
    }
}

impl ResponseParser for WireParser {
    type Response = Message;

    fn attempt_receive<S: RecvSocket + ?Sized>(
        &mut self,
        socket: &S,
    ) -> Received<Message> {
        match self.framing {
            Framing::Datagram => self.receive_datagram(socket),
            Framing::Stream => self.receive_stream(socket),
        }
    }
}

/// Translates a read error into an outcome.
///
/// Returns `None` if the read should simply be retried.
fn classify<R>(err: io::Error) -> Option<Received<R>> {
    match err.kind() {
        io::ErrorKind::WouldBlock => Some(Received::Pending),
        io::ErrorKind::Interrupted => None,
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::NotConnected
        | io::ErrorKind::UnexpectedEof => {
            trace!(target: LOG_TARGET, "connection closed: {}", err);
            Some(Received::Failed(Status::CLOSED))
        }
        _ => {
            trace!(target: LOG_TARGET, "read error: {}", err);
            Some(Received::Failed(Status::IO_ERROR))
        }
    }
}

//============ Testing =======================================================
