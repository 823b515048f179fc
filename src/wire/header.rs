//! The header of a DNS message and the small integer types it uses.
//!
//! Each DNS message starts with a twelve octet long header section. The
//! first four octets hold the message ID and the flags and are represented
//! by [`Header`]. The remaining eight octets are the four section counts,
//! represented by [`HeaderCounts`]. The format is defined in section 4.1.1
//! of [RFC 1035].
//!
//! [RFC 1035]: https://tools.ietf.org/html/rfc1035

use super::ParseError;
use bytes::{BufMut, BytesMut};
use core::fmt;
use octseq::parse::Parser;

//------------ Header --------------------------------------------------

/// The first part of the header of a DNS message.
///
/// The four octets are kept in wire representation:
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      ID                       |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |QR|   Opcode  |AA|TC|RD|RA|Z |AD|CD|   RCODE   |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Header {
    /// The actual header in its wire format representation.
    inner: [u8; 4],
}

impl Header {
    /// Creates a new header with all fields zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a header.
    pub fn parse(parser: &mut Parser<'_, [u8]>) -> Result<Self, ParseError> {
        let mut inner = [0u8; 4];
        parser.parse_buf(&mut inner)?;
        Ok(Header { inner })
    }

    /// Appends the wire format to `target`.
    pub fn compose(&self, target: &mut BytesMut) {
        target.put_slice(&self.inner)
    }

    /// Returns the value of the ID field.
    pub fn id(self) -> u16 {
        u16::from_be_bytes([self.inner[0], self.inner[1]])
    }

    /// Sets the value of the ID field.
    pub fn set_id(&mut self, value: u16) {
        self.inner[..2].copy_from_slice(&value.to_be_bytes())
    }

    /// Returns whether the QR bit is set, i.e., the message is a response.
    pub fn qr(self) -> bool {
        self.get_bit(2, 7)
    }

    /// Sets the value of the QR bit.
    pub fn set_qr(&mut self, set: bool) {
        self.set_bit(2, 7, set)
    }

    /// Returns the value of the Opcode field.
    pub fn opcode(self) -> u8 {
        (self.inner[2] >> 3) & 0x0F
    }

    /// Returns whether the AA bit is set.
    pub fn aa(self) -> bool {
        self.get_bit(2, 2)
    }

    /// Returns whether the TC bit is set.
    ///
    /// A truncated datagram response is complete as a frame. Whether to
    /// retry over a stream is up to the owner.
    pub fn tc(self) -> bool {
        self.get_bit(2, 1)
    }

    /// Sets the value of the TC bit.
    pub fn set_tc(&mut self, set: bool) {
        self.set_bit(2, 1, set)
    }

    /// Returns whether the RD bit is set.
    pub fn rd(self) -> bool {
        self.get_bit(2, 0)
    }

    /// Sets the value of the RD bit.
    pub fn set_rd(&mut self, set: bool) {
        self.set_bit(2, 0, set)
    }

    /// Returns whether the RA bit is set.
    pub fn ra(self) -> bool {
        self.get_bit(3, 7)
    }

    /// Returns the value of the RCODE field.
    pub fn rcode(self) -> Rcode {
        Rcode(self.inner[3] & 0x0F)
    }

    /// Sets the value of the RCODE field.
    pub fn set_rcode(&mut self, rcode: Rcode) {
        self.inner[3] = self.inner[3] & 0xF0 | (rcode.0 & 0x0F);
    }

    fn get_bit(self, offset: usize, bit: usize) -> bool {
        self.inner[offset] & (1 << bit) != 0
    }

    fn set_bit(&mut self, offset: usize, bit: usize, set: bool) {
        if set {
            self.inner[offset] |= 1 << bit
        } else {
            self.inner[offset] &= !(1 << bit)
        }
    }
}

//------------ HeaderCounts -------------------------------------------------

/// The section count part of the header section of a DNS message.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HeaderCounts {
    /// The number of questions.
    pub qdcount: u16,

    /// The number of records in the answer section.
    pub ancount: u16,

    /// The number of records in the authority section.
    pub nscount: u16,

    /// The number of records in the additional section.
    pub arcount: u16,
}

impl HeaderCounts {
    /// Parses the section counts.
    pub fn parse(parser: &mut Parser<'_, [u8]>) -> Result<Self, ParseError> {
        Ok(HeaderCounts {
            qdcount: parser.parse_u16_be()?,
            ancount: parser.parse_u16_be()?,
            nscount: parser.parse_u16_be()?,
            arcount: parser.parse_u16_be()?,
        })
    }

    /// Appends the wire format to `target`.
    pub fn compose(&self, target: &mut BytesMut) {
        target.put_u16(self.qdcount);
        target.put_u16(self.ancount);
        target.put_u16(self.nscount);
        target.put_u16(self.arcount);
    }
}

//------------ Rcode ----------------------------------------------------------

/// The response code of a message.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Rcode(u8);

impl Rcode {
    /// No error condition.
    pub const NOERROR: Rcode = Rcode(0);

    /// The server was unable to interpret the query.
    pub const FORMERR: Rcode = Rcode(1);

    /// The server failed to process the query.
    pub const SERVFAIL: Rcode = Rcode(2);

    /// The queried name does not exist.
    pub const NXDOMAIN: Rcode = Rcode(3);

    /// The server does not support the kind of query.
    pub const NOTIMP: Rcode = Rcode(4);

    /// The server refused to answer.
    pub const REFUSED: Rcode = Rcode(5);

    /// Creates a response code from its four bit value.
    pub const fn from_int(value: u8) -> Self {
        Rcode(value & 0x0F)
    }

    /// Returns the integer value.
    pub const fn to_int(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Rcode::NOERROR => f.write_str("NOERROR"),
            Rcode::FORMERR => f.write_str("FORMERR"),
            Rcode::SERVFAIL => f.write_str("SERVFAIL"),
            Rcode::NXDOMAIN => f.write_str("NXDOMAIN"),
            Rcode::NOTIMP => f.write_str("NOTIMP"),
            Rcode::REFUSED => f.write_str("REFUSED"),
            Rcode(value) => write!(f, "RCODE{}", value),
        }
    }
}

//------------ Rtype ---------------------------------------------------------

/// Resource record types.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Rtype(u16);

impl Rtype {
    /// A host address.
    pub const A: Rtype = Rtype(1);

    /// An authoritative name server.
    pub const NS: Rtype = Rtype(2);

    /// The canonical name for an alias.
    pub const CNAME: Rtype = Rtype(5);

    /// Marks the start of a zone of authority.
    pub const SOA: Rtype = Rtype(6);

    /// A domain name pointer.
    pub const PTR: Rtype = Rtype(12);

    /// Mail exchange.
    pub const MX: Rtype = Rtype(15);

    /// Text strings.
    pub const TXT: Rtype = Rtype(16);

    /// IPv6 address.
    pub const AAAA: Rtype = Rtype(28);

    /// Server selection.
    pub const SRV: Rtype = Rtype(33);

    /// A request for all records.
    pub const ANY: Rtype = Rtype(255);

    /// Creates a record type from its integer value.
    pub const fn from_int(value: u16) -> Self {
        Rtype(value)
    }

    /// Returns the integer value.
    pub const fn to_int(self) -> u16 {
        self.0
    }

    /// Returns the mnemonic if the type has one.
    pub fn to_mnemonic(self) -> Option<&'static str> {
        Some(match self {
            Rtype::A => "A",
            Rtype::NS => "NS",
            Rtype::CNAME => "CNAME",
            Rtype::SOA => "SOA",
            Rtype::PTR => "PTR",
            Rtype::MX => "MX",
            Rtype::TXT => "TXT",
            Rtype::AAAA => "AAAA",
            Rtype::SRV => "SRV",
            Rtype::ANY => "ANY",
            _ => return None,
        })
    }
}

impl fmt::Display for Rtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_mnemonic() {
            Some(mnemonic) => f.write_str(mnemonic),
            None => write!(f, "TYPE{}", self.0),
        }
    }
}

//------------ Class ---------------------------------------------------------

/// DNS classes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Class(u16);

impl Class {
    /// The Internet class.
    pub const IN: Class = Class(1);

    /// Creates a class from its integer value.
    pub const fn from_int(value: u16) -> Self {
        Class(value)
    }

    /// Returns the integer value.
    pub const fn to_int(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Class::IN => f.write_str("IN"),
            Class(value) => write!(f, "CLASS{}", value),
        }
    }
}

//============ Testing =======================================================
