//! Validated DNS response messages.

use super::header::{Class, Header, HeaderCounts, Rtype};
use super::name::Name;
use super::{FormError, ParseError};
use bytes::Bytes;
use core::fmt;
use octseq::parse::Parser;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

//------------ Question ------------------------------------------------------

/// A question in a DNS message.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    qname: Name,
    qtype: Rtype,
    qclass: Class,
}

impl Question {
    /// Creates a new question.
    pub fn new(qname: Name, qtype: Rtype, qclass: Class) -> Self {
        Question {
            qname,
            qtype,
            qclass,
        }
    }

    /// Parses a question.
    pub fn parse(parser: &mut Parser<'_, [u8]>) -> Result<Self, ParseError> {
        Ok(Question {
            qname: Name::parse(parser)?,
            qtype: Rtype::from_int(parser.parse_u16_be()?),
            qclass: Class::from_int(parser.parse_u16_be()?),
        })
    }

    /// Returns the name asked for.
    pub fn qname(&self) -> &Name {
        &self.qname
    }

    /// Returns the record type asked for.
    pub fn qtype(&self) -> Rtype {
        self.qtype
    }

    /// Returns the class asked for.
    pub fn qclass(&self) -> Class {
        self.qclass
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.qname, self.qclass, self.qtype)
    }
}

//------------ Section -------------------------------------------------------

/// The record sections of a message.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Section {
    /// The answer section.
    Answer,

    /// The authority section.
    Authority,

    /// The additional section.
    Additional,
}

//------------ Record --------------------------------------------------------

/// A resource record with its data left in wire format.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    section: Section,
    owner: Name,
    rtype: Rtype,
    class: Class,
    ttl: u32,
    data: Bytes,
}

impl Record {
    /// Parses a record from `parser` which must cover all of `octets`.
    fn parse(
        parser: &mut Parser<'_, [u8]>,
        octets: &Bytes,
        section: Section,
    ) -> Result<Self, ParseError> {
        let owner = Name::parse(parser)?;
        let rtype = Rtype::from_int(parser.parse_u16_be()?);
        let class = Class::from_int(parser.parse_u16_be()?);
        let ttl = parser.parse_u32_be()?;
        let rdlen = usize::from(parser.parse_u16_be()?);
        let start = parser.pos();
        parser.advance(rdlen)?;
        Ok(Record {
            section,
            owner,
            rtype,
            class,
            ttl,
            data: octets.slice(start..start + rdlen),
        })
    }

    /// Returns the section the record was found in.
    pub fn section(&self) -> Section {
        self.section
    }

    /// Returns the owner name.
    pub fn owner(&self) -> &Name {
        &self.owner
    }

    /// Returns the record type.
    pub fn rtype(&self) -> Rtype {
        self.rtype
    }

    /// Returns the class.
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns the time to live in seconds.
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Returns the record data in wire format.
    ///
    /// Names embedded in the data may be compressed relative to the
    /// message.
    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Returns the address held by an A or AAAA record in class IN.
    pub fn addr(&self) -> Option<IpAddr> {
        if self.class != Class::IN {
            return None;
        }
        match self.rtype {
            Rtype::A => {
                let octets: [u8; 4] = self.data().try_into().ok()?;
                Some(Ipv4Addr::from(octets).into())
            }
            Rtype::AAAA => {
                let octets: [u8; 16] = self.data().try_into().ok()?;
                Some(Ipv6Addr::from(octets).into())
            }
            _ => None,
        }
    }
}

//------------ Message -------------------------------------------------------

/// A complete, validated DNS response.
///
/// Creating a message checks the whole of it: the header must mark it as
/// a response and all sections must parse. Octets following the last
/// record are ignored.
#[derive(Clone, Eq, PartialEq)]
pub struct Message {
    octets: Bytes,
    header: Header,
    counts: HeaderCounts,
    questions: Vec<Question>,
    records: Vec<Record>,
}

impl Message {
    /// Creates a message from a response in wire format.
    pub fn from_octets(octets: Bytes) -> Result<Self, ParseError> {
        let mut parser = Parser::from_ref(octets.as_ref());
        let header = Header::parse(&mut parser)?;
        let counts = HeaderCounts::parse(&mut parser)?;
        if !header.qr() {
            return Err(FormError::new("message is not a response").into());
        }
        let mut questions = Vec::new();
        for _ in 0..counts.qdcount {
            questions.push(Question::parse(&mut parser)?);
        }
        let mut records = Vec::new();
        for (section, count) in [
            (Section::Answer, counts.ancount),
            (Section::Authority, counts.nscount),
            (Section::Additional, counts.arcount),
        ] {
            for _ in 0..count {
                records.push(Record::parse(&mut parser, &octets, section)?);
            }
        }
        Ok(Message {
            octets,
            header,
            counts,
            questions,
            records,
        })
    }

    /// Returns the message header.
    pub fn header(&self) -> Header {
        self.header
    }

    /// Returns the section counts.
    pub fn counts(&self) -> HeaderCounts {
        self.counts
    }

    /// Returns the message in wire format.
    pub fn as_slice(&self) -> &[u8] {
        self.octets.as_ref()
    }

    /// Returns the underlying octets.
    pub fn as_octets(&self) -> &Bytes {
        &self.octets
    }

    /// Returns the questions.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Returns the first question if there is one.
    pub fn first_question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// Returns the records of the given section.
    pub fn section(
        &self,
        section: Section,
    ) -> impl Iterator<Item = &Record> + '_ {
        self.records
            .iter()
            .filter(move |record| record.section == section)
    }

    /// Returns the records of the answer section.
    pub fn answer(&self) -> impl Iterator<Item = &Record> + '_ {
        self.section(Section::Answer)
    }

    /// Returns the addresses held by A and AAAA answers.
    pub fn addresses(&self) -> Vec<IpAddr> {
        self.answer().filter_map(Record::addr).collect()
    }

    /// Returns the smallest TTL of all answers.
    pub fn min_ttl(&self) -> Option<u32> {
        self.answer().map(Record::ttl).min()
    }

    /// Returns whether the response code is NOERROR.
    pub fn no_error(&self) -> bool {
        self.header.rcode() == super::Rcode::NOERROR
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.header.id())
            .field("rcode", &self.header.rcode())
            .field("questions", &self.questions)
            .field("records", &self.records.len())
            .finish()
    }
}

//============ Testing =======================================================
