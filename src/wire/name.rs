//! Domain names.

use super::{FormError, ParseError};
use bytes::{BufMut, Bytes, BytesMut};
use core::fmt;
use core::hash::{Hash, Hasher};
use core::str::FromStr;
use octseq::parse::Parser;

/// The maximum length of a domain name in wire format.
pub const MAX_NAME_LEN: usize = 255;

/// The maximum length of a single label.
const MAX_LABEL_LEN: usize = 63;

/// The maximum number of compression pointers followed in a single name.
const MAX_POINTERS: usize = 127;

//------------ Name ----------------------------------------------------------

/// An absolute, uncompressed domain name.
///
/// The name keeps its wire format, a sequence of length-prefixed labels
/// ending in the empty root label. Comparison and hashing ignore ASCII
/// case.
#[derive(Clone)]
pub struct Name {
    octets: Bytes,
}

impl Name {
    /// Returns the root name.
    pub fn root() -> Self {
        Name {
            octets: Bytes::from_static(b"\0"),
        }
    }

    /// Creates a name from its uncompressed wire format.
    pub fn from_octets(octets: Bytes) -> Result<Self, ParseError> {
        let mut parser = Parser::from_ref(octets.as_ref());
        let name = Self::parse(&mut parser)?;
        if parser.remaining() != 0 || name.octets.len() != octets.len() {
            return Err(FormError::new("trailing data after name").into());
        }
        Ok(Name { octets })
    }

    /// Parses a possibly compressed name.
    ///
    /// The parser needs to cover the whole message so compression
    /// pointers can be followed. It is left right after the name.
    pub fn parse(parser: &mut Parser<'_, [u8]>) -> Result<Self, ParseError> {
        let mut res = BytesMut::with_capacity(32);
        let mut resume = None;
        let mut pointers = 0;
        loop {
            let ltype = parser.parse_u8()?;
            match ltype {
                0 => {
                    res.put_u8(0);
                    break;
                }
                1..=0x3F => {
                    let len = usize::from(ltype);
                    if res.len() + len + 2 > MAX_NAME_LEN {
                        return Err(FormError::new("long domain name").into());
                    }
                    res.put_u8(ltype);
                    res.put_slice(parser.peek(len)?);
                    parser.advance(len)?;
                }
                0xC0..=0xFF => {
                    let low = usize::from(parser.parse_u8()?);
                    let target = low | ((usize::from(ltype) & 0x3F) << 8);
                    pointers += 1;
                    if pointers > MAX_POINTERS {
                        return Err(FormError::new(
                            "too many compression pointers",
                        )
                        .into());
                    }
                    if resume.is_none() {
                        resume = Some(parser.pos());
                    }
                    parser.seek(target)?;
                }
                _ => {
                    return Err(FormError::new("invalid label type").into())
                }
            }
        }
        if let Some(pos) = resume {
            parser.seek(pos)?;
        }
        Ok(Name {
            octets: res.freeze(),
        })
    }

    /// Returns the wire format of the name.
    pub fn as_slice(&self) -> &[u8] {
        self.octets.as_ref()
    }

    /// Returns the length of the wire format.
    pub fn len(&self) -> usize {
        self.octets.len()
    }

    /// Returns whether this is the root name.
    pub fn is_root(&self) -> bool {
        self.octets.len() == 1
    }

    /// Returns an iterator over the labels, excluding the root label.
    pub fn labels(&self) -> Labels<'_> {
        Labels {
            octets: self.octets.as_ref(),
        }
    }

    /// Appends the uncompressed wire format to `target`.
    pub fn compose(&self, target: &mut BytesMut) {
        target.put_slice(self.as_slice())
    }
}

//--- FromStr

impl FromStr for Name {
    type Err = ParseError;

    /// Parses a name in presentation format.
    ///
    /// The trailing dot is optional. Labels may contain `\.` and `\\`
    /// escapes as well as `\DDD` decimal escapes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(FormError::new("empty domain name").into());
        }
        if s == "." {
            return Ok(Name::root());
        }
        let mut res = BytesMut::with_capacity(s.len() + 2);
        let mut label = Vec::with_capacity(MAX_LABEL_LEN);
        let mut chars = s.bytes();
        let mut absolute = false;
        while let Some(ch) = chars.next() {
            match ch {
                b'.' => {
                    push_label(&mut res, &label)?;
                    label.clear();
                    if chars.len() == 0 {
                        absolute = true;
                    }
                }
                b'\\' => label.push(parse_escape(&mut chars)?),
                _ => label.push(ch),
            }
        }
        if !absolute {
            push_label(&mut res, &label)?;
        }
        res.put_u8(0);
        if res.len() > MAX_NAME_LEN {
            return Err(FormError::new("long domain name").into());
        }
        Ok(Name {
            octets: res.freeze(),
        })
    }
}

/// Appends a non-empty label to a name under construction.
fn push_label(target: &mut BytesMut, label: &[u8]) -> Result<(), ParseError> {
    if label.is_empty() {
        return Err(FormError::new("empty label").into());
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(FormError::new("long label").into());
    }
    // Length checked above.
    target.put_u8(label.len() as u8);
    target.put_slice(label);
    Ok(())
}

/// Parses the remainder of an escape sequence.
fn parse_escape(
    chars: &mut impl Iterator<Item = u8>,
) -> Result<u8, ParseError> {
    let first = chars
        .next()
        .ok_or_else(|| ParseError::form_error("unexpected end of escape"))?;
    if !first.is_ascii_digit() {
        return Ok(first);
    }
    let mut value = u16::from(first - b'0');
    for _ in 0..2 {
        let digit = chars
            .next()
            .filter(u8::is_ascii_digit)
            .ok_or_else(|| ParseError::form_error("bad decimal escape"))?;
        value = value * 10 + u16::from(digit - b'0');
    }
    u8::try_from(value)
        .map_err(|_| ParseError::form_error("decimal escape out of range"))
}

//--- PartialEq, Eq, and Hash

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice().eq_ignore_ascii_case(other.as_slice())
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for ch in self.as_slice() {
            state.write_u8(ch.to_ascii_lowercase())
        }
    }
}

//--- Display and Debug

impl fmt::Display for Name {
    /// Formats the name without the trailing dot, the root as `.`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for (idx, label) in self.labels().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            for &ch in label {
                if ch == b'.' || ch == b'\\' {
                    write!(f, "\\{}", ch as char)?;
                } else if ch.is_ascii_graphic() {
                    write!(f, "{}", ch as char)?;
                } else {
                    write!(f, "\\{:03}", ch)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}

//------------ Labels --------------------------------------------------------

/// An iterator over the labels of a [`Name`].
#[derive(Clone, Debug)]
pub struct Labels<'a> {
    octets: &'a [u8],
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let (&len, rest) = self.octets.split_first()?;
        let len = usize::from(len);
        if len == 0 || rest.len() < len {
            self.octets = &[];
            return None;
        }
        let (label, rest) = rest.split_at(len);
        self.octets = rest;
        Some(label)
    }
}

//============ Testing =======================================================
