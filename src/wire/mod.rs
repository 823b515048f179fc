//! Reading DNS messages off a socket.
//!
//! This module is the narrow interface through which DNS tasks talk to the
//! wire. It contains just enough of the DNS message format to validate a
//! response, render its question, and extract addresses from its answers,
//! plus composing the query that precedes a response.
//!
//! The central piece is the [`ResponseParser`] trait and its default
//! implementation [`WireParser`]. A parser makes one non-blocking attempt
//! at receiving a complete response and keeps whatever partial frame it
//! has read in between attempts.

mod compose;
mod header;
mod message;
mod name;
mod recv;

pub use self::compose::compose_query;
pub use self::header::{Class, Header, HeaderCounts, Rcode, Rtype};
pub use self::message::{Message, Question, Record, Section};
pub use self::name::{Name, MAX_NAME_LEN};
pub use self::recv::{Framing, Received, ResponseParser, WireParser};

use core::fmt;
use octseq::parse::ShortInput;

//------------ ParseError ----------------------------------------------------

/// An error happened while parsing data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// An attempt was made to go beyond the end of the parser.
    ShortInput,

    /// A formatting error occurred.
    Form(FormError),
}

impl ParseError {
    /// Creates a new parse error as a form error with the given message.
    pub fn form_error(msg: &'static str) -> Self {
        FormError::new(msg).into()
    }
}

impl From<ShortInput> for ParseError {
    fn from(_: ShortInput) -> Self {
        ParseError::ShortInput
    }
}

impl From<FormError> for ParseError {
    fn from(err: FormError) -> Self {
        ParseError::Form(err)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParseError::ShortInput => f.write_str("unexpected end of input"),
            ParseError::Form(ref err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for ParseError {}

//------------ FormError -----------------------------------------------------

/// A formatting error occured.
///
/// This is a generic error for all kinds of error cases that result in data
/// not being accepted. For diagnostics, the error is being given a static
/// string describing the error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormError(&'static str);

impl FormError {
    /// Creates a new form error value with the given diagnostics string.
    pub fn new(msg: &'static str) -> Self {
        FormError(msg)
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for FormError {}
