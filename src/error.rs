//! Error type for tasks and their owners.

#![warn(missing_docs)]

use crate::task::Status;
use crate::wire::ParseError;
use std::error;
use std::fmt::{Display, Formatter};
use std::io;
use std::sync::Arc;

/// Error type for tasks and the sessions that own them.
#[derive(Clone, Debug)]
pub enum Error {
    /// The result channel of a task was already populated.
    ResultAlreadySet(Status),

    /// The owner of a task has been dropped.
    OwnerGone,

    /// A domain name or message could not be parsed.
    Parse(ParseError),

    /// Binding a socket gave an error.
    Bind(Arc<io::Error>),

    /// Connecting a socket gave an error.
    Connect(Arc<io::Error>),

    /// Sending a query gave an error.
    Send(Arc<io::Error>),

    /// The session is still waiting for the response to a query.
    ///
    /// The value is the message ID of that query.
    InFlight(u16),

    /// Sending a query over a datagram socket gave a partial result.
    ShortSend,

    /// The task reached a terminal state without producing a value.
    TaskFailed(Status),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Error::ResultAlreadySet(status) => {
                write!(f, "result already set with status {}", status)
            }
            Error::OwnerGone => write!(f, "task owner has been dropped"),
            Error::Parse(err) => write!(f, "parse error: {}", err),
            Error::Bind(_) => write!(f, "error binding socket"),
            Error::Connect(_) => write!(f, "error connecting socket"),
            Error::Send(_) => write!(f, "error sending query"),
            Error::InFlight(id) => {
                write!(f, "query {} is still waiting for a response", id)
            }
            Error::ShortSend => write!(f, "partial send of query"),
            Error::TaskFailed(status) => {
                write!(f, "task failed with status {}", status)
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::ResultAlreadySet(_) => None,
            Error::OwnerGone => None,
            Error::Parse(err) => Some(err),
            Error::Bind(e) => Some(e),
            Error::Connect(e) => Some(e),
            Error::Send(e) => Some(e),
            Error::InFlight(_) => None,
            Error::ShortSend => None,
            Error::TaskFailed(_) => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}
