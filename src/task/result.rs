//! The single-slot result of a task.

use crate::error::Error;
use core::fmt;

//------------ Status ---------------------------------------------------------

/// The auxiliary status code stored alongside a task's value.
///
/// A successful receive stores the number of octets received, which is
/// always positive. Failures use the negative codes defined as associated
/// constants. [`Status::NONE`] marks a result that has not been set.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Status(i32);

impl Status {
    /// No result is available yet.
    pub const NONE: Status = Status(-1);

    /// Data was received that can never form a valid frame.
    pub const MALFORMED: Status = Status(-2);

    /// The peer closed the connection.
    pub const CLOSED: Status = Status(-3);

    /// Reading from the socket failed.
    pub const IO_ERROR: Status = Status(-4);

    /// The task ran out of time or polls.
    pub const TIMED_OUT: Status = Status(-5);

    /// The owner of the task was dropped.
    pub const OWNER_GONE: Status = Status(-6);

    /// Creates a status from its raw value.
    pub const fn from_int(value: i32) -> Self {
        Status(value)
    }

    /// Creates the status for a frame of `len` octets.
    ///
    /// Lengths that do not fit are capped.
    pub fn received(len: usize) -> Self {
        Status(i32::try_from(len).unwrap_or(i32::MAX))
    }

    /// Returns the raw value.
    pub const fn to_int(self) -> i32 {
        self.0
    }

    /// Returns whether the status reports a successful receive.
    pub const fn is_success(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Status::NONE => f.write_str("none"),
            Status::MALFORMED => f.write_str("malformed"),
            Status::CLOSED => f.write_str("closed"),
            Status::IO_ERROR => f.write_str("io-error"),
            Status::TIMED_OUT => f.write_str("timed-out"),
            Status::OWNER_GONE => f.write_str("owner-gone"),
            Status(value) => write!(f, "{}", value),
        }
    }
}

//------------ ResultChannel --------------------------------------------------

/// A write-once holder for the outcome of a task.
///
/// The channel starts out as `(None, Status::NONE)`. It is populated once
/// when the task reaches a terminal state and never changes afterwards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResultChannel<T> {
    value: Option<T>,
    status: Status,
    set: bool,
}

impl<T> ResultChannel<T> {
    /// Creates a new, empty channel.
    pub fn new() -> Self {
        ResultChannel {
            value: None,
            status: Status::NONE,
            set: false,
        }
    }

    /// Stores the value and status.
    ///
    /// Fails if the channel has been populated before, in which case the
    /// channel is left untouched.
    pub fn set(&mut self, value: T, status: Status) -> Result<(), Error> {
        self.populate(Some(value), status)
    }

    /// Stores a status without a value.
    ///
    /// Fails if the channel has been populated before.
    pub fn fail(&mut self, status: Status) -> Result<(), Error> {
        self.populate(None, status)
    }

    fn populate(
        &mut self,
        value: Option<T>,
        status: Status,
    ) -> Result<(), Error> {
        if self.set {
            return Err(Error::ResultAlreadySet(self.status));
        }
        self.value = value;
        self.status = status;
        self.set = true;
        Ok(())
    }

    /// Returns the current contents.
    pub fn get(&self) -> (Option<&T>, Status) {
        (self.value.as_ref(), self.status)
    }

    /// Returns the value if there is one.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Returns the status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns whether the channel has been populated.
    pub fn is_set(&self) -> bool {
        self.set
    }

    /// Takes the value out of a populated channel, consuming it.
    pub fn into_value(self) -> Option<T> {
        self.value
    }
}

impl<T> Default for ResultChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

//============ Tests =========================================================
