//! Configuration of tasks and sessions.
//!
//! A [`Config`] is created once, usually at process start, and handed to
//! every task through the [`TaskEnv`][crate::task::TaskEnv]. Values that
//! are out of range are capped rather than rejected.

#![warn(missing_docs)]

use core::cmp;
use std::net::SocketAddr;
use std::time::Duration;

//------------ Configuration Constants ----------------------------------------

/// Configuration limits for the size of a receive buffer.
const RECV_SIZE: DefMinMax<usize> = DefMinMax::new(2000, 512, 0xFFFF + 2);

/// Configuration limits for the task timeout.
const TIMEOUT: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(5),
    Duration::from_millis(1),
    Duration::from_secs(600),
);

/// Configuration limits for the number of socket reads in a single poll.
const MAX_READS_PER_POLL: DefMinMax<usize> = DefMinMax::new(16, 1, 1024);

/// Configuration limits for the number of cached responses.
const CACHE_SIZE: DefMinMax<u64> = DefMinMax::new(1000, 1, 1_000_000);

//------------ DefMinMax -----------------------------------------------------

/// The default, minimum, and maximum values for a config variable.
#[derive(Clone, Copy)]
pub(crate) struct DefMinMax<T> {
    /// The default value,
    def: T,

    /// The minimum value,
    min: T,

    /// The maximum value,
    max: T,
}

impl<T> DefMinMax<T> {
    /// Creates a new value.
    pub const fn new(def: T, min: T, max: T) -> Self {
        Self { def, min, max }
    }

    /// Returns the default value.
    pub fn default(self) -> T {
        self.def
    }

    /// Trims the given value to fit into the minimum/maximum range.
    pub fn limit(self, value: T) -> T
    where
        T: Ord,
    {
        cmp::max(self.min, cmp::min(self.max, value))
    }
}

//------------ Config ---------------------------------------------------------

/// Configuration for tasks and the sessions creating them.
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(from = "ConfigFile")
)]
pub struct Config {
    /// Size of the buffer a single datagram is received into.
    recv_size: usize,

    /// Time after which a task still running fails.
    timeout: Option<Duration>,

    /// Number of polls after which a task still running fails.
    max_polls: Option<u32>,

    /// Maximum number of socket reads during a single poll.
    max_reads_per_poll: usize,

    /// Nameservers to send queries to, in order of preference.
    nameservers: Vec<SocketAddr>,

    /// Maximum number of responses kept in the cache.
    cache_size: u64,
}

impl Config {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the size of the datagram receive buffer.
    pub fn recv_size(&self) -> usize {
        self.recv_size
    }

    /// Sets the size of the datagram receive buffer.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_recv_size(&mut self, value: usize) {
        self.recv_size = RECV_SIZE.limit(value)
    }

    /// Returns the task timeout.
    ///
    /// The timeout is measured from the construction of a task. A task
    /// that has not finished when it is polled after the timeout has
    /// passed fails.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Sets the task timeout.
    ///
    /// If this value is too small or too large, it will be caped. `None`
    /// disables the timeout.
    pub fn set_timeout(&mut self, value: Option<Duration>) {
        self.timeout = value.map(|value| TIMEOUT.limit(value))
    }

    /// Returns the maximum number of polls of a task.
    pub fn max_polls(&self) -> Option<u32> {
        self.max_polls
    }

    /// Sets the maximum number of polls of a task.
    ///
    /// A value of zero is raised to one. `None` disables the limit.
    pub fn set_max_polls(&mut self, value: Option<u32>) {
        self.max_polls = value.map(|value| cmp::max(value, 1))
    }

    /// Returns the maximum number of socket reads in a single poll.
    pub fn max_reads_per_poll(&self) -> usize {
        self.max_reads_per_poll
    }

    /// Sets the maximum number of socket reads in a single poll.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_max_reads_per_poll(&mut self, value: usize) {
        self.max_reads_per_poll = MAX_READS_PER_POLL.limit(value)
    }

    /// Returns the configured nameservers.
    pub fn nameservers(&self) -> &[SocketAddr] {
        &self.nameservers
    }

    /// Sets the nameservers.
    pub fn set_nameservers(&mut self, value: Vec<SocketAddr>) {
        self.nameservers = value
    }

    /// Returns the maximum number of cached responses.
    pub fn cache_size(&self) -> u64 {
        self.cache_size
    }

    /// Sets the maximum number of cached responses.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_cache_size(&mut self, value: u64) {
        self.cache_size = CACHE_SIZE.limit(value)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recv_size: RECV_SIZE.default(),
            timeout: Some(TIMEOUT.default()),
            max_polls: None,
            max_reads_per_poll: MAX_READS_PER_POLL.default(),
            nameservers: Vec::new(),
            cache_size: CACHE_SIZE.default(),
        }
    }
}

//------------ ConfigFile -----------------------------------------------------

/// The on-disk form of a [`Config`].
///
/// Missing values take their defaults, present values are capped through
/// the setters of [`Config`].
#[cfg(feature = "serde")]
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    recv_size: Option<usize>,
    timeout_ms: Option<u64>,
    no_timeout: bool,
    max_polls: Option<u32>,
    max_reads_per_poll: Option<usize>,
    nameservers: Vec<SocketAddr>,
    cache_size: Option<u64>,
}

#[cfg(feature = "serde")]
impl From<ConfigFile> for Config {
    fn from(file: ConfigFile) -> Self {
        let mut res = Config::new();
        if let Some(value) = file.recv_size {
            res.set_recv_size(value)
        }
        if file.no_timeout {
            res.set_timeout(None)
        } else if let Some(value) = file.timeout_ms {
            res.set_timeout(Some(Duration::from_millis(value)))
        }
        res.set_max_polls(file.max_polls);
        if let Some(value) = file.max_reads_per_poll {
            res.set_max_reads_per_poll(value)
        }
        res.set_nameservers(file.nameservers);
        if let Some(value) = file.cache_size {
            res.set_cache_size(value)
        }
        res
    }
}

//============ Tests =========================================================
