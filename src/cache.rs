//! A cache of resolved responses.
//!
//! Responses are keyed by the name and record type of their first
//! question. An entry is valid for the smallest TTL of the answers in the
//! response; responses without answers are not cached at all. Expiry is
//! checked against the clock of the [`TaskEnv`] the cache was created
//! with, so it can be tested without waiting.

#![warn(missing_docs)]

use crate::clock::{Clock, Timestamp};
use crate::task::TaskEnv;
use crate::wire::{Message, Name, Rtype};
use moka::sync::Cache;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// The log target for the cache.
const LOG_TARGET: &str = "polltask::cache";

//------------ DnsCache -------------------------------------------------------

/// A bounded cache of DNS responses.
#[derive(Clone)]
pub struct DnsCache {
    /// The cached responses.
    cache: Cache<Key, Arc<Entry>>,

    /// The clock to determine expiry with.
    clock: Arc<dyn Clock>,
}

impl DnsCache {
    /// Creates an empty cache.
    ///
    /// The number of entries is limited by the configured cache size.
    pub fn new(env: &TaskEnv) -> Self {
        DnsCache {
            cache: Cache::new(env.config().cache_size()),
            clock: env.clock().clone(),
        }
    }

    /// Adds a response to the cache.
    ///
    /// Returns whether the response was cached. It is not if it has no
    /// question or no answers.
    pub fn insert(&self, msg: &Message) -> bool {
        let question = match msg.first_question() {
            Some(question) => question,
            None => return false,
        };
        let ttl = match msg.min_ttl() {
            Some(ttl) => ttl,
            None => return false,
        };
        trace!(
            target: LOG_TARGET,
            "caching {} for {} seconds",
            question,
            ttl
        );
        self.cache.insert(
            Key::new(question.qname().clone(), question.qtype()),
            Arc::new(Entry {
                message: msg.clone(),
                loaded_at: self.clock.now(),
                ttl: Duration::from_secs(ttl.into()),
            }),
        );
        true
    }

    /// Returns the cached response for a name and record type.
    ///
    /// An expired entry is removed and `None` returned.
    pub fn get(&self, qname: &Name, qtype: Rtype) -> Option<Message> {
        let key = Key::new(qname.clone(), qtype);
        let entry = self.cache.get(&key)?;
        if entry.is_expired(self.clock.now()) {
            trace!(target: LOG_TARGET, "expired {} {}", qname, qtype);
            self.cache.invalidate(&key);
            return None;
        }
        Some(entry.message.clone())
    }

    /// Returns the cached addresses for a name and record type.
    pub fn addresses(
        &self,
        qname: &Name,
        qtype: Rtype,
    ) -> Option<Vec<IpAddr>> {
        self.get(qname, qtype).map(|msg| msg.addresses())
    }

    /// Removes the entry for a name and record type.
    pub fn remove(&self, qname: &Name, qtype: Rtype) {
        self.cache.invalidate(&Key::new(qname.clone(), qtype))
    }
}

impl fmt::Debug for DnsCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

//------------ Key ------------------------------------------------------------

/// The key of a cache entry.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct Key {
    /// The name asked for.
    qname: Name,

    /// The record type asked for.
    qtype: Rtype,
}

impl Key {
    fn new(qname: Name, qtype: Rtype) -> Self {
        Key { qname, qtype }
    }
}

//------------ Entry ----------------------------------------------------------

/// A cached response.
#[derive(Debug)]
struct Entry {
    /// The response.
    message: Message,

    /// When the response was added.
    loaded_at: Timestamp,

    /// How long the response is valid.
    ttl: Duration,
}

impl Entry {
    fn is_expired(&self, now: Timestamp) -> bool {
        now.saturating_since(self.loaded_at) > self.ttl
    }
}

//============ Tests =========================================================
