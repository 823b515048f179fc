//! The owner side of DNS tasks.
//!
//! A [`DnsSession`] owns a connected UDP socket to a single nameserver. It
//! sends queries and creates the [`DnsQuery`] tasks that wait for their
//! responses, one task at a time. The session is shared with its tasks through
//! an [`Arc`]; dropping the last strong reference closes the socket and
//! makes any task still waiting fail with [`Status::OWNER_GONE`].
//!
//! [`DnsQuery`]: crate::dns::DnsQuery
//! [`Status::OWNER_GONE`]: crate::task::Status::OWNER_GONE

use crate::config::Config;
use crate::wire::Rtype;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

#[cfg(feature = "net")]
pub use self::net::DnsSession;

/// The nameserver used if none is configured.
pub const DEFAULT_NAMESERVER: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(1, 1, 1, 1), 53));

/// Returns the nameserver to send queries to.
///
/// This is the first configured nameserver or [`DEFAULT_NAMESERVER`] if
/// there is none.
pub fn choose_nameserver(config: &Config) -> SocketAddr {
    config
        .nameservers()
        .first()
        .copied()
        .unwrap_or(DEFAULT_NAMESERVER)
}

//------------ FamilyFallback -------------------------------------------------

/// Keeps track of the address families tried for a host.
///
/// When resolving a host fails for one family, the owner asks for the next
/// record type to try. AAAA is tried before A and each is tried at most
/// once.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FamilyFallback {
    tried_a: bool,
    tried_aaaa: bool,
}

impl FamilyFallback {
    /// Creates a value with nothing tried yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a query for `rtype` is being made.
    ///
    /// Record types other than A and AAAA are ignored.
    pub fn start(&mut self, rtype: Rtype) {
        match rtype {
            Rtype::A => self.tried_a = true,
            Rtype::AAAA => self.tried_aaaa = true,
            _ => {}
        }
    }

    /// Returns the record type to try next and records it as tried.
    pub fn next(&mut self) -> Option<Rtype> {
        if !self.tried_aaaa {
            self.tried_aaaa = true;
            Some(Rtype::AAAA)
        } else if !self.tried_a {
            self.tried_a = true;
            Some(Rtype::A)
        } else {
            None
        }
    }

    /// Returns whether `rtype` has been tried already.
    pub fn tried(&self, rtype: Rtype) -> bool {
        match rtype {
            Rtype::A => self.tried_a,
            Rtype::AAAA => self.tried_aaaa,
            _ => false,
        }
    }

    /// Returns whether both families have been tried.
    pub fn is_exhausted(&self) -> bool {
        self.tried_a && self.tried_aaaa
    }
}

//------------ DnsSession -----------------------------------------------------

#[cfg(feature = "net")]
mod net {
    use crate::dns::DnsQuery;
    use crate::error::Error;
    use crate::socket::TaskOwner;
    use crate::task::{Completion, ResultChannel, TaskEnv};
    use crate::wire::{compose_query, Framing, Message, Name, Rtype};
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tokio::net::UdpSocket;
    use tracing::{debug, trace};

    /// The log target for sessions.
    const LOG_TARGET: &str = "polltask::session";

    /// The ID of the query a session is waiting for, if any.
    type Slot = Arc<Mutex<Option<u16>>>;

    /// Locks a slot, ignoring poisoning.
    fn lock(slot: &Slot) -> MutexGuard<'_, Option<u16>> {
        slot.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// A UDP socket connected to a nameserver.
    ///
    /// All responses arrive on the one socket, so only a single task can
    /// wait for a response at a time. While the task created by
    /// [`resolve`][Self::resolve] is alive, further calls fail with
    /// [`Error::InFlight`]. The slot is free again once the task has
    /// notified its owner or has been dropped.
    #[derive(Debug)]
    pub struct DnsSession {
        socket: UdpSocket,
        nameserver: SocketAddr,
        in_flight: Slot,
    }

    impl DnsSession {
        /// Binds a socket to an ephemeral port and connects it.
        ///
        /// The local address is the unspecified address of the family of
        /// `nameserver`.
        pub async fn connect(
            nameserver: SocketAddr,
        ) -> Result<Arc<Self>, Error> {
            let local: SocketAddr = if nameserver.is_ipv4() {
                ([0u8; 4], 0).into()
            } else {
                ([0u16; 8], 0).into()
            };
            let socket = UdpSocket::bind(local)
                .await
                .map_err(|err| Error::Bind(Arc::new(err)))?;
            socket
                .connect(nameserver)
                .await
                .map_err(|err| Error::Connect(Arc::new(err)))?;
            debug!(
                target: LOG_TARGET,
                "connected {:?} to {}",
                socket.local_addr().ok(),
                nameserver
            );
            Ok(Arc::new(Self::from_socket(socket, nameserver)))
        }

        /// Creates a session from a socket already connected to
        /// `nameserver`.
        pub fn from_socket(socket: UdpSocket, nameserver: SocketAddr) -> Self {
            DnsSession {
                socket,
                nameserver,
                in_flight: Default::default(),
            }
        }

        /// Returns the address of the nameserver.
        pub fn nameserver(&self) -> SocketAddr {
            self.nameserver
        }

        /// Returns the ID of the query a task is waiting for, if any.
        pub fn in_flight(&self) -> Option<u16> {
            *lock(&self.in_flight)
        }

        /// Sends a query with a random message ID.
        ///
        /// Returns the message ID of the query. The session does not keep
        /// track of queries sent this way.
        pub async fn send_query(
            &self,
            qname: &Name,
            qtype: Rtype,
        ) -> Result<u16, Error> {
            let id = rand::random::<u16>();
            self.send(id, qname, qtype).await?;
            Ok(id)
        }

        /// Sends a query and creates the task waiting for its response.
        ///
        /// The task only accepts a response carrying the ID and the
        /// question of the query. Fails with [`Error::InFlight`] if a task
        /// created earlier is still alive.
        pub async fn resolve(
            self: &Arc<Self>,
            env: &TaskEnv,
            qname: &Name,
            qtype: Rtype,
            completion: Completion<Message>,
        ) -> Result<DnsQuery<Self>, Error> {
            let guard = self.reserve()?;
            self.send(guard.id, qname, qtype).await?;
            let id = guard.id;
            let mut completion = completion;
            let completion =
                Completion::new(move |res: &ResultChannel<Message>| {
                    drop(guard);
                    completion.notify(res);
                });
            Ok(DnsQuery::new(env, self, Framing::Datagram, completion)
                .expect_id(id)
                .expect_question(qname.clone(), qtype))
        }

        /// Claims the session for a new query.
        fn reserve(&self) -> Result<InFlight, Error> {
            let mut slot = lock(&self.in_flight);
            if let Some(id) = *slot {
                return Err(Error::InFlight(id));
            }
            let id = rand::random::<u16>();
            *slot = Some(id);
            Ok(InFlight {
                id,
                slot: self.in_flight.clone(),
            })
        }

        async fn send(
            &self,
            id: u16,
            qname: &Name,
            qtype: Rtype,
        ) -> Result<(), Error> {
            let query = compose_query(id, qname, qtype);
            let sent = self
                .socket
                .send(&query)
                .await
                .map_err(|err| Error::Send(Arc::new(err)))?;
            if sent != query.len() {
                return Err(Error::ShortSend);
            }
            debug!(
                target: LOG_TARGET,
                "sent query {} for {} {} to {}",
                id,
                qname,
                qtype,
                self.nameserver
            );
            Ok(())
        }
    }

    impl TaskOwner for DnsSession {
        type Socket = UdpSocket;

        fn socket(&self) -> &UdpSocket {
            &self.socket
        }
    }

    //------------ InFlight ---------------------------------------------------

    /// Holds the session's slot until dropped.
    #[derive(Debug)]
    struct InFlight {
        id: u16,
        slot: Slot,
    }

    impl Drop for InFlight {
        fn drop(&mut self) {
            let mut slot = lock(&self.slot);
            if *slot == Some(self.id) {
                *slot = None;
                trace!(target: LOG_TARGET, "query {} done", self.id);
            }
        }
    }
}

//============ Tests =========================================================
