//! Helpers shared by the integration tests.
#![allow(dead_code)]

use polltask::clock::FakeClock;
use polltask::socket::{RecvSocket, TaskOwner};
use polltask::task::{Completion, ResultChannel, Status, TaskEnv};
use polltask::wire::{compose_query, Message, Name, Rtype};
use polltask::Config;
use std::collections::VecDeque;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

//------------ MockSocket -----------------------------------------------------

/// A socket owner handing out queued reads.
///
/// Every queued chunk is returned by exactly one read. With nothing queued,
/// reads fail with `WouldBlock`.
#[derive(Debug, Default)]
pub struct MockSocket {
    queue: Mutex<VecDeque<io::Result<Vec<u8>>>>,
    reads: AtomicUsize,
}

impl MockSocket {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, data: &[u8]) {
        self.queue.lock().unwrap().push_back(Ok(data.to_vec()))
    }

    pub fn push_err(&self, kind: io::ErrorKind) {
        self.queue.lock().unwrap().push_back(Err(kind.into()))
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl RecvSocket for MockSocket {
    fn try_recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let mut queue = self.queue.lock().unwrap();
        match queue.pop_front() {
            Some(Ok(mut data)) => {
                if data.len() > buf.len() {
                    let rest = data.split_off(buf.len());
                    queue.push_front(Ok(rest));
                }
                buf[..data.len()].copy_from_slice(&data);
                Ok(data.len())
            }
            Some(Err(err)) => Err(err),
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }
}

impl TaskOwner for MockSocket {
    type Socket = Self;

    fn socket(&self) -> &Self {
        self
    }
}

//------------ Messages -------------------------------------------------------

/// Creates a response for `qname` with an A answer for each address.
pub fn response(
    id: u16,
    qname: &str,
    addrs: &[Ipv4Addr],
    ttl: u32,
) -> Vec<u8> {
    response_to(id, qname, Rtype::A, addrs, ttl)
}

/// Creates a response to a question for `qname` and `qtype`.
///
/// The answers are A records, whatever the question asked for.
pub fn response_to(
    id: u16,
    qname: &str,
    qtype: Rtype,
    addrs: &[Ipv4Addr],
    ttl: u32,
) -> Vec<u8> {
    let qname = Name::from_str(qname).unwrap();
    let mut res = compose_query(id, &qname, qtype).to_vec();
    res[2] |= 0x80;
    res[3] |= 0x80;
    res[6..8].copy_from_slice(&(addrs.len() as u16).to_be_bytes());
    for addr in addrs {
        res.extend_from_slice(b"\xc0\x0c\x00\x01\x00\x01");
        res.extend_from_slice(&ttl.to_be_bytes());
        res.extend_from_slice(b"\x00\x04");
        res.extend_from_slice(&addr.octets());
    }
    res
}

/// Prefixes a message with its length for stream transports.
pub fn framed(msg: &[u8]) -> Vec<u8> {
    let mut res = (msg.len() as u16).to_be_bytes().to_vec();
    res.extend_from_slice(msg);
    res
}

//------------ Environments ---------------------------------------------------

/// Creates an environment without any limits.
pub fn unlimited_env() -> TaskEnv {
    let mut config = Config::new();
    config.set_timeout(None);
    TaskEnv::new(config)
}

/// Creates an environment with a timeout measured by a fake clock.
pub fn fake_clock_env(timeout: Duration) -> (TaskEnv, Arc<FakeClock>) {
    let mut config = Config::new();
    config.set_timeout(Some(timeout));
    let clock = Arc::new(FakeClock::new());
    let env = TaskEnv::new(config).with_clock(clock.clone());
    (env, clock)
}

//------------ Recorder -------------------------------------------------------

/// What a completion callback saw.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Outcome {
    pub addrs: Option<Vec<IpAddr>>,
    pub status: Status,
}

/// Collects the outcomes passed to completion callbacks.
#[derive(Clone, Debug, Default)]
pub struct Recorder(Arc<Mutex<Vec<(&'static str, Outcome)>>>);

impl Recorder {
    /// Returns a completion recording its outcome under `label`.
    pub fn completion(&self, label: &'static str) -> Completion<Message> {
        let log = self.0.clone();
        Completion::new(move |res: &ResultChannel<Message>| {
            let (msg, status) = res.get();
            log.lock().unwrap().push((
                label,
                Outcome {
                    addrs: msg.map(Message::addresses),
                    status,
                },
            ));
        })
    }

    pub fn outcomes(&self) -> Vec<(&'static str, Outcome)> {
        self.0.lock().unwrap().clone()
    }
}
