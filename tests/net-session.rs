#![cfg(feature = "net")]
mod common;

use common::{framed, response, response_to, Recorder};
use polltask::dns::DnsQuery;
use polltask::reactor::Reactor;
use polltask::session::{choose_nameserver, DnsSession, FamilyFallback};
use polltask::socket::TaskOwner;
use polltask::task::{Status, TaskEnv};
use polltask::wire::{Framing, Name, Rtype};
use polltask::{Config, Error};
use rstest::rstest;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream, UdpSocket};

const ADDR: Ipv4Addr = Ipv4Addr::new(198, 51, 100, 7);

/// The owner of a connected TCP stream.
struct StreamOwner(TcpStream);

impl TaskOwner for StreamOwner {
    type Socket = TcpStream;

    fn socket(&self) -> &TcpStream {
        &self.0
    }
}

/// Answers a single query on `server` with the given addresses.
///
/// Returns the query type that was asked for.
async fn answer(server: &UdpSocket, addrs: &[Ipv4Addr]) -> Rtype {
    let mut buf = [0u8; 512];
    let (len, peer) = server.recv_from(&mut buf).await.unwrap();
    let query = &buf[..len];
    let id = u16::from_be_bytes([query[0], query[1]]);
    let qtype =
        Rtype::from_int(u16::from_be_bytes([query[len - 4], query[len - 3]]));
    let msg = response_to(id, "host.test", qtype, addrs, 60);
    server.send_to(&msg, peer).await.unwrap();
    qtype
}

#[tokio::test]
async fn stream_response_in_pieces() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let data = framed(&response(5, "example.test", &[ADDR], 60));
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let (head, tail) = data.split_at(7);
        stream.write_all(head).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        stream.write_all(tail).await.unwrap();
        stream
    });

    let stream = TcpStream::connect(addr).await.unwrap();
    let owner = Arc::new(StreamOwner(stream));
    let mut config = Config::new();
    config.set_timeout(Some(Duration::from_secs(10)));
    let env = TaskEnv::new(config);
    let recorder = Recorder::default();
    let mut reactor = Reactor::new();
    reactor.spawn(DnsQuery::new(
        &env,
        &owner,
        Framing::Stream,
        recorder.completion("stream"),
    ));

    let ticks = reactor.run_until_idle(Duration::from_millis(1)).await;
    assert!(ticks > 1);
    let outcomes = recorder.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].1.addrs, Some(vec![IpAddr::from(ADDR)]));
    assert!(outcomes[0].1.status.is_success());
    drop(server.await.unwrap());
}

#[tokio::test]
async fn closed_stream_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(b"\x00\x40\x12").await.unwrap();
        stream.shutdown().await.unwrap();
    });

    let stream = TcpStream::connect(addr).await.unwrap();
    let owner = Arc::new(StreamOwner(stream));
    let env = TaskEnv::default();
    let recorder = Recorder::default();
    let mut reactor = Reactor::new();
    reactor.spawn(DnsQuery::new(
        &env,
        &owner,
        Framing::Stream,
        recorder.completion("closed"),
    ));
    reactor.run_until_idle(Duration::from_millis(1)).await;
    server.await.unwrap();
    let outcomes = recorder.outcomes();
    assert_eq!(outcomes[0].1.addrs, None);
    assert_eq!(outcomes[0].1.status, Status::CLOSED);
}

#[rstest]
#[case::a(Rtype::A)]
#[case::aaaa(Rtype::AAAA)]
#[tokio::test]
async fn session_resolves(#[case] qtype: Rtype) {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let mut config = Config::new();
    config.set_nameservers(vec![server.local_addr().unwrap()]);
    let session = DnsSession::connect(choose_nameserver(&config))
        .await
        .unwrap();
    assert_eq!(session.nameserver(), server.local_addr().unwrap());

    let env = TaskEnv::new(config);
    let recorder = Recorder::default();
    let name = Name::from_str("host.test").unwrap();
    let task = session
        .resolve(&env, &name, qtype, recorder.completion("resolve"))
        .await
        .unwrap();
    let mut reactor = Reactor::new();
    reactor.spawn(task);

    assert_eq!(answer(&server, &[ADDR]).await, qtype);
    reactor.run_until_idle(Duration::from_millis(1)).await;
    assert_eq!(
        recorder.outcomes()[0].1.addrs,
        Some(vec![IpAddr::from(ADDR)])
    );
}

#[tokio::test]
async fn fallback_after_timeout() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let nameserver: SocketAddr = server.local_addr().unwrap();
    let session = DnsSession::connect(nameserver).await.unwrap();
    let mut config = Config::new();
    config.set_timeout(None);
    config.set_max_polls(Some(2));
    let env = TaskEnv::new(config);
    let name = Name::from_str("host.test").unwrap();

    let mut fallback = FamilyFallback::new();
    fallback.start(Rtype::A);
    let recorder = Recorder::default();
    let mut reactor = Reactor::new();
    reactor.spawn(
        session
            .resolve(&env, &name, Rtype::A, recorder.completion("a"))
            .await
            .unwrap(),
    );
    reactor.run_until_idle(Duration::from_millis(1)).await;
    assert_eq!(recorder.outcomes()[0].1.status, Status::TIMED_OUT);

    let next = fallback.next().unwrap();
    assert_eq!(next, Rtype::AAAA);
    let env = TaskEnv::default();
    reactor.spawn(
        session
            .resolve(&env, &name, next, recorder.completion("aaaa"))
            .await
            .unwrap(),
    );
    // The unanswered A query is still queued at the server.
    let mut buf = [0u8; 512];
    server.recv_from(&mut buf).await.unwrap();
    assert_eq!(answer(&server, &[ADDR]).await, Rtype::AAAA);

    reactor.run_until_idle(Duration::from_millis(1)).await;
    let outcomes = recorder.outcomes();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[1].0, "aaaa");
    assert_eq!(outcomes[1].1.addrs, Some(vec![IpAddr::from(ADDR)]));
    assert!(fallback.is_exhausted());
}

#[tokio::test]
async fn concurrent_resolves_are_serialized() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let session = DnsSession::connect(server.local_addr().unwrap())
        .await
        .unwrap();
    let env = TaskEnv::default();
    let name = Name::from_str("host.test").unwrap();
    let recorder = Recorder::default();
    let mut reactor = Reactor::new();

    reactor.spawn(
        session
            .resolve(&env, &name, Rtype::A, recorder.completion("a"))
            .await
            .unwrap(),
    );
    let refused = session
        .resolve(&env, &name, Rtype::AAAA, recorder.completion("aaaa"))
        .await;
    assert!(matches!(refused, Err(Error::InFlight(_))));

    assert_eq!(answer(&server, &[ADDR]).await, Rtype::A);
    reactor.run_until_idle(Duration::from_millis(1)).await;
    assert_eq!(session.in_flight(), None);

    reactor.spawn(
        session
            .resolve(&env, &name, Rtype::AAAA, recorder.completion("aaaa"))
            .await
            .unwrap(),
    );
    assert_eq!(answer(&server, &[ADDR]).await, Rtype::AAAA);
    reactor.run_until_idle(Duration::from_millis(1)).await;

    let outcomes = recorder.outcomes();
    assert_eq!(outcomes.len(), 2);
    for (label, outcome) in outcomes {
        assert!(outcome.status.is_success(), "{} failed", label);
        assert_eq!(outcome.addrs, Some(vec![IpAddr::from(ADDR)]));
    }
}
