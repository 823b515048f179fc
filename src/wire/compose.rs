//! Composing queries.

use super::header::{Class, Header, HeaderCounts, Rtype};
use super::name::Name;
use bytes::{BufMut, Bytes, BytesMut};

/// Composes a recursive query for `qname` and `qtype` in class IN.
///
/// The returned octets are the bare message. For stream transports the
/// caller adds the length prefix.
pub fn compose_query(id: u16, qname: &Name, qtype: Rtype) -> Bytes {
    let mut header = Header::new();
    header.set_id(id);
    header.set_rd(true);
    let counts = HeaderCounts {
        qdcount: 1,
        ..Default::default()
    };

    let mut target = BytesMut::with_capacity(12 + qname.len() + 4);
    header.compose(&mut target);
    counts.compose(&mut target);
    qname.compose(&mut target);
    target.put_u16(qtype.to_int());
    target.put_u16(Class::IN.to_int());
    target.freeze()
}

//============ Testing =======================================================
