// Copyright 2023 The querent developers.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Assembly of on-the-wire DNS queries.

use super::constants::*;
use super::Flags;
use crate::class::Class;
use crate::error::Result;
use crate::name;
use crate::rr::Type;

/// The QNAME of the BIND version probe, sent as TXT in class CH.
pub const BIND_VERSION_QNAME: &str = "VERSION.BIND";

/// The transaction-ID placeholder that occupies the first two header
/// octets until the entropy source overwrites it.
const ID_PLACEHOLDER: [u8; 2] = [0x0b, 0xad];

////////////////////////////////////////////////////////////////////////
// QUERY KINDS                                                        //
////////////////////////////////////////////////////////////////////////

/// The kind of query to perform.
///
/// The kind selects the QTYPE/QCLASS pair and, for some kinds, a
/// behavior: `Dump` is a standard query reported verbosely, `Ping`
/// repeats the UDP exchange once per second, and `Info` probes the
/// server's BIND version string instead of the configured site.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum QueryKind {
    Standard,
    Dump,
    Ping,
    Info,
    Mail,
    Locate,
}

impl QueryKind {
    /// Parses the descriptor strings accepted on the command line.
    /// Unknown descriptors yield `None`.
    pub fn from_descriptor(descr: &str) -> Option<Self> {
        match descr {
            "std" => Some(Self::Standard),
            "dump" => Some(Self::Dump),
            "ping" => Some(Self::Ping),
            "info" => Some(Self::Info),
            "mail" => Some(Self::Mail),
            "locate" => Some(Self::Locate),
            _ => None,
        }
    }

    /// Returns the descriptor string for this kind.
    pub fn descriptor(&self) -> &'static str {
        match self {
            Self::Standard => "std",
            Self::Dump => "dump",
            Self::Ping => "ping",
            Self::Info => "info",
            Self::Mail => "mail",
            Self::Locate => "locate",
        }
    }

    /// Returns the QTYPE this kind queries for.
    pub fn qtype(&self) -> Type {
        match self {
            Self::Standard | Self::Dump | Self::Ping => Type::A,
            Self::Info => Type::TXT,
            Self::Mail => Type::MX,
            Self::Locate => Type::LOC,
        }
    }

    /// Returns the QCLASS this kind queries in. Everything is IN except
    /// the version probe, which lives in CH.
    pub fn qclass(&self) -> Class {
        match self {
            Self::Info => Class::CH,
            _ => Class::IN,
        }
    }
}

impl Default for QueryKind {
    fn default() -> Self {
        Self::Standard
    }
}

////////////////////////////////////////////////////////////////////////
// FRAMING                                                            //
////////////////////////////////////////////////////////////////////////

/// How a query is framed for its transport. TCP messages carry a
/// 2-octet length prefix; UDP messages do not.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Framing {
    Udp,
    Tcp,
}

impl Framing {
    /// Returns the offset of the transaction ID within a query buffer
    /// using this framing.
    pub fn id_offset(&self) -> usize {
        match self {
            Self::Udp => ID_START,
            Self::Tcp => TCP_PREFIX_LEN + ID_START,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// QUERY ASSEMBLY                                                     //
////////////////////////////////////////////////////////////////////////

/// Assembles the wire form of a query for `site`.
///
/// The buffer holds, in order: the TCP length prefix when `framing` is
/// [`Framing::Tcp`]; the 12-octet header (placeholder transaction ID,
/// the given flag octets, QDCOUNT 1, all other counts 0); the QNAME;
/// and the QTYPE/QCLASS selected by `kind`. The caller is expected to
/// overwrite the ID at [`Framing::id_offset`] before sending.
pub fn assemble(site: &str, kind: QueryKind, framing: Framing, flags: Flags) -> Result<Vec<u8>> {
    let mut query = Vec::with_capacity(TCP_PREFIX_LEN + HEADER_SIZE + site.len() + 6);

    if framing == Framing::Tcp {
        query.extend_from_slice(&[0, 0]);
    }

    query.extend_from_slice(&ID_PLACEHOLDER);
    query.extend_from_slice(&flags.octets());
    query.extend_from_slice(&1u16.to_be_bytes()); // QDCOUNT
    query.extend_from_slice(&0u16.to_be_bytes()); // ANCOUNT
    query.extend_from_slice(&0u16.to_be_bytes()); // NSCOUNT
    query.extend_from_slice(&0u16.to_be_bytes()); // ARCOUNT

    name::encode_into(site, &mut query)?;

    query.extend_from_slice(&u16::from(kind.qtype()).to_be_bytes());
    query.extend_from_slice(&u16::from(kind.qclass()).to_be_bytes());

    if framing == Framing::Tcp {
        let message_len = (query.len() - TCP_PREFIX_LEN) as u16;
        query[..TCP_PREFIX_LEN].copy_from_slice(&message_len.to_be_bytes());
    }

    Ok(query)
}

/// Prepends a TCP length prefix to an already assembled UDP query,
/// preserving its transaction ID. This is the truncation-upgrade path:
/// the retry is the same transaction over a different transport.
pub fn reframe_for_tcp(udp_query: &[u8]) -> Vec<u8> {
    let mut query = Vec::with_capacity(TCP_PREFIX_LEN + udp_query.len());
    query.extend_from_slice(&(udp_query.len() as u16).to_be_bytes());
    query.extend_from_slice(udp_query);
    query
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::util::read_u16;

    #[test]
    fn assemble_builds_a_standard_udp_query() {
        let query = assemble(
            "example.com",
            QueryKind::Standard,
            Framing::Udp,
            Flags::new_query(),
        )
        .unwrap();
        assert_eq!(
            query,
            b"\x0b\xad\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\
              \x07example\x03com\x00\x00\x01\x00\x01"
        );
    }

    #[test]
    fn assemble_maps_kinds_to_qtype_and_qclass() {
        for (kind, qtype, qclass) in [
            (QueryKind::Standard, 1u16, 1u16),
            (QueryKind::Dump, 1, 1),
            (QueryKind::Ping, 1, 1),
            (QueryKind::Info, 16, 3),
            (QueryKind::Mail, 15, 1),
            (QueryKind::Locate, 29, 1),
        ] {
            let query = assemble("a.b", kind, Framing::Udp, Flags::new_query()).unwrap();
            let qtype_at = query.len() - 4;
            assert_eq!(read_u16(&query, qtype_at).unwrap(), qtype);
            assert_eq!(read_u16(&query, qtype_at + 2).unwrap(), qclass);
        }
    }

    #[test]
    fn assemble_prefixes_tcp_queries_with_their_length() {
        let udp = assemble(
            "example.com",
            QueryKind::Standard,
            Framing::Udp,
            Flags::new_query(),
        )
        .unwrap();
        let tcp = assemble(
            "example.com",
            QueryKind::Standard,
            Framing::Tcp,
            Flags::new_query(),
        )
        .unwrap();
        assert_eq!(tcp.len(), udp.len() + TCP_PREFIX_LEN);
        assert_eq!(read_u16(&tcp, 0).unwrap() as usize, udp.len());
        assert_eq!(&tcp[TCP_PREFIX_LEN..], &udp[..]);
    }

    #[test]
    fn assemble_propagates_name_errors() {
        let result = assemble(
            &"x".repeat(254),
            QueryKind::Standard,
            Framing::Udp,
            Flags::new_query(),
        );
        assert_eq!(result.unwrap_err(), Error::NameTooLong);
    }

    #[test]
    fn id_offset_tracks_the_framing() {
        assert_eq!(Framing::Udp.id_offset(), 0);
        assert_eq!(Framing::Tcp.id_offset(), 2);
    }

    #[test]
    fn reframe_preserves_the_message() {
        let udp = assemble(
            "example.com",
            QueryKind::Mail,
            Framing::Udp,
            Flags::new_query(),
        )
        .unwrap();
        let tcp = reframe_for_tcp(&udp);
        assert_eq!(read_u16(&tcp, 0).unwrap() as usize, udp.len());
        assert_eq!(&tcp[2..], &udp[..]);
    }

    #[test]
    fn descriptors_round_trip() {
        for descr in ["std", "dump", "ping", "info", "mail", "locate"] {
            let kind = QueryKind::from_descriptor(descr).unwrap();
            assert_eq!(kind.descriptor(), descr);
        }
        assert_eq!(QueryKind::from_descriptor("bogus"), None);
    }
}
