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

//! The crate-wide [`Error`] type and [`Result`] alias.

use std::fmt;

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error arising while composing, exchanging, or decoding a DNS
/// query.
///
/// Failures are not recovered from locally, with two exceptions: the
/// single UDP→TCP retry after a truncated reply, and the per-hop probe
/// retries of the path-trace transport. Everything else aborts the
/// current exchange and releases its transport.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// A domain name exceeded 253 octets, or one of its labels exceeded
    /// 63 octets.
    NameTooLong,

    /// A compression pointer referred forward (or to itself), which
    /// [RFC 1035 § 4.1.4] does not permit.
    ///
    /// [RFC 1035 § 4.1.4]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.4
    BadPointer,

    /// A decoder needed data beyond the received length.
    ShortRead,

    /// A record of a type outside the supported decode set (the raw
    /// type value is carried for reporting).
    UnsupportedType(u16),

    /// A bounded wait expired before the peer was ready.
    Timeout,

    /// A socket operation failed; the message carries errno context.
    Transport(String),

    /// The response contradicts the query: wrong transaction ID, QR
    /// still zero, or QDCOUNT other than one.
    ProtocolMismatch(&'static str),

    /// Creating the raw ICMP socket was refused. Path tracing requires
    /// CAP_NET_RAW (or root); this crate never acquires privilege
    /// itself.
    PrivilegeDenied,

    /// The entropy device could not be opened or read in full.
    Entropy(String),

    /// A resolver or reverse-query address literal did not parse.
    InvalidAddress(String),

    /// An operation ran before a required parameter was supplied.
    NotConfigured(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::NameTooLong => f.write_str("domain name or label too long"),
            Self::BadPointer => f.write_str("invalid compression pointer"),
            Self::ShortRead => f.write_str("read beyond the received length"),
            Self::UnsupportedType(raw) => write!(f, "unsupported RR type: {}", raw),
            Self::Timeout => f.write_str("timeout"),
            Self::Transport(ref msg) => write!(f, "transport failure: {}", msg),
            Self::ProtocolMismatch(what) => write!(f, "protocol mismatch: {}", what),
            Self::PrivilegeDenied => {
                f.write_str("raw socket creation refused (CAP_NET_RAW required)")
            }
            Self::Entropy(ref msg) => write!(f, "entropy device failure: {}", msg),
            Self::InvalidAddress(ref addr) => write!(f, "invalid address: {}", addr),
            Self::NotConfigured(what) => write!(f, "not configured: {}", what),
        }
    }
}

impl std::error::Error for Error {}

/// The type returned by fallible operations throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
