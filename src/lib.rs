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

//! A wire-level DNS interrogation client.
//!
//! Unlike a stub resolver that hands queries to the operating system,
//! this crate speaks [RFC 1035] directly to a resolver of the caller's
//! choosing: it composes every octet of each query, exchanges it over
//! UDP or TCP with bounded waits, and decodes every octet of the
//! response into structured records. On top of the single-exchange
//! path it offers repeating "ping" queries, a BIND version probe, and
//! an ICMP-assisted trace of the network path to the resolver.
//!
//! The entry point is [`Client`]:
//!
//! ```no_run
//! use querent::{Client, QueryKind};
//!
//! # fn main() -> querent::Result<()> {
//! let mut client = Client::new();
//! client.set_resolver("9.9.9.9")?;
//! client.set_site("example.com")?;
//! client.set_query_kind(QueryKind::Standard);
//! client.send()?;
//! println!("{}", client.one_of_type("A"));
//! # Ok(())
//! # }
//! ```
//!
//! Responses larger than a UDP datagram are handled transparently:
//! when the resolver sets the truncation bit, the same query is
//! retried once over TCP.
//!
//! [RFC 1035]: https://datatracker.ietf.org/doc/html/rfc1035

pub mod class;
pub mod client;
pub mod entropy;
pub mod error;
pub mod message;
pub mod name;
pub mod rr;
pub mod transport;
mod util;

pub use class::Class;
pub use client::{Client, PingRound, EMPTY_RESPONSE};
pub use error::{Error, Result};
pub use message::{Flags, QueryKind, Record, Response};
pub use rr::{Ttl, Type};
