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

//! The transaction engine: the [`Client`] type.
//!
//! A `Client` carries the parameters of a query (resolver, site name,
//! kind, recursion bit, transport choice, timeout) and the results of
//! the most recent exchange. Each [`Client::send`] runs one complete
//! transaction: assemble the wire query, stamp a random transaction
//! ID, exchange it over a fresh transport, and decode the response —
//! retrying once over TCP when a UDP reply comes back truncated. The
//! engine is reusable; a second `send` starts over.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::thread;
use std::time::Duration;

use log::debug;

use crate::entropy;
use crate::error::{Error, Result};
use crate::message::constants::DNS_PORT;
use crate::message::{query, response, Flags, Framing, QueryKind, Response};
use crate::name;
use crate::rr::Type;
use crate::transport::{
    self, ExchangeStats, Hop, PathTrace, TcpTransport, Transport, UdpTransport,
};
use crate::util::read_u16;

/// The default exchange timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 3;

/// The accepted timeout range, in seconds; values outside it are
/// clamped.
pub const TIMEOUT_RANGE_SECS: (u64, u64) = (1, 120);

/// What the text accessors return when nothing was parsed.
pub const EMPTY_RESPONSE: &str = "empty response";

////////////////////////////////////////////////////////////////////////
// PING ROUNDS                                                        //
////////////////////////////////////////////////////////////////////////

/// What one round of [`Client::ping`] observed.
#[derive(Clone, Debug)]
pub struct PingRound {
    pub received: usize,
    pub elapsed: Duration,
    pub timed_out: bool,
}

////////////////////////////////////////////////////////////////////////
// THE CLIENT                                                         //
////////////////////////////////////////////////////////////////////////

/// A wire-level DNS client bound to one resolver at a time.
pub struct Client {
    resolver: Option<Ipv4Addr>,
    port: u16,
    site: Option<String>,
    kind: QueryKind,
    flags: Flags,
    force_tcp: bool,
    timeout: Duration,
    parsed: Option<Response>,
    stats: ExchangeStats,
    upgraded: bool,
    wire_query: Option<Vec<u8>>,
    wire_response: Option<Vec<u8>>,
}

impl Client {
    /// Creates a client with default settings: port 53, a standard
    /// query with recursion desired, UDP first, and a three-second
    /// timeout.
    pub fn new() -> Self {
        transport::install_signal_flags();
        Self {
            resolver: None,
            port: DNS_PORT,
            site: None,
            kind: QueryKind::Standard,
            flags: Flags::new_query(),
            force_tcp: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            parsed: None,
            stats: ExchangeStats::default(),
            upgraded: false,
            wire_query: None,
            wire_response: None,
        }
    }

    ////////////////////////////////////////////////////////////////////
    // CONFIGURATION                                                  //
    ////////////////////////////////////////////////////////////////////

    /// Sets the resolver to query, from an IPv4 address literal.
    pub fn set_resolver(&mut self, addr: &str) -> Result<()> {
        self.resolver = Some(
            addr.parse()
                .map_err(|_| Error::InvalidAddress(addr.to_owned()))?,
        );
        Ok(())
    }

    /// Overrides the resolver port (default 53).
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    /// Sets the site name to query for. Fails with
    /// [`Error::NameTooLong`] past 253 octets.
    pub fn set_site(&mut self, site: &str) -> Result<()> {
        if site.len() > name::MAX_NAME_LEN {
            return Err(Error::NameTooLong);
        }
        self.site = Some(site.to_owned());
        Ok(())
    }

    /// Sets the query kind.
    pub fn set_query_kind(&mut self, kind: QueryKind) {
        self.kind = kind;
    }

    /// Sets the query kind from a descriptor string, returning whether
    /// the descriptor was recognized.
    pub fn set_query_kind_descriptor(&mut self, descr: &str) -> bool {
        match QueryKind::from_descriptor(descr) {
            Some(kind) => {
                self.kind = kind;
                true
            }
            None => false,
        }
    }

    /// Sets or clears the RD (recursion desired) bit of subsequent
    /// queries.
    pub fn set_recursion_desired(&mut self, rd: bool) {
        self.flags.set_rd(rd);
    }

    /// Routes subsequent queries over TCP from the start.
    pub fn set_force_tcp(&mut self, tcp: bool) {
        self.force_tcp = tcp;
    }

    /// Sets the exchange timeout, clamped to 1..=120 seconds.
    pub fn set_timeout(&mut self, secs: u64) {
        let (min, max) = TIMEOUT_RANGE_SECS;
        self.timeout = Duration::from_secs(secs.clamp(min, max));
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the configured resolver address, if any.
    pub fn resolver(&self) -> Option<Ipv4Addr> {
        self.resolver
    }

    /// Builds the reverse-lookup name for a dotted-quad IPv4 address:
    /// `a.b.c.d` becomes `d.c.b.a.in-addr.arpa`.
    pub fn reverse_query(addr: &str) -> Result<String> {
        name::reverse_ipv4(addr)
    }

    /// Renders an RCODE value as a human-readable string, including
    /// the IANA assignment-status groups beyond the named codes.
    pub fn rcode_text(code: u16) -> &'static str {
        const NAMED: [&str; 23] = [
            "NoError: No Error",
            "FormErr: Format Error.",
            "ServFail: Server Failure.",
            "NXDomain: Non-Existent Domain.",
            "NotImp: Not Implemented.",
            "Refused: Query Refused.",
            "YXDomain: Name Exists when it should not.",
            "YXRRSet: RR Set Exists when it should not.",
            "NXRRSet: RR Set that should exist does not.",
            "NotAuth: Server Not Authoritative for zone.",
            "NotZone: Name not contained in zone.",
            "Available: for assignment",
            "Available: for assignment",
            "Available: for assignment",
            "Available: for assignment",
            "Available: for assignment",
            "BADSIG/BADVERS: TSIG Signature Failure/Bad OPT Version.",
            "BADKEY: Key not recognized.",
            "BADTIME: Signature out of time window.",
            "BADMODE: Bad TKEY Mode.",
            "BADNAME: Duplicate key name.",
            "BADALG: Algorithm not supported.",
            "BADTRUC: Bad Truncation.",
        ];
        match code {
            0..=22 => NAMED[code as usize],
            23..=3840 => "Available for assignment",
            3841..=4095 => "Private Use",
            4096..=65534 => "Available for assignment",
            65535 => "IETF Reserved",
        }
    }

    ////////////////////////////////////////////////////////////////////
    // SENDING                                                        //
    ////////////////////////////////////////////////////////////////////

    /// Runs one complete transaction.
    ///
    /// The query goes over UDP unless TCP is forced. If the UDP reply
    /// carries the TC bit, the UDP transport is released and the same
    /// assembled query — same transaction ID, reframed with the TCP
    /// length prefix — is retried once over TCP. On success the parsed
    /// records are available through the text accessors.
    pub fn send(&mut self) -> Result<()> {
        let server = self.server_addr()?;
        let site = self.effective_site()?;
        self.reset_results();

        let framing = if self.force_tcp {
            Framing::Tcp
        } else {
            Framing::Udp
        };
        let mut wire = query::assemble(&site, self.kind, framing, self.flags)?;
        entropy::fill(&mut wire, framing.id_offset(), 2)?;
        let id = read_u16(&wire, framing.id_offset())?;

        let message = if self.force_tcp {
            self.exchange_tcp(server, &wire)?
        } else {
            let message = self.exchange_udp(server, &wire)?;
            if response::peek_id(&message)? != id {
                return Err(Error::ProtocolMismatch("transaction ID differs"));
            }
            if response::peek_tc(&message)? {
                debug!("response truncated, retrying over TCP");
                self.upgraded = true;
                wire = query::reframe_for_tcp(&wire);
                self.exchange_tcp(server, &wire)?
            } else {
                message
            }
        };

        let parsed = Response::decode(&message, id)?;
        self.wire_query = Some(wire);
        self.wire_response = Some(message);
        self.parsed = Some(parsed);
        Ok(())
    }

    /// Repeats the UDP exchange once per second until the process-wide
    /// exit flag is raised, reporting each round. Timeouts are
    /// reported and the loop continues; other failures abort it.
    pub fn ping<F>(&mut self, mut on_round: F) -> Result<()>
    where
        F: FnMut(usize, &PingRound),
    {
        let server = self.server_addr()?;
        let site = self.effective_site()?;
        self.reset_results();

        let mut wire = query::assemble(&site, self.kind, Framing::Udp, self.flags)?;
        entropy::fill(&mut wire, Framing::Udp.id_offset(), 2)?;

        let mut transport = UdpTransport::open(server, self.timeout)?;
        let mut seq = 0;
        while !transport::exit_requested() {
            let result = transport.exchange(&wire);
            let stats = transport.stats();
            let round = PingRound {
                received: stats.recv_len,
                elapsed: stats.elapsed,
                timed_out: stats.timed_out,
            };
            match result {
                Ok(_) | Err(Error::Timeout) => on_round(seq, &round),
                Err(e) => return Err(e),
            }
            seq += 1;
            thread::sleep(Duration::from_secs(1));
        }
        Ok(())
    }

    /// Traces the path to the resolver, reporting each hop. Returns
    /// whether the resolver itself answered before the TTL ceiling.
    /// The answer, when one arrives, is kept as the raw response.
    pub fn trace_path<F>(&mut self, on_hop: F) -> Result<bool>
    where
        F: FnMut(&Hop),
    {
        let server = self.server_addr()?;
        let site = self.effective_site()?;
        self.reset_results();

        let mut wire = query::assemble(&site, self.kind, Framing::Udp, self.flags)?;
        entropy::fill(&mut wire, Framing::Udp.id_offset(), 2)?;

        let mut trace = PathTrace::open(server, self.timeout)?;
        let answer = trace.run(&wire, on_hop)?;
        self.wire_query = Some(wire);
        match answer {
            Some(message) => {
                self.stats.recv_len = message.len();
                self.wire_response = Some(message);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    ////////////////////////////////////////////////////////////////////
    // RESULTS                                                        //
    ////////////////////////////////////////////////////////////////////

    /// Returns the QNAME echoed by the most recent response.
    pub fn last_query_text(&self) -> Option<&str> {
        self.parsed.as_ref().map(|p| p.query_name())
    }

    /// Returns the rendered text of the most recent record, or
    /// [`EMPTY_RESPONSE`].
    pub fn last_response(&self) -> &str {
        self.parsed
            .as_ref()
            .and_then(|p| p.last_text())
            .unwrap_or(EMPTY_RESPONSE)
    }

    /// Returns every parsed record as `owner;type;class;ttl;text`
    /// lines, or [`EMPTY_RESPONSE`].
    pub fn all_responses(&self) -> String {
        match self.parsed {
            Some(ref parsed) if !parsed.records().is_empty() => parsed
                .records()
                .iter()
                .map(|r| {
                    format!(
                        "{};{};{};{};{}",
                        r.owner,
                        u16::from(r.rr_type),
                        u16::from(r.class),
                        r.ttl,
                        r.text
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
            _ => EMPTY_RESPONSE.to_owned(),
        }
    }

    /// Returns the texts of all records of the named type (e.g. "A",
    /// "aaaa"), one per line, or [`EMPTY_RESPONSE`].
    pub fn all_of_type(&self, type_name: &str) -> String {
        let texts = self.texts_of_named_type(type_name);
        if texts.is_empty() {
            EMPTY_RESPONSE.to_owned()
        } else {
            texts.join("\n")
        }
    }

    /// Returns the text of the most recent record of the named type,
    /// or [`EMPTY_RESPONSE`].
    pub fn one_of_type(&self, type_name: &str) -> String {
        self.texts_of_named_type(type_name)
            .last()
            .map(|text| (*text).to_owned())
            .unwrap_or_else(|| EMPTY_RESPONSE.to_owned())
    }

    fn texts_of_named_type(&self, type_name: &str) -> Vec<&str> {
        match (type_name.parse::<Type>(), self.parsed.as_ref()) {
            (Ok(rr_type), Some(parsed)) => parsed.texts_of_type(rr_type),
            _ => Vec::new(),
        }
    }

    /// Returns the 4-bit RCODE of the most recent response (0 before
    /// any exchange).
    pub fn return_code(&self) -> u8 {
        self.parsed.as_ref().map_or(0, |p| p.rcode())
    }

    /// Returns the wall-clock time of the most recent exchange (the
    /// sum of both legs when truncation forced a TCP retry).
    pub fn elapsed(&self) -> Duration {
        self.stats.elapsed
    }

    /// Returns whether the most recent exchange timed out.
    pub fn is_timeout(&self) -> bool {
        self.stats.timed_out
    }

    /// Returns the transport warning of the most recent exchange, if
    /// any.
    pub fn warning(&self) -> Option<&str> {
        self.stats.warning.as_deref()
    }

    /// Returns the length of the most recent received message.
    pub fn response_length(&self) -> usize {
        self.stats.recv_len
    }

    /// Returns whether the most recent `send` completed over TCP after
    /// a truncated UDP reply.
    pub fn upgraded_to_tcp(&self) -> bool {
        self.upgraded
    }

    /// Returns the raw octets of the most recently sent query.
    pub fn last_wire_query(&self) -> Option<&[u8]> {
        self.wire_query.as_deref()
    }

    /// Returns the raw octets of the most recently received message.
    pub fn last_wire_response(&self) -> Option<&[u8]> {
        self.wire_response.as_deref()
    }

    ////////////////////////////////////////////////////////////////////
    // INTERNALS                                                      //
    ////////////////////////////////////////////////////////////////////

    fn server_addr(&self) -> Result<SocketAddrV4> {
        let resolver = self.resolver.ok_or(Error::NotConfigured("resolver address"))?;
        Ok(SocketAddrV4::new(resolver, self.port))
    }

    /// Returns the QNAME to send. The version probe queries the
    /// server about itself, so it overrides the configured site.
    fn effective_site(&self) -> Result<String> {
        match self.kind {
            QueryKind::Info => Ok(query::BIND_VERSION_QNAME.to_owned()),
            _ => self
                .site
                .clone()
                .ok_or(Error::NotConfigured("site name")),
        }
    }

    fn reset_results(&mut self) {
        self.parsed = None;
        self.stats = ExchangeStats::default();
        self.upgraded = false;
        self.wire_query = None;
        self.wire_response = None;
    }

    fn exchange_udp(&mut self, server: SocketAddrV4, wire: &[u8]) -> Result<Vec<u8>> {
        let mut transport = UdpTransport::open(server, self.timeout)?;
        let result = transport.exchange(wire);
        self.absorb_stats(transport.stats());
        result
    }

    fn exchange_tcp(&mut self, server: SocketAddrV4, wire: &[u8]) -> Result<Vec<u8>> {
        let mut transport = match TcpTransport::connect(server, self.timeout) {
            Ok(transport) => transport,
            Err(e) => {
                if e == Error::Timeout {
                    self.stats.timed_out = true;
                }
                return Err(e);
            }
        };
        let result = transport.exchange(wire);
        self.absorb_stats(transport.stats());
        result
    }

    fn absorb_stats(&mut self, stats: &ExchangeStats) {
        self.stats.elapsed += stats.elapsed;
        self.stats.timed_out |= stats.timed_out;
        self.stats.recv_len = stats.recv_len;
        if stats.warning.is_some() {
            self.stats.warning = stats.warning.clone();
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener, UdpSocket};
    use std::thread;
    use std::time::Instant;

    /// Builds a response to `received`: its transaction ID, the given
    /// flag octets, the question echoed wholesale, and the given
    /// record bytes.
    fn response_for(
        received: &[u8],
        flag_octets: [u8; 2],
        counts: (u16, u16, u16),
        records: &[Vec<u8>],
    ) -> Vec<u8> {
        let mut message = Vec::new();
        message.extend_from_slice(&received[..2]);
        message.extend_from_slice(&flag_octets);
        message.extend_from_slice(&1u16.to_be_bytes());
        message.extend_from_slice(&counts.0.to_be_bytes());
        message.extend_from_slice(&counts.1.to_be_bytes());
        message.extend_from_slice(&counts.2.to_be_bytes());
        message.extend_from_slice(&received[12..]);
        for record in records {
            message.extend_from_slice(record);
        }
        message
    }

    /// One A record owned by the echoed QNAME.
    fn a_record(quad: [u8; 4]) -> Vec<u8> {
        let mut record = b"\xc0\x0c\x00\x01\x00\x01\x00\x00\x00\x3c\x00\x04".to_vec();
        record.extend_from_slice(&quad);
        record
    }

    fn v4(addr: SocketAddr) -> SocketAddrV4 {
        match addr {
            SocketAddr::V4(v4) => v4,
            _ => unreachable!(),
        }
    }

    /// Runs a UDP mock resolver for one request.
    fn mock_udp_resolver<F>(respond: F) -> SocketAddrV4
    where
        F: FnOnce(&[u8]) -> Vec<u8> + Send + 'static,
    {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = v4(server.local_addr().unwrap());
        thread::spawn(move || {
            let mut buf = [0u8; 512];
            let (received, peer) = server.recv_from(&mut buf).unwrap();
            let reply = respond(&buf[..received]);
            server.send_to(&reply, peer).unwrap();
        });
        addr
    }

    fn client_for(server: SocketAddrV4) -> Client {
        let mut client = Client::new();
        client.set_resolver(&server.ip().to_string()).unwrap();
        client.set_port(server.port());
        client.set_site("example.com").unwrap();
        client.set_timeout(2);
        client
    }

    #[test]
    fn send_parses_a_mock_resolver_answer() {
        let server = mock_udp_resolver(|received| {
            response_for(received, [0x81, 0x80], (1, 0, 0), &[a_record([93, 184, 216, 34])])
        });
        let mut client = client_for(server);
        client.send().unwrap();

        assert_eq!(client.one_of_type("A"), "93.184.216.34");
        assert_eq!(client.return_code(), 0);
        assert_eq!(client.last_query_text(), Some("example.com"));
        assert!(!client.is_timeout());
        assert!(!client.upgraded_to_tcp());
        assert!(client.response_length() > 0);
    }

    #[test]
    fn send_upgrades_to_tcp_on_truncation() {
        // The TCP listener grabs an ephemeral port; the UDP mock then
        // binds the same port number so both faces of the mock
        // resolver share an address.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = v4(listener.local_addr().unwrap());
        let udp = UdpSocket::bind(addr).unwrap();

        thread::spawn(move || {
            let mut buf = [0u8; 512];
            let (received, peer) = udp.recv_from(&mut buf).unwrap();
            // QR + TC set, no answers.
            let reply = response_for(&buf[..received], [0x83, 0x80], (0, 0, 0), &[]);
            udp.send_to(&reply, peer).unwrap();
        });
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut prefix = [0u8; 2];
            stream.read_exact(&mut prefix).unwrap();
            let mut request = vec![0u8; u16::from_be_bytes(prefix) as usize];
            stream.read_exact(&mut request).unwrap();
            let reply = response_for(
                &request,
                [0x81, 0x80],
                (3, 0, 0),
                &[
                    a_record([1, 2, 3, 4]),
                    a_record([1, 2, 3, 5]),
                    a_record([1, 2, 3, 6]),
                ],
            );
            stream
                .write_all(&(reply.len() as u16).to_be_bytes())
                .unwrap();
            stream.write_all(&reply).unwrap();
        });

        let mut client = client_for(addr);
        client.send().unwrap();

        assert!(client.upgraded_to_tcp());
        assert!(!client.is_timeout());
        assert_eq!(client.all_of_type("A"), "1.2.3.4\n1.2.3.5\n1.2.3.6");
    }

    #[test]
    fn send_times_out_against_a_silent_resolver() {
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut client = client_for(v4(silent.local_addr().unwrap()));
        client.set_timeout(1);

        let started = Instant::now();
        assert_eq!(client.send(), Err(Error::Timeout));
        assert!(client.is_timeout());
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn send_rejects_forward_pointers_and_exposes_no_records() {
        let server = mock_udp_resolver(|received| {
            let mut reply = Vec::new();
            reply.extend_from_slice(&received[..2]);
            reply.extend_from_slice(&[0x81, 0x80]);
            reply.extend_from_slice(&1u16.to_be_bytes());
            reply.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
            // The question name points forward to offset 40.
            reply.extend_from_slice(b"\xc0\x28\x00\x01\x00\x01");
            reply.resize(64, 0);
            reply
        });
        let mut client = client_for(server);
        assert_eq!(client.send(), Err(Error::BadPointer));
        assert_eq!(client.last_response(), EMPTY_RESPONSE);
    }

    #[test]
    fn send_rejects_mismatched_transaction_ids() {
        let server = mock_udp_resolver(|received| {
            let mut reply = response_for(received, [0x81, 0x80], (0, 0, 0), &[]);
            reply[0] ^= 0xff;
            reply
        });
        let mut client = client_for(server);
        assert_eq!(
            client.send(),
            Err(Error::ProtocolMismatch("transaction ID differs"))
        );
    }

    #[test]
    fn send_surfaces_the_rcode() {
        let server = mock_udp_resolver(|received| {
            response_for(received, [0x81, 0x83], (0, 0, 0), &[])
        });
        let mut client = client_for(server);
        client.send().unwrap();
        assert_eq!(client.return_code(), 3);
        assert_eq!(client.last_response(), "No RR provided");
    }

    #[test]
    fn info_queries_probe_the_bind_version() {
        let server = mock_udp_resolver(|received| {
            response_for(received, [0x81, 0x80], (0, 0, 0), &[])
        });
        let mut client = client_for(server);
        client.set_query_kind(QueryKind::Info);
        client.send().unwrap();
        assert_eq!(client.last_query_text(), Some("VERSION.BIND"));
        let wire = client.last_wire_query().unwrap();
        let qclass = read_u16(wire, wire.len() - 2).unwrap();
        assert_eq!(qclass, 3);
    }

    #[test]
    fn send_requires_configuration() {
        let mut unconfigured = Client::new();
        assert_eq!(
            unconfigured.send(),
            Err(Error::NotConfigured("resolver address"))
        );
        unconfigured.set_resolver("127.0.0.1").unwrap();
        assert_eq!(unconfigured.send(), Err(Error::NotConfigured("site name")));
    }

    #[test]
    fn reverse_query_builds_reverse_names() {
        assert_eq!(
            Client::reverse_query("10.0.0.1").unwrap(),
            "1.0.0.10.in-addr.arpa"
        );
        assert!(Client::reverse_query("10.0.0.256").is_err());
    }

    #[test]
    fn set_timeout_clamps_to_the_accepted_range() {
        let mut client = Client::new();
        client.set_timeout(0);
        assert_eq!(client.timeout(), Duration::from_secs(1));
        client.set_timeout(500);
        assert_eq!(client.timeout(), Duration::from_secs(120));
        client.set_timeout(7);
        assert_eq!(client.timeout(), Duration::from_secs(7));
    }

    #[test]
    fn set_site_rejects_overlong_names() {
        let mut client = Client::new();
        assert_eq!(client.set_site(&"x".repeat(254)), Err(Error::NameTooLong));
    }

    #[test]
    fn set_resolver_rejects_non_addresses() {
        let mut client = Client::new();
        assert!(matches!(
            client.set_resolver("resolver.example"),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn unknown_descriptors_are_reported() {
        let mut client = Client::new();
        assert!(client.set_query_kind_descriptor("mail"));
        assert!(!client.set_query_kind_descriptor("bogus"));
    }

    #[test]
    fn rcode_text_covers_the_assignment_groups() {
        assert_eq!(Client::rcode_text(0), "NoError: No Error");
        assert_eq!(Client::rcode_text(3), "NXDomain: Non-Existent Domain.");
        assert_eq!(Client::rcode_text(22), "BADTRUC: Bad Truncation.");
        assert_eq!(Client::rcode_text(23), "Available for assignment");
        assert_eq!(Client::rcode_text(3841), "Private Use");
        assert_eq!(Client::rcode_text(4096), "Available for assignment");
        assert_eq!(Client::rcode_text(65535), "IETF Reserved");
    }
}
