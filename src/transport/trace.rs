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

//! The path-trace transport: a connected UDP probe socket paired with
//! a raw ICMP socket.
//!
//! Each hop raises the probe socket's TTL by one and sends the
//! prepared query up to three times, waiting on both sockets at once.
//! A router on the path discards the expired probe and reports ICMP
//! Time Exceeded, which identifies the hop; a DNS response on the UDP
//! socket means the resolver itself was reached and ends the trace.
//!
//! The raw ICMP socket requires CAP_NET_RAW (or root). This transport
//! never acquires privilege; when socket creation is refused it fails
//! with [`Error::PrivilegeDenied`] and leaves privilege handling to
//! the caller.

use std::io;
use std::mem;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

use log::debug;
use nix::sys::socket::{setsockopt, sockopt};
use nix::unistd::close;

use crate::error::{Error, Result};

use super::{await_either_readable, exit_requested, ConnectedUdpTransport};

/// The default TTL ceiling.
pub const DEFAULT_MAX_TTL: u8 = 35;

/// Probes sent per hop before moving on.
const PROBES_PER_HOP: usize = 3;

/// ICMP message type 11, Time Exceeded.
const ICMP_TIME_EXCEEDED: u8 = 11;

/// Code 0 of Time Exceeded: TTL expired in transit.
const ICMP_TTL_IN_TRANSIT: u8 = 0;

////////////////////////////////////////////////////////////////////////
// HOP REPORTS                                                        //
////////////////////////////////////////////////////////////////////////

/// A reply attributed to one probe.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProbeReply {
    pub from: Ipv4Addr,
    pub elapsed: Duration,
}

/// The outcome of one probe of a hop.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Probe {
    /// A router on the path reported Time Exceeded.
    Router(ProbeReply),

    /// The resolver answered the query; the trace is complete.
    Answered(ProbeReply),

    /// Nothing attributable came back within the timeout.
    Lost,
}

/// One hop of the trace: the TTL used and the outcome of each probe.
#[derive(Clone, Debug)]
pub struct Hop {
    pub ttl: u8,
    pub probes: Vec<Probe>,
}

////////////////////////////////////////////////////////////////////////
// PATH-TRACE TRANSPORT                                               //
////////////////////////////////////////////////////////////////////////

/// The UDP+ICMP path-trace transport.
pub struct PathTrace {
    probe: ConnectedUdpTransport,
    icmp_fd: RawFd,
    server: SocketAddrV4,
    timeout: Duration,
    max_ttl: u8,
}

impl PathTrace {
    /// Opens the probe and ICMP sockets toward `server`.
    pub fn open(server: SocketAddrV4, timeout: Duration) -> Result<Self> {
        let probe = ConnectedUdpTransport::open(server, timeout)?;

        let icmp_fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_RAW, libc::IPPROTO_ICMP) };
        if icmp_fd < 0 {
            let err = io::Error::last_os_error();
            return match err.raw_os_error() {
                Some(libc::EPERM) | Some(libc::EACCES) => Err(Error::PrivilegeDenied),
                _ => Err(Error::Transport(format!("raw ICMP socket: {}", err))),
            };
        }

        Ok(Self {
            probe,
            icmp_fd,
            server,
            timeout,
            max_ttl: DEFAULT_MAX_TTL,
        })
    }

    /// Overrides the TTL ceiling.
    pub fn set_max_ttl(&mut self, max_ttl: u8) {
        self.max_ttl = max_ttl;
    }

    /// Traces the path by repeatedly sending `query` with rising TTLs,
    /// reporting each completed hop through `on_hop`. Returns the DNS
    /// response when the resolver was reached, or `None` when the TTL
    /// ceiling was exceeded or an exit was requested first.
    pub fn run<F>(&mut self, query: &[u8], mut on_hop: F) -> Result<Option<Vec<u8>>>
    where
        F: FnMut(&Hop),
    {
        for ttl in 1..=self.max_ttl {
            if exit_requested() {
                debug!("path trace interrupted at ttl {}", ttl);
                return Ok(None);
            }
            setsockopt(self.probe.raw_fd(), sockopt::Ipv4Ttl, &i32::from(ttl))
                .map_err(|e| Error::Transport(format!("IP_TTL: {}", e)))?;

            let mut hop = Hop {
                ttl,
                probes: Vec::with_capacity(PROBES_PER_HOP),
            };
            let mut answer = None;

            for _ in 0..PROBES_PER_HOP {
                let started = Instant::now();
                self.probe.send_only(query)?;
                let (probe, response) = self.wait_reply(started)?;
                hop.probes.push(probe);
                if response.is_some() {
                    answer = response;
                    break;
                }
            }

            on_hop(&hop);
            if answer.is_some() {
                return Ok(answer);
            }
        }
        Ok(None)
    }

    /// Waits for whichever of the two sockets speaks first and
    /// attributes the reply.
    fn wait_reply(&mut self, started: Instant) -> Result<(Probe, Option<Vec<u8>>)> {
        let (icmp_ready, udp_ready) =
            match await_either_readable(self.icmp_fd, self.probe.raw_fd(), self.timeout) {
                Ok(ready) => ready,
                Err(Error::Timeout) => return Ok((Probe::Lost, None)),
                Err(e) => return Err(e),
            };
        let elapsed = started.elapsed();

        if udp_ready {
            let response = self.probe.recv_ready()?;
            let reply = ProbeReply {
                from: *self.server.ip(),
                elapsed,
            };
            return Ok((Probe::Answered(reply), Some(response)));
        }

        if icmp_ready {
            let (from, packet) = self.recv_icmp()?;
            if is_time_exceeded(&packet) {
                return Ok((Probe::Router(ProbeReply { from, elapsed }), None));
            }
            debug!("ignoring unrelated ICMP from {}", from);
        }
        Ok((Probe::Lost, None))
    }

    /// Receives one pending ICMP packet, returning the sender and the
    /// raw packet (IP header included).
    fn recv_icmp(&mut self) -> Result<(Ipv4Addr, Vec<u8>)> {
        let mut buf = [0u8; 512];
        let mut addr: libc::sockaddr_in = unsafe { mem::zeroed() };
        let mut addr_len = mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;
        let received = unsafe {
            libc::recvfrom(
                self.icmp_fd,
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
                0,
                &mut addr as *mut libc::sockaddr_in as *mut libc::sockaddr,
                &mut addr_len,
            )
        };
        if received < 0 {
            return Err(Error::Transport(format!(
                "recvfrom (ICMP): {}",
                io::Error::last_os_error()
            )));
        }
        let from = Ipv4Addr::from(u32::from_be(addr.sin_addr.s_addr));
        Ok((from, buf[..received as usize].to_vec()))
    }
}

impl Drop for PathTrace {
    fn drop(&mut self) {
        let _ = close(self.icmp_fd);
    }
}

/// Returns whether a raw ICMP packet (IP header included) is Time
/// Exceeded with the in-transit code.
fn is_time_exceeded(packet: &[u8]) -> bool {
    let first = match packet.first() {
        Some(&octet) => octet,
        None => return false,
    };
    let header_len = ((first & 0x0f) as usize) * 4;
    match (packet.get(header_len), packet.get(header_len + 1)) {
        (Some(&icmp_type), Some(&icmp_code)) => {
            icmp_type == ICMP_TIME_EXCEEDED && icmp_code == ICMP_TTL_IN_TRANSIT
        }
        _ => false,
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
