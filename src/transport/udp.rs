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

//! The UDP transports.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::{Duration, Instant};

use nix::sys::socket::{setsockopt, sockopt};

use crate::error::{Error, Result};
use crate::message::constants::UDP_RESPONSE_SIZE;

use super::{await_fd, ExchangeStats, Interest, Transport};

/// Creates an unconnected IPv4 datagram socket with `SO_REUSEADDR`
/// set, bound to an ephemeral local port.
fn new_socket() -> Result<UdpSocket> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .map_err(|e| Error::Transport(format!("bind: {}", e)))?;
    setsockopt(socket.as_raw_fd(), sockopt::ReuseAddr, &true)
        .map_err(|e| Error::Transport(format!("SO_REUSEADDR: {}", e)))?;
    Ok(socket)
}

////////////////////////////////////////////////////////////////////////
// CONNECTIONLESS UDP                                                 //
////////////////////////////////////////////////////////////////////////

/// A connectionless UDP transport addressing the resolver with
/// `sendto`/`recvfrom`.
pub struct UdpTransport {
    socket: UdpSocket,
    server: SocketAddrV4,
    timeout: Duration,
    stats: ExchangeStats,
}

impl UdpTransport {
    /// Opens a transport toward `server`.
    pub fn open(server: SocketAddrV4, timeout: Duration) -> Result<Self> {
        Ok(Self {
            socket: new_socket()?,
            server,
            timeout,
            stats: ExchangeStats::default(),
        })
    }

    fn exchange_inner(&mut self, query: &[u8]) -> Result<Vec<u8>> {
        let fd = self.socket.as_raw_fd();
        await_fd(fd, Interest::Writable, self.timeout)?;
        let sent = self
            .socket
            .send_to(query, SocketAddr::V4(self.server))
            .map_err(|e| Error::Transport(format!("sendto: {}", e)))?;
        if sent != query.len() {
            return Err(Error::Transport(format!(
                "sendto: short send of {} of {} octets",
                sent,
                query.len()
            )));
        }

        await_fd(fd, Interest::Readable, self.timeout)?;
        let mut buf = [0u8; UDP_RESPONSE_SIZE];
        let (received, _) = self
            .socket
            .recv_from(&mut buf)
            .map_err(|e| Error::Transport(format!("recvfrom: {}", e)))?;
        self.stats.recv_len = received;
        Ok(buf[..received].to_vec())
    }
}

impl Transport for UdpTransport {
    fn exchange(&mut self, query: &[u8]) -> Result<Vec<u8>> {
        self.stats = ExchangeStats::default();
        let started = Instant::now();
        let result = self.exchange_inner(query);
        self.stats.elapsed = started.elapsed();
        if matches!(result, Err(Error::Timeout)) {
            self.stats.timed_out = true;
            self.stats.warning = Some("receive window expired".to_owned());
        }
        result
    }

    fn stats(&self) -> &ExchangeStats {
        &self.stats
    }
}

////////////////////////////////////////////////////////////////////////
// CONNECTED UDP                                                      //
////////////////////////////////////////////////////////////////////////

/// A UDP transport whose socket is connected to the resolver, using
/// `send`/`recv` on the descriptor. The path-trace transport builds on
/// this socket, since applying a TTL and matching ICMP feedback wants
/// a fixed five-tuple.
pub struct ConnectedUdpTransport {
    socket: UdpSocket,
    timeout: Duration,
    stats: ExchangeStats,
}

impl ConnectedUdpTransport {
    /// Opens a transport connected to `server`.
    pub fn open(server: SocketAddrV4, timeout: Duration) -> Result<Self> {
        let socket = new_socket()?;
        socket
            .connect(SocketAddr::V4(server))
            .map_err(|e| Error::Transport(format!("connect: {}", e)))?;
        Ok(Self {
            socket,
            timeout,
            stats: ExchangeStats::default(),
        })
    }

    /// Returns the underlying descriptor.
    pub(crate) fn raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }

    /// Sends `query` without waiting for a reply.
    pub(crate) fn send_only(&self, query: &[u8]) -> Result<()> {
        self.socket
            .send(query)
            .map_err(|e| Error::Transport(format!("send: {}", e)))
            .and(Ok(()))
    }

    /// Receives a pending datagram. The caller is expected to have
    /// seen the descriptor readable.
    pub(crate) fn recv_ready(&self) -> Result<Vec<u8>> {
        let mut buf = [0u8; UDP_RESPONSE_SIZE];
        let received = self
            .socket
            .recv(&mut buf)
            .map_err(|e| Error::Transport(format!("recv: {}", e)))?;
        Ok(buf[..received].to_vec())
    }

    fn exchange_inner(&mut self, query: &[u8]) -> Result<Vec<u8>> {
        let fd = self.socket.as_raw_fd();
        await_fd(fd, Interest::Writable, self.timeout)?;
        self.send_only(query)?;
        await_fd(fd, Interest::Readable, self.timeout)?;
        let response = self.recv_ready()?;
        self.stats.recv_len = response.len();
        Ok(response)
    }
}

impl Transport for ConnectedUdpTransport {
    fn exchange(&mut self, query: &[u8]) -> Result<Vec<u8>> {
        self.stats = ExchangeStats::default();
        let started = Instant::now();
        let result = self.exchange_inner(query);
        self.stats.elapsed = started.elapsed();
        if matches!(result, Err(Error::Timeout)) {
            self.stats.timed_out = true;
            self.stats.warning = Some("receive window expired".to_owned());
        }
        result
    }

    fn stats(&self) -> &ExchangeStats {
        &self.stats
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::thread;

    fn local_responder(response: &'static [u8]) -> SocketAddrV4 {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = match server.local_addr().unwrap() {
            SocketAddr::V4(v4) => v4,
            _ => unreachable!(),
        };
        thread::spawn(move || {
            let mut buf = [0u8; UDP_RESPONSE_SIZE];
            let (_, peer) = server.recv_from(&mut buf).unwrap();
            server.send_to(response, peer).unwrap();
        });
        addr
    }

    #[test]
    fn udp_exchange_round_trips() {
        let server = local_responder(b"\xab\xcd\x80\x00");
        let mut transport = UdpTransport::open(server, Duration::from_secs(2)).unwrap();
        let response = transport.exchange(b"\xab\xcd\x01\x00").unwrap();
        assert_eq!(response, b"\xab\xcd\x80\x00");
        assert_eq!(transport.stats().recv_len, 4);
        assert!(!transport.stats().timed_out);
    }

    #[test]
    fn connected_udp_exchange_round_trips() {
        let server = local_responder(b"\x00\x01\x80\x00");
        let mut transport = ConnectedUdpTransport::open(server, Duration::from_secs(2)).unwrap();
        let response = transport.exchange(b"\x00\x01\x01\x00").unwrap();
        assert_eq!(response, b"\x00\x01\x80\x00");
    }

    #[test]
    fn udp_exchange_times_out_without_a_responder() {
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = match silent.local_addr().unwrap() {
            SocketAddr::V4(v4) => v4,
            _ => unreachable!(),
        };
        let mut transport = UdpTransport::open(addr, Duration::from_millis(100)).unwrap();
        let started = Instant::now();
        assert_eq!(transport.exchange(b"query"), Err(Error::Timeout));
        assert!(transport.stats().timed_out);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn sockets_bind_to_an_ephemeral_local_port() {
        let server = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 53);
        let transport = UdpTransport::open(server, Duration::from_secs(1)).unwrap();
        assert_ne!(transport.socket.local_addr().unwrap().port(), 0);
    }
}
