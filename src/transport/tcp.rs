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

//! The length-framed TCP transport.

use std::net::SocketAddrV4;
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::socket::{connect, socket, AddressFamily, SockFlag, SockType, SockaddrIn};
use nix::sys::socket::{getsockopt, setsockopt, sockopt};
use nix::unistd::{close, read, write};

use crate::error::{Error, Result};
use crate::message::constants::{TCP_PREFIX_LEN, TCP_RESPONSE_SIZE};
use crate::util::read_u16;

use super::{await_fd, take_sigpipe, ExchangeStats, Interest, Transport};

////////////////////////////////////////////////////////////////////////
// TCP TRANSPORT                                                      //
////////////////////////////////////////////////////////////////////////

/// A TCP transport exchanging DNS messages with the standard 2-octet
/// length prefix.
///
/// The connection is established non-blocking: a connect in progress
/// is waited on for writability within the timeout and then verified
/// through `SO_ERROR`, after which the socket is returned to blocking
/// mode (each read is gated by a readiness wait anyway). The receive
/// side accumulates until the declared length has arrived, warning and
/// returning what it has when the peer closes early or a gated read
/// still comes up dry.
pub struct TcpTransport {
    fd: RawFd,
    timeout: Duration,
    stats: ExchangeStats,
}

impl TcpTransport {
    /// Opens a connection to `server`.
    pub fn connect(server: SocketAddrV4, timeout: Duration) -> Result<Self> {
        let fd = socket(
            AddressFamily::Inet,
            SockType::Stream,
            SockFlag::empty(),
            None,
        )
        .map_err(|e| Error::Transport(format!("socket: {}", e)))?;

        // From here on the socket belongs to the transport, so any
        // failed step below closes it on drop.
        let transport = Self {
            fd,
            timeout,
            stats: ExchangeStats::default(),
        };
        transport.establish(server)?;
        Ok(transport)
    }

    fn establish(&self, server: SocketAddrV4) -> Result<()> {
        let raw_flags = fcntl(self.fd, FcntlArg::F_GETFL)
            .map_err(|e| Error::Transport(format!("fcntl: {}", e)))?;
        let flags = OFlag::from_bits_truncate(raw_flags);
        fcntl(self.fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))
            .map_err(|e| Error::Transport(format!("fcntl: {}", e)))?;

        match connect(self.fd, &SockaddrIn::from(server)) {
            Ok(()) => {}
            Err(Errno::EINPROGRESS) => {
                await_fd(self.fd, Interest::Writable, self.timeout)?;
                let pending = getsockopt(self.fd, sockopt::SocketError)
                    .map_err(|e| Error::Transport(format!("SO_ERROR: {}", e)))?;
                if pending != 0 {
                    return Err(Error::Transport(format!(
                        "connect: {}",
                        Errno::from_i32(pending)
                    )));
                }
            }
            Err(e) => return Err(Error::Transport(format!("connect: {}", e))),
        }

        fcntl(self.fd, FcntlArg::F_SETFL(flags))
            .map_err(|e| Error::Transport(format!("fcntl: {}", e)))?;
        setsockopt(self.fd, sockopt::ReuseAddr, &true)
            .map_err(|e| Error::Transport(format!("SO_REUSEADDR: {}", e)))?;
        Ok(())
    }

    fn send_all(&mut self, query: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < query.len() {
            if take_sigpipe() {
                self.stats.warning = Some("SIGPIPE during send".to_owned());
                return Err(Error::Transport("connection broken during send".to_owned()));
            }
            match write(self.fd, &query[written..]) {
                Ok(0) => {
                    return Err(Error::Transport("write: connection closed".to_owned()));
                }
                Ok(n) => written += n,
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(Error::Transport(format!("write: {}", e))),
            }
        }
        Ok(())
    }

    fn exchange_inner(&mut self, query: &[u8]) -> Result<Vec<u8>> {
        await_fd(self.fd, Interest::Writable, self.timeout)?;
        self.send_all(query)?;

        let mut buf = vec![0u8; TCP_RESPONSE_SIZE];
        let mut pos = 0;
        let mut declared: Option<usize> = None;

        loop {
            await_fd(self.fd, Interest::Readable, self.timeout)?;
            match read(self.fd, &mut buf[pos..]) {
                Ok(0) => {
                    if pos > TCP_PREFIX_LEN {
                        self.stats.warning =
                            Some("peer closed mid-message, partial read".to_owned());
                        break;
                    }
                    return Err(Error::Transport(
                        "read: connection closed without data".to_owned(),
                    ));
                }
                Ok(n) => pos += n,
                Err(Errno::EAGAIN) => {
                    if pos > TCP_PREFIX_LEN {
                        self.stats.warning = Some("read stalled, partial read".to_owned());
                        break;
                    }
                    continue;
                }
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(Error::Transport(format!("read: {}", e))),
            }

            if declared.is_none() && pos >= TCP_PREFIX_LEN {
                let length = read_u16(&buf, 0)? as usize;
                if TCP_PREFIX_LEN + length > TCP_RESPONSE_SIZE {
                    return Err(Error::Transport(format!(
                        "declared response length {} exceeds the {}-octet ceiling",
                        length, TCP_RESPONSE_SIZE
                    )));
                }
                declared = Some(length);
            }
            if let Some(length) = declared {
                if pos >= TCP_PREFIX_LEN + length {
                    break;
                }
            }
        }

        let declared = declared.ok_or_else(|| {
            Error::Transport("peer closed within the length prefix".to_owned())
        })?;
        let end = pos.min(TCP_PREFIX_LEN + declared);
        self.stats.recv_len = end - TCP_PREFIX_LEN;
        Ok(buf[TCP_PREFIX_LEN..end].to_vec())
    }
}

impl Transport for TcpTransport {
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

impl Drop for TcpTransport {
    fn drop(&mut self) {
        let _ = close(self.fd);
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener};
    use std::thread;

    fn local_tcp_responder(payload: &'static [u8]) -> SocketAddrV4 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = match listener.local_addr().unwrap() {
            SocketAddr::V4(v4) => v4,
            _ => unreachable!(),
        };
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut prefix = [0u8; 2];
            stream.read_exact(&mut prefix).unwrap();
            let mut request = vec![0u8; u16::from_be_bytes(prefix) as usize];
            stream.read_exact(&mut request).unwrap();
            stream
                .write_all(&(payload.len() as u16).to_be_bytes())
                .unwrap();
            stream.write_all(payload).unwrap();
        });
        addr
    }

    #[test]
    fn tcp_exchange_strips_the_length_prefix() {
        let server = local_tcp_responder(b"\x12\x34\x80\x00\x00\x01");
        let mut transport = TcpTransport::connect(server, Duration::from_secs(2)).unwrap();
        let query = b"\x00\x04\x12\x34\x01\x00";
        let response = transport.exchange(query).unwrap();
        assert_eq!(response, b"\x12\x34\x80\x00\x00\x01");
        assert_eq!(transport.stats().recv_len, 6);
    }

    #[test]
    fn tcp_exchange_rejects_oversized_declared_lengths() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = match listener.local_addr().unwrap() {
            SocketAddr::V4(v4) => v4,
            _ => unreachable!(),
        };
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut prefix = [0u8; 2];
            stream.read_exact(&mut prefix).unwrap();
            let mut request = vec![0u8; u16::from_be_bytes(prefix) as usize];
            stream.read_exact(&mut request).unwrap();
            stream.write_all(&[0xff, 0xff, 0x00]).unwrap();
        });
        let mut transport = TcpTransport::connect(addr, Duration::from_secs(2)).unwrap();
        let result = transport.exchange(b"\x00\x02\xab\xcd");
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[test]
    fn tcp_exchange_warns_on_early_close() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = match listener.local_addr().unwrap() {
            SocketAddr::V4(v4) => v4,
            _ => unreachable!(),
        };
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut prefix = [0u8; 2];
            stream.read_exact(&mut prefix).unwrap();
            let mut request = vec![0u8; u16::from_be_bytes(prefix) as usize];
            stream.read_exact(&mut request).unwrap();
            // Declare eight octets but deliver only four.
            stream.write_all(&[0x00, 0x08]).unwrap();
            stream.write_all(&[0xab, 0xcd, 0x80, 0x00]).unwrap();
        });
        let mut transport = TcpTransport::connect(addr, Duration::from_secs(2)).unwrap();
        let response = transport.exchange(b"\x00\x02\xab\xcd").unwrap();
        assert_eq!(response, b"\xab\xcd\x80\x00");
        assert!(transport.stats().warning.is_some());
    }

    #[test]
    fn tcp_connect_fails_cleanly_on_a_refused_port() {
        // Bind and drop a listener so the port is (very likely) closed.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            match listener.local_addr().unwrap() {
                SocketAddr::V4(v4) => v4,
                _ => unreachable!(),
            }
        };
        let result = TcpTransport::connect(addr, Duration::from_secs(1));
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
