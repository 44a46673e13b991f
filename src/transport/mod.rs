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

//! Transports that carry one DNS exchange at a time.
//!
//! Each transport owns one kernel socket for its lifetime and closes
//! it on drop. A transport performs exactly one query/response
//! exchange at a time; every blocking step is bounded by the
//! configured timeout through a `poll(2)`-based readiness wait — no
//! transport relies on signal alarms. `SO_REUSEADDR` is set on every
//! socket so short-lived transports can be recreated rapidly.
//!
//! Signals are reduced to atomic flags, registered once per process:
//! SIGPIPE becomes a per-transport warning instead of terminating the
//! process, and an exit flag (raised by the binary's SIGINT handler)
//! is polled at the iteration boundaries of the ping and path-trace
//! loops.

use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

use lazy_static::lazy_static;
use log::warn;
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};
use signal_hook::consts::signal::SIGPIPE;

use crate::error::{Error, Result};

mod tcp;
mod trace;
mod udp;
pub use tcp::TcpTransport;
pub use trace::{Hop, PathTrace, Probe, ProbeReply};
pub use udp::{ConnectedUdpTransport, UdpTransport};

////////////////////////////////////////////////////////////////////////
// THE TRANSPORT CONTRACT                                             //
////////////////////////////////////////////////////////////////////////

/// A transport able to carry one query/response exchange.
pub trait Transport {
    /// Sends `query` and receives the response, with the TCP length
    /// prefix (where applicable) already stripped from the returned
    /// message.
    fn exchange(&mut self, query: &[u8]) -> Result<Vec<u8>>;

    /// Returns what the most recent exchange observed.
    fn stats(&self) -> &ExchangeStats;
}

/// What a transport observed during its most recent exchange.
#[derive(Clone, Debug, Default)]
pub struct ExchangeStats {
    /// Wall-clock time from first send to last receive.
    pub elapsed: Duration,

    /// Whether a bounded wait expired. Once set, the transport is in a
    /// terminal state and should be released.
    pub timed_out: bool,

    /// The length of the received DNS message (without any TCP length
    /// prefix).
    pub recv_len: usize,

    /// A non-fatal condition worth reporting (partial read, SIGPIPE).
    pub warning: Option<String>,
}

////////////////////////////////////////////////////////////////////////
// READINESS WAITS                                                    //
////////////////////////////////////////////////////////////////////////

/// What to wait for on a descriptor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Interest {
    Readable,
    Writable,
}

/// Blocks until `fd` is ready for `interest` or `timeout` expires.
/// Interrupted waits resume with the remaining budget; expiry fails
/// with [`Error::Timeout`].
pub(crate) fn await_fd(fd: RawFd, interest: Interest, timeout: Duration) -> Result<()> {
    let events = match interest {
        Interest::Readable => PollFlags::POLLIN,
        Interest::Writable => PollFlags::POLLOUT,
    };
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(Error::Timeout);
        }
        let millis = remaining.as_millis().try_into().unwrap_or(i32::MAX).max(1);
        let mut fds = [PollFd::new(fd, events)];
        match poll(&mut fds, millis) {
            Ok(0) => return Err(Error::Timeout),
            Ok(_) => return Ok(()),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(Error::Transport(format!("poll: {}", e))),
        }
    }
}

/// Blocks until either descriptor is readable or `timeout` expires,
/// returning which of the two became ready.
pub(crate) fn await_either_readable(
    first: RawFd,
    second: RawFd,
    timeout: Duration,
) -> Result<(bool, bool)> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(Error::Timeout);
        }
        let millis = remaining.as_millis().try_into().unwrap_or(i32::MAX).max(1);
        let mut fds = [
            PollFd::new(first, PollFlags::POLLIN),
            PollFd::new(second, PollFlags::POLLIN),
        ];
        match poll(&mut fds, millis) {
            Ok(0) => return Err(Error::Timeout),
            Ok(_) => {
                let ready = |fd: &PollFd| {
                    fd.revents().map_or(false, |r| {
                        r.intersects(PollFlags::POLLIN | PollFlags::POLLERR | PollFlags::POLLHUP)
                    })
                };
                return Ok((ready(&fds[0]), ready(&fds[1])));
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(Error::Transport(format!("poll: {}", e))),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// SIGNAL FLAGS                                                       //
////////////////////////////////////////////////////////////////////////

lazy_static! {
    static ref SIGPIPE_SEEN: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
    static ref EXIT_REQUESTED: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
}

static REGISTER_FLAGS: Once = Once::new();

/// Registers the SIGPIPE flag handler, once per process. A broken pipe
/// during an exchange then surfaces as a transport warning instead of
/// killing the process.
pub fn install_signal_flags() {
    REGISTER_FLAGS.call_once(|| {
        if let Err(e) = signal_hook::flag::register(SIGPIPE, Arc::clone(&SIGPIPE_SEEN)) {
            warn!("could not register SIGPIPE handler: {}", e);
        }
    });
}

/// Returns the process-wide exit flag. The binary wires SIGINT to it;
/// the ping and path-trace loops poll it between iterations.
pub fn exit_flag() -> Arc<AtomicBool> {
    Arc::clone(&EXIT_REQUESTED)
}

/// Returns whether an exit has been requested.
pub fn exit_requested() -> bool {
    EXIT_REQUESTED.load(Ordering::Relaxed)
}

/// Consumes a pending SIGPIPE observation.
pub(crate) fn take_sigpipe() -> bool {
    SIGPIPE_SEEN.swap(false, Ordering::Relaxed)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
