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

//! The process-wide source of random octets for transaction IDs.

use std::fs::File;
use std::io::{self, Read};
use std::sync::Mutex;

use lazy_static::lazy_static;

use crate::error::{Error, Result};

/// The platform's non-blocking entropy device.
const ENTROPY_DEVICE: &str = "/dev/urandom";

lazy_static! {
    // One handle for the lifetime of the process. The Mutex serializes
    // readers, so engines in separate threads may share it.
    static ref DEVICE: io::Result<Mutex<File>> = File::open(ENTROPY_DEVICE).map(Mutex::new);
}

/// Fills `buf[offset..offset + len]` with random octets.
///
/// The entropy device is opened once, on first use, and kept for the
/// lifetime of the process. This fails with [`Error::Entropy`] if the
/// device could not be opened or returns fewer than `len` octets, and
/// with [`Error::ShortRead`] if the requested range lies outside
/// `buf`.
pub fn fill(buf: &mut [u8], offset: usize, len: usize) -> Result<()> {
    let slice = offset
        .checked_add(len)
        .and_then(|end| buf.get_mut(offset..end))
        .ok_or(Error::ShortRead)?;
    let device = DEVICE
        .as_ref()
        .map_err(|e| Error::Entropy(format!("cannot open {}: {}", ENTROPY_DEVICE, e)))?;
    device
        .lock()
        .unwrap()
        .read_exact(slice)
        .map_err(|e| Error::Entropy(format!("short read from {}: {}", ENTROPY_DEVICE, e)))
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
