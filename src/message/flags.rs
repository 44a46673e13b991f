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

//! Implementation of the [`Flags`] type for the two flag octets of the
//! DNS message header.

use std::fmt;

use super::constants::*;
use crate::util::{clear_bits, extract_bits, set_bits, test_bits};

////////////////////////////////////////////////////////////////////////
// HEADER FLAGS                                                       //
////////////////////////////////////////////////////////////////////////

/// The two flag octets of a DNS message header ([RFC 1035 § 4.1.1]),
/// with one accessor per logical field.
///
/// The first octet carries QR, OPCODE, AA, TC, and RD; the second
/// carries RA, Z, and RCODE. Only the fields a client composes have
/// setters; everything is readable.
///
/// [RFC 1035 § 4.1.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Flags([u8; 2]);

impl Flags {
    /// Returns the flags a fresh query carries: everything clear except
    /// RD.
    pub fn new_query() -> Self {
        Self([RD_MASK, 0])
    }

    /// Builds `Flags` from the two raw header octets.
    pub fn from_octets(octets: [u8; 2]) -> Self {
        Self(octets)
    }

    /// Returns the raw octets, for serialization at header offsets 2
    /// and 3.
    pub fn octets(&self) -> [u8; 2] {
        self.0
    }

    /// Returns whether the QR (query response) bit is set.
    pub fn qr(&self) -> bool {
        test_bits(QR_MASK, self.0[QR_BYTE - 2])
    }

    /// Returns the OPCODE field.
    pub fn opcode(&self) -> u8 {
        extract_bits(OPCODE_MASK, self.0[OPCODE_BYTE - 2]) >> OPCODE_SHIFT
    }

    /// Returns whether the AA (authoritative answer) bit is set.
    pub fn aa(&self) -> bool {
        test_bits(AA_MASK, self.0[AA_BYTE - 2])
    }

    /// Returns whether the TC (truncation) bit is set.
    pub fn tc(&self) -> bool {
        test_bits(TC_MASK, self.0[TC_BYTE - 2])
    }

    /// Returns whether the RD (recursion desired) bit is set.
    pub fn rd(&self) -> bool {
        test_bits(RD_MASK, self.0[RD_BYTE - 2])
    }

    /// Sets or clears the RD bit.
    pub fn set_rd(&mut self, rd: bool) {
        if rd {
            set_bits(RD_MASK, &mut self.0[RD_BYTE - 2]);
        } else {
            clear_bits(RD_MASK, &mut self.0[RD_BYTE - 2]);
        }
    }

    /// Returns whether the RA (recursion available) bit is set.
    pub fn ra(&self) -> bool {
        test_bits(RA_MASK, self.0[RA_BYTE - 2])
    }

    /// Returns the Z field, which must be zero in queries and
    /// responses.
    pub fn z(&self) -> u8 {
        extract_bits(Z_MASK, self.0[Z_BYTE - 2]) >> Z_SHIFT
    }

    /// Returns the 4-bit RCODE.
    pub fn rcode(&self) -> u8 {
        extract_bits(RCODE_MASK, self.0[RCODE_BYTE - 2])
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Flags")
            .field("qr", &self.qr())
            .field("opcode", &self.opcode())
            .field("aa", &self.aa())
            .field("tc", &self.tc())
            .field("rd", &self.rd())
            .field("ra", &self.ra())
            .field("z", &self.z())
            .field("rcode", &self.rcode())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_sit_at_their_wire_positions() {
        let flags = Flags::from_octets([0b1000_0101, 0b1000_0011]);
        assert!(flags.qr());
        assert_eq!(flags.opcode(), 0);
        assert!(flags.aa());
        assert!(!flags.tc());
        assert!(flags.rd());
        assert!(flags.ra());
        assert_eq!(flags.z(), 0);
        assert_eq!(flags.rcode(), 3);

        let status = Flags::from_octets([0b0001_0000, 0b0111_0000]);
        assert_eq!(status.opcode(), 2);
        assert_eq!(status.z(), 7);
    }

    #[test]
    fn new_query_sets_only_rd() {
        let flags = Flags::new_query();
        assert_eq!(flags.octets(), [0x01, 0x00]);
        assert!(flags.rd());
        assert!(!flags.qr());
    }

    #[test]
    fn rd_toggles_exactly_one_bit() {
        let mut flags = Flags::new_query();
        let before = flags.octets();
        flags.set_rd(false);
        let after = flags.octets();
        assert_eq!(before[0] ^ after[0], RD_MASK);
        assert_eq!(before[1], after[1]);
        flags.set_rd(true);
        assert_eq!(flags.octets(), before);
    }
}
