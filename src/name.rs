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

//! Encoding and decoding of domain names on the wire.
//!
//! Queries carry an uncompressed QNAME built by [`encode_into`].
//! Responses may compress any name with pointer labels ([RFC 1035
//! § 4.1.4]); [`decode`] follows them, subject to two rules that
//! together foreclose pointer loops:
//!
//! 1. a pointer must target an offset strictly below its own offset;
//!    and
//! 2. the accumulated label material of one name is capped, so even a
//!    backward-pointing cycle runs out of budget.
//!
//! [RFC 1035 § 4.1.4]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.4

use arrayvec::ArrayVec;

use crate::error::{Error, Result};
use crate::util::{checked_at, checked_slice, read_u16};

/// The maximum length of a label (not counting its length octet).
pub const MAX_LABEL_LEN: usize = 63;

/// The maximum length of a domain name in its textual form, which also
/// bounds the label material a single decode may accumulate.
pub const MAX_NAME_LEN: usize = 253;

/// The rendering of a name consisting solely of the root terminator.
pub const ROOT_TEXT: &str = "<ROOT>";

/// The suffix of IPv4 reverse-lookup names.
const REVERSE_SUFFIX: &str = "in-addr.arpa";

/// The two high bits that mark a pointer label.
const POINTER_TAG: u8 = 0xc0;

////////////////////////////////////////////////////////////////////////
// ENCODING                                                           //
////////////////////////////////////////////////////////////////////////

/// Appends `site` to `out` as a sequence of length-prefixed labels
/// followed by the root terminator.
///
/// The name is split on `.`; empty labels (a trailing dot, doubled
/// dots) are skipped. This fails with [`Error::NameTooLong`] when the
/// name exceeds 253 octets or any label exceeds 63.
pub fn encode_into(site: &str, out: &mut Vec<u8>) -> Result<()> {
    if site.len() > MAX_NAME_LEN {
        return Err(Error::NameTooLong);
    }
    for label in site.split('.').filter(|l| !l.is_empty()) {
        if label.len() > MAX_LABEL_LEN {
            return Err(Error::NameTooLong);
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    Ok(())
}

////////////////////////////////////////////////////////////////////////
// DECODING                                                           //
////////////////////////////////////////////////////////////////////////

/// Decodes a (possibly compressed) name at index `start` of `message`.
///
/// Pointer labels are followed; their targets are indices into
/// `message`, so the whole DNS message must be passed in. On success
/// this returns the rendered name (labels joined with `.`, or
/// [`ROOT_TEXT`] for the bare root) and the index of the first octet
/// after the name's contiguous representation at `start` — once the
/// first pointer is met, that index freezes two octets past the
/// pointer, however far the chase continues.
pub fn decode(message: &[u8], start: usize) -> Result<(String, usize)> {
    let mut wire = ArrayVec::<u8, { MAX_NAME_LEN + 2 }>::new();
    let mut pos = start;
    let mut frozen_next = None;

    loop {
        let len = checked_at(message, pos)?;
        if len & POINTER_TAG == POINTER_TAG {
            let target = (read_u16(message, pos)? & !0xc000) as usize;
            if target >= pos {
                // Only references to a prior occurrence are legal;
                // anything else could loop.
                return Err(Error::BadPointer);
            }
            frozen_next.get_or_insert(pos + 2);
            pos = target;
        } else if len == 0 {
            let next = frozen_next.unwrap_or(pos + 1);
            return Ok((render(&wire), next));
        } else {
            let len = len as usize;
            if len > MAX_LABEL_LEN {
                return Err(Error::NameTooLong);
            }
            let label = checked_slice(message, pos, len + 1)?;
            wire.try_extend_from_slice(label)
                .or(Err(Error::NameTooLong))?;
            pos += len + 1;
        }
    }
}

/// Renders accumulated label material as text. Non-ASCII octets are
/// replaced rather than trusted.
fn render(wire: &[u8]) -> String {
    if wire.is_empty() {
        return ROOT_TEXT.to_owned();
    }
    let mut text = String::with_capacity(wire.len());
    let mut pos = 0;
    while pos < wire.len() {
        let len = wire[pos] as usize;
        if pos > 0 {
            text.push('.');
        }
        for &octet in &wire[pos + 1..pos + 1 + len] {
            if octet.is_ascii_graphic() || octet == b' ' {
                text.push(octet as char);
            } else {
                text.push('\u{fffd}');
            }
        }
        pos += len + 1;
    }
    text
}

////////////////////////////////////////////////////////////////////////
// REVERSE-LOOKUP NAMES                                               //
////////////////////////////////////////////////////////////////////////

/// Builds the `in-addr.arpa` name for a dotted-quad IPv4 address:
/// `a.b.c.d` becomes `d.c.b.a.in-addr.arpa`.
///
/// The input must be exactly four dot-separated decimal octets, each
/// at most 255; anything else fails with [`Error::InvalidAddress`].
pub fn reverse_ipv4(addr: &str) -> Result<String> {
    let invalid = || Error::InvalidAddress(addr.to_owned());
    if !addr.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(invalid());
    }

    let octets: Vec<&str> = addr.split('.').collect();
    if octets.len() != 4 {
        return Err(invalid());
    }
    for octet in &octets {
        octet.parse::<u8>().map_err(|_| invalid())?;
    }

    let mut name = String::with_capacity(addr.len() + REVERSE_SUFFIX.len() + 1);
    for octet in octets.iter().rev() {
        name.push_str(octet);
        name.push('.');
    }
    name.push_str(REVERSE_SUFFIX);
    Ok(name)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_produces_length_prefixed_labels() {
        let mut out = Vec::new();
        encode_into("example.test", &mut out).unwrap();
        assert_eq!(out, b"\x07example\x04test\x00");
    }

    #[test]
    fn encode_skips_empty_labels() {
        let mut with_dot = Vec::new();
        let mut without = Vec::new();
        encode_into("example.test.", &mut with_dot).unwrap();
        encode_into("example.test", &mut without).unwrap();
        assert_eq!(with_dot, without);
    }

    #[test]
    fn encode_of_empty_name_is_the_root() {
        let mut out = Vec::new();
        encode_into("", &mut out).unwrap();
        assert_eq!(out, b"\x00");
    }

    #[test]
    fn encode_rejects_long_labels_and_names() {
        let mut out = Vec::new();
        let long_label = "x".repeat(MAX_LABEL_LEN + 1);
        assert_eq!(encode_into(&long_label, &mut out), Err(Error::NameTooLong));
        let long_name = ["x"; 128].join(".");
        assert!(long_name.len() > MAX_NAME_LEN);
        assert_eq!(encode_into(&long_name, &mut out), Err(Error::NameTooLong));
    }

    #[test]
    fn decode_inverts_encode() {
        let mut wire = Vec::new();
        encode_into("www.example.test", &mut wire).unwrap();
        let (text, next) = decode(&wire, 0).unwrap();
        assert_eq!(text, "www.example.test");
        assert_eq!(next, wire.len());
    }

    #[test]
    fn decode_renders_the_bare_root() {
        assert_eq!(decode(b"\x00junk", 0).unwrap(), (ROOT_TEXT.to_owned(), 1));
    }

    #[test]
    fn decode_follows_backward_pointers() {
        // "example.test" at 4, then "ns1" + pointer to it at 18.
        let message = b"junk\x07example\x04test\x00\x03ns1\xc0\x04junk";
        let (text, next) = decode(message, 18).unwrap();
        assert_eq!(text, "ns1.example.test");
        assert_eq!(next, 24);
    }

    #[test]
    fn decode_freezes_next_offset_at_first_pointer() {
        // A pointer chain: the name at 22 points to 12, whose tail
        // points back to 0. The outer cursor still advances only two
        // octets past the first pointer.
        let message = b"\x04test\x00junk..\x07example\xc0\x00\x02ns\xc0\x0c";
        let (text, next) = decode(message, 22).unwrap();
        assert_eq!(text, "ns.example.test");
        assert_eq!(next, 27);
    }

    #[test]
    fn decode_rejects_forward_pointers() {
        let message = b"\x01x\xc0\x08junk\x00";
        assert_eq!(decode(message, 0), Err(Error::BadPointer));
    }

    #[test]
    fn decode_rejects_self_pointers() {
        assert_eq!(decode(b"junk\xc0\x04", 4), Err(Error::BadPointer));
    }

    #[test]
    fn decode_exhausts_budget_on_label_cycles() {
        // Offset 2 holds a one-octet label followed by a pointer back
        // to that label. Both hops are backward, so only the material
        // budget stops the walk.
        let message = b"..\x01x\xc0\x02";
        assert_eq!(decode(message, 4), Err(Error::NameTooLong));
    }

    #[test]
    fn decode_rejects_truncated_names() {
        assert_eq!(decode(b"\x07exam", 0), Err(Error::ShortRead));
        assert_eq!(decode(b"\x03www\xc0", 0), Err(Error::ShortRead));
    }

    #[test]
    fn decode_rejects_overlong_labels() {
        let mut message = vec![0x40u8];
        message.extend_from_slice(&[b'x'; 64]);
        message.push(0);
        assert_eq!(decode(&message, 0), Err(Error::NameTooLong));
    }

    #[test]
    fn reverse_ipv4_reverses_the_octets() {
        assert_eq!(reverse_ipv4("10.0.0.1").unwrap(), "1.0.0.10.in-addr.arpa");
        assert_eq!(
            reverse_ipv4("192.168.4.77").unwrap(),
            "77.4.168.192.in-addr.arpa"
        );
    }

    #[test]
    fn reverse_ipv4_round_trips() {
        let reversed = reverse_ipv4("10.0.0.1").unwrap();
        let stripped = reversed.strip_suffix(".in-addr.arpa").unwrap();
        let mut octets: Vec<&str> = stripped.split('.').collect();
        octets.reverse();
        assert_eq!(octets.join("."), "10.0.0.1");
    }

    #[test]
    fn reverse_ipv4_rejects_bad_input() {
        for bad in ["10.0.0", "10.0.0.0.1", "256.0.0.1", "a.b.c.d", "10.0.0.-1"] {
            assert!(matches!(
                reverse_ipv4(bad),
                Err(Error::InvalidAddress(_))
            ));
        }
    }
}
