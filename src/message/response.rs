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

//! Decoding of on-the-wire DNS responses.
//!
//! [`Response::decode`] consumes the full message a transport received
//! (with any TCP length prefix already stripped), validates the header
//! against the transaction it answers, and walks the question echo and
//! the answer and authority sections sequentially. Additional-section
//! records are counted but not parsed. Every read goes through the
//! bounds-checked accessors, so a malformed length can never carry a
//! decoder past the received data.

use std::collections::HashMap;

use log::debug;

use super::constants::*;
use super::Flags;
use crate::class::Class;
use crate::error::{Error, Result};
use crate::name;
use crate::rr::{Ttl, Type};
use crate::util::{checked_at, checked_slice, read_u16, read_u32};

////////////////////////////////////////////////////////////////////////
// PARSED RECORDS                                                     //
////////////////////////////////////////////////////////////////////////

/// One record parsed from a response, with its RDATA rendered to text
/// in the type-specific format.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    pub owner: String,
    pub rr_type: Type,
    pub class: Class,
    pub ttl: Ttl,
    pub rdlength: u16,
    pub text: String,
}

////////////////////////////////////////////////////////////////////////
// DECODED RESPONSES                                                  //
////////////////////////////////////////////////////////////////////////

/// A decoded DNS response: the question echo, the records of the
/// answer and authority sections in order, and an index from RR type
/// to record positions for retrieval by type.
#[derive(Clone, Debug)]
pub struct Response {
    flags: Flags,
    query_name: String,
    query_type: Type,
    query_class: Class,
    records: Vec<Record>,
    by_type: HashMap<u16, Vec<usize>>,
    end: usize,
}

impl Response {
    /// Decodes the response in `octets` to the transaction identified
    /// by `expected_id`.
    ///
    /// The transaction ID is checked before anything else is read;
    /// then the response must have QR set and echo exactly one
    /// question. ANCOUNT + NSCOUNT records are decoded; when that sum
    /// is zero a single pseudo-record keeps the text accessors total,
    /// distinguishing an entirely empty body from one carrying only
    /// additional records.
    pub fn decode(octets: &[u8], expected_id: u16) -> Result<Self> {
        if read_u16(octets, ID_START)? != expected_id {
            return Err(Error::ProtocolMismatch("transaction ID differs"));
        }
        let flags = Flags::from_octets([checked_at(octets, 2)?, checked_at(octets, 3)?]);
        if !flags.qr() {
            return Err(Error::ProtocolMismatch("QR clear in response"));
        }
        if read_u16(octets, QDCOUNT_START)? != 1 {
            return Err(Error::ProtocolMismatch("QDCOUNT is not 1"));
        }
        let ancount = read_u16(octets, ANCOUNT_START)?;
        let nscount = read_u16(octets, NSCOUNT_START)?;
        let arcount = read_u16(octets, ARCOUNT_START)?;

        // The question echo.
        let (query_name, after_name) = name::decode(octets, HEADER_SIZE)?;
        let query_type = Type::from(read_u16(octets, after_name)?);
        let query_class = Class::from(read_u16(octets, after_name + 2)?);
        let mut cursor = after_name + 4;

        let count = ancount as usize + nscount as usize;
        let mut records = Vec::with_capacity(count.max(1));
        let mut by_type: HashMap<u16, Vec<usize>> = HashMap::new();

        if count == 0 {
            let (owner, text) = if arcount > 0 {
                ("rr_add_only", "Only additional RR provided")
            } else {
                ("no_rr", "No RR provided")
            };
            records.push(Record {
                owner: owner.to_owned(),
                rr_type: Type::NONE,
                class: Class::from(0),
                ttl: Ttl::from(0),
                rdlength: text.len() as u16,
                text: text.to_owned(),
            });
            by_type.insert(Type::NONE.into(), vec![0]);
        }

        for _ in 0..count {
            let (owner, fixed_at) = name::decode(octets, cursor)?;
            let rr_type = Type::from(read_u16(octets, fixed_at)?);
            let class = Class::from(read_u16(octets, fixed_at + 2)?);
            let ttl = Ttl::from(read_u32(octets, fixed_at + 4)?);
            let rdlength = read_u16(octets, fixed_at + 8)?;
            let rdata_at = fixed_at + 10;
            checked_slice(octets, rdata_at, rdlength as usize)?;

            let text = render_rdata(rr_type, octets, rdata_at, rdlength)?;
            by_type
                .entry(rr_type.into())
                .or_default()
                .push(records.len());
            records.push(Record {
                owner,
                rr_type,
                class,
                ttl,
                rdlength,
                text,
            });
            cursor = rdata_at + rdlength as usize;
        }

        debug!(
            "decoded response: {} answer + {} authority records, rcode {}",
            ancount,
            nscount,
            flags.rcode()
        );

        Ok(Self {
            flags,
            query_name,
            query_type,
            query_class,
            records,
            by_type,
            end: cursor,
        })
    }

    /// Returns the header flags of the response.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Returns the 4-bit RCODE.
    pub fn rcode(&self) -> u8 {
        self.flags.rcode()
    }

    /// Returns the QNAME echoed in the question section.
    pub fn query_name(&self) -> &str {
        &self.query_name
    }

    /// Returns the echoed QTYPE.
    pub fn query_type(&self) -> Type {
        self.query_type
    }

    /// Returns the echoed QCLASS.
    pub fn query_class(&self) -> Class {
        self.query_class
    }

    /// Returns the parsed records in message order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the rendered text of the last record.
    pub fn last_text(&self) -> Option<&str> {
        self.records.last().map(|r| r.text.as_str())
    }

    /// Returns the rendered texts of all records of `rr_type`, in
    /// message order.
    pub fn texts_of_type(&self, rr_type: Type) -> Vec<&str> {
        self.by_type
            .get(&rr_type.into())
            .map(|positions| {
                positions
                    .iter()
                    .map(|&i| self.records[i].text.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the rendered text of the most recent record of
    /// `rr_type`.
    pub fn last_of_type(&self, rr_type: Type) -> Option<&str> {
        self.by_type
            .get(&rr_type.into())
            .and_then(|positions| positions.last())
            .map(|&i| self.records[i].text.as_str())
    }

    /// Returns the index of the first octet past the last decoded
    /// record.
    pub fn end(&self) -> usize {
        self.end
    }
}

////////////////////////////////////////////////////////////////////////
// PRE-DECODE PEEKS                                                   //
////////////////////////////////////////////////////////////////////////

/// Reads the transaction ID of a raw response.
pub fn peek_id(octets: &[u8]) -> Result<u16> {
    read_u16(octets, ID_START)
}

/// Reads the TC (truncation) bit of a raw response. The engine checks
/// this before full decoding to decide on the TCP retry.
pub fn peek_tc(octets: &[u8]) -> Result<bool> {
    checked_at(octets, TC_BYTE).map(|octet| octet & TC_MASK != 0)
}

////////////////////////////////////////////////////////////////////////
// RDATA RENDERING                                                    //
////////////////////////////////////////////////////////////////////////

/// Renders the RDATA of length `rdlength` at `at` as text, in the
/// format specific to `rr_type`. Types outside the supported set fail
/// with [`Error::UnsupportedType`].
fn render_rdata(rr_type: Type, message: &[u8], at: usize, rdlength: u16) -> Result<String> {
    match rr_type {
        Type::A => {
            if rdlength != 4 {
                return Err(Error::ProtocolMismatch("A RDLENGTH is not 4"));
            }
            let quad = checked_slice(message, at, 4)?;
            Ok(format!("{}.{}.{}.{}", quad[0], quad[1], quad[2], quad[3]))
        }
        Type::AAAA => {
            if rdlength != 16 {
                return Err(Error::ProtocolMismatch("AAAA RDLENGTH is not 16"));
            }
            let groups: Vec<String> = (0..8)
                .map(|i| read_u16(message, at + 2 * i).map(|g| format!("{:x}", g)))
                .collect::<Result<_>>()?;
            Ok(groups.join(":"))
        }
        Type::NS | Type::CNAME => name::decode(message, at).map(|(text, _)| text),
        Type::SOA => {
            // Only the primary name server is of interest here; the
            // serial and timer fields are left undecoded.
            let (primary, _) = name::decode(message, at)?;
            Ok(format!("{};", primary))
        }
        Type::MX => {
            let preference = read_u16(message, at)?;
            let (exchange, _) = name::decode(message, at + 2)?;
            Ok(format!("{};{}", preference, exchange))
        }
        Type::TXT => {
            let len = checked_at(message, at)? as usize;
            let content = checked_slice(message, at + 1, len)?;
            Ok(content.iter().map(|&b| b as char).collect())
        }
        Type::LOC => {
            let fixed = checked_slice(message, at, 4)?;
            let (version, size, hp, vp) = (fixed[0], fixed[1], fixed[2], fixed[3]);
            let latitude = read_u32(message, at + 4)?;
            let longitude = read_u32(message, at + 8)?;
            let altitude = read_u32(message, at + 12)?;
            Ok(format!(
                "Ver;{};Sz;{};Hp;{};Vp;{};La;{};Lo;{};Al;{};",
                version, size, hp, vp, latitude, longitude, altitude
            ))
        }
        other => Err(Error::UnsupportedType(other.into())),
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
