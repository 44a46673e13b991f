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

//! The hex/ASCII dump used by verbose (`dump`) queries and at the end
//! of a path trace.

use std::fmt::Write;

const OCTETS_PER_LINE: usize = 16;
const REVERSE_VIDEO: &str = "\x1b[7m";
const RESET_VIDEO: &str = "\x1b[0m";

/// Renders `octets` as decimal-offset hex/ASCII lines under `label`,
/// with the half-open `highlight` range shown in reverse video (used
/// to pick out the DNS header).
pub fn render(label: &str, octets: &[u8], highlight: Option<(usize, usize)>) -> String {
    let mut out = String::new();
    writeln!(out, "{}\n", label).unwrap();
    let (begin, end) = highlight.unwrap_or((0, 0));

    for line_start in (0..octets.len()).step_by(OCTETS_PER_LINE) {
        write!(out, "{:05}:  ", line_start).unwrap();
        for offset in line_start..line_start + OCTETS_PER_LINE {
            if begin != end {
                if offset == begin {
                    out.push_str(REVERSE_VIDEO);
                }
                if offset == end {
                    out.push_str(RESET_VIDEO);
                }
            }
            match octets.get(offset) {
                Some(octet) => write!(out, "{:02x} ", octet).unwrap(),
                None => out.push_str("   "),
            }
        }
        if begin != end {
            out.push_str(RESET_VIDEO);
        }
        out.push(' ');
        for offset in line_start..line_start + OCTETS_PER_LINE {
            match octets.get(offset) {
                Some(&octet) if octet > 31 && octet < 127 => out.push(octet as char),
                Some(_) => out.push('.'),
                None => {}
            }
        }
        out.push('\n');
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_shows_offsets_hex_and_ascii() {
        let dump = render("Message sent:", b"\x00\x01ab", None);
        assert!(dump.starts_with("Message sent:\n\n"));
        assert!(dump.contains("00000:  00 01 61 62"));
        assert!(dump.contains("..ab"));
    }

    #[test]
    fn render_breaks_lines_every_sixteen_octets() {
        let dump = render("x", &[0u8; 20], None);
        assert!(dump.contains("00000:"));
        assert!(dump.contains("00016:"));
    }
}
