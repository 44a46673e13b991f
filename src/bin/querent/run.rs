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

//! Implements the query run: client setup, the query itself, and
//! terminal output.

use anyhow::{bail, Context, Result};
use env_logger::Env;
use log::info;
use signal_hook::consts::signal::SIGINT;

use querent::message::constants::HEADER_SIZE;
use querent::transport::{exit_flag, Hop, Probe};
use querent::{Client, QueryKind};

use crate::args::Args;
use crate::dump;

/// Runs the tool, returning the process exit code: 0 on success, 1 on
/// any failure, including a response with a non-zero RCODE.
pub fn run(args: Args) -> i32 {
    env_logger::init_from_env(Env::new().default_filter_or("warn"));
    match try_running(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn try_running(args: Args) -> Result<i32> {
    let kind = match args.kind {
        Some(ref descr) => match QueryKind::from_descriptor(descr) {
            Some(kind) => Some(kind),
            None => bail!("invalid query type: {}", descr),
        },
        None => None,
    };

    let mut client = Client::new();
    client
        .set_resolver(&args.resolver)
        .context("invalid resolver address")?;
    if let Some(port) = args.port {
        client.set_port(port);
    }
    if let Some(secs) = args.timeout {
        client.set_timeout(secs);
    }
    if let Some(kind) = kind {
        client.set_query_kind(kind);
    }
    client.set_force_tcp(args.force_tcp);

    match args.site {
        Some(ref site) if is_dotted_quad(site) => {
            let reversed = Client::reverse_query(site).context("invalid address for -s")?;
            info!("looking up {} as {}", site, reversed);
            client.set_site(&reversed).context("invalid site name")?;
        }
        Some(ref site) => client.set_site(site).context("invalid site name")?,
        None if kind == Some(QueryKind::Info) => {}
        None => bail!("a site name is required (-s), unless -t info is used"),
    }

    if args.trace {
        return run_trace(&mut client);
    }
    if kind == Some(QueryKind::Ping) {
        return run_ping(&mut client);
    }

    client.send().context("query failed")?;

    if let Some(warning) = client.warning() {
        eprintln!("{}", warning);
    }
    if args.length {
        eprintln!("Response Length: {}", client.response_length());
    }
    if kind == Some(QueryKind::Dump) {
        eprintln!("Elapsed Time: {:.6}\n", client.elapsed().as_secs_f64());
        eprintln!("Response Length: {}\n", client.response_length());
        if let Some(wire) = client.last_wire_query() {
            eprint!("{}", dump::render("Message sent:", wire, Some((0, HEADER_SIZE))));
        }
        if let Some(wire) = client.last_wire_response() {
            eprint!(
                "{}",
                dump::render("Message received:", wire, Some((0, HEADER_SIZE)))
            );
        }
    }
    if args.kind.is_some() {
        eprint!(
            "\nDNS Lookup: Query: {}\nDNS Lookup: Resp: ",
            client.last_query_text().unwrap_or_default()
        );
    }

    if args.print_all {
        println!("{}", client.all_responses());
    } else if let Some(ref type_name) = args.print_type {
        println!("{}", client.all_of_type(type_name));
    } else if let Some(ref type_name) = args.print_one {
        println!("{}", client.one_of_type(type_name));
    } else {
        println!("{}", client.last_response());
    }

    let rcode = client.return_code();
    if rcode != 0 {
        eprintln!(
            "DNS response notifies an error code: {}",
            Client::rcode_text(rcode.into())
        );
        return Ok(1);
    }
    Ok(0)
}

/// Repeats the query once per second until interrupted, in the manner
/// of ping.
fn run_ping(client: &mut Client) -> Result<i32> {
    register_interrupt()?;
    let resolver = client
        .resolver()
        .map(|ip| ip.to_string())
        .unwrap_or_default();
    client
        .ping(|seq, round| {
            if round.timed_out {
                eprintln!("Request timeout for {} dns_seq={}", resolver, seq);
            } else {
                eprintln!(
                    "{} bytes from {} dns_seq={} time={:.6} s",
                    round.received,
                    resolver,
                    seq,
                    round.elapsed.as_secs_f64()
                );
            }
        })
        .context("ping failed")?;
    Ok(0)
}

/// Traces the network path to the resolver, printing each hop.
fn run_trace(client: &mut Client) -> Result<i32> {
    register_interrupt()?;
    let reached = client
        .trace_path(print_hop)
        .context("path trace failed")?;
    if reached {
        if let Some(wire) = client.last_wire_response() {
            eprint!("{}", dump::render("\nDump:", wire, Some((0, HEADER_SIZE))));
        }
    } else {
        eprintln!("Resolver not reached.");
    }
    Ok(0)
}

fn print_hop(hop: &Hop) {
    let mut line = format!("ttl: {}", hop.ttl);
    for probe in &hop.probes {
        match probe {
            Probe::Lost => line.push_str("\t     *     "),
            Probe::Router(reply) => {
                line.push_str(&format!(
                    "\t{}\t({:.3}s)",
                    reply.from,
                    reply.elapsed.as_secs_f64()
                ));
            }
            Probe::Answered(reply) => {
                line.push_str(&format!("\t{}\t(DNS answer)", reply.from));
            }
        }
    }
    eprintln!("{}", line);
}

/// Wires SIGINT to the process-wide exit flag, so the ping and trace
/// loops wind down at their next iteration boundary.
fn register_interrupt() -> Result<()> {
    signal_hook::flag::register(SIGINT, exit_flag())
        .context("failed to register the SIGINT handler")?;
    Ok(())
}

/// Returns whether `-s` was given a dotted-quad address rather than a
/// name, which turns the query into a reverse lookup.
fn is_dotted_quad(site: &str) -> bool {
    site.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && site.split('.').filter(|part| !part.is_empty()).count() == 4
}
