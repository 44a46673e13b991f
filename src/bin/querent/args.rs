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

//! Implements command-line argument parsing.

use clap::Parser;

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// A command-line DNS query tool
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Args {
    /// The address of the resolver to interrogate
    #[clap(short = 'd', value_name = "RESOLVER")]
    pub resolver: String,

    /// The site name to look up (a dotted-quad address is turned into
    /// a reverse query)
    #[clap(short = 's', value_name = "SITE")]
    pub site: Option<String>,

    /// The query kind: std, dump, ping, info, mail or locate
    #[clap(short = 't', value_name = "KIND")]
    pub kind: Option<String>,

    /// Force the query over TCP
    #[clap(short = 'f')]
    pub force_tcp: bool,

    /// The exchange timeout in seconds (1 to 120)
    #[clap(short = 'T', value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Override the resolver port
    #[clap(short = 'p', value_name = "PORT")]
    pub port: Option<u16>,

    /// Print all records of the response
    #[clap(short = 'A', conflicts_with_all = &["print-type", "print-one"])]
    pub print_all: bool,

    /// Print all records of the given type (a, aaaa, ns, cname, soa,
    /// mx, txt, loc)
    #[clap(short = 'a', value_name = "TYPE", conflicts_with = "print-one")]
    pub print_type: Option<String>,

    /// Print one record of the given type
    #[clap(short = 'u', value_name = "TYPE")]
    pub print_one: Option<String>,

    /// Print the response length
    #[clap(short = 'l')]
    pub length: bool,

    /// Trace the network path to the resolver instead of querying it
    #[clap(
        short = 'X',
        requires = "site",
        conflicts_with_all = &["kind", "force-tcp", "timeout", "print-all", "print-type",
                               "print-one", "length"]
    )]
    pub trace: bool,
}
