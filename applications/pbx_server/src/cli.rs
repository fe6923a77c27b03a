// Copyright 2022. The Tari Project
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::net::Ipv4Addr;

use clap::Parser;
use pbx_core::{config::DEFAULT_PORT, PbxConfig};

#[derive(Parser, Debug)]
#[clap(author, version, about = "A private branch exchange: telephone call control over TCP", long_about = None)]
pub struct Cli {
    /// TCP port to listen on
    #[clap(short = 'p', long, default_value_t = DEFAULT_PORT, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,
}

impl Cli {
    pub fn config(&self) -> PbxConfig {
        PbxConfig {
            listen_addr: (Ipv4Addr::UNSPECIFIED, self.port).into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_port_applies_when_no_flag_is_given() {
        let cli = Cli::parse_from(["pbx_server"]);
        assert_eq!(cli.port, DEFAULT_PORT);
    }

    #[test]
    fn short_port_flag_is_accepted() {
        let cli = Cli::parse_from(["pbx_server", "-p", "6060"]);
        assert_eq!(cli.port, 6060);
        assert_eq!(cli.config().listen_addr.port(), 6060);
    }

    #[test]
    fn invalid_ports_are_rejected() {
        assert!(Cli::try_parse_from(["pbx_server", "-p", "0"]).is_err());
        assert!(Cli::try_parse_from(["pbx_server", "-p", "65536"]).is_err());
        assert!(Cli::try_parse_from(["pbx_server", "-p", "dial-tone"]).is_err());
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Cli::try_parse_from(["pbx_server", "--frequency", "50"]).is_err());
    }
}
