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

/// A command line received from a client, with the line terminator already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pickup,
    Hangup,
    /// Dial the unit at the given extension number.
    Dial(u32),
    /// Send a chat message to the peer of an established call.
    Chat(String),
}

impl Command {
    /// Parse a single command line. Returns `None` for anything unrecognised; such lines are
    /// ignored by the server.
    ///
    /// `dial` permits leading spaces before the extension and reads the leading digit run,
    /// ignoring any trailing garbage. `chat` takes the remainder of the line verbatim, spaces
    /// and all.
    pub fn parse(line: &str) -> Option<Self> {
        match line {
            "pickup" => Some(Command::Pickup),
            "hangup" => Some(Command::Hangup),
            _ => {
                if let Some(rest) = line.strip_prefix("dial ") {
                    let rest = rest.trim_start_matches(' ');
                    let end = rest
                        .find(|c: char| !c.is_ascii_digit())
                        .unwrap_or(rest.len());
                    let digits = &rest[..end];
                    if digits.is_empty() {
                        return None;
                    }
                    // A number too large for any extension table still names a (nonexistent)
                    // extension, so it must resolve to a failed lookup rather than be ignored
                    let extension = digits.parse().unwrap_or(u32::MAX);
                    Some(Command::Dial(extension))
                } else {
                    line.strip_prefix("chat ")
                        .map(|msg| Command::Chat(msg.to_string()))
                }
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_bare_commands() {
        assert_eq!(Command::parse("pickup"), Some(Command::Pickup));
        assert_eq!(Command::parse("hangup"), Some(Command::Hangup));
    }

    #[test]
    fn parses_dial() {
        assert_eq!(Command::parse("dial 5"), Some(Command::Dial(5)));
        assert_eq!(Command::parse("dial    42"), Some(Command::Dial(42)));
        // Trailing garbage after the digit run is ignored
        assert_eq!(Command::parse("dial 5x9"), Some(Command::Dial(5)));
    }

    #[test]
    fn dial_requires_a_leading_digit() {
        assert_eq!(Command::parse("dial"), None);
        assert_eq!(Command::parse("dial "), None);
        assert_eq!(Command::parse("dial x5"), None);
        assert_eq!(Command::parse("dial -1"), None);
    }

    #[test]
    fn oversized_dial_extension_saturates() {
        assert_eq!(Command::parse("dial 99999999999999999999"), Some(Command::Dial(u32::MAX)));
    }

    #[test]
    fn parses_chat_with_message_verbatim() {
        assert_eq!(
            Command::parse("chat hello there"),
            Some(Command::Chat("hello there".to_string()))
        );
        assert_eq!(Command::parse("chat  padded"), Some(Command::Chat(" padded".to_string())));
        assert_eq!(Command::parse("chat "), Some(Command::Chat(String::new())));
    }

    #[test]
    fn unrecognised_lines_are_ignored() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("pick up"), None);
        assert_eq!(Command::parse("pickup now"), None);
        assert_eq!(Command::parse("PICKUP"), None);
        assert_eq!(Command::parse("chat"), None);
        assert_eq!(Command::parse("ring"), None);
    }
}
