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

use std::fmt::{self, Display, Formatter};

use crate::exchange::Extension;

/// A message emitted to a client on its outbound channel. With the exception of `Chat`, every
/// notification echoes the state of the client's own telephone unit; a chat is delivered on
/// the channel of the *peer* of the sending unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    OnHook(Extension),
    Ringing,
    DialTone,
    RingBack,
    BusySignal,
    /// Carries the extension of the peer on the other end of the call.
    Connected(Extension),
    Error,
    Chat(String),
}

impl Notification {
    /// The notification as it appears on the wire, including the line terminator.
    pub fn to_line(&self) -> String {
        format!("{}\r\n", self)
    }
}

impl Display for Notification {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Notification::OnHook(ext) => write!(f, "ON HOOK {}", ext),
            Notification::Ringing => write!(f, "RINGING"),
            Notification::DialTone => write!(f, "DIAL TONE"),
            Notification::RingBack => write!(f, "RING BACK"),
            Notification::BusySignal => write!(f, "BUSY SIGNAL"),
            Notification::Connected(ext) => write!(f, "CONNECTED {}", ext),
            Notification::Error => write!(f, "ERROR"),
            Notification::Chat(msg) => write!(f, "CHAT {}", msg),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encodes_every_variant() {
        assert_eq!(Notification::OnHook(Extension::new(4)).to_string(), "ON HOOK 4");
        assert_eq!(Notification::Ringing.to_string(), "RINGING");
        assert_eq!(Notification::DialTone.to_string(), "DIAL TONE");
        assert_eq!(Notification::RingBack.to_string(), "RING BACK");
        assert_eq!(Notification::BusySignal.to_string(), "BUSY SIGNAL");
        assert_eq!(Notification::Connected(Extension::new(7)).to_string(), "CONNECTED 7");
        assert_eq!(Notification::Error.to_string(), "ERROR");
        assert_eq!(Notification::Chat("hello".to_string()).to_string(), "CHAT hello");
    }

    #[test]
    fn lines_are_crlf_terminated() {
        assert_eq!(Notification::DialTone.to_line(), "DIAL TONE\r\n");
        assert_eq!(Notification::Chat(String::new()).to_line(), "CHAT \r\n");
    }
}
