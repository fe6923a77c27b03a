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

/// The call state of a telephone unit.
///
/// `RingBack` and `Ringing` always occur as a pair across two units, as does
/// `Connected`/`Connected`. A unit in any other state has no peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuState {
    /// The handset is on the switchhook; the unit can be dialled.
    OnHook,
    /// An incoming call is waiting to be picked up.
    Ringing,
    /// The handset is off the switchhook and the unit can dial.
    DialTone,
    /// An outgoing call is waiting for the far end to pick up.
    RingBack,
    /// The last dial attempt failed because the target was unavailable.
    BusySignal,
    /// A call is in progress.
    Connected,
    /// The last dial attempt named a nonexistent extension.
    Error,
}

impl TuState {
    /// Returns true if this state is half of a two-unit pairing.
    pub fn is_paired(self) -> bool {
        matches!(self, TuState::Ringing | TuState::RingBack | TuState::Connected)
    }
}

impl Display for TuState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TuState::OnHook => write!(f, "on hook"),
            TuState::Ringing => write!(f, "ringing"),
            TuState::DialTone => write!(f, "at dial tone"),
            TuState::RingBack => write!(f, "at ring back"),
            TuState::BusySignal => write!(f, "at busy signal"),
            TuState::Connected => write!(f, "connected"),
            TuState::Error => write!(f, "in error"),
        }
    }
}
