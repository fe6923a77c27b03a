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

//! The telephone unit: the server-side object representing one client's telephone.
//!
//! Every operation notifies the unit's client of the resulting state, even when the state did
//! not change; a client can therefore treat each notification as the acknowledgment of its
//! last command. Operations that transition a peer as well (answering, hanging up on a call,
//! dialling) notify the peer's client too, while both units' locks are held, so the two
//! clients observe a consistent pair of transitions.
//!
//! ## Locking
//!
//! Each unit's mutable state sits behind its own mutex. An operation touching two units must
//! acquire both locks through [`lock_pair`], which orders acquisition by the units' creation
//! sequence numbers; a unit lock is never held while blocking on a second unit lock outside
//! that primitive. Because the peer must be discovered under the single lock and the pair
//! reacquired from scratch, each two-unit operation re-validates its preconditions after the
//! pair is locked and re-examines the unit's state when a race was lost.

mod error;
mod state;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use log::*;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, MutexGuard};
use pbx_shutdown::{Shutdown, ShutdownSignal};
use tokio::sync::mpsc;

pub use self::{error::TuError, state::TuState};
use crate::{exchange::Extension, proto::Notification};

const LOG_TARGET: &str = "pbx::tu";

/// Source of the per-unit lock ordering keys.
static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);

/// A telephone unit. One exists per client connection; it is shared (via `Arc`) between the
/// connection worker, the exchange registry and, while a call is being set up or is in
/// progress, the peer unit on the other end.
pub struct TelephoneUnit {
    /// Stable identity used to order pair-lock acquisition. Never reused within a process.
    seq: u64,
    /// Assigned by the exchange at registration, exactly once.
    extension: OnceCell<Extension>,
    inner: Mutex<TuInner>,
}

struct TuInner {
    state: TuState,
    peer: Option<Arc<TelephoneUnit>>,
    outbound: mpsc::UnboundedSender<Notification>,
    /// Trips the owning connection worker's loop. Fired by the exchange on shutdown, or by
    /// the unit itself when the outbound channel is gone.
    disconnect: Shutdown,
}

impl TuInner {
    fn notify(&mut self, notification: Notification) {
        if self.outbound.send(notification).is_err() {
            // The writer is gone, so nothing can ever be delivered to this client again.
            // Tear the connection down; the worker observes the trigger on its next select.
            self.disconnect.trigger();
        }
    }
}

impl TelephoneUnit {
    /// Create a unit in the `OnHook` state. Notifications are sent into `outbound`, which is
    /// drained onto the socket by the connection's writer task.
    pub fn new(outbound: mpsc::UnboundedSender<Notification>) -> Self {
        Self {
            seq: NEXT_SEQ.fetch_add(1, Ordering::Relaxed),
            extension: OnceCell::new(),
            inner: Mutex::new(TuInner {
                state: TuState::OnHook,
                peer: None,
                outbound,
                disconnect: Shutdown::new(),
            }),
        }
    }

    /// The extension this unit is registered at, if it has been registered.
    pub fn extension(&self) -> Option<Extension> {
        self.extension.get().copied()
    }

    fn ext_or_unset(&self) -> Extension {
        self.extension().unwrap_or(Extension::UNSET)
    }

    /// Assign the unit's extension and announce it to the client with the initial `ON HOOK`
    /// notification. Called by the exchange during registration; fails if called twice.
    pub(crate) fn set_extension(&self, extension: Extension) -> Result<(), TuError> {
        self.extension
            .set(extension)
            .map_err(|_| TuError::AlreadyRegistered(self.ext_or_unset()))?;
        self.inner.lock().notify(Notification::OnHook(extension));
        Ok(())
    }

    /// The unit's current call state.
    pub fn state(&self) -> TuState {
        self.inner.lock().state
    }

    /// The unit's current peer, if a call is being set up or is in progress.
    pub fn peer(&self) -> Option<Arc<TelephoneUnit>> {
        self.inner.lock().peer.clone()
    }

    /// A signal that resolves once this unit's connection should be torn down.
    pub fn disconnect_signal(&self) -> ShutdownSignal {
        self.inner.lock().disconnect.to_signal()
    }

    /// Request that the owning connection worker tear the connection down.
    pub fn disconnect(&self) {
        self.inner.lock().disconnect.trigger();
    }

    /// Take the handset off the switchhook. On hook this yields a dial tone; ringing, it
    /// answers the call and both parties become connected.
    pub fn pickup(self: &Arc<Self>) -> Result<(), TuError> {
        loop {
            let mut inner = self.inner.lock();
            match inner.state {
                TuState::OnHook => {
                    inner.state = TuState::DialTone;
                    inner.notify(Notification::DialTone);
                    debug!(target: LOG_TARGET, "Extension {} picked up", self.ext_or_unset());
                    return Ok(());
                },
                TuState::Ringing => {
                    let Some(peer) = inner.peer.clone() else {
                        let echo = self.current_notification(&inner);
                        inner.notify(echo);
                        return Err(TuError::PeerMissing);
                    };
                    drop(inner);
                    let (mut this, mut that) = lock_pair(self, &peer);
                    if this.state != TuState::Ringing || !is_peered_with(&this, &peer) {
                        // Lost a race with the caller; re-examine from the new state
                        continue;
                    }
                    this.state = TuState::Connected;
                    that.state = TuState::Connected;
                    this.notify(Notification::Connected(peer.ext_or_unset()));
                    that.notify(Notification::Connected(self.ext_or_unset()));
                    debug!(
                        target: LOG_TARGET,
                        "Extension {} answered extension {}",
                        self.ext_or_unset(),
                        peer.ext_or_unset()
                    );
                    return Ok(());
                },
                state => {
                    let echo = self.current_notification(&inner);
                    inner.notify(echo);
                    return Err(TuError::InvalidState(state));
                },
            }
        }
    }

    /// Replace the handset on the switchhook, ending whatever is in progress. A connected
    /// peer is returned to its dial tone; a caller or callee of a call still being set up is
    /// put back on hook along with this unit.
    pub fn hangup(self: &Arc<Self>) -> Result<(), TuError> {
        loop {
            let mut inner = self.inner.lock();
            match inner.state {
                state @ (TuState::Connected | TuState::Ringing | TuState::RingBack) => {
                    let Some(peer) = inner.peer.clone() else {
                        let echo = self.current_notification(&inner);
                        inner.notify(echo);
                        return Err(TuError::PeerMissing);
                    };
                    drop(inner);
                    let (mut this, mut that) = lock_pair(self, &peer);
                    if this.state != state || !is_peered_with(&this, &peer) {
                        continue;
                    }
                    this.state = TuState::OnHook;
                    this.peer = None;
                    // Only an established call leaves the far end holding a live handset
                    that.state = match state {
                        TuState::Connected => TuState::DialTone,
                        _ => TuState::OnHook,
                    };
                    that.peer = None;
                    this.notify(Notification::OnHook(self.ext_or_unset()));
                    match that.state {
                        TuState::DialTone => that.notify(Notification::DialTone),
                        _ => that.notify(Notification::OnHook(peer.ext_or_unset())),
                    }
                    debug!(
                        target: LOG_TARGET,
                        "Extension {} hung up on extension {}",
                        self.ext_or_unset(),
                        peer.ext_or_unset()
                    );
                    return Ok(());
                },
                TuState::DialTone | TuState::BusySignal | TuState::Error => {
                    inner.state = TuState::OnHook;
                    inner.notify(Notification::OnHook(self.ext_or_unset()));
                    return Ok(());
                },
                TuState::OnHook => {
                    inner.notify(Notification::OnHook(self.ext_or_unset()));
                    return Err(TuError::InvalidState(TuState::OnHook));
                },
            }
        }
    }

    /// Dial another unit. `target` is `None` when the exchange found nothing at the dialled
    /// extension, which is an error only for a unit that was actually at its dial tone; the
    /// error state must not be reachable from states that may hold a peer.
    pub fn dial(self: &Arc<Self>, target: Option<&Arc<TelephoneUnit>>) -> Result<(), TuError> {
        let target = match target {
            Some(target) => target,
            None => {
                let mut inner = self.inner.lock();
                return match inner.state {
                    TuState::DialTone => {
                        inner.state = TuState::Error;
                        inner.notify(Notification::Error);
                        Err(TuError::NoSuchExtension)
                    },
                    state => {
                        let echo = self.current_notification(&inner);
                        inner.notify(echo);
                        Err(TuError::InvalidState(state))
                    },
                };
            },
        };

        // Dialling yourself takes a single lock; the pair primitive requires two distinct
        // units
        if Arc::ptr_eq(self, target) {
            let mut inner = self.inner.lock();
            return match inner.state {
                TuState::DialTone => {
                    inner.state = TuState::BusySignal;
                    inner.notify(Notification::BusySignal);
                    Err(TuError::TargetBusy)
                },
                state => {
                    let echo = self.current_notification(&inner);
                    inner.notify(echo);
                    Err(TuError::InvalidState(state))
                },
            };
        }

        loop {
            {
                let mut inner = self.inner.lock();
                if inner.state != TuState::DialTone {
                    let echo = self.current_notification(&inner);
                    inner.notify(echo);
                    return Err(TuError::InvalidState(inner.state));
                }
            }
            let (mut this, mut that) = lock_pair(self, target);
            if this.state != TuState::DialTone {
                continue;
            }
            if that.state != TuState::OnHook || that.peer.is_some() {
                this.state = TuState::BusySignal;
                this.notify(Notification::BusySignal);
                debug!(
                    target: LOG_TARGET,
                    "Extension {} dialled extension {} which is {}",
                    self.ext_or_unset(),
                    target.ext_or_unset(),
                    that.state
                );
                return Err(TuError::TargetBusy);
            }
            this.peer = Some(target.clone());
            that.peer = Some(self.clone());
            this.state = TuState::RingBack;
            that.state = TuState::Ringing;
            this.notify(Notification::RingBack);
            that.notify(Notification::Ringing);
            debug!(
                target: LOG_TARGET,
                "Extension {} is calling extension {}",
                self.ext_or_unset(),
                target.ext_or_unset()
            );
            return Ok(());
        }
    }

    /// Send a chat message to the peer of an established call. Neither unit changes state;
    /// the sender still receives its usual state acknowledgment.
    pub fn chat(self: &Arc<Self>, msg: &str) -> Result<(), TuError> {
        let peer = {
            let mut inner = self.inner.lock();
            match (inner.state, inner.peer.clone()) {
                (TuState::Connected, Some(peer)) => peer,
                (state, _) => {
                    let echo = self.current_notification(&inner);
                    inner.notify(echo);
                    return Err(TuError::InvalidState(state));
                },
            }
        };
        let (mut this, mut that) = lock_pair(self, &peer);
        if this.state != TuState::Connected || !is_peered_with(&this, &peer) {
            let echo = self.current_notification(&this);
            this.notify(echo);
            return Err(TuError::InvalidState(this.state));
        }
        // Both locks are held across the peer write, so chats from one sender arrive in the
        // order they were issued
        that.notify(Notification::Chat(msg.to_string()));
        this.notify(Notification::Connected(peer.ext_or_unset()));
        Ok(())
    }

    /// The notification matching the unit's current state, used to acknowledge commands that
    /// caused no transition.
    fn current_notification(&self, inner: &TuInner) -> Notification {
        match inner.state {
            TuState::OnHook => Notification::OnHook(self.ext_or_unset()),
            TuState::Ringing => Notification::Ringing,
            TuState::DialTone => Notification::DialTone,
            TuState::RingBack => Notification::RingBack,
            TuState::BusySignal => Notification::BusySignal,
            TuState::Connected => Notification::Connected(
                inner
                    .peer
                    .as_ref()
                    .map(|peer| peer.ext_or_unset())
                    .unwrap_or(Extension::UNSET),
            ),
            TuState::Error => Notification::Error,
        }
    }
}

impl Drop for TelephoneUnit {
    fn drop(&mut self) {
        // Peers hold strong references to each other, so a unit can only be destroyed after
        // every transition out of its paired states has cleared the relation
        debug_assert!(self.inner.get_mut().peer.is_none(), "telephone unit destroyed while paired");
        trace!(target: LOG_TARGET, "Telephone unit {} destroyed", self.ext_or_unset());
    }
}

/// Lock two distinct units in their canonical order, returning the guards in argument order.
/// All call sites that hold both unit locks must acquire them through this function.
fn lock_pair<'a>(
    a: &'a TelephoneUnit,
    b: &'a TelephoneUnit,
) -> (MutexGuard<'a, TuInner>, MutexGuard<'a, TuInner>) {
    debug_assert!(a.seq != b.seq, "lock_pair called with a single unit");
    if a.seq < b.seq {
        let first = a.inner.lock();
        let second = b.inner.lock();
        (first, second)
    } else {
        let second = b.inner.lock();
        let first = a.inner.lock();
        (first, second)
    }
}

/// True if `inner`'s peer is exactly `peer`. Used to re-validate a pairing after the pair
/// locks are reacquired.
fn is_peered_with(inner: &TuInner, peer: &Arc<TelephoneUnit>) -> bool {
    inner.peer.as_ref().map(|p| Arc::ptr_eq(p, peer)).unwrap_or(false)
}
