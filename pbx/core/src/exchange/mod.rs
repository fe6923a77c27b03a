// Copyright 2023. The Tari Project
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

//! The exchange registry: a fixed-size table mapping extension numbers to live telephone
//! units. The registry mediates registration, extension lookup for dialling, and the drain
//! that makes shutdown wait until every connection worker has unregistered its unit.

mod error;
mod extension;

use std::sync::Arc;

use log::*;
use parking_lot::Mutex;
use tokio::sync::watch;

pub use self::{error::PbxError, extension::Extension};
use crate::tu::{TelephoneUnit, TuError};

const LOG_TARGET: &str = "pbx::exchange";

/// The private branch exchange. Holds one strong reference to every registered unit; the
/// reference is released by `unregister`, after the unit's calls have been torn down.
pub struct Pbx {
    inner: Mutex<RegistryInner>,
    /// Publishes the active unit count after every change; `shutdown` waits on it draining
    /// to zero.
    active: watch::Sender<usize>,
}

struct RegistryInner {
    slots: Vec<Option<Arc<TelephoneUnit>>>,
    active_count: usize,
    /// Set once `shutdown` begins. A registration that arrives mid-drain would stall the
    /// drain forever, so the registry refuses it.
    closed: bool,
}

impl Pbx {
    pub fn new(max_extensions: usize) -> Self {
        let (active, _) = watch::channel(0);
        Self {
            inner: Mutex::new(RegistryInner {
                slots: (0..max_extensions).map(|_| None).collect(),
                active_count: 0,
                closed: false,
            }),
            active,
        }
    }

    /// Register a unit, assigning it the lowest free extension. The unit announces the
    /// assigned extension to its client with the initial `ON HOOK` notification.
    pub fn register(&self, tu: Arc<TelephoneUnit>) -> Result<Extension, PbxError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(PbxError::ShutDown);
        }
        let index = inner
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(PbxError::RegistryFull)?;
        let extension = Extension::new(index as i32);
        tu.set_extension(extension).map_err(|_| PbxError::AlreadyRegistered)?;
        inner.slots[index] = Some(tu);
        inner.active_count += 1;
        self.active.send_replace(inner.active_count);
        debug!(target: LOG_TARGET, "Registered a unit at extension {}", extension);
        Ok(extension)
    }

    /// Unregister a unit: free its extension, tear down any call it is part of (notifying
    /// the peer as usual), and release the registry's reference.
    pub fn unregister(&self, tu: &Arc<TelephoneUnit>) -> Result<(), PbxError> {
        let extension = tu.extension().ok_or(PbxError::NotRegistered)?;
        let index = extension.index().ok_or(PbxError::NotRegistered)?;
        // Hold an extra reference across the teardown so the final release cannot run while
        // the hangup is still using the unit
        let delayed = {
            let mut inner = self.inner.lock();
            let slot = inner.slots.get_mut(index).ok_or(PbxError::NotRegistered)?;
            match slot {
                Some(registered) if Arc::ptr_eq(registered, tu) => {},
                _ => return Err(PbxError::NotRegistered),
            }
            let delayed = slot.take();
            inner.active_count -= 1;
            delayed
        };
        // The hangup may take both call parties' locks, so it must run outside the registry
        // lock. Failure just means there was nothing to hang up.
        let _ = tu.hangup();
        {
            let inner = self.inner.lock();
            self.active.send_replace(inner.active_count);
        }
        debug!(target: LOG_TARGET, "Unregistered extension {}", extension);
        drop(delayed);
        Ok(())
    }

    /// Place a call from `originator` to the unit registered at `extension`, if any. The
    /// registry lock covers only the lookup; the clone taken under it keeps the target alive
    /// for the duration of the dial, which runs under the units' own locks.
    pub fn dial(&self, originator: &Arc<TelephoneUnit>, extension: u32) -> Result<(), TuError> {
        let target = {
            let inner = self.inner.lock();
            inner.slots.get(extension as usize).cloned().flatten()
        };
        if target.is_none() {
            debug!(target: LOG_TARGET, "Nothing registered at dialled extension {}", extension);
        }
        originator.dial(target.as_ref())
    }

    /// The number of currently registered units.
    pub fn active_count(&self) -> usize {
        self.inner.lock().active_count
    }

    /// Close the exchange: ask every registered unit's connection to tear down, then wait
    /// until the last worker has unregistered. Units are kept alive (via the collected
    /// references) until the drain completes so teardown never races destruction.
    pub async fn shutdown(&self) {
        let delayed: Vec<Arc<TelephoneUnit>> = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            let delayed: Vec<_> = inner.slots.iter().flatten().cloned().collect();
            for tu in &delayed {
                tu.disconnect();
            }
            delayed
        };
        info!(
            target: LOG_TARGET,
            "Shutting down; waiting for {} unit(s) to unregister",
            delayed.len()
        );
        let mut active = self.active.subscribe();
        // Err means the sender is gone, which cannot happen while &self is alive
        let _ = active.wait_for(|count| *count == 0).await;
        drop(delayed);
        info!(target: LOG_TARGET, "Exchange drained");
    }
}
