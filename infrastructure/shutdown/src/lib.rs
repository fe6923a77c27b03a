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

//! # A convenient shutdown signal
//!
//! `Shutdown` is a one-shot trigger paired with a cheaply cloneable `ShutdownSignal` future.
//! Hand a signal to every task that should participate in cooperative shutdown and select on
//! it in the task's main loop. Once `trigger` is called (or the `Shutdown` is dropped), every
//! signal resolves, now and forever after.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use futures::{
    channel::oneshot,
    future::{FusedFuture, Shared},
    FutureExt,
};

/// Trigger for shutdown signals. When this is dropped, shutdown is triggered.
#[derive(Debug)]
pub struct Shutdown {
    trigger: Option<oneshot::Sender<()>>,
    signal: ShutdownSignal,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            trigger: Some(tx),
            signal: ShutdownSignal { inner: rx.shared() },
        }
    }

    /// Trigger the signal. Subsequent calls have no further effect.
    pub fn trigger(&mut self) {
        if let Some(trigger) = self.trigger.take() {
            // Fails if there are no signals left; nothing was waiting, so nothing to do
            let _ = trigger.send(());
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.trigger.is_none()
    }

    /// Create a new ShutdownSignal that resolves when this trigger fires.
    pub fn to_signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Shutdown {
    fn drop(&mut self) {
        self.trigger();
    }
}

/// Receiver side of a shutdown trigger. This future resolves once the corresponding `Shutdown`
/// is triggered or dropped, and may be polled again (or cloned) after completion.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    inner: Shared<oneshot::Receiver<()>>,
}

impl ShutdownSignal {
    /// Returns true if the shutdown signal has been triggered, without polling.
    pub fn is_triggered(&self) -> bool {
        // A cancelled oneshot means the Shutdown was dropped, which also triggers
        self.inner.peek().is_some()
    }

    /// Wait for the shutdown signal to be triggered.
    pub async fn wait(&mut self) {
        self.clone().await
    }
}

impl Future for ShutdownSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.inner).poll(cx) {
            // The trigger was either triggered or dropped, in either case the signal resolves
            Poll::Ready(_) => Poll::Ready(()),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl FusedFuture for ShutdownSignal {
    fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn trigger_resolves_all_signals() {
        let mut shutdown = Shutdown::new();
        let signal = shutdown.to_signal();
        let other = signal.clone();
        assert!(!signal.is_triggered());

        shutdown.trigger();
        // Both signals resolve, and a signal polled after completion stays resolved
        signal.clone().await;
        other.await;
        assert!(shutdown.is_triggered());
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn drop_triggers_signal() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.to_signal();
        drop(shutdown);
        signal.wait().await;
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn trigger_is_idempotent() {
        let mut shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();
        shutdown.to_signal().await;
    }
}
