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

use log::*;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::mpsc,
    task::JoinHandle,
};

use crate::proto::Notification;

const LOG_TARGET: &str = "pbx::connection::outbound";

/// Spawn the task that drains a unit's notification channel onto the socket's write half.
///
/// The task ends when the channel closes (the unit was destroyed) or a write fails. A failed
/// write drops the receiver, which makes the unit's next notification attempt trip its
/// disconnect trigger and tear the whole connection down.
pub(super) fn spawn_writer<TWriter>(
    mut notifications: mpsc::UnboundedReceiver<Notification>,
    mut writer: TWriter,
) -> JoinHandle<()>
where
    TWriter: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            if let Err(err) = writer.write_all(notification.to_line().as_bytes()).await {
                debug!(target: LOG_TARGET, "Outbound write failed: {}", err);
                break;
            }
        }
        let _ = writer.shutdown().await;
    })
}
