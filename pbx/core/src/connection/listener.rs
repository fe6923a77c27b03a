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

use std::{net::SocketAddr, sync::Arc};

use log::*;
use pbx_shutdown::ShutdownSignal;
use tokio::net::{TcpListener, TcpStream};

use super::{ClientWorker, ConnectionError};
use crate::{config::PbxConfig, exchange::Pbx};

const LOG_TARGET: &str = "pbx::connection::listener";

/// Accepts client connections and spawns a worker for each. The accept loop runs until the
/// shutdown signal resolves; draining the already-accepted connections is the exchange's
/// business, not the listener's.
pub struct PbxListener {
    listener: TcpListener,
    pbx: Arc<Pbx>,
    shutdown_signal: ShutdownSignal,
}

impl PbxListener {
    /// Bind to the configured listen address. Fails fast (rather than in `run`) so the
    /// caller can report an unusable address before any client is told the server is up.
    pub async fn bind(
        config: &PbxConfig,
        pbx: Arc<Pbx>,
        shutdown_signal: ShutdownSignal,
    ) -> Result<Self, ConnectionError> {
        let listener = TcpListener::bind(config.listen_addr).await?;
        info!(target: LOG_TARGET, "Listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            pbx,
            shutdown_signal,
        })
    }

    /// The bound address; differs from the configured one when port 0 was requested.
    pub fn local_addr(&self) -> Result<SocketAddr, ConnectionError> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) {
        let Self {
            listener,
            pbx,
            mut shutdown_signal,
        } = self;
        loop {
            tokio::select! {
                _ = &mut shutdown_signal => {
                    info!(target: LOG_TARGET, "Shutdown signal received; no longer accepting connections");
                    break;
                },
                accepted = listener.accept() => match accepted {
                    Ok((socket, peer_addr)) => spawn_worker(&pbx, socket, peer_addr),
                    Err(err) => {
                        // A failed accept does not take the server down
                        error!(target: LOG_TARGET, "Failed to accept a connection: {}", err);
                        continue;
                    },
                },
            }
        }
    }
}

fn spawn_worker(pbx: &Arc<Pbx>, socket: TcpStream, peer_addr: SocketAddr) {
    debug!(target: LOG_TARGET, "Accepted connection from {}", peer_addr);
    let (reader, writer) = socket.into_split();
    let worker = ClientWorker::new(pbx.clone(), reader, writer);
    tokio::spawn(worker.run());
}
