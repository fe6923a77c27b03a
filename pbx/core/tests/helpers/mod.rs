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

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use pbx_core::{Pbx, PbxConfig, PbxListener};
use pbx_shutdown::Shutdown;
use pbx_test_utils::lines;
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
};

/// A server bound to an ephemeral localhost port, with its accept loop running.
pub struct TestServer {
    pub pbx: Arc<Pbx>,
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with_capacity(16).await
    }

    pub async fn spawn_with_capacity(max_extensions: usize) -> Self {
        let config = PbxConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            max_extensions,
        };
        let pbx = Arc::new(Pbx::new(config.max_extensions));
        let shutdown = Shutdown::new();
        let listener = PbxListener::bind(&config, pbx.clone(), shutdown.to_signal())
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(listener.run());
        Self { pbx, addr, shutdown }
    }

    /// Stop accepting and drain every live connection, as the binary does on SIGHUP.
    pub async fn shutdown(&mut self) {
        self.shutdown.trigger();
        self.pbx.shutdown().await;
    }
}

/// A test client speaking the CRLF line protocol.
pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    pub async fn connect(addr: SocketAddr) -> Self {
        Self::try_connect(addr).await.unwrap()
    }

    pub async fn try_connect(addr: SocketAddr) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    /// Send one command line, appending the terminator.
    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
    }

    /// Send raw bytes with no terminator, for exercising partial-line buffering.
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    pub async fn expect(&mut self, line: &str) {
        assert_eq!(lines::recv_line(&mut self.reader).await, line);
    }

    pub async fn expect_eof(&mut self) {
        lines::expect_eof(&mut self.reader).await;
    }

    /// Read and discard any in-flight notifications until the server closes the connection.
    /// Teardown notifications (e.g. a forced hangup on shutdown) may race the close.
    pub async fn drain_to_eof(&mut self) {
        tokio::time::timeout(std::time::Duration::from_secs(10), async {
            let mut line = String::new();
            loop {
                line.clear();
                use tokio::io::AsyncBufReadExt;
                if self.reader.read_line(&mut line).await.unwrap() == 0 {
                    break;
                }
            }
        })
        .await
        .expect("Timeout waiting for the server to close the connection");
    }
}
