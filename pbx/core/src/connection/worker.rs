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

use std::sync::Arc;

use futures::StreamExt;
use log::*;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::mpsc,
};
use tokio_util::codec::{FramedRead, LinesCodec};

use super::outbound;
use crate::{
    exchange::Pbx,
    proto::Command,
    tu::TelephoneUnit,
};

const LOG_TARGET: &str = "pbx::connection::worker";

/// Services one client connection: registers a fresh telephone unit with the exchange, maps
/// command lines onto unit operations, and unregisters the unit when the connection ends.
///
/// The worker ends when the client disconnects, the read fails, or the unit's disconnect
/// trigger fires (exchange shutdown, or a failed outbound write).
pub struct ClientWorker<TReader, TWriter> {
    pbx: Arc<Pbx>,
    reader: TReader,
    writer: TWriter,
}

impl<TReader, TWriter> ClientWorker<TReader, TWriter>
where
    TReader: AsyncRead + Unpin,
    TWriter: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(pbx: Arc<Pbx>, reader: TReader, writer: TWriter) -> Self {
        Self { pbx, reader, writer }
    }

    pub async fn run(self) {
        let Self { pbx, reader, writer } = self;

        let (notifications_tx, notifications_rx) = mpsc::unbounded_channel();
        let _writer_task = outbound::spawn_writer(notifications_rx, writer);
        let tu = Arc::new(TelephoneUnit::new(notifications_tx));
        let mut disconnect = tu.disconnect_signal();

        let extension = match pbx.register(tu.clone()) {
            Ok(extension) => extension,
            Err(err) => {
                // Dropping the unit closes the notification channel, which ends the writer
                // task and with it the connection
                warn!(target: LOG_TARGET, "Refusing connection: {}", err);
                return;
            },
        };

        // Command lines may be arbitrarily long; the codec buffers until a terminator arrives
        let mut lines = FramedRead::new(reader, LinesCodec::new());
        loop {
            tokio::select! {
                _ = &mut disconnect => {
                    debug!(target: LOG_TARGET, "Extension {} is being disconnected", extension);
                    break;
                },
                read = lines.next() => match read {
                    Some(Ok(line)) => handle_command(&pbx, &tu, &line),
                    Some(Err(err)) => {
                        warn!(target: LOG_TARGET, "Read failed on extension {}: {}", extension, err);
                        break;
                    },
                    None => {
                        debug!(target: LOG_TARGET, "Extension {} disconnected", extension);
                        break;
                    },
                },
            }
        }

        if let Err(err) = pbx.unregister(&tu) {
            error!(target: LOG_TARGET, "Failed to unregister extension {}: {}", extension, err);
        }
    }
}

fn handle_command(pbx: &Pbx, tu: &Arc<TelephoneUnit>, line: &str) {
    let Some(command) = Command::parse(line) else {
        trace!(target: LOG_TARGET, "Ignoring unrecognised command line");
        return;
    };
    // Outcomes are advisory: the unit has already acknowledged the command with a state
    // notification, whether or not it applied
    let _ = match command {
        Command::Pickup => tu.pickup(),
        Command::Hangup => tu.hangup(),
        Command::Dial(extension) => pbx.dial(tu, extension),
        Command::Chat(msg) => tu.chat(&msg),
    };
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use pbx_test_utils::lines::{expect_eof, recv_line};
    use tokio::{
        io::{AsyncWriteExt, BufReader},
        time,
    };

    use super::*;

    async fn wait_until_drained(pbx: &Pbx) {
        time::timeout(Duration::from_secs(5), async {
            while pbx.active_count() != 0 {
                time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("Worker did not unregister its unit");
    }

    #[tokio::test]
    async fn services_commands_and_unregisters_on_eof() {
        let pbx = Arc::new(Pbx::new(8));
        let (client, server) = tokio::io::duplex(1024);
        let (server_reader, server_writer) = tokio::io::split(server);
        tokio::spawn(ClientWorker::new(pbx.clone(), server_reader, server_writer).run());

        let (client_reader, mut client_writer) = tokio::io::split(client);
        let mut reader = BufReader::new(client_reader);

        assert_eq!(recv_line(&mut reader).await, "ON HOOK 0");
        assert_eq!(pbx.active_count(), 1);

        client_writer.write_all(b"pickup\r\n").await.unwrap();
        assert_eq!(recv_line(&mut reader).await, "DIAL TONE");

        // Unknown lines are ignored outright; the next valid command is still serviced
        client_writer.write_all(b"ring ring\r\nhangup\r\n").await.unwrap();
        assert_eq!(recv_line(&mut reader).await, "ON HOOK 0");

        // A command split across writes is buffered until its terminator arrives
        client_writer.write_all(b"pick").await.unwrap();
        time::sleep(Duration::from_millis(20)).await;
        client_writer.write_all(b"up\r\n").await.unwrap();
        assert_eq!(recv_line(&mut reader).await, "DIAL TONE");

        // Half-close the client's write side; the worker sees EOF and tears down
        client_writer.shutdown().await.unwrap();
        wait_until_drained(&pbx).await;
    }

    #[tokio::test]
    async fn connection_is_closed_when_the_exchange_is_full() {
        let pbx = Arc::new(Pbx::new(0));
        let (client, server) = tokio::io::duplex(1024);
        let (server_reader, server_writer) = tokio::io::split(server);
        tokio::spawn(ClientWorker::new(pbx.clone(), server_reader, server_writer).run());

        let (client_reader, _client_writer) = tokio::io::split(client);
        let mut reader = BufReader::new(client_reader);
        expect_eof(&mut reader).await;
        assert_eq!(pbx.active_count(), 0);
    }

    #[tokio::test]
    async fn disconnect_trigger_ends_the_worker() {
        let pbx = Arc::new(Pbx::new(8));
        let (client, server) = tokio::io::duplex(1024);
        let (server_reader, server_writer) = tokio::io::split(server);
        tokio::spawn(ClientWorker::new(pbx.clone(), server_reader, server_writer).run());

        let (client_reader, _client_writer) = tokio::io::split(client);
        let mut reader = BufReader::new(client_reader);
        assert_eq!(recv_line(&mut reader).await, "ON HOOK 0");

        pbx.shutdown().await;
        // The worker unregistered and dropped the unit, closing the connection
        expect_eof(&mut reader).await;
        assert_eq!(pbx.active_count(), 0);
    }
}
